//! Fake XTAM and CAS endpoints on a wiremock server.

#![allow(dead_code)]

use serde_json::Value;
use test_utils::{
    ListingEntry, SERVICE_TICKET, SESSION_COOKIE, SESSION_SET_COOKIE, folder_listing,
    init_test_tracing,
};
use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xtam_client::XtamConfig;

/// XTAM lives under `/xtam`, CAS under `/cas`, both on one server.
pub struct FakeXtam {
    pub server: MockServer,
}

impl FakeXtam {
    pub async fn start() -> Self {
        init_test_tracing();
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}/xtam", self.server.uri())
    }

    pub fn cas_url(&self) -> String {
        format!("{}/cas", self.server.uri())
    }

    pub fn tgt_url(&self) -> String {
        format!("{}/cas/v1/tickets/TGT-123", self.server.uri())
    }

    pub fn config(&self) -> XtamConfig {
        XtamConfig::new(self.base_url(), self.cas_url(), "svc-render", "hunter2").with_folder_id("42")
    }

    /// Form body the service ticket request must carry.
    pub fn service_form(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("service", &format!("{}/", self.base_url()))
            .finish()
    }

    /// Mount all three CAS steps, each expected `logins` times.
    pub async fn mount_cas(&self, logins: u64) {
        self.mount_tgt(ResponseTemplate::new(201).insert_header("Location", self.tgt_url().as_str()), logins)
            .await;
        self.mount_service_ticket(ResponseTemplate::new(200).set_body_string(SERVICE_TICKET), logins)
            .await;
        self.mount_cookie(
            ResponseTemplate::new(200).insert_header("Set-Cookie", SESSION_SET_COOKIE),
            logins,
        )
        .await;
    }

    /// Mount the CAS steps without call expectations.
    pub async fn mount_cas_lenient(&self) {
        Mock::given(method("POST"))
            .and(path("/cas/v1/tickets"))
            .respond_with(ResponseTemplate::new(201).insert_header("Location", self.tgt_url().as_str()))
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cas/v1/tickets/TGT-123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SERVICE_TICKET))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/xtam"))
            .and(query_param("ticket", SERVICE_TICKET))
            .respond_with(ResponseTemplate::new(200).insert_header("Set-Cookie", SESSION_SET_COOKIE))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_tgt(&self, response: ResponseTemplate, times: u64) {
        Mock::given(method("POST"))
            .and(path("/cas/v1/tickets"))
            .and(body_string_contains("username=svc-render"))
            .and(body_string_contains("password=hunter2"))
            .respond_with(response)
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_service_ticket(&self, response: ResponseTemplate, times: u64) {
        Mock::given(method("POST"))
            .and(path("/cas/v1/tickets/TGT-123"))
            .and(body_string(self.service_form()))
            .respond_with(response)
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_cookie(&self, response: ResponseTemplate, times: u64) {
        Mock::given(method("GET"))
            .and(path("/xtam"))
            .and(query_param("ticket", SERVICE_TICKET))
            .respond_with(response)
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Mount a folder listing that only answers requests carrying the session.
    pub async fn mount_listing(&self, folder_id: &str, entries: &[ListingEntry], times: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/xtam/rest/folder/list/{folder_id}")))
            .and(header("cookie", SESSION_COOKIE))
            .respond_with(ResponseTemplate::new(200).set_body_json(folder_listing(entries)))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Mount an unlock endpoint that only answers requests carrying the session.
    pub async fn mount_record(&self, id: u64, body: &Value, times: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/xtam/rest/record/unlock/{id}")))
            .and(header("cookie", SESSION_COOKIE))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Count requests received for `request_path`.
    pub async fn hits(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == request_path)
            .count()
    }
}
