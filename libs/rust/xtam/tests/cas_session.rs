//! CAS session authentication against a fake CAS and XTAM.

mod support;

use reqwest::{Method, Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use support::FakeXtam;
use test_utils::{SERVICE_TICKET, SESSION_COOKIE, SESSION_SET_COOKIE, sample_folder};
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};
use xtam_client::{
    ApiError, AuthError, AuthStep, CasSession, RequestAuthenticator, XtamClient, XtamError,
};

fn client(fake: &FakeXtam) -> XtamClient {
    XtamClient::new(&fake.config()).unwrap()
}

#[tokio::test]
async fn test_authenticates_once_and_reuses_session() {
    let fake = FakeXtam::start().await;
    fake.mount_cas(1).await;
    fake.mount_listing("42", &sample_folder(), 2).await;

    let client = client(&fake);
    assert!(!client.authenticator().is_authenticated());

    let first = client.list_container("42").await.unwrap();
    assert!(client.authenticator().is_authenticated());
    let second = client.list_container("42").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fake.hits("/cas/v1/tickets").await, 1);
}

#[tokio::test]
async fn test_clearing_session_forces_reauthentication() {
    let fake = FakeXtam::start().await;
    fake.mount_cas(2).await;
    fake.mount_listing("42", &sample_folder(), 2).await;

    let client = client(&fake);
    client.list_container("42").await.unwrap();

    client.authenticator().clear_session();
    assert!(!client.authenticator().is_authenticated());

    client.list_container("42").await.unwrap();
    assert_eq!(fake.hits("/cas/v1/tickets").await, 2);
}

#[tokio::test]
async fn test_tgt_rejection_stops_exchange() {
    let fake = FakeXtam::start().await;
    fake.mount_tgt(ResponseTemplate::new(401).set_body_string("bad credentials"), 1)
        .await;
    fake.mount_service_ticket(ResponseTemplate::new(200), 0).await;
    fake.mount_cookie(ResponseTemplate::new(200), 0).await;
    fake.mount_listing("42", &sample_folder(), 0).await;

    let err = client(&fake).list_container("42").await.unwrap_err();

    match err {
        XtamError::Auth(AuthError::UnexpectedStatus {
            step,
            status,
            detail,
        }) => {
            assert_eq!(step, AuthStep::GrantingTicket);
            assert_eq!(status, 401);
            assert_eq!(detail, "bad credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_ticket_location() {
    let fake = FakeXtam::start().await;
    fake.mount_tgt(ResponseTemplate::new(201), 1).await;
    fake.mount_service_ticket(ResponseTemplate::new(200), 0).await;

    let err = client(&fake).list_container("42").await.unwrap_err();
    assert!(matches!(err, XtamError::Auth(AuthError::MissingTicketLocation)));
}

#[tokio::test]
async fn test_relative_ticket_location_is_resolved() {
    let fake = FakeXtam::start().await;
    fake.mount_tgt(
        ResponseTemplate::new(201).insert_header("Location", "/cas/v1/tickets/TGT-123"),
        1,
    )
    .await;
    fake.mount_service_ticket(ResponseTemplate::new(200).set_body_string("ST-abc"), 1)
        .await;
    fake.mount_cookie(
        ResponseTemplate::new(200).insert_header("Set-Cookie", SESSION_SET_COOKIE),
        1,
    )
    .await;
    fake.mount_listing("42", &sample_folder(), 1).await;

    let entries = client(&fake).list_container("42").await.unwrap();
    assert_eq!(entries.len(), 4);
}

#[tokio::test]
async fn test_service_ticket_rejected() {
    let fake = FakeXtam::start().await;
    fake.mount_tgt(
        ResponseTemplate::new(201).insert_header("Location", fake.tgt_url().as_str()),
        1,
    )
    .await;
    fake.mount_service_ticket(ResponseTemplate::new(400), 1).await;
    fake.mount_cookie(ResponseTemplate::new(200), 0).await;

    let err = client(&fake).list_container("42").await.unwrap_err();
    assert!(matches!(
        err,
        XtamError::Auth(AuthError::UnexpectedStatus {
            step: AuthStep::ServiceTicket,
            status: 400,
            ..
        })
    ));
}

#[tokio::test]
async fn test_empty_service_ticket() {
    let fake = FakeXtam::start().await;
    fake.mount_tgt(
        ResponseTemplate::new(201).insert_header("Location", fake.tgt_url().as_str()),
        1,
    )
    .await;
    fake.mount_service_ticket(ResponseTemplate::new(200), 1).await;
    fake.mount_cookie(ResponseTemplate::new(200), 0).await;

    let err = client(&fake).list_container("42").await.unwrap_err();
    assert!(matches!(err, XtamError::Auth(AuthError::EmptyServiceTicket)));
}

#[tokio::test]
async fn test_cookie_request_rejected() {
    let fake = FakeXtam::start().await;
    fake.mount_tgt(
        ResponseTemplate::new(201).insert_header("Location", fake.tgt_url().as_str()),
        1,
    )
    .await;
    fake.mount_service_ticket(ResponseTemplate::new(200).set_body_string("ST-abc"), 1)
        .await;
    fake.mount_cookie(ResponseTemplate::new(403), 1).await;

    let client = client(&fake);
    let err = client.list_container("42").await.unwrap_err();

    assert!(matches!(
        err,
        XtamError::Auth(AuthError::UnexpectedStatus {
            step: AuthStep::SessionCookie,
            status: 403,
            ..
        })
    ));
    assert!(!client.authenticator().is_authenticated());
}

#[tokio::test]
async fn test_failed_attempt_leaves_no_session() {
    let fake = FakeXtam::start().await;
    Mock::given(method("POST"))
        .and(path("/cas/v1/tickets"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&fake.server)
        .await;
    fake.mount_cas(1).await;
    fake.mount_listing("42", &sample_folder(), 1).await;

    let client = client(&fake);
    let err = client.list_container("42").await.unwrap_err();
    assert!(err.is_retryable());

    client.list_container("42").await.unwrap();
    assert_eq!(fake.hits("/cas/v1/tickets").await, 2);
}

#[tokio::test]
async fn test_execute_returns_response_verbatim() {
    let fake = FakeXtam::start().await;
    fake.mount_cas(1).await;
    Mock::given(method("GET"))
        .and(path("/xtam/teapot"))
        .and(header("cookie", SESSION_COOKIE))
        .respond_with(ResponseTemplate::new(418).set_body_string("short and stout"))
        .expect(1)
        .mount(&fake.server)
        .await;

    let session = CasSession::new(&fake.config()).unwrap();
    let url = Url::parse(&format!("{}/teapot", fake.base_url())).unwrap();
    let response = session.execute(Request::new(Method::GET, url)).await.unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.text().await.unwrap(), "short and stout");
}

#[tokio::test]
async fn test_expired_session_is_reported_by_default() {
    let fake = FakeXtam::start().await;
    fake.mount_cas(1).await;
    Mock::given(method("GET"))
        .and(path("/xtam/rest/folder/list/42"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&fake.server)
        .await;

    let err = client(&fake).list_container("42").await.unwrap_err();
    assert!(matches!(
        err,
        XtamError::Api(ApiError::UnexpectedStatus { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_expired_session_reauthenticates_when_enabled() {
    let fake = FakeXtam::start().await;
    fake.mount_cas(2).await;
    Mock::given(method("GET"))
        .and(path("/xtam/rest/folder/list/42"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&fake.server)
        .await;
    fake.mount_listing("42", &sample_folder(), 1).await;

    let config = fake.config().with_reauthenticate_on_expiry(true);
    let client = XtamClient::new(&config).unwrap();

    let entries = client.list_container("42").await.unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(fake.hits("/cas/v1/tickets").await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_login() {
    let fake = FakeXtam::start().await;
    fake.mount_tgt(
        ResponseTemplate::new(201)
            .insert_header("Location", fake.tgt_url().as_str())
            .set_delay(Duration::from_millis(150)),
        1,
    )
    .await;
    fake.mount_service_ticket(ResponseTemplate::new(200).set_body_string(SERVICE_TICKET), 1)
        .await;
    fake.mount_cookie(
        ResponseTemplate::new(200).insert_header("Set-Cookie", SESSION_SET_COOKIE),
        1,
    )
    .await;
    fake.mount_listing("42", &sample_folder(), 8).await;

    let client = Arc::new(client(&fake));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.list_container("42").await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().len(), 4);
    }
    assert_eq!(fake.hits("/cas/v1/tickets").await, 1);
}

#[tokio::test]
async fn test_late_rejection_of_replaced_session_does_not_log_in_again() {
    const STALE_COOKIE: &str = "JSESSIONID=stale";

    let fake = FakeXtam::start().await;
    fake.mount_tgt(
        ResponseTemplate::new(201).insert_header("Location", fake.tgt_url().as_str()),
        2,
    )
    .await;
    fake.mount_service_ticket(ResponseTemplate::new(200).set_body_string(SERVICE_TICKET), 2)
        .await;
    // The first login hands out the session that later expires.
    Mock::given(method("GET"))
        .and(path("/xtam"))
        .and(query_param("ticket", SERVICE_TICKET))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Set-Cookie", "JSESSIONID=stale; Path=/"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&fake.server)
        .await;
    fake.mount_cookie(
        ResponseTemplate::new(200).insert_header("Set-Cookie", SESSION_SET_COOKIE),
        1,
    )
    .await;

    for (folder, delay) in [("early", 0), ("late", 400)] {
        Mock::given(method("GET"))
            .and(path(format!("/xtam/rest/folder/list/{folder}")))
            .and(header("cookie", STALE_COOKIE))
            .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(delay)))
            .expect(1)
            .mount(&fake.server)
            .await;
        fake.mount_listing(folder, &sample_folder(), 1).await;
    }

    let config = fake.config().with_reauthenticate_on_expiry(true);
    let client = XtamClient::new(&config).unwrap();
    client.authenticator().ensure_session().await.unwrap();
    assert_eq!(fake.hits("/cas/v1/tickets").await, 1);

    let (early, late) = tokio::join!(
        client.list_container("early"),
        client.list_container("late")
    );

    assert_eq!(early.unwrap().len(), 4);
    assert_eq!(late.unwrap().len(), 4);
    assert_eq!(fake.hits("/cas/v1/tickets").await, 2);
    assert!(client.authenticator().is_authenticated());
}

#[tokio::test]
async fn test_missing_session_cookie_repeats_exchange() {
    let fake = FakeXtam::start().await;
    fake.mount_tgt(
        ResponseTemplate::new(201).insert_header("Location", fake.tgt_url().as_str()),
        2,
    )
    .await;
    fake.mount_service_ticket(ResponseTemplate::new(200).set_body_string(SERVICE_TICKET), 2)
        .await;
    fake.mount_cookie(ResponseTemplate::new(200), 2).await;
    fake.mount_listing("42", &sample_folder(), 0).await;

    let client = client(&fake);
    for _ in 0..2 {
        // Without a cookie the listing request is sent unauthenticated.
        let err = client.list_container("42").await.unwrap_err();
        assert!(matches!(
            err,
            XtamError::Api(ApiError::UnexpectedStatus { status: 404, .. })
        ));
        assert!(!client.authenticator().is_authenticated());
    }
    assert_eq!(fake.hits("/cas/v1/tickets").await, 2);
}
