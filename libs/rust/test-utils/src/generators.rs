//! Shared proptest generators for XTAM folder listings and payloads.

use crate::fixtures::ListingEntry;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Generate record type names, including types templates cannot resolve.
pub fn record_type_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just("Secret".to_string()),
        3 => Just("Certificate".to_string()),
        1 => Just("SSH Key".to_string()),
        1 => Just("Password".to_string()),
    ]
}

/// Generate lowercase record names.
pub fn record_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}"
}

/// Generate media types for certificate data URIs, including none.
pub fn media_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("application/x-x509-ca-cert".to_string()),
        Just("application/x-pem-file".to_string()),
        Just("application/octet-stream".to_string()),
    ]
}

/// Generate folder listings whose names are unique ignoring case.
///
/// Names come out in mixed case so lookups have to fold case.
pub fn unique_listing_strategy() -> impl Strategy<Value = Vec<ListingEntry>> {
    prop::collection::btree_map(
        record_name_strategy(),
        (record_type_name_strategy(), any::<bool>()),
        0..24,
    )
    .prop_map(listing_from_map)
}

/// Generate folder listings containing at least two names that are equal
/// ignoring case.
pub fn colliding_listing_strategy() -> impl Strategy<Value = Vec<ListingEntry>> {
    (
        prop::collection::btree_map(
            record_name_strategy(),
            (record_type_name_strategy(), any::<bool>()),
            1..24,
        ),
        record_type_name_strategy(),
        any::<prop::sample::Index>(),
        any::<prop::sample::Index>(),
    )
        .prop_map(|(names, record_type, pick, position)| {
            let mut listing = listing_from_map(names);
            let original = pick.get(&listing).name.clone();
            let twin = ListingEntry::new(&original.to_uppercase(), 9_999, &record_type);
            let at = position.index(listing.len() + 1);
            listing.insert(at, twin);
            listing
        })
}

fn listing_from_map(names: BTreeMap<String, (String, bool)>) -> Vec<ListingEntry> {
    names
        .into_iter()
        .zip(1u64..)
        .map(|((name, (record_type, shout)), id)| {
            let name = if shout { name.to_uppercase() } else { name };
            ListingEntry::new(&name, id, &record_type)
        })
        .collect()
}
