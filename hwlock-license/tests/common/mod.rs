//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use hwlock_license::{SigningKey, VerifyingKey};

pub const ISSUER_PRIVATE_PEM: &str = include_str!("../fixtures/issuer_private.pem");
pub const ISSUER_PRIVATE_PKCS1_PEM: &str = include_str!("../fixtures/issuer_private_pkcs1.pem");
pub const ISSUER_PUBLIC_PEM: &str = include_str!("../fixtures/issuer_public.pem");
pub const ISSUER_PUBLIC_PKCS1_PEM: &str = include_str!("../fixtures/issuer_public_pkcs1.pem");
pub const OTHER_PRIVATE_PEM: &str = include_str!("../fixtures/other_private.pem");
pub const OTHER_PUBLIC_PEM: &str = include_str!("../fixtures/other_public.pem");

/// `ABC123`, 30 days from 2025-01-01, packed and untagged, signed by the issuer key.
pub const KNOWN_PACKED_TOKEN: &str = include_str!("../fixtures/abc123_30_days.packed");

/// `ABC123`, permanent, delimited and untagged, signed by the issuer key.
pub const KNOWN_DELIMITED_TOKEN: &str = include_str!("../fixtures/abc123_permanent.delimited");

/// Returns the fixed 2048-bit issuer key pair.
pub fn issuer_keypair() -> (SigningKey, VerifyingKey) {
    let signing_key = SigningKey::from_pem(ISSUER_PRIVATE_PEM).unwrap();
    let verifying_key = VerifyingKey::from_pem(ISSUER_PUBLIC_PEM).unwrap();
    (signing_key, verifying_key)
}

/// Returns an unrelated key pair.
pub fn other_keypair() -> (SigningKey, VerifyingKey) {
    let signing_key = SigningKey::from_pem(OTHER_PRIVATE_PEM).unwrap();
    let verifying_key = VerifyingKey::from_pem(OTHER_PUBLIC_PEM).unwrap();
    (signing_key, verifying_key)
}

/// Midday UTC on the given date.
pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
