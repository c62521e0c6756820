//! Shared test helpers for console tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use hwlock_admin::cli::{IssueArgs, RevokeArgs};
use hwlock_license::{TokenFormat, SALT_REVOKE};
use std::path::{Path, PathBuf};

pub const ISSUER_PRIVATE_PEM: &str =
    include_str!("../../../hwlock-license/tests/fixtures/issuer_private.pem");
pub const ISSUER_PUBLIC_PEM: &str =
    include_str!("../../../hwlock-license/tests/fixtures/issuer_public.pem");
pub const OTHER_PUBLIC_PEM: &str =
    include_str!("../../../hwlock-license/tests/fixtures/other_public.pem");
pub const KNOWN_PACKED_TOKEN: &str =
    include_str!("../../../hwlock-license/tests/fixtures/abc123_30_days.packed");

pub fn new_year_2025() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap()
}

/// Writes `contents` to `name` inside `dir` and returns the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn issue_args(hardware_id: &str, days: u32, private_key: Option<PathBuf>) -> IssueArgs {
    IssueArgs {
        hardware_id: hardware_id.to_string(),
        days,
        format: TokenFormat::Packed,
        bare: false,
        json: false,
        private_key,
    }
}

pub fn revoke_args(code: &str) -> RevokeArgs {
    RevokeArgs {
        code: code.to_string(),
        salt: SALT_REVOKE.to_string(),
    }
}
