mod common;

use common::{
    issue_args, new_year_2025, revoke_args, write_file, ISSUER_PRIVATE_PEM, ISSUER_PUBLIC_PEM,
    KNOWN_PACKED_TOKEN, OTHER_PUBLIC_PEM,
};
use hwlock_admin::cli::{InspectArgs, KeygenArgs, RevokeCodeArgs};
use hwlock_admin::commands::{
    self, inspect, issue, issue_with_key, keygen, revoke_code, verify_revoke,
};
use hwlock_admin::config::{PrivateKeySource, LEGACY_PRIVATE_KEY_ENV, PRIVATE_KEY_ENV};
use hwlock_license::{
    Expiry, LicenseError, LicenseStatus, LicenseToken, SigningKey, TokenFormat, VerifyingKey,
    SALT_REVOKE,
};
use pretty_assertions::assert_eq;
use std::path::Path;

fn issuer_key() -> SigningKey {
    SigningKey::from_pem(ISSUER_PRIVATE_PEM).unwrap()
}

fn inspect_args(token: &str, public_key: &Path, hardware_id: Option<&str>) -> InspectArgs {
    InspectArgs {
        token: token.to_string(),
        public_key: public_key.to_path_buf(),
        hardware_id: hardware_id.map(str::to_string),
        json: false,
    }
}

// ── Key source ───────────────────────────────────────────────────

#[test]
fn explicit_file_wins_over_env() {
    let source = PrivateKeySource::resolve_with(Some(Path::new("issuer.pem")), |_| {
        Some("pem".to_string())
    })
    .unwrap();
    assert_eq!(source, PrivateKeySource::File("issuer.pem".into()));
}

#[test]
fn primary_env_var_preferred() {
    let source = PrivateKeySource::resolve_with(None, |var| Some(format!("{var} pem"))).unwrap();
    assert!(matches!(source, PrivateKeySource::Env { var, .. } if var == PRIVATE_KEY_ENV));
}

#[test]
fn legacy_env_var_accepted() {
    let source = PrivateKeySource::resolve_with(None, |var| {
        (var == LEGACY_PRIVATE_KEY_ENV).then(|| ISSUER_PRIVATE_PEM.to_string())
    })
    .unwrap();
    assert!(matches!(source, PrivateKeySource::Env { var, .. } if var == LEGACY_PRIVATE_KEY_ENV));
    assert!(source.load().is_ok());
}

#[test]
fn blank_env_var_ignored() {
    let err = PrivateKeySource::resolve_with(None, |_| Some("   ".to_string())).unwrap_err();
    assert!(format!("{err}").contains("no signing key configured"));
}

#[test]
fn source_debug_and_description_hide_pem() {
    let source = PrivateKeySource::Env {
        var: PRIVATE_KEY_ENV,
        pem: ISSUER_PRIVATE_PEM.to_string(),
    };
    assert_eq!(source.describe(), "$HWLOCK_PRIVATE_KEY");
    let debug = format!("{source:?}");
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("BEGIN"));
}

#[test]
fn unreadable_key_file_reports_path() {
    let err = PrivateKeySource::File("/nonexistent/issuer.pem".into())
        .load()
        .unwrap_err();
    assert!(format!("{err}").contains("/nonexistent/issuer.pem"));
}

#[test]
fn malformed_key_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "issuer.pem", "not a key");
    let err = PrivateKeySource::File(path).load().unwrap_err();
    assert!(format!("{err:#}").contains("could not decode private key"));
}

// ── Issue ────────────────────────────────────────────────────────

#[test]
fn issue_matches_known_token() {
    let mut args = issue_args("ABC123", 30, None);
    args.bare = true;
    let report = issue_with_key(&args, &issuer_key(), new_year_2025()).unwrap();

    assert_eq!(report.token, KNOWN_PACKED_TOKEN.trim());
    assert_eq!(report.expiry.to_string(), "2025-01-31");
    assert!(!report.tagged);
}

#[test]
fn issue_loads_key_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "issuer.pem", ISSUER_PRIVATE_PEM);
    let report = issue(&issue_args("ABC123", 0, Some(path)), new_year_2025()).unwrap();

    assert_eq!(report.expiry, Expiry::Permanent);
    assert!(report.token.starts_with("HL1:"));
}

#[test]
fn issue_trims_hardware_id() {
    let report = issue_with_key(
        &issue_args("  ABC123\n", 30, None),
        &issuer_key(),
        new_year_2025(),
    )
    .unwrap();
    assert_eq!(report.hardware_id, "ABC123");
}

#[test]
fn blank_hardware_id_rejected_before_key_lookup() {
    let err = issue(&issue_args("   ", 0, None), new_year_2025()).unwrap_err();
    assert!(format!("{err}").contains("hardware id is empty"));
}

#[test]
fn issue_delimited() {
    let mut args = issue_args("ABC123", 30, None);
    args.format = TokenFormat::Delimited;
    let report = issue_with_key(&args, &issuer_key(), new_year_2025()).unwrap();
    assert!(report.token.starts_with("HL2:ABC123|2025-01-31|"));
}

#[test]
fn issue_report_text_ends_with_token() {
    let report = issue_with_key(&issue_args("ABC123", 30, None), &issuer_key(), new_year_2025())
        .unwrap();
    let text = report.to_string();
    assert!(text.contains("Valid until: 2025-01-31"));
    assert!(text.contains("packed (HL1)"));
    assert!(text.ends_with(&report.token));
}

#[test]
fn issue_report_json() {
    let report = issue_with_key(&issue_args("ABC123", 0, None), &issuer_key(), new_year_2025())
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["hardware_id"], "ABC123");
    assert_eq!(json["expiry"], "PERMANENT");
    assert_eq!(json["format"], "packed");
    assert_eq!(json["tagged"], true);
}

// ── Revoke ───────────────────────────────────────────────────────

#[test]
fn revoke_accepts_valid_code() {
    let report = verify_revoke(&revoke_args("REVOKE#ABC123#D8758EF0")).unwrap();
    assert_eq!(report.hardware_id, "ABC123");
    assert!(report.to_string().contains("Machine ABC123"));
}

#[test]
fn revoke_reports_mismatch() {
    let err = verify_revoke(&revoke_args("REVOKE#ABC123#D8758EF1")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LicenseError>(),
        Some(LicenseError::ChecksumMismatch)
    ));
    assert!(format!("{err:#}").contains("possibly forged"));
}

#[test]
fn revoke_reports_format_errors() {
    let err = verify_revoke(&revoke_args("foo")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LicenseError>(),
        Some(LicenseError::InvalidRevokeFormat)
    ));

    let err = verify_revoke(&revoke_args("REVOKE#a#b#c")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LicenseError>(),
        Some(LicenseError::IncompleteRevokeCode(4))
    ));
}

#[test]
fn revoke_code_round_trips_through_revoke() {
    let report = revoke_code(&RevokeCodeArgs {
        hardware_id: "BFEBFBFF000906EA-5CF3".to_string(),
        salt: SALT_REVOKE.to_string(),
    })
    .unwrap();
    assert_eq!(report.code, "REVOKE#BFEBFBFF000906EA-5CF3#77FD5C41");

    let verified = verify_revoke(&revoke_args(&report.code)).unwrap();
    assert_eq!(verified.hardware_id, "BFEBFBFF000906EA-5CF3");
}

#[test]
fn revoke_code_refuses_hash_in_hardware_id() {
    let err = revoke_code(&RevokeCodeArgs {
        hardware_id: "rack#7".to_string(),
        salt: SALT_REVOKE.to_string(),
    })
    .unwrap_err();
    assert!(format!("{err}").contains("may not contain"));
}

// ── Inspect ──────────────────────────────────────────────────────

#[test]
fn inspect_reports_claim_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let public_key = write_file(dir.path(), "public.pem", ISSUER_PUBLIC_PEM);

    let report = inspect(
        &inspect_args(KNOWN_PACKED_TOKEN, &public_key, None),
        new_year_2025().date_naive(),
    )
    .unwrap();
    assert_eq!(report.hardware_id, "ABC123");
    assert_eq!(report.format, TokenFormat::Packed);
    assert!(!report.tagged);
    assert_eq!(report.status, LicenseStatus::Active);
    assert!(report.to_string().contains("Status:      active"));
}

#[test]
fn inspect_reports_expired_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let public_key = write_file(dir.path(), "public.pem", ISSUER_PUBLIC_PEM);
    let later = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

    let report = inspect(&inspect_args(KNOWN_PACKED_TOKEN, &public_key, None), later).unwrap();
    assert!(!report.status.is_active());
    assert!(report.to_string().contains("expired after 2025-01-31"));
}

#[test]
fn inspect_with_hardware_id_enforces_binding() {
    let dir = tempfile::tempdir().unwrap();
    let public_key = write_file(dir.path(), "public.pem", ISSUER_PUBLIC_PEM);
    let today = new_year_2025().date_naive();

    inspect(&inspect_args(KNOWN_PACKED_TOKEN, &public_key, Some("ABC123")), today).unwrap();

    let err = inspect(
        &inspect_args(KNOWN_PACKED_TOKEN, &public_key, Some("XYZ789")),
        today,
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LicenseError>(),
        Some(LicenseError::HardwareMismatch { .. })
    ));
}

#[test]
fn inspect_rejects_foreign_key() {
    let dir = tempfile::tempdir().unwrap();
    let public_key = write_file(dir.path(), "public.pem", OTHER_PUBLIC_PEM);

    let err = inspect(
        &inspect_args(KNOWN_PACKED_TOKEN, &public_key, None),
        new_year_2025().date_naive(),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LicenseError>(),
        Some(LicenseError::InvalidSignature)
    ));
}

#[test]
fn inspect_rejects_garbage_token() {
    let dir = tempfile::tempdir().unwrap();
    let public_key = write_file(dir.path(), "public.pem", ISSUER_PUBLIC_PEM);

    let err = inspect(
        &inspect_args("HL7:whatever", &public_key, None),
        new_year_2025().date_naive(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("could not parse license token"));
}

// ── Keygen ───────────────────────────────────────────────────────

#[test]
fn keygen_writes_usable_pair() {
    let dir = tempfile::tempdir().unwrap();
    let args = KeygenArgs {
        out_dir: dir.path().join("keys"),
        bits: 2048,
        force: false,
    };
    let report = keygen(&args).unwrap();

    let sk = SigningKey::from_pem(&std::fs::read_to_string(&report.private_key).unwrap()).unwrap();
    let vk = VerifyingKey::from_pem(&std::fs::read_to_string(&report.public_key).unwrap()).unwrap();
    assert_eq!(sk.verifying_key(), vk);

    let issued = hwlock_license::issue("ABC123", 0, &sk, new_year_2025()).unwrap();
    let token = LicenseToken::parse(&issued.encoded()).unwrap();
    token.verify(&vk).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&report.private_key).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn keygen_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), commands::PRIVATE_KEY_FILE, "existing");

    let args = KeygenArgs {
        out_dir: dir.path().to_path_buf(),
        bits: 2048,
        force: false,
    };
    let err = keygen(&args).unwrap_err();
    assert!(format!("{err}").contains("already exists"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join(commands::PRIVATE_KEY_FILE)).unwrap(),
        "existing"
    );
}

#[test]
fn keygen_rejects_small_keys() {
    let dir = tempfile::tempdir().unwrap();
    let args = KeygenArgs {
        out_dir: dir.path().to_path_buf(),
        bits: 1024,
        force: false,
    };
    assert!(keygen(&args).is_err());
    assert!(!dir.path().join(commands::PRIVATE_KEY_FILE).exists());
}
