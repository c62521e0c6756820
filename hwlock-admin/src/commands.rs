//! Subcommand implementations.
//!
//! Each command returns a report; rendering to text or JSON happens in
//! [`crate::run`].

use crate::cli::{InspectArgs, IssueArgs, KeygenArgs, RevokeArgs, RevokeCodeArgs};
use crate::config::{load_public_key, PrivateKeySource};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use hwlock_license::{
    generate_keypair, issue_with, revoke, ErrorClass, Expiry, IssuerConfig, LicenseError,
    LicenseStatus, LicenseToken, RevokeCode, SigningKey, TokenFormat,
};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the generated private key.
pub const PRIVATE_KEY_FILE: &str = "private.pem";

/// File name of the generated public key.
pub const PUBLIC_KEY_FILE: &str = "public.pem";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueReport {
    pub hardware_id: String,
    pub expiry: Expiry,
    pub format: TokenFormat,
    pub tagged: bool,
    pub token: String,
}

impl fmt::Display for IssueReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "License issued")?;
        writeln!(f, "  Hardware id: {}", self.hardware_id)?;
        writeln!(f, "  Valid until: {}", self.expiry)?;
        if self.tagged {
            writeln!(f, "  Format:      {} ({})", self.format, self.format.tag())?;
        } else {
            writeln!(f, "  Format:      {} (untagged)", self.format)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.token)
    }
}

/// Issues a token, loading the signing key from `args` or the environment.
///
/// # Errors
///
/// Fails before signing if the hardware id is blank or no key is configured.
pub fn issue(args: &IssueArgs, now: DateTime<Utc>) -> Result<IssueReport> {
    require_hardware_id(&args.hardware_id)?;
    let source = PrivateKeySource::resolve(args.private_key.as_deref())?;
    info!("Loading signing key from {}", source.describe());
    let key = source.load()?;
    issue_with_key(args, &key, now)
}

/// Issues a token with an already loaded key.
///
/// # Errors
///
/// Fails if the hardware id is blank or signing fails.
pub fn issue_with_key(
    args: &IssueArgs,
    key: &SigningKey,
    now: DateTime<Utc>,
) -> Result<IssueReport> {
    let hardware_id = require_hardware_id(&args.hardware_id)?;
    let config = IssuerConfig {
        format: args.format,
        tagged: !args.bare,
    };

    let issued = issue_with(&config, hardware_id, args.days, key, now)
        .context("could not issue license")?;
    info!(
        "Issued {} license for {} (valid until {})",
        config.format, issued.claim.hardware_id, issued.claim.expiry
    );

    Ok(IssueReport {
        token: issued.encoded(),
        hardware_id: issued.claim.hardware_id,
        expiry: issued.claim.expiry,
        format: config.format,
        tagged: config.tagged,
    })
}

fn require_hardware_id(raw: &str) -> Result<&str> {
    let hardware_id = raw.trim();
    if hardware_id.is_empty() {
        bail!("hardware id is empty");
    }
    Ok(hardware_id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevokeReport {
    pub hardware_id: String,
}

impl fmt::Display for RevokeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Revoke code verified")?;
        write!(
            f,
            "  Machine {} has released its license. A new license may be issued for its replacement.",
            self.hardware_id
        )
    }
}

/// Verifies a revoke code.
///
/// # Errors
///
/// Returns the [`LicenseError`] (wrapped) describing why the code was rejected.
pub fn verify_revoke(args: &RevokeArgs) -> Result<RevokeReport> {
    match revoke::verify(&args.code, &args.salt) {
        Ok(hardware_id) => {
            info!("Revoke code accepted for {}", hardware_id);
            Ok(RevokeReport { hardware_id })
        }
        Err(e) => {
            if e.class() == ErrorClass::Integrity {
                warn!("Rejected revoke code {:?}: {}", args.code.trim(), e);
            }
            Err(anyhow::Error::new(e).context("revoke code rejected"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevokeCodeReport {
    pub hardware_id: String,
    pub code: String,
}

impl fmt::Display for RevokeCodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Renders the revoke code a client would show.
///
/// # Errors
///
/// Fails if the hardware id is blank or contains `#`, since the code would
/// not parse back.
pub fn revoke_code(args: &RevokeCodeArgs) -> Result<RevokeCodeReport> {
    let hardware_id = require_hardware_id(&args.hardware_id)?;
    if hardware_id.contains(revoke::FIELD_SEPARATOR) {
        bail!("hardware id may not contain '{}'", revoke::FIELD_SEPARATOR);
    }

    let code = RevokeCode::issue(hardware_id, &args.salt);
    Ok(RevokeCodeReport {
        hardware_id: hardware_id.to_string(),
        code: code.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub hardware_id: String,
    pub expiry: Expiry,
    pub format: TokenFormat,
    pub tagged: bool,
    pub status: LicenseStatus,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Signature valid")?;
        writeln!(f, "  Hardware id: {}", self.hardware_id)?;
        writeln!(f, "  Valid until: {}", self.expiry)?;
        writeln!(
            f,
            "  Format:      {}{}",
            self.format,
            if self.tagged { "" } else { " (untagged)" }
        )?;
        match self.status {
            LicenseStatus::Active => write!(f, "  Status:      active"),
            LicenseStatus::Expired { on } => write!(f, "  Status:      expired after {on}"),
        }
    }
}

/// Verifies a token against the public key given in `args`.
///
/// # Errors
///
/// Fails if the key cannot be loaded, the token is malformed or forged, or
/// a requested hardware id does not match.
pub fn inspect(args: &InspectArgs, today: NaiveDate) -> Result<InspectReport> {
    let key = load_public_key(&args.public_key)?;
    let token = LicenseToken::parse(&args.token).context("could not parse license token")?;

    let verified = token.verify(&key).map_err(|e: LicenseError| {
        warn!("Rejected token for {}: {}", token.claim().hardware_id, e);
        anyhow::Error::new(e).context("license token rejected")
    })?;

    if let Some(hardware_id) = &args.hardware_id {
        verified
            .check(hardware_id.trim(), today)
            .context("license does not cover this machine")?;
    }

    Ok(InspectReport {
        hardware_id: verified.hardware_id().to_string(),
        expiry: verified.claim().expiry,
        format: verified.format(),
        tagged: token.is_tagged(),
        status: verified.status(today),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeygenReport {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
    pub bits: usize,
}

impl fmt::Display for KeygenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generated {}-bit RSA key pair", self.bits)?;
        writeln!(f, "  Private key: {}", self.private_key.display())?;
        write!(f, "  Public key:  {}", self.public_key.display())
    }
}

/// Generates a key pair and writes both halves as PEM.
///
/// # Errors
///
/// Fails if either file exists (without `--force`), generation fails, or
/// the files cannot be written.
pub fn keygen(args: &KeygenArgs) -> Result<KeygenReport> {
    let private_key = args.out_dir.join(PRIVATE_KEY_FILE);
    let public_key = args.out_dir.join(PUBLIC_KEY_FILE);

    if !args.force {
        for path in [&private_key, &public_key] {
            if path.exists() {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
        }
    }

    info!("Generating {}-bit RSA key pair", args.bits);
    let (signing_key, verifying_key) =
        generate_keypair(args.bits).context("key generation failed")?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("could not create {}", args.out_dir.display()))?;
    write_private(&private_key, &signing_key.to_pem()?)?;
    std::fs::write(&public_key, verifying_key.to_pem()?)
        .with_context(|| format!("could not write {}", public_key.display()))?;

    Ok(KeygenReport {
        private_key,
        public_key,
        bits: args.bits,
    })
}

fn write_private(path: &Path, pem: &str) -> Result<()> {
    std::fs::write(path, pem).with_context(|| format!("could not write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("could not restrict permissions on {}", path.display()))?;
    }

    Ok(())
}
