//! Revoke codes: `REVOKE#<hardware_id>#<checksum>`.
//!
//! A client that gives up its license shows the user a revoke code. The
//! operator checks it here before issuing a license for a new machine.
//!
//! The checksum is the first 8 uppercase hex characters of
//! `MD5(hardware_id + salt)`. The salt ships inside every copy of the
//! tooling, so this only catches typos and casual tampering. Anyone holding
//! the salt can mint a valid code. Changing the scheme would invalidate
//! every client already in the field.

use crate::error::{LicenseError, LicenseResult};
use md5::{Digest, Md5};
use std::fmt;
use std::str::FromStr;

/// Salt shared by every client and operator tool.
pub const SALT_REVOKE: &str = "MY_APP_REVOKE_SECRET_2025";

/// Leading marker of every revoke code, including the field separator.
pub const REVOKE_PREFIX: &str = "REVOKE#";

/// Separator between revoke code fields.
pub const FIELD_SEPARATOR: char = '#';

/// Number of hex characters kept from the digest.
pub const CHECKSUM_LEN: usize = 8;

/// Computes the checksum for `hardware_id` under `salt`.
#[must_use]
pub fn checksum(hardware_id: &str, salt: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(hardware_id.as_bytes());
    hasher.update(salt.as_bytes());
    let mut hex = hex::encode_upper(hasher.finalize());
    hex.truncate(CHECKSUM_LEN);
    hex
}

/// A parsed revoke code. Parsing does not check the checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevokeCode {
    hardware_id: String,
    checksum: String,
}

impl RevokeCode {
    /// Creates the revoke code a client would show for `hardware_id`.
    #[must_use]
    pub fn issue(hardware_id: &str, salt: &str) -> Self {
        Self {
            hardware_id: hardware_id.to_string(),
            checksum: checksum(hardware_id, salt),
        }
    }

    /// Parses the structure of a revoke code.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidRevokeFormat`] if the `REVOKE#` prefix
    /// is missing and [`LicenseError::IncompleteRevokeCode`] unless the code
    /// has exactly three `#`-separated fields.
    pub fn parse(code: &str) -> LicenseResult<Self> {
        let code = code.trim();
        if !code.starts_with(REVOKE_PREFIX) {
            return Err(LicenseError::InvalidRevokeFormat);
        }

        let fields: Vec<&str> = code.split(FIELD_SEPARATOR).collect();
        if fields.len() != 3 {
            return Err(LicenseError::IncompleteRevokeCode(fields.len()));
        }

        Ok(Self {
            hardware_id: fields[1].to_string(),
            checksum: fields[2].to_string(),
        })
    }

    /// Returns the hardware id whose binding is being released.
    #[must_use]
    pub fn hardware_id(&self) -> &str {
        &self.hardware_id
    }

    /// Returns the checksum as supplied.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Checks the checksum against `salt`. Comparison is case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::ChecksumMismatch`] if the code was not made
    /// with `salt`.
    pub fn verify(&self, salt: &str) -> LicenseResult<&str> {
        if self.checksum != checksum(&self.hardware_id, salt) {
            tracing::warn!(
                hardware_id = %self.hardware_id,
                "revoke code checksum mismatch, possibly forged"
            );
            return Err(LicenseError::ChecksumMismatch);
        }

        tracing::debug!(hardware_id = %self.hardware_id, "revoke code verified");
        Ok(&self.hardware_id)
    }
}

impl fmt::Display for RevokeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REVOKE_PREFIX}{}{FIELD_SEPARATOR}{}", self.hardware_id, self.checksum)
    }
}

impl FromStr for RevokeCode {
    type Err = LicenseError;

    fn from_str(s: &str) -> LicenseResult<Self> {
        Self::parse(s)
    }
}

/// Verifies a revoke code and returns the hardware id it names.
///
/// # Errors
///
/// Format errors for malformed codes, [`LicenseError::ChecksumMismatch`] for
/// a wrong checksum.
pub fn verify(code: &str, salt: &str) -> LicenseResult<String> {
    let code = RevokeCode::parse(code).inspect_err(|e| {
        tracing::debug!(error = %e, "malformed revoke code");
    })?;
    code.verify(salt).map(str::to_string)
}
