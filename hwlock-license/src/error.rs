//! Error types for license issuing and revoke-code verification.

use thiserror::Error;

/// Broad category of a [`LicenseError`].
///
/// Callers use this to treat user typos, key problems, and forgery attempts
/// differently (for example, logging integrity failures separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed input. Recoverable by correcting the input.
    Format,
    /// Key material or signing failure.
    Crypto,
    /// A checksum, signature, or binding did not match.
    Integrity,
    /// A correctly signed license that is past its expiry date.
    Expired,
}

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Revoke code does not start with `REVOKE#`.
    #[error("invalid revoke code format: not a revoke code")]
    InvalidRevokeFormat,

    /// Revoke code does not split into exactly three `#`-separated fields.
    #[error("incomplete revoke code: expected 3 fields, found {0}")]
    IncompleteRevokeCode(usize),

    /// Revoke checksum does not match the recomputed value.
    #[error("revoke code checksum mismatch (possibly forged)")]
    ChecksumMismatch,

    /// License token could not be decoded.
    #[error("invalid license token: {0}")]
    InvalidToken(String),

    /// Expiry could not be resolved or parsed.
    #[error("invalid expiry: {0}")]
    InvalidExpiry(String),

    /// Key material could not be loaded.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The signing operation itself failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Token signature does not verify against the public key.
    #[error("license token signature invalid")]
    InvalidSignature,

    /// Token is bound to a different hardware id.
    #[error("license is bound to hardware id {expected}, not {actual}")]
    HardwareMismatch {
        /// Hardware id embedded in the token.
        expected: String,
        /// Hardware id presented by the caller.
        actual: String,
    },

    /// License has expired.
    #[error("license expired on {0}")]
    Expired(String),
}

impl LicenseError {
    /// Returns the category this error belongs to.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidRevokeFormat
            | Self::IncompleteRevokeCode(_)
            | Self::InvalidToken(_)
            | Self::InvalidExpiry(_) => ErrorClass::Format,
            Self::InvalidKey(_) | Self::Signing(_) => ErrorClass::Crypto,
            Self::ChecksumMismatch | Self::InvalidSignature | Self::HardwareMismatch { .. } => {
                ErrorClass::Integrity
            }
            Self::Expired(_) => ErrorClass::Expired,
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
