//! License token issuing.

use crate::claim::{Expiry, LicenseClaim};
use crate::error::LicenseResult;
use crate::key::SigningKey;
use crate::token::{LicenseToken, TokenFormat};
use chrono::{DateTime, Utc};

/// How the issuer packages tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuerConfig {
    /// Wire format of issued tokens.
    pub format: TokenFormat,
    /// Prefix tokens with a version tag. Disable only for clients that
    /// predate tagged tokens.
    pub tagged: bool,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            format: TokenFormat::Packed,
            tagged: true,
        }
    }
}

/// The result of a successful issue: the token and what it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedLicense {
    /// The signed claim.
    pub claim: LicenseClaim,
    /// The token to hand to the customer.
    pub token: LicenseToken,
}

impl IssuedLicense {
    /// Returns the wire form of the token.
    #[must_use]
    pub fn encoded(&self) -> String {
        self.token.encode()
    }
}

/// Issues a license token with the default [`IssuerConfig`].
///
/// See [`issue_with`].
pub fn issue(
    hardware_id: &str,
    validity_days: u32,
    signing_key: &SigningKey,
    now: DateTime<Utc>,
) -> LicenseResult<IssuedLicense> {
    issue_with(&IssuerConfig::default(), hardware_id, validity_days, signing_key, now)
}

/// Issues a license token binding `hardware_id` to an expiry.
///
/// `validity_days == 0` grants a permanent license. Otherwise the license
/// runs through the UTC date `validity_days` after `now`. The output depends
/// only on the inputs: same arguments, same token.
///
/// # Errors
///
/// Returns [`crate::LicenseError::InvalidExpiry`] if the expiry date is out of
/// range and [`crate::LicenseError::Signing`] if signing fails. No token is
/// produced on error.
pub fn issue_with(
    config: &IssuerConfig,
    hardware_id: &str,
    validity_days: u32,
    signing_key: &SigningKey,
    now: DateTime<Utc>,
) -> LicenseResult<IssuedLicense> {
    let expiry = Expiry::resolve(validity_days, now)?;
    let claim = LicenseClaim::new(hardware_id, expiry);
    let signature = signing_key.sign(claim.payload().as_bytes())?;

    tracing::debug!(
        hardware_id = %claim.hardware_id,
        expiry = %claim.expiry,
        format = %config.format,
        tagged = config.tagged,
        "issued license token"
    );

    let token = LicenseToken::new(config.format, config.tagged, claim.clone(), signature);
    Ok(IssuedLicense { claim, token })
}
