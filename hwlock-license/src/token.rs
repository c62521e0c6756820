//! License token wire formats, parsing, and signature verification.
//!
//! Two packings exist:
//!
//! - **Packed**: `base64(payload ++ "###" ++ signature)`, one opaque blob.
//! - **Delimited**: `hardware_id|expiry|base64(signature)`, claim readable in
//!   the clear.
//!
//! They are not interchangeable, so issued tokens carry a version tag
//! (`HL1:` for packed, `HL2:` for delimited). Untagged tokens from older
//! issuers are still accepted and classified by shape.

use crate::claim::{Expiry, LicenseClaim, PAYLOAD_SEPARATOR};
use crate::error::{LicenseError, LicenseResult};
use crate::key::VerifyingKey;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between payload and signature inside a packed blob.
pub const PACKED_SEPARATOR: &[u8] = b"###";

/// Separator between a version tag and the token body.
pub const TAG_SEPARATOR: char = ':';

const TAG_PREFIX: &str = "HL";

/// How a license token is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    /// `base64(payload ++ "###" ++ signature)`.
    #[default]
    Packed,
    /// `hardware_id|expiry|base64(signature)`.
    Delimited,
}

impl TokenFormat {
    /// Returns the version tag written in front of tagged tokens.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Packed => "HL1",
            Self::Delimited => "HL2",
        }
    }

    /// Looks up a format by its version tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        [Self::Packed, Self::Delimited]
            .into_iter()
            .find(|format| format.tag() == tag)
    }

    /// Guesses the format of an untagged token.
    ///
    /// Standard base64 never contains `|`, so any pipe means delimited.
    #[must_use]
    pub fn detect(body: &str) -> Self {
        if body.contains(PAYLOAD_SEPARATOR) {
            Self::Delimited
        } else {
            Self::Packed
        }
    }
}

impl fmt::Display for TokenFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packed => f.write_str("packed"),
            Self::Delimited => f.write_str("delimited"),
        }
    }
}

impl FromStr for TokenFormat {
    type Err = LicenseError;

    fn from_str(s: &str) -> LicenseResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "packed" => Ok(Self::Packed),
            "delimited" => Ok(Self::Delimited),
            other => Err(LicenseError::InvalidToken(format!(
                "unknown token format {other:?}"
            ))),
        }
    }
}

/// A signed license claim in one of the wire formats.
///
/// Parsing does not check the signature; call [`LicenseToken::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseToken {
    format: TokenFormat,
    tagged: bool,
    claim: LicenseClaim,
    signature: Vec<u8>,
}

impl LicenseToken {
    pub(crate) fn new(
        format: TokenFormat,
        tagged: bool,
        claim: LicenseClaim,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            format,
            tagged,
            claim,
            signature,
        }
    }

    /// Parses a token string, tagged or not.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidToken`] if the token is malformed or
    /// carries an unknown version tag, and [`LicenseError::InvalidExpiry`]
    /// if the embedded expiry does not parse.
    pub fn parse(token: &str) -> LicenseResult<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(LicenseError::InvalidToken("token is empty".to_string()));
        }

        let (format, tagged, body) = match split_tag(token) {
            Some((tag, body)) => {
                let format = TokenFormat::from_tag(tag).ok_or_else(|| {
                    LicenseError::InvalidToken(format!("unsupported token version {tag:?}"))
                })?;
                (format, true, body)
            }
            None => (TokenFormat::detect(token), false, token),
        };

        let (claim, signature) = match format {
            TokenFormat::Packed => decode_packed(body)?,
            TokenFormat::Delimited => decode_delimited(body)?,
        };

        Ok(Self {
            format,
            tagged,
            claim,
            signature,
        })
    }

    /// Returns the wire format.
    #[must_use]
    pub fn format(&self) -> TokenFormat {
        self.format
    }

    /// Returns true if the token carries a version tag.
    #[must_use]
    pub fn is_tagged(&self) -> bool {
        self.tagged
    }

    /// Returns the embedded claim. Unverified until [`LicenseToken::verify`].
    #[must_use]
    pub fn claim(&self) -> &LicenseClaim {
        &self.claim
    }

    /// Returns the raw signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Encodes the token for the wire.
    #[must_use]
    pub fn encode(&self) -> String {
        let body = match self.format {
            TokenFormat::Packed => {
                let payload = self.claim.payload();
                let mut blob =
                    Vec::with_capacity(payload.len() + PACKED_SEPARATOR.len() + self.signature.len());
                blob.extend_from_slice(payload.as_bytes());
                blob.extend_from_slice(PACKED_SEPARATOR);
                blob.extend_from_slice(&self.signature);
                BASE64.encode(blob)
            }
            TokenFormat::Delimited => format!(
                "{}{PAYLOAD_SEPARATOR}{}",
                self.claim.payload(),
                BASE64.encode(&self.signature)
            ),
        };

        if self.tagged {
            format!("{}{TAG_SEPARATOR}{body}", self.format.tag())
        } else {
            body
        }
    }

    /// Checks the signature against the issuer's public key.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidSignature`] if the claim was not signed
    /// by the matching private key or has been altered.
    pub fn verify(&self, key: &VerifyingKey) -> LicenseResult<VerifiedLicense> {
        if let Err(e) = key.verify(self.claim.payload().as_bytes(), &self.signature) {
            tracing::warn!(
                hardware_id = %self.claim.hardware_id,
                "license token signature rejected"
            );
            return Err(e);
        }

        tracing::debug!(
            hardware_id = %self.claim.hardware_id,
            expiry = %self.claim.expiry,
            format = %self.format,
            "license token verified"
        );

        Ok(VerifiedLicense {
            claim: self.claim.clone(),
            format: self.format,
        })
    }
}

impl fmt::Display for LicenseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for LicenseToken {
    type Err = LicenseError;

    fn from_str(s: &str) -> LicenseResult<Self> {
        Self::parse(s)
    }
}

/// Splits `HLn:body` into its tag and body. Returns `None` for untagged tokens.
fn split_tag(token: &str) -> Option<(&str, &str)> {
    let (tag, body) = token.split_once(TAG_SEPARATOR)?;
    let version = tag.strip_prefix(TAG_PREFIX)?;
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((tag, body))
}

fn decode_packed(body: &str) -> LicenseResult<(LicenseClaim, Vec<u8>)> {
    let blob = BASE64
        .decode(body)
        .map_err(|e| LicenseError::InvalidToken(format!("invalid base64: {e}")))?;

    let split = blob
        .windows(PACKED_SEPARATOR.len())
        .position(|window| window == PACKED_SEPARATOR)
        .ok_or_else(|| {
            LicenseError::InvalidToken("packed token has no signature separator".to_string())
        })?;

    let payload = std::str::from_utf8(&blob[..split])
        .map_err(|_| LicenseError::InvalidToken("payload is not valid UTF-8".to_string()))?;
    let signature = blob[split + PACKED_SEPARATOR.len()..].to_vec();
    if signature.is_empty() {
        return Err(LicenseError::InvalidToken("signature is empty".to_string()));
    }

    Ok((LicenseClaim::from_payload(payload)?, signature))
}

fn decode_delimited(body: &str) -> LicenseResult<(LicenseClaim, Vec<u8>)> {
    let fields: Vec<&str> = body.split(PAYLOAD_SEPARATOR).collect();
    if fields.len() != 3 {
        return Err(LicenseError::InvalidToken(format!(
            "delimited token must have 3 fields, found {}",
            fields.len()
        )));
    }

    let signature = BASE64
        .decode(fields[2])
        .map_err(|e| LicenseError::InvalidToken(format!("invalid signature base64: {e}")))?;
    if signature.is_empty() {
        return Err(LicenseError::InvalidToken("signature is empty".to_string()));
    }

    let claim = LicenseClaim::new(fields[0], fields[1].parse()?);
    Ok((claim, signature))
}

/// Whether a verified license is usable on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// License is valid.
    Active,
    /// License lapsed after its last valid day.
    Expired {
        /// Last valid day.
        on: NaiveDate,
    },
}

impl LicenseStatus {
    /// Returns true if the license allows use.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A license whose signature has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedLicense {
    claim: LicenseClaim,
    format: TokenFormat,
}

impl VerifiedLicense {
    /// Returns the signed claim.
    #[must_use]
    pub fn claim(&self) -> &LicenseClaim {
        &self.claim
    }

    /// Returns the hardware id the license is bound to.
    #[must_use]
    pub fn hardware_id(&self) -> &str {
        &self.claim.hardware_id
    }

    /// Returns the wire format the token used.
    #[must_use]
    pub fn format(&self) -> TokenFormat {
        self.format
    }

    /// Returns the license status on `today`.
    #[must_use]
    pub fn status(&self, today: NaiveDate) -> LicenseStatus {
        match self.claim.expiry {
            Expiry::Until(last_day) if self.claim.expiry.is_expired_on(today) => {
                LicenseStatus::Expired { on: last_day }
            }
            _ => LicenseStatus::Active,
        }
    }

    /// Confirms the license is bound to `hardware_id` and still valid on `today`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::HardwareMismatch`] or [`LicenseError::Expired`].
    pub fn check(&self, hardware_id: &str, today: NaiveDate) -> LicenseResult<()> {
        if self.claim.hardware_id != hardware_id {
            return Err(LicenseError::HardwareMismatch {
                expected: self.claim.hardware_id.clone(),
                actual: hardware_id.to_string(),
            });
        }

        match self.status(today) {
            LicenseStatus::Active => Ok(()),
            LicenseStatus::Expired { on } => Err(LicenseError::Expired(on.to_string())),
        }
    }
}
