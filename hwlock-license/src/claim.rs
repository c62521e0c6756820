//! License claims: the hardware id and expiry a token vouches for.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Literal used in place of a date for licenses that never expire.
pub const PERMANENT: &str = "PERMANENT";

/// Separator between the hardware id and the expiry in the signed payload.
pub const PAYLOAD_SEPARATOR: char = '|';

const DATE_FORMAT: &str = "%Y-%m-%d";

/// When a license stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Expiry {
    /// Never expires. Rendered as [`PERMANENT`].
    Permanent,
    /// Valid through the end of this calendar day. Rendered `YYYY-MM-DD`.
    Until(NaiveDate),
}

impl Expiry {
    /// Resolves a validity period into an expiry.
    ///
    /// Zero days means a permanent grant. Otherwise the expiry is the UTC
    /// calendar date `validity_days` after `now`; time of day is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidExpiry`] if the date overflows the
    /// supported calendar range.
    pub fn resolve(validity_days: u32, now: DateTime<Utc>) -> LicenseResult<Self> {
        if validity_days == 0 {
            return Ok(Self::Permanent);
        }

        now.date_naive()
            .checked_add_days(Days::new(u64::from(validity_days)))
            .map(Self::Until)
            .ok_or_else(|| {
                LicenseError::InvalidExpiry(format!(
                    "{validity_days} days from {now} is out of range"
                ))
            })
    }

    /// Returns true for the permanent sentinel.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent)
    }

    /// Returns true if a license with this expiry is no longer valid on `today`.
    #[must_use]
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        match self {
            Self::Permanent => false,
            Self::Until(last_day) => today > *last_day,
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent => f.write_str(PERMANENT),
            Self::Until(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

impl FromStr for Expiry {
    type Err = LicenseError;

    fn from_str(s: &str) -> LicenseResult<Self> {
        if s == PERMANENT {
            return Ok(Self::Permanent);
        }

        // chrono accepts unpadded fields; the wire format does not.
        if s.len() != 10 {
            return Err(LicenseError::InvalidExpiry(format!(
                "expected YYYY-MM-DD or {PERMANENT}, got {s:?}"
            )));
        }

        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Self::Until)
            .map_err(|e| LicenseError::InvalidExpiry(format!("{s:?}: {e}")))
    }
}

impl From<Expiry> for String {
    fn from(expiry: Expiry) -> Self {
        expiry.to_string()
    }
}

impl TryFrom<String> for Expiry {
    type Error = LicenseError;

    fn try_from(value: String) -> LicenseResult<Self> {
        value.parse()
    }
}

/// What a license token asserts: this hardware id is licensed until this expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseClaim {
    /// Opaque identifier reported by the licensed machine.
    pub hardware_id: String,
    /// When the license stops being valid.
    pub expiry: Expiry,
}

impl LicenseClaim {
    /// Creates a claim.
    #[must_use]
    pub fn new(hardware_id: impl Into<String>, expiry: Expiry) -> Self {
        Self {
            hardware_id: hardware_id.into(),
            expiry,
        }
    }

    /// Returns the canonical signed payload, `hardware_id|expiry`.
    ///
    /// A hardware id containing `|` makes the delimited token format
    /// ambiguous. The issuer does not reject such ids.
    #[must_use]
    pub fn payload(&self) -> String {
        format!("{}{PAYLOAD_SEPARATOR}{}", self.hardware_id, self.expiry)
    }

    /// Parses a canonical payload back into a claim.
    ///
    /// The expiry never contains `|`, so the split happens at the last one.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidToken`] if there is no separator and
    /// [`LicenseError::InvalidExpiry`] if the expiry does not parse.
    pub fn from_payload(payload: &str) -> LicenseResult<Self> {
        let (hardware_id, expiry) = payload.rsplit_once(PAYLOAD_SEPARATOR).ok_or_else(|| {
            LicenseError::InvalidToken("payload has no hardware id separator".to_string())
        })?;

        Ok(Self::new(hardware_id, expiry.parse()?))
    }
}
