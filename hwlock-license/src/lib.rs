//! Hardware-bound license tokens and revoke codes.
//!
//! This crate handles:
//! - Issuing license tokens that bind a hardware id to an expiry date
//! - Parsing and verifying those tokens against the issuer's public key
//! - Creating and verifying revoke codes used to move a license to a new machine
//!
//! Everything here is a pure function of its inputs. There is no ledger of
//! issued or revoked licenses; revocation is only a checksum check, and a
//! previously issued token stays valid after its machine is revoked.
//!
//! # License Token Format
//!
//! The signed payload is `hardware_id|expiry`, where expiry is `YYYY-MM-DD`
//! or `PERMANENT`. It is signed with RSASSA-PKCS1-v1_5 over SHA-256 and packed
//! as `HL1:base64(payload ++ "###" ++ signature)`. See [`TokenFormat`] for the
//! delimited alternative and untagged legacy tokens.
//!
//! # Revoke Code Format
//!
//! `REVOKE#<hardware_id>#<checksum>`, see [`revoke`].

mod claim;
mod error;
mod issuer;
mod key;
pub mod revoke;
mod token;

pub use claim::{Expiry, LicenseClaim, PAYLOAD_SEPARATOR, PERMANENT};
pub use error::{ErrorClass, LicenseError, LicenseResult};
pub use issuer::{issue, issue_with, IssuedLicense, IssuerConfig};
pub use key::{generate_keypair, SigningKey, VerifyingKey, DEFAULT_KEY_BITS, MIN_KEY_BITS};
pub use revoke::{RevokeCode, SALT_REVOKE};
pub use token::{LicenseStatus, LicenseToken, TokenFormat, VerifiedLicense, PACKED_SEPARATOR};
