//! RSA key handling and PKCS#1 v1.5 / SHA-256 signatures.
//!
//! Private keys are accepted as PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1
//! (`BEGIN RSA PRIVATE KEY`) PEM. Public keys likewise as SPKI
//! (`BEGIN PUBLIC KEY`) or PKCS#1 (`BEGIN RSA PUBLIC KEY`).

use crate::error::{LicenseError, LicenseResult};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// Smallest modulus [`generate_keypair`] will produce.
pub const MIN_KEY_BITS: usize = 2048;

/// Default modulus size for new key pairs.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// The issuer's private key.
///
/// Loaded once per process from external configuration. Never serialized
/// and never printed; `Debug` is redacted.
#[derive(Clone)]
pub struct SigningKey {
    inner: RsaPrivateKey,
}

impl SigningKey {
    /// Loads a private key from PEM text.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKey`] if the text is neither a PKCS#8
    /// nor a PKCS#1 RSA private key.
    pub fn from_pem(pem: &str) -> LicenseResult<Self> {
        let pem = pem.trim();
        let inner = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| LicenseError::InvalidKey(format!("unreadable RSA private key: {e}")))?;

        Ok(Self { inner })
    }

    /// Returns the matching public key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.to_public_key(),
        }
    }

    /// Returns the modulus size in bytes, which is also the signature length.
    #[must_use]
    pub fn signature_len(&self) -> usize {
        self.inner.size()
    }

    /// Signs the SHA-256 digest of `message` with RSASSA-PKCS1-v1_5.
    ///
    /// The scheme is deterministic: the same key and message always yield
    /// the same signature.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Signing`] if the RSA operation fails.
    pub fn sign(&self, message: &[u8]) -> LicenseResult<Vec<u8>> {
        let digest = Sha256::digest(message);
        self.inner
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| LicenseError::Signing(e.to_string()))
    }

    /// Encodes the key as PKCS#8 PEM.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKey`] if encoding fails.
    pub fn to_pem(&self) -> LicenseResult<String> {
        self.inner
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.as_str().to_owned())
            .map_err(|e| LicenseError::InvalidKey(format!("cannot encode private key: {e}")))
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("bits", &(self.inner.size() * 8))
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// The public half of the issuer's key, trusted by license verifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    inner: RsaPublicKey,
}

impl VerifyingKey {
    /// Loads a public key from PEM text (SPKI or PKCS#1).
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKey`] if the text is not an RSA public key.
    pub fn from_pem(pem: &str) -> LicenseResult<Self> {
        let pem = pem.trim();
        let inner = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| LicenseError::InvalidKey(format!("unreadable RSA public key: {e}")))?;

        Ok(Self { inner })
    }

    /// Checks an RSASSA-PKCS1-v1_5 / SHA-256 signature over `message`.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidSignature`] on any mismatch.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> LicenseResult<()> {
        let digest = Sha256::digest(message);
        self.inner
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .map_err(|_| LicenseError::InvalidSignature)
    }

    /// Encodes the key as SPKI PEM.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKey`] if encoding fails.
    pub fn to_pem(&self) -> LicenseResult<String> {
        self.inner
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| LicenseError::InvalidKey(format!("cannot encode public key: {e}")))
    }
}

/// Generates a fresh RSA key pair for a new issuer.
///
/// # Errors
///
/// Returns [`LicenseError::InvalidKey`] if `bits` is below [`MIN_KEY_BITS`]
/// or key generation fails.
pub fn generate_keypair(bits: usize) -> LicenseResult<(SigningKey, VerifyingKey)> {
    if bits < MIN_KEY_BITS {
        return Err(LicenseError::InvalidKey(format!(
            "key size {bits} is below the minimum of {MIN_KEY_BITS} bits"
        )));
    }

    let inner = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
        .map_err(|e| LicenseError::InvalidKey(format!("key generation failed: {e}")))?;
    let signing_key = SigningKey { inner };
    let verifying_key = signing_key.verifying_key();

    Ok((signing_key, verifying_key))
}
