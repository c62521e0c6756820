//! Where the issuer's key material comes from.

use anyhow::{bail, Context, Result};
use hwlock_license::{SigningKey, VerifyingKey};
use std::path::{Path, PathBuf};

/// Environment variable holding the issuer's private key as PEM text.
pub const PRIVATE_KEY_ENV: &str = "HWLOCK_PRIVATE_KEY";

/// Older deployments stored the key under this name.
pub const LEGACY_PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Where to load the signing key from.
#[derive(Clone, PartialEq, Eq)]
pub enum PrivateKeySource {
    /// A PEM file on disk.
    File(PathBuf),
    /// PEM text taken from the named environment variable.
    Env {
        /// Variable the PEM came from.
        var: &'static str,
        /// The PEM text.
        pem: String,
    },
}

impl PrivateKeySource {
    /// Picks the key source from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if no key is configured anywhere.
    pub fn resolve(file: Option<&Path>) -> Result<Self> {
        Self::resolve_with(file, |var| std::env::var(var).ok())
    }

    /// Picks the key source: an explicit file wins, then
    /// [`PRIVATE_KEY_ENV`], then [`LEGACY_PRIVATE_KEY_ENV`]. Blank variables
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Fails if no key is configured anywhere.
    pub fn resolve_with(
        file: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(path) = file {
            return Ok(Self::File(path.to_path_buf()));
        }

        for var in [PRIVATE_KEY_ENV, LEGACY_PRIVATE_KEY_ENV] {
            if let Some(pem) = env(var).filter(|pem| !pem.trim().is_empty()) {
                return Ok(Self::Env { var, pem });
            }
        }

        bail!("no signing key configured: pass --private-key or set {PRIVATE_KEY_ENV}")
    }

    /// Reads and decodes the key.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or the PEM is not an RSA private key.
    pub fn load(&self) -> Result<SigningKey> {
        match self {
            Self::File(path) => {
                let pem = std::fs::read_to_string(path)
                    .with_context(|| format!("could not read private key {}", path.display()))?;
                SigningKey::from_pem(&pem)
                    .with_context(|| format!("could not decode private key {}", path.display()))
            }
            Self::Env { var, pem } => SigningKey::from_pem(pem)
                .with_context(|| format!("could not decode private key from ${var}")),
        }
    }

    /// Short description for logs. Never includes key material.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Env { var, .. } => format!("${var}"),
        }
    }
}

impl std::fmt::Debug for PrivateKeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Env { var, .. } => f
                .debug_struct("Env")
                .field("var", var)
                .field("pem", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Loads the issuer's public key from a PEM file.
///
/// # Errors
///
/// Fails if the file cannot be read or is not an RSA public key.
pub fn load_public_key(path: &Path) -> Result<VerifyingKey> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("could not read public key {}", path.display()))?;
    VerifyingKey::from_pem(&pem)
        .with_context(|| format!("could not decode public key {}", path.display()))
}
