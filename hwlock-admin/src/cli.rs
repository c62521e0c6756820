//! Command-line arguments.

use clap::{Parser, Subcommand};
use hwlock_license::{TokenFormat, DEFAULT_KEY_BITS, SALT_REVOKE};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hwlock-admin")]
#[command(about = "Issue hardware-bound licenses and verify revoke codes")]
#[command(version)]
pub struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Issue a license token for a hardware id
    Issue(IssueArgs),
    /// Verify a revoke code sent by a customer
    Revoke(RevokeArgs),
    /// Print the revoke code a client shows for a hardware id
    RevokeCode(RevokeCodeArgs),
    /// Verify a license token and show what it grants
    Inspect(InspectArgs),
    /// Generate a new issuer key pair
    Keygen(KeygenArgs),
}

#[derive(clap::Args, Debug)]
pub struct IssueArgs {
    /// Hardware id reported by the customer's machine
    pub hardware_id: String,

    /// Validity in days; 0 issues a permanent license
    #[arg(short, long, default_value_t = 0)]
    pub days: u32,

    /// Token wire format (packed or delimited)
    #[arg(long, default_value_t = TokenFormat::Packed)]
    pub format: TokenFormat,

    /// Omit the version tag, for clients that predate it
    #[arg(long)]
    pub bare: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to the issuer's PEM private key. Without it the key is read
    /// from HWLOCK_PRIVATE_KEY (or PRIVATE_KEY) as PEM text.
    #[arg(long, env = "HWLOCK_PRIVATE_KEY_FILE")]
    pub private_key: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct RevokeArgs {
    /// Revoke code, e.g. REVOKE#<hardware id>#<checksum>
    pub code: String,

    /// Salt shared with the client
    #[arg(long, env = "HWLOCK_REVOKE_SALT", default_value = SALT_REVOKE, hide_env_values = true)]
    pub salt: String,
}

#[derive(clap::Args, Debug)]
pub struct RevokeCodeArgs {
    /// Hardware id to release
    pub hardware_id: String,

    /// Salt shared with the client
    #[arg(long, env = "HWLOCK_REVOKE_SALT", default_value = SALT_REVOKE, hide_env_values = true)]
    pub salt: String,
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// License token to verify
    pub token: String,

    /// Path to the issuer's PEM public key
    #[arg(long, env = "HWLOCK_PUBLIC_KEY_FILE")]
    pub public_key: PathBuf,

    /// Also require the license to be bound to this hardware id
    #[arg(long)]
    pub hardware_id: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct KeygenArgs {
    /// Directory to write private.pem and public.pem into
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// RSA modulus size in bits
    #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
    pub bits: usize,

    /// Overwrite existing key files
    #[arg(long)]
    pub force: bool,
}
