//! hwlock operator console
//!
//! Usage:
//!   hwlock-admin issue <HARDWARE_ID> --days 30 --private-key issuer.pem
//!   hwlock-admin revoke 'REVOKE#<HARDWARE_ID>#<CHECKSUM>'
//!
//! The signing key can also come from HWLOCK_PRIVATE_KEY as PEM text.

use anyhow::Result;
use clap::Parser;
use hwlock_admin::cli::Args;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let output = hwlock_admin::run(&args.command, chrono::Utc::now())?;
    println!("{output}");
    Ok(())
}
