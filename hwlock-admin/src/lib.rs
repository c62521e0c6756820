//! Operator console for hardware-bound licenses.
//!
//! Wraps `hwlock-license` for the manual workflow:
//! 1. A customer sends a hardware id; `issue` signs a license for it
//! 2. A customer moving machines sends a revoke code; `revoke` checks it
//!    before a new license is issued
//!
//! Nothing is stored between runs.

pub mod cli;
pub mod commands;
pub mod config;

use anyhow::Result;
use chrono::{DateTime, Utc};
use cli::Command;
use serde::Serialize;
use std::fmt::Display;

/// Runs a parsed command and returns what should be printed.
pub fn run(command: &Command, now: DateTime<Utc>) -> Result<String> {
    match command {
        Command::Issue(args) => render(&commands::issue(args, now)?, args.json),
        Command::Revoke(args) => render(&commands::verify_revoke(args)?, false),
        Command::RevokeCode(args) => render(&commands::revoke_code(args)?, false),
        Command::Inspect(args) => render(&commands::inspect(args, now.date_naive())?, args.json),
        Command::Keygen(args) => render(&commands::keygen(args)?, false),
    }
}

fn render<T: Serialize + Display>(report: &T, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(report)?)
    } else {
        Ok(report.to_string())
    }
}
