//! retroap - Wi-Fi access point for legacy game consoles
//!
//! Shares the host's internet connection over an open 802.11g network served
//! by hostapd, with dnsmasq handing out addresses and iptables doing NAT.

mod app;
mod config;
mod error;
mod supervisor;
mod system;

use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use config::{Cli, Defaults, NetworkConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::parse_from_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    let config = match NetworkConfig::resolve(cli, Defaults::load()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match app::run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise info, or debug with `-v`.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!(e).context("Failed to initialize logging"))
}
