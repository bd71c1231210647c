//! Internet-facing interface detection via the kernel routing table.

use tracing::debug;

use crate::config::NetworkConfig;
use crate::error::{Result, RetroapError};
use crate::system::command;

/// Well-known public address used to ask the kernel which way out it would pick.
const PROBE_ADDRESS: &str = "8.8.8.8";

/// Return the interface that currently routes to the public internet.
pub async fn detect_internet_interface() -> Result<String> {
    let output = command::output("ip", &["route", "get", PROBE_ADDRESS]).await?;

    if !output.status.success() {
        debug!(
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "no route to {}", PROBE_ADDRESS
        );
        return Err(RetroapError::NoInternetRoute);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_route_device(&stdout).ok_or(RetroapError::NoInternetRoute)
}

/// Pull the device name out of `ip route get` output.
///
/// Format: `8.8.8.8 via 192.168.1.1 dev eth0 src 192.168.1.50 uid 0`
fn parse_route_device(output: &str) -> Option<String> {
    let mut tokens = output.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "dev" {
            return tokens.next().map(str::to_string);
        }
    }
    None
}

/// Refuse to turn the uplink itself into the access point.
pub fn ensure_distinct(config: &NetworkConfig, internet_interface: &str) -> Result<()> {
    if config.ap_interface == internet_interface {
        return Err(RetroapError::InterfaceConflict(config.ap_interface.clone()));
    }
    Ok(())
}
