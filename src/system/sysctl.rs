//! IPv4 forwarding control via sysctl.

use crate::error::{Result, RetroapError};
use crate::system::command;

const FORWARDING_KEY: &str = "net.ipv4.ip_forward";

/// Kernel IPv4 forwarding switch.
///
/// Forwarding is left enabled on exit, same as the firewall rules.
pub struct IpForwarding;

impl IpForwarding {
    /// Get the current IP forwarding state.
    pub async fn get_state() -> Result<bool> {
        let stdout = command::run("sysctl", &["-n", FORWARDING_KEY]).await?;
        parse_state(&stdout)
    }

    /// Enable IP forwarding.
    pub async fn enable() -> Result<()> {
        let assignment = format!("{}=1", FORWARDING_KEY);
        command::run("sysctl", &["-w", &assignment]).await?;
        Ok(())
    }
}

fn parse_state(stdout: &str) -> Result<bool> {
    match stdout.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(RetroapError::ParseError(format!(
            "Unexpected sysctl value: {}",
            other
        ))),
    }
}
