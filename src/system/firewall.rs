//! NAT and forwarding rules via iptables.
//!
//! Applying the rules flushes the whole filter and nat tables first. Any
//! rules already on the host are gone after [`Firewall::apply`].

use tracing::info;

use crate::error::Result;
use crate::system::command;

pub struct Firewall;

impl Firewall {
    /// Flush existing rules, then masquerade out of `internet_interface`
    /// and accept all forwarded traffic.
    pub async fn apply(internet_interface: &str) -> Result<()> {
        for args in rule_commands(internet_interface) {
            command::run("iptables", &args).await?;
        }

        info!(uplink = %internet_interface, "NAT rules installed");
        Ok(())
    }

    /// Current filter and nat tables, for diagnostics.
    pub async fn dump() -> Result<String> {
        let filter = command::run("iptables", &["-L", "-n", "-v"]).await?;
        let nat = command::run("iptables", &["-t", "nat", "-L", "-n", "-v"]).await?;
        Ok(format!("{}\n{}", filter.trim_end(), nat.trim_end()))
    }
}

fn rule_commands(internet_interface: &str) -> Vec<Vec<&str>> {
    vec![
        vec!["-F"],
        vec!["-t", "nat", "-F"],
        vec![
            "-t",
            "nat",
            "-A",
            "POSTROUTING",
            "-o",
            internet_interface,
            "-j",
            "MASQUERADE",
        ],
        vec!["-A", "FORWARD", "-j", "ACCEPT"],
    ]
}
