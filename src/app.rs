//! The setup pipeline: check the host, configure it, then hand over to the supervisor.

use tracing::{info, warn};

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::supervisor;
use crate::system::{self, DhcpServer, Firewall, Hostapd, IpForwarding};

/// Host operations the setup pipeline performs.
///
/// `preflight` and `internet_interface` only read state; everything after
/// them changes the host.
pub trait Host {
    async fn preflight(&self) -> Result<()>;
    async fn internet_interface(&self) -> Result<String>;
    async fn configure_interface(&self, config: &NetworkConfig) -> Result<()>;
    async fn enable_forwarding(&self) -> Result<()>;
    async fn apply_firewall(&self, uplink: &str) -> Result<()>;
    async fn firewall_rules(&self) -> Result<String>;
}

/// The real Linux host, driven through iproute2, sysctl and iptables.
pub struct LinuxHost;

impl Host for LinuxHost {
    async fn preflight(&self) -> Result<()> {
        system::ensure_root()?;
        system::require_tools(system::REQUIRED_TOOLS)
    }

    async fn internet_interface(&self) -> Result<String> {
        system::detect_internet_interface().await
    }

    async fn configure_interface(&self, config: &NetworkConfig) -> Result<()> {
        system::configure_ap_interface(config).await
    }

    async fn enable_forwarding(&self) -> Result<()> {
        IpForwarding::enable().await?;
        if !IpForwarding::get_state().await? {
            warn!("IP forwarding still reads as disabled after enabling it");
        }
        Ok(())
    }

    async fn apply_firewall(&self, uplink: &str) -> Result<()> {
        Firewall::apply(uplink).await
    }

    async fn firewall_rules(&self) -> Result<String> {
        Firewall::dump().await
    }
}

/// Run the whole access point lifecycle.
///
/// Returns when hostapd exits or a shutdown signal arrives.
pub async fn run(config: &NetworkConfig) -> Result<()> {
    setup(&LinuxHost, config).await?;

    let dhcp = DhcpServer::new(config).spawn().await?;
    let access_point = Hostapd::new(config).spawn().await?;

    supervisor::supervise(dhcp, access_point, supervisor::shutdown_signal()).await
}

/// Check the host, then configure addressing and NAT. Returns the uplink.
pub async fn setup<H: Host>(host: &H, config: &NetworkConfig) -> Result<String> {
    let uplink = prepare(host, config).await?;

    host.configure_interface(config).await?;
    host.enable_forwarding().await?;
    host.apply_firewall(&uplink).await?;

    if config.verbose {
        println!("{}", host.firewall_rules().await?);
    }

    Ok(uplink)
}

/// Read-only checks. Nothing on the host has changed when this fails.
async fn prepare<H: Host>(host: &H, config: &NetworkConfig) -> Result<String> {
    host.preflight().await?;

    let uplink = host.internet_interface().await?;
    info!(uplink = %uplink, "internet interface detected");
    system::ensure_distinct(config, &uplink)?;

    Ok(uplink)
}
