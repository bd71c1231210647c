//! System interaction modules for routing, addressing, firewall, sysctl, DHCP, and hostapd.

pub mod command;
pub mod dhcp;
pub mod firewall;
pub mod hostapd;
pub mod network;
pub mod preflight;
pub mod route;
pub mod sysctl;

pub use dhcp::DhcpServer;
pub use firewall::Firewall;
pub use hostapd::Hostapd;
pub use network::configure_ap_interface;
pub use preflight::{ensure_root, require_tools, REQUIRED_TOOLS};
pub use route::{detect_internet_interface, ensure_distinct};
pub use sysctl::IpForwarding;
