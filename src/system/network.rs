//! Access point interface addressing via iproute2.

use tracing::info;

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::system::command;

/// Bring the AP interface up and give it `<prefix>.1/24` as its only address.
///
/// Existing addresses are flushed first, so running this twice leaves the
/// interface in the same state.
pub async fn configure_ap_interface(config: &NetworkConfig) -> Result<()> {
    for args in interface_commands(config) {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        command::run("ip", &args).await?;
    }

    info!(
        interface = %config.ap_interface,
        address = %config.ap_ip(),
        "access point interface configured"
    );
    Ok(())
}

fn interface_commands(config: &NetworkConfig) -> Vec<Vec<String>> {
    let iface = config.ap_interface.as_str();
    let cidr = format!("{}/24", config.ap_ip());

    vec![
        vec!["link".into(), "set".into(), iface.into(), "up".into()],
        vec!["addr".into(), "flush".into(), "dev".into(), iface.into()],
        vec!["addr".into(), "add".into(), cidr, "dev".into(), iface.into()],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IpPrefix;

    #[test]
    fn test_interface_commands() {
        let config = NetworkConfig {
            ap_interface: "wlan1".to_string(),
            ip_prefix: "10.0.5".parse::<IpPrefix>().unwrap(),
            ..NetworkConfig::default()
        };

        let commands: Vec<String> = interface_commands(&config)
            .into_iter()
            .map(|args| args.join(" "))
            .collect();

        assert_eq!(
            commands,
            vec![
                "link set wlan1 up",
                "addr flush dev wlan1",
                "addr add 10.0.5.1/24 dev wlan1",
            ]
        );
    }

    #[test]
    fn test_verbose_does_not_change_commands() {
        let quiet = NetworkConfig::default();
        let verbose = NetworkConfig {
            verbose: true,
            ..NetworkConfig::default()
        };
        assert_eq!(interface_commands(&quiet), interface_commands(&verbose));
    }
}
