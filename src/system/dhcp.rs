//! DHCP and DNS for access point clients via dnsmasq.

use tokio::process::Child;
use tracing::{debug, info};

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::system::command::Launcher;

pub const LEASE_FILE: &str = "/tmp/retroap-dnsmasq.leases";
const LEASE_TIME: &str = "12h";

/// dnsmasq bound to the access point interface.
pub struct DhcpServer<'a> {
    config: &'a NetworkConfig,
    launcher: Launcher,
}

impl<'a> DhcpServer<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Self {
            config,
            launcher: Launcher::new("dnsmasq"),
        }
    }

    #[cfg(test)]
    fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Spawn dnsmasq in the foreground as a child of this process.
    ///
    /// With a custom DNS server, the upstream resolver config is written to
    /// dnsmasq's stdin instead of a file. The child is killed if the handle
    /// is dropped.
    pub async fn spawn(&self) -> Result<Child> {
        let args = self.args();
        debug!(args = %args.join(" "), "starting dnsmasq");

        let resolv = self.resolv_conf();
        let child = self
            .launcher
            .spawn("dnsmasq", &args, resolv.as_deref())
            .await?;

        let (start, end) = self.config.dhcp_range();
        info!(
            interface = %self.config.ap_interface,
            range = %format!("{}-{}", start, end),
            "DHCP server started"
        );
        Ok(child)
    }

    fn args(&self) -> Vec<String> {
        let (start, end) = self.config.dhcp_range();

        let mut args = vec![
            "--keep-in-foreground".to_string(),
            "--bind-interfaces".to_string(),
            format!("--interface={}", self.config.ap_interface),
            format!("--listen-address={}", self.config.ap_ip()),
            format!("--dhcp-range={},{},{}", start, end, LEASE_TIME),
            format!("--dhcp-leasefile={}", LEASE_FILE),
        ];

        if self.config.custom_dns.is_some() {
            args.push("--resolv-file=/dev/stdin".to_string());
        }

        if self.config.verbose {
            args.push("--log-queries".to_string());
        }

        args
    }

    fn resolv_conf(&self) -> Option<String> {
        self.config
            .custom_dns
            .map(|dns| format!("nameserver {}\n", dns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::net::Ipv4Addr;

    #[test]
    fn test_default_args() {
        let config = NetworkConfig::default();
        let args = DhcpServer::new(&config).args();

        assert_eq!(
            args,
            vec![
                "--keep-in-foreground",
                "--bind-interfaces",
                "--interface=wlan0",
                "--listen-address=192.168.69.1",
                "--dhcp-range=192.168.69.2,192.168.69.200,12h",
                "--dhcp-leasefile=/tmp/retroap-dnsmasq.leases",
            ]
        );
        assert_eq!(DhcpServer::new(&config).resolv_conf(), None);
    }

    #[test]
    fn test_custom_dns_goes_through_stdin() {
        let config = NetworkConfig {
            custom_dns: Some(Ipv4Addr::new(1, 1, 1, 1)),
            ..NetworkConfig::default()
        };
        let server = DhcpServer::new(&config);

        assert!(server.args().contains(&"--resolv-file=/dev/stdin".to_string()));
        assert_eq!(server.resolv_conf().as_deref(), Some("nameserver 1.1.1.1\n"));
    }

    #[test]
    fn test_verbose_only_adds_query_logging() {
        let quiet = NetworkConfig::default();
        let verbose = NetworkConfig {
            verbose: true,
            ..NetworkConfig::default()
        };

        let mut quiet_args = DhcpServer::new(&quiet).args();
        quiet_args.push("--log-queries".to_string());
        assert_eq!(DhcpServer::new(&verbose).args(), quiet_args);
    }

    #[tokio::test]
    async fn test_spawn_feeds_resolver_on_stdin() {
        let out = std::env::temp_dir().join(format!("retroap-dhcp-stdin-{}", std::process::id()));
        let out_path = out.to_string_lossy().into_owned();
        let args_path = format!("{}.args", out_path);

        let config = NetworkConfig {
            custom_dns: Some(Ipv4Addr::new(9, 9, 9, 9)),
            ..NetworkConfig::default()
        };
        // $0 is the output path, dnsmasq's own arguments follow as $1..
        let launcher = Launcher::with_leading_args(
            "sh",
            &[
                "-c",
                r#"printf '%s\n' "$@" > "$0.args"; cat > "$0""#,
                out_path.as_str(),
            ],
        );

        let mut child = DhcpServer::new(&config)
            .with_launcher(launcher)
            .spawn()
            .await
            .unwrap();
        assert!(child.wait().await.unwrap().success());

        let stdin = fs::read_to_string(&out).unwrap();
        let args = fs::read_to_string(&args_path).unwrap();
        let _ = fs::remove_file(&out);
        let _ = fs::remove_file(&args_path);

        assert_eq!(stdin, "nameserver 9.9.9.9\n");
        assert!(args.lines().any(|a| a == "--resolv-file=/dev/stdin"));
        assert!(args.lines().any(|a| a == "--interface=wlan0"));
    }
}
