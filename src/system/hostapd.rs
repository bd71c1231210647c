//! hostapd access point, configured for legacy 802.11g clients.
//!
//! The network is open (no WPA) on channel 1, hardware mode g. Old handheld
//! and console Wi-Fi stacks reject most modern settings, so nothing else is
//! set and hostapd falls back to its own defaults.

use tokio::process::Child;
use tracing::info;

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::system::command::Launcher;

const HW_MODE: &str = "g";
const CHANNEL: u8 = 1;

pub struct Hostapd<'a> {
    config: &'a NetworkConfig,
    launcher: Launcher,
}

impl<'a> Hostapd<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Self {
            config,
            launcher: Launcher::new("hostapd"),
        }
    }

    #[cfg(test)]
    fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Generate the hostapd configuration block.
    ///
    /// SSID and interface are validated when the config is resolved, so
    /// neither can carry a newline into this block.
    pub fn generate_config(&self) -> String {
        format!(
            "interface={}\nssid={}\nhw_mode={}\nchannel={}\n",
            self.config.ap_interface, self.config.ssid, HW_MODE, CHANNEL
        )
    }

    /// Spawn hostapd reading its configuration from stdin.
    pub async fn spawn(&self) -> Result<Child> {
        let args = ["/dev/stdin".to_string()];
        let conf = self.generate_config();
        let child = self
            .launcher
            .spawn("hostapd", &args, Some(conf.as_str()))
            .await?;

        info!(
            ssid = %self.config.ssid,
            interface = %self.config.ap_interface,
            channel = CHANNEL,
            "access point started"
        );
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_generate_config() {
        let config = NetworkConfig {
            ssid: "TestNet".to_string(),
            ap_interface: "wlan1".to_string(),
            ..NetworkConfig::default()
        };

        assert_eq!(
            Hostapd::new(&config).generate_config(),
            "interface=wlan1\nssid=TestNet\nhw_mode=g\nchannel=1\n"
        );
    }

    #[test]
    fn test_config_is_open_network() {
        let config = NetworkConfig::default();
        let conf = Hostapd::new(&config).generate_config();
        assert!(!conf.contains("wpa"));
        assert_eq!(conf.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_spawn_feeds_config_on_stdin() {
        let out =
            std::env::temp_dir().join(format!("retroap-hostapd-stdin-{}", std::process::id()));
        let out_path = out.to_string_lossy().into_owned();

        let config = NetworkConfig {
            ssid: "Wii".to_string(),
            ..NetworkConfig::default()
        };
        let launcher =
            Launcher::with_leading_args("sh", &["-c", r#"cat > "$0""#, out_path.as_str()]);

        let mut child = Hostapd::new(&config)
            .with_launcher(launcher)
            .spawn()
            .await
            .unwrap();
        assert!(child.wait().await.unwrap().success());

        let received = fs::read_to_string(&out).unwrap();
        let _ = fs::remove_file(&out);

        assert_eq!(received, Hostapd::new(&config).generate_config());
    }
}
