//! Command-line options and the resolved network configuration.
//!
//! Values come from three layers: the command line, an optional JSON file at
//! `~/.config/retroap/config.json`, and built-in defaults. Problems with the
//! file are logged and ignored, so the tool always has a usable config.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result as RetroapResult, RetroapError};

pub const DEFAULT_SSID: &str = "NDS";
pub const DEFAULT_INTERFACE: &str = "wlan0";
pub const DEFAULT_PREFIX: IpPrefix = IpPrefix([192, 168, 69]);

/// 802.11 caps SSIDs at 32 bytes.
const MAX_SSID_LEN: usize = 32;
/// IFNAMSIZ minus the trailing NUL.
const MAX_INTERFACE_LEN: usize = 15;

/// Last octets of the DHCP pool handed to clients.
const DHCP_FIRST_HOST: u8 = 2;
const DHCP_LAST_HOST: u8 = 200;

/// The first three octets of a /24 network, e.g. `192.168.69`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct IpPrefix([u8; 3]);

impl IpPrefix {
    /// Address of `host` inside this /24.
    pub fn host(&self, host: u8) -> Ipv4Addr {
        let [a, b, c] = self.0;
        Ipv4Addr::new(a, b, c, host)
    }
}

impl FromStr for IpPrefix {
    type Err = RetroapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RetroapError::InvalidPrefix(s.to_string());

        let mut octets = [0u8; 3];
        let mut parts = s.trim().split('.');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            // u8::from_str accepts a leading '+', which is not valid in dotted quads
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *octet = part.parse().map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(octets))
    }
}

impl TryFrom<String> for IpPrefix {
    type Error = RetroapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{}.{}.{}", a, b, c)
    }
}

/// Command-line options. Repeating an option keeps the last value.
#[derive(Parser, Debug, Default)]
#[command(name = "retroap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Share this host's internet connection over an open Wi-Fi network old consoles can join", long_about = None)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Upstream DNS server handed to dnsmasq (default: system resolvers)
    #[arg(short = 'd', long = "dns", value_name = "ADDR")]
    pub dns: Option<Ipv4Addr>,

    /// Wireless interface to run the access point on [default: wlan0]
    #[arg(short = 'i', long = "interface", value_name = "NAME")]
    pub interface: Option<String>,

    /// Network name to broadcast [default: NDS]
    #[arg(short = 's', long = "ssid", value_name = "NAME")]
    pub ssid: Option<String>,

    /// First three octets of the access point network [default: 192.168.69]
    #[arg(short = 'p', long = "prefix", value_name = "A.B.C")]
    pub prefix: Option<IpPrefix>,

    /// Print firewall rules and log every DNS query
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }
}

/// Optional defaults file. Every field can be left out.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub ssid: Option<String>,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub prefix: Option<IpPrefix>,
    #[serde(default)]
    pub dns: Option<Ipv4Addr>,
}

impl Defaults {
    /// Defaults file path: `~/.config/retroap/config.json`.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("retroap").join("config.json"))
    }

    /// Load the defaults file, falling back to empty defaults on any error.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };

        match serde_json::from_str(&contents) {
            Ok(defaults) => {
                debug!(path = %path.display(), "loaded defaults file");
                defaults
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable defaults file");
                Self::default()
            }
        }
    }
}

/// Everything the setup pipeline needs. Built once, then only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub ssid: String,
    pub ap_interface: String,
    pub ip_prefix: IpPrefix,
    pub custom_dns: Option<Ipv4Addr>,
    pub verbose: bool,
}

impl NetworkConfig {
    /// Merge command-line options over the defaults file over built-ins.
    ///
    /// SSID and interface end up as lines of the hostapd config, so control
    /// characters are rejected in both.
    pub fn resolve(cli: Cli, defaults: Defaults) -> RetroapResult<Self> {
        let ssid = cli
            .ssid
            .or(defaults.ssid)
            .unwrap_or_else(|| DEFAULT_SSID.to_string());
        let ap_interface = cli
            .interface
            .or(defaults.interface)
            .unwrap_or_else(|| DEFAULT_INTERFACE.to_string());

        validate_ssid(&ssid)?;
        validate_interface(&ap_interface)?;

        Ok(Self {
            ssid,
            ap_interface,
            ip_prefix: cli.prefix.or(defaults.prefix).unwrap_or(DEFAULT_PREFIX),
            custom_dns: cli.dns.or(defaults.dns),
            verbose: cli.verbose,
        })
    }

    /// Gateway address assigned to the access point interface.
    pub fn ap_ip(&self) -> Ipv4Addr {
        self.ip_prefix.host(1)
    }

    /// First and last address of the DHCP pool.
    pub fn dhcp_range(&self) -> (Ipv4Addr, Ipv4Addr) {
        (
            self.ip_prefix.host(DHCP_FIRST_HOST),
            self.ip_prefix.host(DHCP_LAST_HOST),
        )
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: DEFAULT_SSID.to_string(),
            ap_interface: DEFAULT_INTERFACE.to_string(),
            ip_prefix: DEFAULT_PREFIX,
            custom_dns: None,
            verbose: false,
        }
    }
}

fn validate_ssid(ssid: &str) -> RetroapResult<()> {
    if ssid.is_empty() || ssid.len() > MAX_SSID_LEN || ssid.chars().any(char::is_control) {
        return Err(RetroapError::InvalidSsid(ssid.escape_debug().to_string()));
    }
    Ok(())
}

fn validate_interface(name: &str) -> RetroapResult<()> {
    let bad_char = |c: char| c.is_control() || c.is_whitespace() || c == '/';
    if name.is_empty() || name.len() > MAX_INTERFACE_LEN || name.chars().any(bad_char) {
        return Err(RetroapError::InvalidInterface(name.escape_debug().to_string()));
    }
    Ok(())
}
