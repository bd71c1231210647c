//! Error types for access point setup and supervision.

use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetroapError {
    #[error("Invalid IP prefix '{0}': expected three octets like 192.168.69")]
    InvalidPrefix(String),

    #[error("Invalid SSID \"{0}\": must be 1-32 bytes without control characters")]
    InvalidSsid(String),

    #[error("Invalid interface name \"{0}\"")]
    InvalidInterface(String),

    #[error("No route to the internet found. Is your uplink connected?")]
    NoInternetRoute,

    #[error("Access point interface {0} is also the internet interface. Pick another with -i")]
    InterfaceConflict(String),

    #[error("Required tool '{0}' not found in PATH")]
    MissingTool(String),

    #[error("This program must be run as root (sudo).")]
    NotRoot,

    #[error("Command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    #[error("Permission denied. Run with sudo.")]
    PermissionDenied,

    #[error("Failed to parse output: {0}")]
    ParseError(String),

    #[error("Failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("dnsmasq exited unexpectedly ({0})")]
    DhcpExited(ExitStatus),

    #[error("hostapd exited with failure ({0})")]
    AccessPointExited(ExitStatus),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RetroapError>;
