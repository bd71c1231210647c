//! Checks that must pass before any system state is touched.

use std::env;
use std::ffi::OsStr;
use std::path::Path;

use crate::error::{Result, RetroapError};

/// External programs the setup pipeline shells out to.
pub const REQUIRED_TOOLS: &[&str] = &["ip", "sysctl", "iptables", "dnsmasq", "hostapd"];

pub fn ensure_root() -> Result<()> {
    if unsafe { libc::geteuid() } != 0 {
        return Err(RetroapError::NotRoot);
    }
    Ok(())
}

/// Fail on the first tool that is not on `PATH`.
pub fn require_tools(tools: &[&str]) -> Result<()> {
    let path = env::var_os("PATH").unwrap_or_default();
    for tool in tools {
        if !is_on_path(tool, &path) {
            return Err(RetroapError::MissingTool(tool.to_string()));
        }
    }
    Ok(())
}

fn is_on_path(tool: &str, path: &OsStr) -> bool {
    env::split_paths(path).any(|dir| is_executable(&dir.join(tool)))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_is_on_path() {
        let path = OsString::from("/nonexistent:/bin:/usr/bin");
        assert!(is_on_path("sh", &path));
        assert!(!is_on_path("retroap-no-such-tool", &path));
        assert!(!is_on_path("sh", OsStr::new("")));
    }

    #[test]
    fn test_require_tools_names_missing_tool() {
        match require_tools(&["sh", "retroap-no-such-tool"]) {
            Err(RetroapError::MissingTool(tool)) => assert_eq!(tool, "retroap-no-such-tool"),
            other => panic!("expected MissingTool, got {:?}", other),
        }
    }
}
