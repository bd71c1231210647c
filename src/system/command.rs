//! Thin wrapper around `tokio::process::Command` for one-shot system tools.

use std::process::{Output, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::{Result, RetroapError};

/// Run `program` with `args`, returning stdout on success.
///
/// A non-zero exit becomes `CommandFailed` carrying stderr, or
/// `PermissionDenied` when the tool says so.
pub async fn run(program: &str, args: &[&str]) -> Result<String> {
    let output = output(program, args).await?;
    check(program, args, &output)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run `program` and return its raw output regardless of exit status.
pub async fn output(program: &str, args: &[&str]) -> Result<Output> {
    let command = display(program, args);
    debug!(%command, "running");

    Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| RetroapError::CommandFailed {
            command,
            message: e.to_string(),
        })
}

fn check(program: &str, args: &[&str], output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if is_permission_error(&stderr) {
        return Err(RetroapError::PermissionDenied);
    }

    let message = match stderr.trim() {
        "" => output.status.to_string(),
        msg => msg.to_string(),
    };
    Err(RetroapError::CommandFailed {
        command: display(program, args),
        message,
    })
}

fn is_permission_error(stderr: &str) -> bool {
    stderr.contains("Operation not permitted")
        || stderr.contains("Permission denied")
        || stderr.contains("you must be root")
}

/// How a long-running daemon is started.
///
/// Daemons get their own process group so a Ctrl+C at the terminal, or a
/// signal sent to retroap's group, only reaches the supervisor.
#[derive(Debug, Clone)]
pub struct Launcher {
    program: String,
    leading_args: Vec<String>,
}

impl Launcher {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            leading_args: Vec::new(),
        }
    }

    /// Run `program leading_args.. <daemon args>` instead of the daemon itself.
    #[cfg(test)]
    pub fn with_leading_args(program: &str, leading_args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            leading_args: leading_args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Spawn with `args`, piping stdin when `payload` is given and writing it.
    ///
    /// `name` is the daemon name used in errors, independent of the program run.
    pub async fn spawn(
        &self,
        name: &str,
        args: &[String],
        payload: Option<&str>,
    ) -> Result<Child> {
        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .stdin(if payload.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RetroapError::Spawn {
                program: name.to_string(),
                message: e.to_string(),
            })?;

        if let Some(payload) = payload {
            write_stdin(name, &mut child, payload).await?;
        }
        Ok(child)
    }
}

/// Write `payload` to the child's stdin and close it.
///
/// A child that dies before reading (port already taken, bad config) shows up
/// here as a broken pipe, so the error names the daemon and its exit status.
pub async fn write_stdin(name: &str, child: &mut Child, payload: &str) -> Result<()> {
    let Some(mut stdin) = child.stdin.take() else {
        return Ok(());
    };

    // dropping `stdin` at the end closes the pipe so the child sees EOF
    if let Err(e) = stdin.write_all(payload.as_bytes()).await {
        let message = match child.try_wait() {
            Ok(Some(status)) => format!("exited before reading its configuration ({})", status),
            _ => format!("could not write configuration: {}", e),
        };
        return Err(RetroapError::Spawn {
            program: name.to_string(),
            message,
        });
    }
    Ok(())
}

pub fn display(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            display("ip", &["addr", "flush", "dev", "wlan0"]),
            "ip addr flush dev wlan0"
        );
        assert_eq!(display("true", &[]), "true");
    }

    #[test]
    fn test_permission_errors() {
        assert!(is_permission_error(
            "iptables v1.8.9 (nf_tables): Could not fetch rule set generation id: Permission denied (you must be root)"
        ));
        assert!(is_permission_error("RTNETLINK answers: Operation not permitted"));
        assert!(!is_permission_error("Cannot find device \"wlan7\""));
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let out = run("echo", &["hello"]).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_reports_failure() {
        match run("false", &[]).await {
            Err(RetroapError::CommandFailed { command, .. }) => assert_eq!(command, "false"),
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_launcher_spawn_failure_names_daemon() {
        let launcher = Launcher::new("retroap-no-such-daemon");
        match launcher.spawn("dnsmasq", &[], None).await {
            Err(RetroapError::Spawn { program, .. }) => assert_eq!(program, "dnsmasq"),
            other => panic!("expected Spawn, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_stdin_to_dead_child_names_daemon() {
        let mut child = Command::new("sh")
            .args(["-c", "exec 0<&-; exit 4"])
            .stdin(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap();

        // try_wait keeps our end of the pipe open, unlike wait
        while child.try_wait().unwrap().is_none() {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        match write_stdin("dnsmasq", &mut child, "nameserver 1.1.1.1\n").await {
            Err(RetroapError::Spawn { program, message }) => {
                assert_eq!(program, "dnsmasq");
                assert!(message.contains("exited"), "{}", message);
            }
            other => panic!("expected Spawn, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let err = run("retroap-no-such-tool", &[]).await.unwrap_err();
        assert!(matches!(err, RetroapError::CommandFailed { .. }));
    }
}
