//! Supervision of the two service daemons.
//!
//! hostapd runs in the foreground: when it exits, retroap exits with it.
//! dnsmasq exiting first is fatal and is never restarted. Both children are
//! torn down before [`supervise`] returns, whatever ended the run.

use std::future::Future;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};

use crate::error::{Result, RetroapError};

/// How long a child gets to exit after SIGTERM before it is killed.
const TERMINATE_GRACE: Duration = Duration::from_secs(3);

/// How long to wait for a pending shutdown signal after a child exits.
///
/// Under systemd's control-group kill the daemons and retroap are signalled
/// together, and a daemon's exit can be observed before our own signal.
const SHUTDOWN_SETTLE: Duration = Duration::from_millis(250);

enum Event {
    Shutdown,
    DhcpExited(std::io::Result<ExitStatus>),
    AccessPointExited(std::io::Result<ExitStatus>),
}

/// Wait until hostapd exits, dnsmasq dies, or `shutdown` resolves.
///
/// A child exit that coincides with a shutdown signal is treated as part of
/// the orderly shutdown, not as a failure.
pub async fn supervise<F>(mut dhcp: Child, mut access_point: Child, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let event = tokio::select! {
        biased;

        _ = &mut shutdown => Event::Shutdown,
        status = dhcp.wait() => Event::DhcpExited(status),
        status = access_point.wait() => Event::AccessPointExited(status),
    };

    // a completed `shutdown` must not be polled again
    let orderly = matches!(event, Event::Shutdown)
        || tokio::time::timeout(SHUTDOWN_SETTLE, &mut shutdown)
            .await
            .is_ok();

    let outcome = if orderly {
        info!("shutdown requested, stopping services");
        Ok(())
    } else {
        event_outcome(event)
    };

    terminate("hostapd", &mut access_point).await;
    terminate("dnsmasq", &mut dhcp).await;

    outcome
}

fn event_outcome(event: Event) -> Result<()> {
    match event {
        Event::Shutdown => Ok(()),
        Event::DhcpExited(Ok(status)) => Err(RetroapError::DhcpExited(status)),
        Event::AccessPointExited(Ok(status)) => access_point_outcome(status),
        Event::DhcpExited(Err(e)) | Event::AccessPointExited(Err(e)) => Err(RetroapError::Io(e)),
    }
}

fn access_point_outcome(status: ExitStatus) -> Result<()> {
    if status.success() {
        info!("hostapd exited");
        Ok(())
    } else {
        Err(RetroapError::AccessPointExited(status))
    }
}

/// SIGTERM the child, then SIGKILL it if it is still around after the grace period.
async fn terminate(name: &str, child: &mut Child) {
    // `id` is None once the child has been reaped
    let Some(pid) = child.id() else {
        return;
    };

    debug!(pid, "stopping {}", name);
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGTERM);
    }

    if tokio::time::timeout(TERMINATE_GRACE, child.wait())
        .await
        .is_err()
    {
        warn!(pid, "{} ignored SIGTERM, killing", name);
        let _ = child.kill().await;
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM, only Ctrl+C will stop retroap");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}
