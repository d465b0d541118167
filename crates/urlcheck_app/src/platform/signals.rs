//! SIGINT/SIGTERM handling: the first signal cancels the root token and is
//! remembered for the exit code.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use urlcheck_logging::check_info;

const SIGINT: i32 = 2;
#[cfg(unix)]
const SIGTERM: i32 = 15;

/// The signal that stopped the process, if any.
#[derive(Debug, Clone, Default)]
pub struct ExitSignal(Arc<AtomicI32>);

impl ExitSignal {
    pub fn record(&self, signum: i32) {
        let _ = self
            .0
            .compare_exchange(0, signum, Ordering::SeqCst, Ordering::SeqCst);
    }

    pub fn signum(&self) -> Option<i32> {
        match self.0.load(Ordering::SeqCst) {
            0 => None,
            signum => Some(signum),
        }
    }

    /// `128 + signum` after a signal, `0` otherwise.
    pub fn exit_code(&self) -> i32 {
        self.signum().map_or(0, |signum| 128 + signum)
    }
}

/// Install the handlers and return the slot the caught signal is written to.
#[cfg(unix)]
pub fn listen_for_shutdown(cancel: CancellationToken) -> std::io::Result<ExitSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let exit = ExitSignal::default();
    let recorded = exit.clone();
    tokio::spawn(async move {
        let signum = tokio::select! {
            _ = interrupt.recv() => SIGINT,
            _ = terminate.recv() => SIGTERM,
            _ = cancel.cancelled() => return,
        };
        check_info!("Caught signal {}, shutting down", signum);
        recorded.record(signum);
        cancel.cancel();
    });
    Ok(exit)
}

#[cfg(not(unix))]
pub fn listen_for_shutdown(cancel: CancellationToken) -> std::io::Result<ExitSignal> {
    let exit = ExitSignal::default();
    let recorded = exit.clone();
    tokio::spawn(async move {
        tokio::select! {
            caught = tokio::signal::ctrl_c() => {
                if caught.is_ok() {
                    check_info!("Caught Ctrl-C, shutting down");
                    recorded.record(SIGINT);
                    cancel.cancel();
                }
            }
            _ = cancel.cancelled() => {}
        }
    });
    Ok(exit)
}
