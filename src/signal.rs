use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{error, warn};

/// Exit status for a run aborted by a second Ctrl-C, `128 + SIGINT`
const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// First signal, finish the running searches and stop
    Cancel,
    /// Cancellation was already requested
    Exit,
}

fn on_interrupt(cancel: &AtomicBool) -> Interrupt {
    if cancel.swap(true, Ordering::SeqCst) {
        Interrupt::Exit
    } else {
        Interrupt::Cancel
    }
}

/// Sets `cancel` when the process receives Ctrl-C, and exits immediately on a
/// second Ctrl-C.
///
/// The signal is awaited on a small single-threaded runtime living on its
/// own thread, so the rayon workers are never blocked by it.
pub fn cancel_on_ctrl_c(cancel: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the signal runtime")?;

    std::thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            runtime.block_on(async {
                loop {
                    if let Err(err) = tokio::signal::ctrl_c().await {
                        error!("Unable to listen for Ctrl-C: {err}");
                        return;
                    }
                    match on_interrupt(&cancel) {
                        Interrupt::Cancel => warn!(
                            "Interrupted, stopping before the next source cell (Ctrl-C again to exit now)"
                        ),
                        Interrupt::Exit => {
                            error!("Interrupted twice, exiting without writing output");
                            std::process::exit(FORCED_EXIT_CODE);
                        }
                    }
                }
            });
        })
        .context("Failed to spawn the signal thread")?;
    Ok(())
}
