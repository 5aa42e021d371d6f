//! Drive a transfer while consuming its progress channel.
//!
//! Frontends hand the sender half to a bulk operation and use
//! [`run_with_progress`] to render every snapshot as it arrives, without the
//! transfer loop ever waiting on the renderer.

use std::future::Future;

use croco_core::TransferProgress;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Duration, Instant};

/// Maximum time to drain remaining snapshots after the task completes, in
/// case a sender clone outlives the transfer.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Run `task` to completion, calling `on_progress` for every snapshot
/// received on `progress_rx`, and return the task's result.
pub async fn run_with_progress<F, R>(
    task: F,
    mut progress_rx: UnboundedReceiver<TransferProgress>,
    mut on_progress: impl FnMut(TransferProgress),
) -> R
where
    F: Future<Output = R>,
{
    tokio::pin!(task);
    let mut received: u64 = 0;

    let result = loop {
        tokio::select! {
            r = &mut task => break Some(r),
            update = progress_rx.recv() => match update {
                Some(p) => {
                    received += 1;
                    on_progress(p);
                }
                None => break None,
            }
        }
    };

    let Some(result) = result else {
        log::debug!("Progress channel closed after {} updates", received);
        return task.await;
    };

    let deadline = Instant::now() + DRAIN_TIMEOUT;
    loop {
        match tokio::time::timeout_at(deadline, progress_rx.recv()).await {
            Ok(Some(p)) => {
                received += 1;
                on_progress(p);
            }
            Ok(None) => break,
            Err(_) => {
                log::warn!("Gave up draining progress after {}s", DRAIN_TIMEOUT.as_secs());
                break;
            }
        }
    }
    log::debug!("Transfer finished with {} progress updates", received);
    result
}
