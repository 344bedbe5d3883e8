//! Continuously-updating view of the current month's listen time.
//!
//! Storage offers no change notifications, so a background task re-reads the
//! total on a fixed interval and publishes on a `watch` channel only when the
//! value changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::period::MonthYear;
use crate::types::{Milliseconds, UserId};

/// Handle to a running current-month poller.
///
/// Dropping the handle cancels the task.
pub struct CurrentMonthWatch {
    receiver: watch::Receiver<Milliseconds>,
    /// Atomic flag for stop signaling, paired with a wakeup for the sleep
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl CurrentMonthWatch {
    /// Spawn the polling task on the current tokio runtime.
    #[must_use]
    pub fn spawn(db: Database, user_id: UserId, interval: Duration) -> Self {
        let (tx, receiver) = watch::channel(Milliseconds::default());
        let running = Arc::new(AtomicBool::new(true));
        let wake = Arc::new(Notify::new());

        let task = tokio::spawn(poll_loop(
            db,
            user_id,
            interval,
            tx,
            Arc::clone(&running),
            Arc::clone(&wake),
        ));

        Self {
            receiver,
            running,
            wake,
            task: Some(task),
        }
    }

    /// Last published total.
    #[must_use]
    pub fn current(&self) -> Milliseconds {
        *self.receiver.borrow()
    }

    /// Another receiver for binding elsewhere.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Milliseconds> {
        self.receiver.clone()
    }

    /// Wait for the next changed total.
    pub async fn changed(&mut self) -> Result<Milliseconds> {
        self.receiver
            .changed()
            .await
            .map_err(|_| Error::other("current month view has stopped"))?;
        Ok(*self.receiver.borrow_and_update())
    }

    /// Whether the poller has not been asked to stop.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop polling and wait for the task to finish.
    pub async fn stop(mut self) -> Result<()> {
        self.signal_stop();
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }

    fn signal_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.wake.notify_one();
    }
}

impl Drop for CurrentMonthWatch {
    fn drop(&mut self) {
        self.signal_stop();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn poll_loop(
    db: Database,
    user_id: UserId,
    interval: Duration,
    tx: watch::Sender<Milliseconds>,
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
) {
    info!(
        "Watching current month listen time for user {user_id} every {}",
        humantime::format_duration(interval)
    );

    while running.load(Ordering::SeqCst) {
        let month = MonthYear::current();
        match db.get_total_listen_time(user_id, month).await {
            Ok(total) => {
                let changed = tx.send_if_modified(|current| {
                    if *current == total {
                        false
                    } else {
                        *current = total;
                        true
                    }
                });
                if changed {
                    debug!("Listen time for user {user_id} in {month} is now {total}");
                }
            }
            // Keep the last good value on storage failures
            Err(e) => warn!("Failed to refresh listen time for user {user_id}: {e}"),
        }

        if tx.is_closed() {
            break;
        }

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = wake.notified() => {}
        }
    }

    debug!("Stopped watching listen time for user {user_id}");
}
