use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::session::SessionStore;

/// Cancellable handle to the background re-validation task.
///
/// Call [`shutdown`](Self::shutdown) for an orderly teardown; dropping the
/// handle aborts the task instead. Either way nothing fires afterwards.
pub struct RevalidationHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RevalidationHandle {
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RevalidationHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn the periodic + storage-change re-validation loop.
///
/// Wakes on every interval tick (`config.revalidate_interval`,
/// `MissedTickBehavior::Delay`) and on every bump of the token store's
/// change counter (another handle logging out), and runs
/// [`SessionStore::check_token_validity`] each time. The initial mount
/// check already ran in the store's constructor, so the first immediate
/// interval tick is consumed before the loop starts.
pub fn spawn_revalidation(session: Arc<SessionStore>) -> RevalidationHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut changes = session.store_changes();
    let period = session.config().revalidate_interval;

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("periodic credential re-validation");
                    session.check_token_validity();
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!("credential slot changed, re-validating");
                    session.check_token_validity();
                }
                _ = shutdown_rx.changed() => break,
            }
        }
    });

    RevalidationHandle {
        shutdown: shutdown_tx,
        task: Some(task),
    }
}
