use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// A periodically refreshed value.
///
/// One task per handle runs `fetch` once per period and publishes each
/// successful result into a watch channel. A failed cycle keeps the
/// previously published value. A tick that fires while a cycle is still in
/// flight is skipped, so two cycles never run concurrently against the same
/// channel. The task stops once every receiver (the handle's included) has
/// been dropped; a fetch still in flight at that point has its result
/// discarded.
pub struct RefreshHandle<T> {
    rx: watch::Receiver<Option<T>>,
    #[allow(dead_code)]
    task: JoinHandle<()>,
}

impl<T> RefreshHandle<T> {
    /// Subscribes to the published values. `None` until the first
    /// successful cycle completes.
    pub fn receiver(&self) -> watch::Receiver<Option<T>> {
        self.rx.clone()
    }

    /// The most recently published value, if any cycle has succeeded yet.
    pub fn latest(&self) -> Option<T>
    where
        T: Clone,
    {
        self.rx.borrow().clone()
    }
}

pub fn spawn_refresh<T, E, F, Fut>(period: Duration, mut fetch: F) -> RefreshHandle<T>
where
    T: Send + Sync + 'static,
    E: std::fmt::Display + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Option<T>, E>> + Send + 'static,
{
    let (tx, rx) = watch::channel(None);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tx.closed() => {
                    debug!("All refresh watchers gone, stopping");
                    break;
                }
            }

            match fetch().await {
                Ok(value) => {
                    if tx.send(value).is_err() {
                        // watchers disappeared mid-cycle; result discarded
                        break;
                    }
                }
                Err(err) => {
                    error!("Refresh cycle failed, keeping last good value: {}", err);
                }
            }

            if tx.is_closed() {
                break;
            }
        }
    });

    RefreshHandle { rx, task }
}
