// ── Variable handles and the auto-update poller ──
//
// A handle is bound to one declared variable of one session. It reads on
// demand and, when auto-update is enabled, runs its own timer task that
// re-reads the variable every interval and broadcasts the outcome. A failed
// tick is broadcast like any other; only disabling the handle (or dropping
// its session) stops the timer.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_core::Stream;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::session::WeakSession;

/// Interval used when auto-update is enabled without an explicit value.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

const UPDATE_CHANNEL_SIZE: usize = 64;

// ── AutoUpdate ───────────────────────────────────────────────────

/// Auto-update setting for a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoUpdate {
    #[default]
    Disabled,
    Every(Duration),
}

impl AutoUpdate {
    /// `0` is the disabling sentinel; anything else is an interval.
    pub fn from_millis(millis: u64) -> Self {
        if millis == 0 {
            Self::Disabled
        } else {
            Self::Every(Duration::from_millis(millis))
        }
    }

    /// Enabled at [`DEFAULT_POLL_INTERVAL`].
    pub fn enabled() -> Self {
        Self::Every(DEFAULT_POLL_INTERVAL)
    }

    pub fn interval(self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Every(interval) if interval.is_zero() => None,
            Self::Every(interval) => Some(interval),
        }
    }
}

/// Whether a handle currently has a timer running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
}

/// One tick's outcome.
#[derive(Debug, Clone)]
pub struct VariableUpdate {
    pub variable: String,
    pub result: Result<Value, Arc<CoreError>>,
}

// ── VariableHandle ───────────────────────────────────────────────

/// Read/poll handle for one variable.
///
/// Cheaply cloneable; all clones share one poller and one update channel.
#[derive(Clone)]
pub struct VariableHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    device: String,
    name: String,
    session: WeakSession,
    updates: broadcast::Sender<VariableUpdate>,
    poller: Mutex<Option<Poller>>,
}

struct Poller {
    interval: Duration,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl fmt::Debug for VariableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableHandle")
            .field("device", &self.inner.device)
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl Poller {
    fn stop(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

impl VariableHandle {
    pub(crate) fn new(device: String, name: String, session: WeakSession) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        Self {
            inner: Arc::new(HandleInner {
                device,
                name,
                session,
                updates,
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Read the variable once.
    pub async fn read(&self) -> Result<Value, CoreError> {
        let session = self
            .inner
            .session
            .upgrade()
            .ok_or_else(|| CoreError::SessionClosed {
                id: self.inner.device.clone(),
            })?;
        session.read_variable(&self.inner.name).await
    }

    // ── Auto-update ──────────────────────────────────────────────

    /// Enable, retune or disable polling.
    ///
    /// Any running timer is stopped first, so a handle never has more than
    /// one. Must be called from within a Tokio runtime when enabling.
    pub fn set_auto_update(&self, mode: AutoUpdate) {
        let mut poller = self
            .inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = poller.take() {
            previous.stop();
            debug!(variable = %self.inner.name, "auto-update stopped");
        }

        let Some(interval) = mode.interval() else {
            return;
        };

        let session = self.inner.session.clone();
        let variable = self.inner.name.clone();
        let read = move || {
            let session = session.clone();
            let variable = variable.clone();
            async move {
                let live = session.upgrade()?;
                Some(live.read_variable(&variable).await)
            }
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_task(
            self.inner.name.clone(),
            read,
            self.inner.updates.clone(),
            interval,
            cancel.clone(),
        ));
        *poller = Some(Poller {
            interval,
            cancel,
            task,
        });
        debug!(
            device = %self.inner.device,
            variable = %self.inner.name,
            ?interval,
            "auto-update started"
        );
    }

    /// Shorthand for `set_auto_update(AutoUpdate::Disabled)`.
    pub fn disable_auto_update(&self) {
        self.set_auto_update(AutoUpdate::Disabled);
    }

    pub fn poll_state(&self) -> PollState {
        if self.interval().is_some() {
            PollState::Polling
        } else {
            PollState::Idle
        }
    }

    /// The active polling interval, if any.
    pub fn interval(&self) -> Option<Duration> {
        self.inner
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|p| p.interval)
    }

    // ── Update subscription ──────────────────────────────────────

    /// Subscribe to update events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<VariableUpdate> {
        self.inner.updates.subscribe()
    }

    /// Subscribe as a `Stream` for use with `StreamExt` combinators.
    pub fn updates(&self) -> UpdateStream {
        UpdateStream {
            inner: BroadcastStream::new(self.subscribe()),
        }
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        let poller = self
            .poller
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(poller) = poller {
            poller.stop();
        }
    }
}

// ── UpdateStream ─────────────────────────────────────────────────

/// `Stream` adapter backed by a `broadcast::Receiver`.
///
/// A consumer that falls more than the channel capacity behind skips the
/// missed updates rather than ending the stream.
pub struct UpdateStream {
    inner: BroadcastStream<VariableUpdate>,
}

impl Stream for UpdateStream {
    type Item = VariableUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(update))) => return Poll::Ready(Some(update)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "update consumer lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

// ── Background task ──────────────────────────────────────────────

/// Re-read the variable every `interval` until cancelled.
///
/// `read` yields `None` once the owning session is gone, which ends the task.
async fn poll_task<F, Fut>(
    name: String,
    mut read: F,
    updates: broadcast::Sender<VariableUpdate>,
    interval: Duration,
    cancel: CancellationToken,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<Result<Value, CoreError>>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let Some(result) = read().await else { break };
                let result = result.map_err(Arc::new);

                if let Err(ref e) = result {
                    warn!(variable = %name, error = %e, "auto-update read failed");
                }
                // No subscribers is not an error: the timer keeps running.
                let _ = updates.send(VariableUpdate {
                    variable: name.clone(),
                    result,
                });
            }
        }
    }

    debug!(variable = %name, "poller exited");
}
