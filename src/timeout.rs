use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long a human player gets before their turn is played for them.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(120);

/// Identifies one arming of the timer. A fired task presents its token to
/// `is_current` before acting; any later arm or reset makes it stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// Schedules the per-turn idle timer. At most one task is ever pending:
/// arming replaces (and aborts) any outstanding task, and `reset_timers`
/// cancels unconditionally. Aborting cannot stop a task that has already
/// fired and is waiting on a lock, so cancellation is two-layered: the
/// generation counter invalidates the fired task's token, and the task
/// must check `is_current` under the caller's own lock before acting.
#[derive(Debug)]
pub struct TimeoutController {
    delay: Duration,
    generation: AtomicU64,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl TimeoutController {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arms the timer; after the delay, `on_fire` runs with this arming's
    /// token. Last-wins: an earlier pending task is aborted and its token
    /// invalidated, so arming twice cannot act twice.
    pub fn set_timer<F, Fut>(&self, on_fire: F)
    where
        F: FnOnce(TimerToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = TimerToken(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(token).await;
        });
        if let Some(old) = self.pending.lock().unwrap().replace(task) {
            old.abort();
        }
    }

    /// Whether `token` belongs to the most recent arming, with no reset
    /// since. A fired task whose token is stale must not act.
    pub fn is_current(&self, token: TimerToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.0
    }

    /// Cancels any pending task and invalidates every outstanding token.
    /// Called at the start of handling every player action and every
    /// automatic move.
    pub fn reset_timers(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.pending.lock().unwrap().take() {
            task.abort();
        }
    }
}

impl Drop for TimeoutController {
    fn drop(&mut self) {
        self.reset_timers();
    }
}
