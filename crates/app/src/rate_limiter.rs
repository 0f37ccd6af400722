//! Time-windowed call suppression: debounce and throttle.
//!
//! A [`RateLimiter`] wraps a callback and decides, per call, whether to run
//! it now, later on a timer, or not at all. `throttle` is a debounce with
//! both edges enabled and `max_wait` equal to the window, so a burst runs the
//! callback at most twice per window: once with the first arguments and once
//! with the last.
//!
//! Timers are tokio tasks; a limiter must be used from within a runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;

use kiosk_bridge_domain::error::ValidationError;

/// Edge and ceiling options for [`RateLimiter::debounce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Run on the first call of a burst.
    pub leading: bool,
    /// Run after the burst has been quiet for the whole window.
    pub trailing: bool,
    /// Longest the callback may be deferred while calls keep coming.
    pub max_wait: Option<Duration>,
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self {
            leading: false,
            trailing: true,
            max_wait: None,
        }
    }
}

/// A debounced or throttled callback.
///
/// Clones share the same timeline.
pub struct RateLimiter<A> {
    shared: Arc<Shared<A>>,
}

impl<A> Clone for RateLimiter<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<A> {
    func: Box<dyn Fn(A) + Send + Sync>,
    wait: Duration,
    leading: bool,
    trailing: bool,
    max_wait: Option<Duration>,
    timeline: Mutex<Timeline<A>>,
}

struct Timeline<A> {
    last_args: Option<A>,
    last_call: Option<Instant>,
    last_invoke: Option<Instant>,
    timer: Option<AbortHandle>,
    /// Bumped whenever the timer is replaced; a firing timer with an older
    /// epoch does nothing.
    epoch: u64,
}

impl<A: Send + 'static> RateLimiter<A> {
    /// Debounce `func` over `wait`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoEdgeEnabled`] when both edges are off.
    pub fn debounce<F>(wait: Duration, options: DebounceOptions, func: F) -> Result<Self, ValidationError>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        if !options.leading && !options.trailing {
            return Err(ValidationError::NoEdgeEnabled);
        }
        Ok(Self::build(wait, options, Box::new(func)))
    }

    /// Throttle `func` to at most one leading and one trailing run per `wait`.
    #[must_use]
    pub fn throttle<F>(wait: Duration, func: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let options = DebounceOptions {
            leading: true,
            trailing: true,
            max_wait: Some(wait),
        };
        Self::build(wait, options, Box::new(func))
    }

    fn build(wait: Duration, options: DebounceOptions, func: Box<dyn Fn(A) + Send + Sync>) -> Self {
        Self {
            shared: Arc::new(Shared {
                func,
                wait,
                leading: options.leading,
                trailing: options.trailing,
                max_wait: options.max_wait.map(|max| max.max(wait)),
                timeline: Mutex::new(Timeline {
                    last_args: None,
                    last_call: None,
                    last_invoke: None,
                    timer: None,
                    epoch: 0,
                }),
            }),
        }
    }

    /// Record a call with `args`, running the callback now if an edge is due.
    pub fn call(&self, args: A) {
        let shared = &self.shared;
        let now = Instant::now();
        let ready = {
            let mut timeline = shared.lock();
            let is_invoking = shared.should_invoke(&timeline, now);
            timeline.last_args = Some(args);
            timeline.last_call = Some(now);

            if is_invoking && timeline.timer.is_none() {
                shared.leading_edge(&mut timeline, now)
            } else if is_invoking && shared.max_wait.is_some() {
                Shared::arm(shared, &mut timeline, shared.wait);
                Shared::take_invocation(&mut timeline, now)
            } else {
                if timeline.timer.is_none() {
                    Shared::arm(shared, &mut timeline, shared.wait);
                }
                None
            }
        };
        if let Some(args) = ready {
            (shared.func)(args);
        }
    }

    /// Drop any pending trailing run and reset the timeline.
    pub fn cancel(&self) {
        let mut timeline = self.shared.lock();
        if let Some(timer) = timeline.timer.take() {
            timer.abort();
        }
        timeline.epoch = timeline.epoch.wrapping_add(1);
        timeline.last_args = None;
        timeline.last_call = None;
        timeline.last_invoke = None;
    }

    /// Run the pending trailing call now, if there is one.
    pub fn flush(&self) {
        let shared = &self.shared;
        let ready = {
            let mut timeline = shared.lock();
            let Some(timer) = timeline.timer.take() else {
                return;
            };
            timer.abort();
            timeline.epoch = timeline.epoch.wrapping_add(1);
            shared.trailing_edge(&mut timeline, Instant::now())
        };
        if let Some(args) = ready {
            (shared.func)(args);
        }
    }

    /// Whether a timer is waiting to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.shared.lock().timer.is_some()
    }
}

impl<A: Send + 'static> Shared<A> {
    fn lock(&self) -> MutexGuard<'_, Timeline<A>> {
        self.timeline.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn should_invoke(&self, timeline: &Timeline<A>, now: Instant) -> bool {
        let Some(last_call) = timeline.last_call else {
            return true;
        };
        // A clock that went backwards counts as an elapsed window.
        let Some(since_call) = now.checked_duration_since(last_call) else {
            return true;
        };
        if since_call >= self.wait {
            return true;
        }
        match (self.max_wait, timeline.last_invoke) {
            (Some(max_wait), Some(last_invoke)) => now.saturating_duration_since(last_invoke) >= max_wait,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn remaining_wait(&self, timeline: &Timeline<A>, now: Instant) -> Duration {
        let since_call = timeline
            .last_call
            .map_or(Duration::ZERO, |last_call| now.saturating_duration_since(last_call));
        let waiting = self.wait.saturating_sub(since_call);
        match (self.max_wait, timeline.last_invoke) {
            (Some(max_wait), Some(last_invoke)) => {
                waiting.min(max_wait.saturating_sub(now.saturating_duration_since(last_invoke)))
            }
            _ => waiting,
        }
    }

    fn leading_edge(self: &Arc<Self>, timeline: &mut Timeline<A>, now: Instant) -> Option<A> {
        timeline.last_invoke = Some(now);
        Self::arm(self, timeline, self.wait);
        if self.leading {
            Self::take_invocation(timeline, now)
        } else {
            None
        }
    }

    fn trailing_edge(&self, timeline: &mut Timeline<A>, now: Instant) -> Option<A> {
        timeline.timer = None;
        if self.trailing && timeline.last_args.is_some() {
            Self::take_invocation(timeline, now)
        } else {
            timeline.last_args = None;
            None
        }
    }

    fn take_invocation(timeline: &mut Timeline<A>, now: Instant) -> Option<A> {
        timeline.last_invoke = Some(now);
        timeline.last_args.take()
    }

    fn arm(shared: &Arc<Self>, timeline: &mut Timeline<A>, delay: Duration) {
        if let Some(timer) = timeline.timer.take() {
            timer.abort();
        }
        timeline.epoch = timeline.epoch.wrapping_add(1);
        let epoch = timeline.epoch;
        let shared = Arc::clone(shared);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.timer_expired(epoch);
        });
        timeline.timer = Some(task.abort_handle());
    }

    fn timer_expired(self: &Arc<Self>, epoch: u64) {
        let now = Instant::now();
        let ready = {
            let mut timeline = self.lock();
            if timeline.epoch != epoch {
                return;
            }
            timeline.timer = None;
            if self.should_invoke(&timeline, now) {
                self.trailing_edge(&mut timeline, now)
            } else {
                let remaining = self.remaining_wait(&timeline, now);
                Self::arm(self, &mut timeline, remaining);
                None
            }
        };
        if let Some(args) = ready {
            (self.func)(args);
        }
    }
}
