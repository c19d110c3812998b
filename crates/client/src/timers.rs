//! Fixed-interval background tasks for the storefront home page.
//!
//! An [`IntervalTask`] owns one tokio task. Resetting it aborts the running
//! task and starts a fresh one, so intervals are replaced and never stacked.
//! Dropping it cancels the task.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// How long each hero slide stays up.
pub const SLIDE_INTERVAL: Duration = Duration::from_secs(5);

/// Where the flash-sale countdown starts: 8h 45m 30s.
pub const COUNTDOWN_START_SECS: u64 = 8 * 3600 + 45 * 60 + 30;

/// What the countdown wraps to after reaching zero.
pub const COUNTDOWN_WRAP_SECS: u64 = 24 * 3600;

type Tick = Arc<dyn Fn() + Send + Sync>;

// =============================================================================
// IntervalTask
// =============================================================================

/// A callback run every `period` on a background task.
pub struct IntervalTask {
    period: Duration,
    tick: Tick,
    handle: Option<JoinHandle<()>>,
}

impl fmt::Debug for IntervalTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalTask")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl IntervalTask {
    /// Start running `tick` every `period`, first after one full period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(period: Duration, tick: impl Fn() + Send + Sync + 'static) -> Self {
        let mut task = Self {
            period,
            tick: Arc::new(tick),
            handle: None,
        };
        task.reset();
        task
    }

    /// Restart the interval from now, replacing the running one.
    pub fn reset(&mut self) {
        self.stop();

        let period = self.period;
        let tick = Arc::clone(&self.tick);
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        }));
    }

    /// Cancel the interval. `reset` starts it again.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for IntervalTask {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// SlideRotation
// =============================================================================

/// Index over `n` slides that advances on its own every [`SLIDE_INTERVAL`].
///
/// Manual navigation restarts the interval so a slide the shopper picked
/// stays up for a full period.
#[derive(Debug)]
pub struct SlideRotation {
    len: usize,
    current: Arc<AtomicUsize>,
    task: IntervalTask,
}

impl SlideRotation {
    /// Start rotating over `len` slides at the default interval.
    #[must_use]
    pub fn start(len: usize) -> Self {
        Self::with_interval(len, SLIDE_INTERVAL)
    }

    /// Start rotating over `len` slides every `period`.
    #[must_use]
    pub fn with_interval(len: usize, period: Duration) -> Self {
        let current = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&current);
        let task = IntervalTask::start(period, move || {
            if len > 0 {
                let _ = shared.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| {
                    Some((i + 1) % len)
                });
            }
        });
        Self { len, current, task }
    }

    /// Index of the slide on display.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Show slide `index` (wrapped modulo the slide count).
    pub fn show(&mut self, index: usize) -> usize {
        if self.len == 0 {
            return 0;
        }
        let index = index % self.len;
        self.current.store(index, Ordering::SeqCst);
        self.task.reset();
        index
    }

    /// Advance one slide.
    pub fn next(&mut self) -> usize {
        self.show(self.current() + 1)
    }

    /// Go back one slide.
    pub fn prev(&mut self) -> usize {
        if self.len == 0 {
            return 0;
        }
        self.show(self.current() + self.len - 1)
    }
}

// =============================================================================
// Countdown
// =============================================================================

/// Flash-sale countdown ticking once per second.
#[derive(Debug)]
pub struct Countdown {
    remaining: Arc<AtomicU64>,
    _task: IntervalTask,
}

impl Countdown {
    /// Start counting down from [`COUNTDOWN_START_SECS`].
    #[must_use]
    pub fn start() -> Self {
        let remaining = Arc::new(AtomicU64::new(COUNTDOWN_START_SECS));
        let shared = Arc::clone(&remaining);
        let task = IntervalTask::start(Duration::from_secs(1), move || {
            let _ = shared.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| Some(step(s)));
        });
        Self {
            remaining,
            _task: task,
        }
    }

    /// Seconds left.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    /// Time left as `HH:MM:SS`.
    #[must_use]
    pub fn render(&self) -> String {
        render(self.remaining())
    }
}

/// One countdown tick.
#[must_use]
pub const fn step(remaining: u64) -> u64 {
    if remaining == 0 {
        COUNTDOWN_WRAP_SECS
    } else {
        remaining - 1
    }
}

/// Format seconds as `HH:MM:SS`.
#[must_use]
pub fn render(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}
