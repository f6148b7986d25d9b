#![forbid(unsafe_code)]

//! Single-threaded cooperative event loop with a microtask queue and a timer
//! queue.
//!
//! [`Scheduler`] is a cheaply cloneable handle (`Rc` inside). Every clone
//! drives the same queues, so components, timers and tests can share one
//! loop without threading anything else through.
//!
//! # Turns
//!
//! A *turn* runs exactly one due timer callback and then drains the
//! microtask queue. Work that happens synchronously inside a turn (or in test
//! code between turns) belongs to the same scheduling turn; a zero-delay
//! timer armed there fires no earlier than the next turn.
//!
//! # Time sources
//!
//! - **Real**: wall-clock time measured from loop creation with
//!   `web_time::Instant`. [`Scheduler::run_for`] sleeps until each timer is due.
//! - **Lab**: a manually advanced [`LabClock`]. [`Scheduler::run_for`] jumps
//!   straight to each due time, which makes timer-driven tests deterministic.
//!
//! # Invariants
//!
//! 1. Timers fire ordered by due time, then by arming order.
//! 2. Microtasks run in FIFO order, including ones queued while draining.
//! 3. A cleared timer never fires again, even when cleared from inside its
//!    own callback.
//! 4. Interval periods are clamped to [`MIN_INTERVAL`].
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use vireo_core::scheduler::Scheduler;
//! use web_time::Duration;
//!
//! let (scheduler, _clock) = Scheduler::lab();
//! let hits = Rc::new(Cell::new(0));
//! let h = Rc::clone(&hits);
//! scheduler.set_interval(Duration::from_secs(1), move || h.set(h.get() + 1));
//!
//! scheduler.run_for(Duration::from_secs(3));
//! assert_eq!(hits.get(), 3);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use web_time::{Duration, Instant};

/// Smallest period accepted by [`Scheduler::set_interval`].
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle returned when arming a timer. Pass it to
/// [`Scheduler::clear_timer`] to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw numeric id, unique per scheduler.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

// ─── Time source ─────────────────────────────────────────────────────────────

/// A manually-advanceable clock for deterministic tests.
///
/// All schedulers sharing the same `LabClock` see the same time.
#[derive(Debug, Clone, Default)]
pub struct LabClock {
    offset: Rc<Cell<Duration>>,
}

impl LabClock {
    /// Create a lab clock starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `delta` without running any timers.
    pub fn advance(&self, delta: Duration) {
        self.offset.set(self.offset.get() + delta);
    }

    /// Time elapsed since the clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    /// Move forward to `at`. Never moves backwards.
    fn advance_to(&self, at: Duration) {
        if at > self.offset.get() {
            self.offset.set(at);
        }
    }
}

#[derive(Debug, Clone)]
enum TimeSource {
    /// Real wall-clock time, measured from the loop's epoch.
    Real(Instant),
    /// Deterministic lab clock for testing.
    Lab(LabClock),
}

impl TimeSource {
    fn now(&self) -> Duration {
        match self {
            Self::Real(epoch) => epoch.elapsed(),
            Self::Lab(clock) => clock.elapsed(),
        }
    }

    fn wait_until(&self, at: Duration) {
        match self {
            Self::Real(epoch) => {
                let now = epoch.elapsed();
                if at > now {
                    std::thread::sleep(at - now);
                }
            }
            Self::Lab(clock) => clock.advance_to(at),
        }
    }
}

// ─── Inner shared state ──────────────────────────────────────────────────────

type Microtask = Box<dyn FnOnce()>;
type TimerCallback = Box<dyn FnMut()>;

/// Queue position: due time, then arming sequence.
type TimerKey = (Duration, u64);

struct Timer {
    key: TimerKey,
    period: Option<Duration>,
    /// `None` while the callback is running.
    callback: Option<TimerCallback>,
}

struct LoopInner {
    time: TimeSource,
    microtasks: RefCell<VecDeque<Microtask>>,
    timers: RefCell<AHashMap<TimerId, Timer>>,
    queue: RefCell<BTreeMap<TimerKey, TimerId>>,
    next_seq: Cell<u64>,
}

// ─── Scheduler ───────────────────────────────────────────────────────────────

/// Handle to a single-threaded event loop.
///
/// Cloning creates a new handle to the **same** loop.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<LoopInner>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now())
            .field("microtasks", &self.pending_microtasks())
            .field("timers", &self.pending_timers())
            .finish()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    // ── Constructors ─────────────────────────────────────────────────

    /// Create a loop driven by real wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(TimeSource::Real(Instant::now()))
    }

    /// Create a loop driven by `clock`.
    #[must_use]
    pub fn with_lab_clock(clock: LabClock) -> Self {
        Self::with_source(TimeSource::Lab(clock))
    }

    /// Create a loop driven by a fresh lab clock, returning both.
    #[must_use]
    pub fn lab() -> (Self, LabClock) {
        let clock = LabClock::new();
        (Self::with_lab_clock(clock.clone()), clock)
    }

    fn with_source(time: TimeSource) -> Self {
        Self {
            inner: Rc::new(LoopInner {
                time,
                microtasks: RefCell::new(VecDeque::new()),
                timers: RefCell::new(AHashMap::new()),
                queue: RefCell::new(BTreeMap::new()),
                next_seq: Cell::new(1),
            }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Time elapsed since the loop was created (or the lab clock's reading).
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.time.now()
    }

    /// Whether this loop runs on a lab clock.
    #[must_use]
    pub fn is_lab(&self) -> bool {
        matches!(self.inner.time, TimeSource::Lab(_))
    }

    /// Number of queued, not yet run microtasks.
    #[must_use]
    pub fn pending_microtasks(&self) -> usize {
        self.inner.microtasks.borrow().len()
    }

    /// Number of armed timers (including intervals).
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Due time of the earliest armed timer.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.inner
            .queue
            .borrow()
            .first_key_value()
            .map(|(&(due, _), _)| due)
    }

    // ── Queueing ─────────────────────────────────────────────────────

    /// Queue `task` to run after the currently executing task.
    pub fn queue_microtask(&self, task: impl FnOnce() + 'static) {
        self.inner.microtasks.borrow_mut().push_back(Box::new(task));
    }

    /// Arm a one-shot timer firing `delay` from now.
    pub fn set_timeout(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerId {
        let mut callback = Some(callback);
        self.arm(delay, None, move || {
            if let Some(callback) = callback.take() {
                callback();
            }
        })
    }

    /// Arm a repeating timer firing every `period` (clamped to
    /// [`MIN_INTERVAL`]) until cleared.
    pub fn set_interval(&self, period: Duration, callback: impl FnMut() + 'static) -> TimerId {
        let period = period.max(MIN_INTERVAL);
        self.arm(period, Some(period), callback)
    }

    /// Cancel a timer. Returns `false` if it already fired or was never
    /// armed here.
    pub fn clear_timer(&self, id: TimerId) -> bool {
        let removed = self.inner.timers.borrow_mut().remove(&id);
        let Some(timer) = removed else {
            return false;
        };
        self.inner.queue.borrow_mut().remove(&timer.key);
        tracing::trace!(timer = id.0, "timer cleared");
        true
    }

    fn arm(
        &self,
        delay: Duration,
        period: Option<Duration>,
        callback: impl FnMut() + 'static,
    ) -> TimerId {
        let seq = self.next_seq();
        let id = TimerId(seq);
        let key = (self.now() + delay, seq);
        self.inner.timers.borrow_mut().insert(
            id,
            Timer {
                key,
                period,
                callback: Some(Box::new(callback)),
            },
        );
        self.inner.queue.borrow_mut().insert(key, id);
        tracing::trace!(timer = seq, ?delay, periodic = period.is_some(), "timer armed");
        id
    }

    fn next_seq(&self) -> u64 {
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        seq
    }

    // ── Running ──────────────────────────────────────────────────────

    /// Drain the microtask queue, including tasks queued while draining.
    ///
    /// Returns the number of microtasks run.
    pub fn run_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.inner.microtasks.borrow_mut().pop_front();
            let Some(task) = task else {
                return ran;
            };
            task();
            ran += 1;
        }
    }

    /// Run one turn: the earliest timer due at the current time, followed by
    /// a microtask drain.
    ///
    /// Returns `false` without doing anything if no timer is due.
    pub fn run_turn(&self) -> bool {
        let now = self.now();
        let next = {
            let mut queue = self.inner.queue.borrow_mut();
            match queue.first_key_value() {
                Some((&(due, _), _)) if due <= now => queue.pop_first().map(|(_, id)| id),
                _ => None,
            }
        };
        let Some(id) = next else {
            return false;
        };

        let callback = self
            .inner
            .timers
            .borrow_mut()
            .get_mut(&id)
            .and_then(|timer| timer.callback.take());
        if let Some(mut callback) = callback {
            callback();
            self.finish_timer(id, callback);
        }
        self.run_microtasks();
        true
    }

    /// Put an interval back in the queue, or retire a one-shot timer.
    fn finish_timer(&self, id: TimerId, callback: TimerCallback) {
        let mut timers = self.inner.timers.borrow_mut();
        let Some(timer) = timers.get_mut(&id) else {
            // Cleared from inside its own callback.
            return;
        };
        match timer.period {
            Some(period) => {
                let key = (self.now() + period, self.next_seq());
                timer.key = key;
                timer.callback = Some(callback);
                self.inner.queue.borrow_mut().insert(key, id);
            }
            None => {
                timers.remove(&id);
            }
        }
    }

    /// Drain microtasks, then run turns until no timer is due at the current
    /// time. Zero-delay timers armed along the way are included.
    ///
    /// Returns the number of timer callbacks run.
    pub fn run_until_idle(&self) -> usize {
        self.run_microtasks();
        let mut fired = 0;
        while self.run_turn() {
            fired += 1;
        }
        fired
    }

    /// Keep the loop going for `span`, firing every timer that falls due.
    ///
    /// On a lab loop time jumps from one due timer to the next; on a real
    /// loop the calling thread sleeps in between. Returns the number of
    /// timer callbacks run.
    pub fn run_for(&self, span: Duration) -> usize {
        let deadline = self.now() + span;
        let mut fired = self.run_until_idle();
        while let Some(due) = self.next_due() {
            if due > deadline {
                break;
            }
            self.inner.time.wait_until(due);
            fired += self.run_until_idle();
        }
        self.inner.time.wait_until(deadline);
        fired + self.run_until_idle()
    }

    /// Run until no timers remain armed.
    ///
    /// Never returns while an interval is active.
    pub fn run(&self) -> usize {
        let mut fired = self.run_until_idle();
        while let Some(due) = self.next_due() {
            self.inner.time.wait_until(due);
            fired += self.run_until_idle();
        }
        fired
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
