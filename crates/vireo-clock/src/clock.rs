#![forbid(unsafe_code)]

//! The analog clock component.
//!
//! One state cell, `timestamp` (milliseconds since the Unix epoch), and a
//! chain of computations deriving the hand angles from it:
//!
//! ```text
//! timestamp ─► date_object ─┬─► hours   ─► hours_degrees   ─┐
//!                           ├─► minutes ─► minutes_degrees ─┼─► render
//!                           └─► seconds ─► seconds_degrees ─┘
//! ```
//!
//! The `created` hook installs an interval that writes the wall clock into
//! `timestamp` once per tick. The wall clock and the time zone are
//! injectable, so tests can drive the clock from a lab scheduler.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Timelike, Utc};
use vireo_core::{Duration, TimerId};
use vireo_runtime::{Component, Computations, Scope, StateMap};

/// Selector the clock renders into unless told otherwise.
pub const DEFAULT_SELECTOR: &str = "#clock";

/// Interval between timestamp refreshes unless told otherwise.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Source of the current time in epoch milliseconds.
pub type WallClock = Rc<dyn Fn() -> i64>;

/// The system clock.
#[must_use]
pub fn system_clock() -> WallClock {
    Rc::new(|| Utc::now().timestamp_millis())
}

/// Time zone the hands are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// The system zone, resolved for every timestamp so offset changes such
    /// as daylight saving are followed.
    Local,
    /// A constant offset from UTC.
    Fixed(FixedOffset),
}

impl From<FixedOffset> for Zone {
    fn from(offset: FixedOffset) -> Self {
        Self::Fixed(offset)
    }
}

impl Zone {
    #[must_use]
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// `millis` since the epoch as a date in this zone, with the offset in
    /// effect at that instant.
    #[must_use]
    pub fn date(self, millis: i64) -> DateTime<FixedOffset> {
        let resolved = match self {
            Self::Local => Local
                .timestamp_millis_opt(millis)
                .single()
                .map(|date| date.fixed_offset()),
            Self::Fixed(offset) => offset.timestamp_millis_opt(millis).single(),
        };
        resolved.unwrap_or_else(|| DateTime::<Utc>::default().fixed_offset())
    }
}

/// Hand angle for `hours`: 30° per hour, not reduced modulo 12.
#[must_use]
pub fn hours_degrees(hours: u32) -> u32 {
    (360 / 12) * hours
}

/// Hand angle for minutes or seconds: 6° per unit.
#[must_use]
pub fn sixtieths_degrees(units: u32) -> u32 {
    (360 / 60) * units
}

/// Analog clock component.
pub struct Clock {
    selector: String,
    zone: Zone,
    tick: Duration,
    now: WallClock,
    interval: Rc<Cell<Option<TimerId>>>,
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("selector", &self.selector)
            .field("zone", &self.zone)
            .field("tick", &self.tick)
            .field("interval", &self.interval.get())
            .finish()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// A clock on the system time, in the local zone, rendering into
    /// [`DEFAULT_SELECTOR`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_wall_clock(system_clock()).zone(Zone::Local)
    }

    /// A clock reading time from `now`, in UTC.
    #[must_use]
    pub fn with_wall_clock(now: WallClock) -> Self {
        Self {
            selector: DEFAULT_SELECTOR.to_string(),
            zone: Zone::utc(),
            tick: DEFAULT_TICK,
            now,
            interval: Rc::new(Cell::new(None)),
        }
    }

    #[must_use]
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    /// Zone the hands are shown in.
    #[must_use]
    pub fn zone(mut self, zone: impl Into<Zone>) -> Self {
        self.zone = zone.into();
        self
    }

    /// Refresh period of the `created` interval.
    #[must_use]
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// The refresh interval, once `created` has run.
    #[must_use]
    pub fn interval(&self) -> Option<TimerId> {
        self.interval.get()
    }

    fn tick_millis(&self) -> u64 {
        u64::try_from(self.tick.as_millis()).unwrap_or(u64::MAX)
    }
}

fn read_u32(scope: &Scope, name: &str) -> u32 {
    scope.read::<u32>(name).unwrap_or_default()
}

fn field(scope: &Scope, pick: fn(&DateTime<FixedOffset>) -> u32) -> u32 {
    scope
        .read::<DateTime<FixedOffset>>("date_object")
        .as_ref()
        .map_or(0, pick)
}

impl Component for Clock {
    fn target(&self) -> &str {
        &self.selector
    }

    fn initial_state(&self) -> StateMap {
        StateMap::new().with("timestamp", (self.now)())
    }

    fn computations(&self) -> Computations {
        let zone = self.zone;
        Computations::new()
            .define("date_object", move |s: &Scope| {
                zone.date(s.read::<i64>("timestamp").unwrap_or_default())
            })
            .define("hours", |s: &Scope| field(s, |d| d.hour()))
            .define("minutes", |s: &Scope| field(s, |d| d.minute()))
            .define("seconds", |s: &Scope| field(s, |d| d.second()))
            .define("hours_degrees", |s: &Scope| hours_degrees(read_u32(s, "hours")))
            .define("minutes_degrees", |s: &Scope| {
                sixtieths_degrees(read_u32(s, "minutes"))
            })
            .define("seconds_degrees", |s: &Scope| {
                sixtieths_degrees(read_u32(s, "seconds"))
            })
    }

    fn created(&self, scope: &Scope) {
        let Some(timestamp) = scope.cell::<i64>("timestamp") else {
            tracing::warn!(selector = %self.selector, "clock has no timestamp cell");
            return;
        };
        let now = Rc::clone(&self.now);
        let id = scope
            .scheduler()
            .set_interval(self.tick, move || timestamp.set(now()));
        self.interval.set(Some(id));
        tracing::debug!(
            selector = %self.selector,
            %id,
            tick_ms = self.tick_millis(),
            "clock ticking"
        );
    }

    fn render(&self, s: &Scope) -> String {
        let arrows: String = ["hours_degrees", "minutes_degrees", "seconds_degrees"]
            .into_iter()
            .map(|name| {
                format!(
                    "  <div class=\"arrow-layout\" style=\"transform: rotateZ({}deg)\">\
                     <div class=\"arrow\"></div></div>\n",
                    read_u32(s, name)
                )
            })
            .collect();
        format!(
            "<div class=\"clock\">\n{arrows}  <span class=\"label\">H: {} M: {} S: {}</span>\n</div>",
            read_u32(s, "hours"),
            read_u32(s, "minutes"),
            read_u32(s, "seconds"),
        )
    }
}
