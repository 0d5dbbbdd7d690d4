use chrono::{DateTime, Duration as WallDuration, Local};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source for the drill. Wall time stamps sessions; the monotonic
/// instant measures attempts, so a wall clock step never shortens one.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
    fn instant(&self) -> Instant;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct ManualTime {
    wall: DateTime<Local>,
    base: Instant,
    elapsed: Duration,
}

/// Hand-driven clock for tests. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    time: Arc<Mutex<ManualTime>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            time: Arc::new(Mutex::new(ManualTime {
                wall: start,
                base: Instant::now(),
                elapsed: Duration::ZERO,
            })),
        }
    }

    /// Let `ms` milliseconds pass on both clocks
    pub fn advance_ms(&self, ms: u64) {
        self.with_time(|t| {
            t.wall += WallDuration::milliseconds(ms as i64);
            t.elapsed += Duration::from_millis(ms);
        });
    }

    /// Step the wall clock only, as an NTP correction would
    pub fn step_wall_ms(&self, ms: i64) {
        self.with_time(|t| t.wall += WallDuration::milliseconds(ms));
    }

    fn with_time(&self, f: impl FnOnce(&mut ManualTime)) {
        match self.time.lock() {
            Ok(mut t) => f(&mut t),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&ManualTime) -> T) -> T {
        match self.time.lock() {
            Ok(t) => f(&t),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Local::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.read(|t| t.wall)
    }

    fn instant(&self) -> Instant {
        self.read(|t| t.base + t.elapsed)
    }
}

/// Milliseconds between two wall times, clamped at zero
pub fn millis_between(start: DateTime<Local>, end: DateTime<Local>) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}

/// Milliseconds between two monotonic instants
pub fn millis_since(start: Instant, end: Instant) -> u64 {
    end.saturating_duration_since(start).as_millis() as u64
}
