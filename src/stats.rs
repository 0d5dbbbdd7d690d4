use crate::clock::millis_between;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Counters and timestamps for one training session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub correct_inputs: u32,
    pub total_inputs: u32,
    pub completed_stratagems: u32,
    /// Every mismatch counts as a failed attempt
    pub failed_stratagems: u32,
    pub started_at: Option<DateTime<Local>>,
    pub ended_at: Option<DateTime<Local>>,
}

impl SessionStatistics {
    /// Seconds between start and `ended_at`, or `now` while the session is running
    pub fn elapsed_secs(&self, now: DateTime<Local>) -> f64 {
        match self.started_at {
            Some(start) => millis_between(start, self.ended_at.unwrap_or(now)) as f64 / 1000.0,
            None => 0.0,
        }
    }

    /// Elapsed time of a finished session; zero when either timestamp is missing
    pub fn duration_secs(&self) -> f64 {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => millis_between(start, end) as f64 / 1000.0,
            _ => 0.0,
        }
    }

    /// Completed stratagems per minute, 0 when no time has passed
    pub fn throughput_per_minute(&self, now: DateTime<Local>) -> f64 {
        let elapsed = self.elapsed_secs(now);
        if elapsed <= 0.0 {
            return 0.0;
        }
        self.completed_stratagems as f64 / (elapsed / 60.0)
    }

    /// Percentage of keystrokes that matched, 0 with no input
    pub fn accuracy(&self) -> f64 {
        if self.total_inputs == 0 {
            return 0.0;
        }
        (self.correct_inputs as f64 / self.total_inputs as f64) * 100.0
    }

    pub fn mismatched_inputs(&self) -> u32 {
        self.total_inputs - self.correct_inputs
    }

    pub fn has_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// Accumulates statistics between `start` and `stop`
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    stats: SessionStatistics,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: DateTime<Local>) {
        self.stats = SessionStatistics {
            started_at: Some(now),
            ..SessionStatistics::default()
        };
    }

    pub fn record_keystroke(&mut self, correct: bool) {
        self.stats.total_inputs += 1;
        if correct {
            self.stats.correct_inputs += 1;
        }
    }

    pub fn record_completion(&mut self) {
        self.stats.completed_stratagems += 1;
    }

    pub fn record_failure(&mut self) {
        self.stats.failed_stratagems += 1;
    }

    /// Freeze the session and hand out the final snapshot
    pub fn stop(&mut self, now: DateTime<Local>) -> SessionStatistics {
        if self.stats.ended_at.is_none() {
            self.stats.ended_at = Some(now);
        }
        self.stats
    }

    /// Clear counters and timestamps without starting a new session
    pub fn reset(&mut self) {
        self.stats = SessionStatistics::default();
    }

    pub fn snapshot(&self) -> SessionStatistics {
        self.stats
    }

    pub fn is_running(&self) -> bool {
        self.stats.started_at.is_some() && self.stats.ended_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    fn finished(completed: u32, failed: u32, secs: u64) -> SessionStatistics {
        let clock = ManualClock::default();
        let mut tracker = SessionTracker::new();
        tracker.start(clock.now());
        for _ in 0..completed {
            tracker.record_completion();
        }
        for _ in 0..failed {
            tracker.record_failure();
        }
        clock.advance_ms(secs * 1000);
        tracker.stop(clock.now())
    }

    #[test]
    fn start_zeroes_counters_and_sets_start_time() {
        let clock = ManualClock::default();
        let mut tracker = SessionTracker::new();
        tracker.start(clock.now());
        tracker.record_keystroke(true);
        tracker.record_failure();

        tracker.start(clock.now());
        let stats = tracker.snapshot();
        assert_eq!(stats.total_inputs, 0);
        assert_eq!(stats.failed_stratagems, 0);
        assert_eq!(stats.started_at, Some(clock.now()));
        assert_eq!(stats.ended_at, None);
        assert!(tracker.is_running());
    }

    #[test]
    fn keystrokes_split_into_correct_and_total() {
        let mut tracker = SessionTracker::new();
        tracker.record_keystroke(true);
        tracker.record_keystroke(false);
        tracker.record_keystroke(true);

        let stats = tracker.snapshot();
        assert_eq!(stats.total_inputs, 3);
        assert_eq!(stats.correct_inputs, 2);
        assert_eq!(stats.mismatched_inputs(), 1);
        assert!((stats.accuracy() - 66.666).abs() < 0.01);
    }

    #[test]
    fn stop_sets_end_time_once() {
        let clock = ManualClock::default();
        let mut tracker = SessionTracker::new();
        tracker.start(clock.now());
        clock.advance_ms(1000);
        let first = tracker.stop(clock.now());
        clock.advance_ms(1000);
        let second = tracker.stop(clock.now());

        assert_eq!(first, second);
        assert_eq!(first.duration_secs(), 1.0);
        assert!(!tracker.is_running());
    }

    #[test]
    fn throughput_sixty_in_a_minute() {
        let stats = finished(60, 0, 60);
        assert_eq!(stats.throughput_per_minute(Local::now()), 60.0);
    }

    #[test]
    fn throughput_twenty_in_a_minute() {
        let stats = finished(20, 4, 60);
        assert_eq!(stats.throughput_per_minute(Local::now()), 20.0);
    }

    #[test]
    fn throughput_zero_without_elapsed_time() {
        let stats = finished(5, 0, 0);
        assert_eq!(stats.throughput_per_minute(Local::now()), 0.0);

        let never_started = SessionStatistics::default();
        assert_eq!(never_started.throughput_per_minute(Local::now()), 0.0);
        assert_eq!(never_started.elapsed_secs(Local::now()), 0.0);
    }

    #[test]
    fn running_session_uses_now_for_elapsed() {
        let clock = ManualClock::default();
        let mut tracker = SessionTracker::new();
        tracker.start(clock.now());
        tracker.record_completion();
        clock.advance_ms(30_000);

        let stats = tracker.snapshot();
        assert_eq!(stats.elapsed_secs(clock.now()), 30.0);
        assert_eq!(stats.throughput_per_minute(clock.now()), 2.0);
    }

    #[test]
    fn accuracy_is_zero_without_input() {
        assert_eq!(SessionStatistics::default().accuracy(), 0.0);
    }
}
