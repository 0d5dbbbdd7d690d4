use crate::{
    catalog::StratagemDefinition,
    clock::{millis_since, Clock, SystemClock},
    code_generator::CodeGenerator,
    direction::Direction,
    effects::{Effects, LogEffects},
    ledger::BestTimeLedger,
    stats::{SessionStatistics, SessionTracker},
};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Instant;
use tracing::{debug, info};

/// How long a completed code stays on screen before the next one is picked
pub const DEFAULT_HOLD_MS: u64 = 200;

/// Classification of one submitted direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Progressed { progress: usize },
    Completed { elapsed_ms: u64, new_best: bool },
    Mismatch { position: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No active target: session inactive or nothing to practice
    Idle,
    InProgress,
    /// Code finished, waiting out the display hold
    Succeeded,
    /// A mismatch was just received; progress is back at zero
    Failed,
}

/// Sequence-matching engine and session driver.
///
/// Owns the active target, the input progress, the session tracker and the
/// best-time ledger. Every state change happens synchronously inside the call
/// that caused it, in the order inputs arrive.
#[derive(Debug)]
pub struct Drill<C: Clock = SystemClock, E: Effects = LogEffects> {
    clock: C,
    effects: E,
    generator: CodeGenerator<StdRng>,
    tracker: SessionTracker,
    ledger: BestTimeLedger,
    pool: Vec<StratagemDefinition>,
    random_mode: bool,
    session_active: bool,
    active: Option<StratagemDefinition>,
    attempt_random: bool,
    progress: Vec<Direction>,
    attempt_started_at: Option<Instant>,
    hold_started_at: Option<Instant>,
    hold_ms: u64,
    just_failed: bool,
    last_time_ms: Option<u64>,
}

impl Drill {
    pub fn new(pool: Vec<StratagemDefinition>) -> Self {
        Self::with_parts(pool, SystemClock, LogEffects)
    }
}

impl<C: Clock, E: Effects> Drill<C, E> {
    pub fn with_parts(pool: Vec<StratagemDefinition>, clock: C, effects: E) -> Self {
        Self {
            clock,
            effects,
            generator: CodeGenerator::with_rng(StdRng::from_entropy()),
            tracker: SessionTracker::new(),
            ledger: BestTimeLedger::new(),
            pool,
            random_mode: false,
            session_active: false,
            active: None,
            attempt_random: false,
            progress: Vec::new(),
            attempt_started_at: None,
            hold_started_at: None,
            hold_ms: DEFAULT_HOLD_MS,
            just_failed: false,
            last_time_ms: None,
        }
    }

    /// Make target selection reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.generator = CodeGenerator::with_rng(StdRng::seed_from_u64(seed));
        self
    }

    pub fn with_hold_ms(mut self, hold_ms: u64) -> Self {
        self.hold_ms = hold_ms;
        self
    }

    pub fn with_random_mode(mut self, on: bool) -> Self {
        self.random_mode = on;
        self
    }

    /// Replace the eligible pool. The attempt in progress keeps its target; the
    /// new pool is used from the next selection on.
    pub fn set_pool(&mut self, pool: Vec<StratagemDefinition>) {
        self.pool = pool;
        if self.session_active && self.active.is_none() && self.hold_started_at.is_none() {
            self.select_next();
        }
    }

    /// Switch between catalog and random targets. A running session is
    /// abandoned without statistics; returns true when that happened.
    pub fn set_random_mode(&mut self, on: bool) -> bool {
        if self.random_mode == on {
            return false;
        }
        self.random_mode = on;
        if self.session_active {
            self.abort_session();
            return true;
        }
        false
    }

    pub fn start_session(&mut self) {
        let now = self.clock.now();
        self.tracker.start(now);
        self.session_active = true;
        self.last_time_ms = None;
        self.select_next();
        info!(
            random_mode = self.random_mode,
            pool = self.pool.len(),
            "session started"
        );
    }

    /// Freeze statistics and end the session. None when no session was running.
    pub fn stop_session(&mut self) -> Option<SessionStatistics> {
        if !self.session_active {
            return None;
        }
        let stats = self.tracker.stop(self.clock.now());
        self.clear_attempt();
        self.session_active = false;
        info!(
            completed = stats.completed_stratagems,
            failed = stats.failed_stratagems,
            total_inputs = stats.total_inputs,
            "session stopped"
        );
        Some(stats)
    }

    /// End the session and throw its statistics away
    pub fn abort_session(&mut self) {
        self.clear_attempt();
        self.session_active = false;
        self.tracker.reset();
        info!("session aborted");
    }

    fn clear_attempt(&mut self) {
        self.active = None;
        self.attempt_random = false;
        self.progress.clear();
        self.attempt_started_at = None;
        self.hold_started_at = None;
        self.just_failed = false;
    }

    /// Pick the next target: a synthesized code in random mode, otherwise a
    /// uniform draw from the pool. An empty pool leaves the drill idle.
    pub fn select_next(&mut self) -> Option<&StratagemDefinition> {
        let next = if self.random_mode {
            Some(self.generator.generate())
        } else {
            self.generator.pick(&self.pool).cloned()
        };

        self.progress.clear();
        self.hold_started_at = None;
        self.just_failed = false;
        self.attempt_random = self.random_mode;

        match next {
            Some(target) => {
                debug!(id = %target.id, len = target.len(), "next target");
                self.attempt_started_at = Some(self.clock.instant());
                self.active = Some(target);
            }
            None => {
                debug!("selection pool is empty");
                self.attempt_started_at = None;
                self.active = None;
            }
        }
        self.active.as_ref()
    }

    /// Classify one direction against the active target. Returns None when the
    /// input is ignored: no session, no target, or the success hold is running.
    pub fn submit(&mut self, dir: Direction) -> Option<Outcome> {
        if !self.session_active || self.hold_started_at.is_some() {
            return None;
        }
        let target = self.active.as_ref()?;
        let position = self.progress.len();
        let expected = *target.code.get(position)?;
        let now = self.clock.instant();

        if dir != expected {
            self.tracker.record_keystroke(false);
            self.tracker.record_failure();
            self.progress.clear();
            self.just_failed = true;
            self.effects.on_mismatch(target, position);
            return Some(Outcome::Mismatch { position });
        }

        self.tracker.record_keystroke(true);
        self.progress.push(dir);
        self.just_failed = false;

        let progress = self.progress.len();
        if progress < target.len() {
            self.effects.on_progress(target, progress);
            return Some(Outcome::Progressed { progress });
        }

        self.tracker.record_completion();
        let elapsed_ms = self
            .attempt_started_at
            .map(|start| millis_since(start, now))
            .unwrap_or(0);
        let new_best = !self.attempt_random && self.ledger.offer(&target.id, elapsed_ms);
        self.last_time_ms = Some(elapsed_ms);
        self.effects.on_complete(target, elapsed_ms);

        self.hold_started_at = Some(now);
        if self.hold_ms == 0 {
            self.select_next();
        }
        Some(Outcome::Completed {
            elapsed_ms,
            new_best,
        })
    }

    /// Advance time-based transitions. Picks the next target once the success
    /// hold has run out.
    pub fn on_tick(&mut self) {
        if let Some(held_since) = self.hold_started_at {
            if millis_since(held_since, self.clock.instant()) >= self.hold_ms {
                self.select_next();
            }
        }
    }

    pub fn phase(&self) -> Phase {
        match self.active {
            None => Phase::Idle,
            Some(_) if self.hold_started_at.is_some() => Phase::Succeeded,
            Some(_) if self.just_failed => Phase::Failed,
            Some(_) => Phase::InProgress,
        }
    }

    pub fn active(&self) -> Option<&StratagemDefinition> {
        self.active.as_ref()
    }

    pub fn progress(&self) -> &[Direction] {
        &self.progress
    }

    pub fn stats(&self) -> SessionStatistics {
        self.tracker.snapshot()
    }

    /// Live completions per minute
    pub fn throughput_per_minute(&self) -> f64 {
        self.tracker
            .snapshot()
            .throughput_per_minute(self.clock.now())
    }

    pub fn ledger(&self) -> &BestTimeLedger {
        &self.ledger
    }

    /// Best time for the active target; never shown for random targets
    pub fn best_time_for_active(&self) -> Option<u64> {
        if self.attempt_random {
            return None;
        }
        self.active.as_ref().and_then(|t| self.ledger.get(&t.id))
    }

    /// Time spent on the current attempt so far, frozen during the success hold
    pub fn attempt_elapsed_ms(&self) -> Option<u64> {
        let start = self.attempt_started_at?;
        let end = self.hold_started_at.unwrap_or_else(|| self.clock.instant());
        Some(millis_since(start, end))
    }

    pub fn last_time_ms(&self) -> Option<u64> {
        self.last_time_ms
    }

    pub fn is_session_active(&self) -> bool {
        self.session_active
    }

    pub fn random_mode(&self) -> bool {
        self.random_mode
    }

    pub fn pool(&self) -> &[StratagemDefinition] {
        &self.pool
    }

    pub fn hold_ms(&self) -> u64 {
        self.hold_ms
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn effects(&self) -> &E {
        &self.effects
    }
}
