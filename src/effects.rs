use crate::catalog::StratagemDefinition;
use std::io::Write;

/// Side effects fired for each classified input (sound, flashes, ...).
/// The drill calls these after its own state is updated.
pub trait Effects {
    fn on_progress(&mut self, _target: &StratagemDefinition, _progress: usize) {}
    fn on_complete(&mut self, _target: &StratagemDefinition, _elapsed_ms: u64) {}
    fn on_mismatch(&mut self, _target: &StratagemDefinition, _position: usize) {}
}

/// Logs each outcome at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEffects;

impl Effects for LogEffects {
    fn on_progress(&mut self, target: &StratagemDefinition, progress: usize) {
        tracing::debug!(id = %target.id, progress, len = target.len(), "input accepted");
    }

    fn on_complete(&mut self, target: &StratagemDefinition, elapsed_ms: u64) {
        tracing::debug!(id = %target.id, elapsed_ms, "stratagem completed");
    }

    fn on_mismatch(&mut self, target: &StratagemDefinition, position: usize) {
        tracing::debug!(id = %target.id, position, "input mismatch");
    }
}

/// Rings the terminal bell on a mismatch
#[derive(Debug, Default, Clone, Copy)]
pub struct BellEffects;

impl Effects for BellEffects {
    fn on_progress(&mut self, target: &StratagemDefinition, progress: usize) {
        LogEffects.on_progress(target, progress);
    }

    fn on_mismatch(&mut self, target: &StratagemDefinition, position: usize) {
        LogEffects.on_mismatch(target, position);
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }

    fn on_complete(&mut self, target: &StratagemDefinition, elapsed_ms: u64) {
        LogEffects.on_complete(target, elapsed_ms);
    }
}

/// Records every call, for tests
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingEffects {
    pub events: Vec<EffectEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectEvent {
    Progress { id: String, progress: usize },
    Complete { id: String, elapsed_ms: u64 },
    Mismatch { id: String, position: usize },
}

impl Effects for RecordingEffects {
    fn on_progress(&mut self, target: &StratagemDefinition, progress: usize) {
        self.events.push(EffectEvent::Progress {
            id: target.id.clone(),
            progress,
        });
    }

    fn on_complete(&mut self, target: &StratagemDefinition, elapsed_ms: u64) {
        self.events.push(EffectEvent::Complete {
            id: target.id.clone(),
            elapsed_ms,
        });
    }

    fn on_mismatch(&mut self, target: &StratagemDefinition, position: usize) {
        self.events.push(EffectEvent::Mismatch {
            id: target.id.clone(),
            position,
        });
    }
}
