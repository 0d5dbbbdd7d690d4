use std::collections::HashMap;

/// Fastest completion per catalog id, for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct BestTimeLedger {
    records: HashMap<String, u64>,
}

impl BestTimeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `duration_ms` if it is the first or a strictly faster time.
    /// Returns true when a new record was stored.
    pub fn offer(&mut self, id: &str, duration_ms: u64) -> bool {
        match self.records.get_mut(id) {
            Some(best) if duration_ms < *best => {
                *best = duration_ms;
                true
            }
            Some(_) => false,
            None => {
                self.records.insert(id.to_string(), duration_ms);
                true
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<u64> {
        self.records.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.records.iter().map(|(id, ms)| (id.as_str(), *ms))
    }
}
