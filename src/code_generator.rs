use crate::{
    catalog::{Category, StratagemDefinition},
    direction::Direction,
};
use rand::{rngs::ThreadRng, Rng};
use std::ops::RangeInclusive;

pub const RANDOM_CODE_LENGTH: RangeInclusive<usize> = 6..=10;
pub const RANDOM_NAME: &str = "Encrypted Upload Sequence";
pub const RANDOM_ID_PREFIX: &str = "random_";

/// Synthesizes targets for random mode
#[derive(Debug)]
pub struct CodeGenerator<R: Rng = ThreadRng> {
    rng: R,
    issued: u64,
}

impl CodeGenerator<ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for CodeGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> CodeGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng, issued: 0 }
    }

    pub fn generate(&mut self) -> StratagemDefinition {
        let length = self.rng.gen_range(RANDOM_CODE_LENGTH);
        let code = (0..length)
            .map(|_| Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())])
            .collect();

        self.issued += 1;
        StratagemDefinition {
            id: format!("{}{}", RANDOM_ID_PREFIX, self.issued),
            name: RANDOM_NAME.to_string(),
            category: Category::Synthetic,
            code,
        }
    }

    /// Uniform pick from `pool`, None when it is empty
    pub fn pick<'a>(&mut self, pool: &'a [StratagemDefinition]) -> Option<&'a StratagemDefinition> {
        if pool.is_empty() {
            return None;
        }
        pool.get(self.rng.gen_range(0..pool.len()))
    }
}
