//! Example text shown in empty clause fields.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used when the configuration does not provide one.
pub const DEFAULT_SEED: u64 = 0x7265_636f_6465;

/// An example recode clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example {
    pub op: &'static str,
    pub condition: &'static str,
    pub value: &'static str,
}

pub const EXAMPLES: [Example; 6] = [
    Example { op: ">", condition: "2000", value: "'good'" },
    Example { op: "<=", condition: "1000", value: "A" },
    Example { op: "==", condition: "5", value: "B" },
    Example { op: "<", condition: "17000", value: "'Male'" },
    Example { op: ">=", condition: "1", value: "'Early'" },
    Example { op: "=", condition: "'tom'", value: "'medium'" },
];

/// Deterministic picker for placeholder text.
///
/// Operator, operand and value are picked independently, so a condition
/// placeholder may pair `<` with `'tom'`.
#[derive(Debug, Clone)]
pub struct PlaceholderExamples {
    rng: StdRng,
}

impl Default for PlaceholderExamples {
    fn default() -> Self {
        Self::seeded(DEFAULT_SEED)
    }
}

impl PlaceholderExamples {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self) -> &'static Example {
        &EXAMPLES[self.rng.random_range(0..EXAMPLES.len())]
    }

    /// Placeholder for a condition field, e.g. `> e.g. 2000`.
    pub fn condition(&mut self) -> String {
        let op = self.pick().op;
        let operand = self.pick().condition;
        format!("{op} e.g. {operand}")
    }

    /// Placeholder for a value or default field, e.g. `e.g. 'good'`.
    pub fn value(&mut self) -> String {
        format!("e.g. {}", self.pick().value)
    }
}
