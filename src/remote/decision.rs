//! Success/failure decision for each simulated call.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use rand::Rng;

/// Decides whether the next call should ask the dependency to fail.
pub trait DecisionSource: Send + Sync {
    fn simulate_error(&self) -> bool;
}

/// Coin flip per call.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDecision;

impl DecisionSource for RandomDecision {
    fn simulate_error(&self) -> bool {
        rand::thread_rng().gen_bool(0.5)
    }
}

/// Same answer every call.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub bool);

impl DecisionSource for FixedDecision {
    fn simulate_error(&self) -> bool {
        self.0
    }
}

/// Plays back a script, then repeats `then` once it runs out.
#[derive(Debug)]
pub struct ScriptedDecision {
    script: Mutex<VecDeque<bool>>,
    then: bool,
}

impl ScriptedDecision {
    pub fn new(script: impl IntoIterator<Item = bool>, then: bool) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            then,
        }
    }
}

impl DecisionSource for ScriptedDecision {
    fn simulate_error(&self) -> bool {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.then)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_then_default() {
        let source = ScriptedDecision::new([true, true, false], true);
        let seen: Vec<_> = (0..5).map(|_| source.simulate_error()).collect();
        assert_eq!(seen, vec![true, true, false, true, true]);
    }

    #[test]
    fn test_random_produces_both_outcomes() {
        let source = RandomDecision;
        let errors = (0..1000).filter(|_| source.simulate_error()).count();
        assert!(errors > 0 && errors < 1000);
    }
}
