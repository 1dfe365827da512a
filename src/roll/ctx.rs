use super::roller::Roller;
use super::tree::{DiceOutcome, Eval, Outcome, Roll};
use crate::parse::{NodeId, Tree};
use std::num::NonZeroU64;

/// State of a single evaluation pass over a tree.
pub struct RollContext<'r, R> {
    roller: &'r mut R,
    keep_draws: bool,
    outcomes: Vec<Outcome>,
}

impl<'r, R: Roller> RollContext<'r, R> {
    pub fn new(roller: &'r mut R) -> Self {
        Self {
            roller,
            keep_draws: true,
            outcomes: Vec::new(),
        }
    }

    /// A context that only sums dice, for callers that want no trace.
    pub fn without_draws(roller: &'r mut R) -> Self {
        Self {
            keep_draws: false,
            ..Self::new(roller)
        }
    }

    /// Value of an already evaluated node.
    pub fn value(&self, id: NodeId) -> f64 {
        self.outcomes[id.index()].value()
    }

    /// Rolls `reps` dice of `sides` faces. Both are expected to be truncated
    /// already; anything below one rolls nothing and totals zero.
    pub fn roll_dice(&mut self, reps: f64, sides: f64) -> DiceOutcome {
        if !(reps >= 1.0 && sides >= 1.0) {
            return DiceOutcome::default();
        }
        // Float to int casts saturate.
        let num = reps as u64;
        let Some(sides) = NonZeroU64::new(sides as u64) else {
            return DiceOutcome::default();
        };

        let mut outcome = DiceOutcome::default();
        for face in self.roller.faces(num, sides) {
            outcome.total += face as f64;
            if self.keep_draws {
                outcome.draws.push(face);
            }
        }
        outcome
    }

    /// Evaluates every node of `tree` front to back.
    pub fn eval(mut self, tree: &Tree) -> Roll<'_> {
        self.outcomes.reserve_exact(tree.len());
        for node in tree.nodes() {
            let outcome = node.eval(&mut self);
            self.outcomes.push(outcome);
        }
        Roll::new(tree, self.outcomes, self.keep_draws)
    }
}
