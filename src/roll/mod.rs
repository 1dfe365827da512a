mod bounds;
mod ctx;
mod num;
mod roller;
mod stringify;
mod tree;

pub use ctx::RollContext;
pub use num::{fmt_number, FRACTION_DIGITS};
pub use roller::Roller;
pub use tree::{DiceOutcome, Eval, Outcome, Roll};

#[cfg(test)]
pub(crate) use roller::StepRoller;

use crate::parse::Tree;

/// How dice that are not directly summed show up in a trace.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Mode {
    /// Show only the total of such dice: `2 * 7`.
    #[default]
    Collapse,
    /// List every face: `2 * (3 + 4)`.
    Expand,
}

impl Tree {
    /// Evaluates the tree once, re-rolling every die.
    #[tracing::instrument(level = "trace", skip(self, roller), fields(nodes = self.len()))]
    pub fn roll<R: Roller>(&self, roller: &mut R) -> Roll<'_> {
        let roll = RollContext::new(roller).eval(self);
        tracing::trace!(value = roll.value(), "rolled");
        roll
    }

    /// Evaluates the tree and returns the result.
    ///
    /// When `trace` is given it is overwritten with a rendering of the
    /// computation in `mode`.
    pub fn evaluate<R: Roller>(
        &self,
        roller: &mut R,
        trace: Option<&mut String>,
        mode: Mode,
    ) -> f64 {
        match trace {
            Some(trace) => {
                let roll = self.roll(roller);
                trace.clear();
                // writing to a String never fails
                let _ = roll.write_trace(mode, trace);
                roll.value()
            }
            None => RollContext::without_draws(roller).eval(self).value(),
        }
    }
}
