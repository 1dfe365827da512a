use super::{roller::Roller, RollContext};
use crate::parse::ast::{Binary, Dice, Neg, Node, Number, Tree};
use crate::parse::NodeId;

#[enum_dispatch::enum_dispatch]
pub trait Eval {
    /// Computes this node's outcome. Every child has already been evaluated.
    fn eval<R: Roller>(&self, ctx: &mut RollContext<'_, R>) -> Outcome;
}

impl Eval for Number {
    fn eval<R: Roller>(&self, _ctx: &mut RollContext<'_, R>) -> Outcome {
        Outcome::Value(self.value)
    }
}

impl Eval for Neg {
    fn eval<R: Roller>(&self, ctx: &mut RollContext<'_, R>) -> Outcome {
        Outcome::Value(-ctx.value(self.operand))
    }
}

impl Eval for Binary {
    fn eval<R: Roller>(&self, ctx: &mut RollContext<'_, R>) -> Outcome {
        let l = ctx.value(self.left);
        let r = ctx.value(self.right);
        Outcome::Value(self.op.apply(l, r))
    }
}

impl Eval for Dice {
    fn eval<R: Roller>(&self, ctx: &mut RollContext<'_, R>) -> Outcome {
        let reps = ctx.value(self.reps).trunc();
        let sides = ctx.value(self.sides).trunc();
        Outcome::Dice(ctx.roll_dice(reps, sides))
    }
}

/// What one node evaluated to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(f64),
    Dice(DiceOutcome),
}

impl Outcome {
    pub fn value(&self) -> f64 {
        match self {
            Self::Value(x) => *x,
            Self::Dice(dice) => dice.total,
        }
    }
}

/// The faces drawn for one dice node. `draws` is left empty when the
/// evaluation was not asked to keep them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiceOutcome {
    pub total: f64,
    pub draws: Vec<u64>,
}

/// One evaluation of a [`Tree`]: an outcome for every node, indexed like the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Roll<'t> {
    pub(crate) tree: &'t Tree,
    pub(crate) outcomes: Vec<Outcome>,
    pub(crate) has_draws: bool,
}

impl<'t> Roll<'t> {
    pub(crate) fn new(tree: &'t Tree, outcomes: Vec<Outcome>, has_draws: bool) -> Self {
        Self {
            tree,
            outcomes,
            has_draws,
        }
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn outcome(&self, id: NodeId) -> &Outcome {
        &self.outcomes[id.index()]
    }

    /// A node together with what it evaluated to.
    pub fn get(&self, id: NodeId) -> (&'t Node, &Outcome) {
        (self.tree.node(id), self.outcome(id))
    }

    /// The result of the whole expression.
    pub fn value(&self) -> f64 {
        self.outcome(self.tree.root()).value()
    }

    /// Whether individual dice faces were kept, so dice can be expanded.
    pub fn has_draws(&self) -> bool {
        self.has_draws
    }
}
