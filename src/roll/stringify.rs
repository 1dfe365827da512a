use super::num::fmt_number;
use super::tree::{Outcome, Roll};
use super::Mode;
use crate::common::{BinaryOperator, Precedence};
use crate::parse::{Node, NodeId};
use std::fmt::{self, Write};

/// Where a node sits relative to its parent.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Slot {
    Root,
    Left(BinaryOperator),
    Right(BinaryOperator),
    Negated,
}

impl Slot {
    fn needs_parens(self, level: Precedence) -> bool {
        match self {
            Self::Root => false,
            Self::Left(op) => level < op.precedence(),
            Self::Right(op) => {
                let prec = op.precedence();
                level < prec || (level == prec && op != BinaryOperator::Add)
            }
            Self::Negated => level < Precedence::Atom,
        }
    }

    fn under_sum(self) -> bool {
        match self {
            Self::Root => true,
            Self::Left(op) | Self::Right(op) => op.is_additive(),
            Self::Negated => false,
        }
    }
}

enum Task {
    Node(NodeId, Slot),
    Text(&'static str),
}

impl Roll<'_> {
    /// Renders the computation, e.g. `3 + 5 + 2 * 7`.
    ///
    /// Dice at the top level or directly under `+`/`-` always list their
    /// faces; other dice do so only in [`Mode::Expand`].
    pub fn write_trace<W: Write>(&self, mode: Mode, out: &mut W) -> fmt::Result {
        let mut stack = vec![Task::Node(self.tree.root(), Slot::Root)];
        while let Some(task) = stack.pop() {
            let (id, slot) = match task {
                Task::Text(s) => {
                    out.write_str(s)?;
                    continue;
                }
                Task::Node(id, slot) => (id, slot),
            };

            let expanded = self.has_draws && (mode == Mode::Expand || slot.under_sum());
            let (node, outcome) = self.get(id);
            if slot.needs_parens(level(node, outcome, expanded)) {
                out.write_char('(')?;
                stack.push(Task::Text(")"));
            }

            match node {
                Node::Number(n) => out.write_str(&fmt_number(n.value))?,
                Node::Neg(n) => {
                    out.write_char('-')?;
                    stack.push(Task::Node(n.operand, Slot::Negated));
                }
                Node::Binary(b) => {
                    stack.push(Task::Node(b.right, Slot::Right(b.op)));
                    stack.push(Task::Text(b.op.padded()));
                    stack.push(Task::Node(b.left, Slot::Left(b.op)));
                }
                Node::Dice(_) => write_dice(outcome, expanded, out)?,
            }
        }
        Ok(())
    }

    pub fn trace(&self, mode: Mode) -> String {
        let mut out = String::new();
        // writing to a String never fails
        let _ = self.write_trace(mode, &mut out);
        out
    }
}

fn level(node: &Node, outcome: &Outcome, expanded: bool) -> Precedence {
    match node {
        Node::Number(n) if n.value < 0.0 => Precedence::Prefix,
        Node::Number(_) => Precedence::Atom,
        Node::Neg(_) => Precedence::Prefix,
        Node::Binary(b) => b.op.precedence(),
        Node::Dice(_) => match outcome {
            Outcome::Dice(dice) if expanded && dice.draws.len() > 1 => Precedence::Sum,
            _ => Precedence::Atom,
        },
    }
}

fn write_dice<W: Write>(outcome: &Outcome, expanded: bool, out: &mut W) -> fmt::Result {
    let dice = match outcome {
        Outcome::Dice(dice) => dice,
        other => return out.write_str(&fmt_number(other.value())),
    };
    let Some((first, rest)) = dice.draws.split_first().filter(|_| expanded) else {
        return out.write_str(&fmt_number(dice.total));
    };
    write!(out, "{}", first)?;
    for face in rest {
        write!(out, " + {}", face)?;
    }
    Ok(())
}
