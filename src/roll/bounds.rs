use super::num::{digits, number_text_bound};
use crate::common::BinaryOperator;
use crate::parse::{Node, Tree};

/// Closed range of values a node can take. Infinite ends are allowed.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Interval {
    lo: f64,
    hi: f64,
}

impl Interval {
    const UNBOUNDED: Self = Self {
        lo: f64::NEG_INFINITY,
        hi: f64::INFINITY,
    };

    fn point(x: f64) -> Self {
        Self::new(x, x)
    }

    /// A NaN end means the arithmetic lost track; assume anything.
    fn new(lo: f64, hi: f64) -> Self {
        if lo.is_nan() || hi.is_nan() {
            Self::UNBOUNDED
        } else {
            Self { lo, hi }
        }
    }

    fn hull(values: [f64; 4]) -> Self {
        if values.iter().any(|x| x.is_nan()) {
            return Self::UNBOUNDED;
        }
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self::new(lo, hi)
    }

    fn max_abs(self) -> f64 {
        self.lo.abs().max(self.hi.abs())
    }

    fn contains_zero(self) -> bool {
        self.lo <= 0.0 && 0.0 <= self.hi
    }

    fn neg(self) -> Self {
        Self::new(-self.hi, -self.lo)
    }

    fn binary(op: BinaryOperator, l: Self, r: Self) -> Self {
        use BinaryOperator::*;

        match op {
            Add => Self::new(l.lo + r.lo, l.hi + r.hi),
            Sub => Self::new(l.lo - r.hi, l.hi - r.lo),
            Mul => Self::hull([l.lo * r.lo, l.lo * r.hi, l.hi * r.lo, l.hi * r.hi]),
            Div if r.contains_zero() => Self::UNBOUNDED,
            Div => Self::hull([l.lo / r.lo, l.lo / r.hi, l.hi / r.lo, l.hi / r.hi]),
            Rem => {
                let m = l.max_abs().min(r.max_abs());
                Self::new(-m, m)
            }
        }
    }
}

/// Per-node facts the estimate is built from.
#[derive(Debug, Copy, Clone)]
struct Bound {
    values: Interval,
    text: usize,
}

impl Tree {
    /// An upper bound on the length of any trace of this tree, in either mode.
    ///
    /// Useful for preallocating trace buffers; every draw is assumed to take
    /// its widest rendering and every node to be parenthesized.
    pub fn max_trace_length(&self) -> usize {
        let mut bounds: Vec<Bound> = Vec::with_capacity(self.len());
        for node in self.nodes() {
            let bound = match node {
                Node::Number(n) => {
                    let values = if n.value.is_nan() {
                        Interval::UNBOUNDED
                    } else {
                        Interval::point(n.value)
                    };
                    Bound {
                        values,
                        text: number_text_bound(values.max_abs()),
                    }
                }
                Node::Neg(n) => {
                    let operand = bounds[n.operand.index()];
                    Bound {
                        values: operand.values.neg(),
                        text: operand.text.saturating_add(1),
                    }
                }
                Node::Binary(b) => {
                    let l = bounds[b.left.index()];
                    let r = bounds[b.right.index()];
                    Bound {
                        values: Interval::binary(b.op, l.values, r.values),
                        text: l.text.saturating_add(3).saturating_add(r.text),
                    }
                }
                Node::Dice(d) => dice_bound(
                    bounds[d.reps.index()].values,
                    bounds[d.sides.index()].values,
                ),
            };
            bounds.push(Bound {
                text: bound.text.saturating_add(2),
                ..bound
            });
        }
        bounds
            .get(self.root().index())
            .map_or(0, |bound| bound.text)
    }
}

fn dice_bound(reps: Interval, sides: Interval) -> Bound {
    let reps = reps.hi.trunc();
    let sides = sides.hi.trunc();
    if !(reps >= 1.0 && sides >= 1.0) {
        return Bound {
            values: Interval::point(0.0),
            text: 1,
        };
    }

    let values = Interval::new(0.0, reps * sides);
    let collapsed = number_text_bound(values.hi);

    // Saturating casts; a count this large could never be drawn anyway.
    let count = (reps as u64).saturating_add(1);
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    let face = digits(sides as u64);
    let expanded = count
        .saturating_mul(face)
        .saturating_add(3usize.saturating_mul(count - 1));

    Bound {
        values,
        text: expanded.max(collapsed),
    }
}
