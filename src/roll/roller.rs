use rand::{
    distributions::{DistIter, Distribution, Uniform},
    Rng,
};
use std::num::NonZeroU64;

/// Source of die faces. Every face in `1..=sides` must be equally likely.
pub trait Roller {
    type Faces<'a>: Iterator<Item = u64> + 'a
    where
        Self: 'a;

    /// The faces of `dice` dice with `sides` sides each, in the order rolled.
    fn faces(&mut self, dice: u64, sides: NonZeroU64) -> Self::Faces<'_>;
}

impl<R: Rng> Roller for R {
    type Faces<'a> = std::iter::Take<DistIter<Uniform<u64>, &'a mut Self, u64>>
    where
        Self: 'a;

    fn faces(&mut self, dice: u64, sides: NonZeroU64) -> Self::Faces<'_> {
        let count = usize::try_from(dice).unwrap_or(usize::MAX);
        Uniform::new_inclusive(1, sides.get())
            .sample_iter(self)
            .take(count)
    }
}

/// Deterministic faces for tests: a counter that advances by `step` per die
/// and wraps around the number of sides.
#[cfg(test)]
pub(crate) struct StepRoller {
    next: u64,
    step: u64,
}

#[cfg(test)]
impl StepRoller {
    pub fn new(first: u64, step: u64) -> Self {
        assert!(first > 0);
        Self { next: first, step }
    }
}

#[cfg(test)]
impl Roller for StepRoller {
    type Faces<'a> = std::vec::IntoIter<u64>;

    fn faces(&mut self, dice: u64, sides: NonZeroU64) -> Self::Faces<'_> {
        let mut faces = Vec::new();
        for _ in 0..dice {
            faces.push((self.next - 1) % sides.get() + 1);
            self.next += self.step;
        }
        faces.into_iter()
    }
}
