use crate::common::{NonEmpty, Span};
use std::collections::TryReserveError;
use thiserror::Error;

/// Every diagnostic found in one pass over an expression, in source order.
pub type Diagnostics = NonEmpty<Diagnostic>;

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DiagnosticKind {
    #[error("invalid operator")]
    InvalidOperator,
    #[error("invalid number")]
    InvalidNum,
    #[error("missing number")]
    MissingNum,
    #[error("invalid number of rolls")]
    InvalidReps,
    #[error("can't roll 0 times...")]
    ZeroReps,
    #[error("invalid number of sides")]
    InvalidSides,
    #[error("missing number of sides")]
    NonExistantSides,
    #[error("can't roll 0-sided die")]
    ZeroSides,
    #[error("unclosed parenthesis")]
    UnclosedParenthesis,
    #[error("invalid parenthesis")]
    InvalidParenthesis,
    #[error("I can't roll nuthin'")]
    EmptyExpression,
    #[error("expression nested too deeply")]
    NestingTooDeep,
}

impl DiagnosticKind {
    /// The sentence with its first letter upper-cased, as used in multi-error listings.
    pub fn capitalized(&self) -> String {
        let sentence = self.to_string();
        let mut chars = sentence.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => sentence,
        }
    }
}

/// A parse fault attributed to the substring `span` of the expression.
///
/// An empty span means there is nothing in the text to point at.
#[derive(Error, Debug, Clone, Eq, PartialEq, Hash)]
#[error("{kind} (at {}..{})", .span.start, .span.end)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn has_span(&self) -> bool {
        !self.span.is_empty()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{} in dice expression, first: {}", count(.0.len()), .0.first())]
    Invalid(Diagnostics),
    #[error("out of memory while building the expression tree: {0}")]
    OutOfMemory(TryReserveError),
}

impl ParseError {
    pub fn diagnostics(&self) -> Option<&[Diagnostic]> {
        match self {
            Self::Invalid(diagnostics) => Some(diagnostics.as_slice()),
            Self::OutOfMemory(_) => None,
        }
    }
}

fn count(n: usize) -> String {
    if n == 1 {
        "1 error".to_owned()
    } else {
        format!("{} errors", n)
    }
}
