//! A dice calculator for tabletop role-playing games.
//!
//! Expressions mix arithmetic with dice notation, e.g. `2d6 + 3 * (d4 - 1)`.
//! [`parse`] turns one into a [`Tree`], which can be rolled any number of
//! times; each roll can render a trace of the computation.

mod common;
// `roll` defines the trait the node enum in `parse::ast` dispatches on.
pub mod roll;
pub mod parse;
pub mod report;

pub use common::{BinaryOperator, NonEmpty, Span};
pub use parse::{
    parse, release, Diagnostic, DiagnosticKind, Diagnostics, Node, NodeId, ParseError, Tree,
    MAX_NESTING,
};
pub use roll::{fmt_number, Mode, Roll, Roller};

/// The random source used by the command line.
pub type DefaultRng = rand::rngs::StdRng;
