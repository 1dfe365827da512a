pub mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{release, Node, NodeId, Tree};
pub use error::{Diagnostic, DiagnosticKind, Diagnostics, ParseError};
pub use parser::MAX_NESTING;

/// Parses a dice expression, collecting every diagnostic it can find.
#[tracing::instrument(level = "debug")]
pub fn parse(s: &str) -> Result<Tree, ParseError> {
    parser::Parser::new(s).parse()
}
