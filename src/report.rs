//! Terminal output: diagnostics, results and repeated rolls.

use crate::parse::{Diagnostic, ParseError, Tree};
use crate::roll::{fmt_number, Mode, Roller};
use std::io::{self, Write};
use thiserror::Error;

/// Traces longer than this are grown on demand instead of preallocated.
const TRACE_PREALLOC_LIMIT: usize = 1 << 16;

/// Tolerance when deciding whether a repeat count is whole.
const REPEAT_EPSILON: f64 = 1e-7;

/// Escape sequences wrapped around highlighted output.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Palette {
    pub error: &'static str,
    pub grey: &'static str,
    pub strike: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub const ANSI: Self = Self {
        error: "\x1b[31m",
        grey: "\x1b[90m",
        strike: "\x1b[9m",
        reset: "\x1b[0m",
    };

    pub const PLAIN: Self = Self {
        error: "",
        grey: "",
        strike: "",
        reset: "",
    };
}

/// `Error` for a single diagnostic, `Errors` for several.
pub fn error_prefix(count: usize) -> &'static str {
    if count == 1 {
        "Error"
    } else {
        "Errors"
    }
}

/// Prints `diagnostics` against the expression `text` they were found in.
///
/// A single diagnostic goes on the prefix line; several are listed one per
/// line below it. Each names its fault and, when it has a span, repeats the
/// expression with that span highlighted.
pub fn write_diagnostics<W: Write>(
    out: &mut W,
    palette: &Palette,
    prefix: &str,
    text: &str,
    diagnostics: &[Diagnostic],
) -> io::Result<()> {
    match diagnostics {
        [] => writeln!(out, "{}.", prefix),
        [diagnostic] => {
            write!(out, "{}: {}", prefix, diagnostic.kind)?;
            write_highlight(out, palette, text, diagnostic)
        }
        _ => {
            writeln!(out, "{}:", prefix)?;
            for diagnostic in diagnostics {
                write!(out, "\t{}", diagnostic.kind.capitalized())?;
                write_highlight(out, palette, text, diagnostic)?;
            }
            Ok(())
        }
    }
}

fn write_highlight<W: Write>(
    out: &mut W,
    palette: &Palette,
    text: &str,
    diagnostic: &Diagnostic,
) -> io::Result<()> {
    let span = &diagnostic.span;
    if !diagnostic.has_span() || span.start >= text.len() {
        return writeln!(out, ".");
    }
    let end = span.end.min(text.len());
    match (text.get(..span.start), text.get(span.start..end), text.get(end..)) {
        (Some(before), Some(bad), Some(after)) => writeln!(
            out,
            "\t{}{}{}{}{}",
            before, palette.error, bad, palette.reset, after
        ),
        _ => writeln!(out, "\t{}", text),
    }
}

/// Prints one result line, `<trace> = <value>` or just the value.
///
/// A greyed line is the discarded roll of an advantage or disadvantage pair.
pub fn write_result<W: Write>(
    out: &mut W,
    palette: &Palette,
    trace: Option<&str>,
    value: f64,
    greyed: bool,
) -> io::Result<()> {
    if greyed {
        write!(out, "{}{}", palette.strike, palette.grey)?;
    }
    if let Some(trace) = trace {
        write!(out, "{} = ", trace)?;
    }
    out.write_all(fmt_number(value).as_bytes())?;
    if greyed {
        out.write_all(palette.reset.as_bytes())?;
    }
    writeln!(out)
}

/// Which of two rolls counts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Pick {
    /// Roll once.
    #[default]
    Single,
    /// Roll twice, keep the higher.
    Advantage,
    /// Roll twice, keep the lower.
    Disadvantage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub mode: Mode,
    pub repeats: u64,
    pub pick: Pick,
    /// Print results without their traces.
    pub quiet: bool,
    /// Leave out the discarded roll of a pair.
    pub hide_greyed: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            repeats: 1,
            pick: Pick::default(),
            quiet: false,
            hide_greyed: false,
        }
    }
}

/// Rolls a parsed expression as often as the options ask and prints every result.
#[derive(Debug, Clone)]
pub struct Session {
    options: Options,
    palette: Palette,
}

impl Session {
    pub fn new(options: Options, palette: Palette) -> Self {
        Self { options, palette }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn run<R: Roller, W: Write>(
        &self,
        tree: &Tree,
        roller: &mut R,
        out: &mut W,
    ) -> io::Result<()> {
        let Options {
            mode,
            repeats,
            pick,
            quiet,
            hide_greyed,
        } = self.options;
        // a lone number would only be traced as itself
        let quiet = quiet || tree.is_trivial();
        tracing::debug!(repeats, ?pick, ?mode, quiet, "rolling");

        let capacity = if quiet {
            0
        } else {
            tree.max_trace_length().min(TRACE_PREALLOC_LIMIT)
        };
        let mut first = String::with_capacity(capacity);
        let mut second = match pick {
            Pick::Single => String::new(),
            Pick::Advantage | Pick::Disadvantage => String::with_capacity(capacity),
        };

        for _ in 0..repeats {
            let r1 = tree.evaluate(roller, (!quiet).then_some(&mut first), mode);
            if pick == Pick::Single {
                write_result(out, &self.palette, trace(quiet, &first), r1, false)?;
                continue;
            }

            let r2 = tree.evaluate(roller, (!quiet).then_some(&mut second), mode);
            let second_wins = match pick {
                Pick::Advantage => r1 < r2,
                _ => r1 > r2,
            };
            let (kept, dropped) = if second_wins {
                ((&second, r2), (&first, r1))
            } else {
                ((&first, r1), (&second, r2))
            };
            write_result(out, &self.palette, trace(quiet, kept.0), kept.1, false)?;
            if !hide_greyed {
                write_result(out, &self.palette, trace(quiet, dropped.0), dropped.1, true)?;
            }
        }
        Ok(())
    }
}

fn trace(quiet: bool, s: &str) -> Option<&str> {
    (!quiet).then_some(s)
}

/// Why a repeat count was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepeatError {
    #[error("As requested: we're repeating 0 times.")]
    Zero,
    #[error("Error: cannot repeat negative amount of times...")]
    Negative,
    #[error("Error: can't repeat non-integer amount of times...")]
    NonInteger,
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Evaluates a repeat-count expression once. No expression means once.
pub fn repeats<R: Roller>(text: Option<&str>, roller: &mut R) -> Result<u64, RepeatError> {
    let Some(text) = text else {
        return Ok(1);
    };
    let tree = crate::parse(text)?;
    let count = tree.evaluate(roller, None, Mode::Collapse);
    tracing::debug!(count, "evaluated repeat count");

    if count.abs() <= REPEAT_EPSILON {
        Err(RepeatError::Zero)
    } else if count < 0.0 {
        Err(RepeatError::Negative)
    } else if !((count % 1.0).abs() <= REPEAT_EPSILON) {
        Err(RepeatError::NonInteger)
    } else {
        // saturates for absurd counts
        Ok(count as u64)
    }
}
