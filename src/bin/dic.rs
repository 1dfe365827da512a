use std::io::{self, IsTerminal as _, Write};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use dic::report::{self, Options, Palette, Pick, RepeatError, Session};
use dic::{DefaultRng, Mode, ParseError};
use rand::{rngs::OsRng, SeedableRng};
use tracing_subscriber::filter::LevelFilter;

const EXPRESSION_ERROR: u8 = 1;
const INVALID_ARGS: u8 = 3;
const OTHER_ERROR: u8 = 4;
const OUT_OF_MEMORY: u8 = 255;

const MISSING_ARGS: &str = "Missing arguments. See -h or --help for help.";
const MISSING_EXPRESSION: &str = "Error: missing dice-expression. See -h or --help for help.";
const MULTIPLE_EXPRESSIONS: &str =
    "Error: multiple dice-expressions found. See -h or --help for help.";

const OOM_MESSAGE: &str = "Error: out-of-memory...\n\
    \tThe expression is too large to hold in memory.\n";

/// dic - a dice calculator for TTRPGs.
#[derive(Parser, Debug)]
#[command(
    name = "dic",
    version,
    after_help = "Examples:\n  \
        dic 2d4            Roll a 4-sided die 2 times.\n  \
        dic d20+3          Roll a 20-sided die 1 time and add 3.\n  \
        dic d20+3 -r 4     Calculate d20+3, 4 times, and print the results separately.\n  \
        dic -r d4 d20-d6   Calculate d20-d6, 1d4 times.\n\n\
        Allowed operators: +-/*%()[]{}"
)]
struct Cli {
    /// The dice expression. Separate words are joined together; put it after
    /// `--` if it starts with a minus sign.
    #[arg(allow_negative_numbers = true, value_name = "DICE-EXPRESSION")]
    expression: Vec<String>,

    /// Repeat the calculation; the count may itself be a dice expression.
    #[arg(short, long, value_name = "N", allow_hyphen_values = true)]
    repeat: Option<String>,

    /// Roll twice and take the higher (show the lower greyed-out).
    #[arg(short = 'A', long, conflicts_with = "disadvantage")]
    advantage: bool,

    /// Roll twice and take the lower (show the higher greyed-out).
    #[arg(short = 'D', long)]
    disadvantage: bool,

    /// Show only the total of dice that are not directly added or subtracted (default).
    #[arg(short, long, overrides_with = "expand")]
    collapse: bool,

    /// Always show every die rolled.
    #[arg(short = 'x', long, overrides_with = "collapse")]
    expand: bool,

    /// Don't show the calculation, just the result.
    #[arg(short, long)]
    quiet: bool,

    /// Hide the greyed-out output of --advantage or --disadvantage.
    #[arg(short = 'H', long)]
    hide_grey: bool,

    /// Don't print the calculation or the greyed-out output (same as -q -H).
    #[arg(short = 'Q', long)]
    really_quiet: bool,

    /// Log more about what happens; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// When to highlight output with colors.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl Cli {
    fn options(&self, repeats: u64) -> Options {
        let pick = if self.advantage {
            Pick::Advantage
        } else if self.disadvantage {
            Pick::Disadvantage
        } else {
            Pick::Single
        };
        Options {
            mode: if self.expand { Mode::Expand } else { Mode::Collapse },
            repeats,
            pick,
            quiet: self.quiet || self.really_quiet,
            hide_greyed: self.hide_grey || self.really_quiet,
        }
    }

    fn palette(&self, terminal: bool) -> Palette {
        match self.color {
            ColorChoice::Always => Palette::ANSI,
            ColorChoice::Never => Palette::PLAIN,
            ColorChoice::Auto if terminal => Palette::ANSI,
            ColorChoice::Auto => Palette::PLAIN,
        }
    }

    /// The expression words joined, as long as no other argument sits between them.
    fn expression(&self, matches: &ArgMatches) -> Result<String, &'static str> {
        let Some(words) = matches.indices_of("expression") else {
            return Err(MISSING_EXPRESSION);
        };
        let (Some(first), Some(last)) = (words.clone().min(), words.max()) else {
            return Err(MISSING_EXPRESSION);
        };
        let split = Cli::command()
            .get_arguments()
            .map(|arg| arg.get_id().as_str())
            .filter(|&id| id != "expression")
            .filter(|&id| matches.value_source(id) == Some(ValueSource::CommandLine))
            .filter_map(|id| matches.indices_of(id))
            .flatten()
            .any(|index| first < index && index < last);
        if split {
            return Err(MULTIPLE_EXPRESSIONS);
        }
        Ok(self.expression.concat())
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        eprintln!("{}", MISSING_ARGS);
        return ExitCode::from(INVALID_ARGS);
    }
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(io::stderr)
        .init();
    tracing::debug!(?cli, "parsed arguments");

    let expression = cli.expression(&matches);
    match run(&cli, expression) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(OTHER_ERROR)
        }
    }
}

fn run(cli: &Cli, expression: Result<String, &'static str>) -> anyhow::Result<ExitCode> {
    let mut rng = DefaultRng::from_rng(OsRng).context("failed to seed the random generator")?;
    tracing::info!("seeded random generator from the operating system");

    let stderr = io::stderr();
    let err_palette = cli.palette(stderr.is_terminal());
    let mut err = stderr.lock();

    let repeats = match report::repeats(cli.repeat.as_deref(), &mut rng) {
        Ok(repeats) => repeats,
        Err(RepeatError::Parse(ParseError::Invalid(diagnostics))) => {
            let text = cli.repeat.as_deref().unwrap_or_default();
            report::write_diagnostics(
                &mut err,
                &err_palette,
                "Invalid repetitions",
                text,
                &diagnostics,
            )
            .context("failed to write to stderr")?;
            return Ok(ExitCode::from(INVALID_ARGS));
        }
        Err(RepeatError::Parse(ParseError::OutOfMemory(_))) => {
            return out_of_memory(&mut err);
        }
        Err(why) => {
            writeln!(err, "{}", why).context("failed to write to stderr")?;
            return Ok(ExitCode::from(INVALID_ARGS));
        }
    };

    let expression = match expression {
        Ok(expression) => expression,
        Err(message) => {
            writeln!(err, "{}", message).context("failed to write to stderr")?;
            return Ok(ExitCode::from(INVALID_ARGS));
        }
    };
    let tree = match dic::parse(&expression) {
        Ok(tree) => tree,
        Err(ParseError::Invalid(diagnostics)) => {
            let prefix = report::error_prefix(diagnostics.len());
            report::write_diagnostics(&mut err, &err_palette, prefix, &expression, &diagnostics)
                .context("failed to write to stderr")?;
            return Ok(ExitCode::from(EXPRESSION_ERROR));
        }
        Err(ParseError::OutOfMemory(_)) => return out_of_memory(&mut err),
    };
    let mut tree = Some(tree);

    let stdout = io::stdout();
    let session = Session::new(cli.options(repeats), cli.palette(stdout.is_terminal()));
    let mut out = io::BufWriter::new(stdout.lock());
    if let Some(tree) = &tree {
        session
            .run(tree, &mut rng, &mut out)
            .and_then(|()| out.flush())
            .context("failed to write to stdout")?;
    }
    dic::release(&mut tree);

    Ok(ExitCode::SUCCESS)
}

fn out_of_memory<W: Write>(err: &mut W) -> anyhow::Result<ExitCode> {
    err.write_all(OOM_MESSAGE.as_bytes())
        .context("failed to write to stderr")?;
    Ok(ExitCode::from(OUT_OF_MEMORY))
}
