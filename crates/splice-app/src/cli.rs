//! Command-line surface

use clap::{Parser, Subcommand, ValueEnum};
use splice_adapters::INLINE_COMPLETION_KEY;
use splice_core::index::Language;
use splice_core::{LineRange, Position, TextRange};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "splice",
    about = "AI code insertion for files on disk",
    long_about = "Generates code at a cursor or rewrites a selection, trimming any\n\
                  lines the model repeats from the surrounding file.",
    version
)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace). SPLICE_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate code for the cursor line and write it into the file
    Complete {
        file: PathBuf,

        /// Cursor as LINE:COLUMN (1-based)
        #[arg(long, value_parser = parse_position)]
        at: Position,

        /// Workspace searched for related files (defaults to the current directory)
        #[arg(long, default_value = ".")]
        root: PathBuf,

        #[arg(long, value_enum)]
        language: Option<LanguageArg>,
    },

    /// Propose an optimized version of a selection and show it as a diff
    Optimize {
        file: PathBuf,

        /// Selection as LINE:COL-LINE:COL (1-based, end exclusive)
        #[arg(long, value_parser = parse_selection)]
        select: Option<TextRange>,

        /// Whole-line range START-END (1-based, inclusive) used when no selection is given
        #[arg(long, value_parser = parse_lines)]
        lines: Option<LineRange>,

        /// Symbol whose definition is optimized when neither range is given
        #[arg(long)]
        symbol: Option<String>,

        /// Write the proposed text back to the file
        #[arg(long)]
        apply: bool,

        #[arg(long, value_enum)]
        language: Option<LanguageArg>,
    },

    /// Trim a generated block against a document without calling a model
    Reconcile {
        /// Document the block is merged into
        file: PathBuf,

        /// File holding the generated block (stdin when omitted)
        #[arg(long)]
        generated: Option<PathBuf>,

        /// Replaced lines START-END (1-based, inclusive)
        #[arg(long, value_parser = parse_lines)]
        lines: LineRange,
    },

    /// Show a stored usage counter
    Usage {
        #[arg(long, default_value = INLINE_COMPLETION_KEY)]
        key: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LanguageArg {
    Rust,
    Javascript,
    Typescript,
    Python,
    Go,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Rust => Language::Rust,
            LanguageArg::Javascript => Language::JavaScript,
            LanguageArg::Typescript => Language::TypeScript,
            LanguageArg::Python => Language::Python,
            LanguageArg::Go => Language::Go,
        }
    }
}

fn one_based(value: &str, what: &str) -> Result<usize, String> {
    let n: usize = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid {what} '{value}'"))?;
    n.checked_sub(1)
        .ok_or_else(|| format!("{what} numbers start at 1"))
}

pub fn parse_position(value: &str) -> Result<Position, String> {
    let (line, column) = value
        .split_once(':')
        .ok_or_else(|| format!("expected LINE:COLUMN, got '{value}'"))?;
    Ok(Position::new(
        one_based(line, "line")?,
        one_based(column, "column")?,
    ))
}

pub fn parse_selection(value: &str) -> Result<TextRange, String> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| format!("expected LINE:COL-LINE:COL, got '{value}'"))?;
    Ok(TextRange::new(parse_position(start)?, parse_position(end)?))
}

pub fn parse_lines(value: &str) -> Result<LineRange, String> {
    let (start, end) = value.split_once('-').unwrap_or((value, value));
    let start = one_based(start, "line")?;
    let end = one_based(end, "line")?;
    LineRange::new(start, end).ok_or_else(|| format!("line range '{value}' ends before it starts"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_is_one_based() {
        assert_eq!(parse_position("3:5").unwrap(), Position::new(2, 4));
        assert!(parse_position("0:1").is_err());
        assert!(parse_position("12").is_err());
    }

    #[test]
    fn test_parse_selection() {
        let range = parse_selection("2:5-2:27").unwrap();
        assert_eq!(range.start, Position::new(1, 4));
        assert_eq!(range.end, Position::new(1, 26));
    }

    #[test]
    fn test_parse_lines() {
        assert_eq!(parse_lines("4-6").unwrap(), LineRange { start: 3, end: 5 });
        assert_eq!(parse_lines("7").unwrap(), LineRange::single(6));
        assert!(parse_lines("6-4").is_err());
    }

    #[test]
    fn test_args_parse_subcommands() {
        let args = Args::try_parse_from([
            "splice", "-vv", "optimize", "src/lib.rs", "--lines", "10-20", "--apply",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Optimize { lines, apply, select, .. } => {
                assert_eq!(lines, Some(LineRange { start: 9, end: 19 }));
                assert!(apply);
                assert!(select.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_usage_key_defaults_to_completion_counter() {
        let args = Args::try_parse_from(["splice", "usage"]).unwrap();
        match args.command {
            Command::Usage { key } => assert_eq!(key, INLINE_COMPLETION_KEY),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
