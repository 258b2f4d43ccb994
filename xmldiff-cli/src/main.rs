//! xmldiff - line diff of two XML documents after normalization.
//!
//! Both files are parsed with insignificant whitespace removed and
//! pretty-printed before a unified (or context) diff is taken.

use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use xml_linediff::{diff, DiffOptions, DiffStyle, Input};

/// Diff two XML files after normalizing their formatting
#[derive(Parser, Debug)]
#[command(name = "xmldiff")]
#[command(version)]
#[command(about = "Diff two XML files after normalizing their formatting", long_about = None)]
struct Cli {
    /// Old file
    old_file: PathBuf,
    /// New file
    new_file: PathBuf,

    /// Number of lines of context
    #[arg(
        short = 'c',
        long,
        value_name = "N",
        allow_negative_numbers = true,
        value_parser = parse_context
    )]
    context: Option<NonZeroUsize>,

    /// Produce a context diff instead of a unified diff
    #[arg(long)]
    context_format: bool,

    /// Timestamp shown for the old file in the header
    #[arg(long, value_name = "DATE")]
    from_date: Option<String>,

    /// Timestamp shown for the new file in the header
    #[arg(long, value_name = "DATE")]
    to_date: Option<String>,

    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn diff_options(&self) -> DiffOptions {
        // Lines are joined below, so none carry their own terminator
        let mut options = DiffOptions::default().with_line_terminator("");
        if let Some(context) = self.context {
            options.context = context;
        }
        options.from_date = self.from_date.clone();
        options.to_date = self.to_date.clone();
        options
    }

    fn style(&self) -> DiffStyle {
        if self.context_format {
            DiffStyle::Context
        } else {
            DiffStyle::Unified
        }
    }
}

fn parse_context(value: &str) -> Result<NonZeroUsize, String> {
    value
        .parse::<NonZeroUsize>()
        .map_err(|_| "context should be a positive integer".to_string())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs the diff and writes it to stdout.
fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    debug!(old = %cli.old_file.display(), new = %cli.new_file.display(), "diffing");

    let lines: Vec<String> = diff(
        Input::path(&cli.old_file),
        Input::path(&cli.new_file),
        cli.style(),
        &cli.diff_options(),
    )?
    .collect();

    if lines.is_empty() {
        debug!("documents are equivalent");
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", lines.join("\n"))?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn context_must_be_positive() {
        for bad in ["0", "-1", "three", "1.5"] {
            let result = Cli::try_parse_from(["xmldiff", "-c", bad, "a.xml", "b.xml"]);
            assert!(result.is_err(), "accepted context {bad}");
        }
    }

    #[test]
    fn two_files_required() {
        assert!(Cli::try_parse_from(["xmldiff", "a.xml"]).is_err());
    }

    #[test]
    fn options_from_flags() {
        let cli = Cli::try_parse_from([
            "xmldiff",
            "--context=5",
            "--from-date",
            "yesterday",
            "--context-format",
            "a.xml",
            "b.xml",
        ])
        .unwrap();

        let options = cli.diff_options();
        assert_eq!(options.context.get(), 5);
        assert_eq!(options.from_date.as_deref(), Some("yesterday"));
        assert_eq!(options.to_date, None);
        assert_eq!(options.line_terminator, "");
        assert_eq!(cli.style(), DiffStyle::Context);
    }

    #[test]
    fn default_context_left_to_differ() {
        let cli = Cli::try_parse_from(["xmldiff", "a.xml", "b.xml"]).unwrap();
        assert_eq!(cli.diff_options().context, DiffOptions::default().context);
        assert_eq!(cli.style(), DiffStyle::Unified);
    }
}
