//! Demo binary exercising [`crossline`]: a completion hook over a static
//! command list, persistent history, and a read-eval-echo loop.

use std::path::PathBuf;

use clap::Parser;
use crossline::{logging, Completions, Editor, ReadOutcome};
use miette::IntoDiagnostic as _;
use tracing::info;

const COMMANDS: &[(&str, &str)] = &[
    ("insert", "Insert a record into a table"),
    ("select", "Select records from a table"),
    ("update", "Update records in a table"),
    ("delete", "Delete records from a table"),
    ("create", "Create an index"),
    ("drop", "Drop a table or index"),
    ("show", "Show tables or databases"),
    ("describe", "Describe a table"),
    ("help", "Show this help text"),
    ("history", "Show command history"),
    ("exit", "Exit the demo"),
];

#[derive(Parser, Debug)]
#[command(author, version, about = "crossline demo: a small interactive command shell", arg_required_else_help = false)]
struct Cli {
    /// File to load and save history from.
    #[arg(long, short = 'H', default_value = "history.txt")]
    history_file: PathBuf,

    /// Enable verbose (debug-level) logging to stderr.
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn completion_hook(buf: &str, completions: &mut Completions) {
    for (word, help) in COMMANDS {
        if word.starts_with(buf) {
            completions.add(word, Some(help));
        }
    }
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::level_filters::LevelFilter::DEBUG } else { tracing::level_filters::LevelFilter::WARN };
    let tracing_config = logging::TracingConfig { writer_config: logging::WriterConfig::Stderr, level_filter: level };
    if let Err(err) = logging::install_global(&tracing_config) {
        eprintln!("warning: failed to install logging: {err}");
    }

    let mut editor = Editor::new();
    editor.completion_register(Box::new(completion_hook));
    if editor.history_load(&cli.history_file).is_err() {
        info!(path = ?cli.history_file, "no existing history file, starting fresh");
    }

    loop {
        match editor.read_line("crossline> ").into_diagnostic()? {
            ReadOutcome::Accepted(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "exit" {
                    break;
                }
                if trimmed == "history" {
                    editor.history_show().into_diagnostic()?;
                    continue;
                }
                println!("Read line: \"{trimmed}\"");
            }
            ReadOutcome::Eof | ReadOutcome::Aborted => break,
        }
    }

    editor.history_save(&cli.history_file).into_diagnostic()?;
    Ok(())
}
