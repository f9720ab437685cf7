//! Binary entry point for the slotinfer CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Report inferred declarations for a package (JSON)
//! slotinfer infer src/
//!
//! # Infer the declaration of the initializer defined on line 12
//! slotinfer infer src/shapes.py --line 12
//!
//! # Preview the rewritten sources as a unified diff
//! slotinfer emit src/
//!
//! # Write the declarations into the sources
//! slotinfer emit src/ --write
//!
//! # Fail (exit 1) when any source still carries a slot decorator
//! slotinfer emit src/ --check
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use slotinfer::cli::{emit_paths, infer_at_line, infer_paths, resolve_config, EmittedFile};
use slotinfer_core::config::Config;
use slotinfer_core::error::{OutputErrorCode, SlotinferError};
use slotinfer_core::output::{emit_response, EmitResponse, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Static __slots__ inference for Python classes.
///
/// Infers the `__slots__` of every class whose `__init__` carries a slot
/// decorator from the attributes the initializer assigns on `self`.
#[derive(Parser, Debug)]
#[command(name = "slotinfer", version, about = "Static __slots__ inference for Python classes")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: slotinfer.toml or pyproject.toml found
    /// upward from the current directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Slot decorator name, plain or dotted. Can be specified multiple times;
    /// replaces the configured names.
    #[arg(long = "decorator", global = true)]
    decorators: Vec<String>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log format for tracing output.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log format for tracing output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Output format for the emit command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum EmitFormat {
    /// Unified diff (default).
    #[default]
    Diff,
    /// The rewritten source.
    Source,
    /// Full JSON response.
    Json,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Infer __slots__ for decorated initializers (JSON report).
    Infer {
        /// Python files or directories.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Infer only the initializer whose `def` is on this line. Requires a
        /// single file; the function needs no decorator.
        #[arg(long)]
        line: Option<u32>,
    },
    /// Rewrite sources with the inferred declarations written out.
    Emit {
        /// Python files or directories.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Output format.
        #[arg(long, value_enum, default_value = "diff")]
        format: EmitFormat,
        /// Write the rewritten sources back to disk.
        #[arg(long)]
        write: bool,
        /// Exit with status 1 if any file would change (nothing is written).
        #[arg(long, conflicts_with = "write")]
        check: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_format);

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            // Errors go to stdout as a JSON envelope
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();
            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<ExitCode, SlotinferError> {
    let cwd = std::env::current_dir()
        .map_err(|e| SlotinferError::internal(format!("cannot determine working directory: {}", e)))?;
    let config = resolve_config(cli.global.config.as_deref(), &cwd, &cli.global.decorators)?;

    match cli.command {
        Command::Infer { paths, line } => execute_infer(&config, &paths, line),
        Command::Emit {
            paths,
            format,
            write,
            check,
        } => execute_emit(&config, &paths, format, write, check),
    }
}

// ============================================================================
// Command Executors
// ============================================================================

/// Execute infer command.
fn execute_infer(
    config: &Config,
    paths: &[PathBuf],
    line: Option<u32>,
) -> Result<ExitCode, SlotinferError> {
    let response = match line {
        Some(line) => {
            let [path] = paths else {
                return Err(SlotinferError::invalid_args(
                    "--line requires exactly one file",
                ));
            };
            if !path.is_file() {
                return Err(SlotinferError::invalid_args(format!(
                    "--line requires a file, got {}",
                    path.display()
                )));
            }
            infer_at_line(path, line, config)?
        }
        None => infer_paths(paths, config)?,
    };

    emit_response(&response, &mut io::stdout())
        .map_err(|e| SlotinferError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(ExitCode::SUCCESS)
}

/// Execute emit command.
///
/// With `--check` the exit status is 1 when any file would change. The
/// selected output is printed either way.
fn execute_emit(
    config: &Config,
    paths: &[PathBuf],
    format: EmitFormat,
    write: bool,
    check: bool,
) -> Result<ExitCode, SlotinferError> {
    let emitted = emit_paths(paths, config)?;

    let mut written = Vec::with_capacity(emitted.len());
    for file in &emitted {
        let write_this = write && file.emission.changed;
        if write_this {
            file.write()?;
        }
        written.push(write_this);
    }

    let any_changed = emitted.iter().any(|f| f.emission.changed);
    let mut stdout = io::stdout();
    match format {
        EmitFormat::Json => {
            let status = if check && any_changed {
                "changes_needed"
            } else {
                "ok"
            };
            let files = emitted
                .iter()
                .zip(&written)
                .map(|(f, w)| f.report(*w))
                .collect();
            emit_response(&EmitResponse::new(status, files), &mut stdout)
                .map_err(|e| SlotinferError::internal(e.to_string()))?;
        }
        EmitFormat::Diff => {
            let diff: String = emitted.iter().map(|f| f.emission.diff(&f.file)).collect();
            if diff.is_empty() {
                println!("No changes.");
            } else {
                print!("{}", diff);
            }
        }
        EmitFormat::Source => print_sources(&emitted),
    }
    let _ = stdout.flush();

    if check && any_changed {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Print rewritten sources, with a header per file when there are several.
fn print_sources(emitted: &[EmittedFile]) {
    let headers = emitted.len() > 1;
    for file in emitted {
        if headers {
            println!("# ==> {} <==", file.file);
        }
        print!("{}", file.emission.source);
    }
}
