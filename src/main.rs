/*============================================================
  Synavera Project: Explain
  Module: explain_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for the explain command. Parses a failing call
    and its arguments from the command line and prints the
    explanation of the given error number.

  Security / Safety Notes:
    Operates within user privileges. Descriptor arguments
    naming paths are opened read-only for the duration of the
    run; nothing else on disk is touched unless a log is kept.

  Dependencies:
    clap for CLI parsing, chrono for session stamps,
    serde_json for machine-readable output.

  Operational Scope:
    Invoked by operators and scripts wanting the explanation
    of an error they observed elsewhere.

  Revision History:
    2026-10-18 COD  Authored explain CLI.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI, environment and config file
============================================================*/

use std::io::{self, Write};
use std::os::raw::c_int;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{ArgAction, Parser};
use serde::Serialize;

use explain_core::config::ExplainConfig;
use explain_core::error::{ExplainError, Result};
use explain_core::logger::Logger;
use explain_core::options::{self, Options};
use explain_core::{calls, errno_info, ioctl, parse_bits, wrap};

/// Command-line arguments for explain.
#[derive(Debug, Parser)]
#[command(
    name = "explain",
    version,
    author = "Synavera Systems",
    about = "Explain why a system call failed"
)]
struct Cli {
    /// Error number the call produced, by name (ENOENT) or number.
    #[arg(short, long, value_name = "ERRNO")]
    errno: Option<String>,
    /// List the calls that can be explained.
    #[arg(long, action = ArgAction::SetTrue)]
    list: bool,
    /// Emit JSON instead of wrapped text.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
    /// Check the ioctl registry for conflicting entries.
    #[arg(long, action = ArgAction::SetTrue)]
    check_ioctl: bool,
    /// Extra option text, as in EXPLAIN_OPTIONS.
    #[arg(short, long = "option", value_name = "OPTION", action = ArgAction::Append)]
    options: Vec<String>,
    /// Override output line width.
    #[arg(long, value_name = "COLUMNS")]
    width: Option<usize>,
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
    /// Name of the call that failed.
    #[arg(value_name = "CALL")]
    call: Option<String>,
    /// Arguments of the call, in order.
    #[arg(value_name = "ARG", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    call: &'a str,
    errno: c_int,
    name: Option<&'static str>,
    message: String,
}

#[derive(Debug, Serialize)]
struct Listing {
    call: &'static str,
    synopsis: &'static str,
    errnos: Vec<&'static str>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[explain] {}", err);
            err.exit_code()
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = ExplainConfig::load_from_optional_path(cli.config.as_deref())?;

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli.log.clone().or_else(|| {
        config
            .log_dir
            .as_ref()
            .map(|_| config.log_dir().join(format!("explain_{session_stamp}.log")))
    });
    let logger = Logger::new(log_path, cli.verbose)?;
    logger.info("INIT", "explain session opened");

    let client = (!cli.options.is_empty()).then(|| cli.options.join(","));
    let options = Options::resolve(
        config.options.as_deref(),
        options::env_text().as_deref(),
        client.as_deref(),
    );
    logger.debug("OPTIONS", format!("{options:?}"));

    let code = if cli.list {
        list_calls(cli.json)?
    } else if cli.check_ioctl {
        check_ioctl(&logger)
    } else {
        explain_call(&cli, &config, options, &logger)?
    };

    logger.info("COMPLETE", "explain session closed");
    logger.finalize()?;
    Ok(code)
}

fn list_calls(json: bool) -> Result<ExitCode> {
    let registry = calls::registry();
    let mut stdout = io::stdout().lock();
    if json {
        let listing: Vec<Listing> = registry
            .iter()
            .map(|entry| Listing {
                call: entry.name,
                synopsis: entry.synopsis,
                errnos: entry.errnos.iter().filter_map(|n| errno_info::name_of(*n)).collect(),
            })
            .collect();
        let text = serde_json::to_string_pretty(&listing)
            .map_err(|err| ExplainError::Serialization(err.to_string()))?;
        writeln!(stdout, "{text}")?;
    } else {
        for entry in registry {
            writeln!(stdout, "{:<14} {}", entry.name, entry.synopsis)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn check_ioctl(logger: &Logger) -> ExitCode {
    let problems = ioctl::check_conflicts();
    if problems.is_empty() {
        logger.info("IOCTL", format!("{} ioctl requests consistent", ioctl::table::ENTRIES.len()));
        println!("ioctl registry: no conflicts");
        return ExitCode::SUCCESS;
    }
    for problem in &problems {
        logger.warn("IOCTL", problem);
        println!("{problem}");
    }
    ExitCode::FAILURE
}

fn explain_call(cli: &Cli, config: &ExplainConfig, options: Options, logger: &Logger) -> Result<ExitCode> {
    let name = cli
        .call
        .as_deref()
        .ok_or_else(|| ExplainError::Usage("explain --errno ERRNO <call> [args...]".into()))?;
    let errno_text = cli
        .errno
        .as_deref()
        .ok_or_else(|| ExplainError::Usage("--errno is required to explain a call".into()))?;
    let errnum = parse_errno(errno_text)?;

    let parsed = calls::parse(name, &cli.args).map_err(|err| match err {
        ExplainError::UnknownCall { name } => match calls::suggest(&name) {
            Some(hint) => ExplainError::Usage(format!("unknown call `{name}`, did you mean `{hint}`?")),
            None => ExplainError::UnknownCall { name },
        },
        other => other,
    })?;
    logger.info("CALL", format!("{name} errno={errnum} args={}", cli.args.len()));

    let message = explain_core::message_with_options(parsed.explainer(), errnum, options);
    let mut stdout = io::stdout().lock();
    if cli.json {
        let report = Report {
            call: name,
            errno: errnum,
            name: errno_info::name_of(errnum),
            message,
        };
        let text = serde_json::to_string_pretty(&report)
            .map_err(|err| ExplainError::Serialization(err.to_string()))?;
        writeln!(stdout, "{text}")?;
    } else {
        let width = cli
            .width
            .or(config.line_width)
            .unwrap_or_else(wrap::stderr_width);
        let text = wrap::wrap(&message, width, options.hanging_indent_for(width));
        writeln!(stdout, "{text}")?;
    }
    Ok(ExitCode::SUCCESS)
}

/// `ENOENT`, `2` or `0x2`.
fn parse_errno(text: &str) -> Result<c_int> {
    if let Some(info) = errno_info::find_by_name(text) {
        return Ok(info.number);
    }
    if let Some(number) = parse_bits::parse_c_integer(text) {
        return c_int::try_from(number)
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| ExplainError::parse("errno", text, "out of range"));
    }
    let reason = match errno_info::suggest_name(text) {
        Some(hint) => format!("unknown error name, did you mean {hint}?"),
        None => "unknown error name".to_string(),
    };
    Err(ExplainError::parse("errno", text, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_by_name_or_number() {
        assert_eq!(parse_errno("ENOENT").unwrap(), libc::ENOENT);
        assert_eq!(parse_errno("9").unwrap(), libc::EBADF);
        assert_eq!(parse_errno("0x16").unwrap(), libc::EINVAL);
        assert!(matches!(parse_errno("-3"), Err(ExplainError::Parse { .. })));
    }

    #[test]
    fn misspelled_errno_suggests() {
        match parse_errno("ENOENTT") {
            Err(ExplainError::Parse { reason, .. }) => assert!(reason.contains("ENOENT")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cli_shape() {
        let cli = Cli::try_parse_from(["explain", "-e", "EBADF", "write", "7", "-", "1"]).unwrap();
        assert_eq!(cli.call.as_deref(), Some("write"));
        assert_eq!(cli.args, vec!["7", "-", "1"]);
        let cli = Cli::try_parse_from(["explain", "--option", "debug", "-o", "no-numeric-errno", "--list"]).unwrap();
        assert_eq!(cli.options.len(), 2);
        assert!(cli.list);
    }
}
