/*============================================================
  Synavera Project: Explain
  Module: explain_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Error taxonomy for the outer surfaces of Explain: the CLI,
    configuration loading and the session log.

  Security / Safety Notes:
    The diagnostic core never returns these; it always produces
    a message. Only argument parsing and file handling fail.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Propagated through `run()` in the binary and through the
    configuration loader, then mapped to stable exit codes.

  Revision History:
    2026-10-18 COD  Established error domains for Explain.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Explain surface operations.
pub type Result<T> = std::result::Result<T, ExplainError>;

/// Enumerates the error domains surfaced by the CLI and loaders.
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("Usage: {0}")]
    Usage(String),
    #[error("Unknown call `{name}`")]
    UnknownCall { name: String },
    #[error("Call `{call}` expects {expected} argument(s), {given} given")]
    ArgumentCount {
        call: String,
        expected: String,
        given: usize,
    },
    #[error("Unable to interpret {caption} `{text}`: {reason}")]
    Parse {
        caption: String,
        text: String,
        reason: String,
    },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ExplainError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ExplainError::Usage(_) => ExitCode::from(2),
            ExplainError::UnknownCall { .. } => ExitCode::from(2),
            ExplainError::ArgumentCount { .. } => ExitCode::from(2),
            ExplainError::Config(_) => ExitCode::from(20),
            ExplainError::Parse { .. } => ExitCode::from(21),
            ExplainError::Serialization(_) => ExitCode::from(31),
            ExplainError::Filesystem(_) => ExitCode::from(40),
            ExplainError::Io(_) => ExitCode::from(41),
            ExplainError::Runtime(_) => ExitCode::from(50),
        }
    }

    /// Shorthand for argument interpretation failures.
    pub fn parse(caption: &str, text: &str, reason: impl Into<String>) -> Self {
        ExplainError::Parse {
            caption: caption.to_string(),
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}
