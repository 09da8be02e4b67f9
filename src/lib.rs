/*============================================================
  Synavera Project: Explain
  Module: explain_core
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Explain why a system or library call failed. Given the
    call, the error number it produced and its arguments, the
    crate reports which argument was at fault and why.

  Security / Safety Notes:
    Probes the filesystem and descriptors read-only. Pointer
    arguments are read through a fault-safe probe. errno is
    preserved across every public entry point.

  Dependencies:
    libc for kernel facts; see the per-module banners.

  Operational Scope:
    Library surface for callers on their failure paths, and
    the engine behind the explain CLI.

  Revision History:
    2026-10-18 COD  Authored library surface.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Never fails: every call yields a non-empty diagnostic
    - No mutable global state past initialisation
    - Errno transparent to the caller
============================================================*/

pub mod analysers;
pub mod calls;
pub mod capability;
pub mod config;
pub mod errno_info;
pub mod error;
pub mod explanation;
pub mod fstrcmp;
pub mod identity;
pub mod ioctl;
pub mod logger;
pub mod mount;
pub mod options;
pub mod parse_bits;
pub mod path_resolution;
pub mod permission;
pub mod probe;
pub mod render;
pub mod string_buffer;
pub mod wrap;

use std::os::raw::c_int;
use std::sync::Once;

pub use calls::Explainer;
pub use error::{ExplainError, Result};
pub use explanation::{Explanation, MESSAGE_SIZE};
pub use options::Options;
pub use wrap::wrap_and_print;

use logger::{LogLevel, Logger};
use probe::ErrnoGuard;

/// Report ioctl registry conflicts once per process when debugging.
fn debug_self_check(options: &Options) {
    static CHECKED: Once = Once::new();
    if !options.debug {
        return;
    }
    CHECKED.call_once(|| {
        for problem in ioctl::check_conflicts() {
            Logger::diagnostic(LogLevel::Warn, "IOCTL", problem);
        }
    });
}

/// Explain `explainer` failing with `errnum`, using the process options.
pub fn message(explainer: &dyn Explainer, errnum: c_int) -> String {
    message_with_options(explainer, errnum, Options::current())
}

pub fn message_with_options(explainer: &dyn Explainer, errnum: c_int, options: Options) -> String {
    let _errno = ErrnoGuard::new();
    debug_self_check(&options);
    explanation::message(explainer, errnum, options)
}

/// Write the explanation into `buffer` (NUL terminated), returning
/// the text length. The text never exceeds `buffer.len() - 1` bytes.
pub fn message_into(buffer: &mut [u8], explainer: &dyn Explainer, errnum: c_int) -> usize {
    let _errno = ErrnoGuard::new();
    let options = Options::current();
    debug_self_check(&options);
    explanation::message_into(buffer, explainer, errnum, options)
}

/// Only the "because" clause, for callers composing their own prose.
pub fn because(explainer: &dyn Explainer, errnum: c_int) -> String {
    let _errno = ErrnoGuard::new();
    let options = Options::current();
    debug_self_check(&options);
    explanation::because(explainer, errnum, options)
}

/// Print the explanation on stderr, wrapped to the terminal.
pub fn report(explainer: &dyn Explainer, errnum: c_int) {
    let _errno = ErrnoGuard::new();
    wrap_and_print(&message(explainer, errnum));
}

/// Parse `words` as the arguments of the call `name` and explain it.
pub fn explain_by_name(name: &str, words: &[String], errnum: c_int, options: Options) -> Result<String> {
    let _errno = ErrnoGuard::new();
    let call = calls::parse(name, words)?;
    debug_self_check(&options);
    Ok(explanation::message(call.explainer(), errnum, options))
}
