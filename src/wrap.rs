/*============================================================
  Synavera Project: Explain
  Module: explain_core::wrap
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Word-wrap diagnostics for a terminal, prefixing the program
    name and indenting continuation lines.

  Security / Safety Notes:
    Queries the stderr window size with TIOCGWINSZ; writes only
    to the sink it is handed.

  Dependencies:
    libc for isatty and the window size query.

  Operational Scope:
    Used by the CLI and by wrap_and_print for library callers
    that report to stderr.

  Revision History:
    2026-10-18 COD  Authored line wrapping.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Words are never split; long words overflow the line
============================================================*/

use std::io::{self, Write};
use std::path::Path;

use crate::options::Options;
use crate::probe::ErrnoGuard;

pub const DEFAULT_LINE_WIDTH: usize = 75;

/// Lines wider than this are not worth honouring.
const MAX_LINE_WIDTH: usize = libc::PATH_MAX as usize + 10;

/// Wrap `text` to `width` columns; continuation lines start with
/// `indent` spaces. The result has no trailing newline.
pub fn wrap(text: &str, width: usize, indent: usize) -> String {
    let width = width.clamp(1, MAX_LINE_WIDTH);
    let mut out = String::with_capacity(text.len() + 16);
    let mut line_width = 0;
    for word in text.split_whitespace() {
        let word_width = word.chars().count();
        if !out.is_empty() {
            if line_width + 1 + word_width <= width {
                out.push(' ');
                line_width += 1;
            } else {
                out.push('\n');
                out.extend(std::iter::repeat(' ').take(indent));
                line_width = indent;
            }
        }
        out.push_str(word);
        line_width += word_width;
    }
    out
}

/// Column width for stderr: `COLUMNS`, then the terminal, then 75.
pub fn stderr_width() -> usize {
    if let Some(width) = std::env::var("COLUMNS")
        .ok()
        .and_then(|text| text.trim().parse::<usize>().ok())
        .filter(|width| *width > 0)
    {
        return width;
    }
    terminal_width(libc::STDERR_FILENO).unwrap_or(DEFAULT_LINE_WIDTH)
}

fn terminal_width(fildes: libc::c_int) -> Option<usize> {
    let _errno = ErrnoGuard::new();
    // SAFETY: isatty and TIOCGWINSZ only read kernel state into `ws`.
    unsafe {
        if libc::isatty(fildes) == 0 {
            return None;
        }
        let mut ws: libc::winsize = std::mem::zeroed();
        if libc::ioctl(fildes, libc::TIOCGWINSZ, &mut ws) < 0 || ws.ws_col == 0 {
            return None;
        }
        Some(usize::from(ws.ws_col))
    }
}

/// Basename of the running program.
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "explain".to_string())
}

/// Prefix the program name when the option asks for it, then wrap.
pub fn format(text: &str, width: usize, options: &Options) -> String {
    let prefixed;
    let text = if options.program_name {
        prefixed = format!("{}: {text}", program_name());
        prefixed.as_str()
    } else {
        text
    };
    wrap(text, width, options.hanging_indent_for(width))
}

/// Write `text` wrapped to `width` on `out`.
pub fn write_wrapped<W: Write>(out: &mut W, text: &str, width: usize, options: &Options) -> io::Result<()> {
    let wrapped = format(text, width, options);
    if wrapped.is_empty() {
        return Ok(());
    }
    writeln!(out, "{wrapped}")
}

/// Print `text` on stderr, wrapped to the terminal width.
pub fn wrap_and_print(text: &str) {
    let _errno = ErrnoGuard::new();
    let mut stderr = io::stderr().lock();
    let _ = write_wrapped(&mut stderr, text, stderr_width(), &Options::current());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap("open(pathname = \"x\") failed", 75, 0), "open(pathname = \"x\") failed");
    }

    #[test]
    fn breaks_between_words_with_indent() {
        let text = "alpha beta gamma delta epsilon";
        assert_eq!(wrap(text, 11, 0), "alpha beta\ngamma delta\nepsilon");
        assert_eq!(wrap(text, 11, 2), "alpha beta\n  gamma\n  delta\n  epsilon");
    }

    #[test]
    fn long_words_are_never_split() {
        let text = "see /a/very/long/path/that/overflows here";
        assert_eq!(wrap(text, 10, 0), "see\n/a/very/long/path/that/overflows\nhere");
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(wrap("  a \n b\t\tc ", 75, 0), "a b c");
        assert_eq!(wrap("   ", 75, 0), "");
    }

    #[test]
    fn program_name_prefix_follows_option() {
        let mut options = Options::default();
        options.program_name = false;
        assert_eq!(format("x failed", 75, &options), "x failed");
        options.program_name = true;
        assert!(format("x failed", 75, &options).ends_with(": x failed"));
    }

    #[test]
    fn hanging_indent_is_clamped_by_width() {
        let mut options = Options::default();
        options.program_name = false;
        options.hanging_indent = 40;
        let mut out = Vec::new();
        write_wrapped(&mut out, "aaaa bbbb cccc", 9, &options).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "aaaa bbbb\n cccc\n");
    }

    #[test]
    #[serial]
    fn columns_variable_sets_width() {
        let saved = std::env::var_os("COLUMNS");
        std::env::set_var("COLUMNS", "132");
        let width = stderr_width();
        std::env::set_var("COLUMNS", "nonsense");
        let fallback = stderr_width();
        match saved {
            Some(value) => std::env::set_var("COLUMNS", value),
            None => std::env::remove_var("COLUMNS"),
        }
        assert_eq!(width, 132);
        assert!(fallback > 0);
    }
}
