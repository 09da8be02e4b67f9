/*============================================================
  Synavera Project: Explain
  Module: explain_core::explanation
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Drive an explainer through its call echo and cause
    analysis, then glue the parts into the final message:
    "<call> failed, <strerror>, because <cause><footnotes>".

  Security / Safety Notes:
    Saves and restores errno around the whole assembly. The
    output never exceeds the bound it is given.

  Dependencies:
    Standard library only.

  Operational Scope:
    Every public message function in the crate ends here.

  Revision History:
    2026-10-18 COD  Authored message assembly.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Echo and strerror survive truncation; the cause is cut first
    - Truncation is always visible as a trailing marker
============================================================*/

use std::os::raw::c_int;

use crate::calls::Explainer;
use crate::errno_info;
use crate::options::Options;
use crate::probe::ErrnoGuard;
use crate::string_buffer::{StringBuffer, SCRATCH_SIZE};

/// Upper bound of a message built without a caller buffer.
pub const MESSAGE_SIZE: usize = 4096;

/// Appended to any message that had to be cut.
pub const TRUNCATION_MARKER: &str = "...";

/// The three parts of a diagnostic before assembly.
#[derive(Debug, Clone)]
pub struct Explanation {
    pub errnum: c_int,
    pub system_call: String,
    pub strerror: String,
    pub cause: String,
    pub footnotes: String,
}

impl Explanation {
    /// Run `explainer` for `errnum` with the given options.
    pub fn build(explainer: &dyn Explainer, errnum: c_int, options: Options) -> Self {
        let _errno = ErrnoGuard::new();

        let mut call = StringBuffer::new(SCRATCH_SIZE, options);
        explainer.render_call(&mut call, errnum);

        let mut strerror = StringBuffer::new(SCRATCH_SIZE, options);
        errno_info::print_strerror(&mut strerror, errnum);

        let mut cause = StringBuffer::with_footnotes(SCRATCH_SIZE, options);
        if errnum == 0 {
            explainer.render_returned(&mut cause);
        } else {
            explainer.render_cause(&mut cause, errnum);
        }
        let footnotes = cause.footnotes().map(|notes| notes.as_str().to_string()).unwrap_or_default();

        Self {
            errnum,
            system_call: call.into_string(),
            strerror: strerror.into_string(),
            cause: cause.into_string(),
            footnotes,
        }
    }

    /// The full message, at most `maximum - 1` bytes long.
    pub fn assemble(&self, maximum: usize) -> String {
        let budget = maximum.saturating_sub(1);
        if self.errnum == 0 {
            let mut text = format!("{}: success", self.system_call);
            if !self.cause.is_empty() {
                text.push_str(", ");
                text.push_str(&self.cause);
            }
            text.push_str(&self.footnotes);
            return fit(text, budget);
        }

        let mut head = format!("{} failed, {}", self.system_call, self.strerror);
        if self.cause.is_empty() {
            head.push_str(&self.footnotes);
            return fit(head, budget);
        }
        head.push_str(", because ");
        if head.len() + TRUNCATION_MARKER.len() > budget {
            let short = format!("{} failed, {}{}", self.system_call, self.strerror, self.footnotes);
            return fit(short, budget);
        }
        head.push_str(&self.cause);
        head.push_str(&self.footnotes);
        fit(head, budget)
    }

    /// Only the cause and its footnotes.
    pub fn because(&self, maximum: usize) -> String {
        fit(format!("{}{}", self.cause, self.footnotes), maximum.saturating_sub(1))
    }
}

/// Cut `text` to `budget` bytes, ending in the truncation marker.
fn fit(mut text: String, budget: usize) -> String {
    if text.len() <= budget {
        return text;
    }
    if budget < TRUNCATION_MARKER.len() {
        text.truncate(floor_boundary(&text, budget));
        return text;
    }
    let cut = floor_boundary(&text, budget - TRUNCATION_MARKER.len());
    text.truncate(cut);
    text.push_str(TRUNCATION_MARKER);
    text
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Message for `explainer` failing with `errnum`.
pub fn message(explainer: &dyn Explainer, errnum: c_int, options: Options) -> String {
    Explanation::build(explainer, errnum, options).assemble(MESSAGE_SIZE)
}

/// Write the message into `buffer` as a NUL terminated string,
/// returning the number of text bytes written.
pub fn message_into(buffer: &mut [u8], explainer: &dyn Explainer, errnum: c_int, options: Options) -> usize {
    if buffer.is_empty() {
        return 0;
    }
    let text = Explanation::build(explainer, errnum, options).assemble(buffer.len());
    let length = text.len();
    buffer[..length].copy_from_slice(text.as_bytes());
    buffer[length] = 0;
    length
}

/// The "because" clause alone.
pub fn because(explainer: &dyn Explainer, errnum: c_int, options: Options) -> String {
    Explanation::build(explainer, errnum, options).because(MESSAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::Echo;

    struct Fixed {
        cause: &'static str,
        note: Option<&'static str>,
    }

    impl Explainer for Fixed {
        fn name(&self) -> &'static str {
            "frob"
        }

        fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
            Echo::new(sb, "frob").value("count", 3).finish();
        }

        fn render_cause(&self, sb: &mut StringBuffer, _errnum: c_int) {
            sb.puts(self.cause);
            if let Some(note) = self.note {
                sb.footnote_str(note);
            }
        }

        fn render_returned(&self, sb: &mut StringBuffer) {
            sb.puts("count = 3");
        }
    }

    fn plain() -> Options {
        Options {
            numeric_errno: false,
            ..Options::default()
        }
    }

    #[test]
    fn full_message_order() {
        let frob = Fixed {
            cause: "the count is odd",
            note: Some("this is a bug"),
        };
        assert_eq!(
            message(&frob, libc::EINVAL, plain()),
            "frob(count = 3) failed, Invalid argument, because the count is odd; this is a bug"
        );
    }

    #[test]
    fn numeric_errno_annotates_strerror() {
        let frob = Fixed { cause: "x", note: None };
        assert!(message(&frob, libc::EINVAL, Options::default()).contains("Invalid argument (22, EINVAL), because x"));
    }

    #[test]
    fn missing_cause_uses_short_form() {
        let frob = Fixed { cause: "", note: None };
        assert_eq!(message(&frob, libc::EIO, plain()), "frob(count = 3) failed, Input/output error");
    }

    #[test]
    fn success_reports_returned_data() {
        let frob = Fixed { cause: "unused", note: None };
        assert_eq!(message(&frob, 0, plain()), "frob(count = 3): success, count = 3");
    }

    #[test]
    fn caller_buffer_bounds_the_message() {
        let frob = Fixed {
            cause: "a cause that is rather longer than the space left for it",
            note: None,
        };
        let mut buffer = [0xffu8; 60];
        let written = message_into(&mut buffer, &frob, libc::EINVAL, plain());
        assert_eq!(written, 59);
        assert_eq!(buffer[59], 0);
        let text = std::str::from_utf8(&buffer[..written]).unwrap();
        assert!(text.starts_with("frob(count = 3) failed, Invalid argument, because a"));
        assert!(text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn tiny_buffers_drop_the_cause_first() {
        let frob = Fixed { cause: "long enough", note: None };
        let text = Explanation::build(&frob, libc::EINVAL, plain()).assemble(45);
        assert_eq!(text, "frob(count = 3) failed, Invalid argument");
        assert!(message_into(&mut [], &frob, libc::EINVAL, plain()) == 0);
    }

    #[test]
    fn because_clause_alone() {
        let frob = Fixed {
            cause: "the count is odd",
            note: Some("see above"),
        };
        assert_eq!(because(&frob, libc::EINVAL, plain()), "the count is odd; see above");
    }
}
