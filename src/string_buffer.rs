/*============================================================
  Synavera Project: Explain
  Module: explain_core::string_buffer
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Bounded, append-only text sink with a latched truncation
    flag and an optional footnotes side-channel.

  Security / Safety Notes:
    Writes never fail and never exceed the configured maximum.
    Truncation always lands on a character boundary.

  Dependencies:
    probe for fault-safe string sources; options for the
    snapshot every buffer carries.

  Operational Scope:
    Every renderer and analyser writes through this type.

  Revision History:
    2026-10-18 COD  Authored bounded buffer with footnotes.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Infallible writes with explicit truncation state
    - Footnotes kept apart from the causal sentence
    - Output restricted to printable text
============================================================*/

use std::fmt;
use std::os::raw::c_char;

use crate::options::Options;
use crate::probe;

/// Capacity for scratch buffers used to compose message fragments.
pub const SCRATCH_SIZE: usize = 3 * libc::PATH_MAX as usize + 200;

/// A bounded text sink.
#[derive(Debug, Clone)]
pub struct StringBuffer {
    text: String,
    maximum: usize,
    truncated: bool,
    options: Options,
    footnotes: Option<Box<StringBuffer>>,
}

impl StringBuffer {
    /// Create a buffer holding at most `maximum - 1` bytes of text.
    pub fn new(maximum: usize, options: Options) -> Self {
        Self {
            text: String::new(),
            maximum: maximum.max(1),
            truncated: false,
            options,
            footnotes: None,
        }
    }

    /// Create a buffer with an attached footnotes channel of the same size.
    pub fn with_footnotes(maximum: usize, options: Options) -> Self {
        let mut sb = Self::new(maximum, options);
        sb.footnotes = Some(Box::new(Self::new(maximum, options)));
        sb
    }

    /// Fresh scratch buffer sharing this buffer's options.
    pub fn scratch(&self) -> StringBuffer {
        StringBuffer::new(SCRATCH_SIZE, self.options)
    }

    /// Option snapshot in force for this diagnostic.
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn maximum(&self) -> usize {
        self.maximum
    }

    /// Whether any write has been cut short.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Bytes still available before truncation.
    pub fn remaining(&self) -> usize {
        self.maximum - 1 - self.text.len()
    }

    /// Discard the contents and reset the truncation latch.
    pub fn clear(&mut self) {
        self.text.clear();
        self.truncated = false;
    }

    /// Append one character.
    pub fn putc(&mut self, c: char) {
        let mut tmp = [0u8; 4];
        self.puts(c.encode_utf8(&mut tmp));
    }

    /// Append text, writing as much as fits.
    pub fn puts(&mut self, text: &str) {
        if self.truncated {
            return;
        }
        let room = self.remaining();
        if text.len() <= room {
            self.text.push_str(text);
            return;
        }
        let mut cut = room;
        while cut > 0 && !text.is_char_boundary(cut) {
            cut -= 1;
        }
        self.text.push_str(&text[..cut]);
        self.truncated = true;
    }

    /// Append a length-bounded byte range; invalid UTF-8 is escaped.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for chunk in bytes.utf8_chunks() {
            self.puts(chunk.valid());
            for &b in chunk.invalid() {
                self.puts(&format!("\\{b:03o}"));
            }
        }
    }

    /// Append `text` C-quoted: surrounded by double quotes, with
    /// control characters, quotes and backslashes escaped.
    pub fn puts_quoted(&mut self, text: &[u8]) {
        self.putc('"');
        self.quote_body(text);
        self.putc('"');
    }

    fn quote_body(&mut self, text: &[u8]) {
        let utf8 = self.options.utf8_output;
        for chunk in text.utf8_chunks() {
            for c in chunk.valid().chars() {
                match c {
                    '"' => self.puts("\\\""),
                    '\\' => self.puts("\\\\"),
                    '\n' => self.puts("\\n"),
                    '\t' => self.puts("\\t"),
                    '\r' => self.puts("\\r"),
                    '\x07' => self.puts("\\a"),
                    '\x08' => self.puts("\\b"),
                    '\x0c' => self.puts("\\f"),
                    '\x0b' => self.puts("\\v"),
                    c if c.is_ascii() && !c.is_ascii_control() => self.putc(c),
                    c if !c.is_ascii() && utf8 && !c.is_control() => self.putc(c),
                    c => {
                        let mut tmp = [0u8; 4];
                        for b in c.encode_utf8(&mut tmp).bytes() {
                            self.puts(&format!("\\{b:03o}"));
                        }
                    }
                }
            }
            for &b in chunk.invalid() {
                self.puts(&format!("\\{b:03o}"));
            }
        }
    }

    /// Append a C-quoted string read through the fault-safe probe.
    ///
    /// A null pointer renders as `NULL`, wholly unreadable memory as
    /// the pointer value; an unterminated or partially readable string
    /// is closed and followed by `...`.
    pub fn puts_quoted_ptr(&mut self, ptr: *const c_char) {
        match probe::read_c_string(ptr, probe::STRING_PROBE_LIMIT) {
            None => crate::render::pointer::pointer(self, ptr as *const libc::c_void),
            Some(probed) => {
                self.puts_quoted(&probed.bytes);
                if !probed.terminated {
                    self.puts("...");
                }
            }
        }
    }

    /// Append `text` quoted for a POSIX shell when it needs quoting.
    pub fn puts_shell_quoted(&mut self, text: &str) {
        let mut needs_quoting = text.is_empty();
        let mut mode = '\0';
        for c in text.chars() {
            match c {
                '!' => {
                    mode = '\'';
                    needs_quoting = true;
                    break;
                }
                '\'' => {
                    mode = '"';
                    needs_quoting = true;
                    break;
                }
                '"' | '#' | '$' | '&' | '(' | ')' | '*' | ':' | ';' | '<' | '=' | '>' | '?'
                | '[' | '\\' | ']' | '^' | '`' | '{' | '|' | '}' | '~' => needs_quoting = true,
                c if c.is_whitespace() || c.is_control() => needs_quoting = true,
                _ => {}
            }
        }
        if !needs_quoting {
            self.puts(text);
            return;
        }
        if mode == '\0' {
            mode = '\'';
        }
        self.putc(mode);
        for c in text.chars() {
            if mode == '\'' {
                if c == '\'' {
                    self.puts("'\"'");
                    mode = '"';
                } else {
                    self.putc(c);
                }
            } else {
                match c {
                    '!' => {
                        self.puts("\"'!");
                        mode = '\'';
                    }
                    '\n' | '"' | '\\' | '`' | '$' => {
                        self.putc('\\');
                        self.putc(c);
                    }
                    _ => self.putc(c),
                }
            }
        }
        self.putc(mode);
    }

    /// Footnotes channel, when this buffer has one.
    pub fn footnotes_mut(&mut self) -> Option<&mut StringBuffer> {
        self.footnotes.as_deref_mut()
    }

    /// Footnotes written so far.
    pub fn footnotes(&self) -> Option<&StringBuffer> {
        self.footnotes.as_deref()
    }

    /// Append a footnote, separated from earlier ones by "; ".
    /// Without a footnotes channel the note is dropped.
    pub fn footnote<F>(&mut self, write: F)
    where
        F: FnOnce(&mut StringBuffer),
    {
        if let Some(notes) = self.footnotes_mut() {
            notes.puts("; ");
            write(notes);
        }
    }

    /// Append plain footnote text.
    pub fn footnote_str(&mut self, text: &str) {
        self.footnote(|notes| notes.puts(text));
    }

    /// Take the text out of the buffer.
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Write for StringBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.puts(s);
        Ok(())
    }
}

impl fmt::Display for StringBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::fmt::Write;

    fn sb(max: usize) -> StringBuffer {
        StringBuffer::new(max, Options::default())
    }

    #[test]
    fn formatted_writes_append() {
        let mut buf = sb(64);
        write!(buf, "fildes = {}, size = {:#x}", 7, 255).unwrap();
        assert_eq!(buf.as_str(), "fildes = 7, size = 0xff");
        assert!(!buf.is_truncated());
    }

    #[test]
    fn truncation_latches_and_stays_within_bounds() {
        let mut buf = sb(8);
        buf.puts("abcdef");
        buf.puts("ghijkl");
        assert_eq!(buf.as_str(), "abcdefg");
        assert!(buf.is_truncated());
        buf.puts("x");
        assert_eq!(buf.len(), 7);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut buf = sb(5);
        buf.puts("aé€");
        assert_eq!(buf.as_str(), "aé");
        assert!(buf.is_truncated());
    }

    #[test]
    fn quoting_escapes_controls_and_quotes() {
        let mut buf = sb(64);
        buf.puts_quoted(b"a\"b\\c\nd\x01");
        assert_eq!(buf.as_str(), "\"a\\\"b\\\\c\\nd\\001\"");
    }

    #[test]
    fn quoting_escapes_non_ascii_unless_utf8_output() {
        let mut plain = sb(64);
        plain.puts_quoted("é".as_bytes());
        assert_eq!(plain.as_str(), "\"\\303\\251\"");

        let options = Options {
            utf8_output: true,
            ..Options::default()
        };
        let mut utf8 = StringBuffer::new(64, options);
        utf8.puts_quoted("é".as_bytes());
        assert_eq!(utf8.as_str(), "\"é\"");
    }

    #[test]
    fn fault_safe_quoting() {
        let text = CString::new("/etc/passwd").unwrap();
        let mut buf = sb(64);
        buf.puts_quoted_ptr(text.as_ptr());
        assert_eq!(buf.as_str(), "\"/etc/passwd\"");

        let mut null = sb(64);
        null.puts_quoted_ptr(std::ptr::null());
        assert_eq!(null.as_str(), "NULL");

        let mut bad = sb(64);
        bad.puts_quoted_ptr(0x20 as *const c_char);
        assert_eq!(bad.as_str(), "0x20");
    }

    #[test]
    fn shell_quoting() {
        let mut buf = sb(128);
        buf.puts_shell_quoted("plain");
        buf.putc(' ');
        buf.puts_shell_quoted("two words");
        buf.putc(' ');
        buf.puts_shell_quoted("it's");
        assert_eq!(buf.as_str(), "plain 'two words' \"it's\"");
    }

    #[test]
    fn footnotes_are_separated() {
        let mut buf = StringBuffer::with_footnotes(128, Options::default());
        buf.puts("cause");
        buf.footnote_str("first");
        buf.footnote(|n| n.puts("second"));
        assert_eq!(buf.as_str(), "cause");
        assert_eq!(buf.footnotes().unwrap().as_str(), "; first; second");

        let mut bare = sb(32);
        bare.footnote_str("dropped");
        assert!(bare.footnotes().is_none());
    }
}
