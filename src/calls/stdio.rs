/*============================================================
  Synavera Project: Explain
  Module: explain_core::calls::stdio
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Explainers for buffered stream calls: fopen, fdopen,
    fclose, fflush, fread, fwrite, fgetc and fputc. Stream
    failures are analysed through the descriptor underneath.

  Security / Safety Notes:
    A FILE pointer is only handed to fileno after its memory
    proved readable.

  Dependencies:
    calls::file_io cause analysers, render::fildes::stream.

  Operational Scope:
    The stdio section of the call registry.

  Revision History:
    2026-10-18 COD  Authored stream explainers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - One descriptor analysis serves both raw and buffered I/O
============================================================*/

use std::fmt::Write;
use std::os::raw::{c_char, c_int, c_void};

use super::file_io::{open_cause, read_cause, write_cause};
use super::{probe_string, Args, CallEntry, Echo, Explainer};
use crate::analysers::fildes::{ebadf_reading, ebadf_writing, is_open_for_reading, is_open_for_writing};
use crate::analysers::{ebadf, ebadf_stream, efault, enomem_user, generic, software_error};
use crate::error::Result;
use crate::probe;
use crate::render::fildes::{stream, stream_fileno};
use crate::render::open_flags::open_flags;
use crate::render::pointer::{character, size};
use crate::string_buffer::StringBuffer;

/// Open flags equivalent to an fopen mode string, `None` when the
/// mode is not valid.
pub fn mode_flags(mode: &[u8]) -> Option<c_int> {
    let (&first, rest) = mode.split_first()?;
    let mut flags = match first {
        b'r' => libc::O_RDONLY,
        b'w' => libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
        b'a' => libc::O_WRONLY | libc::O_CREAT | libc::O_APPEND,
        _ => return None,
    };
    for &c in rest {
        match c {
            b'+' => flags = (flags & !libc::O_ACCMODE) | libc::O_RDWR,
            b'x' => flags |= libc::O_EXCL,
            b'e' => flags |= libc::O_CLOEXEC,
            b'b' | b't' | b'm' | b'c' => {}
            _ => return None,
        }
    }
    Some(flags)
}

fn einval_mode(sb: &mut StringBuffer, mode: &[u8]) {
    sb.puts("the mode argument ");
    sb.puts_quoted(mode);
    sb.puts(" is not valid, it must begin with \"r\", \"w\" or \"a\"");
    software_error(sb);
}

/// EBADF for a stream: first whether it is a stream at all, then the
/// access mode of its descriptor.
fn ebadf_fp(sb: &mut StringBuffer, fp: *mut libc::FILE, reading: Option<bool>) {
    let Some(fd) = stream_fileno(fp) else {
        return ebadf_stream(sb, "fp");
    };
    match reading {
        Some(true) => ebadf_reading(sb, fd, "fp"),
        Some(false) => ebadf_writing(sb, fd, "fp"),
        None => ebadf(sb, fd, "fp"),
    }
}

/// Cause analysis shared by the stream I/O calls; `writing` is None
/// for calls that neither read nor write data.
fn stream_cause(
    sb: &mut StringBuffer,
    errnum: c_int,
    fp: *mut libc::FILE,
    writing: Option<bool>,
    data_size: usize,
    call: &str,
) {
    if errnum == libc::EBADF {
        return ebadf_fp(sb, fp, writing.map(|w| !w));
    }
    if errnum == libc::ENOMEM {
        return enomem_user(sb, 0);
    }
    let Some(fd) = stream_fileno(fp) else {
        return ebadf_stream(sb, "fp");
    };
    match writing {
        Some(false) => read_cause(sb, errnum, fd, call),
        _ => write_cause(sb, errnum, fd, data_size, None, call),
    }
}

pub struct Fopen {
    pub pathname: *const c_char,
    pub mode: *const c_char,
}

impl Explainer for Fopen {
    fn name(&self) -> &'static str {
        "fopen"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "fopen")
            .path("pathname", self.pathname, errnum)
            .string("mode", self.mode)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let Some(mode) = probe_string(self.mode) else {
            return efault(sb, "mode");
        };
        let Some(flags) = mode_flags(&mode) else {
            return einval_mode(sb, &mode);
        };
        match errnum {
            libc::ENOMEM => return enomem_user(sb, 0),
            libc::EINVAL => {
                sb.puts("the mode argument ");
                sb.puts_quoted(&mode);
                sb.puts(" is valid, but the open flags it implies were rejected for pathname");
            }
            _ => open_cause(sb, errnum, libc::AT_FDCWD, self.pathname, flags, "fopen"),
        }
        if sb.options().dialect_specific && errnum != libc::EFAULT {
            let mut flags_text = sb.scratch();
            open_flags(&mut flags_text, flags);
            sb.footnote(|notes| {
                let _ = write!(notes, "the mode argument corresponds to {}", flags_text.as_str());
            });
        }
    }
}

pub struct Fdopen {
    pub fildes: c_int,
    pub mode: *const c_char,
}

impl Explainer for Fdopen {
    fn name(&self) -> &'static str {
        "fdopen"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "fdopen")
            .fildes("fildes", self.fildes)
            .string("mode", self.mode)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EBADF => ebadf(sb, self.fildes, "fildes"),
            libc::ENOMEM => enomem_user(sb, 0),
            libc::EINVAL => {
                let Some(mode) = probe_string(self.mode) else {
                    return efault(sb, "mode");
                };
                let Some(flags) = mode_flags(&mode) else {
                    return einval_mode(sb, &mode);
                };
                let wants_read = flags & libc::O_ACCMODE != libc::O_WRONLY;
                let wants_write = flags & libc::O_ACCMODE != libc::O_RDONLY;
                let actual = probe::file_status_flags(self.fildes).unwrap_or(0);
                sb.puts("the mode argument ");
                sb.puts_quoted(&mode);
                if wants_read && is_open_for_reading(self.fildes) == Some(false)
                    || wants_write && is_open_for_writing(self.fildes) == Some(false)
                {
                    sb.puts(" is not compatible with the access mode of fildes, which was opened ");
                    open_flags(sb, actual & libc::O_ACCMODE);
                } else {
                    sb.puts(" is not valid for fildes");
                }
                software_error(sb);
            }
            _ => generic(sb, errnum, "fdopen"),
        }
    }
}

/// fclose, fflush, fgetc: calls taking only a stream.
pub struct StreamOnly {
    pub name: &'static str,
    pub fp: *mut libc::FILE,
}

impl StreamOnly {
    fn writing(&self) -> Option<bool> {
        match self.name {
            "fgetc" => Some(false),
            _ => None,
        }
    }
}

impl Explainer for StreamOnly {
    fn name(&self) -> &'static str {
        self.name
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, self.name).arg("fp", |sb| stream(sb, self.fp)).finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        stream_cause(sb, errnum, self.fp, self.writing(), 0, self.name);
        if self.name == "fclose" && errnum != libc::EBADF {
            sb.footnote_str("the stream was closed even though an error was reported, it must not be used again");
        }
    }
}

/// fread and fwrite.
pub struct Transfer {
    pub writing: bool,
    pub data: *const c_void,
    pub size: usize,
    pub nmemb: usize,
    pub fp: *mut libc::FILE,
}

impl Explainer for Transfer {
    fn name(&self) -> &'static str {
        if self.writing {
            "fwrite"
        } else {
            "fread"
        }
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, self.name())
            .pointer("ptr", self.data)
            .arg("size", |sb| size(sb, self.size))
            .arg("nmemb", |sb| size(sb, self.nmemb))
            .arg("fp", |sb| stream(sb, self.fp))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if errnum == libc::EFAULT {
            return efault(sb, "ptr");
        }
        let total = self.size.saturating_mul(self.nmemb);
        stream_cause(sb, errnum, self.fp, Some(self.writing), total, self.name());
    }
}

pub struct Fputc {
    pub c: c_int,
    pub fp: *mut libc::FILE,
}

impl Explainer for Fputc {
    fn name(&self) -> &'static str {
        "fputc"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "fputc")
            .arg("c", |sb| character(sb, self.c))
            .arg("fp", |sb| stream(sb, self.fp))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        stream_cause(sb, errnum, self.fp, Some(true), 1, "fputc");
    }
}

fn parse_fopen(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let mode = args.string("mode")?;
    Ok(Box::new(Fopen { pathname, mode }))
}

fn parse_fdopen(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let mode = args.string("mode")?;
    Ok(Box::new(Fdopen { fildes, mode }))
}

fn parse_stream_only(args: &mut Args<'_>, name: &'static str) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(StreamOnly {
        name,
        fp: args.stream("fp")?,
    }))
}

fn parse_fclose(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_stream_only(args, "fclose")
}

fn parse_fflush(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_stream_only(args, "fflush")
}

fn parse_fgetc(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_stream_only(args, "fgetc")
}

fn parse_transfer(args: &mut Args<'_>, writing: bool) -> Result<Box<dyn Explainer>> {
    let fp = args.stream("fp")?;
    let size = args.size("size")?;
    let nmemb = args.size_or("nmemb", 1)?;
    let data = args.buffer("ptr")? as *const c_void;
    Ok(Box::new(Transfer {
        writing,
        data,
        size,
        nmemb,
        fp,
    }))
}

fn parse_fread(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_transfer(args, false)
}

fn parse_fwrite(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_transfer(args, true)
}

fn parse_fputc(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let text = args.optional().unwrap_or("");
    let c = match text.as_bytes() {
        [b] => c_int::from(*b),
        _ => crate::parse_bits::parse_c_integer(text)
            .map(|v| v as c_int)
            .ok_or_else(|| crate::error::ExplainError::parse("c", text, "expected a character or number"))?,
    };
    let fp = args.stream("fp")?;
    Ok(Box::new(Fputc { c, fp }))
}

const STREAM_ERRNOS: &[c_int] = &[
    libc::EAGAIN,
    libc::EBADF,
    libc::EFBIG,
    libc::EINTR,
    libc::EIO,
    libc::ENOMEM,
    libc::ENOSPC,
    libc::EPIPE,
];

const STREAM_READ_ERRNOS: &[c_int] = &[libc::EAGAIN, libc::EBADF, libc::EINTR, libc::EIO, libc::EISDIR, libc::ENOMEM];

pub(crate) static CALLS: [CallEntry; 8] = [
    CallEntry {
        name: "fopen",
        synopsis: "pathname mode",
        errnos: &[
            libc::EACCES,
            libc::EEXIST,
            libc::EFAULT,
            libc::EINVAL,
            libc::EISDIR,
            libc::ELOOP,
            libc::EMFILE,
            libc::ENAMETOOLONG,
            libc::ENFILE,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOSPC,
            libc::ENOTDIR,
            libc::EROFS,
        ],
        sample: &["/no/such/file", "r"],
        parse: parse_fopen,
    },
    CallEntry {
        name: "fdopen",
        synopsis: "fildes mode",
        errnos: &[libc::EBADF, libc::EINVAL, libc::ENOMEM],
        sample: &["0", "w"],
        parse: parse_fdopen,
    },
    CallEntry {
        name: "fclose",
        synopsis: "fp",
        errnos: STREAM_ERRNOS,
        sample: &["/dev/null"],
        parse: parse_fclose,
    },
    CallEntry {
        name: "fflush",
        synopsis: "fp",
        errnos: STREAM_ERRNOS,
        sample: &["/dev/null"],
        parse: parse_fflush,
    },
    CallEntry {
        name: "fread",
        synopsis: "fp size [nmemb [ptr]]",
        errnos: STREAM_READ_ERRNOS,
        sample: &["/dev/null", "1", "100"],
        parse: parse_fread,
    },
    CallEntry {
        name: "fwrite",
        synopsis: "fp size [nmemb [ptr]]",
        errnos: STREAM_ERRNOS,
        sample: &["/dev/null", "1", "100"],
        parse: parse_fwrite,
    },
    CallEntry {
        name: "fgetc",
        synopsis: "fp",
        errnos: STREAM_READ_ERRNOS,
        sample: &["/dev/null"],
        parse: parse_fgetc,
    },
    CallEntry {
        name: "fputc",
        synopsis: "c fp",
        errnos: STREAM_ERRNOS,
        sample: &["x", "/dev/null"],
        parse: parse_fputc,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::ffi::CString;

    fn explain(explainer: &dyn Explainer, errnum: c_int) -> (String, String) {
        let mut call = StringBuffer::new(1024, Options::default());
        explainer.render_call(&mut call, errnum);
        let mut cause = StringBuffer::with_footnotes(4096, Options::default());
        explainer.render_cause(&mut cause, errnum);
        let notes = cause.footnotes().map(|n| n.as_str().to_string()).unwrap_or_default();
        (call.as_str().to_string(), format!("{}{}", cause.as_str(), notes))
    }

    #[test]
    fn mode_strings_map_to_open_flags() {
        assert_eq!(mode_flags(b"r"), Some(libc::O_RDONLY));
        assert_eq!(mode_flags(b"rb+"), Some(libc::O_RDWR));
        assert_eq!(mode_flags(b"a"), Some(libc::O_WRONLY | libc::O_CREAT | libc::O_APPEND));
        assert_eq!(mode_flags(b"wxe"), Some(libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC | libc::O_EXCL | libc::O_CLOEXEC));
        assert_eq!(mode_flags(b"q"), None);
        assert_eq!(mode_flags(b""), None);
    }

    #[test]
    fn fopen_bad_mode() {
        let path = CString::new("/tmp").unwrap();
        let mode = CString::new("z").unwrap();
        let fopen = Fopen {
            pathname: path.as_ptr(),
            mode: mode.as_ptr(),
        };
        let (call, cause) = explain(&fopen, libc::EINVAL);
        assert_eq!(call, "fopen(pathname = \"/tmp\", mode = \"z\")");
        assert!(cause.starts_with("the mode argument \"z\" is not valid"), "{cause}");
    }

    #[test]
    fn fopen_missing_file_reuses_open_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = CString::new(dir.path().join("absent").to_str().unwrap()).unwrap();
        let mode = CString::new("r").unwrap();
        let fopen = Fopen {
            pathname: path.as_ptr(),
            mode: mode.as_ptr(),
        };
        let (_, cause) = explain(&fopen, libc::ENOENT);
        assert!(cause.contains("\"absent\""), "{cause}");
        assert!(cause.contains("the mode argument corresponds to O_RDONLY"), "{cause}");
    }

    #[test]
    fn fread_on_write_only_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = CString::new(dir.path().join("out").to_str().unwrap()).unwrap();
        let mode = CString::new("w").unwrap();
        // SAFETY: both strings are NUL terminated.
        let fp = unsafe { libc::fopen(path.as_ptr(), mode.as_ptr()) };
        assert!(!fp.is_null());
        let mut data = [0u8; 8];
        let fread = Transfer {
            writing: false,
            data: data.as_mut_ptr() as *const c_void,
            size: 1,
            nmemb: 8,
            fp,
        };
        let (_, cause) = explain(&fread, libc::EBADF);
        // SAFETY: fp is open and closed exactly once.
        unsafe { libc::fclose(fp) };
        assert!(cause.starts_with("the fp argument is not open for reading, it was opened O_WRONLY"), "{cause}");
    }

    #[test]
    fn null_stream_is_not_a_stream() {
        let fclose = StreamOnly {
            name: "fclose",
            fp: std::ptr::null_mut(),
        };
        let (call, cause) = explain(&fclose, libc::EBADF);
        assert_eq!(call, "fclose(fp = NULL)");
        assert!(cause.starts_with("the fp argument does not refer to a valid stream"), "{cause}");
    }

    #[test]
    fn fputc_shows_the_character() {
        let fputc = Fputc {
            c: c_int::from(b'x'),
            fp: std::ptr::null_mut(),
        };
        let mut sb = StringBuffer::new(256, Options::default());
        fputc.render_call(&mut sb, libc::EBADF);
        assert_eq!(sb.as_str(), "fputc(c = 'x', fp = NULL)");
    }
}
