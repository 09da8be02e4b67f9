/*============================================================
  Synavera Project: Explain
  Module: explain_core::calls
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Per-call explainers: the Explainer trait, the call echo
    builder, textual argument parsing for the CLI, and the
    immutable registry mapping call names to parsers.

  Security / Safety Notes:
    Call descriptors hold the caller's raw pointers; every
    dereference goes through the fault-safe probe. Parsed CLI
    calls own the storage their pointers refer to.

  Dependencies:
    analysers, render, parse_bits, error.

  Operational Scope:
    Every named call the library can explain.

  Revision History:
    2026-10-18 COD  Authored explainer trait and registry.
    2026-10-18 COD  Overlong pathname echoes are cut.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Registry is data: name, synopsis, documented errors, parser
    - Argument text parsed with the same tables that render it
============================================================*/

pub mod directory;
pub mod file_io;
pub mod memory;
pub mod network;
pub mod process;
pub mod stdio;
pub mod time;

use std::ffi::CString;
use std::fmt::{Display, Write};
use std::fs::{File, OpenOptions};
use std::os::raw::{c_char, c_int, c_void};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::ptr::NonNull;
use std::sync::OnceLock;

use crate::analysers::{self, efault};
use crate::error::{ExplainError, Result};
use crate::fstrcmp::best_match;
use crate::parse_bits::{self, BitsTable, ParseBitsError};
use crate::path_resolution::FinalComponent;
use crate::probe;
use crate::render;
use crate::string_buffer::StringBuffer;

/// Argument renderer and cause analyser for one call.
pub trait Explainer {
    /// Call name as it appears in messages.
    fn name(&self) -> &'static str;

    /// Echo the call: `open(pathname = "/x", flags = O_RDONLY)`.
    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int);

    /// Write the "because" clause for `errnum`.
    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int);

    /// Describe data the call produced; only meaningful on success.
    fn render_returned(&self, _sb: &mut StringBuffer) {}
}

/// Builder for `name(caption = value, ...)`.
pub struct Echo<'a> {
    sb: &'a mut StringBuffer,
    count: usize,
}

impl<'a> Echo<'a> {
    pub fn new(sb: &'a mut StringBuffer, name: &str) -> Self {
        sb.puts(name);
        sb.putc('(');
        Self { sb, count: 0 }
    }

    /// One argument rendered by `render`.
    pub fn arg<F>(mut self, caption: &str, render: F) -> Self
    where
        F: FnOnce(&mut StringBuffer),
    {
        if self.count > 0 {
            self.sb.puts(", ");
        }
        self.sb.puts(caption);
        self.sb.puts(" = ");
        render(self.sb);
        self.count += 1;
        self
    }

    pub fn value<T: Display>(self, caption: &str, value: T) -> Self {
        self.arg(caption, |sb| {
            let _ = write!(sb, "{value}");
        })
    }

    /// A C string argument, quoted when readable.
    pub fn string(self, caption: &str, ptr: *const c_char) -> Self {
        self.arg(caption, |sb| sb.puts_quoted_ptr(ptr))
    }

    /// A pathname argument; shown as a bare pointer when it faulted,
    /// and cut after [`PATH_ECHO_MAX`] bytes.
    pub fn path(self, caption: &str, ptr: *const c_char, errnum: c_int) -> Self {
        if errnum == libc::EFAULT {
            return self.pointer(caption, ptr as *const c_void);
        }
        self.arg(caption, |sb| quote_path(sb, ptr))
    }

    pub fn fildes(self, caption: &str, fildes: c_int) -> Self {
        self.arg(caption, |sb| render::fildes::fildes(sb, fildes))
    }

    pub fn pointer(self, caption: &str, ptr: *const c_void) -> Self {
        self.arg(caption, |sb| render::pointer::pointer(sb, ptr))
    }

    pub fn bits(self, caption: &str, value: i64, table: &BitsTable) -> Self {
        self.arg(caption, |sb| parse_bits::print(sb, value, table))
    }

    pub fn single(self, caption: &str, value: i64, table: &BitsTable) -> Self {
        self.arg(caption, |sb| parse_bits::print_single(sb, value, table))
    }

    pub fn finish(self) {
        self.sb.putc(')');
    }
}

/// Longest pathname echoed in full; beyond this the call echo would
/// crowd the cause out of the message.
pub const PATH_ECHO_MAX: usize = 1024;

/// `"/a/b..."... (5000 bytes)` for overlong pathnames.
fn quote_path(sb: &mut StringBuffer, ptr: *const c_char) {
    let Some(probed) = probe::read_c_string(ptr, probe::STRING_PROBE_LIMIT) else {
        render::pointer::pointer(sb, ptr as *const c_void);
        return;
    };
    if probed.bytes.len() <= PATH_ECHO_MAX {
        sb.puts_quoted(&probed.bytes);
        if !probed.terminated {
            sb.puts("...");
        }
        return;
    }
    sb.puts_quoted(&probed.bytes[..PATH_ECHO_MAX]);
    sb.puts("...");
    if probed.terminated {
        let _ = write!(sb, " ({} bytes)", probed.bytes.len());
    }
}

/// Bytes of a string argument that is readable and terminated.
pub fn probe_string(ptr: *const c_char) -> Option<Vec<u8>> {
    probe::read_c_string(ptr, probe::STRING_PROBE_LIMIT)
        .filter(|probed| probed.terminated)
        .map(|probed| probed.bytes)
}

/// Path bytes, or the EFAULT explanation when they cannot be read.
pub(crate) fn readable_path(sb: &mut StringBuffer, ptr: *const c_char, caption: &str) -> Option<Vec<u8>> {
    let path = probe_string(ptr);
    if path.is_none() {
        efault(sb, caption);
    }
    path
}

/// `path` as seen from `dirfd`, for the `*at` family.
pub(crate) fn resolve_at(dirfd: c_int, path: &[u8]) -> Vec<u8> {
    if dirfd == libc::AT_FDCWD || path.first() == Some(&b'/') {
        return path.to_vec();
    }
    match probe::fildes_to_path(dirfd) {
        Some(dir) => {
            let mut full = dir.as_os_str().as_bytes().to_vec();
            if !path.is_empty() {
                full.push(b'/');
                full.extend_from_slice(path);
            }
            full
        }
        None => path.to_vec(),
    }
}

/// Raw bytes of a plain C struct, for payloads built from text.
pub(crate) fn struct_bytes<T: Copy>(value: &T) -> Vec<u8> {
    // SAFETY: T is a plain C struct; viewing it as bytes is sound.
    unsafe { std::slice::from_raw_parts(value as *const T as *const u8, std::mem::size_of::<T>()) }.to_vec()
}

/// Causes shared by every call that resolves a pathname. False when
/// `errnum` is not one of them.
pub(crate) fn path_errno(
    sb: &mut StringBuffer,
    errnum: c_int,
    path: &[u8],
    caption: &str,
    fc: &FinalComponent,
) -> bool {
    match errnum {
        libc::ENOENT => analysers::enoent(sb, path, caption, fc),
        libc::ENOTDIR => analysers::enotdir(sb, path, caption, fc),
        libc::EACCES => analysers::eacces(sb, path, caption, fc),
        libc::ELOOP => analysers::eloop(sb, path, caption, fc),
        libc::ENAMETOOLONG => analysers::enametoolong(sb, path, caption, fc),
        libc::EROFS => analysers::erofs(sb, path, caption),
        libc::EIO => analysers::eio_path(sb, path),
        libc::ENOMEM => analysers::enomem_kernel(sb),
        libc::EFAULT => efault(sb, caption),
        _ => return false,
    }
    true
}

/// A `FILE *` opened for a CLI-parsed call, closed on drop.
struct OwnedStream(NonNull<libc::FILE>);

impl Drop for OwnedStream {
    fn drop(&mut self) {
        let _guard = probe::ErrnoGuard::new();
        // SAFETY: the stream came from fopen/fdopen and is closed once.
        unsafe {
            libc::fclose(self.0.as_ptr());
        }
    }
}

/// Storage kept alive for the pointers of a CLI-parsed call.
#[derive(Default)]
pub struct Storage {
    strings: Vec<CString>,
    buffers: Vec<Vec<u8>>,
    vectors: Vec<Vec<*const c_char>>,
    files: Vec<File>,
    streams: Vec<OwnedStream>,
}

/// Size of the scratch buffer handed to calls whose buffer argument
/// was left to the CLI.
pub const SCRATCH_BUFFER: usize = 64 * 1024;

/// Cursor over the textual arguments of one call.
pub struct Args<'a> {
    call: &'static str,
    synopsis: &'static str,
    words: &'a [String],
    next: usize,
    storage: Storage,
}

fn parse_error(caption: &str, text: &str, err: ParseBitsError) -> ExplainError {
    ExplainError::parse(caption, text, err.to_string())
}

impl<'a> Args<'a> {
    pub fn new(call: &'static str, synopsis: &'static str, words: &'a [String]) -> Self {
        Self {
            call,
            synopsis,
            words,
            next: 0,
            storage: Storage::default(),
        }
    }

    fn count_error(&self) -> ExplainError {
        ExplainError::ArgumentCount {
            call: self.call.to_string(),
            expected: self.synopsis.to_string(),
            given: self.words.len(),
        }
    }

    fn word(&mut self) -> Result<&'a str> {
        let word = self.words.get(self.next).ok_or_else(|| self.count_error())?;
        self.next += 1;
        Ok(word.as_str())
    }

    /// Next word, if any remain.
    pub fn optional(&mut self) -> Option<&'a str> {
        let word = self.words.get(self.next)?;
        self.next += 1;
        Some(word.as_str())
    }

    /// Next word without consuming it.
    pub fn peek(&self) -> Option<&'a str> {
        self.words.get(self.next).map(String::as_str)
    }

    pub fn has_more(&self) -> bool {
        self.next < self.words.len()
    }

    fn address(text: &str) -> Option<usize> {
        if text == "NULL" {
            return Some(0);
        }
        let number = text.strip_prefix('@')?;
        parse_bits::parse_c_integer(number).map(|v| v as usize)
    }

    fn keep_string(&mut self, caption: &str, text: &str) -> Result<*const c_char> {
        let c = CString::new(text).map_err(|err| ExplainError::parse(caption, text, err.to_string()))?;
        let ptr = c.as_ptr();
        self.storage.strings.push(c);
        Ok(ptr)
    }

    /// A string argument. `NULL` and `@0x...` give raw pointers.
    pub fn string(&mut self, caption: &str) -> Result<*const c_char> {
        let text = self.word()?;
        match Self::address(text) {
            Some(address) => Ok(address as *const c_char),
            None => self.keep_string(caption, text),
        }
    }

    pub fn long(&mut self, caption: &str) -> Result<i64> {
        let text = self.word()?;
        parse_bits::parse_c_integer(text).ok_or_else(|| ExplainError::parse(caption, text, "not a number"))
    }

    pub fn int(&mut self, caption: &str) -> Result<c_int> {
        self.long(caption).map(|v| v as c_int)
    }

    pub fn size(&mut self, caption: &str) -> Result<usize> {
        let text = self.word()?;
        match parse_bits::parse_c_integer(text) {
            Some(v) if v >= 0 => Ok(v as usize),
            _ => Err(ExplainError::parse(caption, text, "not a size")),
        }
    }

    /// Optional size, `default` when absent.
    pub fn size_or(&mut self, caption: &str, default: usize) -> Result<usize> {
        if self.has_more() {
            self.size(caption)
        } else {
            Ok(default)
        }
    }

    /// Symbolic flags or enumeration text parsed with `table`.
    pub fn symbolic(&mut self, caption: &str, table: &BitsTable) -> Result<i64> {
        let text = self.word()?;
        parse_bits::parse(text, table).map_err(|err| parse_error(caption, text, err))
    }

    /// Optional symbolic value, `default` when absent.
    pub fn symbolic_or(&mut self, caption: &str, table: &BitsTable, default: i64) -> Result<i64> {
        if self.has_more() {
            self.symbolic(caption, table)
        } else {
            Ok(default)
        }
    }

    /// Text parsed by a dedicated parser such as `parse_open_flags`.
    pub fn parsed<T>(&mut self, caption: &str, parse: fn(&str) -> std::result::Result<T, ParseBitsError>) -> Result<T> {
        let text = self.word()?;
        parse(text).map_err(|err| parse_error(caption, text, err))
    }

    /// A file mode: octal literal or `S_IRUSR | S_IWUSR` names.
    pub fn mode(&mut self, caption: &str) -> Result<libc::mode_t> {
        let table: Vec<parse_bits::BitsEntry> = render::mode::FILE_TYPE_BITS
            .iter()
            .chain(render::mode::PERMISSION_BITS.iter())
            .copied()
            .collect();
        self.symbolic(caption, &table).map(|v| v as libc::mode_t)
    }

    pub fn mode_or(&mut self, caption: &str, default: libc::mode_t) -> Result<libc::mode_t> {
        if self.has_more() {
            self.mode(caption)
        } else {
            Ok(default)
        }
    }

    /// A descriptor: a number, `stdin`/`stdout`/`stderr`, or a path
    /// that is opened and kept open for the life of the call.
    pub fn fildes(&mut self, caption: &str) -> Result<c_int> {
        let text = self.word()?;
        match text {
            "stdin" => return Ok(libc::STDIN_FILENO),
            "stdout" => return Ok(libc::STDOUT_FILENO),
            "stderr" => return Ok(libc::STDERR_FILENO),
            "AT_FDCWD" => return Ok(libc::AT_FDCWD),
            _ => {}
        }
        if let Some(number) = parse_bits::parse_c_integer(text) {
            return Ok(number as c_int);
        }
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY)
            .open(text)
            .map_err(|err| ExplainError::Filesystem(format!("{caption} {text}: {err}")))?;
        let fd = file.as_raw_fd();
        self.storage.files.push(file);
        Ok(fd)
    }

    /// A buffer pointer. Absent or `-` hands over a scratch buffer of
    /// `SCRATCH_BUFFER` bytes; `NULL` and `@0x...` give raw pointers.
    pub fn buffer(&mut self, caption: &str) -> Result<*mut c_void> {
        let text = self.optional().unwrap_or("-");
        if text == "-" {
            let mut buffer = vec![0u8; SCRATCH_BUFFER];
            let ptr = buffer.as_mut_ptr() as *mut c_void;
            self.storage.buffers.push(buffer);
            return Ok(ptr);
        }
        match Self::address(text).or_else(|| parse_bits::parse_c_integer(text).map(|v| v as usize)) {
            Some(address) => Ok(address as *mut c_void),
            None => Err(ExplainError::parse(caption, text, "expected NULL, - or an address")),
        }
    }

    /// Bytes copied into owned storage, for payloads given as text.
    pub fn bytes(&mut self, data: &[u8]) -> *const c_void {
        let buffer = data.to_vec();
        let ptr = buffer.as_ptr() as *const c_void;
        self.storage.buffers.push(buffer);
        ptr
    }

    /// A `FILE *`: `NULL`, `@0x...`, a descriptor (opened with a mode
    /// matching its access mode) or a path opened for reading.
    pub fn stream(&mut self, caption: &str) -> Result<*mut libc::FILE> {
        let text = self.word()?;
        if let Some(address) = Self::address(text) {
            return Ok(address as *mut libc::FILE);
        }
        let descriptor = match text {
            "stdin" => Some(libc::STDIN_FILENO),
            "stdout" => Some(libc::STDOUT_FILENO),
            "stderr" => Some(libc::STDERR_FILENO),
            _ => parse_bits::parse_c_integer(text).map(|v| v as c_int),
        };
        let _guard = probe::ErrnoGuard::new();
        let fp = match descriptor {
            Some(fd) => {
                let mode: &[u8] = match probe::file_status_flags(fd).map(|f| f & libc::O_ACCMODE) {
                    Some(libc::O_WRONLY) => b"w\0",
                    Some(libc::O_RDWR) => b"r+\0",
                    Some(_) => b"r\0",
                    None => return Err(ExplainError::Filesystem(format!("{caption} {text}: not an open descriptor"))),
                };
                // SAFETY: dup has no memory preconditions.
                let copy = unsafe { libc::dup(fd) };
                if copy < 0 {
                    return Err(ExplainError::Filesystem(format!("{caption} {text}: cannot duplicate")));
                }
                // SAFETY: copy is an open descriptor and mode is NUL terminated.
                let fp = unsafe { libc::fdopen(copy, mode.as_ptr() as *const c_char) };
                if fp.is_null() {
                    // SAFETY: copy is ours and was not adopted by a stream.
                    unsafe { libc::close(copy) };
                }
                fp
            }
            None => {
                let path = CString::new(text).map_err(|err| ExplainError::parse(caption, text, err.to_string()))?;
                // SAFETY: both arguments are NUL-terminated strings.
                unsafe { libc::fopen(path.as_ptr(), b"r\0".as_ptr() as *const c_char) }
            }
        };
        let fp = NonNull::new(fp).ok_or_else(|| ExplainError::Filesystem(format!("{caption} {text}: cannot open")))?;
        self.storage.streams.push(OwnedStream(fp));
        Ok(fp.as_ptr())
    }

    /// Remaining words as a NULL-terminated `char *[]`.
    pub fn string_list(&mut self, caption: &str) -> Result<*const *const c_char> {
        let mut list = Vec::new();
        while let Some(word) = self.optional() {
            list.push(self.keep_string(caption, word)?);
        }
        list.push(std::ptr::null());
        let ptr = list.as_ptr();
        self.storage.vectors.push(list);
        Ok(ptr)
    }

    /// The current environment as a NULL-terminated `char *[]`.
    pub fn environment(&mut self) -> *const *const c_char {
        let mut list = Vec::new();
        for (key, value) in std::env::vars_os() {
            let mut entry = key.as_bytes().to_vec();
            entry.push(b'=');
            entry.extend_from_slice(value.as_bytes());
            if let Ok(c) = CString::new(entry) {
                list.push(c.as_ptr());
                self.storage.strings.push(c);
            }
        }
        list.push(std::ptr::null());
        let ptr = list.as_ptr();
        self.storage.vectors.push(list);
        ptr
    }

    /// Signal by name (`SIGTERM`, `TERM`) or number.
    pub fn signal(&mut self, caption: &str) -> Result<c_int> {
        let text = self.word()?;
        let table = render::process::signal_table();
        if let Ok(value) = parse_bits::parse(text, table) {
            return Ok(value as c_int);
        }
        let prefixed = format!("SIG{}", text.to_ascii_uppercase());
        parse_bits::parse(&prefixed, table)
            .map(|v| v as c_int)
            .map_err(|err| parse_error(caption, text, err))
    }

    /// Finish parsing; leftover words are an error.
    pub fn finish(self) -> Result<Storage> {
        if self.has_more() {
            return Err(self.count_error());
        }
        Ok(self.storage)
    }
}

/// Parser turning argument text into an explainer.
pub type ParseFn = fn(&mut Args<'_>) -> Result<Box<dyn Explainer>>;

/// One registered call.
pub struct CallEntry {
    pub name: &'static str,
    /// Argument list as typed on the command line.
    pub synopsis: &'static str,
    /// Error numbers the call documents.
    pub errnos: &'static [c_int],
    /// A typical invocation, used in listings and self-checks.
    pub sample: &'static [&'static str],
    pub parse: ParseFn,
}

/// A call parsed from text together with the storage it points into.
pub struct ParsedCall {
    explainer: Box<dyn Explainer>,
    _storage: Storage,
}

impl ParsedCall {
    pub fn explainer(&self) -> &dyn Explainer {
        self.explainer.as_ref()
    }
}

/// Every registered call, sorted by name.
pub fn registry() -> &'static [&'static CallEntry] {
    static REGISTRY: OnceLock<Vec<&'static CallEntry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut entries: Vec<&'static CallEntry> = file_io::CALLS
            .iter()
            .chain(directory::CALLS.iter())
            .chain(process::CALLS.iter())
            .chain(memory::CALLS.iter())
            .chain(network::CALLS.iter())
            .chain(stdio::CALLS.iter())
            .chain(time::CALLS.iter())
            .chain(crate::ioctl::CALLS.iter())
            .collect();
        entries.sort_by_key(|entry| entry.name);
        entries
    })
}

pub fn find(name: &str) -> Option<&'static CallEntry> {
    registry().iter().copied().find(|entry| entry.name == name)
}

/// Closest registered name, for "did you mean" hints.
pub fn suggest(name: &str) -> Option<&'static str> {
    best_match(name, registry().iter().map(|entry| entry.name))
}

/// Parse `words` as the arguments of the call `name`.
pub fn parse(name: &str, words: &[String]) -> Result<ParsedCall> {
    let entry = find(name).ok_or_else(|| ExplainError::UnknownCall { name: name.to_string() })?;
    let mut args = Args::new(entry.name, entry.synopsis, words);
    let explainer = (entry.parse)(&mut args)?;
    let storage = args.finish()?;
    Ok(ParsedCall {
        explainer,
        _storage: storage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn echo_joins_arguments() {
        let mut sb = StringBuffer::new(256, Options::default());
        Echo::new(&mut sb, "lseek")
            .value("fildes", 3)
            .value("offset", 0)
            .single("whence", 2, render::open_flags::whence_table())
            .finish();
        assert_eq!(sb.as_str(), "lseek(fildes = 3, offset = 0, whence = SEEK_END)");
    }

    #[test]
    fn overlong_paths_are_cut_in_the_echo() {
        let long = CString::new(format!("/{}", "d/".repeat(2500))).unwrap();
        let mut sb = StringBuffer::new(8192, Options::default());
        Echo::new(&mut sb, "open").path("pathname", long.as_ptr(), libc::ENAMETOOLONG).finish();
        let text = sb.as_str();
        assert!(text.starts_with("open(pathname = \"/d/d/"), "{text}");
        assert!(text.ends_with("\"... (5001 bytes))"), "{text}");
        assert!(text.len() < PATH_ECHO_MAX + 64, "{}", text.len());

        let short = CString::new("/etc/passwd").unwrap();
        let mut sb = StringBuffer::new(256, Options::default());
        Echo::new(&mut sb, "open").path("pathname", short.as_ptr(), libc::ENOENT).finish();
        assert_eq!(sb.as_str(), "open(pathname = \"/etc/passwd\")");
    }

    #[test]
    fn registry_names_are_unique_and_sorted() {
        let names: Vec<&str> = registry().iter().map(|e| e.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
        assert!(find("open").is_some());
        assert_eq!(suggest("opne"), Some("open"));
    }

    #[test]
    fn every_sample_parses() {
        for entry in registry() {
            let sample = words(entry.sample);
            assert!(parse(entry.name, &sample).is_ok(), "{} {:?}", entry.name, entry.sample);
        }
    }

    #[test]
    fn missing_arguments_are_reported() {
        let err = parse("close", &[]).err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("close"), "{err}");
        let extra = parse("close", &words(&["1", "2"]));
        assert!(matches!(extra, Err(ExplainError::ArgumentCount { .. })));
    }

    #[test]
    fn raw_addresses_and_null() {
        let list = words(&["NULL", "@0x10", "plain"]);
        let mut args = Args::new("t", "", &list);
        assert!(args.string("a").unwrap().is_null());
        assert_eq!(args.string("b").unwrap() as usize, 0x10);
        assert!(!args.string("c").unwrap().is_null());
        assert!(args.finish().is_ok());
    }

    #[test]
    fn descriptors_by_name_or_path() {
        let list = words(&["stderr", "/dev/null"]);
        let mut args = Args::new("t", "", &list);
        assert_eq!(args.fildes("fildes").unwrap(), 2);
        let fd = args.fildes("fildes").unwrap();
        assert!(probe::is_open(fd));
    }

    #[test]
    fn streams_are_opened_and_kept() {
        let list = words(&["/dev/null", "NULL"]);
        let mut args = Args::new("t", "", &list);
        let fp = args.stream("fp").unwrap();
        assert!(render::fildes::stream_fileno(fp).is_some());
        assert!(args.stream("fp").unwrap().is_null());
        assert!(args.finish().is_ok());
    }
}
