/*============================================================
  Synavera Project: Explain
  Module: explain_core::ioctl
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    The ioctl multiplexer: pick the registry entry for the
    request and descriptor, echo the call with the payload
    rendered by type, explain the failure, and check the
    registry for internal conflicts.

  Security / Safety Notes:
    The descriptor is only fstat'ed and isatty'ed; the payload
    is read through the fault-safe probe.

  Dependencies:
    ioctl::{request, table}, analysers, capability, calls.

  Operational Scope:
    Every ioctl request, named or not.

  Revision History:
    2026-10-18 COD  Authored ioctl explainer and registry check.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Unknown requests still get an echo and a cause
    - Registry conflicts are reported, never silently resolved
============================================================*/

pub mod request;
pub mod table;

use std::collections::BTreeMap;
use std::fmt::Write;
use std::os::raw::{c_int, c_void};

use crate::analysers::holders::path_to_pid;
use crate::analysers::path::erofs_fildes;
use crate::analysers::socket::enotsock;
use crate::analysers::{ebadf, efault, eio_fildes, enosys_fildes, generic, software_error};
use crate::calls::{Args, CallEntry, Echo, Explainer};
use crate::capability::{self, Capability};
use crate::error::{ExplainError, Result};
use crate::fstrcmp::best_match;
use crate::parse_bits;
use crate::probe::{self, ErrnoGuard};
use crate::render::file_type::file_type_st;
use crate::render::pointer::pointer;
use crate::string_buffer::StringBuffer;

use request::{Direction, Encoded, SIZE_MASK};
use table::{Family, Flow, Ifreq, IfreqField, IoctlEntry, IoctlFlags, Payload, ENTRIES, IFNAMSIZ};

pub use table::find;

fn is_terminal(fildes: c_int) -> bool {
    let _guard = ErrnoGuard::new();
    // SAFETY: isatty takes no pointers.
    unsafe { libc::isatty(fildes) == 1 }
}

/// `the fildes argument does not refer to a terminal, it is a regular file`.
fn wrong_kind(sb: &mut StringBuffer, fildes: c_int, what: &str) {
    let _ = write!(sb, "the fildes argument does not refer to {what}");
    if let Ok(st) = probe::fstat(fildes) {
        sb.puts(", it is a ");
        file_type_st(sb, &st);
    }
}

pub struct Ioctl {
    pub fildes: c_int,
    pub request: u64,
    pub data: *const c_void,
}

impl Ioctl {
    fn entry(&self) -> Option<&'static IoctlEntry> {
        find(self.request, self.fildes)
    }

    fn request_name(&self, sb: &mut StringBuffer) {
        match self.entry() {
            Some(entry) => sb.puts(entry.name),
            None => request::render(sb, self.request),
        }
    }

    /// `ioctl TCGETS`, the name causes use for the request.
    fn call_name(&self, sb: &StringBuffer) -> String {
        let mut name = sb.scratch();
        name.puts("ioctl ");
        self.request_name(&mut name);
        name.into_string()
    }

    fn not_supported(&self, sb: &mut StringBuffer, name: &str) {
        let st = probe::fstat(self.fildes).ok();
        let kind = st.map(|st| st.st_mode & libc::S_IFMT);
        match self.entry().map(|entry| entry.family) {
            Some(Family::Terminal) if !is_terminal(self.fildes) => wrong_kind(sb, self.fildes, "a terminal"),
            Some(Family::Console) if !is_terminal(self.fildes) => wrong_kind(sb, self.fildes, "a virtual console"),
            Some(Family::Socket) if kind.is_some_and(|k| k != libc::S_IFSOCK) => {
                enotsock(sb, self.fildes, "fildes")
            }
            Some(Family::Block) if kind.is_some_and(|k| k != libc::S_IFBLK) => {
                wrong_kind(sb, self.fildes, "a block special device")
            }
            _ => enosys_fildes(sb, self.fildes, "fildes", name),
        }
    }

    fn einval(&self, sb: &mut StringBuffer) {
        let wants_pointer = self.entry().map_or(true, |entry| entry.payload.is_pointer());
        if self.data.is_null() && wants_pointer {
            sb.puts("the data argument is the NULL pointer");
            software_error(sb);
        } else {
            sb.puts("the ioctl request or the ioctl data is not valid");
        }
    }
}

impl Explainer for Ioctl {
    fn name(&self) -> &'static str {
        "ioctl"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        let entry = self.entry();
        Echo::new(sb, "ioctl")
            .fildes("fildes", self.fildes)
            .arg("request", |sb| self.request_name(sb))
            .arg("data", |sb| match entry {
                Some(entry) if errnum != libc::EFAULT => entry.payload.render_argument(sb, self.data, entry.flow),
                _ => pointer(sb, self.data),
            })
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let name = self.call_name(sb);
        match errnum {
            libc::EACCES => {
                let _ = write!(sb, "the process does not have permission to use the {name} system call");
                capability::explain_if_missing(sb, Capability::SysAdmin);
            }
            libc::EBADF => ebadf(sb, self.fildes, "fildes"),
            libc::EBUSY => {
                let _ = write!(sb, "the {name} system call cannot be performed because fildes is in use");
                if let Ok(st) = probe::fstat(self.fildes) {
                    path_to_pid(sb, &st);
                }
            }
            libc::EFAULT => efault(sb, "data"),
            libc::EINVAL => self.einval(sb),
            libc::EIO => eio_fildes(sb, self.fildes),
            libc::ENOMEDIUM => sb.puts("there is no medium present in the device referred to by fildes"),
            libc::ENOTTY | libc::ENOSYS | libc::EOPNOTSUPP => self.not_supported(sb, &name),
            libc::EPERM => match self.entry().and_then(|entry| entry.requires) {
                Some(cap) => {
                    let _ = write!(sb, "the {name} system call requires a privileged process");
                    capability::explain_missing(sb, cap);
                }
                None => generic(sb, errnum, &name),
            },
            libc::EROFS => erofs_fildes(sb, self.fildes, "fildes"),
            _ => generic(sb, errnum, &name),
        }
    }

    fn render_returned(&self, sb: &mut StringBuffer) {
        let Some(entry) = self.entry().filter(|entry| entry.flow.is_output()) else {
            return;
        };
        let mut value = sb.scratch();
        if entry.payload.render_returned(&mut value, self.data) {
            sb.puts("data = ");
            sb.puts(value.as_str());
        }
    }
}

/// Inconsistencies in the registry, one line each. Empty when the
/// registry is sound.
pub fn check_conflicts() -> Vec<String> {
    let mut problems = Vec::new();
    for entry in ENTRIES.iter() {
        if entry.request == 0 {
            problems.push(format!("{} has a zero request number", entry.name));
            continue;
        }
        let Some(enc) = Encoded::decode(entry.request) else {
            problems.push(format!("{} does not fit in 32 bits", entry.name));
            continue;
        };
        if enc.size == SIZE_MASK {
            problems.push(format!("{} encodes a bogus size", entry.name));
        }
        if entry.flags.contains(IoctlFlags::LEGACY) || entry.flags.contains(IoctlFlags::SIZE_DOES_NOT_AGREE) {
            continue;
        }
        let declared = entry.payload.size();
        if enc.dir.is_empty() {
            if declared != 0 {
                problems.push(format!("{} is _IOC_NONE but declares a {declared} byte payload", entry.name));
            }
        } else if enc.size as usize != declared {
            problems.push(format!(
                "{} encodes a {} byte payload but declares {declared}",
                entry.name, enc.size
            ));
        }
        if enc.dir.contains(Direction::READ) && !entry.flow.is_output() {
            problems.push(format!("{} is read by the caller but its payload is not an output", entry.name));
        }
        if enc.dir.contains(Direction::WRITE) && !matches!(entry.flow, Flow::In | Flow::InOut) {
            problems.push(format!("{} is written by the caller but its payload is not an input", entry.name));
        }
    }

    let mut by_number: BTreeMap<u64, Vec<&IoctlEntry>> = BTreeMap::new();
    for entry in ENTRIES.iter() {
        by_number.entry(entry.request).or_default().push(entry);
    }
    for (number, entries) in by_number.iter().filter(|(_, entries)| entries.len() > 1) {
        let names: Vec<&str> = entries.iter().map(|entry| entry.name).collect();
        let undecided = entries.iter().filter(|entry| entry.applies.is_none()).count();
        let preferred = entries.iter().filter(|entry| entry.flags.contains(IoctlFlags::PREFERRED)).count();
        if undecided > 1 {
            problems.push(format!("{} share 0x{number:X} without disambiguators", names.join(", ")));
        }
        if preferred > 1 {
            problems.push(format!("{} share 0x{number:X} and are all preferred", names.join(", ")));
        }
    }
    problems
}

fn parse_request(text: &str) -> Result<u64> {
    if let Some(entry) = table::find_by_name(text) {
        return Ok(entry.request);
    }
    match parse_bits::parse_c_integer(text) {
        Some(value) if value < 0 => Ok(u64::from(value as i32 as u32)),
        Some(value) => Ok(value as u64),
        None => {
            let reason = match best_match(text, ENTRIES.iter().map(|entry| entry.name)) {
                Some(name) => format!("unknown ioctl request, did you mean \"{name}\"?"),
                None => "unknown ioctl request".to_string(),
            };
            Err(ExplainError::parse("request", text, reason))
        }
    }
}

fn int_bytes(args: &mut Args<'_>, value: i64, payload: Payload) -> *const c_void {
    match payload {
        Payload::ULong => args.bytes(&(value as libc::c_ulong).to_ne_bytes()),
        Payload::U64 => args.bytes(&(value as u64).to_ne_bytes()),
        _ => args.bytes(&(value as c_int).to_ne_bytes()),
    }
}

/// `24x80` as a winsize.
fn parse_winsize(text: &str) -> Result<libc::winsize> {
    let (rows, cols) = text
        .split_once('x')
        .ok_or_else(|| ExplainError::parse("data", text, "expected ROWSxCOLS"))?;
    let number = |part: &str| {
        part.parse::<u16>()
            .map_err(|_| ExplainError::parse("data", text, "expected ROWSxCOLS"))
    };
    Ok(libc::winsize {
        ws_row: number(rows)?,
        ws_col: number(cols)?,
        ws_xpixel: 0,
        ws_ypixel: 0,
    })
}

fn parse_ifreq(args: &mut Args<'_>, field: IfreqField, flow: Flow) -> Result<*const c_void> {
    let text = args.optional().unwrap_or("lo");
    let mut req = Ifreq::default();
    if field == IfreqField::NameByIndex {
        let index = parse_bits::parse_c_integer(text)
            .ok_or_else(|| ExplainError::parse("data", text, "expected an interface index"))?;
        req.ifr_ifru[..4].copy_from_slice(&(index as i32).to_ne_bytes());
    } else {
        if text.len() >= IFNAMSIZ {
            return Err(ExplainError::parse("data", text, "interface names are at most 15 bytes"));
        }
        req.ifr_name[..text.len()].copy_from_slice(text.as_bytes());
        if field == IfreqField::Flags && flow == Flow::In && args.has_more() {
            let flags = args.symbolic("ifr_flags", &table::INTERFACE_FLAGS)?;
            req.ifr_ifru[..2].copy_from_slice(&(flags as u16).to_ne_bytes());
        }
    }
    Ok(args.bytes(&crate::calls::struct_bytes(&req)))
}

/// The data argument as the entry's payload type expects it.
fn parse_data(args: &mut Args<'_>, entry: Option<&'static IoctlEntry>) -> Result<*const c_void> {
    let raw = |args: &mut Args<'_>| -> Result<*const c_void> {
        match args.peek() {
            None => Ok(std::ptr::null()),
            Some(_) => args.buffer("data").map(|ptr| ptr as *const c_void),
        }
    };
    let Some(entry) = entry else {
        return raw(args);
    };
    let payload = entry.payload;
    match payload {
        Payload::None => return raw(args),
        Payload::Value => {
            let value = if args.has_more() { args.long("data")? } else { 0 };
            return Ok(value as isize as *const c_void);
        }
        Payload::Symbol(table) => {
            let value = args.symbolic_or("data", table, 0)?;
            return Ok(value as isize as *const c_void);
        }
        _ => {}
    }
    let pointer_text = match args.peek() {
        None => true,
        Some(text) => text == "-" || text == "NULL" || text.starts_with('@'),
    };
    if entry.flow == Flow::Out || (pointer_text && !matches!(payload, Payload::Ifreq(_))) {
        return args.buffer("data").map(|ptr| ptr as *const c_void);
    }
    match payload {
        Payload::Int | Payload::UInt | Payload::ULong | Payload::U64 | Payload::Pid => {
            let value = args.long("data")?;
            Ok(int_bytes(args, value, payload))
        }
        Payload::Bits(table) => {
            let value = args.symbolic("data", table)?;
            Ok(int_bytes(args, value, payload))
        }
        Payload::Char => {
            let text = args.optional().unwrap_or(" ");
            let byte = match text.as_bytes() {
                [b] => *b,
                _ => parse_bits::parse_c_integer(text)
                    .and_then(|v| u8::try_from(v).ok())
                    .ok_or_else(|| ExplainError::parse("data", text, "expected a character"))?,
            };
            Ok(args.bytes(&[byte]))
        }
        Payload::Winsize => {
            let text = args.optional().unwrap_or("24x80");
            let ws = parse_winsize(text)?;
            Ok(args.bytes(&crate::calls::struct_bytes(&ws)))
        }
        Payload::Ifreq(field) => parse_ifreq(args, field, entry.flow),
        _ => args.buffer("data").map(|ptr| ptr as *const c_void),
    }
}

fn parse_ioctl(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let text = args
        .optional()
        .ok_or_else(|| ExplainError::parse("request", "", "a request name or number is required"))?;
    let request = parse_request(text)?;
    let data = parse_data(args, find(request, fildes))?;
    Ok(Box::new(Ioctl { fildes, request, data }))
}

pub(crate) static CALLS: [CallEntry; 1] = [CallEntry {
    name: "ioctl",
    synopsis: "fildes request [data]",
    errnos: &[
        libc::EACCES,
        libc::EBADF,
        libc::EBUSY,
        libc::EFAULT,
        libc::EINVAL,
        libc::EIO,
        libc::ENOTTY,
        libc::EPERM,
        libc::EROFS,
    ],
    sample: &["stdin", "TCGETS"],
    parse: parse_ioctl,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::os::unix::io::AsRawFd;

    fn explain(explainer: &dyn Explainer, errnum: c_int) -> (String, String) {
        let mut call = StringBuffer::new(1024, Options::default());
        explainer.render_call(&mut call, errnum);
        let mut cause = StringBuffer::with_footnotes(4096, Options::default());
        explainer.render_cause(&mut cause, errnum);
        let notes = cause.footnotes().map(|n| n.as_str().to_string()).unwrap_or_default();
        (call.as_str().to_string(), format!("{}{}", cause.as_str(), notes))
    }

    #[test]
    fn registry_is_consistent() {
        assert_eq!(check_conflicts(), Vec::<String>::new());
    }

    #[test]
    fn terminal_request_on_a_regular_file() {
        let file = tempfile::tempfile().unwrap();
        let t = crate::render::termios::KernelTermios::default();
        let ioctl = Ioctl {
            fildes: file.as_raw_fd(),
            request: 0x5401,
            data: &t as *const crate::render::termios::KernelTermios as *const c_void,
        };
        let (call, cause) = explain(&ioctl, libc::ENOTTY);
        assert!(call.starts_with(&format!("ioctl(fildes = {}", file.as_raw_fd())), "{call}");
        assert!(call.contains("request = TCGETS, data = 0x"), "{call}");
        assert_eq!(cause, "the fildes argument does not refer to a terminal, it is a regular file");
    }

    #[test]
    fn unknown_request_is_numeric() {
        let file = tempfile::tempfile().unwrap();
        let ioctl = Ioctl {
            fildes: file.as_raw_fd(),
            request: 0xDEAD_BEEF,
            data: 0x1000 as *const c_void,
        };
        let (call, cause) = explain(&ioctl, libc::EINVAL);
        assert!(call.ends_with("request = 0xDEADBEEF, data = 0x1000)"), "{call}");
        assert_eq!(cause, "the ioctl request or the ioctl data is not valid");
    }

    #[test]
    fn null_payload_for_a_pointer_request() {
        let file = tempfile::tempfile().unwrap();
        let ioctl = Ioctl {
            fildes: file.as_raw_fd(),
            request: 0x5413,
            data: std::ptr::null(),
        };
        let (call, cause) = explain(&ioctl, libc::EINVAL);
        assert!(call.ends_with("request = TIOCGWINSZ, data = NULL)"), "{call}");
        assert!(cause.starts_with("the data argument is the NULL pointer"), "{cause}");
    }

    #[test]
    fn returned_window_size() {
        let ws = libc::winsize {
            ws_row: 50,
            ws_col: 132,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let ioctl = Ioctl {
            fildes: 1,
            request: 0x5413,
            data: &ws as *const libc::winsize as *const c_void,
        };
        let mut sb = StringBuffer::new(256, Options::default());
        ioctl.render_returned(&mut sb);
        assert_eq!(sb.as_str(), "data = { ws_row = 50, ws_col = 132 }");
    }

    #[test]
    fn privileged_request_names_the_capability() {
        let ioctl = Ioctl {
            fildes: 0,
            request: 0x541D,
            data: std::ptr::null(),
        };
        let (_, cause) = explain(&ioctl, libc::EPERM);
        assert!(cause.starts_with("the ioctl TIOCCONS system call requires a privileged process"), "{cause}");
        assert!(cause.ends_with("CAP_SYS_ADMIN capability"), "{cause}");
    }

    #[test]
    fn requests_parse_by_name_or_number() {
        assert_eq!(parse_request("TCGETS").unwrap(), 0x5401);
        assert_eq!(parse_request("0xDEADBEEF").unwrap(), 0xDEAD_BEEF);
        let err = parse_request("TCGEST").unwrap_err().to_string();
        assert!(err.contains("TCGETS"), "{err}");
    }

    #[test]
    fn textual_payloads() {
        let list: Vec<String> = ["stdin", "TIOCSWINSZ", "24x80"].iter().map(|s| s.to_string()).collect();
        let mut args = Args::new("ioctl", "", &list);
        let ioctl = parse_ioctl(&mut args).unwrap();
        let _storage = args.finish().unwrap();
        let mut sb = StringBuffer::new(256, Options::default());
        ioctl.render_call(&mut sb, libc::EINVAL);
        assert!(sb.as_str().ends_with("request = TIOCSWINSZ, data = { ws_row = 24, ws_col = 80 })"), "{}", sb.as_str());

        let list: Vec<String> = ["stdin", "TCFLSH", "TCIOFLUSH"].iter().map(|s| s.to_string()).collect();
        let mut args = Args::new("ioctl", "", &list);
        let ioctl = parse_ioctl(&mut args).unwrap();
        let mut sb = StringBuffer::new(256, Options::default());
        ioctl.render_call(&mut sb, libc::EINVAL);
        assert!(sb.as_str().ends_with("request = TCFLSH, data = TCIOFLUSH)"), "{}", sb.as_str());
    }
}
