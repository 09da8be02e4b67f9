/*============================================================
  Synavera Project: Explain
  Module: explain_core::calls::time
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Explainers for clock and timed-wait calls: gettimeofday,
    nanosleep and select.

  Security / Safety Notes:
    Descriptor sets are copied out before inspection; no
    descriptor named in a set is touched beyond fcntl.

  Dependencies:
    render::time, analysers::fildes.

  Operational Scope:
    The time section of the call registry.

  Revision History:
    2026-10-18 COD  Authored time explainers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Descriptor sets rendered as the members they hold
============================================================*/

use std::fmt::Write;
use std::os::raw::{c_int, c_void};

use super::{struct_bytes, Args, CallEntry, Echo, Explainer};
use crate::analysers::limits::einval_too_small;
use crate::analysers::{ebadf, efault, eintr, enomem_kernel, generic, software_error};
use crate::error::{ExplainError, Result};
use crate::probe;
use crate::render::pointer::pointer;
use crate::render::time::{timespec, timespec_is_invalid, timeval, timeval_is_invalid};
use crate::string_buffer::StringBuffer;

const FD_SETSIZE: c_int = libc::FD_SETSIZE as c_int;

fn fd_set_value(set: *const libc::fd_set) -> Option<libc::fd_set> {
    if set.is_null() {
        return None;
    }
    // SAFETY: fd_set is a plain bit array.
    unsafe { probe::read_struct::<libc::fd_set>(set as *const c_void) }
}

/// Members of `set` below `nfds`.
fn members(set: &libc::fd_set, nfds: c_int) -> Vec<c_int> {
    (0..nfds.clamp(0, FD_SETSIZE))
        // SAFETY: fd is within FD_SETSIZE and set is a valid fd_set.
        .filter(|&fd| unsafe { libc::FD_ISSET(fd, set) })
        .collect()
}

/// `{ 0, 4 }`, `NULL`, or the bare pointer when unreadable.
fn fd_set(sb: &mut StringBuffer, set: *const libc::fd_set, nfds: c_int) {
    let Some(value) = fd_set_value(set) else {
        return pointer(sb, set as *const c_void);
    };
    let fds = members(&value, nfds);
    if fds.is_empty() {
        sb.puts("{ }");
        return;
    }
    sb.puts("{ ");
    for (i, fd) in fds.iter().enumerate() {
        if i > 0 {
            sb.puts(", ");
        }
        let _ = write!(sb, "{fd}");
    }
    sb.puts(" }");
}

pub struct Gettimeofday {
    pub tv: *const libc::timeval,
    pub tz: *const c_void,
}

impl Explainer for Gettimeofday {
    fn name(&self) -> &'static str {
        "gettimeofday"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "gettimeofday")
            .pointer("tv", self.tv as *const c_void)
            .pointer("tz", self.tz)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EFAULT => {
                let tv_ok = self.tv.is_null() || probe::is_readable(self.tv as *const c_void, std::mem::size_of::<libc::timeval>());
                efault(sb, if tv_ok { "tz" } else { "tv" });
            }
            _ => generic(sb, errnum, "gettimeofday"),
        }
    }
}

pub struct Nanosleep {
    pub req: *const libc::timespec,
    pub rem: *const libc::timespec,
}

impl Explainer for Nanosleep {
    fn name(&self) -> &'static str {
        "nanosleep"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "nanosleep")
            .arg("req", |sb| {
                if errnum == libc::EFAULT {
                    pointer(sb, self.req as *const c_void);
                } else {
                    timespec(sb, self.req);
                }
            })
            .pointer("rem", self.rem as *const c_void)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EFAULT => {
                let size = std::mem::size_of::<libc::timespec>();
                efault(sb, if probe::is_readable(self.req as *const c_void, size) { "rem" } else { "req" });
            }
            libc::EINTR => {
                eintr(sb, "nanosleep");
                if !self.rem.is_null() {
                    sb.footnote_str("the remaining time has been written into rem");
                }
            }
            libc::EINVAL => {
                if timespec_is_invalid(self.req) {
                    sb.puts("the req argument has a tv_nsec value outside the range 0 to 999999999, or a negative tv_sec value");
                } else {
                    sb.puts("the req argument is not a valid time interval");
                }
                software_error(sb);
            }
            _ => generic(sb, errnum, "nanosleep"),
        }
    }
}

pub struct Select {
    pub nfds: c_int,
    pub readfds: *const libc::fd_set,
    pub writefds: *const libc::fd_set,
    pub exceptfds: *const libc::fd_set,
    pub timeout: *const libc::timeval,
}

impl Select {
    fn sets(&self) -> [(&'static str, *const libc::fd_set); 3] {
        [
            ("readfds", self.readfds),
            ("writefds", self.writefds),
            ("exceptfds", self.exceptfds),
        ]
    }

    /// First closed descriptor named in any set.
    fn closed_member(&self) -> Option<(&'static str, c_int)> {
        self.sets().into_iter().find_map(|(caption, set)| {
            let value = fd_set_value(set)?;
            members(&value, self.nfds)
                .into_iter()
                .find(|&fd| !probe::is_open(fd))
                .map(|fd| (caption, fd))
        })
    }
}

impl Explainer for Select {
    fn name(&self) -> &'static str {
        "select"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "select")
            .value("nfds", self.nfds)
            .arg("readfds", |sb| fd_set(sb, self.readfds, self.nfds))
            .arg("writefds", |sb| fd_set(sb, self.writefds, self.nfds))
            .arg("exceptfds", |sb| fd_set(sb, self.exceptfds, self.nfds))
            .arg("timeout", |sb| timeval(sb, self.timeout))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EBADF => match self.closed_member() {
                Some((caption, fd)) => ebadf(sb, fd, caption),
                None => sb.puts("an invalid file descriptor was given in one of the sets"),
            },
            libc::EFAULT => {
                let size = std::mem::size_of::<libc::fd_set>();
                let faulted = self
                    .sets()
                    .into_iter()
                    .find(|(_, set)| !set.is_null() && !probe::is_readable(*set as *const c_void, size))
                    .map_or("timeout", |(caption, _)| caption);
                efault(sb, faulted);
            }
            libc::EINTR => eintr(sb, "select"),
            libc::EINVAL => {
                if self.nfds < 0 {
                    einval_too_small(sb, "nfds", i64::from(self.nfds));
                } else if self.nfds > FD_SETSIZE {
                    let _ = write!(sb, "the nfds argument ({}) is larger than FD_SETSIZE ({FD_SETSIZE})", self.nfds);
                } else if timeval_is_invalid(self.timeout) {
                    sb.puts("the timeout argument contains an invalid time interval");
                } else {
                    sb.puts("the nfds argument is negative or exceeds the RLIMIT_NOFILE resource limit");
                }
                software_error(sb);
            }
            libc::ENOMEM => enomem_kernel(sb),
            _ => generic(sb, errnum, "select"),
        }
    }
}

fn parse_gettimeofday(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let tv = args.buffer("tv")? as *const libc::timeval;
    let tz = if args.has_more() {
        args.buffer("tz")? as *const c_void
    } else {
        std::ptr::null()
    };
    Ok(Box::new(Gettimeofday { tv, tz }))
}

/// Seconds with an optional fraction, such as `1.5`.
fn seconds(text: &str, caption: &str) -> Result<(i64, i64)> {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    let secs: i64 = whole.parse().map_err(|_| ExplainError::parse(caption, text, "expected seconds"))?;
    let mut nanos = 0i64;
    if !fraction.is_empty() {
        let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
        nanos = digits.parse().map_err(|_| ExplainError::parse(caption, text, "expected seconds"))?;
    }
    Ok((secs, nanos))
}

fn parse_nanosleep(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let (tv_sec, mut tv_nsec) = seconds(args.optional().unwrap_or("0"), "req")?;
    if args.has_more() {
        tv_nsec = args.long("tv_nsec")?;
    }
    let req = libc::timespec {
        tv_sec: tv_sec as libc::time_t,
        tv_nsec: tv_nsec as _,
    };
    let req = args.bytes(&struct_bytes(&req)) as *const libc::timespec;
    let rem = args.buffer("rem")? as *const libc::timespec;
    Ok(Box::new(Nanosleep { req, rem }))
}

/// `0,3,4` as an fd_set; `NULL` for none, `-` for an empty set.
fn parse_fd_set(args: &mut Args<'_>, caption: &str) -> Result<*const libc::fd_set> {
    let text = args.optional().unwrap_or("NULL");
    if text == "NULL" {
        return Ok(std::ptr::null());
    }
    // SAFETY: fd_set is a plain bit array; all zeroes is the empty set.
    let mut set: libc::fd_set = unsafe { std::mem::zeroed() };
    for item in text.split(',').filter(|s| !s.is_empty() && *s != "-") {
        let fd: c_int = item
            .trim()
            .parse()
            .map_err(|_| ExplainError::parse(caption, text, "expected descriptor numbers"))?;
        if !(0..FD_SETSIZE).contains(&fd) {
            return Err(ExplainError::parse(caption, text, "descriptor outside FD_SETSIZE"));
        }
        // SAFETY: fd is within FD_SETSIZE.
        unsafe { libc::FD_SET(fd, &mut set) };
    }
    Ok(args.bytes(&struct_bytes(&set)) as *const libc::fd_set)
}

fn parse_select(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let nfds = args.int("nfds")?;
    let readfds = parse_fd_set(args, "readfds")?;
    let writefds = parse_fd_set(args, "writefds")?;
    let exceptfds = parse_fd_set(args, "exceptfds")?;
    let timeout = match args.optional() {
        None | Some("NULL") => std::ptr::null(),
        Some(text) => {
            let (secs, nanos) = seconds(text, "timeout")?;
            let tv = libc::timeval {
                tv_sec: secs as libc::time_t,
                tv_usec: (nanos / 1000) as libc::suseconds_t,
            };
            args.bytes(&struct_bytes(&tv)) as *const libc::timeval
        }
    };
    Ok(Box::new(Select {
        nfds,
        readfds,
        writefds,
        exceptfds,
        timeout,
    }))
}

pub(crate) static CALLS: [CallEntry; 3] = [
    CallEntry {
        name: "gettimeofday",
        synopsis: "[tv [tz]]",
        errnos: &[libc::EFAULT],
        sample: &["NULL", "@0x10"],
        parse: parse_gettimeofday,
    },
    CallEntry {
        name: "nanosleep",
        synopsis: "seconds [tv_nsec [rem]]",
        errnos: &[libc::EFAULT, libc::EINTR, libc::EINVAL],
        sample: &["1", "2000000000"],
        parse: parse_nanosleep,
    },
    CallEntry {
        name: "select",
        synopsis: "nfds [readfds [writefds [exceptfds [timeout]]]]",
        errnos: &[libc::EBADF, libc::EFAULT, libc::EINTR, libc::EINVAL, libc::ENOMEM],
        sample: &["100", "0,99", "NULL", "NULL", "1.5"],
        parse: parse_select,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn explain(explainer: &dyn Explainer, errnum: c_int) -> (String, String) {
        let mut call = StringBuffer::new(1024, Options::default());
        explainer.render_call(&mut call, errnum);
        let mut cause = StringBuffer::with_footnotes(4096, Options::default());
        explainer.render_cause(&mut cause, errnum);
        let notes = cause.footnotes().map(|n| n.as_str().to_string()).unwrap_or_default();
        (call.as_str().to_string(), format!("{}{}", cause.as_str(), notes))
    }

    #[test]
    fn nanosleep_out_of_range() {
        let req = libc::timespec {
            tv_sec: 1,
            tv_nsec: 2_000_000_000,
        };
        let sleep = Nanosleep {
            req: &req,
            rem: std::ptr::null(),
        };
        let (call, cause) = explain(&sleep, libc::EINVAL);
        assert_eq!(call, "nanosleep(req = { tv_sec = 1, tv_nsec = 2000000000 }, rem = NULL)");
        assert!(cause.starts_with("the req argument has a tv_nsec value outside the range"), "{cause}");
    }

    #[test]
    fn select_names_the_closed_descriptor() {
        let list: Vec<String> = ["1000", "2,999", "NULL", "NULL", "0.25"].iter().map(|s| s.to_string()).collect();
        let mut args = Args::new("select", "", &list);
        let select = parse_select(&mut args).unwrap();
        let _storage = args.finish().unwrap();
        let (call, cause) = explain(select.as_ref(), libc::EBADF);
        assert!(call.contains("readfds = { 2, 999 }, writefds = NULL"), "{call}");
        assert!(call.ends_with("timeout = { tv_sec = 0, tv_usec = 250000 })"), "{call}");
        assert!(cause.contains("the readfds argument (999)"), "{cause}");
    }

    #[test]
    fn select_nfds_too_large() {
        let select = Select {
            nfds: FD_SETSIZE + 1,
            readfds: std::ptr::null(),
            writefds: std::ptr::null(),
            exceptfds: std::ptr::null(),
            timeout: std::ptr::null(),
        };
        let (_, cause) = explain(&select, libc::EINVAL);
        assert!(cause.starts_with(&format!("the nfds argument ({}) is larger than FD_SETSIZE", FD_SETSIZE + 1)), "{cause}");
    }

    #[test]
    fn fractional_seconds() {
        assert_eq!(seconds("1.5", "t").unwrap(), (1, 500_000_000));
        assert_eq!(seconds("3", "t").unwrap(), (3, 0));
        assert!(seconds("x", "t").is_err());
    }
}
