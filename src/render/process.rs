/*============================================================
  Synavera Project: Explain
  Module: explain_core::render::process
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render signals, waitpid options, resource limit names and
    process identifiers.

  Security / Safety Notes:
    Reads /proc/<pid>/comm for process names only.

  Dependencies:
    parse_bits tables built from libc constants.

  Operational Scope:
    Call echoes for kill, waitpid, getrlimit, setrlimit,
    setpgid; footnotes naming processes.

  Revision History:
    2026-10-18 COD  Authored process renderers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Unknown values rendered numerically
============================================================*/

use std::fmt::Write;
use std::os::raw::c_int;

use crate::bits_table;
use crate::parse_bits::{self, BitsEntry, BitsTable};
use crate::string_buffer::StringBuffer;

/// Signal numbers.
pub static SIGNALS: [BitsEntry; 31] = bits_table![
    SIGHUP, SIGINT, SIGQUIT, SIGILL, SIGTRAP, SIGABRT, SIGBUS, SIGFPE, SIGKILL, SIGUSR1, SIGSEGV,
    SIGUSR2, SIGPIPE, SIGALRM, SIGTERM, SIGSTKFLT, SIGCHLD, SIGCONT, SIGSTOP, SIGTSTP, SIGTTIN,
    SIGTTOU, SIGURG, SIGXCPU, SIGXFSZ, SIGVTALRM, SIGPROF, SIGWINCH, SIGIO, SIGPWR, SIGSYS,
];

/// waitpid(2) option bits.
pub static WAIT_OPTIONS: [BitsEntry; 6] =
    bits_table![WNOHANG, WUNTRACED, WCONTINUED, __WNOTHREAD, __WALL, __WCLONE];

/// Resource limit names.
pub static RLIMIT_RESOURCES: [BitsEntry; 16] = bits_table![
    RLIMIT_CPU,
    RLIMIT_FSIZE,
    RLIMIT_DATA,
    RLIMIT_STACK,
    RLIMIT_CORE,
    RLIMIT_RSS,
    RLIMIT_NPROC,
    RLIMIT_NOFILE,
    RLIMIT_MEMLOCK,
    RLIMIT_AS,
    RLIMIT_LOCKS,
    RLIMIT_SIGPENDING,
    RLIMIT_MSGQUEUE,
    RLIMIT_NICE,
    RLIMIT_RTPRIO,
    RLIMIT_RTTIME,
];

/// Render a signal number by name.
pub fn signal(sb: &mut StringBuffer, signum: c_int) {
    if signum == 0 {
        sb.putc('0');
        return;
    }
    let rtmin = libc::SIGRTMIN();
    let rtmax = libc::SIGRTMAX();
    if (rtmin..=rtmax).contains(&signum) && parse_bits::find_by_value(i64::from(signum), &SIGNALS).is_none() {
        let _ = write!(sb, "SIGRTMIN + {}", signum - rtmin);
        return;
    }
    parse_bits::print_single(sb, i64::from(signum), &SIGNALS);
}

/// Signal name for a number, if conventional.
pub fn signal_name(signum: c_int) -> Option<&'static str> {
    parse_bits::find_by_value(i64::from(signum), &SIGNALS).map(|entry| entry.name)
}

/// Render waitpid options.
pub fn wait_options(sb: &mut StringBuffer, options: c_int) {
    parse_bits::print(sb, i64::from(options), &WAIT_OPTIONS);
}

/// Render an rlimit resource name.
pub fn rlimit_resource(sb: &mut StringBuffer, resource: c_int) {
    parse_bits::print_single(sb, i64::from(resource), &RLIMIT_RESOURCES);
}

/// Render a pid, annotated with its command name when it exists.
pub fn pid(sb: &mut StringBuffer, pid: libc::pid_t) {
    let _ = write!(sb, "{pid}");
    if pid > 0 {
        if let Some(name) = process_name(pid) {
            sb.putc(' ');
            sb.puts_quoted(name.as_bytes());
        }
    }
}

/// Command name of a process from /proc.
pub fn process_name(pid: libc::pid_t) -> Option<String> {
    let text = std::fs::read_to_string(format!("/proc/{pid}/comm")).ok()?;
    let name = text.trim_end().to_string();
    (!name.is_empty()).then_some(name)
}

pub fn signal_table() -> &'static BitsTable {
    &SIGNALS
}

pub fn rlimit_table() -> &'static BitsTable {
    &RLIMIT_RESOURCES
}

pub fn wait_table() -> &'static BitsTable {
    &WAIT_OPTIONS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn signals_by_name() {
        let mut sb = StringBuffer::new(64, Options::default());
        signal(&mut sb, libc::SIGPIPE);
        sb.putc(' ');
        signal(&mut sb, libc::SIGRTMIN() + 2);
        assert_eq!(sb.as_str(), "SIGPIPE SIGRTMIN + 2");
    }

    #[test]
    fn own_process_has_a_name() {
        let me = std::process::id() as libc::pid_t;
        assert!(process_name(me).is_some());
    }

    #[test]
    fn wait_options_render() {
        let mut sb = StringBuffer::new(64, Options::default());
        wait_options(&mut sb, libc::WNOHANG | libc::WUNTRACED);
        assert_eq!(sb.as_str(), "WNOHANG | WUNTRACED");
    }
}
