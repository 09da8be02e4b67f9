/*============================================================
  Synavera Project: Explain
  Module: explain_core::render::time
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render timeval and timespec arguments.

  Security / Safety Notes:
    Structures are copied through the fault-safe probe.

  Dependencies:
    probe for guarded reads.

  Operational Scope:
    Call echoes for gettimeofday, nanosleep and select.

  Revision History:
    2026-10-18 COD  Authored time renderers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Probe before dereference
============================================================*/

use std::fmt::Write;
use std::os::raw::c_void;

use crate::probe;
use crate::string_buffer::StringBuffer;

/// `{ tv_sec = 1, tv_usec = 500 }`, or the pointer when unreadable.
pub fn timeval(sb: &mut StringBuffer, tv: *const libc::timeval) {
    if tv.is_null() {
        sb.puts("NULL");
        return;
    }
    // SAFETY: timeval is plain integers.
    match unsafe { probe::read_struct::<libc::timeval>(tv as *const c_void) } {
        Some(value) => {
            let _ = write!(sb, "{{ tv_sec = {}, tv_usec = {} }}", value.tv_sec, value.tv_usec);
        }
        None => super::pointer::pointer(sb, tv as *const c_void),
    }
}

/// `{ tv_sec = 1, tv_nsec = 0 }`, or the pointer when unreadable.
pub fn timespec(sb: &mut StringBuffer, ts: *const libc::timespec) {
    if ts.is_null() {
        sb.puts("NULL");
        return;
    }
    // SAFETY: timespec is plain integers.
    match unsafe { probe::read_struct::<libc::timespec>(ts as *const c_void) } {
        Some(value) => {
            let _ = write!(sb, "{{ tv_sec = {}, tv_nsec = {} }}", value.tv_sec, value.tv_nsec);
        }
        None => super::pointer::pointer(sb, ts as *const c_void),
    }
}

/// Whether a timespec is outside the valid nanosecond range.
pub fn timespec_is_invalid(ts: *const libc::timespec) -> bool {
    // SAFETY: timespec is plain integers.
    match unsafe { probe::read_struct::<libc::timespec>(ts as *const c_void) } {
        Some(value) => value.tv_sec < 0 || !(0..1_000_000_000).contains(&value.tv_nsec),
        None => false,
    }
}

/// Whether a timeval is outside the valid microsecond range.
pub fn timeval_is_invalid(tv: *const libc::timeval) -> bool {
    // SAFETY: timeval is plain integers.
    match unsafe { probe::read_struct::<libc::timeval>(tv as *const c_void) } {
        Some(value) => value.tv_sec < 0 || !(0..1_000_000).contains(&value.tv_usec),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn readable_timespec() {
        let ts = libc::timespec {
            tv_sec: 3,
            tv_nsec: 250,
        };
        let mut sb = StringBuffer::new(64, Options::default());
        timespec(&mut sb, &ts);
        assert_eq!(sb.as_str(), "{ tv_sec = 3, tv_nsec = 250 }");
        assert!(!timespec_is_invalid(&ts));
    }

    #[test]
    fn out_of_range_nanoseconds() {
        let ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 1_000_000_000,
        };
        assert!(timespec_is_invalid(&ts));
    }

    #[test]
    fn unreadable_timeval() {
        let mut sb = StringBuffer::new(64, Options::default());
        timeval(&mut sb, 0x30 as *const libc::timeval);
        assert_eq!(sb.as_str(), "0x30");
    }
}
