/*============================================================
  Synavera Project: Explain
  Module: explain_core::render::pointer
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render pointers, scalar counts and byte sizes.

  Security / Safety Notes:
    Pointers are printed, never dereferenced, except through
    the fault-safe probe for pointed-to integers.

  Dependencies:
    probe for guarded reads.

  Operational Scope:
    Shared by every call echo.

  Revision History:
    2026-10-18 COD  Authored scalar renderers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Never dereference unverified memory
============================================================*/

use std::fmt::Write;
use std::os::raw::{c_int, c_void};

use crate::probe;
use crate::string_buffer::StringBuffer;

/// `NULL` or the hex address.
pub fn pointer(sb: &mut StringBuffer, ptr: *const c_void) {
    if ptr.is_null() {
        sb.puts("NULL");
    } else {
        let _ = write!(sb, "{:#x}", ptr as usize);
    }
}

/// A pointer to an int: the address, then `{ value }` when readable.
pub fn int_star(sb: &mut StringBuffer, ptr: *const c_int) {
    pointer(sb, ptr as *const c_void);
    // SAFETY: c_int is valid for every bit pattern.
    if let Some(value) = unsafe { probe::read_struct::<c_int>(ptr as *const c_void) } {
        let _ = write!(sb, " {{ {value} }}");
    }
}

/// Byte count.
pub fn size(sb: &mut StringBuffer, value: usize) {
    let _ = write!(sb, "{value}");
}

/// Human scaled size such as `4.0GiB`.
pub fn pretty_size(sb: &mut StringBuffer, value: u64) {
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    if value < 1024 {
        let _ = write!(sb, "{value} bytes");
        return;
    }
    let mut scaled = value as f64 / 1024.0;
    let mut unit = 0;
    while scaled >= 1024.0 && unit + 1 < UNITS.len() {
        scaled /= 1024.0;
        unit += 1;
    }
    if scaled < 10.0 {
        let _ = write!(sb, "{scaled:.1}{}", UNITS[unit]);
    } else {
        let _ = write!(sb, "{:.0}{}", scaled, UNITS[unit]);
    }
}

/// An rlimit value, spelling out RLIM_INFINITY.
pub fn rlim(sb: &mut StringBuffer, value: u64) {
    if value == libc::RLIM_INFINITY {
        sb.puts("RLIM_INFINITY");
    } else {
        let _ = write!(sb, "{value}");
    }
}

/// A character argument: `'x'` when printable, else the number.
pub fn character(sb: &mut StringBuffer, c: c_int) {
    match u8::try_from(c) {
        Ok(b'\'') => sb.puts("'\\''"),
        Ok(b'\\') => sb.puts("'\\\\'"),
        Ok(b) if b.is_ascii_graphic() || b == b' ' => {
            let _ = write!(sb, "'{}'", char::from(b));
        }
        _ => {
            let _ = write!(sb, "{c}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn sb() -> StringBuffer {
        StringBuffer::new(128, Options::default())
    }

    #[test]
    fn null_and_addresses() {
        let mut buf = sb();
        pointer(&mut buf, std::ptr::null());
        buf.putc(' ');
        pointer(&mut buf, 0xdead_beef as *const c_void);
        assert_eq!(buf.as_str(), "NULL 0xdeadbeef");
    }

    #[test]
    fn readable_int_pointer_shows_value() {
        let value: c_int = 42;
        let mut buf = sb();
        int_star(&mut buf, &value);
        assert!(buf.as_str().ends_with(" { 42 }"));

        let mut bad = sb();
        int_star(&mut bad, 0x8 as *const c_int);
        assert_eq!(bad.as_str(), "0x8");
    }

    #[test]
    fn pretty_sizes() {
        let mut buf = sb();
        pretty_size(&mut buf, 512);
        buf.putc(' ');
        pretty_size(&mut buf, 4 * 1024 * 1024 * 1024);
        buf.putc(' ');
        pretty_size(&mut buf, 100 * 1024);
        assert_eq!(buf.as_str(), "512 bytes 4.0GiB 100KiB");
    }
}
