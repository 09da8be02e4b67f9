/*============================================================
  Synavera Project: Explain
  Module: explain_core::render::termios
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render terminal attribute and window size structures as
    `{ field = value, ... }`, for terminal ioctl payloads.

  Security / Safety Notes:
    Payloads are copied through the fault-safe probe; an
    unreadable payload is shown as its address only.

  Dependencies:
    parse_bits tables; libc termios constants.

  Operational Scope:
    TCGETS, TCSETS, TCSETSW, TCSETSF, TCGETA, TIOCGWINSZ and
    TIOCSWINSZ echoes and
    returned-data rendering.

  Revision History:
    2026-10-18 COD  Authored terminal structure renderers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Kernel layout, not the C library's larger termios
============================================================*/

use std::fmt::Write;
use std::os::raw::c_void;

use crate::bits_table;
use crate::parse_bits::{self, BitsEntry};
use crate::probe;
use crate::render::pointer::pointer;
use crate::string_buffer::StringBuffer;

/// Number of control characters in the kernel's termios.
pub const KERNEL_NCCS: usize = 19;

/// `struct termios` as the TCGETS family passes it to the kernel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelTermios {
    pub c_iflag: u32,
    pub c_oflag: u32,
    pub c_cflag: u32,
    pub c_lflag: u32,
    pub c_line: u8,
    pub c_cc: [u8; KERNEL_NCCS],
}

/// The older `struct termio` of TCGETA and friends.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Termio {
    pub c_iflag: u16,
    pub c_oflag: u16,
    pub c_cflag: u16,
    pub c_lflag: u16,
    pub c_line: u8,
    pub c_cc: [u8; 8],
}

pub static INPUT_FLAGS: [BitsEntry; 15] = bits_table![
    IGNBRK, BRKINT, IGNPAR, PARMRK, INPCK, ISTRIP, INLCR, IGNCR, ICRNL, IUCLC, IXON, IXANY, IXOFF,
    IMAXBEL, IUTF8,
];

pub static OUTPUT_FLAGS: [BitsEntry; 8] =
    bits_table![OPOST, OLCUC, ONLCR, OCRNL, ONOCR, ONLRET, OFILL, OFDEL];

pub static CONTROL_FLAGS: [BitsEntry; 7] = bits_table![CSTOPB, CREAD, PARENB, PARODD, HUPCL, CLOCAL, CRTSCTS];

pub static CHARACTER_SIZES: [BitsEntry; 4] = bits_table![CS5, CS6, CS7, CS8];

pub static BAUD_RATES: [BitsEntry; 22] = bits_table![
    B0, B50, B75, B110, B134, B150, B200, B300, B600, B1200, B1800, B2400, B4800, B9600, B19200,
    B38400, B57600, B115200, B230400, B460800, B500000, B1000000,
];

pub static LOCAL_FLAGS: [BitsEntry; 14] = bits_table![
    ISIG, ICANON, ECHO, ECHOE, ECHOK, ECHONL, NOFLSH, TOSTOP, ECHOCTL, ECHOPRT, ECHOKE, FLUSHO,
    PENDIN, IEXTEN,
];

/// Names of the c_cc slots in index order.
pub static CONTROL_CHARS: [BitsEntry; 17] = bits_table![
    VINTR, VQUIT, VERASE, VKILL, VEOF, VTIME, VMIN, VSWTC, VSTART, VSTOP, VSUSP, VEOL, VREPRINT,
    VDISCARD, VWERASE, VLNEXT, VEOL2,
];

fn control_flags(sb: &mut StringBuffer, cflag: u32) {
    let cflag = i64::from(cflag);
    parse_bits::print_single(sb, cflag & i64::from(libc::CBAUD), &BAUD_RATES);
    sb.puts(" | ");
    parse_bits::print_single(sb, cflag & i64::from(libc::CSIZE), &CHARACTER_SIZES);
    let rest = cflag & !i64::from(libc::CBAUD | libc::CSIZE);
    if rest != 0 {
        sb.puts(" | ");
        parse_bits::print(sb, rest, &CONTROL_FLAGS);
    }
}

/// `^C`, `^?`, a printable character, or an octal escape.
fn control_char(sb: &mut StringBuffer, c: u8) {
    match c {
        0x7f => sb.puts("^?"),
        0..=0x1f => {
            sb.putc('^');
            sb.putc(char::from(c + b'@'));
        }
        0x20..=0x7e => {
            sb.putc('\'');
            sb.putc(char::from(c));
            sb.putc('\'');
        }
        _ => {
            let _ = write!(sb, "\\{c:03o}");
        }
    }
}

fn control_chars(sb: &mut StringBuffer, cc: &[u8]) {
    sb.puts("c_cc = {");
    let mut first = true;
    for entry in &CONTROL_CHARS {
        let Some(&c) = usize::try_from(entry.value).ok().and_then(|i| cc.get(i)) else {
            continue;
        };
        if c == 0 && entry.name != "VMIN" {
            continue;
        }
        sb.puts(if first { " " } else { ", " });
        first = false;
        let _ = write!(sb, "{} = ", entry.name);
        if entry.name == "VMIN" || entry.name == "VTIME" {
            let _ = write!(sb, "{c}");
        } else {
            control_char(sb, c);
        }
    }
    sb.puts(" }");
}

fn flags(sb: &mut StringBuffer, iflag: u32, oflag: u32, cflag: u32, lflag: u32) {
    sb.puts("c_iflag = ");
    parse_bits::print(sb, i64::from(iflag), &INPUT_FLAGS);
    sb.puts(", c_oflag = ");
    parse_bits::print(sb, i64::from(oflag), &OUTPUT_FLAGS);
    sb.puts(", c_cflag = ");
    control_flags(sb, cflag);
    sb.puts(", c_lflag = ");
    parse_bits::print(sb, i64::from(lflag), &LOCAL_FLAGS);
}

/// Render a kernel termios value.
pub fn termios_value(sb: &mut StringBuffer, t: &KernelTermios) {
    sb.puts("{ ");
    flags(sb, t.c_iflag, t.c_oflag, t.c_cflag, t.c_lflag);
    let _ = write!(sb, ", c_line = {}, ", t.c_line);
    control_chars(sb, &t.c_cc);
    sb.puts(" }");
}

/// Render a termios pointer argument.
pub fn termios(sb: &mut StringBuffer, ptr: *const c_void) {
    // SAFETY: KernelTermios is plain integers, valid for every bit pattern.
    match unsafe { probe::read_struct::<KernelTermios>(ptr) } {
        Some(t) => termios_value(sb, &t),
        None => pointer(sb, ptr),
    }
}

/// Render a termio pointer argument.
pub fn termio(sb: &mut StringBuffer, ptr: *const c_void) {
    // SAFETY: Termio is plain integers, valid for every bit pattern.
    match unsafe { probe::read_struct::<Termio>(ptr) } {
        Some(t) => {
            sb.puts("{ ");
            flags(
                sb,
                u32::from(t.c_iflag),
                u32::from(t.c_oflag),
                u32::from(t.c_cflag),
                u32::from(t.c_lflag),
            );
            let _ = write!(sb, ", c_line = {}, ", t.c_line);
            control_chars(sb, &t.c_cc);
            sb.puts(" }");
        }
        None => pointer(sb, ptr),
    }
}

/// `{ ws_row = 24, ws_col = 80 }`, pixel sizes only when set.
pub fn winsize_value(sb: &mut StringBuffer, ws: &libc::winsize) {
    let _ = write!(sb, "{{ ws_row = {}, ws_col = {}", ws.ws_row, ws.ws_col);
    if ws.ws_xpixel != 0 || ws.ws_ypixel != 0 {
        let _ = write!(sb, ", ws_xpixel = {}, ws_ypixel = {}", ws.ws_xpixel, ws.ws_ypixel);
    }
    sb.puts(" }");
}

pub fn winsize(sb: &mut StringBuffer, ptr: *const c_void) {
    // SAFETY: winsize is plain integers.
    match unsafe { probe::read_struct::<libc::winsize>(ptr) } {
        Some(ws) => winsize_value(sb, &ws),
        None => pointer(sb, ptr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn kernel_termios_is_36_bytes() {
        assert_eq!(std::mem::size_of::<KernelTermios>(), 36);
        assert_eq!(std::mem::size_of::<Termio>(), 18);
    }

    #[test]
    fn raw_mode_termios() {
        let mut t = KernelTermios {
            c_cflag: libc::B38400 | libc::CS8 | libc::CREAD,
            ..KernelTermios::default()
        };
        t.c_cc[libc::VINTR] = 3;
        t.c_cc[libc::VMIN] = 1;
        let mut sb = StringBuffer::new(1024, Options::default());
        termios_value(&mut sb, &t);
        assert_eq!(
            sb.as_str(),
            "{ c_iflag = 0, c_oflag = 0, c_cflag = B38400 | CS8 | CREAD, c_lflag = 0, c_line = 0, \
             c_cc = { VINTR = ^C, VMIN = 1 } }"
        );
    }

    #[test]
    fn unreadable_winsize_is_a_pointer() {
        let mut sb = StringBuffer::new(128, Options::default());
        winsize(&mut sb, 0x10 as *const c_void);
        assert_eq!(sb.as_str(), "0x10");

        let ws = libc::winsize {
            ws_row: 24,
            ws_col: 80,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let mut sb = StringBuffer::new(128, Options::default());
        winsize(&mut sb, &ws as *const libc::winsize as *const c_void);
        assert_eq!(sb.as_str(), "{ ws_row = 24, ws_col = 80 }");
    }
}
