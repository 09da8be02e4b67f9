/*============================================================
  Synavera Project: Explain
  Module: explain_core::ioctl::request
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Encode and decode ioctl request numbers, and render the
    numbers the registry does not know as the kernel macro
    that would have produced them.

  Security / Safety Notes:
    Pure arithmetic on the request value.

  Dependencies:
    bitflags for the direction field.

  Operational Scope:
    Request rendering for the ioctl explainer and the
    registry consistency check.

  Revision History:
    2026-10-18 COD  Authored request decoding.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Undecodable numbers fall back to hex, never to a guess
============================================================*/

use std::fmt::Write;

use bitflags::bitflags;

use crate::string_buffer::StringBuffer;

const NR_BITS: u32 = 8;
const TYPE_BITS: u32 = 8;
const SIZE_BITS: u32 = 14;

const NR_SHIFT: u32 = 0;
const TYPE_SHIFT: u32 = NR_SHIFT + NR_BITS;
const SIZE_SHIFT: u32 = TYPE_SHIFT + TYPE_BITS;
const DIR_SHIFT: u32 = SIZE_SHIFT + SIZE_BITS;

/// All ones in the size field; no real request encodes it.
pub const SIZE_MASK: u32 = (1 << SIZE_BITS) - 1;

/// Payloads larger than this are taken as a sign that the number
/// was never built with the `_IOC` macros.
const PLAUSIBLE_SIZE: u32 = 4096;

pub const SIOCPROTOPRIVATE: u64 = 0x89E0;
pub const SIOCDEVPRIVATE: u64 = 0x89F0;

bitflags! {
    /// The `_IOC_WRITE` and `_IOC_READ` bits; empty is `_IOC_NONE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Direction: u32 {
        /// The kernel reads the payload.
        const WRITE = 1;
        /// The kernel writes the payload.
        const READ = 2;
    }
}

/// The fields packed into a request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoded {
    pub dir: Direction,
    pub kind: u32,
    pub nr: u32,
    pub size: u32,
}

impl Encoded {
    /// Split `request`; `None` when it does not fit in 32 bits.
    pub fn decode(request: u64) -> Option<Self> {
        let request = u32::try_from(request).ok()?;
        Some(Self {
            dir: Direction::from_bits_retain(request >> DIR_SHIFT),
            kind: (request >> TYPE_SHIFT) & ((1 << TYPE_BITS) - 1),
            nr: (request >> NR_SHIFT) & ((1 << NR_BITS) - 1),
            size: (request >> SIZE_SHIFT) & SIZE_MASK,
        })
    }
}

/// `_IOC(dir, type, nr, size)`.
pub const fn ioc(dir: u32, kind: u8, nr: u8, size: usize) -> u64 {
    ((dir << DIR_SHIFT) | ((size as u32) << SIZE_SHIFT) | ((kind as u32) << TYPE_SHIFT) | ((nr as u32) << NR_SHIFT))
        as u64
}

pub const fn io(kind: u8, nr: u8) -> u64 {
    ioc(0, kind, nr, 0)
}

pub const fn ior(kind: u8, nr: u8, size: usize) -> u64 {
    ioc(Direction::READ.bits(), kind, nr, size)
}

pub const fn iow(kind: u8, nr: u8, size: usize) -> u64 {
    ioc(Direction::WRITE.bits(), kind, nr, size)
}

pub const fn iowr(kind: u8, nr: u8, size: usize) -> u64 {
    ioc(Direction::READ.bits() | Direction::WRITE.bits(), kind, nr, size)
}

/// The type byte: `'T'` when printable, else `0x12`.
fn kind(sb: &mut StringBuffer, value: u32) {
    match u8::try_from(value) {
        Ok(b'\'') => sb.puts("'\\''"),
        Ok(b'\\') => sb.puts("'\\\\'"),
        Ok(b) if b.is_ascii_graphic() || b == b' ' => {
            let _ = write!(sb, "'{}'", char::from(b));
        }
        _ => {
            let _ = write!(sb, "0x{value:02X}");
        }
    }
}

/// A C type whose size is `size` bytes.
fn payload_type(sb: &mut StringBuffer, size: u32) {
    if size == 0 {
        sb.puts("char[0]");
        return;
    }
    for (name, width) in [("long", 8), ("int", 4), ("short", 2)] {
        if size % width == 0 {
            match size / width {
                1 => sb.puts(name),
                n => {
                    let _ = write!(sb, "{name}[{n}]");
                }
            }
            return;
        }
    }
    let _ = write!(sb, "char[{size}]");
}

/// Write the macro form of `request`; false when it has none.
fn macro_form(sb: &mut StringBuffer, enc: Encoded) -> bool {
    if enc.size > PLAUSIBLE_SIZE {
        return false;
    }
    let name = if enc.dir.is_empty() {
        if enc.size == 0 {
            sb.puts("_IO(");
            kind(sb, enc.kind);
            let _ = write!(sb, ", {})", enc.nr);
            return true;
        }
        "_IOC(_IOC_NONE, "
    } else if enc.size == 0 {
        return false;
    } else if enc.dir == Direction::READ {
        "_IOR("
    } else if enc.dir == Direction::WRITE {
        "_IOW("
    } else {
        "_IOWR("
    };
    sb.puts(name);
    kind(sb, enc.kind);
    let _ = write!(sb, ", {}, ", enc.nr);
    payload_type(sb, enc.size);
    sb.putc(')');
    true
}

/// Zero-padded upper-case hex, two, four or eight digits wide.
pub fn hex(sb: &mut StringBuffer, request: u64) {
    let width = if request >= 0x10000 {
        8
    } else if request >= 0x100 {
        4
    } else {
        2
    };
    let _ = write!(sb, "0x{request:0width$X}");
}

/// Render a request number the registry has no name for.
pub fn render(sb: &mut StringBuffer, request: u64) {
    for (base, name) in [(SIOCDEVPRIVATE, "SIOCDEVPRIVATE"), (SIOCPROTOPRIVATE, "SIOCPROTOPRIVATE")] {
        if (base..base + 16).contains(&request) {
            let _ = write!(sb, "{name} + {}", request - base);
            return;
        }
    }
    if request == 0 {
        sb.putc('0');
        return;
    }
    if Encoded::decode(request).is_some_and(|enc| macro_form(sb, enc)) {
        return;
    }
    hex(sb, request);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn rendered(request: u64) -> String {
        let mut sb = StringBuffer::new(128, Options::default());
        render(&mut sb, request);
        sb.into_string()
    }

    #[test]
    fn constructors_match_kernel_numbers() {
        assert_eq!(ior(b'T', 0x30, 4), 0x8004_5430);
        assert_eq!(iow(b'T', 0x31, 4), 0x4004_5431);
        assert_eq!(ior(0x12, 114, 8), 0x8008_1272);
        assert_eq!(io(b'T', 1), 0x5401);
    }

    #[test]
    fn decoded_macros() {
        assert_eq!(rendered(0x5401), "_IO('T', 1)");
        assert_eq!(rendered(0x8004_5430), "_IOR('T', 48, int)");
        assert_eq!(rendered(iow(0x12, 3, 16)), "_IOW(0x12, 3, long[2])");
        assert_eq!(rendered(iowr(b'V', 9, 6)), "_IOWR('V', 9, short[3])");
        assert_eq!(rendered(ioc(0, b'x', 2, 3)), "_IOC(_IOC_NONE, 'x', 2, char[3])");
    }

    #[test]
    fn private_ranges_and_zero() {
        assert_eq!(rendered(SIOCDEVPRIVATE + 3), "SIOCDEVPRIVATE + 3");
        assert_eq!(rendered(SIOCPROTOPRIVATE), "SIOCPROTOPRIVATE + 0");
        assert_eq!(rendered(0), "0");
    }

    #[test]
    fn undecodable_numbers_are_hex() {
        assert_eq!(rendered(0xDEAD_BEEF), "0xDEADBEEF");
        assert_eq!(rendered(0x8000_1234), "0x80001234");
        assert_eq!(rendered(0x1_0000_0000), "0x100000000");
    }
}
