/*============================================================
  Synavera Project: Explain
  Module: explain_core::render::memory
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render mmap protection and mapping flags.

  Security / Safety Notes:
    Pure formatting.

  Dependencies:
    parse_bits tables built from libc constants.

  Operational Scope:
    Call echoes for mmap and munmap.

  Revision History:
    2026-10-18 COD  Authored memory renderers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Mapping type rendered as a field, not a bit
============================================================*/

use std::os::raw::c_int;

use crate::bits_table;
use crate::parse_bits::{self, BitsEntry, ParseBitsError};
use crate::string_buffer::StringBuffer;

/// mmap protection bits.
pub static PROT: [BitsEntry; 6] =
    bits_table![PROT_NONE, PROT_READ, PROT_WRITE, PROT_EXEC, PROT_GROWSDOWN, PROT_GROWSUP];

/// Mapping type values under MAP_TYPE.
pub static MAP_TYPES: [BitsEntry; 3] = [
    BitsEntry { name: "MAP_SHARED", value: libc::MAP_SHARED as i64 },
    BitsEntry { name: "MAP_PRIVATE", value: libc::MAP_PRIVATE as i64 },
    BitsEntry { name: "MAP_SHARED_VALIDATE", value: 0x03 },
];

/// Mapping flag bits outside MAP_TYPE.
pub static MAP_FLAGS: [BitsEntry; 13] = bits_table![
    MAP_FIXED,
    MAP_ANONYMOUS,
    MAP_GROWSDOWN,
    MAP_DENYWRITE,
    MAP_EXECUTABLE,
    MAP_LOCKED,
    MAP_NORESERVE,
    MAP_POPULATE,
    MAP_NONBLOCK,
    MAP_STACK,
    MAP_HUGETLB,
    MAP_FIXED_NOREPLACE,
    MAP_32BIT,
];

const MAP_TYPE_MASK: c_int = 0x0f;

pub fn prot(sb: &mut StringBuffer, prot: c_int) {
    parse_bits::print(sb, i64::from(prot), &PROT);
}

/// Render mapping flags: the type first, then the modifier bits.
pub fn map_flags(sb: &mut StringBuffer, flags: c_int) {
    let kind = flags & MAP_TYPE_MASK;
    parse_bits::print_single(sb, i64::from(kind), &MAP_TYPES);
    let rest = flags & !MAP_TYPE_MASK;
    if rest != 0 {
        sb.puts(" | ");
        parse_bits::print(sb, i64::from(rest), &MAP_FLAGS);
    }
}

/// Parse mapping flags text.
pub fn parse_map_flags(text: &str) -> Result<c_int, ParseBitsError> {
    let table: Vec<BitsEntry> = MAP_TYPES.iter().chain(MAP_FLAGS.iter()).copied().collect();
    parse_bits::parse(text, &table).map(|v| v as c_int)
}

/// Parse protection text.
pub fn parse_prot(text: &str) -> Result<c_int, ParseBitsError> {
    parse_bits::parse(text, &PROT).map(|v| v as c_int)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn flags_round_trip() {
        let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_FIXED;
        let mut sb = StringBuffer::new(128, Options::default());
        map_flags(&mut sb, flags);
        assert_eq!(sb.as_str(), "MAP_PRIVATE | MAP_FIXED | MAP_ANONYMOUS");
        assert_eq!(parse_map_flags(sb.as_str()), Ok(flags));
    }

    #[test]
    fn prot_none_is_named() {
        let mut sb = StringBuffer::new(64, Options::default());
        prot(&mut sb, libc::PROT_NONE);
        sb.putc(' ');
        prot(&mut sb, libc::PROT_READ | libc::PROT_WRITE);
        assert_eq!(sb.as_str(), "PROT_NONE PROT_READ | PROT_WRITE");
    }
}
