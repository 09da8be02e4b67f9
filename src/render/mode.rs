/*============================================================
  Synavera Project: Explain
  Module: explain_core::render::mode
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render permission modes, stat modes, access(2) modes and
    `rwx` triplets.

  Security / Safety Notes:
    Pure formatting.

  Dependencies:
    parse_bits tables built from libc constants.

  Operational Scope:
    Call echoes for open, mkdir, chmod, access; permission
    explanations.

  Revision History:
    2026-10-18 COD  Authored mode renderers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Octal by default, symbolic on request
============================================================*/

use std::fmt::Write;

use crate::bits_table;
use crate::parse_bits::{self, BitsEntry, BitsTable};
use crate::string_buffer::StringBuffer;

/// Permission bits, composite masks before their components.
pub static PERMISSION_BITS: [BitsEntry; 15] = bits_table![
    S_ISUID, S_ISGID, S_ISVTX, S_IRWXU, S_IRUSR, S_IWUSR, S_IXUSR, S_IRWXG, S_IRGRP, S_IWGRP,
    S_IXGRP, S_IRWXO, S_IROTH, S_IWOTH, S_IXOTH,
];

/// File type constants for stat modes.
pub static FILE_TYPE_BITS: [BitsEntry; 7] =
    bits_table![S_IFSOCK, S_IFLNK, S_IFREG, S_IFBLK, S_IFDIR, S_IFCHR, S_IFIFO];

/// access(2) mode bits.
pub static ACCESS_MODES: [BitsEntry; 4] = bits_table![F_OK, R_OK, W_OK, X_OK];

/// Render permission bits: octal, or ORed names with
/// symbolic-mode-bits.
pub fn permission_mode(sb: &mut StringBuffer, mode: u32) {
    let mode = mode & 0o7777;
    if sb.options().symbolic_mode_bits {
        parse_bits::print(sb, i64::from(mode), &PERMISSION_BITS);
    } else if mode == 0 {
        sb.putc('0');
    } else {
        let _ = write!(sb, "0{mode:o}");
    }
}

/// Render a full stat mode: type constant then permission bits.
pub fn stat_mode(sb: &mut StringBuffer, mode: u32) {
    let kind = mode & libc::S_IFMT;
    if kind != 0 {
        parse_bits::print_single(sb, i64::from(kind), &FILE_TYPE_BITS);
        if mode & 0o7777 == 0 {
            return;
        }
        sb.puts(" | ");
    }
    permission_mode(sb, mode);
}

/// Render an access(2) mode.
pub fn access_mode(sb: &mut StringBuffer, mode: i32) {
    parse_bits::print(sb, i64::from(mode), &ACCESS_MODES);
}

/// Permission triplet such as `rw-` for the bits under `shift`
/// (6 owner, 3 group, 0 other).
pub fn rwx(mode: u32, shift: u32) -> String {
    let bits = (mode >> shift) & 0o7;
    let mut text = String::with_capacity(3);
    text.push(if bits & 4 != 0 { 'r' } else { '-' });
    text.push(if bits & 2 != 0 { 'w' } else { '-' });
    text.push(if bits & 1 != 0 { 'x' } else { '-' });
    text
}

/// Table used by the CLI to parse permission modes.
pub fn permission_table() -> &'static BitsTable {
    &PERMISSION_BITS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn octal_by_default() {
        let mut sb = StringBuffer::new(64, Options::default());
        permission_mode(&mut sb, 0o755);
        assert_eq!(sb.as_str(), "0755");
    }

    #[test]
    fn symbolic_when_requested() {
        let options = Options {
            symbolic_mode_bits: true,
            ..Options::default()
        };
        let mut sb = StringBuffer::new(128, options);
        permission_mode(&mut sb, 0o750);
        assert_eq!(sb.as_str(), "S_IRWXU | S_IRGRP | S_IXGRP");
    }

    #[test]
    fn stat_modes_carry_type() {
        let mut sb = StringBuffer::new(64, Options::default());
        stat_mode(&mut sb, libc::S_IFDIR | 0o700);
        assert_eq!(sb.as_str(), "S_IFDIR | 0700");
    }

    #[test]
    fn triplets() {
        assert_eq!(rwx(0o754, 6), "rwx");
        assert_eq!(rwx(0o754, 3), "r-x");
        assert_eq!(rwx(0o754, 0), "r--");
    }

    #[test]
    fn access_modes() {
        let mut sb = StringBuffer::new(64, Options::default());
        access_mode(&mut sb, libc::R_OK | libc::W_OK);
        sb.putc(' ');
        access_mode(&mut sb, libc::F_OK);
        assert_eq!(sb.as_str(), "R_OK | W_OK F_OK");
    }
}
