/*============================================================
  Synavera Project: Explain
  Module: explain_core::render::open_flags
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render and parse open(2) flags, the *at() flag family,
    fcntl commands and lseek whence values.

  Security / Safety Notes:
    Pure formatting.

  Dependencies:
    parse_bits tables built from libc constants.

  Operational Scope:
    Call echoes for open, openat, fcntl, lseek, fopen.

  Revision History:
    2026-10-18 COD  Authored open flag renderers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Access mode rendered as a field, not a bit
============================================================*/

use std::fmt::Write;
use std::os::raw::c_int;

use crate::bits_table;
use crate::parse_bits::{self, BitsEntry, BitsTable, ParseBitsError};
use crate::string_buffer::StringBuffer;

/// The kernel's O_LARGEFILE bit as F_GETFL reports it on 64-bit
/// targets, where the C library defines the macro as zero.
pub const KERNEL_O_LARGEFILE: c_int = 0o100000;

/// Access mode values of the O_ACCMODE field.
pub static ACCESS_MODES: [BitsEntry; 3] = bits_table![O_RDONLY, O_WRONLY, O_RDWR];

/// Flag bits outside O_ACCMODE, composites before components.
pub static OPEN_FLAGS: [BitsEntry; 19] = [
    BitsEntry { name: "O_CREAT", value: libc::O_CREAT as i64 },
    BitsEntry { name: "O_EXCL", value: libc::O_EXCL as i64 },
    BitsEntry { name: "O_NOCTTY", value: libc::O_NOCTTY as i64 },
    BitsEntry { name: "O_TRUNC", value: libc::O_TRUNC as i64 },
    BitsEntry { name: "O_APPEND", value: libc::O_APPEND as i64 },
    BitsEntry { name: "O_NONBLOCK", value: libc::O_NONBLOCK as i64 },
    BitsEntry { name: "O_SYNC", value: libc::O_SYNC as i64 },
    BitsEntry { name: "O_DSYNC", value: libc::O_DSYNC as i64 },
    BitsEntry { name: "O_ASYNC", value: libc::O_ASYNC as i64 },
    BitsEntry { name: "O_DIRECT", value: libc::O_DIRECT as i64 },
    BitsEntry { name: "O_LARGEFILE", value: KERNEL_O_LARGEFILE as i64 },
    BitsEntry { name: "O_TMPFILE", value: libc::O_TMPFILE as i64 },
    BitsEntry { name: "O_DIRECTORY", value: libc::O_DIRECTORY as i64 },
    BitsEntry { name: "O_NOFOLLOW", value: libc::O_NOFOLLOW as i64 },
    BitsEntry { name: "O_NOATIME", value: libc::O_NOATIME as i64 },
    BitsEntry { name: "O_CLOEXEC", value: libc::O_CLOEXEC as i64 },
    BitsEntry { name: "O_PATH", value: libc::O_PATH as i64 },
    BitsEntry { name: "O_NDELAY", value: libc::O_NDELAY as i64 },
    BitsEntry { name: "O_RSYNC", value: libc::O_RSYNC as i64 },
];

/// Flags accepted by the *at() family.
pub static AT_FLAGS: [BitsEntry; 5] = bits_table![
    AT_SYMLINK_NOFOLLOW,
    AT_REMOVEDIR,
    AT_SYMLINK_FOLLOW,
    AT_EMPTY_PATH,
    AT_EACCESS,
];

/// Descriptor flags (F_GETFD / F_SETFD).
pub static FD_FLAGS: [BitsEntry; 1] = bits_table![FD_CLOEXEC];

/// fcntl(2) commands.
pub static FCNTL_COMMANDS: [BitsEntry; 20] = [
    BitsEntry { name: "F_DUPFD", value: libc::F_DUPFD as i64 },
    BitsEntry { name: "F_GETFD", value: libc::F_GETFD as i64 },
    BitsEntry { name: "F_SETFD", value: libc::F_SETFD as i64 },
    BitsEntry { name: "F_GETFL", value: libc::F_GETFL as i64 },
    BitsEntry { name: "F_SETFL", value: libc::F_SETFL as i64 },
    BitsEntry { name: "F_GETLK", value: libc::F_GETLK as i64 },
    BitsEntry { name: "F_SETLK", value: libc::F_SETLK as i64 },
    BitsEntry { name: "F_SETLKW", value: libc::F_SETLKW as i64 },
    BitsEntry { name: "F_SETOWN", value: libc::F_SETOWN as i64 },
    BitsEntry { name: "F_GETOWN", value: libc::F_GETOWN as i64 },
    BitsEntry { name: "F_SETSIG", value: 10 },
    BitsEntry { name: "F_GETSIG", value: 11 },
    BitsEntry { name: "F_SETLEASE", value: libc::F_SETLEASE as i64 },
    BitsEntry { name: "F_GETLEASE", value: libc::F_GETLEASE as i64 },
    BitsEntry { name: "F_NOTIFY", value: libc::F_NOTIFY as i64 },
    BitsEntry { name: "F_DUPFD_CLOEXEC", value: libc::F_DUPFD_CLOEXEC as i64 },
    BitsEntry { name: "F_SETPIPE_SZ", value: libc::F_SETPIPE_SZ as i64 },
    BitsEntry { name: "F_GETPIPE_SZ", value: libc::F_GETPIPE_SZ as i64 },
    BitsEntry { name: "F_OFD_GETLK", value: libc::F_OFD_GETLK as i64 },
    BitsEntry { name: "F_OFD_SETLK", value: libc::F_OFD_SETLK as i64 },
];

/// lseek(2) whence values.
pub static WHENCE: [BitsEntry; 5] = bits_table![SEEK_SET, SEEK_CUR, SEEK_END, SEEK_DATA, SEEK_HOLE];

/// Render open flags as `O_RDONLY | O_CREAT | ...`.
pub fn open_flags(sb: &mut StringBuffer, flags: c_int) {
    let access = flags & libc::O_ACCMODE;
    match parse_bits::find_by_value(i64::from(access), &ACCESS_MODES) {
        Some(entry) => sb.puts(entry.name),
        None => {
            let _ = write!(sb, "{access}");
        }
    }
    let rest = flags & !libc::O_ACCMODE;
    if rest != 0 {
        sb.puts(" | ");
        parse_bits::print(sb, i64::from(rest), &OPEN_FLAGS);
    }
}

/// Parse open flags text, including the access mode names.
pub fn parse_open_flags(text: &str) -> Result<c_int, ParseBitsError> {
    let table: Vec<BitsEntry> = ACCESS_MODES.iter().chain(OPEN_FLAGS.iter()).copied().collect();
    parse_bits::parse(text, &table).map(|v| v as c_int)
}

/// Render *at() flags.
pub fn at_flags(sb: &mut StringBuffer, flags: c_int) {
    parse_bits::print(sb, i64::from(flags), &AT_FLAGS);
}

/// Render a directory descriptor argument, spelling out AT_FDCWD.
pub fn dirfd(sb: &mut StringBuffer, fildes: c_int) {
    if fildes == libc::AT_FDCWD {
        sb.puts("AT_FDCWD");
    } else {
        super::fildes::fildes(sb, fildes);
    }
}

/// Render an fcntl command.
pub fn fcntl_command(sb: &mut StringBuffer, command: c_int) {
    parse_bits::print_single(sb, i64::from(command), &FCNTL_COMMANDS);
}

/// Render an lseek whence.
pub fn whence(sb: &mut StringBuffer, whence: c_int) {
    parse_bits::print_single(sb, i64::from(whence), &WHENCE);
}

/// Table used by the CLI for whence parsing.
pub fn whence_table() -> &'static BitsTable {
    &WHENCE
}

/// Table used by the CLI for fcntl command parsing.
pub fn fcntl_table() -> &'static BitsTable {
    &FCNTL_COMMANDS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn render(flags: c_int) -> String {
        let mut sb = StringBuffer::new(256, Options::default());
        open_flags(&mut sb, flags);
        sb.into_string()
    }

    #[test]
    fn access_mode_always_named() {
        assert_eq!(render(libc::O_RDONLY), "O_RDONLY");
        assert_eq!(render(libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC), "O_WRONLY | O_CREAT | O_TRUNC");
        assert_eq!(render(libc::O_ACCMODE), "3");
    }

    #[test]
    fn composite_flags_prefer_composite_names() {
        assert_eq!(render(libc::O_RDWR | libc::O_SYNC), "O_RDWR | O_SYNC");
        assert_eq!(render(libc::O_RDONLY | libc::O_TMPFILE), "O_RDONLY | O_TMPFILE");
    }

    #[test]
    fn rendered_flags_parse_back() {
        for flags in [
            libc::O_RDONLY,
            libc::O_WRONLY | libc::O_CREAT | libc::O_EXCL,
            libc::O_RDWR | libc::O_APPEND | libc::O_CLOEXEC | libc::O_NOFOLLOW,
            libc::O_RDONLY | libc::O_DIRECTORY | 0x4000_0000,
        ] {
            assert_eq!(parse_open_flags(&render(flags)), Ok(flags));
        }
    }

    #[test]
    fn at_fdcwd_is_symbolic() {
        let mut sb = StringBuffer::new(64, Options::default());
        dirfd(&mut sb, libc::AT_FDCWD);
        assert_eq!(sb.as_str(), "AT_FDCWD");
    }
}
