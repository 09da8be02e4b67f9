/*============================================================
  Synavera Project: Explain
  Module: explain_core::render::fildes
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render file descriptor arguments, annotated with the path
    the descriptor refers to when it is open.

  Security / Safety Notes:
    Reads /proc/self/fd links only.

  Dependencies:
    probe for descriptor introspection.

  Operational Scope:
    Call echoes for every descriptor-taking call.

  Revision History:
    2026-10-18 COD  Authored descriptor renderer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Closed descriptors rendered as bare numbers
============================================================*/

use std::fmt::Write;
use std::os::raw::c_int;
use std::os::unix::ffi::OsStrExt;

use crate::probe;
use crate::string_buffer::StringBuffer;

/// `7 "/var/log/syslog"` for an open descriptor, `7` otherwise.
pub fn fildes(sb: &mut StringBuffer, fildes: c_int) {
    let _ = write!(sb, "{fildes}");
    fildes_to_pathname(sb, fildes);
}

/// Append ` "path"` when the descriptor is open.
pub fn fildes_to_pathname(sb: &mut StringBuffer, fildes: c_int) {
    if let Some(path) = probe::fildes_to_path(fildes) {
        sb.putc(' ');
        sb.puts_quoted(path.as_os_str().as_bytes());
    }
}

/// Render a `FILE *` argument through its underlying descriptor.
pub fn stream(sb: &mut StringBuffer, fp: *mut libc::FILE) {
    if fp.is_null() {
        sb.puts("NULL");
        return;
    }
    super::pointer::pointer(sb, fp as *const libc::c_void);
    if let Some(fd) = stream_fileno(fp) {
        fildes_to_pathname(sb, fd);
    }
}

/// Descriptor behind a stream, if the stream memory is readable.
pub fn stream_fileno(fp: *mut libc::FILE) -> Option<c_int> {
    if !probe::is_readable(fp as *const libc::c_void, std::mem::size_of::<usize>() * 8) {
        return None;
    }
    let _guard = probe::ErrnoGuard::new();
    // SAFETY: the stream structure is mapped; fileno only reads it.
    let fd = unsafe { libc::fileno(fp) };
    (fd >= 0).then_some(fd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::os::unix::io::AsRawFd;

    #[test]
    fn closed_descriptor_is_bare() {
        let mut sb = StringBuffer::new(64, Options::default());
        fildes(&mut sb, 999_999);
        assert_eq!(sb.as_str(), "999999");
    }

    #[test]
    fn open_descriptor_names_path() {
        let file = std::fs::File::open("/dev/null").unwrap();
        let mut sb = StringBuffer::new(128, Options::default());
        fildes(&mut sb, file.as_raw_fd());
        assert_eq!(sb.as_str(), format!("{} \"/dev/null\"", file.as_raw_fd()));
    }
}
