/*============================================================
  Synavera Project: Explain
  Module: explain_core::analysers::fildes
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Causes rooted in file descriptor and stream state: EBADF,
    wrong access mode, ESPIPE and EIO.

  Security / Safety Notes:
    fstat and fcntl(F_GETFL) only; descriptors are never
    opened, closed or changed.

  Dependencies:
    probe, render::file_type, render::open_flags.

  Operational Scope:
    read/write/close/lseek and the stdio explainers.

  Revision History:
    2026-10-18 COD  Authored descriptor analysers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Negative, out-of-range and closed are distinct causes
============================================================*/

use std::fmt::Write;
use std::os::raw::c_int;

use crate::analysers::software_error;
use crate::probe;
use crate::render::file_type::file_type_st;
use crate::render::open_flags::open_flags;
use crate::string_buffer::StringBuffer;

/// `fildes` is negative, beyond the descriptor table, or closed.
pub fn ebadf(sb: &mut StringBuffer, fildes: c_int, caption: &str) {
    if fildes < 0 {
        let _ = write!(sb, "the {caption} argument ({fildes}) is negative, it must be a valid file descriptor");
    } else if u64::try_from(fildes).is_ok_and(|fd| fd >= probe::open_max()) {
        let _ = write!(
            sb,
            "the {caption} argument ({fildes}) is larger than the largest file descriptor the process may have open"
        );
        if sb.options().dialect_specific {
            let _ = write!(sb, " (RLIMIT_NOFILE is {})", probe::open_max());
        }
    } else {
        let _ = write!(sb, "the {caption} argument ({fildes}) does not refer to an open file");
    }
    software_error(sb);
}

/// A stream argument that is not a valid `FILE *`.
pub fn ebadf_stream(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(sb, "the {caption} argument does not refer to a valid stream");
    software_error(sb);
}

/// A directory stream argument that is not a valid `DIR *`.
pub fn ebadf_dir(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(sb, "the {caption} argument does not refer to a valid directory stream");
    software_error(sb);
}

fn access_mode_clause(sb: &mut StringBuffer, fildes: c_int) {
    if let Some(flags) = probe::file_status_flags(fildes) {
        sb.puts(", it was opened ");
        open_flags(sb, flags & libc::O_ACCMODE);
    }
}

/// The descriptor is open but was not opened for reading.
pub fn not_open_for_reading(sb: &mut StringBuffer, fildes: c_int, caption: &str) {
    let _ = write!(sb, "the {caption} argument is not open for reading");
    access_mode_clause(sb, fildes);
}

/// The descriptor is open but was not opened for writing.
pub fn not_open_for_writing(sb: &mut StringBuffer, fildes: c_int, caption: &str) {
    let _ = write!(sb, "the {caption} argument is not open for writing");
    access_mode_clause(sb, fildes);
}

/// Whether `fildes` is open with an access mode allowing reads.
pub fn is_open_for_reading(fildes: c_int) -> Option<bool> {
    probe::file_status_flags(fildes).map(|flags| flags & libc::O_ACCMODE != libc::O_WRONLY)
}

/// Whether `fildes` is open with an access mode allowing writes.
pub fn is_open_for_writing(fildes: c_int) -> Option<bool> {
    probe::file_status_flags(fildes).map(|flags| flags & libc::O_ACCMODE != libc::O_RDONLY)
}

/// Full EBADF analysis for calls needing a readable descriptor.
pub fn ebadf_reading(sb: &mut StringBuffer, fildes: c_int, caption: &str) {
    match is_open_for_reading(fildes) {
        Some(false) => {
            not_open_for_reading(sb, fildes, caption);
            software_error(sb);
        }
        _ => ebadf(sb, fildes, caption),
    }
}

/// Full EBADF analysis for calls needing a writable descriptor.
pub fn ebadf_writing(sb: &mut StringBuffer, fildes: c_int, caption: &str) {
    match is_open_for_writing(fildes) {
        Some(false) => {
            not_open_for_writing(sb, fildes, caption);
            software_error(sb);
        }
        _ => ebadf(sb, fildes, caption),
    }
}

/// Seeking is meaningless on pipes, sockets and FIFOs.
pub fn espipe(sb: &mut StringBuffer, fildes: c_int, caption: &str) {
    let _ = write!(sb, "the {caption} argument is associated with a pipe, socket, or FIFO");
    if let Ok(st) = probe::fstat(fildes) {
        sb.puts(" (");
        file_type_st(sb, &st);
        sb.putc(')');
    }
    sb.puts(", and it is not possible to seek on it");
}

fn possibly_preceding(sb: &mut StringBuffer, fildes: c_int) {
    let mode = probe::file_status_flags(fildes).map(|f| f & libc::O_ACCMODE);
    sb.puts(", ");
    match mode {
        Some(libc::O_RDONLY) => sb.puts("possibly as a result of a preceding read(2) system call"),
        Some(libc::O_WRONLY) => sb.puts("possibly as a result of a preceding write(2) system call"),
        _ => sb.puts("possibly as a result of a preceding read(2) or write(2) system call"),
    }
}

/// Low-level I/O error with no better detail.
pub fn eio(sb: &mut StringBuffer) {
    sb.puts("a low-level I/O error occurred, probably in hardware");
    possibly_preceding(sb, -1);
}

fn eio_stat(sb: &mut StringBuffer, fildes: c_int, st: &libc::stat) {
    match st.st_mode & libc::S_IFMT {
        libc::S_IFBLK | libc::S_IFCHR => {
            sb.puts("a low-level I/O error occurred in the ");
            file_type_st(sb, st);
            possibly_preceding(sb, fildes);
        }
        _ => {
            sb.puts("a low-level I/O error occurred, probably in hardware");
            possibly_preceding(sb, fildes);
        }
    }
}

/// EIO on an open descriptor, naming the device when it is one.
pub fn eio_fildes(sb: &mut StringBuffer, fildes: c_int) {
    match probe::fstat(fildes) {
        Ok(st) => eio_stat(sb, fildes, &st),
        Err(_) => eio(sb),
    }
}

/// EIO on a pathname.
pub fn eio_path(sb: &mut StringBuffer, path: &[u8]) {
    match probe::stat(path).or_else(|_| probe::lstat(path)) {
        Ok(st) => eio_stat(sb, -1, &st),
        Err(_) => eio(sb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::os::unix::io::AsRawFd;

    fn sb() -> StringBuffer {
        StringBuffer::with_footnotes(512, Options::default())
    }

    #[test]
    fn closed_descriptor() {
        let mut buf = sb();
        ebadf(&mut buf, 7_000, "fildes");
        assert!(buf.as_str().starts_with("the fildes argument (7000)"), "{}", buf.as_str());
        assert!(buf.footnotes().is_some_and(|n| n.as_str().contains("software error")));
    }

    #[test]
    fn negative_descriptor() {
        let mut buf = sb();
        ebadf(&mut buf, -1, "fildes");
        assert!(buf.as_str().contains("(-1) is negative"));
    }

    #[test]
    fn read_only_descriptor_is_not_writable() {
        let file = std::fs::File::open("/dev/null").unwrap();
        let mut buf = sb();
        ebadf_writing(&mut buf, file.as_raw_fd(), "fildes");
        assert_eq!(buf.as_str(), "the fildes argument is not open for writing, it was opened O_RDONLY");
    }

    #[test]
    fn pipes_cannot_seek() {
        let (reader, _writer) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut buf = sb();
        espipe(&mut buf, reader.as_raw_fd(), "fildes");
        assert!(buf.as_str().contains("(socket)"), "{}", buf.as_str());
    }
}
