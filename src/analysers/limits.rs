/*============================================================
  Synavera Project: Explain
  Module: explain_core::analysers::limits
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Causes tied to process and system limits or to the kind of
    call rather than its arguments: EMFILE, ENFILE, EAGAIN,
    EINTR, ENOSYS, EPERM, EINVAL and friends.

  Security / Safety Notes:
    getrlimit, fstat and /proc/sys reads only.

  Dependencies:
    probe, mount, render::file_type.

  Operational Scope:
    Used by most explainers as default arms.

  Revision History:
    2026-10-18 COD  Authored limit analysers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Numbers only with dialect-specific output
============================================================*/

use std::fmt::Write;
use std::os::raw::c_int;

use crate::mount;
use crate::probe;
use crate::render::file_type::file_type_st;
use crate::string_buffer::StringBuffer;

const FILE_MAX: &str = "/proc/sys/fs/file-max";

/// Per-process descriptor table is full.
pub fn emfile(sb: &mut StringBuffer) {
    sb.puts("the process already has the maximum number of file descriptors open");
    if sb.options().dialect_specific {
        if let Some(limit) = probe::rlimit(libc::RLIMIT_NOFILE) {
            let _ = write!(sb, " (RLIMIT_NOFILE is {})", limit.soft);
        }
    }
}

fn system_file_max() -> Option<u64> {
    let _guard = probe::ErrnoGuard::new();
    std::fs::read_to_string(FILE_MAX).ok()?.trim().parse().ok()
}

/// System-wide open file table is full.
pub fn enfile(sb: &mut StringBuffer) {
    sb.puts("the system-wide limit on the total number of open files has been reached");
    if sb.options().dialect_specific {
        if let Some(max) = system_file_max() {
            let _ = write!(sb, " ({max})");
        }
    }
}

/// A non-blocking operation that would have had to wait.
pub fn ewouldblock(sb: &mut StringBuffer, call: &str) {
    let _ = write!(
        sb,
        "the file descriptor has been marked non-blocking (O_NONBLOCK) and the {call} system call would block"
    );
}

/// The same, but only claimed when the descriptor really is non-blocking.
pub fn ewouldblock_fildes(sb: &mut StringBuffer, fildes: c_int, caption: &str, call: &str) {
    match probe::file_status_flags(fildes) {
        Some(flags) if flags & libc::O_NONBLOCK == 0 => {
            let _ = write!(sb, "the {call} system call would block, and the {caption} argument is blocking");
            sb.puts(", the resource is temporarily unavailable");
        }
        _ => {
            let _ = write!(
                sb,
                "the {caption} argument refers to a file that has been marked non-blocking (O_NONBLOCK) and the \
                 {call} system call would block"
            );
        }
    }
}

/// A signal arrived before the call could complete.
pub fn eintr(sb: &mut StringBuffer, call: &str) {
    let _ = write!(sb, "the {call} system call was interrupted by a signal before it could complete");
}

/// The kernel does not implement the call at all.
pub fn enosys_vague(sb: &mut StringBuffer, call: &str) {
    let _ = write!(sb, "the system does not support the {call} system call");
}

fn enosys_stat(sb: &mut StringBuffer, st: &libc::stat, caption: &str, call: &str) {
    match st.st_mode & libc::S_IFMT {
        libc::S_IFREG | libc::S_IFDIR | libc::S_IFLNK => {
            let mut mount_point = sb.scratch();
            if mount::mount_point_stat(&mut mount_point, st) {
                let _ = write!(
                    sb,
                    "the file system{} does not support the {call} system call",
                    mount_point.as_str()
                );
            } else {
                let _ = write!(sb, "the file system does not support the {call} system call");
            }
        }
        _ => {
            let _ = write!(sb, "{caption} is a ");
            file_type_st(sb, st);
            let _ = write!(sb, " that does not support the {call} system call");
        }
    }
}

/// The object behind a descriptor does not support the call.
pub fn enosys_fildes(sb: &mut StringBuffer, fildes: c_int, caption: &str, call: &str) {
    match probe::fstat(fildes) {
        Ok(st) => enosys_stat(sb, &st, caption, call),
        Err(_) => {
            let _ = write!(sb, "{caption} is not associated with an object to which {call} can be applied");
        }
    }
}

/// The object named by a path does not support the call.
pub fn enosys_path(sb: &mut StringBuffer, path: &[u8], caption: &str, call: &str) {
    match probe::stat(path) {
        Ok(st) => enosys_stat(sb, &st, caption, call),
        Err(_) => {
            let _ = write!(sb, "{caption} is not associated with an object to which {call} can be applied");
        }
    }
}

pub fn eperm_vague(sb: &mut StringBuffer, call: &str) {
    let _ = write!(
        sb,
        "the process does not have the appropriate privileges to use the {call} system call"
    );
}

pub fn enobufs(sb: &mut StringBuffer) {
    sb.puts("insufficient kernel memory was available for the network buffers");
}

pub fn erange(sb: &mut StringBuffer) {
    sb.puts("the result is too large to be represented in the space provided");
}

pub fn eoverflow(sb: &mut StringBuffer) {
    sb.puts("the value is too large to be stored in the data type provided");
}

/// An argument with no valid interpretation at all.
pub fn einval_vague(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(sb, "the {caption} argument was incorrectly specified");
}

/// A flags argument with undefined bits set.
pub fn einval_bits(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(sb, "the {caption} argument contains undefined or conflicting bits");
}

pub fn einval_too_small(sb: &mut StringBuffer, caption: &str, value: i64) {
    let _ = write!(sb, "the {caption} argument was incorrectly specified, it was too small ({value})");
}

pub fn einval_too_large(sb: &mut StringBuffer, caption: &str, value: i64) {
    let _ = write!(sb, "the {caption} argument was incorrectly specified, it was too large ({value})");
}

/// Describe a resource limit as `RLIMIT_X (soft)`, dialect only.
pub fn rlimit_value(sb: &mut StringBuffer, name: &str, resource: libc::__rlimit_resource_t) {
    if !sb.options().dialect_specific {
        return;
    }
    if let Some(limit) = probe::rlimit(resource) {
        let _ = write!(sb, " ({name} is ");
        crate::render::pointer::rlim(sb, limit.soft);
        sb.putc(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn emfile_cites_the_limit() {
        let mut sb = StringBuffer::new(256, Options::default());
        emfile(&mut sb);
        let text = sb.as_str();
        assert!(text.starts_with("the process already has the maximum number of file descriptors open"));
        assert!(text.contains("(RLIMIT_NOFILE is "), "{text}");
    }

    #[test]
    fn emfile_portable_has_no_numbers() {
        let options = Options {
            dialect_specific: false,
            ..Options::default()
        };
        let mut sb = StringBuffer::new(256, options);
        emfile(&mut sb);
        assert_eq!(sb.as_str(), "the process already has the maximum number of file descriptors open");
    }

    #[test]
    fn enosys_on_a_pipe_names_its_type() {
        let mut fds = [0 as c_int; 2];
        // SAFETY: fds has room for two descriptors.
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let mut sb = StringBuffer::new(256, Options::default());
        enosys_fildes(&mut sb, fds[0], "fildes", "fsync");
        assert_eq!(sb.as_str(), "fildes is a named pipe that does not support the fsync system call");
        // SAFETY: both descriptors were opened above.
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }
}
