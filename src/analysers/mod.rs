/*============================================================
  Synavera Project: Explain
  Module: explain_core::analysers
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Reusable cause analysers, one per recurring error number,
    shared by the per-call explainers.

  Security / Safety Notes:
    Analysers only probe (stat, fcntl, getrlimit, /proc); every
    probe runs under an ErrnoGuard.

  Dependencies:
    probe, mount, permission, path_resolution, render.

  Operational Scope:
    Writes "because" clauses and footnotes into a StringBuffer.

  Revision History:
    2026-10-18 COD  Authored shared analyser layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Analysers never fail; every branch writes something
    - Specific probes first, vague wording last
============================================================*/

pub mod fildes;
pub mod holders;
pub mod limits;
pub mod memory;
pub mod path;
pub mod socket;

use std::os::raw::c_int;

use crate::string_buffer::StringBuffer;

pub use fildes::{ebadf, ebadf_dir, ebadf_stream, eio, eio_fildes, eio_path, espipe};
pub use limits::{eintr, emfile, enfile, enosys_fildes, enosys_path, enosys_vague, ewouldblock};
pub use memory::{efault, enomem_kernel, enomem_kernel_or_user, enomem_user};
pub use path::{
    eacces, ebusy, edquot, eexist, efbig, efbig_fildes, eisdir, eloop, emlink, emlink_mkdir, enametoolong, enoent, enospc,
    enospc_fildes, enotdir, enotempty, erofs, erofs_fildes, etxtbsy, exdev,
};

/// Footnote marking the failure as a bug in the caller.
pub fn software_error(sb: &mut StringBuffer) {
    sb.footnote_str("this is more likely to be a software error (a bug) than it is to be a user error");
}

/// Explanation for an error the call-specific code has no branch for.
pub fn generic(sb: &mut StringBuffer, errnum: c_int, call: &str) {
    match errnum {
        0 => {}
        libc::EAGAIN => ewouldblock(sb, call),
        libc::EMFILE => emfile(sb),
        libc::ENFILE => enfile(sb),
        libc::EPERM => limits::eperm_vague(sb, call),
        libc::EINTR => eintr(sb, call),
        libc::ENOMEDIUM => sb.puts("there is no medium present in the drive"),
        libc::ENOMEM => enomem_user(sb, 0),
        libc::ENOBUFS => limits::enobufs(sb),
        libc::ENOSYS | libc::ENOTTY | libc::EOPNOTSUPP => enosys_vague(sb, call),
        libc::ERANGE => limits::erange(sb),
        libc::EOVERFLOW => limits::eoverflow(sb),
        libc::EFAULT => {
            sb.puts("one or more arguments referred to memory outside the address space of the process")
        }
        _ => {
            if sb.options().debug {
                sb.puts("something weird happened, cause unknown");
                let note = format!(
                    "this error is undocumented for the {call} system call, the explainer for {call} has no \
                     branch for it"
                );
                sb.footnote_str(&note);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn software_error_goes_to_footnotes() {
        let mut sb = StringBuffer::with_footnotes(256, Options::default());
        software_error(&mut sb);
        assert!(sb.is_empty());
        let notes = sb.footnotes().map(|n| n.as_str().to_string()).unwrap_or_default();
        assert_eq!(notes, "; this is more likely to be a software error (a bug) than it is to be a user error");
    }

    #[test]
    fn generic_interrupt_names_the_call() {
        let mut sb = StringBuffer::new(256, Options::default());
        generic(&mut sb, libc::EINTR, "read");
        assert!(sb.as_str().contains("read"), "{}", sb.as_str());
    }

    #[test]
    fn generic_unknown_is_silent_without_debug() {
        let mut sb = StringBuffer::with_footnotes(256, Options::default());
        generic(&mut sb, libc::ECHRNG, "close");
        assert!(sb.is_empty());

        let debug = Options {
            debug: true,
            ..Options::default()
        };
        let mut sb = StringBuffer::with_footnotes(256, debug);
        generic(&mut sb, libc::ECHRNG, "close");
        assert_eq!(sb.as_str(), "something weird happened, cause unknown");
    }
}
