/*============================================================
  Synavera Project: Explain
  Module: explain_core::analysers::memory
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Memory causes: EFAULT for unreadable arguments and ENOMEM
    in its kernel and user-space forms.

  Security / Safety Notes:
    Reads RLIMIT_AS and RLIMIT_DATA; never allocates on the
    caller's behalf.

  Dependencies:
    probe, render::pointer.

  Operational Scope:
    malloc/mmap/fork explainers and every pointer argument.

  Revision History:
    2026-10-18 COD  Authored memory analysers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - A request larger than the address-space limit is named
      with both numbers
============================================================*/

use std::fmt::Write;

use crate::probe;
use crate::render::pointer::pretty_size;
use crate::string_buffer::StringBuffer;

/// The argument named `caption` points at unmapped memory.
pub fn efault(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(
        sb,
        "{caption} refers to memory that is outside the process's accessible address space"
    );
}

pub fn enomem_kernel(sb: &mut StringBuffer) {
    sb.puts("insufficient kernel memory was available");
}

pub fn enomem_kernel_or_user(sb: &mut StringBuffer) {
    sb.puts("insufficient kernel or user-space memory was available");
}

fn limit_clause(sb: &mut StringBuffer, size: u64, name: &str, resource: libc::__rlimit_resource_t) -> bool {
    let Some(limit) = probe::rlimit(resource) else {
        return false;
    };
    if limit.is_infinite() || size <= limit.soft {
        return false;
    }
    let _ = write!(
        sb,
        ", probably by exceeding the process's maximum memory size limit {name} ({size} > {})",
        limit.soft
    );
    if sb.options().dialect_specific {
        sb.puts(", ");
        pretty_size(sb, size);
        sb.puts(" was requested");
    }
    true
}

/// User-space allocation failed; `size` is the request, 0 if unknown.
pub fn enomem_user(sb: &mut StringBuffer, size: u64) {
    sb.puts("insufficient user-space memory was available");
    if size == 0 {
        return;
    }
    if !limit_clause(sb, size, "RLIMIT_AS", libc::RLIMIT_AS) {
        limit_clause(sb, size, "RLIMIT_DATA", libc::RLIMIT_DATA);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use serial_test::serial;

    #[test]
    fn efault_names_the_argument() {
        let mut sb = StringBuffer::new(256, Options::default());
        efault(&mut sb, "buf");
        assert_eq!(
            sb.as_str(),
            "buf refers to memory that is outside the process's accessible address space"
        );
    }

    #[test]
    #[serial]
    fn address_space_limit_is_quoted() {
        let Some(before) = probe::rlimit(libc::RLIMIT_AS) else {
            return;
        };
        let lowered = libc::rlimit {
            rlim_cur: 1 << 40,
            rlim_max: before.hard,
        };
        // SAFETY: lowering the soft limit within the hard limit is always allowed.
        if before.hard < (1 << 40) || unsafe { libc::setrlimit(libc::RLIMIT_AS, &lowered) } != 0 {
            return;
        }
        let mut sb = StringBuffer::new(512, Options::default());
        enomem_user(&mut sb, 1 << 41);
        let restore = libc::rlimit {
            rlim_cur: before.soft,
            rlim_max: before.hard,
        };
        // SAFETY: restores the values read above.
        unsafe { libc::setrlimit(libc::RLIMIT_AS, &restore) };
        assert!(sb.as_str().contains("RLIMIT_AS (2199023255552 > 1099511627776)"), "{}", sb.as_str());
    }
}
