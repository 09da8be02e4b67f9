/*============================================================
  Synavera Project: Explain
  Module: explain_core::analysers::holders
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Find the processes that hold a file open, as their working
    directory, root, executable or a descriptor.

  Security / Safety Notes:
    Walks /proc/<pid> links the caller is allowed to read;
    processes of other users are silently skipped.

  Dependencies:
    probe for readlink/lstat; render::process for names.

  Operational Scope:
    EBUSY and ETXTBSY annotations.

  Revision History:
    2026-10-18 COD  Authored /proc holder scan.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Identity by device and inode, never by name
    - Output bounded to a handful of processes
============================================================*/

use std::fmt::Write;

use crate::probe::{self, ErrnoGuard};
use crate::render::process::process_name;
use crate::string_buffer::StringBuffer;

const MAX_LISTED: usize = 8;

fn same_inode(a: &libc::stat, b: &libc::stat) -> bool {
    a.st_dev == b.st_dev && a.st_ino == b.st_ino
}

fn link_is(path: &str, st: &libc::stat) -> bool {
    match probe::readlink(path.as_bytes()) {
        Ok(target) => probe::lstat(&target).is_ok_and(|other| same_inode(st, &other)),
        Err(_) => false,
    }
}

fn process_holds(pid: libc::pid_t, st: &libc::stat) -> bool {
    for link in ["cwd", "exe", "root"] {
        if link_is(&format!("/proc/{pid}/{link}"), st) {
            return true;
        }
    }
    let fd_dir = format!("/proc/{pid}/fd");
    probe::directory_entries(fd_dir.as_bytes())
        .iter()
        .filter_map(|name| std::str::from_utf8(name).ok())
        .filter(|name| name.bytes().all(|b| b.is_ascii_digit()))
        .any(|fd| link_is(&format!("{fd_dir}/{fd}"), st))
}

/// Pids of processes holding the file described by `st`.
pub fn holders(st: &libc::stat) -> Vec<libc::pid_t> {
    let _guard = ErrnoGuard::new();
    let mut pids: Vec<libc::pid_t> = probe::directory_entries(b"/proc")
        .iter()
        .filter_map(|name| std::str::from_utf8(name).ok()?.parse().ok())
        .collect();
    pids.sort_unstable();
    pids.into_iter().filter(|&pid| process_holds(pid, st)).collect()
}

/// Append ` (pid 1234 "vim", 5678 "bash")`; false when nobody
/// visible holds the file.
pub fn path_to_pid(sb: &mut StringBuffer, st: &libc::stat) -> bool {
    let pids = holders(st);
    if pids.is_empty() {
        return false;
    }
    sb.puts(" (pid");
    for (i, pid) in pids.iter().take(MAX_LISTED).enumerate() {
        if i > 0 {
            sb.putc(',');
        }
        let _ = write!(sb, " {pid}");
        if let Some(name) = process_name(*pid) {
            sb.putc(' ');
            sb.puts_quoted(name.as_bytes());
        }
    }
    if pids.len() > MAX_LISTED {
        sb.puts(", ...");
    }
    sb.putc(')');
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::io::Write as _;

    #[test]
    fn own_open_file_is_found() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"held").unwrap();
        let path = file.path().to_str().unwrap().as_bytes().to_vec();
        let st = probe::stat(&path).unwrap();
        let me = std::process::id() as libc::pid_t;
        assert!(holders(&st).contains(&me));

        let mut sb = StringBuffer::new(512, Options::default());
        assert!(path_to_pid(&mut sb, &st));
        assert!(sb.as_str().starts_with(" (pid "), "{}", sb.as_str());
    }
}
