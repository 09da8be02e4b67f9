/*============================================================
  Synavera Project: Explain
  Module: explain_core::mount
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Locate the mount point holding a file and report its mount
    options and fill level.

  Security / Safety Notes:
    Reads /proc/self/mounts and calls statvfs; never mounts or
    remounts anything.

  Dependencies:
    probe for stat; libc for statvfs.

  Operational Scope:
    Annotations for EROFS, ENOSPC, EXDEV, ENOSYS and the
    walker's noexec/nosuid checks.

  Revision History:
    2026-10-18 COD  Authored mount table helpers.
    2026-10-18 COD  Mount table parsed as bytes; MountTable snapshots.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Device number is the identity of a file system
    - Missing /proc degrades to no annotation
============================================================*/

use std::fmt::Write;
use std::mem::MaybeUninit;
use std::os::raw::c_int;

use crate::probe::{self, ErrnoGuard};
use crate::string_buffer::StringBuffer;

const MOUNT_TABLE: &str = "/proc/self/mounts";

/// One line of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub source: Vec<u8>,
    pub dir: Vec<u8>,
    pub fs_type: String,
    pub options: Vec<String>,
}

impl MountEntry {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    pub fn is_read_only(&self) -> bool {
        self.has_option("ro")
    }
}

/// Undo the octal escaping the kernel applies to spaces and tabs.
fn unescape(field: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(field.len());
    let mut i = 0;
    while i < field.len() {
        let octal = i + 3 < field.len() && field[i + 1..i + 4].iter().all(|b| (b'0'..=b'7').contains(b));
        if field[i] == b'\\' && octal {
            let value = field[i + 1..i + 4]
                .iter()
                .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
            out.push(value as u8);
            i += 4;
        } else {
            out.push(field[i]);
            i += 1;
        }
    }
    out
}

/// Parse the raw bytes of a mounts file. Mount points are arbitrary
/// byte strings; only the type and option columns are decoded.
pub fn parse_mounts(raw: &[u8]) -> Vec<MountEntry> {
    raw.split(|&b| b == b'\n')
        .filter_map(|line| {
            let mut fields = line
                .split(|b| b.is_ascii_whitespace())
                .filter(|field| !field.is_empty());
            let source = fields.next()?;
            let dir = fields.next()?;
            let fs_type = fields.next()?;
            let options = fields.next().unwrap_or_default();
            Some(MountEntry {
                source: unescape(source),
                dir: unescape(dir),
                fs_type: String::from_utf8_lossy(fs_type).into_owned(),
                options: options
                    .split(|&b| b == b',')
                    .map(|o| String::from_utf8_lossy(o).into_owned())
                    .collect(),
            })
        })
        .collect()
}

/// A snapshot of the mount table, consulted by device number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountTable {
    entries: Vec<MountEntry>,
}

impl MountTable {
    /// Current mount table; empty when /proc is unavailable.
    pub fn load() -> Self {
        let _guard = ErrnoGuard::new();
        let raw = std::fs::read(MOUNT_TABLE).unwrap_or_default();
        Self::from_bytes(&raw)
    }

    pub fn from_bytes(raw: &[u8]) -> Self {
        Self {
            entries: parse_mounts(raw),
        }
    }

    pub fn entries(&self) -> &[MountEntry] {
        &self.entries
    }

    /// The mount whose root lives on device `dev`; later (covering)
    /// mounts win over earlier ones.
    pub fn find_by_dev(&self, dev: libc::dev_t) -> Option<&MountEntry> {
        self.entries
            .iter()
            .filter(|entry| matches!(probe::stat(&entry.dir), Ok(st) if st.st_dev == dev))
            .last()
    }

    pub fn dev_has_option(&self, dev: libc::dev_t, option: &str) -> bool {
        self.find_by_dev(dev).is_some_and(|entry| entry.has_option(option))
    }

    pub fn path_has_option(&self, path: &[u8], option: &str) -> bool {
        probe::stat(path).is_ok_and(|st| self.dev_has_option(st.st_dev, option))
    }

    pub fn is_read_only_dev(&self, dev: libc::dev_t) -> bool {
        self.dev_has_option(dev, "ro")
    }

    /// Append ` ("/mnt", 87% full)` for the file system on `dev`.
    /// Returns false, writing nothing, when no mount matches.
    pub fn mount_point_dev(&self, sb: &mut StringBuffer, dev: libc::dev_t) -> bool {
        let Some(entry) = self.find_by_dev(dev) else {
            return false;
        };
        sb.puts(" (");
        sb.puts_quoted(&entry.dir);
        if let Some(percent) = percent_full(&entry.dir) {
            let _ = write!(sb, ", {percent}% full");
        }
        sb.putc(')');
        true
    }

    pub fn mount_point(&self, sb: &mut StringBuffer, path: &[u8]) -> bool {
        match probe::stat(path) {
            Ok(st) => self.mount_point_dev(sb, st.st_dev),
            Err(_) => false,
        }
    }
}

/// Entries of the current mount table.
pub fn mounts() -> Vec<MountEntry> {
    MountTable::load().entries
}

/// Percentage of usable blocks in use, rounded.
fn percent_full(dir: &[u8]) -> Option<u32> {
    let _guard = ErrnoGuard::new();
    let path = probe::c_path(dir)?;
    let mut buf = MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: path is NUL-terminated and buf is writable statvfs storage.
    if unsafe { libc::statvfs(path.as_ptr(), buf.as_mut_ptr()) } != 0 {
        return None;
    }
    // SAFETY: statvfs succeeded.
    let f = unsafe { buf.assume_init() };
    let reserved = f.f_bfree.saturating_sub(f.f_bavail);
    let blocks = f.f_blocks.saturating_sub(reserved);
    let used = blocks.checked_sub(f.f_bavail)?;
    if blocks == 0 || used > f.f_blocks {
        return None;
    }
    Some((0.5 + 100.0 * used as f64 / blocks as f64) as u32)
}

pub fn mount_point_dev(sb: &mut StringBuffer, dev: libc::dev_t) -> bool {
    MountTable::load().mount_point_dev(sb, dev)
}

pub fn mount_point_stat(sb: &mut StringBuffer, st: &libc::stat) -> bool {
    mount_point_dev(sb, st.st_dev)
}

pub fn mount_point_fd(sb: &mut StringBuffer, fildes: c_int) -> bool {
    match probe::fstat(fildes) {
        Ok(st) => mount_point_stat(sb, &st),
        Err(_) => false,
    }
}

pub fn mount_point(sb: &mut StringBuffer, path: &[u8]) -> bool {
    match probe::stat(path) {
        Ok(st) => mount_point_stat(sb, &st),
        Err(_) => false,
    }
}

/// Mount point of the directory that would hold `path`.
pub fn mount_point_dirname(sb: &mut StringBuffer, path: &[u8]) -> bool {
    mount_point(sb, &dirname(path))
}

pub fn is_noexec(path: &[u8]) -> bool {
    MountTable::load().path_has_option(path, "noexec")
}

pub fn is_nosuid(path: &[u8]) -> bool {
    MountTable::load().path_has_option(path, "nosuid")
}

pub fn is_nodev(st: &libc::stat) -> bool {
    MountTable::load().dev_has_option(st.st_dev, "nodev")
}

pub fn is_read_only_dev(dev: libc::dev_t) -> bool {
    MountTable::load().is_read_only_dev(dev)
}

/// Whether the file system holding `path` (or, when it does not
/// exist, its directory) is mounted read-only.
pub fn is_read_only_path(path: &[u8]) -> bool {
    match probe::stat(path) {
        Ok(st) => is_read_only_dev(st.st_dev),
        Err(_) => probe::stat(&dirname(path)).is_ok_and(|st| is_read_only_dev(st.st_dev)),
    }
}

/// Directory part of a path, `.` when there is none.
pub fn dirname(path: &[u8]) -> Vec<u8> {
    let trimmed = match path.iter().rposition(|&b| b != b'/') {
        Some(end) => &path[..=end],
        None => return if path.is_empty() { b".".to_vec() } else { b"/".to_vec() },
    };
    match trimmed.iter().rposition(|&b| b == b'/') {
        None => b".".to_vec(),
        Some(0) => b"/".to_vec(),
        Some(slash) => {
            let mut end = slash;
            while end > 0 && trimmed[end - 1] == b'/' {
                end -= 1;
            }
            if end == 0 {
                b"/".to_vec()
            } else {
                trimmed[..end].to_vec()
            }
        }
    }
}

/// Last component of a path.
pub fn basename(path: &[u8]) -> Vec<u8> {
    let trimmed = match path.iter().rposition(|&b| b != b'/') {
        Some(end) => &path[..=end],
        None => return if path.is_empty() { Vec::new() } else { b"/".to_vec() },
    };
    match trimmed.iter().rposition(|&b| b == b'/') {
        Some(slash) => trimmed[slash + 1..].to_vec(),
        None => trimmed.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::os::unix::ffi::OsStrExt;

    #[test]
    fn mount_lines_are_parsed() {
        let text = b"proc /proc proc rw,nosuid,nodev,noexec 0 0\n\
                    /dev/sdb1 /media/my\\040disk vfat ro,relatime 0 0\n";
        let entries = parse_mounts(text);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].has_option("noexec"));
        assert_eq!(entries[1].dir, b"/media/my disk");
        assert!(entries[1].is_read_only());
    }

    #[test]
    fn mount_points_need_not_be_utf8() {
        let mut raw = b"/dev/sdc1 /media/caf\xe9 ext4 ro,noexec 0 0\n".to_vec();
        raw.extend_from_slice(b"tmpfs /tmp tmpfs rw 0 0\n");
        let table = MountTable::from_bytes(&raw);
        let entries = table.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].dir, b"/media/caf\xe9");
        assert!(entries[0].is_read_only());
        assert!(entries[0].has_option("noexec"));
        assert_eq!(entries[1].fs_type, "tmpfs");
    }

    #[test]
    fn later_mounts_cover_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().as_os_str().as_bytes();
        let mut raw = b"rootfs / rootfs rw 0 0\nscratch ".to_vec();
        raw.extend_from_slice(path);
        raw.extend_from_slice(b" tmpfs ro 0 0\n");
        let table = MountTable::from_bytes(&raw);
        let st = probe::stat(path).unwrap();
        assert!(table.is_read_only_dev(st.st_dev));
        let mut sb = StringBuffer::new(4096, Options::default());
        assert!(table.mount_point_dev(&mut sb, st.st_dev));
        assert!(sb.as_str().starts_with(&format!(" (\"{}\"", dir.path().display())), "{}", sb.as_str());
    }

    #[test]
    fn dirname_and_basename() {
        assert_eq!(dirname(b"/a/b/c"), b"/a/b");
        assert_eq!(dirname(b"/a"), b"/");
        assert_eq!(dirname(b"a"), b".");
        assert_eq!(dirname(b"a//b/"), b"a");
        assert_eq!(basename(b"/a/b/c/"), b"c");
        assert_eq!(basename(b"/"), b"/");
    }

    #[test]
    fn root_has_a_mount_point() {
        let mut sb = StringBuffer::new(128, Options::default());
        if mount_point(&mut sb, b"/") {
            assert!(sb.as_str().starts_with(" (\"/"), "{}", sb.as_str());
            assert!(sb.as_str().ends_with(')'));
        }
    }
}
