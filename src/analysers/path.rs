/*============================================================
  Synavera Project: Explain
  Module: explain_core::analysers::path
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Causes rooted in pathnames and the file systems holding
    them. The walker is asked first; the fixed wording here is
    the fallback when it cannot pin down a component.

  Security / Safety Notes:
    stat, pathconf and statvfs only.

  Dependencies:
    path_resolution, mount, holders, render::file_type.

  Operational Scope:
    ENOENT, ENOTDIR, EACCES, ELOOP, ENAMETOOLONG, EEXIST,
    EISDIR, EROFS, EFBIG, EMLINK, EXDEV, ENOSPC, EDQUOT,
    ETXTBSY, EBUSY, ENOTEMPTY.

  Revision History:
    2026-10-18 COD  Authored pathname analysers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - The walker's leftmost verdict beats any fixed sentence
============================================================*/

use std::fmt::Write;
use std::mem::MaybeUninit;
use std::os::raw::c_int;

use crate::analysers::holders::path_to_pid;
use crate::mount;
use crate::path_resolution::{self, FinalComponent, Want};
use crate::probe::{self, ErrnoGuard};
use crate::render::file_type::{caption_name_type, caption_name_type_st, file_type_st};
use crate::string_buffer::StringBuffer;

fn walked(sb: &mut StringBuffer, errnum: c_int, path: &[u8], caption: &str, fc: &FinalComponent) -> bool {
    path_resolution::explain(sb, errnum, path, caption, fc)
}

pub fn enoent(sb: &mut StringBuffer, path: &[u8], caption: &str, fc: &FinalComponent) {
    if !walked(sb, libc::ENOENT, path, caption, fc) {
        let _ = write!(
            sb,
            "a directory component of {caption} does not exist or is a dangling symbolic link"
        );
    }
}

pub fn enotdir(sb: &mut StringBuffer, path: &[u8], caption: &str, fc: &FinalComponent) {
    if !walked(sb, libc::ENOTDIR, path, caption, fc) {
        let _ = write!(
            sb,
            "a component used as a directory in {caption} is not, in fact, a directory"
        );
    }
}

pub fn eacces(sb: &mut StringBuffer, path: &[u8], caption: &str, fc: &FinalComponent) {
    if walked(sb, libc::EACCES, path, caption, fc) {
        return;
    }
    let _ = write!(
        sb,
        "search permission is denied for one of the directories in the path prefix of {caption}"
    );
    if fc.want.contains(Want::CREATE) {
        let _ = write!(
            sb,
            ", or write permission is denied on the directory that would hold {caption}"
        );
    } else if fc.want.intersects(Want::READ | Want::WRITE | Want::EXECUTE) {
        let _ = write!(sb, ", or the requested access to {caption} itself is not allowed");
    }
}

pub fn eloop(sb: &mut StringBuffer, path: &[u8], caption: &str, fc: &FinalComponent) {
    if !walked(sb, libc::ELOOP, path, caption, fc) {
        let _ = write!(sb, "too many symbolic links were encountered in resolving {caption}");
        if sb.options().dialect_specific {
            let _ = write!(sb, " ({})", path_resolution::SYMLOOP_MAX);
        }
    }
}

pub fn enametoolong(sb: &mut StringBuffer, path: &[u8], caption: &str, fc: &FinalComponent) {
    if !walked(sb, libc::ENAMETOOLONG, path, caption, fc) {
        let _ = write!(sb, "{caption} is too long");
        if sb.options().dialect_specific {
            let _ = write!(sb, " ({} bytes)", path.len());
        }
    }
}

/// The name the call meant to create is already taken.
pub fn eexist(sb: &mut StringBuffer, path: &[u8], caption: &str) {
    let fc = FinalComponent::new_entry(libc::S_IFREG);
    if walked(sb, libc::EEXIST, path, caption, &fc) {
        return;
    }
    let _ = write!(sb, "{caption} already exists");
}

/// The call needed a non-directory (or write access) and got a directory.
pub fn eisdir(sb: &mut StringBuffer, path: &[u8], caption: &str, writing: bool) {
    caption_name_type(sb, Some(caption), path, None);
    sb.puts(" refers to a directory");
    if writing {
        sb.puts(", and the access requested involved writing");
    }
}

fn erofs_generic(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(
        sb,
        "write access was requested and {caption} refers to a file on a read-only file system"
    );
}

fn erofs_device(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(sb, "write access was requested and {caption} refers to a read-only device");
}

pub fn erofs(sb: &mut StringBuffer, path: &[u8], caption: &str) {
    if let Ok(st) = probe::stat(path) {
        if matches!(st.st_mode & libc::S_IFMT, libc::S_IFBLK | libc::S_IFCHR) {
            erofs_device(sb, caption);
            return;
        }
    }
    erofs_generic(sb, caption);
    if !mount::mount_point(sb, path) {
        mount::mount_point_dirname(sb, path);
    }
}

pub fn erofs_fildes(sb: &mut StringBuffer, fildes: c_int, caption: &str) {
    if let Ok(st) = probe::fstat(fildes) {
        if matches!(st.st_mode & libc::S_IFMT, libc::S_IFBLK | libc::S_IFCHR) {
            erofs_device(sb, caption);
            return;
        }
    }
    erofs_generic(sb, caption);
    mount::mount_point_fd(sb, fildes);
}

/// Largest file offset the file system allows, from `_PC_FILESIZEBITS`.
fn max_file_size(bits: Option<i64>) -> Option<u64> {
    let bits = bits.filter(|&b| b > 0 && b <= 64)?;
    Some(if bits == 64 { i64::MAX as u64 } else { (1u64 << (bits - 1)) - 1 })
}

fn efbig_common(sb: &mut StringBuffer, caption: &str, length: u64, bits: Option<i64>) {
    let _ = write!(sb, "{caption} exceeds the maximum file size");
    if let Some(fsize) = probe::rlimit(libc::RLIMIT_FSIZE).filter(|l| !l.is_infinite()) {
        if length > fsize.soft {
            let _ = write!(sb, " allowed by the process's RLIMIT_FSIZE resource limit ({length} > {})", fsize.soft);
            return;
        }
    }
    if let Some(max) = max_file_size(bits) {
        let _ = write!(sb, " of the file system ({length} > {max})");
    }
}

/// The resulting file would be larger than allowed.
pub fn efbig(sb: &mut StringBuffer, path: &[u8], caption: &str, length: u64) {
    let bits = probe::pathconf(path, libc::_PC_FILESIZEBITS)
        .or_else(|| probe::pathconf(&mount::dirname(path), libc::_PC_FILESIZEBITS));
    efbig_common(sb, caption, length, bits);
}

pub fn efbig_fildes(sb: &mut StringBuffer, fildes: c_int, caption: &str, length: u64) {
    let bits = probe::fpathconf(fildes, libc::_PC_FILESIZEBITS);
    efbig_common(sb, caption, length, bits);
}

/// Link count limits for link(2) and mkdir(2).
pub fn emlink(sb: &mut StringBuffer, oldpath: &[u8], newpath: &[u8]) {
    match probe::stat(oldpath) {
        Ok(st) if st.st_mode & libc::S_IFMT == libc::S_IFDIR => {
            sb.puts("oldpath is a directory and the ");
            caption_name_type(sb, Some("newpath"), &mount::dirname(newpath), Some(libc::S_IFDIR));
            sb.puts(" already has the maximum number of links");
        }
        Ok(st) => {
            sb.puts("oldpath is a ");
            file_type_st(sb, &st);
            sb.puts(" and already has the maximum number of links");
        }
        Err(_) => sb.puts(
            "oldpath already has the maximum number of links to it, or oldpath is a directory and the directory \
             containing newpath has the maximum number of links",
        ),
    }
    if sb.options().dialect_specific {
        if let Some(max) = probe::pathconf(oldpath, libc::_PC_LINK_MAX) {
            let _ = write!(sb, " ({max})");
        }
    }
}

/// A parent directory already holds the maximum number of subdirectories.
pub fn emlink_mkdir(sb: &mut StringBuffer, path: &[u8], caption: &str) {
    let parent = mount::dirname(path);
    sb.puts("the ");
    caption_name_type(sb, Some(caption), &parent, Some(libc::S_IFDIR));
    sb.puts(" already has the maximum number of links");
    if sb.options().dialect_specific {
        if let Some(max) = probe::pathconf(&parent, libc::_PC_LINK_MAX) {
            let _ = write!(sb, " ({max})");
        }
    }
}

/// Existing path or, when missing, the directory that would hold it.
fn stat_or_parent(path: &[u8]) -> Option<libc::stat> {
    probe::stat(path).or_else(|_| probe::stat(&mount::dirname(path))).ok()
}

/// rename(2)/link(2) across file systems.
pub fn exdev(sb: &mut StringBuffer, oldpath: &[u8], newpath: &[u8], old_caption: &str, new_caption: &str) {
    sb.puts(old_caption);
    if let Some(st) = stat_or_parent(oldpath) {
        mount::mount_point_stat(sb, &st);
    }
    sb.puts(" and ");
    sb.puts(new_caption);
    if let Some(st) = stat_or_parent(newpath) {
        mount::mount_point_stat(sb, &st);
    }
    sb.puts(" are not on the same mounted file system");
}

fn free_inodes(path: &[u8]) -> Option<u64> {
    let _guard = ErrnoGuard::new();
    let c = probe::c_path(path)?;
    let mut buf = MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: c is NUL-terminated and buf is writable statvfs storage.
    if unsafe { libc::statvfs(c.as_ptr(), buf.as_mut_ptr()) } != 0 {
        return None;
    }
    // SAFETY: statvfs succeeded.
    let f = unsafe { buf.assume_init() };
    (f.f_files > 0).then_some(f.f_ffree)
}

/// No room left on the device holding `path`.
pub fn enospc(sb: &mut StringBuffer, path: &[u8], caption: &str) {
    let existing = if probe::stat(path).is_ok() { path.to_vec() } else { mount::dirname(path) };
    if free_inodes(&existing) == Some(0) {
        let _ = write!(sb, "the file system containing {caption} has no more free inodes");
    } else {
        let _ = write!(sb, "the file system containing {caption} has no more space for data");
    }
    mount::mount_point(sb, &existing);
}

pub fn enospc_fildes(sb: &mut StringBuffer, fildes: c_int, caption: &str) {
    let _ = write!(sb, "the file system containing {caption} has no more space for data");
    mount::mount_point_fd(sb, fildes);
}

/// Disk quota exhausted.
pub fn edquot(sb: &mut StringBuffer, path: &[u8], caption: &str) {
    let _ = write!(
        sb,
        "the user's quota of disk blocks or inodes on the file system containing {caption} has been exhausted"
    );
    mount::mount_point(sb, &mount::dirname(path));
}

/// Writing to, or truncating, an executable that is running.
pub fn etxtbsy(sb: &mut StringBuffer, path: &[u8], caption: &str) {
    let _ = write!(
        sb,
        "{caption} refers to an executable image which is currently being executed"
    );
    if let Ok(st) = probe::stat(path) {
        path_to_pid(sb, &st);
    }
}

/// The file or directory is in use and cannot be removed or replaced.
pub fn ebusy(sb: &mut StringBuffer, path: &[u8], caption: &str) {
    let st = match probe::stat(path) {
        Ok(st) => st,
        Err(_) => {
            let _ = write!(sb, "{caption} is in use by the system or some process");
            return;
        }
    };
    let is_mount_point = mount::mounts().iter().any(|entry| entry.dir.as_slice() == path)
        || probe::stat(&mount::dirname(path)).is_ok_and(|parent| parent.st_dev != st.st_dev);
    if is_mount_point {
        caption_name_type_st(sb, Some(caption), path, Some(&st));
        sb.puts(" is a mount point");
        return;
    }
    caption_name_type_st(sb, Some(caption), path, Some(&st));
    sb.puts(" is in use by the system or some process that prevents its removal");
    path_to_pid(sb, &st);
}

/// rmdir(2)/rename(2) on a directory that still has entries.
pub fn enotempty(sb: &mut StringBuffer, path: &[u8], caption: &str) {
    let count = probe::directory_entries(path).len();
    caption_name_type(sb, Some(caption), path, Some(libc::S_IFDIR));
    sb.puts(" contains entries other than \".\" and \"..\"");
    if count > 0 {
        let _ = write!(sb, " ({count} {})", if count == 1 { "entry" } else { "entries" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::os::unix::ffi::OsStrExt;

    fn sb() -> StringBuffer {
        StringBuffer::with_footnotes(2048, Options::default())
    }

    #[test]
    fn enoent_uses_the_walker() {
        let mut buf = sb();
        enoent(&mut buf, b"/no/such/file", "pathname", &FinalComponent::wanting(Want::READ));
        assert_eq!(buf.as_str(), "there is no \"no\" directory in the pathname \"/\" directory");
    }

    #[test]
    fn eexist_for_an_existing_directory() {
        let mut buf = sb();
        eexist(&mut buf, b"/tmp", "pathname");
        assert_eq!(buf.as_str(), "there is already a \"tmp\" directory in the pathname \"/\" directory");
    }

    #[test]
    fn enoent_falls_back_when_nothing_is_missing() {
        let mut buf = sb();
        enoent(&mut buf, b"/", "pathname", &FinalComponent::wanting(Want::READ));
        assert_eq!(
            buf.as_str(),
            "a directory component of pathname does not exist or is a dangling symbolic link"
        );
    }

    #[test]
    fn non_empty_directory_counts_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"").unwrap();
        std::fs::write(dir.path().join("b"), b"").unwrap();
        let mut buf = sb();
        enotempty(&mut buf, dir.path().as_os_str().as_bytes(), "pathname");
        assert!(buf.as_str().ends_with("contains entries other than \".\" and \"..\" (2 entries)"));
    }

    #[test]
    fn filesize_bits_give_the_limit() {
        assert_eq!(max_file_size(Some(32)), Some(2_147_483_647));
        assert_eq!(max_file_size(Some(64)), Some(i64::MAX as u64));
        assert_eq!(max_file_size(None), None);
    }

    #[test]
    fn exdev_names_both_arguments() {
        let mut buf = sb();
        exdev(&mut buf, b"/proc/self/status", b"/tmp/x", "oldpath", "newpath");
        let text = buf.as_str();
        assert!(text.starts_with("oldpath"), "{text}");
        assert!(text.contains(" and newpath"), "{text}");
        assert!(text.ends_with("are not on the same mounted file system"), "{text}");
    }

    #[test]
    fn exdev_shows_each_side_of_the_rename() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old");
        std::fs::write(&old, b"x").unwrap();
        let mut buf = sb();
        exdev(&mut buf, old.as_os_str().as_bytes(), b"/proc/new-entry", "oldpath", "newpath");
        let text = buf.as_str();
        let mounts = mount::mounts();
        if !mounts.is_empty() {
            assert!(text.starts_with("oldpath ("), "{text}");
        }
        if mounts.iter().any(|entry| entry.dir == b"/proc") {
            assert!(text.contains(" and newpath (\"/proc\")"), "{text}");
        }
        assert!(text.ends_with(" are not on the same mounted file system"), "{text}");
    }
}
