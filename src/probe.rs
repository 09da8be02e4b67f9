/*============================================================
  Synavera Project: Explain
  Module: explain_core::probe
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Fault-safe inspection of caller supplied pointers, errno
    preservation, and thin wrappers over the read-only system
    probes (stat, fcntl, rlimit, pathconf) used by analysers.

  Security / Safety Notes:
    Pointer readability is verified by writing the range into a
    private non-blocking pipe; the kernel reports EFAULT for
    unmapped memory instead of raising SIGSEGV. Memory is only
    dereferenced after the probe succeeds. Every probe is
    wrapped in an ErrnoGuard so the caller's errno survives.

  Dependencies:
    libc for raw system calls.

  Operational Scope:
    Leaf layer consulted by renderers, the path walker and all
    cause analysers.

  Revision History:
    2026-10-18 COD  Authored pointer and state probes.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Unsafe code confined to small audited helpers
    - Read-only interaction with the system
    - Errno transparency for callers
============================================================*/

use std::ffi::{CStr, CString};
use std::mem::MaybeUninit;
use std::os::raw::{c_char, c_int, c_void};
use std::path::PathBuf;

/// Upper bound on the bytes scanned when probing a C string.
pub const STRING_PROBE_LIMIT: usize = 8192;

/// Largest chunk written to the probe pipe in one call.
const PROBE_CHUNK: usize = 4096;

/// Restores the thread's errno when dropped.
pub struct ErrnoGuard {
    saved: c_int,
}

impl ErrnoGuard {
    /// Snapshot errno.
    pub fn new() -> Self {
        Self { saved: errno() }
    }
}

impl Default for ErrnoGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ErrnoGuard {
    fn drop(&mut self) {
        set_errno(self.saved);
    }
}

/// Current value of the thread's errno.
pub fn errno() -> c_int {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Overwrite the thread's errno.
pub fn set_errno(value: c_int) {
    // SAFETY: __errno_location always returns a valid thread-local pointer.
    unsafe {
        *libc::__errno_location() = value;
    }
}

struct ProbePipe {
    read_end: c_int,
    write_end: c_int,
}

impl ProbePipe {
    fn open() -> Option<Self> {
        let mut fds = [0 as c_int; 2];
        // SAFETY: fds has room for the two descriptors pipe2 returns.
        let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC | libc::O_NONBLOCK) };
        if rc < 0 {
            return None;
        }
        Some(Self {
            read_end: fds[0],
            write_end: fds[1],
        })
    }

    /// True when the kernel could copy the range, false on EFAULT.
    fn readable(&self, address: usize, size: usize) -> Option<bool> {
        let mut scratch = [0u8; PROBE_CHUNK];
        let mut offset = 0;
        while offset < size {
            let chunk = (size - offset).min(PROBE_CHUNK);
            // SAFETY: write(2) validates the source range itself and fails
            // with EFAULT rather than faulting in user space.
            let rc = unsafe {
                libc::write(
                    self.write_end,
                    (address + offset) as *const c_void,
                    chunk,
                )
            };
            if rc < 0 {
                return match errno() {
                    libc::EFAULT => Some(false),
                    _ => None,
                };
            }
            // Drain so the next chunk has room.
            // SAFETY: scratch is a valid writable buffer of PROBE_CHUNK bytes.
            unsafe {
                libc::read(self.read_end, scratch.as_mut_ptr() as *mut c_void, scratch.len());
            }
            if rc == 0 {
                return None;
            }
            offset += rc as usize;
        }
        Some(true)
    }
}

impl Drop for ProbePipe {
    fn drop(&mut self) {
        // SAFETY: both descriptors were returned by pipe2 and are owned here.
        unsafe {
            libc::close(self.read_end);
            libc::close(self.write_end);
        }
    }
}

pub fn page_size() -> usize {
    // SAFETY: sysconf has no memory-safety preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        4096
    }
}

/// Whether `size` bytes starting at `ptr` may be read.
///
/// Null is never readable. When the probe mechanism itself is
/// unavailable the range is assumed readable.
pub fn is_readable(ptr: *const c_void, size: usize) -> bool {
    if ptr.is_null() {
        return false;
    }
    if size == 0 {
        return true;
    }
    let _guard = ErrnoGuard::new();
    let address = ptr as usize;
    if address.checked_add(size).is_none() {
        return false;
    }
    match ProbePipe::open() {
        Some(pipe) => pipe.readable(address, size).unwrap_or(true),
        None => true,
    }
}

/// Whether `ptr` refers to unreadable memory (the EFAULT condition).
pub fn is_efault_pointer(ptr: *const c_void, size: usize) -> bool {
    !is_readable(ptr, size.max(1))
}

/// Result of scanning a C string through the fault-safe probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedString {
    pub bytes: Vec<u8>,
    /// False when the scan stopped at unreadable memory or the limit.
    pub terminated: bool,
}

/// Copy a NUL-terminated string out of caller memory, one page at a
/// time, stopping cleanly at the first unreadable page.
///
/// Returns `None` for a null pointer or when not even the first byte
/// is readable.
pub fn read_c_string(ptr: *const c_char, limit: usize) -> Option<ProbedString> {
    if ptr.is_null() {
        return None;
    }
    let _guard = ErrnoGuard::new();
    let pipe = ProbePipe::open();
    let page = page_size();
    let mut address = ptr as usize;
    let mut bytes = Vec::new();

    while bytes.len() < limit {
        let page_end = (address / page + 1) * page;
        let span = (page_end - address).min(limit - bytes.len());
        let readable = match &pipe {
            Some(pipe) => pipe.readable(address, span).unwrap_or(true),
            None => true,
        };
        if !readable {
            break;
        }
        // SAFETY: the probe above confirmed [address, address + span) is mapped.
        let chunk = unsafe { std::slice::from_raw_parts(address as *const u8, span) };
        if let Some(nul) = chunk.iter().position(|&b| b == 0) {
            bytes.extend_from_slice(&chunk[..nul]);
            return Some(ProbedString {
                bytes,
                terminated: true,
            });
        }
        bytes.extend_from_slice(chunk);
        address += span;
    }

    if bytes.is_empty() && !is_readable(ptr as *const c_void, 1) {
        return None;
    }
    Some(ProbedString {
        bytes,
        terminated: false,
    })
}

/// Whether `ptr` is a readable, properly terminated C string.
pub fn is_valid_c_string(ptr: *const c_char) -> bool {
    matches!(read_c_string(ptr, STRING_PROBE_LIMIT), Some(s) if s.terminated)
}

/// Copy `size` bytes from caller memory when readable.
pub fn read_bytes(ptr: *const c_void, size: usize) -> Option<Vec<u8>> {
    if !is_readable(ptr, size) {
        return None;
    }
    // SAFETY: readability of the full range was just verified.
    let slice = unsafe { std::slice::from_raw_parts(ptr as *const u8, size) };
    Some(slice.to_vec())
}

/// Copy a plain-old-data value of type `T` from caller memory.
///
/// # Safety
/// `T` must be valid for any bit pattern (a C struct or integer).
pub unsafe fn read_struct<T: Copy>(ptr: *const c_void) -> Option<T> {
    if !is_readable(ptr, std::mem::size_of::<T>()) {
        return None;
    }
    Some(std::ptr::read_unaligned(ptr as *const T))
}

/// Convert a byte path into a C string, rejecting interior NULs.
pub fn c_path(path: &[u8]) -> Option<CString> {
    CString::new(path).ok()
}

/// `stat(2)`, preserving errno; the error number is returned on failure.
pub fn stat(path: &[u8]) -> Result<libc::stat, c_int> {
    stat_with(path, false)
}

/// `lstat(2)`, preserving errno.
pub fn lstat(path: &[u8]) -> Result<libc::stat, c_int> {
    stat_with(path, true)
}

fn stat_with(path: &[u8], no_follow: bool) -> Result<libc::stat, c_int> {
    let _guard = ErrnoGuard::new();
    let c = c_path(path).ok_or(libc::EINVAL)?;
    let mut st = MaybeUninit::<libc::stat>::uninit();
    // SAFETY: c is NUL-terminated and st is writable storage for a stat.
    let rc = unsafe {
        if no_follow {
            libc::lstat(c.as_ptr(), st.as_mut_ptr())
        } else {
            libc::stat(c.as_ptr(), st.as_mut_ptr())
        }
    };
    if rc < 0 {
        return Err(errno());
    }
    // SAFETY: stat succeeded and initialised the structure.
    Ok(unsafe { st.assume_init() })
}

/// `fstat(2)`, preserving errno.
pub fn fstat(fildes: c_int) -> Result<libc::stat, c_int> {
    let _guard = ErrnoGuard::new();
    let mut st = MaybeUninit::<libc::stat>::uninit();
    // SAFETY: st is writable storage for a stat.
    let rc = unsafe { libc::fstat(fildes, st.as_mut_ptr()) };
    if rc < 0 {
        return Err(errno());
    }
    // SAFETY: fstat succeeded and initialised the structure.
    Ok(unsafe { st.assume_init() })
}

/// `fcntl(fildes, F_GETFL)`, or `None` when the descriptor is not open.
pub fn file_status_flags(fildes: c_int) -> Option<c_int> {
    let _guard = ErrnoGuard::new();
    // SAFETY: F_GETFL takes no pointer argument.
    let flags = unsafe { libc::fcntl(fildes, libc::F_GETFL) };
    (flags >= 0).then_some(flags)
}

/// `fcntl(fildes, F_GETFD)`, or `None` when the descriptor is not open.
pub fn descriptor_flags(fildes: c_int) -> Option<c_int> {
    let _guard = ErrnoGuard::new();
    // SAFETY: F_GETFD takes no pointer argument.
    let flags = unsafe { libc::fcntl(fildes, libc::F_GETFD) };
    (flags >= 0).then_some(flags)
}

/// Whether the descriptor is currently open.
pub fn is_open(fildes: c_int) -> bool {
    fildes >= 0 && descriptor_flags(fildes).is_some()
}

/// Soft and hard limits for an rlimit resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub soft: u64,
    pub hard: u64,
}

impl Limit {
    /// Whether the soft limit is RLIM_INFINITY.
    pub fn is_infinite(&self) -> bool {
        self.soft == libc::RLIM_INFINITY
    }
}

/// `getrlimit(2)` for the given resource.
pub fn rlimit(resource: libc::__rlimit_resource_t) -> Option<Limit> {
    let _guard = ErrnoGuard::new();
    let mut lim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: lim is a valid rlimit out-parameter.
    let rc = unsafe { libc::getrlimit(resource, &mut lim) };
    (rc == 0).then_some(Limit {
        soft: lim.rlim_cur,
        hard: lim.rlim_max,
    })
}

/// Per-process descriptor limit (`RLIMIT_NOFILE` soft limit).
pub fn open_max() -> u64 {
    rlimit(libc::RLIMIT_NOFILE).map_or(1024, |l| l.soft)
}

/// `pathconf(2)` for a path, `None` when indeterminate.
pub fn pathconf(path: &[u8], name: c_int) -> Option<i64> {
    let _guard = ErrnoGuard::new();
    let c = c_path(path)?;
    set_errno(0);
    // SAFETY: c is NUL-terminated.
    let value = unsafe { libc::pathconf(c.as_ptr(), name) };
    (value >= 0).then_some(value as i64)
}

/// `fpathconf(2)` for a descriptor.
pub fn fpathconf(fildes: c_int, name: c_int) -> Option<i64> {
    let _guard = ErrnoGuard::new();
    // SAFETY: fpathconf has no pointer arguments.
    let value = unsafe { libc::fpathconf(fildes, name) };
    (value >= 0).then_some(value as i64)
}

/// Pathname of an open descriptor as the kernel reports it.
pub fn fildes_to_path(fildes: c_int) -> Option<PathBuf> {
    if fildes < 0 {
        return None;
    }
    let _guard = ErrnoGuard::new();
    let path = std::fs::read_link(format!("/proc/self/fd/{fildes}")).ok()?;
    Some(path)
}

/// `readlink(2)` returning raw bytes.
pub fn readlink(path: &[u8]) -> Result<Vec<u8>, c_int> {
    use std::os::unix::ffi::OsStrExt;
    let _guard = ErrnoGuard::new();
    let os = std::ffi::OsStr::from_bytes(path);
    match std::fs::read_link(os) {
        Ok(target) => Ok(target.as_os_str().as_bytes().to_vec()),
        Err(err) => Err(err.raw_os_error().unwrap_or(libc::EINVAL)),
    }
}

/// Entries of a directory, excluding `.` and `..`.
pub fn directory_entries(path: &[u8]) -> Vec<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    let _guard = ErrnoGuard::new();
    let os = std::ffi::OsStr::from_bytes(path);
    match std::fs::read_dir(os) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().as_bytes().to_vec())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Current working directory as bytes.
pub fn current_directory() -> Option<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    let _guard = ErrnoGuard::new();
    std::env::current_dir()
        .ok()
        .map(|p| p.as_os_str().as_bytes().to_vec())
}

/// Borrow a C string known to be valid.
///
/// # Safety
/// `ptr` must be non-null and NUL-terminated.
pub unsafe fn borrow_c_str<'a>(ptr: *const c_char) -> &'a CStr {
    CStr::from_ptr(ptr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_never_readable() {
        assert!(!is_readable(std::ptr::null(), 1));
        assert!(is_efault_pointer(std::ptr::null(), 4));
        assert!(read_c_string(std::ptr::null(), 16).is_none());
    }

    #[test]
    fn stack_memory_is_readable() {
        let data = [1u8, 2, 3, 4];
        assert!(is_readable(data.as_ptr() as *const c_void, data.len()));
        assert_eq!(read_bytes(data.as_ptr() as *const c_void, 4), Some(data.to_vec()));
    }

    #[test]
    fn low_addresses_are_unreadable() {
        assert!(is_efault_pointer(0x10 as *const c_void, 8));
        assert!(read_c_string(0x10 as *const c_char, 16).is_none());
    }

    #[test]
    fn strings_are_copied_up_to_nul() {
        let text = CString::new("hello").unwrap();
        let probed = read_c_string(text.as_ptr(), STRING_PROBE_LIMIT).unwrap();
        assert_eq!(probed.bytes, b"hello");
        assert!(probed.terminated);
        assert!(is_valid_c_string(text.as_ptr()));
    }

    #[test]
    fn string_scan_respects_limit() {
        let text = CString::new("abcdefgh").unwrap();
        let probed = read_c_string(text.as_ptr(), 3).unwrap();
        assert_eq!(probed.bytes, b"abc");
        assert!(!probed.terminated);
    }

    #[test]
    fn errno_is_preserved_across_probes() {
        set_errno(libc::EXDEV);
        let _ = is_readable(0x10 as *const c_void, 8);
        let _ = stat(b"/definitely/not/here");
        let _ = file_status_flags(-1);
        assert_eq!(errno(), libc::EXDEV);
    }

    #[test]
    fn closed_descriptor_is_not_open() {
        assert!(!is_open(-1));
        assert!(!is_open(987_654));
        let file = std::fs::File::open("/dev/null").unwrap();
        assert!(is_open(std::os::unix::io::AsRawFd::as_raw_fd(&file)));
    }
}
