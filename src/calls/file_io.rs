/*============================================================
  Synavera Project: Explain
  Module: explain_core::calls::file_io
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Explainers for descriptor and file I/O calls: open family,
    close, read/write family, lseek, fsync, truncation, dup,
    pipe, fcntl and the stat family.

  Security / Safety Notes:
    Caller pointers are only echoed or probed; buffers are never
    read past the probe.

  Dependencies:
    analysers, render, path_resolution, probe.

  Operational Scope:
    The file I/O section of the call registry.

  Revision History:
    2026-10-18 COD  Authored file I/O explainers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - First matching cause wins, in the documented order
    - Probes decide between causes; nothing is guessed
============================================================*/

use std::fmt::Write;
use std::os::raw::{c_char, c_int, c_void};

use super::{path_errno, readable_path, resolve_at, Args, CallEntry, Echo, Explainer};
use crate::analysers::fildes::{ebadf_reading, ebadf_writing, not_open_for_reading, not_open_for_writing};
use crate::analysers::limits::{einval_bits, einval_too_large, einval_too_small, eoverflow};
use crate::analysers::{
    self, ebadf, efault, eintr, emfile, enfile, enomem_kernel, ewouldblock, generic, software_error,
};
use crate::capability::{self, Capability};
use crate::error::Result;
use crate::identity::{self, Identity};
use crate::mount;
use crate::path_resolution::{self, FinalComponent, Want};
use crate::probe::{self, ErrnoGuard};
use crate::render::file_type::{file_type, file_type_st, major, minor};
use crate::render::mode::permission_mode;
use crate::render::open_flags::{
    self, fcntl_command, open_flags, parse_open_flags, whence, KERNEL_O_LARGEFILE, FD_FLAGS,
};
use crate::render::pointer::pretty_size;
use crate::string_buffer::StringBuffer;

fn is_type(st: &libc::stat, kind: u32) -> bool {
    st.st_mode & libc::S_IFMT == kind
}

fn is_device(st: &libc::stat) -> bool {
    is_type(st, libc::S_IFCHR) || is_type(st, libc::S_IFBLK)
}

/// Current offset of an open descriptor.
fn current_offset(fildes: c_int) -> Option<u64> {
    let _guard = ErrnoGuard::new();
    // SAFETY: lseek with SEEK_CUR and offset 0 only queries the offset.
    let offset = unsafe { libc::lseek(fildes, 0, libc::SEEK_CUR) };
    u64::try_from(offset).ok()
}

fn open_echo(sb: &mut StringBuffer, name: &str, dirfd: Option<c_int>, pathname: *const c_char, flags: c_int, mode: libc::mode_t, errnum: c_int) {
    let mut echo = Echo::new(sb, name);
    if let Some(dirfd) = dirfd {
        echo = echo.arg("dirfd", |sb| open_flags::dirfd(sb, dirfd));
    }
    echo = echo.path("pathname", pathname, errnum);
    echo = echo.arg("flags", |sb| open_flags(sb, flags));
    if flags & libc::O_CREAT != 0 || flags & libc::O_TMPFILE == libc::O_TMPFILE {
        echo = echo.arg("mode", |sb| permission_mode(sb, mode));
    }
    echo.finish();
}

fn open_eacces(sb: &mut StringBuffer, path: &[u8], fc: &FinalComponent) {
    if path_resolution::explain(sb, libc::EACCES, path, "pathname", fc) {
        return;
    }
    if let Ok(st) = probe::stat(path) {
        if is_device(&st) && mount::is_nodev(&st) {
            sb.puts("pathname refers to a ");
            file_type_st(sb, &st);
            sb.puts(" on a file system mounted with the nodev option");
            mount::mount_point(sb, path);
            return;
        }
    }
    sb.puts(
        "the requested access to the file is not allowed, or search permission is denied for one of the \
         directories in the path prefix of pathname, or the file did not exist yet and write access to the \
         parent directory is not allowed",
    );
}

fn open_enxio(sb: &mut StringBuffer, path: &[u8]) {
    match probe::stat(path) {
        Ok(st) if is_type(&st, libc::S_IFIFO) => sb.puts(
            "O_NONBLOCK | O_WRONLY is set, and the named file is a FIFO, and no process has the file open for \
             reading",
        ),
        Ok(st) if is_device(&st) => {
            sb.puts("pathname refers to a ");
            file_type_st(sb, &st);
            let _ = write!(sb, " ({}, {}) and no corresponding device exists", major(st.st_rdev), minor(st.st_rdev));
        }
        Ok(st) if is_type(&st, libc::S_IFSOCK) => sb.puts(
            "you cannot use open(2) to open socket files, you must use connect(2) instead; a named pipe may be \
             what was intended",
        ),
        _ => sb.puts(
            "pathname refers to a device special file and no corresponding device exists, or pathname refers to \
             a FIFO that no process has open for reading",
        ),
    }
}

fn open_enodev(sb: &mut StringBuffer, path: &[u8]) {
    match probe::stat(path) {
        Ok(st) if is_device(&st) || is_type(&st, libc::S_IFSOCK) => {
            sb.puts("pathname refers to a ");
            file_type_st(sb, &st);
            sb.puts(" and no corresponding device exists");
            if sb.options().dialect_specific {
                sb.footnote_str("this is a Linux kernel bug, in this situation POSIX says ENXIO should have been returned");
            }
        }
        _ => sb.puts("pathname refers to a device special file and no corresponding device exists"),
    }
}

fn open_noatime(sb: &mut StringBuffer, path: &[u8]) -> bool {
    let Ok(st) = probe::stat(path) else {
        return false;
    };
    let id = Identity::effective();
    sb.puts("the O_NOATIME flags was specified, but the process effective UID ");
    identity::uid(sb, id.uid);
    sb.puts(" does not match the ");
    file_type(sb, st.st_mode);
    sb.puts(" owner UID ");
    identity::uid(sb, st.st_uid);
    capability::explain_if_missing(sb, Capability::Fowner);
    true
}

fn open_too_large(sb: &mut StringBuffer, path: &[u8], flags: c_int) -> bool {
    if flags & (libc::O_LARGEFILE | KERNEL_O_LARGEFILE) != 0 {
        return false;
    }
    let Ok(st) = probe::stat(path) else {
        return false;
    };
    if !is_type(&st, libc::S_IFREG) {
        return false;
    }
    sb.puts("pathname refers to a regular file that is too large to be opened");
    sb.puts(" (");
    pretty_size(sb, st.st_size as u64);
    sb.puts("), the O_LARGEFILE flag is necessary");
    true
}

fn open_trailing_notes(sb: &mut StringBuffer, path: &[u8], flags: c_int) {
    if flags & libc::O_TRUNC != 0 {
        if flags & libc::O_ACCMODE == libc::O_RDONLY {
            sb.footnote_str("note that the behavior of (O_RDONLY | O_TRUNC) is undefined");
        } else if let Ok(st) = probe::stat(path) {
            if is_type(&st, libc::S_IFSOCK) || is_type(&st, libc::S_IFIFO) {
                sb.footnote(|note| {
                    note.puts("note that a ");
                    file_type(note, st.st_mode);
                    note.puts(" will ignore the O_TRUNC flag");
                });
            } else if is_device(&st) {
                sb.footnote(|note| {
                    note.puts("note that the behavior of O_TRUNC on a ");
                    file_type(note, st.st_mode);
                    note.puts(" is undefined");
                });
            }
        }
    }
    if flags & libc::O_EXCL != 0 && flags & libc::O_CREAT == 0 {
        sb.footnote_str("note that the behavior of O_EXCL is undefined if O_CREAT is not specified");
    }
}

/// Cause analysis shared by open, openat and creat.
pub(crate) fn open_cause(sb: &mut StringBuffer, errnum: c_int, dirfd: c_int, pathname: *const c_char, flags: c_int, call: &str) {
    match errnum {
        libc::EMFILE => return emfile(sb),
        libc::ENFILE => return enfile(sb),
        libc::EINVAL => return einval_bits(sb, "flags"),
        libc::EINTR => return eintr(sb, call),
        libc::EBADF => return ebadf(sb, dirfd, "dirfd"),
        _ => {}
    }
    let Some(path) = readable_path(sb, pathname, "pathname") else {
        return;
    };
    let path = resolve_at(dirfd, &path);
    let fc = FinalComponent::from_open_flags(flags);
    match errnum {
        libc::EACCES => open_eacces(sb, &path, &fc),
        libc::EEXIST => {
            if !path_resolution::explain(sb, errnum, &path, "pathname", &fc) {
                sb.puts("pathname already exists and O_CREAT and O_EXCL were used");
            }
        }
        libc::EFBIG | libc::EOVERFLOW => {
            if !open_too_large(sb, &path, flags) {
                eoverflow(sb);
            }
        }
        libc::EISDIR => {
            if flags & libc::O_TMPFILE == libc::O_TMPFILE {
                sb.puts(
                    "O_TMPFILE was specified but the kernel or the file system containing pathname does not \
                     support it",
                );
            } else {
                analysers::eisdir(sb, &path, "pathname", flags & libc::O_ACCMODE != libc::O_RDONLY);
            }
        }
        libc::ELOOP | libc::EMLINK => {
            let symlink = probe::lstat(&path).is_ok_and(|st| is_type(&st, libc::S_IFLNK));
            if flags & libc::O_NOFOLLOW != 0 && symlink {
                sb.puts("O_NOFOLLOW was specified but pathname refers to a symbolic link");
            } else {
                analysers::eloop(sb, &path, "pathname", &fc);
            }
        }
        libc::ENOSPC => analysers::enospc(sb, &path, "pathname"),
        libc::EDQUOT => analysers::edquot(sb, &path, "pathname"),
        libc::ETXTBSY => analysers::etxtbsy(sb, &path, "pathname"),
        libc::ENXIO => open_enxio(sb, &path),
        libc::ENODEV => open_enodev(sb, &path),
        libc::EPERM => {
            if flags & libc::O_NOATIME == 0 || !open_noatime(sb, &path) {
                generic(sb, errnum, call);
            }
        }
        libc::EAGAIN => {
            if flags & libc::O_NONBLOCK != 0 {
                sb.puts("the O_NONBLOCK flag was specified, and an incompatible lease was held on the file");
                if let Ok(st) = probe::stat(&path) {
                    analysers::holders::path_to_pid(sb, &st);
                }
            } else {
                ewouldblock(sb, call);
            }
        }
        _ => {
            if !path_errno(sb, errnum, &path, "pathname", &fc) {
                generic(sb, errnum, call);
            }
        }
    }
    open_trailing_notes(sb, &path, flags);
}

pub struct Open {
    pub pathname: *const c_char,
    pub flags: c_int,
    pub mode: libc::mode_t,
}

impl Explainer for Open {
    fn name(&self) -> &'static str {
        "open"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        open_echo(sb, "open", None, self.pathname, self.flags, self.mode, errnum);
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        open_cause(sb, errnum, libc::AT_FDCWD, self.pathname, self.flags, "open");
    }
}

pub struct Openat {
    pub dirfd: c_int,
    pub pathname: *const c_char,
    pub flags: c_int,
    pub mode: libc::mode_t,
}

impl Explainer for Openat {
    fn name(&self) -> &'static str {
        "openat"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        open_echo(sb, "openat", Some(self.dirfd), self.pathname, self.flags, self.mode, errnum);
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if errnum == libc::ENOTDIR && self.dirfd != libc::AT_FDCWD {
            let relative = super::probe_string(self.pathname).is_some_and(|p| p.first() != Some(&b'/'));
            let dir = probe::fstat(self.dirfd).is_ok_and(|st| is_type(&st, libc::S_IFDIR));
            if relative && !dir {
                sb.puts("pathname is relative and dirfd is a file descriptor referring to a file other than a directory");
                return;
            }
        }
        open_cause(sb, errnum, self.dirfd, self.pathname, self.flags, "openat");
    }
}

pub struct Creat {
    pub pathname: *const c_char,
    pub mode: libc::mode_t,
}

const CREAT_FLAGS: c_int = libc::O_CREAT | libc::O_WRONLY | libc::O_TRUNC;

impl Explainer for Creat {
    fn name(&self) -> &'static str {
        "creat"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "creat")
            .path("pathname", self.pathname, errnum)
            .arg("mode", |sb| permission_mode(sb, self.mode))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        open_cause(sb, errnum, libc::AT_FDCWD, self.pathname, CREAT_FLAGS, "creat");
    }
}

pub struct Close {
    pub fildes: c_int,
}

impl Explainer for Close {
    fn name(&self) -> &'static str {
        "close"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "close").fildes("fildes", self.fildes).finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EBADF => ebadf(sb, self.fildes, "fildes"),
            libc::EINTR => eintr(sb, "close"),
            libc::EIO => analysers::eio(sb),
            libc::ENOSPC | libc::EDQUOT => {
                sb.puts(
                    "a write error was deferred to close time, the file system ran out of space while flushing \
                     data written earlier",
                );
                sb.footnote_str("on networked file systems write errors are often reported by close rather than write");
            }
            _ => generic(sb, errnum, "close"),
        }
    }
}

fn read_einval(sb: &mut StringBuffer, fildes: c_int) {
    match probe::file_status_flags(fildes) {
        Some(flags) if flags & libc::O_ACCMODE == libc::O_WRONLY => not_open_for_reading(sb, fildes, "fildes"),
        Some(flags) if flags & libc::O_DIRECT != 0 => sb.puts(
            "the file was opened with the O_DIRECT flag, and either the address specified in data is not suitably \
             aligned, or the value specified in data_size is not suitably aligned, or the current file offset is \
             not suitably aligned",
        ),
        Some(_) => sb.puts(
            "the file descriptor was created via a call to timerfd_create(2) and the wrong size buffer was given",
        ),
        None => sb.puts(
            "the file descriptor is attached to an object which is unsuitable for reading; or, the file was opened \
             with the O_DIRECT flag and the buffer, size or offset is not suitably aligned",
        ),
    }
}

/// Background process group reading its controlling terminal.
fn background_tty_read(fildes: c_int) -> bool {
    let _guard = ErrnoGuard::new();
    // SAFETY: isatty, tcgetpgrp and getpgrp take no pointers.
    unsafe {
        if libc::isatty(fildes) != 1 {
            return false;
        }
        let foreground = libc::tcgetpgrp(fildes);
        foreground >= 0 && foreground != libc::getpgrp()
    }
}

pub(crate) fn read_cause(sb: &mut StringBuffer, errnum: c_int, fildes: c_int, call: &str) {
    match errnum {
        libc::EAGAIN => sb.puts(
            "non-blocking I/O has been selected using O_NONBLOCK and no data was immediately available for reading",
        ),
        libc::EBADF => ebadf_reading(sb, fildes, "fildes"),
        libc::EFAULT => efault(sb, "data"),
        libc::EINTR => eintr(sb, call),
        libc::EINVAL => read_einval(sb, fildes),
        libc::EIO => {
            if background_tty_read(fildes) {
                sb.puts(
                    "the process is in a background process group, and tried to read from its controlling tty, \
                     and the controlling tty is either ignoring or blocking SIGTTIN",
                );
            } else {
                analysers::eio_fildes(sb, fildes);
            }
        }
        libc::EISDIR => sb.puts(
            "fildes refers to a directory, and you must use getdents(2) to read directories, preferably via the \
             higher-level interface provided by readdir(3)",
        ),
        _ => generic(sb, errnum, call),
    }
}

fn write_einval(sb: &mut StringBuffer, fildes: c_int) {
    match probe::file_status_flags(fildes) {
        Some(flags) if flags & libc::O_ACCMODE == libc::O_RDONLY => not_open_for_writing(sb, fildes, "fildes"),
        Some(flags) if flags & libc::O_DIRECT != 0 => sb.puts(
            "the file was opened with the O_DIRECT flag, and either the address specified in data is not suitably \
             aligned, or the value specified in data_size is not suitably aligned, or the current file offset is \
             not suitably aligned",
        ),
        _ => sb.puts("the file descriptor is attached to an object which is unsuitable for writing"),
    }
}

fn epipe(sb: &mut StringBuffer, fildes: c_int) {
    if analysers::socket::is_socket(fildes) {
        sb.puts("fildes refers to a socket that is no longer connected");
    } else {
        sb.puts("fildes refers to a pipe or FIFO that has no open reading end");
    }
    sb.footnote_str(
        "the process would also have received a SIGPIPE signal, which must be caught or ignored for this error \
         to be seen",
    );
}

fn edquot_fildes(sb: &mut StringBuffer, fildes: c_int) {
    sb.puts("the user's quota of disk blocks on the file system has been exhausted");
    mount::mount_point_fd(sb, fildes);
}

pub(crate) fn write_cause(sb: &mut StringBuffer, errnum: c_int, fildes: c_int, data_size: usize, offset: Option<u64>, call: &str) {
    match errnum {
        libc::EAGAIN => analysers::limits::ewouldblock_fildes(sb, fildes, "fildes", call),
        libc::EBADF => ebadf_writing(sb, fildes, "fildes"),
        libc::EFAULT => efault(sb, "data"),
        libc::EFBIG => {
            let start = offset.or_else(|| current_offset(fildes)).unwrap_or(0);
            analysers::efbig_fildes(sb, fildes, "fildes", start.saturating_add(data_size as u64));
        }
        libc::EINTR => eintr(sb, call),
        libc::EINVAL => write_einval(sb, fildes),
        libc::EIO => analysers::eio_fildes(sb, fildes),
        libc::ENOSPC => analysers::enospc_fildes(sb, fildes, "fildes"),
        libc::EDQUOT => edquot_fildes(sb, fildes),
        libc::EPIPE => epipe(sb, fildes),
        _ => generic(sb, errnum, call),
    }
}

pub struct Read {
    pub fildes: c_int,
    pub data: *const c_void,
    pub data_size: usize,
}

impl Explainer for Read {
    fn name(&self) -> &'static str {
        "read"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "read")
            .fildes("fildes", self.fildes)
            .pointer("data", self.data)
            .value("data_size", self.data_size)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        read_cause(sb, errnum, self.fildes, "read");
    }
}

pub struct WriteCall {
    pub fildes: c_int,
    pub data: *const c_void,
    pub data_size: usize,
}

impl Explainer for WriteCall {
    fn name(&self) -> &'static str {
        "write"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "write")
            .fildes("fildes", self.fildes)
            .pointer("data", self.data)
            .value("data_size", self.data_size)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        write_cause(sb, errnum, self.fildes, self.data_size, None, "write");
    }
}

/// pread and pwrite; `writing` selects which.
pub struct Positioned {
    pub writing: bool,
    pub fildes: c_int,
    pub data: *const c_void,
    pub data_size: usize,
    pub offset: i64,
}

impl Explainer for Positioned {
    fn name(&self) -> &'static str {
        if self.writing {
            "pwrite"
        } else {
            "pread"
        }
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, self.name())
            .fildes("fildes", self.fildes)
            .pointer("data", self.data)
            .value("data_size", self.data_size)
            .value("offset", self.offset)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let call = self.name();
        if errnum == libc::ESPIPE {
            return analysers::espipe(sb, self.fildes, "fildes");
        }
        if errnum == libc::EINVAL && self.offset < 0 {
            return einval_too_small(sb, "offset", self.offset);
        }
        if errnum == libc::ENXIO {
            sb.puts(
                "the offset argument is beyond the end of the device, or the request is outside the capabilities \
                 of the device",
            );
            if let Ok(st) = probe::fstat(self.fildes) {
                sb.puts(" (");
                file_type_st(sb, &st);
                sb.putc(')');
            }
            return;
        }
        if self.writing {
            write_cause(sb, errnum, self.fildes, self.data_size, u64::try_from(self.offset).ok(), call);
        } else {
            read_cause(sb, errnum, self.fildes, call);
        }
    }
}

pub struct Lseek {
    pub fildes: c_int,
    pub offset: i64,
    pub whence: c_int,
}

impl Lseek {
    fn base(&self) -> Option<i64> {
        match self.whence {
            libc::SEEK_SET => Some(0),
            libc::SEEK_CUR => current_offset(self.fildes).and_then(|o| i64::try_from(o).ok()),
            libc::SEEK_END => probe::fstat(self.fildes).ok().map(|st| st.st_size),
            _ => None,
        }
    }
}

impl Explainer for Lseek {
    fn name(&self) -> &'static str {
        "lseek"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "lseek")
            .fildes("fildes", self.fildes)
            .value("offset", self.offset)
            .arg("whence", |sb| whence(sb, self.whence))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EBADF => ebadf(sb, self.fildes, "fildes"),
            libc::EINVAL => {
                if crate::parse_bits::find_by_value(i64::from(self.whence), &open_flags::WHENCE).is_none() {
                    sb.puts("the whence argument is not a proper value");
                    software_error(sb);
                    return;
                }
                sb.puts("the resulting file offset would be negative");
                if let Some(base) = self.base() {
                    if sb.options().dialect_specific {
                        let _ = write!(sb, " ({base} + {} = {})", self.offset, base.saturating_add(self.offset));
                    }
                }
            }
            libc::EOVERFLOW => sb.puts("the resulting file offset cannot be represented in an off_t"),
            libc::ESPIPE => analysers::espipe(sb, self.fildes, "fildes"),
            libc::ENXIO => sb.puts(
                "whence is SEEK_DATA or SEEK_HOLE, and the file offset is beyond the end of the file",
            ),
            _ => generic(sb, errnum, "lseek"),
        }
    }
}

pub struct Fsync {
    pub fildes: c_int,
}

impl Explainer for Fsync {
    fn name(&self) -> &'static str {
        "fsync"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "fsync").fildes("fildes", self.fildes).finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EBADF => ebadf(sb, self.fildes, "fildes"),
            libc::EIO => analysers::eio_fildes(sb, self.fildes),
            libc::EROFS | libc::EINVAL => analysers::enosys_fildes(sb, self.fildes, "fildes", "fsync"),
            libc::ENOSPC => analysers::enospc_fildes(sb, self.fildes, "fildes"),
            libc::EDQUOT => edquot_fildes(sb, self.fildes),
            _ => generic(sb, errnum, "fsync"),
        }
    }
}

fn eperm_append_or_immutable(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(sb, "the {caption} argument refers to a file that is append-only or immutable");
}

pub struct Ftruncate {
    pub fildes: c_int,
    pub length: i64,
}

impl Explainer for Ftruncate {
    fn name(&self) -> &'static str {
        "ftruncate"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "ftruncate")
            .fildes("fildes", self.fildes)
            .value("length", self.length)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EBADF => ebadf_writing(sb, self.fildes, "fildes"),
            libc::EINVAL => {
                if self.length < 0 {
                    return einval_too_small(sb, "length", self.length);
                }
                match probe::fstat(self.fildes) {
                    Ok(st) if !is_type(&st, libc::S_IFREG) => {
                        sb.puts("the fildes argument does not refer to a regular file, it is a ");
                        file_type_st(sb, &st);
                    }
                    _ => not_open_for_writing(sb, self.fildes, "fildes"),
                }
            }
            libc::EFBIG => analysers::efbig_fildes(sb, self.fildes, "length", self.length.max(0) as u64),
            libc::EINTR => eintr(sb, "ftruncate"),
            libc::EIO => analysers::eio_fildes(sb, self.fildes),
            libc::EPERM => eperm_append_or_immutable(sb, "fildes"),
            libc::EROFS => analysers::erofs_fildes(sb, self.fildes, "fildes"),
            libc::ETXTBSY => sb.puts("the fildes argument refers to an executable file that is currently being run"),
            _ => generic(sb, errnum, "ftruncate"),
        }
    }
}

pub struct Truncate {
    pub pathname: *const c_char,
    pub length: i64,
}

impl Explainer for Truncate {
    fn name(&self) -> &'static str {
        "truncate"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "truncate")
            .path("pathname", self.pathname, errnum)
            .value("length", self.length)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if errnum == libc::EINVAL && self.length < 0 {
            return einval_too_small(sb, "length", self.length);
        }
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let fc = FinalComponent::wanting(Want::WRITE);
        match errnum {
            libc::EFBIG => analysers::efbig(sb, &path, "length", self.length.max(0) as u64),
            libc::EISDIR => analysers::eisdir(sb, &path, "pathname", true),
            libc::EINVAL => match probe::stat(&path) {
                Ok(st) if !is_type(&st, libc::S_IFREG) => {
                    sb.puts("pathname refers to a ");
                    file_type_st(sb, &st);
                    sb.puts(", it must be a regular file");
                }
                _ => sb.puts(
                    "pathname does not refer to a regular file, or the length argument is larger than the maximum \
                     file size",
                ),
            },
            libc::EINTR => eintr(sb, "truncate"),
            libc::EPERM => eperm_append_or_immutable(sb, "pathname"),
            libc::ETXTBSY => analysers::etxtbsy(sb, &path, "pathname"),
            _ => {
                if !path_errno(sb, errnum, &path, "pathname", &fc) {
                    generic(sb, errnum, "truncate");
                }
            }
        }
    }
}

pub struct Dup {
    pub fildes: c_int,
}

impl Explainer for Dup {
    fn name(&self) -> &'static str {
        "dup"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "dup").fildes("fildes", self.fildes).finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EBADF => ebadf(sb, self.fildes, "fildes"),
            libc::EMFILE => emfile(sb),
            _ => generic(sb, errnum, "dup"),
        }
    }
}

pub struct Dup2 {
    pub oldfd: c_int,
    pub newfd: c_int,
}

impl Explainer for Dup2 {
    fn name(&self) -> &'static str {
        "dup2"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "dup2")
            .fildes("oldfd", self.oldfd)
            .fildes("newfd", self.newfd)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EBADF => {
                if probe::is_open(self.oldfd) {
                    ebadf(sb, self.newfd, "newfd");
                } else {
                    ebadf(sb, self.oldfd, "oldfd");
                }
            }
            libc::EBUSY => sb.puts("a race condition with open(2) and dup(2) was detected"),
            libc::EINTR => eintr(sb, "dup2"),
            libc::EMFILE => emfile(sb),
            _ => generic(sb, errnum, "dup2"),
        }
    }
}

pub struct Pipe {
    pub fildes: *const c_int,
}

impl Explainer for Pipe {
    fn name(&self) -> &'static str {
        "pipe"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "pipe")
            .pointer("fildes", self.fildes as *const c_void)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EFAULT => efault(sb, "fildes"),
            libc::EMFILE => emfile(sb),
            libc::ENFILE => enfile(sb),
            _ => generic(sb, errnum, "pipe"),
        }
    }

    fn render_returned(&self, sb: &mut StringBuffer) {
        // SAFETY: [c_int; 2] is valid for every bit pattern.
        if let Some(pair) = unsafe { probe::read_struct::<[c_int; 2]>(self.fildes as *const c_void) } {
            let _ = write!(sb, "fildes = {{ {}, {} }}", pair[0], pair[1]);
        }
    }
}

/// Missing from the libc crate's Linux table.
const F_SETSIG: c_int = 10;

pub struct Fcntl {
    pub fildes: c_int,
    pub command: c_int,
    pub arg: i64,
}

impl Fcntl {
    fn takes_lock(&self) -> bool {
        matches!(
            self.command,
            libc::F_GETLK | libc::F_SETLK | libc::F_SETLKW | libc::F_OFD_GETLK | libc::F_OFD_SETLK | libc::F_OFD_SETLKW
        )
    }

    fn takes_number(&self) -> bool {
        matches!(
            self.command,
            libc::F_DUPFD
                | libc::F_DUPFD_CLOEXEC
                | libc::F_SETOWN
                | F_SETSIG
                | libc::F_SETLEASE
                | libc::F_NOTIFY
                | libc::F_SETPIPE_SZ
        )
    }
}

impl Explainer for Fcntl {
    fn name(&self) -> &'static str {
        "fcntl"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        let echo = Echo::new(sb, "fcntl")
            .fildes("fildes", self.fildes)
            .arg("command", |sb| fcntl_command(sb, self.command));
        let echo = match self.command {
            libc::F_SETFL => echo.arg("arg", |sb| open_flags(sb, self.arg as c_int)),
            libc::F_SETFD => echo.bits("arg", self.arg, &FD_FLAGS),
            _ if self.takes_lock() => echo.pointer("arg", self.arg as usize as *const c_void),
            _ if self.takes_number() => echo.value("arg", self.arg),
            _ => echo,
        };
        echo.finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EBADF => ebadf(sb, self.fildes, "fildes"),
            libc::EACCES | libc::EAGAIN if self.takes_lock() => {
                sb.puts("the operation is prohibited by locks held by other processes");
            }
            libc::EACCES => sb.puts(
                "the operation is prohibited by locks held by other processes on the file fildes refers to",
            ),
            libc::EAGAIN => sb.puts(
                "the operation is prohibited because the file has been memory-mapped by another process",
            ),
            libc::EDEADLK => sb.puts("it was detected that the specified F_SETLKW command would cause a deadlock"),
            libc::EFAULT => efault(sb, "arg"),
            libc::EINTR => eintr(sb, "fcntl"),
            libc::EINVAL => {
                if matches!(self.command, libc::F_DUPFD | libc::F_DUPFD_CLOEXEC) {
                    if self.arg < 0 {
                        einval_too_small(sb, "arg", self.arg);
                    } else {
                        einval_too_large(sb, "arg", self.arg);
                        if sb.options().dialect_specific {
                            let _ = write!(sb, " (RLIMIT_NOFILE is {})", probe::open_max());
                        }
                    }
                } else if self.takes_lock() {
                    sb.puts("the lock description pointed to by arg has an invalid l_type or l_whence");
                } else {
                    sb.puts("the command argument is not recognized by this kernel");
                }
            }
            libc::EMFILE => emfile(sb),
            libc::ENOLCK => sb.puts("too many segment locks are open, the lock table is full"),
            libc::EPERM => sb.puts(
                "it was attempted to clear the O_APPEND flag on a file that has the append-only attribute set",
            ),
            _ => generic(sb, errnum, "fcntl"),
        }
    }
}

pub struct Fstat {
    pub fildes: c_int,
    pub buf: *const c_void,
}

impl Explainer for Fstat {
    fn name(&self) -> &'static str {
        "fstat"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "fstat")
            .fildes("fildes", self.fildes)
            .pointer("data", self.buf)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EBADF => ebadf(sb, self.fildes, "fildes"),
            libc::EFAULT => efault(sb, "data"),
            libc::ENOMEM => enomem_kernel(sb),
            libc::EOVERFLOW => eoverflow(sb),
            _ => generic(sb, errnum, "fstat"),
        }
    }
}

/// stat and lstat; `follow` selects which.
pub struct Stat {
    pub follow: bool,
    pub pathname: *const c_char,
    pub buf: *const c_void,
}

impl Explainer for Stat {
    fn name(&self) -> &'static str {
        if self.follow {
            "stat"
        } else {
            "lstat"
        }
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, self.name())
            .path("pathname", self.pathname, errnum)
            .pointer("data", self.buf)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if errnum == libc::EOVERFLOW {
            return eoverflow(sb);
        }
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let fc = FinalComponent {
            follow_symlink: self.follow,
            ..FinalComponent::default()
        };
        if !path_errno(sb, errnum, &path, "pathname", &fc) {
            generic(sb, errnum, self.name());
        }
    }
}

fn parse_open(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let flags = args.parsed("flags", parse_open_flags)?;
    let mode = args.mode_or("mode", 0)?;
    Ok(Box::new(Open { pathname, flags, mode }))
}

fn parse_openat(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let dirfd = args.fildes("dirfd")?;
    let pathname = args.string("pathname")?;
    let flags = args.parsed("flags", parse_open_flags)?;
    let mode = args.mode_or("mode", 0)?;
    Ok(Box::new(Openat { dirfd, pathname, flags, mode }))
}

fn parse_creat(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let mode = args.mode_or("mode", 0o666)?;
    Ok(Box::new(Creat { pathname, mode }))
}

fn parse_close(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(Close {
        fildes: args.fildes("fildes")?,
    }))
}

fn parse_read(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let data_size = args.size_or("data_size", super::SCRATCH_BUFFER)?;
    let data = args.buffer("data")?;
    Ok(Box::new(Read { fildes, data, data_size }))
}

fn parse_write(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let data_size = args.size_or("data_size", 1)?;
    let data = args.buffer("data")?;
    Ok(Box::new(WriteCall { fildes, data, data_size }))
}

fn parse_positioned(args: &mut Args<'_>, writing: bool) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let data_size = args.size("data_size")?;
    let offset = args.long("offset")?;
    let data = args.buffer("data")?;
    Ok(Box::new(Positioned {
        writing,
        fildes,
        data,
        data_size,
        offset,
    }))
}

fn parse_pread(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_positioned(args, false)
}

fn parse_pwrite(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_positioned(args, true)
}

fn parse_lseek(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let offset = args.long("offset")?;
    let whence = args.symbolic_or("whence", open_flags::whence_table(), i64::from(libc::SEEK_SET))? as c_int;
    Ok(Box::new(Lseek { fildes, offset, whence }))
}

fn parse_fsync(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(Fsync {
        fildes: args.fildes("fildes")?,
    }))
}

fn parse_ftruncate(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let length = args.long("length")?;
    Ok(Box::new(Ftruncate { fildes, length }))
}

fn parse_truncate(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let length = args.long("length")?;
    Ok(Box::new(Truncate { pathname, length }))
}

fn parse_dup(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(Dup {
        fildes: args.fildes("fildes")?,
    }))
}

fn parse_dup2(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let oldfd = args.fildes("oldfd")?;
    let newfd = args.fildes("newfd")?;
    Ok(Box::new(Dup2 { oldfd, newfd }))
}

fn parse_pipe(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.buffer("fildes")? as *const c_int;
    Ok(Box::new(Pipe { fildes }))
}

fn parse_fcntl(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let command = args.symbolic("command", open_flags::fcntl_table())? as c_int;
    let arg = match args.optional() {
        None => 0,
        Some(text) => match command {
            libc::F_SETFL => i64::from(parse_open_flags(text).map_err(|err| {
                crate::error::ExplainError::parse("arg", text, err.to_string())
            })?),
            libc::F_SETFD => crate::parse_bits::parse(text, &FD_FLAGS)
                .map_err(|err| crate::error::ExplainError::parse("arg", text, err.to_string()))?,
            _ => crate::parse_bits::parse_c_integer(text)
                .ok_or_else(|| crate::error::ExplainError::parse("arg", text, "not a number"))?,
        },
    };
    Ok(Box::new(Fcntl { fildes, command, arg }))
}

fn parse_fstat(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let buf = args.buffer("data")?;
    Ok(Box::new(Fstat { fildes, buf }))
}

fn parse_stat(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let buf = args.buffer("data")?;
    Ok(Box::new(Stat { follow: true, pathname, buf }))
}

fn parse_lstat(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let buf = args.buffer("data")?;
    Ok(Box::new(Stat { follow: false, pathname, buf }))
}

const OPEN_ERRNOS: &[c_int] = &[
    libc::EACCES,
    libc::EDQUOT,
    libc::EEXIST,
    libc::EFAULT,
    libc::EFBIG,
    libc::EINTR,
    libc::EINVAL,
    libc::EISDIR,
    libc::ELOOP,
    libc::EMFILE,
    libc::ENAMETOOLONG,
    libc::ENFILE,
    libc::ENODEV,
    libc::ENOENT,
    libc::ENOMEM,
    libc::ENOSPC,
    libc::ENOTDIR,
    libc::ENXIO,
    libc::EOVERFLOW,
    libc::EPERM,
    libc::EROFS,
    libc::ETXTBSY,
    libc::EWOULDBLOCK,
];

const READ_ERRNOS: &[c_int] = &[libc::EAGAIN, libc::EBADF, libc::EFAULT, libc::EINTR, libc::EINVAL, libc::EIO, libc::EISDIR];

const WRITE_ERRNOS: &[c_int] = &[
    libc::EAGAIN,
    libc::EBADF,
    libc::EDQUOT,
    libc::EFAULT,
    libc::EFBIG,
    libc::EINTR,
    libc::EINVAL,
    libc::EIO,
    libc::ENOSPC,
    libc::EPIPE,
];

const PREAD_ERRNOS: &[c_int] = &[
    libc::EAGAIN,
    libc::EBADF,
    libc::EFAULT,
    libc::EINTR,
    libc::EINVAL,
    libc::EIO,
    libc::EISDIR,
    libc::ENXIO,
    libc::EOVERFLOW,
    libc::ESPIPE,
];

const PWRITE_ERRNOS: &[c_int] = &[
    libc::EAGAIN,
    libc::EBADF,
    libc::EDQUOT,
    libc::EFAULT,
    libc::EFBIG,
    libc::EINTR,
    libc::EINVAL,
    libc::EIO,
    libc::ENOSPC,
    libc::ENXIO,
    libc::EOVERFLOW,
    libc::EPIPE,
    libc::ESPIPE,
];

const STAT_ERRNOS: &[c_int] = &[
    libc::EACCES,
    libc::EFAULT,
    libc::ELOOP,
    libc::ENAMETOOLONG,
    libc::ENOENT,
    libc::ENOMEM,
    libc::ENOTDIR,
    libc::EOVERFLOW,
];

pub(crate) static CALLS: [CallEntry; 19] = [
    CallEntry {
        name: "open",
        synopsis: "pathname flags [mode]",
        errnos: OPEN_ERRNOS,
        sample: &["/no/such/file", "O_RDONLY"],
        parse: parse_open,
    },
    CallEntry {
        name: "openat",
        synopsis: "dirfd pathname flags [mode]",
        errnos: OPEN_ERRNOS,
        sample: &["AT_FDCWD", "missing", "O_WRONLY | O_CREAT", "0644"],
        parse: parse_openat,
    },
    CallEntry {
        name: "creat",
        synopsis: "pathname [mode]",
        errnos: OPEN_ERRNOS,
        sample: &["/tmp/new-file", "0644"],
        parse: parse_creat,
    },
    CallEntry {
        name: "close",
        synopsis: "fildes",
        errnos: &[libc::EBADF, libc::EINTR, libc::EIO, libc::ENOSPC, libc::EDQUOT],
        sample: &["7"],
        parse: parse_close,
    },
    CallEntry {
        name: "read",
        synopsis: "fildes [data_size [data]]",
        errnos: READ_ERRNOS,
        sample: &["7", "100"],
        parse: parse_read,
    },
    CallEntry {
        name: "write",
        synopsis: "fildes [data_size [data]]",
        errnos: WRITE_ERRNOS,
        sample: &["7", "1"],
        parse: parse_write,
    },
    CallEntry {
        name: "pread",
        synopsis: "fildes data_size offset [data]",
        errnos: PREAD_ERRNOS,
        sample: &["7", "100", "0"],
        parse: parse_pread,
    },
    CallEntry {
        name: "pwrite",
        synopsis: "fildes data_size offset [data]",
        errnos: PWRITE_ERRNOS,
        sample: &["7", "100", "-1"],
        parse: parse_pwrite,
    },
    CallEntry {
        name: "lseek",
        synopsis: "fildes offset [whence]",
        errnos: &[libc::EBADF, libc::EINVAL, libc::ENXIO, libc::EOVERFLOW, libc::ESPIPE],
        sample: &["0", "-10", "SEEK_SET"],
        parse: parse_lseek,
    },
    CallEntry {
        name: "fsync",
        synopsis: "fildes",
        errnos: &[libc::EBADF, libc::EDQUOT, libc::EINVAL, libc::EIO, libc::ENOSPC, libc::EROFS],
        sample: &["0"],
        parse: parse_fsync,
    },
    CallEntry {
        name: "ftruncate",
        synopsis: "fildes length",
        errnos: &[
            libc::EBADF,
            libc::EFBIG,
            libc::EINTR,
            libc::EINVAL,
            libc::EIO,
            libc::EPERM,
            libc::EROFS,
            libc::ETXTBSY,
        ],
        sample: &["0", "0"],
        parse: parse_ftruncate,
    },
    CallEntry {
        name: "truncate",
        synopsis: "pathname length",
        errnos: &[
            libc::EACCES,
            libc::EFAULT,
            libc::EFBIG,
            libc::EINTR,
            libc::EINVAL,
            libc::EIO,
            libc::EISDIR,
            libc::ELOOP,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOTDIR,
            libc::EPERM,
            libc::EROFS,
            libc::ETXTBSY,
        ],
        sample: &["/no/such/file", "0"],
        parse: parse_truncate,
    },
    CallEntry {
        name: "dup",
        synopsis: "fildes",
        errnos: &[libc::EBADF, libc::EMFILE],
        sample: &["7"],
        parse: parse_dup,
    },
    CallEntry {
        name: "dup2",
        synopsis: "oldfd newfd",
        errnos: &[libc::EBADF, libc::EBUSY, libc::EINTR, libc::EMFILE],
        sample: &["7", "8"],
        parse: parse_dup2,
    },
    CallEntry {
        name: "pipe",
        synopsis: "[fildes]",
        errnos: &[libc::EFAULT, libc::EMFILE, libc::ENFILE],
        sample: &[],
        parse: parse_pipe,
    },
    CallEntry {
        name: "fcntl",
        synopsis: "fildes command [arg]",
        errnos: &[
            libc::EACCES,
            libc::EAGAIN,
            libc::EBADF,
            libc::EDEADLK,
            libc::EFAULT,
            libc::EINTR,
            libc::EINVAL,
            libc::EMFILE,
            libc::ENOLCK,
            libc::EPERM,
        ],
        sample: &["0", "F_SETFL", "O_NONBLOCK"],
        parse: parse_fcntl,
    },
    CallEntry {
        name: "fstat",
        synopsis: "fildes [data]",
        errnos: &[libc::EBADF, libc::EFAULT, libc::ENOMEM, libc::EOVERFLOW],
        sample: &["7"],
        parse: parse_fstat,
    },
    CallEntry {
        name: "stat",
        synopsis: "pathname [data]",
        errnos: STAT_ERRNOS,
        sample: &["/no/such/file"],
        parse: parse_stat,
    },
    CallEntry {
        name: "lstat",
        synopsis: "pathname [data]",
        errnos: STAT_ERRNOS,
        sample: &["/no/such/file"],
        parse: parse_lstat,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::ffi::CString;
    use std::os::unix::io::AsRawFd;

    fn explain(explainer: &dyn Explainer, errnum: c_int) -> (String, String) {
        let mut call = StringBuffer::new(1024, Options::default());
        explainer.render_call(&mut call, errnum);
        let mut cause = StringBuffer::with_footnotes(4096, Options::default());
        explainer.render_cause(&mut cause, errnum);
        let notes = cause.footnotes().map(|n| n.as_str().to_string()).unwrap_or_default();
        (call.as_str().to_string(), format!("{}{}", cause.as_str(), notes))
    }

    #[test]
    fn open_echo_shows_mode_only_with_create() {
        let path = CString::new("/x").unwrap();
        let plain = Open {
            pathname: path.as_ptr(),
            flags: libc::O_RDONLY,
            mode: 0o644,
        };
        assert_eq!(explain(&plain, libc::ENOENT).0, "open(pathname = \"/x\", flags = O_RDONLY)");

        let create = Open {
            flags: libc::O_WRONLY | libc::O_CREAT,
            ..plain
        };
        let (call, _) = explain(&create, libc::ENOENT);
        assert!(call.starts_with("open(pathname = \"/x\", flags = O_WRONLY | O_CREAT, mode = "), "{call}");
    }

    #[test]
    fn open_missing_ancestor_is_named() {
        let path = CString::new("/no/such/file").unwrap();
        let open = Open {
            pathname: path.as_ptr(),
            flags: libc::O_RDONLY,
            mode: 0,
        };
        let (_, cause) = explain(&open, libc::ENOENT);
        assert!(cause.contains("\"no\""), "{cause}");
    }

    #[test]
    fn open_efault_echoes_pointer() {
        let open = Open {
            pathname: 0x10 as *const c_char,
            flags: libc::O_RDONLY,
            mode: 0,
        };
        let (call, cause) = explain(&open, libc::EFAULT);
        assert!(call.contains("pathname = 0x10"), "{call}");
        assert!(cause.starts_with("pathname refers to memory"), "{cause}");
    }

    #[test]
    fn open_nofollow_on_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink("/etc/passwd", &link).unwrap();
        let path = CString::new(link.to_str().unwrap()).unwrap();
        let open = Open {
            pathname: path.as_ptr(),
            flags: libc::O_RDONLY | libc::O_NOFOLLOW,
            mode: 0,
        };
        let (_, cause) = explain(&open, libc::ELOOP);
        assert_eq!(cause, "O_NOFOLLOW was specified but pathname refers to a symbolic link");
    }

    #[test]
    fn open_excl_without_creat_gets_a_note() {
        let path = CString::new("/no/such/file").unwrap();
        let open = Open {
            pathname: path.as_ptr(),
            flags: libc::O_RDONLY | libc::O_EXCL,
            mode: 0,
        };
        let (_, cause) = explain(&open, libc::ENOENT);
        assert!(cause.ends_with("; note that the behavior of O_EXCL is undefined if O_CREAT is not specified"), "{cause}");
    }

    #[test]
    fn read_on_write_only_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let file = std::fs::File::create(dir.path().join("out")).unwrap();
        let read = Read {
            fildes: file.as_raw_fd(),
            data: std::ptr::null(),
            data_size: 10,
        };
        let (_, cause) = explain(&read, libc::EBADF);
        assert!(cause.starts_with("the fildes argument is not open for reading, it was opened O_WRONLY"), "{cause}");
    }

    #[test]
    fn write_to_closed_descriptor() {
        let data = [0u8; 1];
        let write = WriteCall {
            fildes: 999,
            data: data.as_ptr() as *const c_void,
            data_size: 1,
        };
        let (call, cause) = explain(&write, libc::EBADF);
        assert!(call.starts_with("write(fildes = 999, data = 0x"), "{call}");
        assert!(cause.contains("(999) does not refer to an open file"), "{cause}");
        assert!(cause.contains("software error"), "{cause}");
    }

    #[test]
    fn lseek_negative_result() {
        let lseek = Lseek {
            fildes: 9999,
            offset: -10,
            whence: libc::SEEK_SET,
        };
        let (call, cause) = explain(&lseek, libc::EINVAL);
        assert_eq!(call, "lseek(fildes = 9999, offset = -10, whence = SEEK_SET)");
        assert_eq!(cause, "the resulting file offset would be negative (0 + -10 = -10)");
    }

    #[test]
    fn fsync_on_pipe() {
        let mut fds = [0 as c_int; 2];
        // SAFETY: fds has room for two descriptors.
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let fsync = Fsync { fildes: fds[0] };
        let (_, cause) = explain(&fsync, libc::EINVAL);
        assert_eq!(cause, "fildes is a named pipe that does not support the fsync system call");
        // SAFETY: both descriptors came from pipe above.
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    #[test]
    fn fcntl_echo_decodes_arguments() {
        let fcntl = Fcntl {
            fildes: 9999,
            command: libc::F_SETFL,
            arg: i64::from(libc::O_NONBLOCK),
        };
        let (call, _) = explain(&fcntl, libc::EBADF);
        assert_eq!(call, "fcntl(fildes = 9999, command = F_SETFL, arg = O_RDONLY | O_NONBLOCK)");
    }
}
