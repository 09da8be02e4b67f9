/*============================================================
  Synavera Project: Explain
  Module: explain_core::calls::process
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Explainers for process, identity and resource-limit calls:
    fork, execve, execvp, waitpid, kill, setuid, setgid,
    setpgid, getrlimit, setrlimit, nice and chroot.

  Security / Safety Notes:
    Reads /proc/<pid>/status and the caller's own limits and
    signal dispositions; never signals or waits on anything.

  Dependencies:
    analysers, capability, identity, render::process.

  Operational Scope:
    The processes-and-identity section of the call registry.

  Revision History:
    2026-10-18 COD  Authored process explainers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Privilege failures name the capability that was missing
============================================================*/

use std::fmt::Write;
use std::mem::MaybeUninit;
use std::os::raw::{c_char, c_int, c_void};

use super::{path_errno, probe_string, readable_path, struct_bytes, Args, CallEntry, Echo, Explainer};
use crate::analysers::limits::{einval_too_small, rlimit_value};
use crate::analysers::{self, efault, eintr, enomem_kernel, generic};
use crate::capability::{self, Capability};
use crate::error::{ExplainError, Result};
use crate::identity::{self, Identity};
use crate::mount;
use crate::path_resolution::{self, FinalComponent, Want};
use crate::probe::{self, ErrnoGuard};
use crate::render::file_type::file_type_st;
use crate::render::pointer::{pointer, rlim};
use crate::render::process::{pid, rlimit_resource, rlimit_table, signal, wait_options, wait_table};
use crate::string_buffer::StringBuffer;

/// Longest argv/envp rendered before eliding the rest.
const ARRAY_SHOWN: usize = 16;

fn read_pointer(at: *const *const c_char) -> Option<*const c_char> {
    // SAFETY: raw pointers are plain integers, valid for every bit pattern.
    unsafe { probe::read_struct::<*const c_char>(at as *const c_void) }
}

/// `["ls", "-l"]`, or the bare pointer when the array is unreadable.
fn string_array(sb: &mut StringBuffer, array: *const *const c_char) {
    if array.is_null() || read_pointer(array).is_none() {
        pointer(sb, array as *const c_void);
        return;
    }
    sb.putc('[');
    for i in 0.. {
        let Some(item) = read_pointer(array.wrapping_add(i)) else {
            sb.puts(", ...");
            break;
        };
        if item.is_null() {
            break;
        }
        if i > 0 {
            sb.puts(", ");
        }
        if i == ARRAY_SHOWN {
            sb.puts("...");
            break;
        }
        sb.puts_quoted_ptr(item);
    }
    sb.putc(']');
}

/// Bytes the kernel copies for a NULL-terminated string array.
fn array_bytes(array: *const *const c_char) -> Option<u64> {
    if array.is_null() {
        return Some(0);
    }
    let mut total = 0u64;
    for i in 0.. {
        let item = read_pointer(array.wrapping_add(i))?;
        if item.is_null() {
            break;
        }
        let text = probe::read_c_string(item, usize::MAX >> 1)?;
        total += text.bytes.len() as u64 + 1 + std::mem::size_of::<*const c_char>() as u64;
    }
    Some(total)
}

fn array_is_readable(array: *const *const c_char) -> bool {
    array.is_null() || array_bytes(array).is_some()
}

fn arg_max() -> Option<u64> {
    let _guard = ErrnoGuard::new();
    // SAFETY: sysconf has no memory preconditions.
    let value = unsafe { libc::sysconf(libc::_SC_ARG_MAX) };
    u64::try_from(value).ok().filter(|&v| v > 0)
}

fn e2big(sb: &mut StringBuffer, argv: *const *const c_char, envp: *const *const c_char) {
    sb.puts("the total number of bytes in the argument list (argv) and environment (envp) is too large");
    if !sb.options().dialect_specific {
        return;
    }
    if let (Some(a), Some(e), Some(max)) = (array_bytes(argv), array_bytes(envp), arg_max()) {
        let _ = write!(sb, " ({} > {max})", a + e);
    }
}

fn rlimit_nproc(sb: &mut StringBuffer) {
    sb.puts("the process has exceeded its RLIMIT_NPROC resource limit");
    rlimit_value(sb, "RLIMIT_NPROC", libc::RLIMIT_NPROC);
}

fn exec_eacces(sb: &mut StringBuffer, path: &[u8], fc: &FinalComponent) {
    if path_resolution::explain(sb, libc::EACCES, path, "pathname", fc) {
        return;
    }
    if mount::is_noexec(path) {
        sb.puts("pathname is on a file system mounted with the noexec option");
        mount::mount_point(sb, path);
        return;
    }
    match probe::stat(path) {
        Ok(st) if st.st_mode & libc::S_IFMT != libc::S_IFREG => {
            sb.puts("pathname refers to a ");
            file_type_st(sb, &st);
            sb.puts(", it is not a regular file");
        }
        _ => sb.puts(
            "execute permission is denied for the file or a script interpreter, or search permission is denied \
             for one of the directories in the path prefix of pathname",
        ),
    }
}

/// Causes that hold whichever file the kernel was handed.
fn exec_common(
    sb: &mut StringBuffer,
    errnum: c_int,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> bool {
    match errnum {
        libc::E2BIG => e2big(sb, argv, envp),
        libc::EAGAIN => rlimit_nproc(sb),
        libc::ENFILE => analysers::enfile(sb),
        libc::EMFILE => analysers::emfile(sb),
        libc::ENOEXEC => sb.puts(
            "an executable is not in a recognized format, is for the wrong architecture, or has some other \
             format error that means it cannot be executed",
        ),
        _ => return false,
    }
    true
}

/// Cause analysis shared by execve and execvp once a path is known.
fn exec_cause(
    sb: &mut StringBuffer,
    errnum: c_int,
    pathname: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
    call: &str,
) {
    if exec_common(sb, errnum, argv, envp) {
        return;
    }
    match errnum {
        libc::EFAULT => {
            if probe_string(pathname).is_none() {
                efault(sb, "pathname");
            } else if !array_is_readable(argv) {
                efault(sb, "argv");
            } else {
                efault(sb, "envp");
            }
            return;
        }
        _ => {}
    }
    let Some(path) = readable_path(sb, pathname, "pathname") else {
        return;
    };
    let fc = FinalComponent::wanting(Want::EXECUTE);
    match errnum {
        libc::EACCES => exec_eacces(sb, &path, &fc),
        libc::ETXTBSY => {
            sb.puts("pathname is open for writing by one or more processes");
            if let Ok(st) = probe::stat(&path) {
                analysers::holders::path_to_pid(sb, &st);
            }
        }
        libc::EINVAL => sb.puts("an ELF executable had more than one PT_INTERP segment"),
        libc::EISDIR => sb.puts("an ELF interpreter was a directory"),
        libc::ELIBBAD => sb.puts("an ELF interpreter was not in a recognized format"),
        libc::EPERM => {
            if mount::is_nosuid(&path) {
                sb.puts(
                    "the file system is mounted nosuid, and the file has the set-user-ID or set-group-ID bit set",
                );
            } else {
                sb.puts("the process is being traced and the file has the set-user-ID or set-group-ID bit set");
            }
        }
        _ => {
            if !path_errno(sb, errnum, &path, "pathname", &fc) {
                generic(sb, errnum, call);
            }
        }
    }
}

pub struct Fork;

impl Explainer for Fork {
    fn name(&self) -> &'static str {
        "fork"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "fork").finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EAGAIN => {
                let nproc = probe::rlimit(libc::RLIMIT_NPROC);
                if nproc.is_some_and(|l| !l.is_infinite()) {
                    rlimit_nproc(sb);
                } else {
                    sb.puts("the system-imposed limit on the total number of processes was reached");
                }
            }
            libc::ENOMEM => enomem_kernel(sb),
            libc::ENOSYS => analysers::enosys_vague(sb, "fork"),
            _ => generic(sb, errnum, "fork"),
        }
    }
}

pub struct Execve {
    pub pathname: *const c_char,
    pub argv: *const *const c_char,
    pub envp: *const *const c_char,
}

impl Explainer for Execve {
    fn name(&self) -> &'static str {
        "execve"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "execve")
            .path("pathname", self.pathname, errnum)
            .arg("argv", |sb| string_array(sb, self.argv))
            .pointer("envp", self.envp as *const c_void)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        exec_cause(sb, errnum, self.pathname, self.argv, self.envp, "execve");
    }
}

pub struct Execvp {
    pub file: *const c_char,
    pub argv: *const *const c_char,
}

impl Execvp {
    /// First executable `file` along PATH, and the directories searched.
    fn search(file: &[u8]) -> (Option<Vec<u8>>, usize) {
        let path = std::env::var_os("PATH").unwrap_or_else(|| "/bin:/usr/bin".into());
        use std::os::unix::ffi::OsStrExt;
        let dirs: Vec<&[u8]> = path.as_bytes().split(|&b| b == b':').collect();
        let count = dirs.len();
        for dir in dirs {
            let dir: &[u8] = if dir.is_empty() { b"." } else { dir };
            let mut candidate = dir.to_vec();
            candidate.push(b'/');
            candidate.extend_from_slice(file);
            if probe::stat(&candidate).is_ok() {
                return (Some(candidate), count);
            }
        }
        (None, count)
    }

    fn not_on_path(sb: &mut StringBuffer, file: &[u8], searched: usize) {
        sb.puts("the file ");
        sb.puts_quoted(file);
        sb.puts(" was not found in any of the directories listed in the PATH environment variable");
        if sb.options().dialect_specific {
            let _ = write!(sb, " ({searched} directories)");
        }
    }
}

impl Explainer for Execvp {
    fn name(&self) -> &'static str {
        "execvp"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "execvp")
            .path("file", self.file, errnum)
            .arg("argv", |sb| string_array(sb, self.argv))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let Some(file) = probe_string(self.file) else {
            return efault(sb, "file");
        };
        if file.contains(&b'/') {
            return exec_cause(sb, errnum, self.file, self.argv, std::ptr::null(), "execvp");
        }
        let (found, searched) = Self::search(&file);
        let Some(path) = found else {
            if exec_common(sb, errnum, self.argv, std::ptr::null()) {
                return;
            }
            if errnum == libc::EFAULT && !array_is_readable(self.argv) {
                return efault(sb, "argv");
            }
            if errnum == libc::ENOMEM {
                return enomem_kernel(sb);
            }
            return Self::not_on_path(sb, &file, searched);
        };
        match probe::c_path(&path) {
            Some(c) => exec_cause(sb, errnum, c.as_ptr(), self.argv, std::ptr::null(), "execvp"),
            None => generic(sb, errnum, "execvp"),
        }
    }
}

fn sigchld_ignored() -> bool {
    let _guard = ErrnoGuard::new();
    let mut old = MaybeUninit::<libc::sigaction>::zeroed();
    // SAFETY: a null new action only queries; old is writable storage.
    let rc = unsafe { libc::sigaction(libc::SIGCHLD, std::ptr::null(), old.as_mut_ptr()) };
    // SAFETY: sigaction succeeded and filled old.
    rc == 0 && unsafe { old.assume_init() }.sa_sigaction == libc::SIG_IGN
}

pub struct Waitpid {
    pub pid: libc::pid_t,
    pub status: *const c_int,
    pub options: c_int,
}

impl Explainer for Waitpid {
    fn name(&self) -> &'static str {
        "waitpid"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "waitpid")
            .arg("pid", |sb| pid(sb, self.pid))
            .pointer("status", self.status as *const c_void)
            .arg("options", |sb| wait_options(sb, self.options))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::ECHILD => {
                match self.pid {
                    p if p > 0 => {
                        sb.puts("the process specified by pid does not exist or is not a child of the calling process")
                    }
                    -1 => sb.puts("the calling process does not have any unwaited-for children"),
                    0 => sb.puts("the calling process does not have any unwaited-for children in its process group"),
                    p => {
                        let _ = write!(
                            sb,
                            "the calling process does not have any unwaited-for children in process group {}",
                            p.unsigned_abs()
                        );
                    }
                }
                if sigchld_ignored() {
                    sb.puts(", and SIGCHLD is set to SIG_IGN so children are reaped automatically");
                }
            }
            libc::EFAULT => efault(sb, "status"),
            libc::EINTR => eintr(sb, "waitpid"),
            libc::EINVAL => analysers::limits::einval_bits(sb, "options"),
            _ => generic(sb, errnum, "waitpid"),
        }
    }
}

/// Real and effective UID of a process, from /proc.
fn process_uids(target: libc::pid_t) -> Option<(libc::uid_t, libc::uid_t)> {
    let status = std::fs::read_to_string(format!("/proc/{target}/status")).ok()?;
    let line = status.lines().find_map(|l| l.strip_prefix("Uid:"))?;
    let mut fields = line.split_whitespace().filter_map(|f| f.parse().ok());
    Some((fields.next()?, fields.next()?))
}

fn process_exists(target: libc::pid_t) -> bool {
    std::path::Path::new(&format!("/proc/{target}")).exists()
}

pub struct Kill {
    pub pid: libc::pid_t,
    pub sig: c_int,
}

impl Explainer for Kill {
    fn name(&self) -> &'static str {
        "kill"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "kill")
            .arg("pid", |sb| pid(sb, self.pid))
            .arg("sig", |sb| signal(sb, self.sig))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EINVAL => {
                sb.puts("the sig argument is not a valid signal number");
                analysers::software_error(sb);
            }
            libc::EPERM => {
                sb.puts("the process does not have permission to send the signal to any of the target processes");
                if self.pid > 0 && sb.options().dialect_specific {
                    if let Some((real, _)) = process_uids(self.pid) {
                        let id = Identity::real();
                        sb.puts(", the process real UID ");
                        identity::uid(sb, id.uid);
                        sb.puts(" does not match the target process real UID ");
                        identity::uid(sb, real);
                    }
                }
                capability::explain_if_missing(sb, Capability::Kill);
            }
            libc::ESRCH => match self.pid {
                p if p > 0 => {
                    let _ = write!(sb, "there is no process with a process ID of {p}");
                    if !process_exists(p) {
                        return;
                    }
                    sb.puts(", or it is a zombie");
                }
                0 => sb.puts("there are no processes in the caller's process group"),
                -1 => sb.puts("there are no processes the caller is permitted to signal"),
                p => {
                    let _ = write!(sb, "there is no process group with a process group ID of {}", p.unsigned_abs());
                }
            },
            _ => generic(sb, errnum, "kill"),
        }
    }
}

/// setuid and setgid; `group` selects which.
pub struct SetId {
    pub group: bool,
    pub id: u32,
}

impl Explainer for SetId {
    fn name(&self) -> &'static str {
        if self.group {
            "setgid"
        } else {
            "setuid"
        }
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        let caption = if self.group { "gid" } else { "uid" };
        Echo::new(sb, self.name())
            .arg(caption, |sb| {
                if self.group {
                    identity::gid(sb, self.id)
                } else {
                    identity::uid(sb, self.id)
                }
            })
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let (caption, kind, cap) = if self.group {
            ("gid", "GID", Capability::Setgid)
        } else {
            ("uid", "UID", Capability::Setuid)
        };
        match errnum {
            libc::EPERM => {
                let _ = write!(
                    sb,
                    "the process is not privileged and the {caption} argument does not match the real {kind} or \
                     saved set-{} ID of the calling process",
                    if self.group { "group" } else { "user" }
                );
                if sb.options().dialect_specific {
                    let real = Identity::real();
                    let _ = write!(sb, " (real {kind} ");
                    if self.group {
                        identity::gid(sb, real.gid);
                    } else {
                        identity::uid(sb, real.uid);
                    }
                    sb.putc(')');
                }
                capability::explain_if_missing(sb, cap);
            }
            libc::EAGAIN if !self.group => {
                sb.puts("the uid argument does not match the current UID and changing to it would put the process over its RLIMIT_NPROC resource limit");
                rlimit_value(sb, "RLIMIT_NPROC", libc::RLIMIT_NPROC);
            }
            libc::EINVAL => {
                let _ = write!(sb, "the {caption} argument is not valid in this user namespace");
            }
            _ => generic(sb, errnum, self.name()),
        }
    }
}

pub struct Setpgid {
    pub pid: libc::pid_t,
    pub pgid: libc::pid_t,
}

impl Explainer for Setpgid {
    fn name(&self) -> &'static str {
        "setpgid"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "setpgid")
            .arg("pid", |sb| pid(sb, self.pid))
            .value("pgid", self.pgid)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EACCES => sb.puts(
                "an attempt was made to change the process group ID of one of the children of the calling \
                 process and the child had already performed an execve(2)",
            ),
            libc::EINVAL => einval_too_small(sb, "pgid", i64::from(self.pgid)),
            libc::EPERM => sb.puts(
                "an attempt was made to move a process into a process group in a different session, or to \
                 change the process group ID of one of the children of the calling process and the child was in \
                 a different session, or to change the process group ID of a session leader",
            ),
            libc::ESRCH => sb.puts("the pid argument is not the calling process and not a child of the calling process"),
            _ => generic(sb, errnum, "setpgid"),
        }
    }
}

fn rlimit_struct(sb: &mut StringBuffer, rlim_ptr: *const libc::rlimit) {
    // SAFETY: rlimit is two integers, valid for every bit pattern.
    match unsafe { probe::read_struct::<libc::rlimit>(rlim_ptr as *const c_void) } {
        Some(r) => {
            sb.puts("{ rlim_cur = ");
            rlim(sb, r.rlim_cur);
            sb.puts(", rlim_max = ");
            rlim(sb, r.rlim_max);
            sb.puts(" }");
        }
        None => pointer(sb, rlim_ptr as *const c_void),
    }
}

fn invalid_resource(sb: &mut StringBuffer) {
    sb.puts("the resource argument is not a valid resource");
    analysers::software_error(sb);
}

/// getrlimit and setrlimit; `set` selects which.
pub struct Rlimit {
    pub set: bool,
    pub resource: c_int,
    pub rlim: *const libc::rlimit,
}

impl Explainer for Rlimit {
    fn name(&self) -> &'static str {
        if self.set {
            "setrlimit"
        } else {
            "getrlimit"
        }
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        let echo = Echo::new(sb, self.name()).arg("resource", |sb| rlimit_resource(sb, self.resource));
        if self.set {
            echo.arg("rlim", |sb| rlimit_struct(sb, self.rlim)).finish();
        } else {
            echo.pointer("rlim", self.rlim as *const c_void).finish();
        }
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EFAULT => efault(sb, "rlim"),
            libc::EINVAL => {
                if crate::parse_bits::find_by_value(i64::from(self.resource), rlimit_table()).is_none() {
                    return invalid_resource(sb);
                }
                // SAFETY: as in rlimit_struct.
                match unsafe { probe::read_struct::<libc::rlimit>(self.rlim as *const c_void) } {
                    Some(r) if self.set && r.rlim_cur > r.rlim_max => {
                        sb.puts("rlim->rlim_cur is greater than rlim->rlim_max");
                    }
                    _ => invalid_resource(sb),
                }
            }
            libc::EPERM if self.set => {
                sb.puts("an unprivileged process tried to raise the hard limit");
                let current = probe::rlimit(self.resource as libc::__rlimit_resource_t);
                // SAFETY: as in rlimit_struct.
                let wanted = unsafe { probe::read_struct::<libc::rlimit>(self.rlim as *const c_void) };
                if let (Some(current), Some(wanted)) = (current, wanted) {
                    if sb.options().dialect_specific {
                        sb.puts(" (");
                        rlim(sb, wanted.rlim_max);
                        sb.puts(" > ");
                        rlim(sb, current.hard);
                        sb.putc(')');
                    }
                }
                capability::explain_if_missing(sb, Capability::SysResource);
            }
            _ => generic(sb, errnum, self.name()),
        }
    }
}

pub struct Nice {
    pub inc: c_int,
}

impl Explainer for Nice {
    fn name(&self) -> &'static str {
        "nice"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "nice").value("inc", self.inc).finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EPERM => {
                sb.puts(
                    "the calling process attempted to increase its priority by supplying a negative inc but has \
                     insufficient privileges",
                );
                rlimit_value(sb, "RLIMIT_NICE", libc::RLIMIT_NICE);
                capability::explain_if_missing(sb, Capability::SysNice);
            }
            _ => generic(sb, errnum, "nice"),
        }
    }
}

pub struct Chroot {
    pub pathname: *const c_char,
}

impl Explainer for Chroot {
    fn name(&self) -> &'static str {
        "chroot"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "chroot").path("pathname", self.pathname, errnum).finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if errnum == libc::EPERM {
            sb.puts("the process has insufficient privilege to change the root directory");
            return capability::explain_missing(sb, Capability::SysChroot);
        }
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let fc = FinalComponent::directory(Want::SEARCH);
        if !path_errno(sb, errnum, &path, "pathname", &fc) {
            generic(sb, errnum, "chroot");
        }
    }
}

fn parse_fork(_args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(Fork))
}

fn parse_execve(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let argv = args.string_list("argv")?;
    let envp = args.environment();
    Ok(Box::new(Execve { pathname, argv, envp }))
}

fn parse_execvp(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let file = args.string("file")?;
    let argv = args.string_list("argv")?;
    Ok(Box::new(Execvp { file, argv }))
}

fn parse_waitpid(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pid = args.int("pid")?;
    let options = args.symbolic_or("options", wait_table(), 0)? as c_int;
    let status = args.buffer("status")? as *const c_int;
    Ok(Box::new(Waitpid { pid, status, options }))
}

fn parse_kill(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pid = args.int("pid")?;
    let sig = if args.has_more() { args.signal("sig")? } else { libc::SIGTERM };
    Ok(Box::new(Kill { pid, sig }))
}

fn parse_id(args: &mut Args<'_>, caption: &str) -> Result<u32> {
    let value = args.long(caption)?;
    u32::try_from(value).map_err(|_| ExplainError::parse(caption, &value.to_string(), "out of range"))
}

fn parse_setuid(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(SetId {
        group: false,
        id: parse_id(args, "uid")?,
    }))
}

fn parse_setgid(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(SetId {
        group: true,
        id: parse_id(args, "gid")?,
    }))
}

fn parse_setpgid(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pid = args.int("pid")?;
    let pgid = args.int("pgid")?;
    Ok(Box::new(Setpgid { pid, pgid }))
}

fn parse_rlimit(args: &mut Args<'_>, set: bool) -> Result<Box<dyn Explainer>> {
    let resource = args.symbolic("resource", rlimit_table())? as c_int;
    let rlim = if set {
        let cur = rlim_text(args, "rlim_cur")?;
        let max = if args.has_more() { rlim_text(args, "rlim_max")? } else { cur };
        let value = libc::rlimit {
            rlim_cur: cur,
            rlim_max: max,
        };
        args.bytes(&struct_bytes(&value)) as *const libc::rlimit
    } else {
        args.buffer("rlim")? as *const libc::rlimit
    };
    Ok(Box::new(Rlimit { set, resource, rlim }))
}

fn rlim_text(args: &mut Args<'_>, caption: &str) -> Result<libc::rlim_t> {
    match args.optional() {
        Some("RLIM_INFINITY") | Some("infinity") => Ok(libc::RLIM_INFINITY),
        Some(text) => crate::parse_bits::parse_c_integer(text)
            .and_then(|v| libc::rlim_t::try_from(v).ok())
            .ok_or_else(|| ExplainError::parse(caption, text, "not a limit")),
        None => Err(ExplainError::parse(caption, "", "missing")),
    }
}

fn parse_getrlimit(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_rlimit(args, false)
}

fn parse_setrlimit(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_rlimit(args, true)
}

fn parse_nice(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(Nice { inc: args.int("inc")? }))
}

fn parse_chroot(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(Chroot {
        pathname: args.string("pathname")?,
    }))
}

const EXEC_ERRNOS: &[c_int] = &[
    libc::E2BIG,
    libc::EACCES,
    libc::EAGAIN,
    libc::EFAULT,
    libc::EINVAL,
    libc::EIO,
    libc::EISDIR,
    libc::ELIBBAD,
    libc::ELOOP,
    libc::EMFILE,
    libc::ENAMETOOLONG,
    libc::ENFILE,
    libc::ENOENT,
    libc::ENOEXEC,
    libc::ENOMEM,
    libc::ENOTDIR,
    libc::EPERM,
    libc::ETXTBSY,
];

pub(crate) static CALLS: [CallEntry; 12] = [
    CallEntry {
        name: "fork",
        synopsis: "",
        errnos: &[libc::EAGAIN, libc::ENOMEM, libc::ENOSYS],
        sample: &[],
        parse: parse_fork,
    },
    CallEntry {
        name: "execve",
        synopsis: "pathname [argv...]",
        errnos: EXEC_ERRNOS,
        sample: &["/no/such/program", "program", "-v"],
        parse: parse_execve,
    },
    CallEntry {
        name: "execvp",
        synopsis: "file [argv...]",
        errnos: EXEC_ERRNOS,
        sample: &["no-such-program", "no-such-program"],
        parse: parse_execvp,
    },
    CallEntry {
        name: "waitpid",
        synopsis: "pid [options [status]]",
        errnos: &[libc::ECHILD, libc::EFAULT, libc::EINTR, libc::EINVAL],
        sample: &["-1", "WNOHANG"],
        parse: parse_waitpid,
    },
    CallEntry {
        name: "kill",
        synopsis: "pid [sig]",
        errnos: &[libc::EINVAL, libc::EPERM, libc::ESRCH],
        sample: &["1", "SIGTERM"],
        parse: parse_kill,
    },
    CallEntry {
        name: "setuid",
        synopsis: "uid",
        errnos: &[libc::EAGAIN, libc::EINVAL, libc::EPERM],
        sample: &["0"],
        parse: parse_setuid,
    },
    CallEntry {
        name: "setgid",
        synopsis: "gid",
        errnos: &[libc::EINVAL, libc::EPERM],
        sample: &["0"],
        parse: parse_setgid,
    },
    CallEntry {
        name: "setpgid",
        synopsis: "pid pgid",
        errnos: &[libc::EACCES, libc::EINVAL, libc::EPERM, libc::ESRCH],
        sample: &["1", "1"],
        parse: parse_setpgid,
    },
    CallEntry {
        name: "getrlimit",
        synopsis: "resource [rlim]",
        errnos: &[libc::EFAULT, libc::EINVAL],
        sample: &["RLIMIT_NOFILE"],
        parse: parse_getrlimit,
    },
    CallEntry {
        name: "setrlimit",
        synopsis: "resource rlim_cur [rlim_max]",
        errnos: &[libc::EFAULT, libc::EINVAL, libc::EPERM],
        sample: &["RLIMIT_NOFILE", "4096", "RLIM_INFINITY"],
        parse: parse_setrlimit,
    },
    CallEntry {
        name: "nice",
        synopsis: "inc",
        errnos: &[libc::EPERM],
        sample: &["-5"],
        parse: parse_nice,
    },
    CallEntry {
        name: "chroot",
        synopsis: "pathname",
        errnos: &[
            libc::EACCES,
            libc::EFAULT,
            libc::EIO,
            libc::ELOOP,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOTDIR,
            libc::EPERM,
        ],
        sample: &["/no/such/dir"],
        parse: parse_chroot,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::ffi::CString;

    #[test]
    fn argv_is_rendered_as_a_list() {
        let a = CString::new("ls").unwrap();
        let b = CString::new("-l").unwrap();
        let argv = [a.as_ptr(), b.as_ptr(), std::ptr::null()];
        let mut sb = StringBuffer::new(256, Options::default());
        string_array(&mut sb, argv.as_ptr());
        assert_eq!(sb.as_str(), "[\"ls\", \"-l\"]");

        let mut sb = StringBuffer::new(256, Options::default());
        string_array(&mut sb, 0x10 as *const *const c_char);
        assert_eq!(sb.as_str(), "0x10");
    }

    #[test]
    fn execvp_reports_path_search() {
        let file = CString::new("surely-no-such-program-here").unwrap();
        let argv = [file.as_ptr(), std::ptr::null()];
        let execvp = Execvp {
            file: file.as_ptr(),
            argv: argv.as_ptr(),
        };
        let mut sb = StringBuffer::new(512, Options::default());
        execvp.render_cause(&mut sb, libc::ENOENT);
        assert!(
            sb.as_str().contains("was not found in any of the directories listed in the PATH"),
            "{}",
            sb.as_str()
        );
    }

    #[test]
    fn execvp_explains_every_errno_when_path_search_misses() {
        let file = CString::new("surely-no-such-program-here").unwrap();
        let argv = [file.as_ptr(), std::ptr::null()];
        let execvp = Execvp {
            file: file.as_ptr(),
            argv: argv.as_ptr(),
        };
        for &errnum in EXEC_ERRNOS {
            let mut sb = StringBuffer::new(1024, Options::default());
            execvp.render_cause(&mut sb, errnum);
            assert!(!sb.is_empty(), "errno {errnum} left no cause");
        }

        let mut sb = StringBuffer::new(1024, Options::default());
        execvp.render_cause(&mut sb, libc::E2BIG);
        assert!(sb.as_str().starts_with("the total number of bytes in the argument list"), "{}", sb.as_str());

        let mut sb = StringBuffer::new(1024, Options::default());
        execvp.render_cause(&mut sb, libc::ETXTBSY);
        assert!(sb.as_str().contains("\"surely-no-such-program-here\" was not found"), "{}", sb.as_str());

        let bad = Execvp {
            file: file.as_ptr(),
            argv: 0x10 as *const *const c_char,
        };
        let mut sb = StringBuffer::new(1024, Options::default());
        bad.render_cause(&mut sb, libc::EFAULT);
        assert!(sb.as_str().starts_with("argv refers to memory"), "{}", sb.as_str());
    }

    #[test]
    fn kill_unknown_process() {
        let kill = Kill {
            pid: i32::MAX - 1,
            sig: libc::SIGTERM,
        };
        let mut call = StringBuffer::new(256, Options::default());
        kill.render_call(&mut call, libc::ESRCH);
        assert_eq!(call.as_str(), format!("kill(pid = {}, sig = SIGTERM)", i32::MAX - 1));
        let mut sb = StringBuffer::new(256, Options::default());
        kill.render_cause(&mut sb, libc::ESRCH);
        assert_eq!(sb.as_str(), format!("there is no process with a process ID of {}", i32::MAX - 1));
    }

    #[test]
    fn setrlimit_current_above_maximum() {
        let rlim = libc::rlimit {
            rlim_cur: 100,
            rlim_max: 10,
        };
        let call = Rlimit {
            set: true,
            resource: libc::RLIMIT_NOFILE as c_int,
            rlim: &rlim,
        };
        let mut sb = StringBuffer::new(256, Options::default());
        call.render_call(&mut sb, libc::EINVAL);
        assert_eq!(
            sb.as_str(),
            "setrlimit(resource = RLIMIT_NOFILE, rlim = { rlim_cur = 100, rlim_max = 10 })"
        );
        let mut sb = StringBuffer::new(256, Options::default());
        call.render_cause(&mut sb, libc::EINVAL);
        assert_eq!(sb.as_str(), "rlim->rlim_cur is greater than rlim->rlim_max");
    }
}
