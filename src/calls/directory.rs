/*============================================================
  Synavera Project: Explain
  Module: explain_core::calls::directory
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Explainers for calls that create, remove, rename or inspect
    names and their inodes: mkdir, rmdir, unlink, rename, link,
    symlink, readlink, chdir, opendir, access, chmod, chown,
    lchown, utime and realpath.

  Security / Safety Notes:
    Only read-only probes: stat, lstat, readlink, readdir.

  Dependencies:
    analysers, path_resolution, permission, identity.

  Operational Scope:
    The directories-and-names section of the call registry.

  Revision History:
    2026-10-18 COD  Authored name and inode explainers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Two-path calls blame the path that actually fails
============================================================*/

use std::fmt::Write;
use std::os::raw::{c_char, c_int, c_void};

use super::{path_errno, probe_string, readable_path, Args, CallEntry, Echo, Explainer};
use crate::analysers::limits::{einval_bits, einval_too_small};
use crate::analysers::{self, efault, emfile, enfile, enomem_kernel, generic};
use crate::capability::{self, Capability};
use crate::error::Result;
use crate::identity::{self, Identity};
use crate::mount;
use crate::path_resolution::{self, FinalComponent, Want};
use crate::permission;
use crate::probe;
use crate::render::file_type::caption_name_type_st;
use crate::render::mode::{access_mode, permission_mode, ACCESS_MODES};
use crate::string_buffer::StringBuffer;

fn is_dir(path: &[u8]) -> bool {
    probe::stat(path).is_ok_and(|st| st.st_mode & libc::S_IFMT == libc::S_IFDIR)
}

/// Walk `first`, then `second`; the first path with a definite
/// problem is blamed. Falls back to the shared path causes on `first`.
fn two_paths(
    sb: &mut StringBuffer,
    errnum: c_int,
    first: (&[u8], &str, &FinalComponent),
    second: (&[u8], &str, &FinalComponent),
) -> bool {
    if path_resolution::explain(sb, errnum, first.0, first.1, first.2) {
        return true;
    }
    if path_resolution::explain(sb, errnum, second.0, second.1, second.2) {
        return true;
    }
    path_errno(sb, errnum, first.0, first.1, first.2)
}

/// The containing directory has the sticky bit and the caller owns
/// neither the directory nor the file.
fn sticky_denial(sb: &mut StringBuffer, path: &[u8], caption: &str) -> bool {
    let parent = mount::dirname(path);
    let (Ok(dir), Ok(st)) = (probe::stat(&parent), probe::lstat(path)) else {
        return false;
    };
    let id = Identity::effective();
    if dir.st_mode & libc::S_ISVTX == 0 || id.uid == st.st_uid || id.uid == dir.st_uid {
        return false;
    }
    if capability::has(Capability::Fowner) {
        return false;
    }
    let _ = write!(
        sb,
        "the directory containing {caption} has the sticky bit (S_ISVTX) set and the process's effective UID is \
         neither the UID of the file to be deleted nor that of the directory containing it"
    );
    capability::explain_missing(sb, Capability::Fowner);
    true
}

fn unsupported(sb: &mut StringBuffer, path: &[u8], caption: &str, what: &str) {
    let _ = write!(sb, "the file system containing {caption} does not support {what}");
    if !mount::mount_point(sb, path) {
        mount::mount_point_dirname(sb, path);
    }
}

pub struct Mkdir {
    pub pathname: *const c_char,
    pub mode: libc::mode_t,
}

impl Explainer for Mkdir {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "mkdir")
            .path("pathname", self.pathname, errnum)
            .arg("mode", |sb| permission_mode(sb, self.mode))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let fc = FinalComponent::new_entry(libc::S_IFDIR);
        match errnum {
            libc::EEXIST => {
                if !path_resolution::explain(sb, errnum, &path, "pathname", &fc) {
                    analysers::eexist(sb, &path, "pathname");
                }
            }
            libc::EMLINK => analysers::emlink_mkdir(sb, &path, "pathname"),
            libc::ENOSPC => analysers::enospc(sb, &path, "pathname"),
            libc::EDQUOT => analysers::edquot(sb, &path, "pathname"),
            libc::EPERM => unsupported(sb, &path, "pathname", "the creation of directories"),
            _ => {
                if !path_errno(sb, errnum, &path, "pathname", &fc) {
                    generic(sb, errnum, "mkdir");
                }
            }
        }
    }
}

pub struct Rmdir {
    pub pathname: *const c_char,
}

impl Explainer for Rmdir {
    fn name(&self) -> &'static str {
        "rmdir"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "rmdir").path("pathname", self.pathname, errnum).finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let fc = FinalComponent {
            want: Want::UNLINK,
            must_be_a_st_mode: true,
            st_mode: libc::S_IFDIR,
            follow_symlink: false,
            ..FinalComponent::default()
        };
        match errnum {
            libc::EBUSY => analysers::ebusy(sb, &path, "pathname"),
            libc::ENOTEMPTY | libc::EEXIST => analysers::enotempty(sb, &path, "pathname"),
            libc::EINVAL => sb.puts("pathname has . as last component"),
            libc::EPERM => {
                if !sticky_denial(sb, &path, "pathname") {
                    unsupported(sb, &path, "pathname", "the removal of directories");
                }
            }
            _ => {
                if !path_errno(sb, errnum, &path, "pathname", &fc) {
                    generic(sb, errnum, "rmdir");
                }
            }
        }
    }
}

pub struct Unlink {
    pub pathname: *const c_char,
}

impl Explainer for Unlink {
    fn name(&self) -> &'static str {
        "unlink"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "unlink").path("pathname", self.pathname, errnum).finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let fc = FinalComponent {
            follow_symlink: false,
            ..FinalComponent::wanting(Want::UNLINK)
        };
        match errnum {
            libc::EISDIR => sb.puts("pathname refers to a directory, and you must use rmdir(2) to remove directories"),
            libc::EPERM => {
                if probe::lstat(&path).is_ok_and(|st| st.st_mode & libc::S_IFMT == libc::S_IFDIR) {
                    sb.puts("pathname refers to a directory, and you must use rmdir(2) to remove directories");
                } else if !sticky_denial(sb, &path, "pathname") {
                    unsupported(sb, &path, "pathname", "the unlinking of files");
                }
            }
            libc::EBUSY => analysers::ebusy(sb, &path, "pathname"),
            _ => {
                if !path_errno(sb, errnum, &path, "pathname", &fc) {
                    generic(sb, errnum, "unlink");
                }
            }
        }
    }
}

pub struct Rename {
    pub oldpath: *const c_char,
    pub newpath: *const c_char,
}

impl Explainer for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "rename")
            .path("oldpath", self.oldpath, errnum)
            .path("newpath", self.newpath, errnum)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let Some(oldpath) = readable_path(sb, self.oldpath, "oldpath") else {
            return;
        };
        let Some(newpath) = readable_path(sb, self.newpath, "newpath") else {
            return;
        };
        let old_fc = FinalComponent {
            follow_symlink: false,
            ..FinalComponent::wanting(Want::UNLINK)
        };
        let new_fc = FinalComponent {
            must_exist: false,
            follow_symlink: false,
            ..FinalComponent::wanting(Want::CREATE)
        };
        match errnum {
            libc::EXDEV => analysers::exdev(sb, &oldpath, &newpath, "oldpath", "newpath"),
            libc::EISDIR => sb.puts("newpath is an existing directory, but oldpath is not a directory"),
            libc::ENOTEMPTY | libc::EEXIST => analysers::enotempty(sb, &newpath, "newpath"),
            libc::EINVAL => sb.puts("an attempt was made to make a directory a subdirectory of itself"),
            libc::EBUSY => {
                if probe::stat(&newpath).is_ok() && is_dir(&newpath) {
                    analysers::ebusy(sb, &newpath, "newpath");
                } else {
                    analysers::ebusy(sb, &oldpath, "oldpath");
                }
            }
            libc::EMLINK => analysers::emlink(sb, &oldpath, &newpath),
            libc::ENOSPC => analysers::enospc(sb, &newpath, "newpath"),
            libc::EDQUOT => analysers::edquot(sb, &newpath, "newpath"),
            libc::EPERM => {
                if !sticky_denial(sb, &oldpath, "oldpath") && !sticky_denial(sb, &newpath, "newpath") {
                    unsupported(sb, &oldpath, "oldpath", "renaming");
                }
            }
            _ => {
                if !two_paths(sb, errnum, (&oldpath, "oldpath", &old_fc), (&newpath, "newpath", &new_fc)) {
                    generic(sb, errnum, "rename");
                }
            }
        }
    }
}

pub struct Link {
    pub oldpath: *const c_char,
    pub newpath: *const c_char,
}

impl Explainer for Link {
    fn name(&self) -> &'static str {
        "link"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "link")
            .path("oldpath", self.oldpath, errnum)
            .path("newpath", self.newpath, errnum)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let Some(oldpath) = readable_path(sb, self.oldpath, "oldpath") else {
            return;
        };
        let Some(newpath) = readable_path(sb, self.newpath, "newpath") else {
            return;
        };
        let old_fc = FinalComponent {
            follow_symlink: false,
            ..FinalComponent::default()
        };
        let new_fc = FinalComponent::new_entry(libc::S_IFREG);
        match errnum {
            libc::EEXIST => {
                if !path_resolution::explain(sb, errnum, &newpath, "newpath", &new_fc) {
                    analysers::eexist(sb, &newpath, "newpath");
                }
            }
            libc::EMLINK => analysers::emlink(sb, &oldpath, &newpath),
            libc::EPERM => {
                if is_dir(&oldpath) {
                    sb.puts("oldpath is a directory and it is not possible to make hard links to directories");
                } else {
                    unsupported(sb, &newpath, "newpath", "the creation of hard links");
                }
            }
            libc::EXDEV => analysers::exdev(sb, &oldpath, &newpath, "oldpath", "newpath"),
            libc::ENOSPC => analysers::enospc(sb, &newpath, "newpath"),
            libc::EDQUOT => analysers::edquot(sb, &newpath, "newpath"),
            _ => {
                if !two_paths(sb, errnum, (&oldpath, "oldpath", &old_fc), (&newpath, "newpath", &new_fc)) {
                    generic(sb, errnum, "link");
                }
            }
        }
    }
}

pub struct Symlink {
    pub oldpath: *const c_char,
    pub newpath: *const c_char,
}

impl Explainer for Symlink {
    fn name(&self) -> &'static str {
        "symlink"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "symlink")
            .path("oldpath", self.oldpath, errnum)
            .path("newpath", self.newpath, errnum)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let Some(oldpath) = readable_path(sb, self.oldpath, "oldpath") else {
            return;
        };
        let Some(newpath) = readable_path(sb, self.newpath, "newpath") else {
            return;
        };
        let fc = FinalComponent::new_entry(libc::S_IFLNK);
        match errnum {
            libc::ENOENT if oldpath.is_empty() => sb.puts("oldpath is the empty string"),
            libc::EEXIST => {
                if !path_resolution::explain(sb, errnum, &newpath, "newpath", &fc) {
                    analysers::eexist(sb, &newpath, "newpath");
                }
            }
            libc::EPERM => unsupported(sb, &newpath, "newpath", "the creation of symbolic links"),
            libc::ENOSPC => analysers::enospc(sb, &newpath, "newpath"),
            libc::EDQUOT => analysers::edquot(sb, &newpath, "newpath"),
            _ => {
                if !path_errno(sb, errnum, &newpath, "newpath", &fc) {
                    generic(sb, errnum, "symlink");
                }
            }
        }
    }
}

pub struct Readlink {
    pub pathname: *const c_char,
    pub data: *const c_void,
    pub data_size: usize,
}

impl Explainer for Readlink {
    fn name(&self) -> &'static str {
        "readlink"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "readlink")
            .path("pathname", self.pathname, errnum)
            .pointer("data", self.data)
            .value("data_size", self.data_size)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if errnum == libc::EFAULT && probe_string(self.pathname).is_some() {
            return efault(sb, "data");
        }
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let fc = FinalComponent {
            follow_symlink: false,
            ..FinalComponent::default()
        };
        match errnum {
            libc::EINVAL => {
                if self.data_size == 0 {
                    return einval_too_small(sb, "data_size", 0);
                }
                match probe::lstat(&path) {
                    Ok(st) => {
                        caption_name_type_st(sb, Some("pathname"), &path, Some(&st));
                        sb.puts(" is not a symbolic link");
                    }
                    Err(_) => sb.puts("the named file is not a symbolic link"),
                }
            }
            _ => {
                if !path_errno(sb, errnum, &path, "pathname", &fc) {
                    generic(sb, errnum, "readlink");
                }
            }
        }
    }
}

/// chdir and opendir share the directory lookup.
pub struct DirectoryLookup {
    pub opening: bool,
    pub pathname: *const c_char,
}

impl Explainer for DirectoryLookup {
    fn name(&self) -> &'static str {
        if self.opening {
            "opendir"
        } else {
            "chdir"
        }
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, self.name()).path("pathname", self.pathname, errnum).finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EMFILE => return emfile(sb),
            libc::ENFILE => return enfile(sb),
            _ => {}
        }
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let want = if self.opening { Want::READ } else { Want::SEARCH };
        let fc = FinalComponent::directory(want);
        if !path_errno(sb, errnum, &path, "pathname", &fc) {
            generic(sb, errnum, self.name());
        }
    }
}

pub struct Access {
    pub pathname: *const c_char,
    pub mode: c_int,
}

impl Explainer for Access {
    fn name(&self) -> &'static str {
        "access"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "access")
            .path("pathname", self.pathname, errnum)
            .arg("mode", |sb| access_mode(sb, self.mode))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if errnum == libc::EINVAL {
            return einval_bits(sb, "mode");
        }
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let mut want = Want::empty();
        if self.mode & libc::R_OK != 0 {
            want |= Want::READ;
        }
        if self.mode & libc::W_OK != 0 {
            want |= Want::WRITE;
        }
        if self.mode & libc::X_OK != 0 {
            want |= Want::EXECUTE;
        }
        // access checks with the real identity.
        let fc = FinalComponent {
            id: Identity::real(),
            ..FinalComponent::wanting(want)
        };
        match errnum {
            libc::ETXTBSY => analysers::etxtbsy(sb, &path, "pathname"),
            libc::EROFS => {
                sb.puts("write access was requested for a file on a read-only file system");
                if !mount::mount_point(sb, &path) {
                    mount::mount_point_dirname(sb, &path);
                }
            }
            _ => {
                if !path_errno(sb, errnum, &path, "pathname", &fc) {
                    generic(sb, errnum, "access");
                }
            }
        }
    }
}

fn not_owner(sb: &mut StringBuffer, path: &[u8], follow: bool) -> bool {
    let st = if follow { probe::stat(path) } else { probe::lstat(path) };
    let Ok(st) = st else {
        return false;
    };
    sb.puts("the process is not the owner of pathname");
    permission::explain_not_owner(sb, &st, &Identity::effective());
    true
}

pub struct Chmod {
    pub pathname: *const c_char,
    pub mode: libc::mode_t,
}

impl Explainer for Chmod {
    fn name(&self) -> &'static str {
        "chmod"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "chmod")
            .path("pathname", self.pathname, errnum)
            .arg("mode", |sb| permission_mode(sb, self.mode))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let fc = FinalComponent::wanting(Want::MODIFY_INODE);
        match errnum {
            libc::EPERM => {
                if !not_owner(sb, &path, true) {
                    generic(sb, errnum, "chmod");
                }
            }
            _ => {
                if !path_errno(sb, errnum, &path, "pathname", &fc) {
                    generic(sb, errnum, "chmod");
                }
            }
        }
    }
}

/// chown and lchown; `follow` selects which.
pub struct Chown {
    pub follow: bool,
    pub pathname: *const c_char,
    pub owner: libc::uid_t,
    pub group: libc::gid_t,
}

const UNCHANGED: u32 = u32::MAX;

fn owner_or_unchanged(sb: &mut StringBuffer, id: u32, render: fn(&mut StringBuffer, u32)) {
    if id == UNCHANGED {
        sb.puts("-1");
    } else {
        render(sb, id);
    }
}

impl Explainer for Chown {
    fn name(&self) -> &'static str {
        if self.follow {
            "chown"
        } else {
            "lchown"
        }
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, self.name())
            .path("pathname", self.pathname, errnum)
            .arg("owner", |sb| owner_or_unchanged(sb, self.owner, identity::uid))
            .arg("group", |sb| owner_or_unchanged(sb, self.group, identity::gid))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let fc = FinalComponent {
            follow_symlink: self.follow,
            ..FinalComponent::wanting(Want::MODIFY_INODE)
        };
        if errnum != libc::EPERM {
            if !path_errno(sb, errnum, &path, "pathname", &fc) {
                generic(sb, errnum, self.name());
            }
            return;
        }
        let st = if self.follow { probe::stat(&path) } else { probe::lstat(&path) };
        let id = Identity::effective();
        match st {
            Ok(st) if self.owner != UNCHANGED && self.owner != st.st_uid => {
                sb.puts("only a privileged process may change the owner of a file");
                capability::explain_if_missing(sb, Capability::Chown);
            }
            Ok(st) if id.uid != st.st_uid => {
                sb.puts("the process is not the owner of pathname");
                permission::explain_not_owner(sb, &st, &id);
            }
            Ok(_) if self.group != UNCHANGED && !id.in_group(self.group) => {
                sb.puts("the group argument (");
                identity::gid(sb, self.group);
                sb.puts(") is not one of the process's groups");
                capability::explain_if_missing(sb, Capability::Chown);
            }
            _ => generic(sb, errnum, self.name()),
        }
    }
}

pub struct Utime {
    pub pathname: *const c_char,
    pub times: *const libc::utimbuf,
}

fn utimbuf(sb: &mut StringBuffer, times: *const libc::utimbuf) {
    if times.is_null() {
        sb.puts("NULL");
        return;
    }
    // SAFETY: utimbuf is two time_t values, valid for every bit pattern.
    match unsafe { probe::read_struct::<libc::utimbuf>(times as *const c_void) } {
        Some(t) => {
            let _ = write!(sb, "{{ actime = {}, modtime = {} }}", t.actime, t.modtime);
        }
        None => crate::render::pointer::pointer(sb, times as *const c_void),
    }
}

impl Explainer for Utime {
    fn name(&self) -> &'static str {
        "utime"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "utime")
            .path("pathname", self.pathname, errnum)
            .arg("times", |sb| utimbuf(sb, self.times))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if errnum == libc::EFAULT && probe_string(self.pathname).is_some() {
            return efault(sb, "times");
        }
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let want = if self.times.is_null() { Want::WRITE } else { Want::MODIFY_INODE };
        let fc = FinalComponent::wanting(want);
        match errnum {
            libc::EPERM => {
                if !not_owner(sb, &path, true) {
                    generic(sb, errnum, "utime");
                }
            }
            libc::EACCES if self.times.is_null() => {
                if !path_resolution::explain(sb, errnum, &path, "pathname", &fc) {
                    sb.puts(
                        "times is NULL and the process is not the owner of pathname and does not have write \
                         permission to it",
                    );
                }
            }
            _ => {
                if !path_errno(sb, errnum, &path, "pathname", &fc) {
                    generic(sb, errnum, "utime");
                }
            }
        }
    }
}

pub struct Realpath {
    pub pathname: *const c_char,
    pub resolved_path: *const c_char,
}

impl Explainer for Realpath {
    fn name(&self) -> &'static str {
        "realpath"
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, "realpath")
            .path("pathname", self.pathname, errnum)
            .pointer("resolved_path", self.resolved_path as *const c_void)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if errnum == libc::EINVAL && self.pathname.is_null() {
            sb.puts("the pathname argument is NULL");
            return analysers::software_error(sb);
        }
        let Some(path) = readable_path(sb, self.pathname, "pathname") else {
            return;
        };
        let fc = FinalComponent::default();
        match errnum {
            libc::ENOMEM => enomem_kernel(sb),
            libc::EINVAL => {
                sb.puts("either the pathname argument or the resolved_path argument is NULL");
                analysers::software_error(sb);
            }
            _ => {
                if !path_errno(sb, errnum, &path, "pathname", &fc) {
                    generic(sb, errnum, "realpath");
                }
            }
        }
    }
}

fn parse_mkdir(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let mode = args.mode_or("mode", 0o777)?;
    Ok(Box::new(Mkdir { pathname, mode }))
}

fn parse_rmdir(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(Rmdir {
        pathname: args.string("pathname")?,
    }))
}

fn parse_unlink(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(Unlink {
        pathname: args.string("pathname")?,
    }))
}

fn parse_rename(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let oldpath = args.string("oldpath")?;
    let newpath = args.string("newpath")?;
    Ok(Box::new(Rename { oldpath, newpath }))
}

fn parse_link(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let oldpath = args.string("oldpath")?;
    let newpath = args.string("newpath")?;
    Ok(Box::new(Link { oldpath, newpath }))
}

fn parse_symlink(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let oldpath = args.string("oldpath")?;
    let newpath = args.string("newpath")?;
    Ok(Box::new(Symlink { oldpath, newpath }))
}

fn parse_readlink(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let data_size = args.size_or("data_size", super::SCRATCH_BUFFER)?;
    let data = args.buffer("data")?;
    Ok(Box::new(Readlink {
        pathname,
        data,
        data_size,
    }))
}

fn parse_chdir(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(DirectoryLookup {
        opening: false,
        pathname: args.string("pathname")?,
    }))
}

fn parse_opendir(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(DirectoryLookup {
        opening: true,
        pathname: args.string("pathname")?,
    }))
}

fn parse_access(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let mode = args.symbolic_or("mode", &ACCESS_MODES, i64::from(libc::F_OK))? as c_int;
    Ok(Box::new(Access { pathname, mode }))
}

fn parse_chmod(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let mode = args.mode("mode")?;
    Ok(Box::new(Chmod { pathname, mode }))
}

fn parse_id(text: Option<&str>, caption: &str, lookup: fn(&str) -> Option<u32>) -> Result<u32> {
    match text {
        None | Some("-1") => Ok(UNCHANGED),
        Some(text) => crate::parse_bits::parse_c_integer(text)
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| lookup(text))
            .ok_or_else(|| crate::error::ExplainError::parse(caption, text, "unknown name")),
    }
}

fn uid_by_name(name: &str) -> Option<u32> {
    let c = std::ffi::CString::new(name).ok()?;
    // SAFETY: getpwnam reads a NUL-terminated name; the result is copied
    // out before any other passwd call.
    let pw = unsafe { libc::getpwnam(c.as_ptr()) };
    // SAFETY: non-null results point at a valid passwd record.
    (!pw.is_null()).then(|| unsafe { (*pw).pw_uid })
}

fn gid_by_name(name: &str) -> Option<u32> {
    let c = std::ffi::CString::new(name).ok()?;
    // SAFETY: as for getpwnam.
    let gr = unsafe { libc::getgrnam(c.as_ptr()) };
    // SAFETY: non-null results point at a valid group record.
    (!gr.is_null()).then(|| unsafe { (*gr).gr_gid })
}

fn parse_chown_common(args: &mut Args<'_>, follow: bool) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let owner = parse_id(args.optional(), "owner", uid_by_name)?;
    let group = parse_id(args.optional(), "group", gid_by_name)?;
    Ok(Box::new(Chown {
        follow,
        pathname,
        owner,
        group,
    }))
}

fn parse_chown(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_chown_common(args, true)
}

fn parse_lchown(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_chown_common(args, false)
}

fn parse_utime(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let times = match args.optional() {
        None | Some("NULL") => std::ptr::null(),
        Some(text) => {
            let when = crate::parse_bits::parse_c_integer(text)
                .ok_or_else(|| crate::error::ExplainError::parse("times", text, "not a time"))?;
            let buf = libc::utimbuf {
                actime: when,
                modtime: when,
            };
            // SAFETY: utimbuf is plain data; viewing it as bytes is sound.
            let bytes = unsafe {
                std::slice::from_raw_parts(&buf as *const libc::utimbuf as *const u8, std::mem::size_of::<libc::utimbuf>())
            };
            args.bytes(bytes) as *const libc::utimbuf
        }
    };
    Ok(Box::new(Utime { pathname, times }))
}

fn parse_realpath(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let pathname = args.string("pathname")?;
    let resolved_path = args.buffer("resolved_path")? as *const c_char;
    Ok(Box::new(Realpath {
        pathname,
        resolved_path,
    }))
}

const NAME_ERRNOS: &[c_int] = &[
    libc::EACCES,
    libc::EFAULT,
    libc::EIO,
    libc::ELOOP,
    libc::ENAMETOOLONG,
    libc::ENOENT,
    libc::ENOMEM,
    libc::ENOTDIR,
    libc::EROFS,
];

pub(crate) static CALLS: [CallEntry; 15] = [
    CallEntry {
        name: "mkdir",
        synopsis: "pathname [mode]",
        errnos: &[
            libc::EACCES,
            libc::EDQUOT,
            libc::EEXIST,
            libc::EFAULT,
            libc::ELOOP,
            libc::EMLINK,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOSPC,
            libc::ENOTDIR,
            libc::EPERM,
            libc::EROFS,
        ],
        sample: &["/tmp", "0755"],
        parse: parse_mkdir,
    },
    CallEntry {
        name: "rmdir",
        synopsis: "pathname",
        errnos: &[
            libc::EACCES,
            libc::EBUSY,
            libc::EFAULT,
            libc::EINVAL,
            libc::ELOOP,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOTDIR,
            libc::ENOTEMPTY,
            libc::EPERM,
            libc::EROFS,
        ],
        sample: &["/tmp"],
        parse: parse_rmdir,
    },
    CallEntry {
        name: "unlink",
        synopsis: "pathname",
        errnos: &[
            libc::EACCES,
            libc::EBUSY,
            libc::EFAULT,
            libc::EIO,
            libc::EISDIR,
            libc::ELOOP,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOTDIR,
            libc::EPERM,
            libc::EROFS,
        ],
        sample: &["/no/such/file"],
        parse: parse_unlink,
    },
    CallEntry {
        name: "rename",
        synopsis: "oldpath newpath",
        errnos: &[
            libc::EACCES,
            libc::EBUSY,
            libc::EDQUOT,
            libc::EFAULT,
            libc::EINVAL,
            libc::EISDIR,
            libc::ELOOP,
            libc::EMLINK,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOSPC,
            libc::ENOTDIR,
            libc::ENOTEMPTY,
            libc::EPERM,
            libc::EROFS,
            libc::EXDEV,
        ],
        sample: &["/no/such/file", "/tmp/other"],
        parse: parse_rename,
    },
    CallEntry {
        name: "link",
        synopsis: "oldpath newpath",
        errnos: &[
            libc::EACCES,
            libc::EDQUOT,
            libc::EEXIST,
            libc::EFAULT,
            libc::EIO,
            libc::ELOOP,
            libc::EMLINK,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOSPC,
            libc::ENOTDIR,
            libc::EPERM,
            libc::EROFS,
            libc::EXDEV,
        ],
        sample: &["/etc/passwd", "/tmp/passwd-link"],
        parse: parse_link,
    },
    CallEntry {
        name: "symlink",
        synopsis: "oldpath newpath",
        errnos: &[
            libc::EACCES,
            libc::EDQUOT,
            libc::EEXIST,
            libc::EFAULT,
            libc::EIO,
            libc::ELOOP,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOSPC,
            libc::ENOTDIR,
            libc::EPERM,
            libc::EROFS,
        ],
        sample: &["target", "/tmp"],
        parse: parse_symlink,
    },
    CallEntry {
        name: "readlink",
        synopsis: "pathname [data_size [data]]",
        errnos: &[
            libc::EACCES,
            libc::EFAULT,
            libc::EINVAL,
            libc::EIO,
            libc::ELOOP,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOTDIR,
        ],
        sample: &["/etc/passwd"],
        parse: parse_readlink,
    },
    CallEntry {
        name: "chdir",
        synopsis: "pathname",
        errnos: NAME_ERRNOS,
        sample: &["/etc/passwd"],
        parse: parse_chdir,
    },
    CallEntry {
        name: "opendir",
        synopsis: "pathname",
        errnos: &[
            libc::EACCES,
            libc::EFAULT,
            libc::EMFILE,
            libc::ENFILE,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOTDIR,
        ],
        sample: &["/no/such/dir"],
        parse: parse_opendir,
    },
    CallEntry {
        name: "access",
        synopsis: "pathname [mode]",
        errnos: &[
            libc::EACCES,
            libc::EFAULT,
            libc::EINVAL,
            libc::EIO,
            libc::ELOOP,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOTDIR,
            libc::EROFS,
            libc::ETXTBSY,
        ],
        sample: &["/etc/shadow", "R_OK"],
        parse: parse_access,
    },
    CallEntry {
        name: "chmod",
        synopsis: "pathname mode",
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
            libc::EROFS,
        ],
        sample: &["/etc/passwd", "0600"],
        parse: parse_chmod,
    },
    CallEntry {
        name: "chown",
        synopsis: "pathname [owner [group]]",
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
            libc::EROFS,
        ],
        sample: &["/etc/passwd", "0", "0"],
        parse: parse_chown,
    },
    CallEntry {
        name: "lchown",
        synopsis: "pathname [owner [group]]",
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
            libc::EROFS,
        ],
        sample: &["/etc/passwd", "-1", "0"],
        parse: parse_lchown,
    },
    CallEntry {
        name: "utime",
        synopsis: "pathname [times]",
        errnos: &[libc::EACCES, libc::EFAULT, libc::ENOENT, libc::ENOTDIR, libc::EPERM, libc::EROFS],
        sample: &["/etc/passwd", "0"],
        parse: parse_utime,
    },
    CallEntry {
        name: "realpath",
        synopsis: "pathname [resolved_path]",
        errnos: &[
            libc::EACCES,
            libc::EINVAL,
            libc::EIO,
            libc::ELOOP,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOTDIR,
        ],
        sample: &["/no/such/file"],
        parse: parse_realpath,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::ffi::CString;

    fn cause(explainer: &dyn Explainer, errnum: c_int) -> String {
        let mut sb = StringBuffer::with_footnotes(4096, Options::default());
        explainer.render_cause(&mut sb, errnum);
        let notes = sb.footnotes().map(|n| n.as_str().to_string()).unwrap_or_default();
        format!("{}{}", sb.as_str(), notes)
    }

    #[test]
    fn mkdir_existing_directory() {
        let path = CString::new("/tmp").unwrap();
        let mkdir = Mkdir {
            pathname: path.as_ptr(),
            mode: 0o755,
        };
        let mut call = StringBuffer::new(256, Options::default());
        mkdir.render_call(&mut call, libc::EEXIST);
        assert_eq!(call.as_str(), "mkdir(pathname = \"/tmp\", mode = 0755)");
        let text = cause(&mkdir, libc::EEXIST);
        assert!(text.contains("\"tmp\" directory"), "{text}");
        assert!(text.contains("\"/\" directory"), "{text}");
    }

    #[test]
    fn rmdir_non_empty_directory_counts_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"").unwrap();
        std::fs::write(dir.path().join("b"), b"").unwrap();
        let path = CString::new(dir.path().to_str().unwrap()).unwrap();
        let rmdir = Rmdir { pathname: path.as_ptr() };
        let text = cause(&rmdir, libc::ENOTEMPTY);
        assert!(text.ends_with("contains entries other than \".\" and \"..\" (2 entries)"), "{text}");
    }

    #[test]
    fn rename_blames_the_missing_old_path() {
        let dir = tempfile::tempdir().unwrap();
        let old = CString::new(dir.path().join("missing").to_str().unwrap()).unwrap();
        let new = CString::new(dir.path().join("new").to_str().unwrap()).unwrap();
        let rename = Rename {
            oldpath: old.as_ptr(),
            newpath: new.as_ptr(),
        };
        let text = cause(&rename, libc::ENOENT);
        assert!(text.contains("\"missing\""), "{text}");
        assert!(text.contains("oldpath"), "{text}");
    }

    #[test]
    fn unlink_directory_points_at_rmdir() {
        let dir = tempfile::tempdir().unwrap();
        let path = CString::new(dir.path().to_str().unwrap()).unwrap();
        let unlink = Unlink { pathname: path.as_ptr() };
        assert!(cause(&unlink, libc::EISDIR).contains("rmdir(2)"));
    }

    #[test]
    fn readlink_on_regular_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = CString::new(file.path().to_str().unwrap()).unwrap();
        let readlink = Readlink {
            pathname: path.as_ptr(),
            data: std::ptr::null(),
            data_size: 100,
        };
        let text = cause(&readlink, libc::EINVAL);
        assert!(text.ends_with("regular file is not a symbolic link"), "{text}");
    }

    #[test]
    fn chown_echo_keeps_minus_one() {
        let path = CString::new("/x").unwrap();
        let chown = Chown {
            follow: true,
            pathname: path.as_ptr(),
            owner: UNCHANGED,
            group: 0,
        };
        let mut sb = StringBuffer::new(256, Options::default());
        chown.render_call(&mut sb, libc::EPERM);
        assert_eq!(sb.as_str(), "chown(pathname = \"/x\", owner = -1, group = 0 \"root\")");
    }
}
