/*============================================================
  Synavera Project: Explain
  Module: explain_core::path_resolution
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Walk a pathname component by component the way the kernel
    resolves it, and describe the leftmost component that would
    have made the failing call fail.

  Security / Safety Notes:
    Read-only: lstat, readlink, pathconf and directory listing.
    Any probe failure ends the walk with "no diagnosis" rather
    than a guess; the walk is bounded in steps.

  Dependencies:
    bitflags for the wanted-access set; permission, identity,
    mount and fstrcmp for the individual verdicts.

  Operational Scope:
    Shared by every analyser whose error is rooted in pathname
    lookup (ENOENT, ENOTDIR, EACCES, EPERM, ELOOP, ENAMETOOLONG,
    EEXIST, EROFS).

  Revision History:
    2026-10-18 COD  Authored path resolution walker.
    2026-10-18 COD  Per-walk mount table; identity-scoped privileges.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Leftmost failing component wins
    - Races degrade to "not found", never to a contradiction
    - Errno preserved across the whole walk
============================================================*/

use std::cell::OnceCell;
use std::fmt::Write;
use std::io::Read;
use std::os::raw::{c_char, c_int};

use bitflags::bitflags;

use crate::capability::{self, Capability};
use crate::fstrcmp::{fstrcasecmp, SUGGESTION_THRESHOLD};
use crate::identity::{self, Identity};
use crate::logger::{LogLevel, Logger};
use crate::mount::MountTable;
use crate::permission;
use crate::probe::{self, ErrnoGuard};
use crate::render::file_type::{caption_name_type, caption_name_type_st, file_type, file_type_st};
use crate::string_buffer::StringBuffer;

/// Linux gives up after this many symbolic links in one lookup.
pub const SYMLOOP_MAX: usize = 40;

/// Fallback when `_PC_NAME_MAX` is indeterminate.
const NAME_MAX: usize = 255;

/// Upper bound on components examined in one walk.
const MAX_STEPS: usize = 4096;

bitflags! {
    /// What the failing call intended to do with the final component.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Want: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const SEARCH = 1 << 2;
        const EXECUTE = 1 << 3;
        const CREATE = 1 << 4;
        const MODIFY_INODE = 1 << 5;
        const UNLINK = 1 << 6;
    }
}

/// Requirements placed on the last component of a pathname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalComponent {
    pub want: Want,
    pub must_exist: bool,
    pub must_not_exist: bool,
    /// When set, the final component must have type `st_mode`.
    pub must_be_a_st_mode: bool,
    /// Follow a trailing symbolic link.
    pub follow_symlink: bool,
    /// For execute checks, examine a `#!` interpreter too.
    pub follow_interpreter: bool,
    /// Expected (or to-be-created) file type, `S_IF*` bits.
    pub st_mode: u32,
    pub id: Identity,
    /// Overrides the `_PC_PATH_MAX` probe.
    pub path_max: Option<usize>,
}

impl Default for FinalComponent {
    fn default() -> Self {
        Self {
            want: Want::empty(),
            must_exist: true,
            must_not_exist: false,
            must_be_a_st_mode: false,
            follow_symlink: true,
            follow_interpreter: true,
            st_mode: libc::S_IFREG,
            id: Identity::effective(),
            path_max: None,
        }
    }
}

impl FinalComponent {
    pub fn wanting(want: Want) -> Self {
        Self {
            want,
            ..Self::default()
        }
    }

    /// Requirements implied by `open(2)` flags.
    pub fn from_open_flags(flags: c_int) -> Self {
        let mut fc = Self::default();
        match flags & libc::O_ACCMODE {
            libc::O_RDONLY => fc.want |= Want::READ,
            libc::O_WRONLY => fc.want |= Want::WRITE,
            _ => fc.want |= Want::READ | Want::WRITE,
        }
        if flags & libc::O_TRUNC != 0 {
            fc.want |= Want::WRITE;
        }
        if flags & libc::O_CREAT != 0 {
            fc.want |= Want::CREATE;
            fc.must_exist = false;
            if flags & libc::O_EXCL != 0 {
                fc.must_not_exist = true;
            }
        }
        if flags & libc::O_NOFOLLOW != 0 {
            fc.follow_symlink = false;
        }
        if flags & libc::O_DIRECTORY != 0 {
            fc.must_be_a_st_mode = true;
            fc.st_mode = libc::S_IFDIR;
        }
        fc
    }

    /// A directory that must exist and be searched (chdir, opendir).
    pub fn directory(want: Want) -> Self {
        Self {
            want,
            must_be_a_st_mode: true,
            st_mode: libc::S_IFDIR,
            ..Self::default()
        }
    }

    /// A new name of type `st_mode` to be created (mkdir, link, symlink).
    pub fn new_entry(st_mode: u32) -> Self {
        Self {
            want: Want::CREATE,
            must_exist: false,
            must_not_exist: true,
            st_mode,
            ..Self::default()
        }
    }

    fn modifies(&self) -> bool {
        self.want
            .intersects(Want::WRITE | Want::CREATE | Want::MODIFY_INODE | Want::UNLINK)
    }
}

/// Path lookup from the current directory.
///
/// Returns true when a specific cause was written to `sb`; false
/// means the walk found nothing wrong (or could not tell) and the
/// caller should fall back to a more generic explanation.
pub fn explain(sb: &mut StringBuffer, errnum: c_int, pathname: &[u8], caption: &str, fc: &FinalComponent) -> bool {
    let _guard = ErrnoGuard::new();
    let errnum = if errnum == libc::EMLINK { libc::ELOOP } else { errnum };
    PathResolution::new(sb, errnum, caption, fc).run(pathname)
}

/// Path lookup relative to `dirfd` (the `*at` family).
pub fn explain_at(
    sb: &mut StringBuffer,
    errnum: c_int,
    dirfd: c_int,
    pathname: &[u8],
    caption: &str,
    fc: &FinalComponent,
) -> bool {
    if dirfd == libc::AT_FDCWD || pathname.first() == Some(&b'/') {
        return explain(sb, errnum, pathname, caption, fc);
    }
    use std::os::unix::ffi::OsStrExt;
    match probe::fildes_to_path(dirfd) {
        Some(dir) => {
            let mut full = dir.as_os_str().as_bytes().to_vec();
            if !pathname.is_empty() {
                full.push(b'/');
                full.extend_from_slice(pathname);
            }
            explain(sb, errnum, &full, caption, fc)
        }
        None => false,
    }
}

/// Path lookup for a caller-supplied C string, probed first.
pub fn explain_ptr(
    sb: &mut StringBuffer,
    errnum: c_int,
    pathname: *const c_char,
    caption: &str,
    fc: &FinalComponent,
) -> bool {
    match probe::read_c_string(pathname, probe::STRING_PROBE_LIMIT) {
        Some(probed) if probed.terminated => explain(sb, errnum, &probed.bytes, caption, fc),
        _ => false,
    }
}

fn join(dir: &[u8], component: &[u8]) -> Vec<u8> {
    if dir == b"." {
        return component.to_vec();
    }
    let mut out = dir.to_vec();
    if out.last() != Some(&b'/') {
        out.push(b'/');
    }
    out.extend_from_slice(component);
    out
}

fn trim_leading_slashes(path: &[u8]) -> &[u8] {
    let start = path.iter().position(|&b| b != b'/').unwrap_or(path.len());
    &path[start..]
}

/// In-progress walk over one pathname.
struct PathResolution<'a> {
    sb: &'a mut StringBuffer,
    errnum: c_int,
    caption: &'a str,
    fc: &'a FinalComponent,
    symlinks_seen: Vec<Vec<u8>>,
    /// Loaded on first use; most walks never consult it.
    mounts: OnceCell<MountTable>,
}

impl<'a> PathResolution<'a> {
    fn new(sb: &'a mut StringBuffer, errnum: c_int, caption: &'a str, fc: &'a FinalComponent) -> Self {
        Self {
            sb,
            errnum,
            caption,
            fc,
            symlinks_seen: Vec::new(),
            mounts: OnceCell::new(),
        }
    }

    #[cfg(test)]
    fn with_mounts(mut self, table: MountTable) -> Self {
        self.mounts = OnceCell::from(table);
        self
    }

    fn debug(&self, message: String) {
        if self.sb.options().debug {
            Logger::diagnostic(LogLevel::Debug, "WALK", message);
        }
    }

    fn run(&mut self, initial: &[u8]) -> bool {
        if initial.is_empty() {
            let _ = write!(
                self.sb,
                "POSIX decrees that an empty {} must not be resolved successfully",
                self.caption
            );
            return true;
        }
        let initial: &[u8] = if initial.iter().all(|&b| b == b'/') { &b"/."[..] } else { initial };

        let path_max = self
            .fc
            .path_max
            .or_else(|| probe::pathconf(initial, libc::_PC_PATH_MAX).map(|v| v as usize))
            .filter(|&v| v > 0)
            .unwrap_or(libc::PATH_MAX as usize);
        if self.errnum == libc::ENAMETOOLONG && initial.len() > path_max {
            let _ = write!(self.sb, "{} exceeds the system maximum path length", self.caption);
            if self.sb.options().dialect_specific {
                let _ = write!(self.sb, " ({} > {})", initial.len(), path_max);
            }
            return true;
        }

        let mut pathname = Vec::with_capacity(initial.len() + 2);
        if initial[0] != b'/' {
            if let Some(cwd) = confusing_current_directory() {
                pathname.extend_from_slice(&cwd);
                pathname.push(b'/');
            }
        }
        pathname.extend_from_slice(initial);
        if pathname.last() == Some(&b'/') {
            pathname.push(b'.');
        }

        let mut lookup: Vec<u8> = if pathname[0] == b'/' { b"/".to_vec() } else { b".".to_vec() };
        let mut rest: Vec<u8> = trim_leading_slashes(&pathname).to_vec();

        for _ in 0..MAX_STEPS {
            let lookup_st = match probe::lstat(&lookup) {
                Ok(st) => st,
                Err(libc::ENOENT) => {
                    self.directory_does_not_exist(&lookup);
                    return true;
                }
                Err(err) => {
                    self.debug(format!("lstat {:?} failed: errno {err}", String::from_utf8_lossy(&lookup)));
                    return false;
                }
            };
            if lookup_st.st_mode & libc::S_IFMT != libc::S_IFDIR {
                self.not_a_directory(&lookup, &lookup_st);
                return true;
            }
            if !permission::have_search_permission(&lookup_st, &self.fc.id) {
                self.no_search_permission(&lookup, &lookup_st);
                return true;
            }
            let lookup_writable = permission::have_write_permission(&lookup_st, &self.fc.id);

            let end = rest.iter().position(|&b| b == b'/').unwrap_or(rest.len());
            let mut component = rest[..end].to_vec();
            let remainder = trim_leading_slashes(&rest[end..]).to_vec();
            let is_final = remainder.is_empty();

            let name_max = probe::pathconf(&lookup, libc::_PC_NAME_MAX)
                .filter(|&v| v > 0)
                .map_or(NAME_MAX, |v| v as usize);
            if component.len() > name_max {
                let silent_truncate = probe::pathconf(&lookup, libc::_PC_NO_TRUNC) == Some(0);
                if self.errnum == libc::ENAMETOOLONG && !silent_truncate {
                    self.name_too_long(&component, name_max);
                    return true;
                }
                component.truncate(name_max);
            }

            let intermediate = join(&lookup, &component);
            let st = match probe::lstat(&intermediate) {
                Ok(st) => st,
                Err(err) => {
                    return self.component_missing(err, is_final, &component, &lookup, &lookup_st, lookup_writable);
                }
            };

            let is_link = st.st_mode & libc::S_IFMT == libc::S_IFLNK;
            if is_link && (!is_final || self.fc.follow_symlink) {
                if self.symlinks_seen.iter().any(|seen| *seen == intermediate) {
                    let _ = write!(self.sb, "a symbolic link loop was encountered in {}, starting at ", self.caption);
                    self.sb.puts_quoted(&intermediate);
                    return true;
                }
                let mut target = match probe::readlink(&intermediate) {
                    Ok(target) => target,
                    Err(err) => {
                        self.debug(format!("readlink failed: errno {err}"));
                        return false;
                    }
                };
                if target.is_empty() {
                    target = b".".to_vec();
                }
                self.symlinks_seen.push(intermediate.clone());

                let resolved = if target[0] == b'/' { target.clone() } else { join(&lookup, &target) };
                if matches!(probe::lstat(&resolved), Err(libc::ENOENT)) {
                    self.dangling_symbolic_link(&component, &lookup, &lookup_st, &target);
                    return true;
                }
                if target[0] == b'/' {
                    lookup = b"/".to_vec();
                }
                if self.symlinks_seen.len() >= SYMLOOP_MAX {
                    let _ = write!(self.sb, "too many symbolic links were encountered in {}", self.caption);
                    if self.sb.options().dialect_specific {
                        let _ = write!(self.sb, " ({})", self.symlinks_seen.len());
                    }
                    return true;
                }
                let mut next = target;
                if !remainder.is_empty() {
                    if next.last() != Some(&b'/') {
                        next.push(b'/');
                    }
                    next.extend_from_slice(&remainder);
                }
                rest = trim_leading_slashes(&next).to_vec();
                if rest.is_empty() {
                    rest = b".".to_vec();
                }
                continue;
            }

            if !is_final {
                if st.st_mode & libc::S_IFMT != libc::S_IFDIR {
                    self.not_a_subdirectory(&component, st.st_mode, &lookup, lookup_st.st_mode);
                    return true;
                }
                lookup = intermediate;
                rest = remainder;
                continue;
            }

            return self.final_component(&component, &intermediate, &st, &lookup, &lookup_st, lookup_writable);
        }
        self.debug("walk abandoned after too many steps".to_string());
        false
    }

    fn component_missing(
        &mut self,
        err: c_int,
        is_final: bool,
        component: &[u8],
        lookup: &[u8],
        lookup_st: &libc::stat,
        lookup_writable: bool,
    ) -> bool {
        if !is_final {
            if err == libc::ENOENT {
                self.no_such_directory_entry(component, libc::S_IFDIR, lookup, lookup_st.st_mode);
                self.look_for_similar(lookup, component);
                return true;
            }
            self.debug(format!("lstat of component failed: errno {err}"));
            return false;
        }
        if err != libc::ENOENT {
            return false;
        }
        if self.fc.must_not_exist {
            if !lookup_writable {
                self.no_new_entry_permission(lookup, lookup_st, component);
                return true;
            }
            return self.read_only_creation(lookup, lookup_st, component);
        }
        if self.fc.must_exist {
            self.no_such_directory_entry(component, self.fc.st_mode, lookup, lookup_st.st_mode);
            self.look_for_similar(lookup, component);
            return true;
        }
        let permission_error = self.errnum == libc::EACCES || self.errnum == libc::EPERM;
        if permission_error && self.fc.want.contains(Want::CREATE) && !lookup_writable {
            self.no_new_entry_permission(lookup, lookup_st, component);
            self.look_for_similar(lookup, component);
            return true;
        }
        if self.fc.want.contains(Want::CREATE) {
            return self.read_only_creation(lookup, lookup_st, component);
        }
        false
    }

    fn read_only_creation(&mut self, lookup: &[u8], lookup_st: &libc::stat, component: &[u8]) -> bool {
        let mounts = self.mounts.get_or_init(MountTable::load);
        if self.errnum != libc::EROFS || !mounts.is_read_only_dev(lookup_st.st_dev) {
            return false;
        }
        caption_name_type(self.sb, Some(self.caption), lookup, Some(lookup_st.st_mode));
        self.sb.puts(" is on a read-only file system");
        mounts.mount_point_dev(self.sb, lookup_st.st_dev);
        self.sb.puts(", this is needed to create the directory entry for ");
        self.sb.puts_quoted(component);
        true
    }

    fn final_component(
        &mut self,
        component: &[u8],
        intermediate: &[u8],
        st: &libc::stat,
        lookup: &[u8],
        lookup_st: &libc::stat,
        lookup_writable: bool,
    ) -> bool {
        let fc = *self.fc;
        if fc.must_not_exist {
            self.sb.puts("there is already a ");
            caption_name_type(self.sb, None, component, Some(st.st_mode));
            self.sb.puts(" in the ");
            caption_name_type(self.sb, Some(self.caption), lookup, Some(lookup_st.st_mode));
            return true;
        }
        if fc.must_be_a_st_mode && st.st_mode & libc::S_IFMT != fc.st_mode {
            self.sb.puts("in the ");
            caption_name_type(self.sb, Some(self.caption), lookup, Some(lookup_st.st_mode));
            self.sb.puts(" there is a ");
            caption_name_type(self.sb, None, component, Some(st.st_mode));
            self.sb.puts(", but it should be a ");
            file_type(self.sb, fc.st_mode);
            return true;
        }

        let permission_error = self.errnum == libc::EACCES || self.errnum == libc::EPERM;
        if permission_error && fc.want.contains(Want::MODIFY_INODE) && !permission::have_inode_permission(st, &fc.id) {
            self.sb.puts("the process does not have inode modification permission to the ");
            caption_name_type_st(self.sb, None, component, Some(st));
            self.sb.puts(" in the ");
            caption_name_type_st(self.sb, Some(self.caption), lookup, Some(lookup_st));
            permission::explain_not_owner(self.sb, st, &fc.id);
            return true;
        }
        if permission_error && fc.want.contains(Want::UNLINK) && !lookup_writable {
            if lookup_st.st_mode & libc::S_ISVTX == 0 {
                self.no_remove_entry_permission(lookup, lookup_st.st_mode, component, st.st_mode);
                return true;
            }
            if fc.id.uid != st.st_uid && fc.id.uid != lookup_st.st_uid && !fc.id.holds(Capability::Fowner) {
                self.no_remove_entry_permission(lookup, lookup_st.st_mode, component, st.st_mode);
                self.sticky_bit(lookup_st, st);
                return true;
            }
        }

        if self.errnum == libc::EACCES {
            if fc.want.contains(Want::READ) && !permission::have_read_permission(st, &fc.id) {
                self.denied("read", component, st, lookup, lookup_st);
                permission::explain_read_permission(self.sb, st, &fc.id);
                return true;
            }
            if fc.want.contains(Want::WRITE) && !permission::have_write_permission(st, &fc.id) {
                self.denied("write", component, st, lookup, lookup_st);
                permission::explain_write_permission(self.sb, st, &fc.id);
                return true;
            }
            if fc.want.contains(Want::EXECUTE) && self.execute(component, intermediate, st, lookup, lookup_st) {
                return true;
            }
            if fc.want.contains(Want::SEARCH) && !permission::have_search_permission(st, &fc.id) {
                self.denied("search", component, st, lookup, lookup_st);
                permission::explain_search_permission(self.sb, st, &fc.id);
                return true;
            }
        }

        if self.errnum == libc::EROFS && fc.modifies() {
            let mounts = self.mounts.get_or_init(MountTable::load);
            if mounts.is_read_only_dev(st.st_dev) {
                caption_name_type_st(self.sb, Some(self.caption), intermediate, Some(st));
                self.sb.puts(" is on a read-only file system");
                mounts.mount_point_dev(self.sb, st.st_dev);
                return true;
            }
        }
        false
    }

    fn execute(
        &mut self,
        component: &[u8],
        intermediate: &[u8],
        st: &libc::stat,
        lookup: &[u8],
        lookup_st: &libc::stat,
    ) -> bool {
        let fc = *self.fc;
        if permission::have_execute_permission(st, &fc.id) {
            let privileged = fc.id.holds(Capability::DacOverride);
            let mounts = self.mounts.get_or_init(MountTable::load);
            if !privileged && mounts.path_has_option(intermediate, "noexec") {
                self.sb
                    .puts("the executable is on a file system that is mounted with the \"noexec\" option");
                mounts.mount_point(self.sb, intermediate);
                return true;
            }
            let setid = st.st_mode & (libc::S_ISUID | libc::S_ISGID) != 0;
            if !privileged && setid && mounts.path_has_option(intermediate, "nosuid") {
                self.sb
                    .puts("the executable is on a file system that is mounted with the \"nosuid\" option");
                mounts.mount_point(self.sb, intermediate);
                return true;
            }
            let Some(interpreter) = hash_bang_interpreter(intermediate) else {
                return false;
            };
            if fc.follow_interpreter {
                let nested = FinalComponent {
                    want: Want::EXECUTE,
                    follow_interpreter: false,
                    ..FinalComponent::default()
                };
                return PathResolution::new(self.sb, libc::EACCES, "#!", &nested).run(&interpreter);
            }
            self.sb.puts("too many levels of interpreters (");
            self.sb.puts_quoted(&interpreter);
            self.sb.putc(')');
            return true;
        }
        if st.st_mode & libc::S_IFMT != libc::S_IFREG {
            self.sb.puts("it is not possible to execute the ");
            caption_name_type(self.sb, Some(self.caption), component, Some(st.st_mode));
            self.sb.puts(", only regular files can be executed");
            return true;
        }
        self.denied("execute", component, st, lookup, lookup_st);
        permission::explain_execute_permission(self.sb, st, &fc.id);
        true
    }

    fn denied(&mut self, what: &str, component: &[u8], st: &libc::stat, lookup: &[u8], lookup_st: &libc::stat) {
        let _ = write!(self.sb, "the process does not have {what} permission to the ");
        caption_name_type_st(self.sb, None, component, Some(st));
        self.sb.puts(" in the ");
        caption_name_type_st(self.sb, Some(self.caption), lookup, Some(lookup_st));
    }

    fn directory_does_not_exist(&mut self, dir: &[u8]) {
        caption_name_type(self.sb, Some(self.caption), dir, Some(libc::S_IFDIR));
        self.sb.puts(" does not exist");
    }

    fn not_a_directory(&mut self, dir: &[u8], st: &libc::stat) {
        caption_name_type(self.sb, Some(self.caption), dir, None);
        self.sb.puts(" is a ");
        file_type_st(self.sb, st);
        self.sb.puts(", not a directory");
    }

    fn no_search_permission(&mut self, dir: &[u8], st: &libc::stat) {
        self.sb.puts("the process does not have search permission to the ");
        caption_name_type_st(self.sb, Some(self.caption), dir, Some(st));
        permission::explain_search_permission(self.sb, st, &self.fc.id);
    }

    fn no_such_directory_entry(&mut self, component: &[u8], component_mode: u32, dir: &[u8], dir_mode: u32) {
        self.sb.puts("there is no ");
        caption_name_type(self.sb, None, component, Some(component_mode));
        self.sb.puts(" in the ");
        caption_name_type(self.sb, Some(self.caption), dir, Some(dir_mode));
    }

    fn no_new_entry_permission(&mut self, dir: &[u8], dir_st: &libc::stat, component: &[u8]) {
        self.sb.puts("the process does not have write permission to the ");
        caption_name_type_st(self.sb, Some(self.caption), dir, Some(dir_st));
        self.sb.puts(", this is needed to create the directory entry for the ");
        caption_name_type(self.sb, None, component, Some(self.fc.st_mode));
        permission::explain_write_permission(self.sb, dir_st, &self.fc.id);
    }

    fn no_remove_entry_permission(&mut self, dir: &[u8], dir_mode: u32, component: &[u8], component_mode: u32) {
        self.sb.puts("the process does not have write permission to the ");
        caption_name_type(self.sb, Some(self.caption), dir, Some(dir_mode));
        self.sb.puts(", this is needed to remove the directory entry for the ");
        caption_name_type(self.sb, None, component, Some(component_mode));
    }

    fn sticky_bit(&mut self, dir_st: &libc::stat, file_st: &libc::stat) {
        let id = self.fc.id;
        self.sb.puts(", the directory has the sticky bit (S_ISVTX) set and the process's ");
        self.sb.puts(id.kind_of_uid());
        self.sb.putc(' ');
        identity::uid(self.sb, id.uid);
        self.sb.puts(" is neither the owner UID ");
        identity::uid(self.sb, file_st.st_uid);
        self.sb.puts(" of the ");
        file_type_st(self.sb, file_st);
        self.sb.puts(" to be removed, nor the owner UID ");
        identity::uid(self.sb, dir_st.st_uid);
        self.sb.puts(" of the directory containing it");
        capability::explain_missing(self.sb, Capability::Fowner);
    }

    fn dangling_symbolic_link(&mut self, component: &[u8], dir: &[u8], dir_st: &libc::stat, target: &[u8]) {
        self.sb.puts("the ");
        caption_name_type(self.sb, None, component, Some(libc::S_IFLNK));
        self.sb.puts(" in the ");
        caption_name_type(self.sb, Some(self.caption), dir, Some(dir_st.st_mode));
        self.sb.puts(" refers to ");
        self.sb.puts_quoted(target);
        self.sb.puts(" that does not exist");
    }

    fn name_too_long(&mut self, component: &[u8], name_max: usize) {
        self.sb.puts(self.caption);
        self.sb.putc(' ');
        self.sb.puts_quoted(component);
        self.sb.puts(" component is longer than the system limit");
        if self.sb.options().dialect_specific {
            let _ = write!(self.sb, " ({} > {})", component.len(), name_max);
        }
    }

    fn not_a_subdirectory(&mut self, component: &[u8], component_mode: u32, dir: &[u8], dir_mode: u32) {
        self.sb.puts("the ");
        caption_name_type(self.sb, None, component, Some(component_mode));
        self.sb.puts(" in the ");
        caption_name_type(self.sb, Some(self.caption), dir, Some(dir_mode));
        self.sb.puts(" is being used as a directory when it is not");
    }

    /// Footnote suggesting the most similar entry of `dir`.
    fn look_for_similar(&mut self, dir: &[u8], component: &[u8]) {
        let wanted = String::from_utf8_lossy(component);
        let mut best: Option<(Vec<u8>, f64)> = None;
        for entry in probe::directory_entries(dir) {
            let weight = fstrcasecmp(&wanted, &String::from_utf8_lossy(&entry));
            let threshold = best.as_ref().map_or(SUGGESTION_THRESHOLD, |(_, w)| *w);
            if weight > threshold {
                best = Some((entry, weight));
            }
        }
        let Some((name, _)) = best else {
            return;
        };
        let st = probe::lstat(&join(dir, &name)).ok();
        self.sb.footnote(|notes| {
            notes.puts("did you mean the ");
            caption_name_type_st(notes, None, &name, st.as_ref());
            notes.puts(" instead?");
        });
    }
}

/// The `#!` interpreter named by the first line of `path`, if any.
fn hash_bang_interpreter(path: &[u8]) -> Option<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    let _guard = ErrnoGuard::new();
    let mut file = std::fs::File::open(std::ffi::OsStr::from_bytes(path)).ok()?;
    let mut block = [0u8; 511];
    let n = file.read(&mut block).ok()?;
    let block = &block[..n];
    if n < 4 || !block.starts_with(b"#!") {
        return None;
    }
    let line = &block[2..];
    let start = line.iter().position(|&b| b != b' ' && b != b'\t')?;
    let line = &line[start..];
    let end = line.iter().position(|b| b.is_ascii_whitespace()).unwrap_or(line.len());
    Some(line[..end].to_vec())
}

/// The current directory, when the parent process's differs and a
/// relative pathname would otherwise be ambiguous to the reader.
fn confusing_current_directory() -> Option<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    let _guard = ErrnoGuard::new();
    // SAFETY: getppid has no preconditions.
    let ppid = unsafe { libc::getppid() };
    let parent = std::fs::read_link(format!("/proc/{ppid}/cwd")).ok();
    let cwd = probe::current_directory()?;
    match parent {
        Some(parent) if parent.as_os_str().as_bytes() == cwd.as_slice() => None,
        _ => Some(cwd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use proptest::prelude::*;
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::fs::{symlink, PermissionsExt};
    use std::path::Path;

    fn walk(errnum: c_int, path: &[u8], fc: &FinalComponent) -> (bool, String, String) {
        let mut sb = StringBuffer::with_footnotes(4096, Options::default());
        let found = explain(&mut sb, errnum, path, "pathname", fc);
        let notes = sb.footnotes().map(|n| n.as_str().to_string()).unwrap_or_default();
        (found, sb.as_str().to_string(), notes)
    }

    #[test]
    fn missing_top_level_directory() {
        let (found, text, _) = walk(libc::ENOENT, b"/no/such/file", &FinalComponent::wanting(Want::READ));
        assert!(found);
        assert_eq!(text, "there is no \"no\" directory in the pathname \"/\" directory");
    }

    #[test]
    fn missing_final_component_suggests_similar() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.txt"), b"x").unwrap();
        let path = dir.path().join("reprot.txt");
        let (found, text, notes) = walk(libc::ENOENT, path.as_os_str().as_bytes(), &FinalComponent::wanting(Want::READ));
        assert!(found);
        assert!(text.starts_with("there is no \"reprot.txt\" regular file in the pathname"), "{text}");
        assert_eq!(notes, "; did you mean the \"report.txt\" regular file instead?");
    }

    #[test]
    fn file_used_as_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plain"), b"x").unwrap();
        let path = dir.path().join("plain/child");
        let (found, text, _) = walk(libc::ENOTDIR, path.as_os_str().as_bytes(), &FinalComponent::wanting(Want::READ));
        assert!(found);
        assert!(text.starts_with("the \"plain\" regular file in the pathname"), "{text}");
        assert!(text.ends_with("is being used as a directory when it is not"), "{text}");
    }

    #[test]
    fn existing_entry_for_creation() {
        let (found, text, _) = walk(libc::EEXIST, b"/tmp", &FinalComponent::new_entry(libc::S_IFDIR));
        assert!(found);
        assert_eq!(text, "there is already a \"tmp\" directory in the pathname \"/\" directory");
    }

    #[test]
    fn symbolic_link_loop() {
        let dir = tempfile::tempdir().unwrap();
        symlink("b", dir.path().join("a")).unwrap();
        symlink("a", dir.path().join("b")).unwrap();
        let path = dir.path().join("a");
        let (found, text, _) = walk(libc::ELOOP, path.as_os_str().as_bytes(), &FinalComponent::wanting(Want::READ));
        assert!(found);
        assert!(text.starts_with("a symbolic link loop was encountered in pathname, starting at"), "{text}");
    }

    #[test]
    fn dangling_link() {
        let dir = tempfile::tempdir().unwrap();
        symlink("nowhere", dir.path().join("link")).unwrap();
        let path = dir.path().join("link");
        let (found, text, _) = walk(libc::ENOENT, path.as_os_str().as_bytes(), &FinalComponent::wanting(Want::READ));
        assert!(found);
        assert!(text.contains("refers to \"nowhere\" that does not exist"), "{text}");
    }

    #[test]
    fn overlong_component() {
        let long = "x".repeat(300);
        let path = format!("/tmp/{long}");
        let (found, text, _) = walk(libc::ENAMETOOLONG, path.as_bytes(), &FinalComponent::wanting(Want::READ));
        assert!(found);
        assert!(text.starts_with("pathname \"xxx"), "{text}");
        assert!(text.ends_with("component is longer than the system limit (300 > 255)"), "{text}");
    }

    #[test]
    fn empty_pathname() {
        let (found, text, _) = walk(libc::ENOENT, b"", &FinalComponent::default());
        assert!(found);
        assert_eq!(text, "POSIX decrees that an empty pathname must not be resolved successfully");
    }

    #[test]
    fn nothing_wrong_means_not_found() {
        let (found, text, _) = walk(libc::EIO, b"/", &FinalComponent::wanting(Want::READ));
        assert!(!found);
        assert!(text.is_empty());
    }

    #[test]
    fn open_flags_map_to_requirements() {
        let fc = FinalComponent::from_open_flags(libc::O_WRONLY | libc::O_CREAT | libc::O_EXCL);
        assert!(fc.want.contains(Want::WRITE | Want::CREATE));
        assert!(!fc.must_exist);
        assert!(fc.must_not_exist);
        let fc = FinalComponent::from_open_flags(libc::O_RDONLY | libc::O_DIRECTORY);
        assert!(fc.must_be_a_st_mode);
        assert_eq!(fc.st_mode, libc::S_IFDIR);
    }

    /// Someone else entirely, holding no capabilities whatever the
    /// test process runs as.
    fn stranger() -> Identity {
        Identity::new(65534, 65534).with_privileges(0)
    }

    fn open_up(dir: &Path) {
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn walk_with_mounts(errnum: c_int, path: &[u8], fc: &FinalComponent, mounts: MountTable) -> (bool, String) {
        let mut sb = StringBuffer::new(4096, Options::default());
        let found = PathResolution::new(&mut sb, errnum, "pathname", fc).with_mounts(mounts).run(path);
        (found, sb.as_str().to_string())
    }

    fn read_only_table(dir: &Path) -> MountTable {
        let mut raw = b"rootfs / rootfs rw 0 0\nscratch ".to_vec();
        raw.extend_from_slice(dir.as_os_str().as_bytes());
        raw.extend_from_slice(b" tmpfs ro,relatime 0 0\n");
        MountTable::from_bytes(&raw)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Node {
        Dir,
        File,
        Missing,
    }

    fn node() -> impl Strategy<Value = Node> {
        prop_oneof![3 => Just(Node::Dir), 1 => Just(Node::File), 1 => Just(Node::Missing)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn blames_the_leftmost_failing_component(nodes in prop::collection::vec(node(), 1..6)) {
            let root = tempfile::tempdir().unwrap();
            let mut path = root.path().to_path_buf();
            let mut first_failure = None;
            for (i, kind) in nodes.iter().enumerate() {
                path.push(format!("c{i}"));
                if first_failure.is_some() {
                    continue;
                }
                match kind {
                    Node::Dir => std::fs::create_dir(&path).unwrap(),
                    Node::File => {
                        std::fs::write(&path, b"x").unwrap();
                        first_failure = Some(i);
                    }
                    Node::Missing => first_failure = Some(i),
                }
            }
            let errnum = std::fs::symlink_metadata(&path)
                .err()
                .and_then(|err| err.raw_os_error())
                .unwrap_or(libc::ENOENT);
            let (found, text, _) = walk(errnum, path.as_os_str().as_bytes(), &FinalComponent::wanting(Want::READ));

            let last = nodes.len() - 1;
            match first_failure {
                None => prop_assert!(!found, "{}", text),
                Some(i) if i == last && nodes[i] == Node::File => prop_assert!(!found, "{}", text),
                Some(i) => {
                    prop_assert!(found);
                    let blamed = format!("\"c{i}\"");
                    prop_assert!(text.contains(&blamed), "{}", text);
                    let later = format!("\"c{}\"", i + 1);
                    prop_assert!(!text.contains(&later), "{}", text);
                    match (nodes[i], i == last) {
                        (Node::File, _) => {
                            prop_assert!(text.ends_with("is being used as a directory when it is not"), "{}", text);
                        }
                        (_, false) => {
                            let expected = format!("there is no {blamed} directory in the pathname");
                            prop_assert!(text.starts_with(&expected), "{}", text);
                        }
                        (_, true) => {
                            let expected = format!("there is no {blamed} regular file in the pathname");
                            prop_assert!(text.starts_with(&expected), "{}", text);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn missing_directory_is_blamed_before_anything_under_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing/also_missing");
        let (found, text, _) = walk(libc::ENOENT, path.as_os_str().as_bytes(), &FinalComponent::wanting(Want::READ));
        assert!(found);
        assert!(text.starts_with("there is no \"missing\" directory in the pathname"), "{text}");
        assert!(!text.contains("also_missing"), "{text}");
    }

    #[test]
    fn search_denied_to_another_user() {
        let dir = tempfile::tempdir().unwrap();
        open_up(dir.path());
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o700)).unwrap();
        let path = locked.join("inner");

        let fc = FinalComponent {
            id: stranger(),
            ..FinalComponent::wanting(Want::READ)
        };
        let (found, text, _) = walk(libc::EACCES, path.as_os_str().as_bytes(), &fc);
        assert!(found);
        let expected = format!(
            "the process does not have search permission to the pathname \"{}\" directory",
            locked.display()
        );
        assert!(text.starts_with(&expected), "{text}");
        assert!(text.ends_with("does not have the CAP_DAC_READ_SEARCH capability"), "{text}");

        // The same stranger holding CAP_DAC_READ_SEARCH gets past the lock.
        let fc = FinalComponent {
            id: stranger().with_privileges(1 << Capability::DacReadSearch.bit()),
            ..fc
        };
        let (found, text, _) = walk(libc::ENOENT, path.as_os_str().as_bytes(), &fc);
        assert!(found);
        assert!(text.starts_with("there is no \"inner\" regular file"), "{text}");
    }

    #[test]
    fn creation_denied_to_another_user() {
        let dir = tempfile::tempdir().unwrap();
        open_up(dir.path());
        let path = dir.path().join("new");
        let fc = FinalComponent {
            id: stranger(),
            ..FinalComponent::new_entry(libc::S_IFDIR)
        };
        let (found, text, _) = walk(libc::EACCES, path.as_os_str().as_bytes(), &fc);
        assert!(found);
        assert!(text.starts_with("the process does not have write permission to the pathname"), "{text}");
        assert!(text.contains("this is needed to create the directory entry for the \"new\" directory"), "{text}");
        assert!(text.ends_with("does not have the CAP_DAC_OVERRIDE capability"), "{text}");
    }

    #[test]
    fn creation_on_a_read_only_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new");
        let (found, text) = walk_with_mounts(
            libc::EROFS,
            path.as_os_str().as_bytes(),
            &FinalComponent::new_entry(libc::S_IFDIR),
            read_only_table(dir.path()),
        );
        assert!(found);
        let shown = dir.path().display();
        let expected = format!("pathname \"{shown}\" directory is on a read-only file system (\"{shown}\"");
        assert!(text.starts_with(&expected), "{text}");
        assert!(text.ends_with("this is needed to create the directory entry for \"new\""), "{text}");
    }

    #[test]
    fn writing_an_existing_file_on_a_read_only_file_system() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        std::fs::write(&path, b"x").unwrap();
        let fc = FinalComponent::wanting(Want::WRITE);

        let table = read_only_table(dir.path());
        let (found, text) = walk_with_mounts(libc::EROFS, path.as_os_str().as_bytes(), &fc, table);
        assert!(found);
        let expected = format!("pathname \"{}\" regular file is on a read-only file system", path.display());
        assert!(text.starts_with(&expected), "{text}");

        // A writable mount gives the walker nothing to say.
        let writable = MountTable::from_bytes(b"rootfs / rootfs rw 0 0\n");
        let (found, text) = walk_with_mounts(libc::EROFS, path.as_os_str().as_bytes(), &fc, writable);
        assert!(!found, "{text}");
    }

    #[test]
    fn errno_is_untouched() {
        probe::set_errno(libc::ENOSPC);
        let _ = walk(libc::ENOENT, b"/no/such/file", &FinalComponent::default());
        assert_eq!(probe::errno(), libc::ENOSPC);
    }
}
