/*============================================================
  Synavera Project: Explain
  Module: explain_core::identity
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Describe the identity a permission check runs under,
    including the capabilities it may rely on, and render user
    and group identifiers with their names.

  Security / Safety Notes:
    Uses the reentrant getpwuid_r/getgrgid_r lookups with
    caller-owned buffers.

  Dependencies:
    libc for identity and passwd/group database access.

  Operational Scope:
    Used by permission explanations and setuid/chown
    explainers.

  Revision History:
    2026-10-18 COD  Authored identity helpers.
    2026-10-18 COD  Identities carry their own privilege source.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Reentrant lookups only
    - Names are decoration; numbers always shown
============================================================*/

use std::ffi::CStr;
use std::fmt::Write;
use std::mem::MaybeUninit;
use std::os::raw::c_char;

use crate::capability::{self, Capability};
use crate::probe::ErrnoGuard;
use crate::string_buffer::StringBuffer;

/// Where an identity's capabilities come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privileges {
    /// The effective set of the calling process.
    Process,
    /// A fixed capability mask, one bit per `Capability`.
    Mask(u64),
}

/// The uid/gid pair a permission check is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub uid: libc::uid_t,
    pub gid: libc::gid_t,
    pub privileges: Privileges,
}

impl Identity {
    /// Effective identity of the calling process.
    pub fn effective() -> Self {
        // SAFETY: geteuid/getegid have no preconditions.
        let (uid, gid) = unsafe { (libc::geteuid(), libc::getegid()) };
        Self::new(uid, gid)
    }

    /// Real identity of the calling process (used by access(2)).
    pub fn real() -> Self {
        // SAFETY: getuid/getgid have no preconditions.
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Self::new(uid, gid)
    }

    /// An identity whose capabilities are those of the calling process.
    pub fn new(uid: libc::uid_t, gid: libc::gid_t) -> Self {
        Self {
            uid,
            gid,
            privileges: Privileges::Process,
        }
    }

    /// Same ids, evaluated against a fixed capability mask instead of
    /// the process's effective set.
    pub fn with_privileges(self, mask: u64) -> Self {
        Self {
            privileges: Privileges::Mask(mask),
            ..self
        }
    }

    /// Whether a permission check under this identity may rely on `cap`.
    pub fn holds(&self, cap: Capability) -> bool {
        match self.privileges {
            Privileges::Process => capability::has(cap),
            Privileges::Mask(mask) => mask & (1u64 << cap.bit()) != 0,
        }
    }

    /// "effective UID" or "real UID" depending on which this is.
    pub fn kind_of_uid(&self) -> &'static str {
        // SAFETY: geteuid has no preconditions.
        if self.uid != unsafe { libc::geteuid() } {
            "real UID"
        } else {
            "effective UID"
        }
    }

    /// "effective GID" or "real GID".
    pub fn kind_of_gid(&self) -> &'static str {
        // SAFETY: getegid has no preconditions.
        if self.gid != unsafe { libc::getegid() } {
            "real GID"
        } else {
            "effective GID"
        }
    }

    /// Whether `gid` is this identity's group or a supplementary group.
    pub fn in_group(&self, gid: libc::gid_t) -> bool {
        gid == self.gid || (self.is_calling_process() && supplementary_groups().contains(&gid))
    }

    /// Supplementary groups only describe the calling process.
    fn is_calling_process(&self) -> bool {
        // SAFETY: getuid/geteuid have no preconditions.
        let (real, effective) = unsafe { (libc::getuid(), libc::geteuid()) };
        self.uid == real || self.uid == effective
    }

    /// Whether this identity is the superuser.
    pub fn is_root(&self) -> bool {
        self.uid == 0
    }
}

/// Supplementary group list of the calling process.
pub fn supplementary_groups() -> Vec<libc::gid_t> {
    let _guard = ErrnoGuard::new();
    // SAFETY: a zero-length query only returns the count.
    let count = unsafe { libc::getgroups(0, std::ptr::null_mut()) };
    if count <= 0 {
        return Vec::new();
    }
    let mut groups = vec![0 as libc::gid_t; count as usize];
    // SAFETY: groups has room for `count` entries.
    let got = unsafe { libc::getgroups(count, groups.as_mut_ptr()) };
    if got < 0 {
        return Vec::new();
    }
    groups.truncate(got as usize);
    groups
}

/// Login name for a uid.
pub fn user_name(uid: libc::uid_t) -> Option<String> {
    let _guard = ErrnoGuard::new();
    let mut buf = vec![0 as c_char; 4096];
    let mut pwd = MaybeUninit::<libc::passwd>::uninit();
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    // SAFETY: all out-parameters point at owned storage of the stated size.
    let rc = unsafe { libc::getpwuid_r(uid, pwd.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result) };
    if rc != 0 || result.is_null() {
        return None;
    }
    // SAFETY: on success pw_name points into buf and is NUL-terminated.
    let name = unsafe { CStr::from_ptr((*result).pw_name) };
    Some(name.to_string_lossy().into_owned())
}

/// Group name for a gid.
pub fn group_name(gid: libc::gid_t) -> Option<String> {
    let _guard = ErrnoGuard::new();
    let mut buf = vec![0 as c_char; 4096];
    let mut grp = MaybeUninit::<libc::group>::uninit();
    let mut result: *mut libc::group = std::ptr::null_mut();
    // SAFETY: all out-parameters point at owned storage of the stated size.
    let rc = unsafe { libc::getgrgid_r(gid, grp.as_mut_ptr(), buf.as_mut_ptr(), buf.len(), &mut result) };
    if rc != 0 || result.is_null() {
        return None;
    }
    // SAFETY: on success gr_name points into buf and is NUL-terminated.
    let name = unsafe { CStr::from_ptr((*result).gr_name) };
    Some(name.to_string_lossy().into_owned())
}

/// `1000 "alice"`, or the bare number for unknown users.
pub fn uid(sb: &mut StringBuffer, uid: libc::uid_t) {
    let _ = write!(sb, "{uid}");
    if let Some(name) = user_name(uid) {
        sb.putc(' ');
        sb.puts_quoted(name.as_bytes());
    }
}

/// `100 "users"`, or the bare number for unknown groups.
pub fn gid(sb: &mut StringBuffer, gid: libc::gid_t) {
    let _ = write!(sb, "{gid}");
    if let Some(name) = group_name(gid) {
        sb.putc(' ');
        sb.puts_quoted(name.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn root_has_a_name() {
        assert_eq!(user_name(0).as_deref(), Some("root"));
        let mut sb = StringBuffer::new(64, Options::default());
        uid(&mut sb, 0);
        assert_eq!(sb.as_str(), "0 \"root\"");
    }

    #[test]
    fn own_group_is_a_member() {
        let me = Identity::effective();
        assert!(me.in_group(me.gid));
        assert_eq!(me.kind_of_uid(), "effective UID");
    }

    #[test]
    fn fixed_privileges_ignore_the_process() {
        let nobody = Identity::new(65534, 65534).with_privileges(0);
        assert!(!nobody.holds(Capability::DacOverride));
        let owner = nobody.with_privileges(1 << Capability::Fowner.bit());
        assert!(owner.holds(Capability::Fowner));
        assert!(!owner.holds(Capability::DacReadSearch));
        assert_eq!(Identity::effective().privileges, Privileges::Process);
    }

    #[test]
    fn unknown_ids_are_bare_numbers() {
        let mut sb = StringBuffer::new(64, Options::default());
        gid(&mut sb, 3_999_999_999);
        assert_eq!(sb.as_str(), "3999999999");
    }
}
