/*============================================================
  Synavera Project: Explain
  Module: explain_core::permission
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Decide whether an identity holds read, write, execute,
    search or inode-modify permission on a file, and explain
    which permission triplet made the decision.

  Security / Safety Notes:
    Decisions are computed from stat data and the capability
    probe; nothing is opened or modified.

  Dependencies:
    identity, capability, render::mode, render::file_type.

  Operational Scope:
    Used by the path-resolution walker and the EACCES/EPERM
    analysers.

  Revision History:
    2026-10-18 COD  Authored permission decisions.
    2026-10-18 COD  Capability overrides come from the identity.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Owner, then group, then others; the first match decides
    - Capability exemptions mirror the kernel's DAC rules
============================================================*/

use crate::capability::{self, Capability};
use crate::identity::{self, Identity};
use crate::render::file_type::file_type_st;
use crate::render::mode::rwx;
use crate::string_buffer::StringBuffer;

const READ_BITS: u32 = 0o444;
const WRITE_BITS: u32 = 0o222;
const EXECUTE_BITS: u32 = 0o111;

fn is_dir(st: &libc::stat) -> bool {
    st.st_mode & libc::S_IFMT == libc::S_IFDIR
}

fn is_reg(st: &libc::stat) -> bool {
    st.st_mode & libc::S_IFMT == libc::S_IFREG
}

fn triplet_allows(st: &libc::stat, id: &Identity, wanted: u32) -> bool {
    let mode = st.st_mode;
    if st.st_uid == id.uid {
        return mode & wanted & libc::S_IRWXU != 0;
    }
    if id.in_group(st.st_gid) {
        return mode & wanted & libc::S_IRWXG != 0;
    }
    mode & wanted & libc::S_IRWXO != 0
}

pub fn have_read_permission(st: &libc::stat, id: &Identity) -> bool {
    id.holds(Capability::DacReadSearch) || triplet_allows(st, id, READ_BITS)
}

pub fn have_write_permission(st: &libc::stat, id: &Identity) -> bool {
    id.holds(Capability::DacOverride) || triplet_allows(st, id, WRITE_BITS)
}

/// Only regular files can be executed; the override capability only
/// helps when at least one execute bit is set.
pub fn have_execute_permission(st: &libc::stat, id: &Identity) -> bool {
    if !is_reg(st) {
        return false;
    }
    if id.holds(Capability::DacOverride) && st.st_mode & EXECUTE_BITS != 0 {
        return true;
    }
    triplet_allows(st, id, EXECUTE_BITS)
}

pub fn have_search_permission(st: &libc::stat, id: &Identity) -> bool {
    if !is_dir(st) {
        return false;
    }
    id.holds(Capability::DacReadSearch) || triplet_allows(st, id, EXECUTE_BITS)
}

/// Permission to change the inode (chmod, utime, ...): ownership or CAP_FOWNER.
pub fn have_inode_permission(st: &libc::stat, id: &Identity) -> bool {
    id.holds(Capability::Fowner) || st.st_uid == id.uid
}

fn quoted_triplet(mode: u32, shift: u32) -> String {
    format!("\"{}\"", rwx(mode, shift))
}

fn owner_mode_used(sb: &mut StringBuffer, st: &libc::stat, id: &Identity) {
    sb.puts(", the process ");
    sb.puts(id.kind_of_uid());
    sb.putc(' ');
    identity::uid(sb, id.uid);
    sb.puts(" matches the ");
    file_type_st(sb, st);
    sb.puts(" owner UID ");
    identity::uid(sb, st.st_uid);
    sb.puts(" and the owner permission mode is ");
    sb.puts(&quoted_triplet(st.st_mode, 6));
}

fn owner_mode_ignored(sb: &mut StringBuffer, st: &libc::stat, id: &Identity) {
    sb.puts(", the process ");
    sb.puts(id.kind_of_uid());
    sb.putc(' ');
    identity::uid(sb, id.uid);
    sb.puts(" does not match the ");
    file_type_st(sb, st);
    sb.puts(" owner UID ");
    identity::uid(sb, st.st_uid);
    sb.puts(" so the owner permission mode ");
    sb.puts(&quoted_triplet(st.st_mode, 6));
    sb.puts(" is ignored");
}

fn group_mode_used(sb: &mut StringBuffer, st: &libc::stat, id: &Identity) {
    sb.puts(", the process ");
    sb.puts(id.kind_of_gid());
    sb.putc(' ');
    identity::gid(sb, id.gid);
    sb.puts(" matches the ");
    file_type_st(sb, st);
    sb.puts(" group GID ");
    identity::gid(sb, st.st_gid);
    sb.puts(" and the group permission mode is ");
    sb.puts(&quoted_triplet(st.st_mode, 3));
}

fn group_mode_ignored(sb: &mut StringBuffer, st: &libc::stat) {
    sb.puts(", the group permission mode ");
    sb.puts(&quoted_triplet(st.st_mode, 3));
    sb.puts(" is ignored");
}

fn others_mode_used(sb: &mut StringBuffer, st: &libc::stat) {
    sb.puts(", the others permission mode is ");
    sb.puts(&quoted_triplet(st.st_mode, 0));
}

fn others_mode_ignored(sb: &mut StringBuffer, st: &libc::stat) {
    sb.puts(", the others permission mode ");
    sb.puts(&quoted_triplet(st.st_mode, 0));
    sb.puts(" is ignored");
}

/// Write which triplet decided the outcome. Portable output (no
/// dialect-specific) omits the identity detail entirely.
fn explain_triplet(sb: &mut StringBuffer, st: &libc::stat, id: &Identity, wanted: u32) -> bool {
    let mode = st.st_mode;
    if !sb.options().dialect_specific {
        return triplet_allows(st, id, wanted);
    }
    if st.st_uid == id.uid {
        owner_mode_used(sb, st, id);
        if mode & wanted & libc::S_IRWXG != 0 && id.in_group(st.st_gid) {
            group_mode_ignored(sb, st);
        }
        if mode & wanted & libc::S_IRWXO != 0 {
            others_mode_ignored(sb, st);
        }
        return mode & wanted & libc::S_IRWXU != 0;
    }
    if id.in_group(st.st_gid) {
        if mode & wanted & libc::S_IRWXU != 0 {
            owner_mode_ignored(sb, st, id);
        }
        group_mode_used(sb, st, id);
        if mode & wanted & libc::S_IRWXO != 0 {
            others_mode_ignored(sb, st);
        }
        return mode & wanted & libc::S_IRWXG != 0;
    }
    if mode & wanted & libc::S_IRWXU != 0 {
        owner_mode_ignored(sb, st, id);
    }
    if mode & wanted & libc::S_IRWXG != 0 {
        group_mode_ignored(sb, st);
    }
    others_mode_used(sb, st);
    mode & wanted & libc::S_IRWXO != 0
}

pub fn explain_read_permission(sb: &mut StringBuffer, st: &libc::stat, id: &Identity) -> bool {
    if id.holds(Capability::DacReadSearch) {
        return true;
    }
    let allowed = explain_triplet(sb, st, id, READ_BITS);
    if !allowed {
        capability::explain_missing(sb, Capability::DacReadSearch);
    }
    allowed
}

pub fn explain_write_permission(sb: &mut StringBuffer, st: &libc::stat, id: &Identity) -> bool {
    if id.holds(Capability::DacOverride) {
        return true;
    }
    let allowed = explain_triplet(sb, st, id, WRITE_BITS);
    if !allowed {
        capability::explain_missing(sb, Capability::DacOverride);
    }
    allowed
}

pub fn explain_execute_permission(sb: &mut StringBuffer, st: &libc::stat, id: &Identity) -> bool {
    if !is_reg(st) {
        return false;
    }
    if id.holds(Capability::DacOverride) && st.st_mode & EXECUTE_BITS != 0 {
        return true;
    }
    let allowed = explain_triplet(sb, st, id, EXECUTE_BITS);
    if !allowed {
        capability::explain_missing(sb, Capability::DacOverride);
    }
    allowed
}

pub fn explain_search_permission(sb: &mut StringBuffer, st: &libc::stat, id: &Identity) -> bool {
    if !is_dir(st) {
        return false;
    }
    if id.holds(Capability::DacReadSearch) {
        return true;
    }
    let allowed = explain_triplet(sb, st, id, EXECUTE_BITS);
    if !allowed {
        capability::explain_missing(sb, Capability::DacReadSearch);
    }
    allowed
}

/// `, the process effective UID 1000 "alice" does not match the
/// regular file owner UID 0 "root"` plus the CAP_FOWNER clause.
pub fn explain_not_owner(sb: &mut StringBuffer, st: &libc::stat, id: &Identity) {
    if sb.options().dialect_specific {
        sb.puts(", the process ");
        sb.puts(id.kind_of_uid());
        sb.putc(' ');
        identity::uid(sb, id.uid);
        sb.puts(" does not match the ");
        file_type_st(sb, st);
        sb.puts(" owner UID ");
        identity::uid(sb, st.st_uid);
    }
    capability::explain_missing(sb, Capability::Fowner);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::options::Options;

    pub(crate) fn fake_stat(mode: u32, uid: libc::uid_t, gid: libc::gid_t) -> libc::stat {
        // SAFETY: stat is plain data; all-zero is a valid value.
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        st.st_mode = mode;
        st.st_uid = uid;
        st.st_gid = gid;
        st
    }

    fn stranger() -> Identity {
        Identity::new(3_999_999_001, 3_999_999_001).with_privileges(0)
    }

    #[test]
    fn triplet_selection_is_first_match() {
        let id = stranger();
        // Owner has nothing, others have everything: the owner triplet decides.
        let st = fake_stat(libc::S_IFREG | 0o007, id.uid, 0);
        assert!(!triplet_allows(&st, &id, READ_BITS));
        let st = fake_stat(libc::S_IFREG | 0o004, 0, 0);
        assert!(triplet_allows(&st, &id, READ_BITS));
    }

    #[test]
    fn execute_requires_regular_file() {
        let id = stranger();
        let dir = fake_stat(libc::S_IFDIR | 0o777, id.uid, id.gid);
        assert!(!have_execute_permission(&dir, &id));
        let file = fake_stat(libc::S_IFREG | 0o644, 0, 0);
        assert!(!have_search_permission(&file, &id));
    }

    #[test]
    fn others_triplet_is_explained() {
        let id = stranger();
        let st = fake_stat(libc::S_IFDIR | 0o750, 0, 0);
        let mut sb = StringBuffer::new(512, Options::default());
        assert!(!explain_search_permission(&mut sb, &st, &id));
        let text = sb.as_str();
        assert!(text.contains("owner permission mode \"rwx\" is ignored"), "{text}");
        assert!(text.contains("group permission mode \"r-x\" is ignored"), "{text}");
        assert!(text.contains("the others permission mode is \"---\""), "{text}");
        assert!(text.ends_with("does not have the CAP_DAC_READ_SEARCH capability"), "{text}");
    }

    #[test]
    fn portable_wording_omits_identity() {
        let options = Options {
            dialect_specific: false,
            ..Options::default()
        };
        let id = stranger();
        let st = fake_stat(libc::S_IFREG | 0o444, 0, 0);
        let mut sb = StringBuffer::new(256, options);
        assert!(!explain_write_permission(&mut sb, &st, &id));
        assert_eq!(sb.as_str(), ", and the process is not privileged");
    }
}
