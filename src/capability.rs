/*============================================================
  Synavera Project: Explain
  Module: explain_core::capability
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Query the effective capability set of the process and word
    the "does not have the CAP_X capability" clauses.

  Security / Safety Notes:
    Reads /proc/self/status only. Capability state is never
    modified.

  Dependencies:
    strum for capability names.

  Operational Scope:
    Consulted by permission checks and privilege-related
    explanations (EPERM, EACCES).

  Revision History:
    2026-10-18 COD  Authored capability probes.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Read-only introspection
    - Root without /proc treated as fully privileged
============================================================*/

use strum::{Display, EnumString, IntoStaticStr};

use crate::string_buffer::StringBuffer;

/// Linux capabilities referenced by explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum Capability {
    #[strum(serialize = "CAP_CHOWN")]
    Chown = 0,
    #[strum(serialize = "CAP_DAC_OVERRIDE")]
    DacOverride = 1,
    #[strum(serialize = "CAP_DAC_READ_SEARCH")]
    DacReadSearch = 2,
    #[strum(serialize = "CAP_FOWNER")]
    Fowner = 3,
    #[strum(serialize = "CAP_FSETID")]
    Fsetid = 4,
    #[strum(serialize = "CAP_KILL")]
    Kill = 5,
    #[strum(serialize = "CAP_SETGID")]
    Setgid = 6,
    #[strum(serialize = "CAP_SETUID")]
    Setuid = 7,
    #[strum(serialize = "CAP_SETPCAP")]
    Setpcap = 8,
    #[strum(serialize = "CAP_LINUX_IMMUTABLE")]
    LinuxImmutable = 9,
    #[strum(serialize = "CAP_NET_BIND_SERVICE")]
    NetBindService = 10,
    #[strum(serialize = "CAP_NET_BROADCAST")]
    NetBroadcast = 11,
    #[strum(serialize = "CAP_NET_ADMIN")]
    NetAdmin = 12,
    #[strum(serialize = "CAP_NET_RAW")]
    NetRaw = 13,
    #[strum(serialize = "CAP_IPC_LOCK")]
    IpcLock = 14,
    #[strum(serialize = "CAP_IPC_OWNER")]
    IpcOwner = 15,
    #[strum(serialize = "CAP_SYS_MODULE")]
    SysModule = 16,
    #[strum(serialize = "CAP_SYS_RAWIO")]
    SysRawio = 17,
    #[strum(serialize = "CAP_SYS_CHROOT")]
    SysChroot = 18,
    #[strum(serialize = "CAP_SYS_PTRACE")]
    SysPtrace = 19,
    #[strum(serialize = "CAP_SYS_PACCT")]
    SysPacct = 20,
    #[strum(serialize = "CAP_SYS_ADMIN")]
    SysAdmin = 21,
    #[strum(serialize = "CAP_SYS_BOOT")]
    SysBoot = 22,
    #[strum(serialize = "CAP_SYS_NICE")]
    SysNice = 23,
    #[strum(serialize = "CAP_SYS_RESOURCE")]
    SysResource = 24,
    #[strum(serialize = "CAP_SYS_TIME")]
    SysTime = 25,
    #[strum(serialize = "CAP_SYS_TTY_CONFIG")]
    SysTtyConfig = 26,
    #[strum(serialize = "CAP_MKNOD")]
    Mknod = 27,
    #[strum(serialize = "CAP_LEASE")]
    Lease = 28,
}

impl Capability {
    /// Bit number in the kernel capability mask.
    pub fn bit(self) -> u32 {
        self as u32
    }
}

/// Whether the calling process holds `cap` in its effective set.
pub fn has(cap: Capability) -> bool {
    match effective_mask() {
        Some(mask) => mask & (1u64 << cap.bit()) != 0,
        // SAFETY: geteuid has no preconditions.
        None => (unsafe { libc::geteuid() }) == 0,
    }
}

fn effective_mask() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_cap_eff(&status)
}

fn parse_cap_eff(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("CapEff:"))
        .and_then(|value| u64::from_str_radix(value.trim(), 16).ok())
}

/// Append `, and the process does not have the CAP_X capability`, or
/// the portable "not privileged" wording without dialect-specific.
pub fn explain_missing(sb: &mut StringBuffer, cap: Capability) {
    if sb.options().dialect_specific {
        let name: &'static str = cap.into();
        sb.puts(", and the process does not have the ");
        sb.puts(name);
        sb.puts(" capability");
    } else {
        sb.puts(", and the process is not privileged");
    }
}

/// Append the missing-capability clause only when `cap` is absent.
pub fn explain_if_missing(sb: &mut StringBuffer, cap: Capability) {
    if !has(cap) {
        explain_missing(sb, cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn names_are_kernel_spellings() {
        assert_eq!(Capability::DacOverride.to_string(), "CAP_DAC_OVERRIDE");
        assert_eq!(Capability::SysAdmin.to_string(), "CAP_SYS_ADMIN");
        assert_eq!("CAP_FOWNER".parse::<Capability>(), Ok(Capability::Fowner));
    }

    #[test]
    fn cap_eff_parsing() {
        let status = "Name:\ttest\nCapInh:\t0000000000000000\nCapEff:\t0000000000000006\n";
        let mask = parse_cap_eff(status).unwrap();
        assert_ne!(mask & (1 << Capability::DacOverride.bit()), 0);
        assert_eq!(mask & (1 << Capability::Chown.bit()), 0);
    }

    #[test]
    fn wording_follows_dialect_option() {
        let mut sb = StringBuffer::new(128, Options::default());
        explain_missing(&mut sb, Capability::Kill);
        assert_eq!(sb.as_str(), ", and the process does not have the CAP_KILL capability");

        let portable = Options {
            dialect_specific: false,
            ..Options::default()
        };
        let mut sb = StringBuffer::new(128, portable);
        explain_missing(&mut sb, Capability::Kill);
        assert_eq!(sb.as_str(), ", and the process is not privileged");
    }
}
