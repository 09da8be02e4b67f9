/*============================================================
  Synavera Project: Explain
  Module: explain_core::ioctl::table
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    The ioctl registry: one entry per known request with its
    payload type, transfer direction, device family and
    disambiguator, plus the payload renderers.

  Security / Safety Notes:
    Payloads are read through the fault-safe probe; an
    unreadable payload is shown as its address.

  Dependencies:
    bitflags, render::{termios, socket, pointer}, probe.

  Operational Scope:
    Terminal, file, block, socket and console requests.

  Revision History:
    2026-10-18 COD  Authored ioctl registry.
  ------------------------------------------------------------
  SSE Principles Observed:
    - The registry is immutable data consulted by number
    - Shared numbers carry a disambiguator or a preference
============================================================*/

use std::fmt::{Display, Write};
use std::os::raw::{c_int, c_void};

use bitflags::bitflags;

use super::request::{io, ior, iow};
use crate::analysers::socket::is_socket;
use crate::bits_table;
use crate::capability::Capability;
use crate::parse_bits::{self, BitsEntry, BitsTable};
use crate::probe;
use crate::render::pointer::{character, pointer};
use crate::render::socket::sockaddr;
use crate::render::termios::{termio, termios, KernelTermios, Termio};
use crate::string_buffer::StringBuffer;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IoctlFlags: u32 {
        /// The size encoded in the number is not the size the kernel
        /// actually transfers.
        const SIZE_DOES_NOT_AGREE = 1 << 0;
        /// The number predates the `_IOC` encoding and carries no
        /// direction or size.
        const LEGACY = 1 << 1;
        /// Chosen when several entries share the number and no
        /// disambiguator applies.
        const PREFERRED = 1 << 2;
    }
}

/// Which way the payload travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    None,
    In,
    Out,
    InOut,
}

impl Flow {
    pub fn is_output(self) -> bool {
        matches!(self, Flow::Out | Flow::InOut)
    }
}

/// The kind of file a request is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Terminal,
    File,
    Block,
    Socket,
    Console,
}

/// Member of `struct ifreq` a socket request transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfreqField {
    Flags,
    Addr,
    Mtu,
    Index,
    /// SIOCGIFNAME: the index goes in, the name comes out.
    NameByIndex,
}

/// What the third argument of the request is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Ignored.
    None,
    /// An integer passed in place of the pointer.
    Value,
    /// An enumerated integer passed in place of the pointer.
    Symbol(&'static BitsTable),
    Int,
    UInt,
    ULong,
    U64,
    Pid,
    Char,
    /// Pointer to an int holding flags from the table.
    Bits(&'static BitsTable),
    Termios,
    Termio,
    Winsize,
    Ifreq(IfreqField),
}

pub const IFNAMSIZ: usize = 16;

/// `struct ifreq`: the interface name and a 24 byte union.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ifreq {
    pub ifr_name: [u8; IFNAMSIZ],
    pub ifr_ifru: [u8; 24],
}

impl Ifreq {
    pub fn name(&self) -> &[u8] {
        let len = self.ifr_name.iter().position(|&b| b == 0).unwrap_or(IFNAMSIZ);
        &self.ifr_name[..len]
    }

    fn int(&self) -> i32 {
        i32::from_ne_bytes([self.ifr_ifru[0], self.ifr_ifru[1], self.ifr_ifru[2], self.ifr_ifru[3]])
    }

    fn flags(&self) -> u16 {
        u16::from_ne_bytes([self.ifr_ifru[0], self.ifr_ifru[1]])
    }
}

pub static INTERFACE_FLAGS: [BitsEntry; 16] = bits_table![
    IFF_UP, IFF_BROADCAST, IFF_DEBUG, IFF_LOOPBACK, IFF_POINTOPOINT, IFF_NOTRAILERS, IFF_RUNNING, IFF_NOARP,
    IFF_PROMISC, IFF_ALLMULTI, IFF_MASTER, IFF_SLAVE, IFF_MULTICAST, IFF_PORTSEL, IFF_AUTOMEDIA, IFF_DYNAMIC,
];

pub static MODEM_LINES: [BitsEntry; 9] = [
    BitsEntry { name: "TIOCM_LE", value: 0x001 },
    BitsEntry { name: "TIOCM_DTR", value: 0x002 },
    BitsEntry { name: "TIOCM_RTS", value: 0x004 },
    BitsEntry { name: "TIOCM_ST", value: 0x008 },
    BitsEntry { name: "TIOCM_SR", value: 0x010 },
    BitsEntry { name: "TIOCM_CTS", value: 0x020 },
    BitsEntry { name: "TIOCM_CAR", value: 0x040 },
    BitsEntry { name: "TIOCM_RNG", value: 0x080 },
    BitsEntry { name: "TIOCM_DSR", value: 0x100 },
];

pub static FLOW_ACTIONS: [BitsEntry; 4] = [
    BitsEntry { name: "TCOOFF", value: 0 },
    BitsEntry { name: "TCOON", value: 1 },
    BitsEntry { name: "TCIOFF", value: 2 },
    BitsEntry { name: "TCION", value: 3 },
];

pub static FLUSH_QUEUES: [BitsEntry; 3] = [
    BitsEntry { name: "TCIFLUSH", value: 0 },
    BitsEntry { name: "TCOFLUSH", value: 1 },
    BitsEntry { name: "TCIOFLUSH", value: 2 },
];

pub static CONSOLE_MODES: [BitsEntry; 4] = [
    BitsEntry { name: "KD_TEXT", value: 0 },
    BitsEntry { name: "KD_GRAPHICS", value: 1 },
    BitsEntry { name: "KD_TEXT0", value: 2 },
    BitsEntry { name: "KD_TEXT1", value: 3 },
];

/// Address then `{ value }`, or the bare address when unreadable.
fn scalar_argument<T: Copy + Display>(sb: &mut StringBuffer, data: *const c_void) {
    pointer(sb, data);
    // SAFETY: only instantiated with plain integer types.
    if let Some(value) = unsafe { probe::read_struct::<T>(data) } {
        let _ = write!(sb, " {{ {value} }}");
    }
}

fn scalar_value<T: Copy + Display>(sb: &mut StringBuffer, data: *const c_void) -> bool {
    // SAFETY: only instantiated with plain integer types.
    match unsafe { probe::read_struct::<T>(data) } {
        Some(value) => {
            let _ = write!(sb, "{{ {value} }}");
            true
        }
        None => false,
    }
}

fn ifreq(sb: &mut StringBuffer, data: *const c_void, field: IfreqField, with_field: bool) {
    // SAFETY: Ifreq is plain bytes.
    let Some(req) = (unsafe { probe::read_struct::<Ifreq>(data) }) else {
        return pointer(sb, data);
    };
    sb.puts("{ ");
    if field == IfreqField::NameByIndex {
        if with_field {
            sb.puts("ifr_name = ");
            sb.puts_quoted(req.name());
            sb.puts(", ");
        }
        let _ = write!(sb, "ifr_ifindex = {}", req.int());
        sb.puts(" }");
        return;
    }
    sb.puts("ifr_name = ");
    sb.puts_quoted(req.name());
    if with_field {
        sb.puts(", ");
        match field {
            IfreqField::Flags => {
                sb.puts("ifr_flags = ");
                parse_bits::print(sb, i64::from(req.flags()), &INTERFACE_FLAGS);
            }
            IfreqField::Addr => {
                sb.puts("ifr_addr = ");
                let addr = (data as *const u8).wrapping_add(IFNAMSIZ) as *const libc::sockaddr;
                sockaddr(sb, addr, std::mem::size_of::<libc::sockaddr>() as libc::socklen_t);
            }
            IfreqField::Mtu => {
                let _ = write!(sb, "ifr_mtu = {}", req.int());
            }
            IfreqField::Index | IfreqField::NameByIndex => {
                let _ = write!(sb, "ifr_ifindex = {}", req.int());
            }
        }
    }
    sb.puts(" }");
}

impl Payload {
    /// Bytes the kernel transfers through the pointer; zero when the
    /// argument is not a pointer.
    pub fn size(self) -> usize {
        match self {
            Payload::None | Payload::Value | Payload::Symbol(_) => 0,
            Payload::Int | Payload::UInt | Payload::Bits(_) => std::mem::size_of::<c_int>(),
            Payload::Pid => std::mem::size_of::<libc::pid_t>(),
            Payload::ULong => std::mem::size_of::<libc::c_ulong>(),
            Payload::U64 => std::mem::size_of::<u64>(),
            Payload::Char => 1,
            Payload::Termios => std::mem::size_of::<KernelTermios>(),
            Payload::Termio => std::mem::size_of::<Termio>(),
            Payload::Winsize => std::mem::size_of::<libc::winsize>(),
            Payload::Ifreq(_) => std::mem::size_of::<Ifreq>(),
        }
    }

    /// Whether the argument is a pointer rather than a value.
    pub fn is_pointer(self) -> bool {
        self.size() != 0
    }

    /// Echo the argument. Output-only payloads are shown as their
    /// address; their contents are not yet meaningful.
    pub fn render_argument(self, sb: &mut StringBuffer, data: *const c_void, flow: Flow) {
        match self {
            Payload::None => pointer(sb, data),
            Payload::Value => {
                let _ = write!(sb, "{}", data as isize);
            }
            Payload::Symbol(table) => parse_bits::print_single(sb, data as isize as i64, table),
            _ if flow == Flow::Out => pointer(sb, data),
            Payload::Int | Payload::Pid => scalar_argument::<c_int>(sb, data),
            Payload::UInt => scalar_argument::<u32>(sb, data),
            Payload::ULong => scalar_argument::<libc::c_ulong>(sb, data),
            Payload::U64 => scalar_argument::<u64>(sb, data),
            Payload::Char => {
                pointer(sb, data);
                // SAFETY: u8 is valid for every bit pattern.
                if let Some(c) = unsafe { probe::read_struct::<u8>(data) } {
                    sb.puts(" { ");
                    character(sb, c_int::from(c));
                    sb.puts(" }");
                }
            }
            Payload::Bits(table) => {
                pointer(sb, data);
                // SAFETY: c_int is valid for every bit pattern.
                if let Some(value) = unsafe { probe::read_struct::<c_int>(data) } {
                    sb.puts(" { ");
                    parse_bits::print(sb, i64::from(value), table);
                    sb.puts(" }");
                }
            }
            Payload::Termios => termios(sb, data),
            Payload::Termio => termio(sb, data),
            Payload::Winsize => crate::render::termios::winsize(sb, data),
            Payload::Ifreq(field) => ifreq(sb, data, field, flow == Flow::In),
        }
    }

    /// Describe what the kernel wrote back; false when nothing could
    /// be read.
    pub fn render_returned(self, sb: &mut StringBuffer, data: *const c_void) -> bool {
        if !self.is_pointer() || !probe::is_readable(data, self.size()) {
            return false;
        }
        match self {
            Payload::Int | Payload::Pid => scalar_value::<c_int>(sb, data),
            Payload::UInt => scalar_value::<u32>(sb, data),
            Payload::ULong => scalar_value::<libc::c_ulong>(sb, data),
            Payload::U64 => scalar_value::<u64>(sb, data),
            Payload::Bits(table) => {
                // SAFETY: readability checked above; c_int has no invalid patterns.
                let value = unsafe { std::ptr::read_unaligned(data as *const c_int) };
                sb.puts("{ ");
                parse_bits::print(sb, i64::from(value), table);
                sb.puts(" }");
                true
            }
            Payload::Ifreq(field) => {
                ifreq(sb, data, field, true);
                true
            }
            _ => {
                self.render_argument(sb, data, Flow::In);
                true
            }
        }
    }
}

/// One known request.
#[derive(Debug, Clone, Copy)]
pub struct IoctlEntry {
    pub name: &'static str,
    pub request: u64,
    pub family: Family,
    pub payload: Payload,
    pub flow: Flow,
    pub flags: IoctlFlags,
    /// Decides between entries sharing a number.
    pub applies: Option<fn(c_int) -> bool>,
    /// Capability an EPERM failure points at.
    pub requires: Option<Capability>,
}

impl IoctlEntry {
    /// A request built with the `_IOC` macros.
    const fn encoded(name: &'static str, request: u64, family: Family, payload: Payload, flow: Flow) -> Self {
        Self {
            name,
            request,
            family,
            payload,
            flow,
            flags: IoctlFlags::empty(),
            applies: None,
            requires: None,
        }
    }

    /// A request from before the `_IOC` encoding.
    const fn legacy(name: &'static str, request: u64, family: Family, payload: Payload, flow: Flow) -> Self {
        Self {
            flags: IoctlFlags::LEGACY,
            ..Self::encoded(name, request, family, payload, flow)
        }
    }

    const fn flagged(self, extra: IoctlFlags) -> Self {
        Self {
            flags: self.flags.union(extra),
            ..self
        }
    }

    const fn when(self, applies: fn(c_int) -> bool) -> Self {
        Self {
            applies: Some(applies),
            ..self
        }
    }

    const fn privileged(self, cap: Capability) -> Self {
        Self {
            requires: Some(cap),
            ..self
        }
    }
}

use Family::{Block, Console, File, Socket, Terminal};

pub static ENTRIES: [IoctlEntry; 56] = [
    IoctlEntry::legacy("TCGETS", 0x5401, Terminal, Payload::Termios, Flow::Out),
    IoctlEntry::legacy("TCSETS", 0x5402, Terminal, Payload::Termios, Flow::In),
    IoctlEntry::legacy("TCSETSW", 0x5403, Terminal, Payload::Termios, Flow::In),
    IoctlEntry::legacy("TCSETSF", 0x5404, Terminal, Payload::Termios, Flow::In),
    IoctlEntry::legacy("TCGETA", 0x5405, Terminal, Payload::Termio, Flow::Out),
    IoctlEntry::legacy("TCSETA", 0x5406, Terminal, Payload::Termio, Flow::In),
    IoctlEntry::legacy("TCSBRK", 0x5409, Terminal, Payload::Value, Flow::None),
    IoctlEntry::legacy("TCXONC", 0x540A, Terminal, Payload::Symbol(&FLOW_ACTIONS), Flow::None),
    IoctlEntry::legacy("TCFLSH", 0x540B, Terminal, Payload::Symbol(&FLUSH_QUEUES), Flow::None),
    IoctlEntry::legacy("TIOCEXCL", 0x540C, Terminal, Payload::None, Flow::None),
    IoctlEntry::legacy("TIOCNXCL", 0x540D, Terminal, Payload::None, Flow::None),
    IoctlEntry::legacy("TIOCSCTTY", 0x540E, Terminal, Payload::Value, Flow::None).privileged(Capability::SysAdmin),
    IoctlEntry::legacy("TIOCGPGRP", 0x540F, Terminal, Payload::Pid, Flow::Out),
    IoctlEntry::legacy("TIOCSPGRP", 0x5410, Terminal, Payload::Pid, Flow::In),
    IoctlEntry::legacy("TIOCOUTQ", 0x5411, Terminal, Payload::Int, Flow::Out).flagged(IoctlFlags::PREFERRED),
    IoctlEntry::legacy("TIOCSTI", 0x5412, Terminal, Payload::Char, Flow::In).privileged(Capability::SysAdmin),
    IoctlEntry::legacy("TIOCGWINSZ", 0x5413, Terminal, Payload::Winsize, Flow::Out),
    IoctlEntry::legacy("TIOCSWINSZ", 0x5414, Terminal, Payload::Winsize, Flow::In),
    IoctlEntry::legacy("TIOCMGET", 0x5415, Terminal, Payload::Bits(&MODEM_LINES), Flow::Out),
    IoctlEntry::legacy("TIOCMSET", 0x5418, Terminal, Payload::Bits(&MODEM_LINES), Flow::In),
    IoctlEntry::legacy("TIOCGSOFTCAR", 0x5419, Terminal, Payload::Int, Flow::Out),
    IoctlEntry::legacy("TIOCSSOFTCAR", 0x541A, Terminal, Payload::Int, Flow::In),
    IoctlEntry::legacy("TIOCCONS", 0x541D, Terminal, Payload::None, Flow::None).privileged(Capability::SysAdmin),
    IoctlEntry::legacy("TIOCNOTTY", 0x5422, Terminal, Payload::None, Flow::None),
    IoctlEntry::legacy("TIOCGSID", 0x5429, Terminal, Payload::Pid, Flow::Out),
    IoctlEntry::encoded("TIOCGPTN", ior(b'T', 0x30, 4), Terminal, Payload::UInt, Flow::Out),
    IoctlEntry::encoded("TIOCSPTLCK", iow(b'T', 0x31, 4), Terminal, Payload::Int, Flow::In),
    IoctlEntry::legacy("FIONREAD", 0x541B, File, Payload::Int, Flow::Out).flagged(IoctlFlags::PREFERRED),
    IoctlEntry::legacy("FIONBIO", 0x5421, File, Payload::Int, Flow::In),
    IoctlEntry::legacy("FIONCLEX", 0x5450, File, Payload::None, Flow::None),
    IoctlEntry::legacy("FIOCLEX", 0x5451, File, Payload::None, Flow::None),
    IoctlEntry::legacy("FIOASYNC", 0x5452, File, Payload::Int, Flow::In),
    IoctlEntry::legacy("FIBMAP", io(0x00, 1), File, Payload::Int, Flow::InOut).privileged(Capability::SysRawio),
    IoctlEntry::legacy("FIGETBSZ", io(0x00, 2), File, Payload::Int, Flow::Out),
    IoctlEntry::legacy("BLKROSET", io(0x12, 93), Block, Payload::Int, Flow::In).privileged(Capability::SysAdmin),
    IoctlEntry::legacy("BLKROGET", io(0x12, 94), Block, Payload::Int, Flow::Out),
    IoctlEntry::legacy("BLKRRPART", io(0x12, 95), Block, Payload::None, Flow::None).privileged(Capability::SysAdmin),
    IoctlEntry::legacy("BLKGETSIZE", io(0x12, 96), Block, Payload::ULong, Flow::Out),
    IoctlEntry::legacy("BLKFLSBUF", io(0x12, 97), Block, Payload::None, Flow::None).privileged(Capability::SysAdmin),
    IoctlEntry::legacy("BLKSSZGET", io(0x12, 104), Block, Payload::Int, Flow::Out),
    IoctlEntry::encoded("BLKBSZGET", ior(0x12, 112, 8), Block, Payload::Int, Flow::Out)
        .flagged(IoctlFlags::SIZE_DOES_NOT_AGREE),
    IoctlEntry::encoded("BLKGETSIZE64", ior(0x12, 114, 8), Block, Payload::U64, Flow::Out),
    IoctlEntry::legacy("SIOCATMARK", 0x8905, Socket, Payload::Int, Flow::Out),
    IoctlEntry::legacy("SIOCGIFNAME", 0x8910, Socket, Payload::Ifreq(IfreqField::NameByIndex), Flow::InOut),
    IoctlEntry::legacy("SIOCGIFFLAGS", 0x8913, Socket, Payload::Ifreq(IfreqField::Flags), Flow::InOut),
    IoctlEntry::legacy("SIOCSIFFLAGS", 0x8914, Socket, Payload::Ifreq(IfreqField::Flags), Flow::In)
        .privileged(Capability::NetAdmin),
    IoctlEntry::legacy("SIOCGIFADDR", 0x8915, Socket, Payload::Ifreq(IfreqField::Addr), Flow::InOut),
    IoctlEntry::legacy("SIOCGIFMTU", 0x8921, Socket, Payload::Ifreq(IfreqField::Mtu), Flow::InOut),
    IoctlEntry::legacy("SIOCGIFINDEX", 0x8933, Socket, Payload::Ifreq(IfreqField::Index), Flow::InOut),
    IoctlEntry::legacy("SIOCINQ", 0x541B, Socket, Payload::Int, Flow::Out).when(is_socket),
    IoctlEntry::legacy("SIOCOUTQ", 0x5411, Socket, Payload::Int, Flow::Out).when(is_socket),
    IoctlEntry::legacy("KDSETMODE", 0x4B3A, Console, Payload::Symbol(&CONSOLE_MODES), Flow::None)
        .privileged(Capability::SysTtyConfig),
    IoctlEntry::legacy("KDGETMODE", 0x4B3B, Console, Payload::Int, Flow::Out),
    IoctlEntry::legacy("VT_OPENQRY", 0x5600, Console, Payload::Int, Flow::Out),
    IoctlEntry::legacy("VT_ACTIVATE", 0x5606, Console, Payload::Value, Flow::None),
    IoctlEntry::legacy("VT_WAITACTIVE", 0x5607, Console, Payload::Value, Flow::None),
];

/// The entry for `request` on `fildes`, if any.
///
/// A lone entry always applies. Among several sharing the number,
/// the first whose disambiguator accepts the descriptor wins, then
/// the preferred one.
pub fn find(request: u64, fildes: c_int) -> Option<&'static IoctlEntry> {
    let candidates: Vec<&'static IoctlEntry> = ENTRIES.iter().filter(|entry| entry.request == request).collect();
    match candidates.as_slice() {
        [] => None,
        [only] => Some(*only),
        many => many
            .iter()
            .find(|entry| entry.applies.is_some_and(|applies| applies(fildes)))
            .or_else(|| many.iter().find(|entry| entry.flags.contains(IoctlFlags::PREFERRED)))
            .copied(),
    }
}

pub fn find_by_name(name: &str) -> Option<&'static IoctlEntry> {
    ENTRIES.iter().find(|entry| entry.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::os::unix::io::AsRawFd;

    #[test]
    fn shared_numbers_follow_the_descriptor() {
        let file = tempfile::tempfile().unwrap();
        assert_eq!(find(0x541B, file.as_raw_fd()).map(|e| e.name), Some("FIONREAD"));
        let (sock, _peer) = std::os::unix::net::UnixStream::pair().unwrap();
        assert_eq!(find(0x541B, sock.as_raw_fd()).map(|e| e.name), Some("SIOCINQ"));
        assert_eq!(find(0x5411, sock.as_raw_fd()).map(|e| e.name), Some("SIOCOUTQ"));
        assert_eq!(find(0x5411, file.as_raw_fd()).map(|e| e.name), Some("TIOCOUTQ"));
        assert!(find(0xDEAD_BEEF, file.as_raw_fd()).is_none());
    }

    #[test]
    fn payload_sizes_match_kernel_structs() {
        assert_eq!(Payload::Termios.size(), 36);
        assert_eq!(Payload::Winsize.size(), 8);
        assert_eq!(Payload::Ifreq(IfreqField::Flags).size(), 40);
        assert!(!Payload::Symbol(&FLOW_ACTIONS).is_pointer());
    }

    #[test]
    fn interface_request_rendering() {
        let mut req = Ifreq::default();
        req.ifr_name[..2].copy_from_slice(b"lo");
        let flags = (libc::IFF_UP | libc::IFF_LOOPBACK) as u16;
        req.ifr_ifru[..2].copy_from_slice(&flags.to_ne_bytes());
        let data = &req as *const Ifreq as *const c_void;

        let mut echo = StringBuffer::new(256, Options::default());
        Payload::Ifreq(IfreqField::Flags).render_argument(&mut echo, data, Flow::InOut);
        assert_eq!(echo.as_str(), "{ ifr_name = \"lo\" }");

        let mut back = StringBuffer::new(256, Options::default());
        assert!(Payload::Ifreq(IfreqField::Flags).render_returned(&mut back, data));
        assert_eq!(back.as_str(), "{ ifr_name = \"lo\", ifr_flags = IFF_UP | IFF_LOOPBACK }");
    }

    #[test]
    fn values_and_symbols_are_not_dereferenced() {
        let mut sb = StringBuffer::new(128, Options::default());
        Payload::Symbol(&FLUSH_QUEUES).render_argument(&mut sb, 2 as *const c_void, Flow::None);
        sb.putc(' ');
        Payload::Value.render_argument(&mut sb, 7 as *const c_void, Flow::None);
        assert_eq!(sb.as_str(), "TCIOFLUSH 7");
    }
}
