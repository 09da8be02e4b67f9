/*============================================================
  Synavera Project: Explain
  Module: explain_core::render::socket
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render socket domains, types, protocols, option levels and
    names, and socket address structures.

  Security / Safety Notes:
    Address structures are copied through the fault-safe probe
    before any field is read.

  Dependencies:
    libc socket definitions; parse_bits tables.

  Operational Scope:
    Call echoes for socket, bind, connect, accept, listen,
    setsockopt, shutdown.

  Revision History:
    2026-10-18 COD  Authored socket renderers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Probe before dereference
    - Unknown families rendered as raw family numbers
============================================================*/

use std::fmt::Write;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::os::raw::{c_int, c_void};

use crate::bits_table;
use crate::parse_bits::{self, BitsEntry, BitsTable};
use crate::probe;
use crate::string_buffer::StringBuffer;

/// Address families.
pub static DOMAINS: [BitsEntry; 12] = bits_table![
    AF_UNSPEC, AF_UNIX, AF_INET, AF_AX25, AF_IPX, AF_APPLETALK, AF_X25, AF_INET6, AF_NETLINK,
    AF_PACKET, AF_BLUETOOTH, AF_CAN,
];

/// Socket types.
pub static TYPES: [BitsEntry; 5] =
    bits_table![SOCK_STREAM, SOCK_DGRAM, SOCK_RAW, SOCK_RDM, SOCK_SEQPACKET];

/// Flags that may be ORed into a socket type.
pub static TYPE_FLAGS: [BitsEntry; 2] = bits_table![SOCK_NONBLOCK, SOCK_CLOEXEC];

/// IP protocol numbers.
pub static PROTOCOLS: [BitsEntry; 8] =
    bits_table![IPPROTO_IP, IPPROTO_ICMP, IPPROTO_TCP, IPPROTO_UDP, IPPROTO_IPV6, IPPROTO_ICMPV6, IPPROTO_SCTP, IPPROTO_RAW];

/// setsockopt levels.
pub static LEVELS: [BitsEntry; 5] = bits_table![SOL_SOCKET, IPPROTO_IP, IPPROTO_TCP, IPPROTO_UDP, IPPROTO_IPV6];

/// SOL_SOCKET option names.
pub static SOCKET_OPTIONS: [BitsEntry; 20] = bits_table![
    SO_DEBUG, SO_REUSEADDR, SO_TYPE, SO_ERROR, SO_DONTROUTE, SO_BROADCAST, SO_SNDBUF, SO_RCVBUF,
    SO_KEEPALIVE, SO_OOBINLINE, SO_LINGER, SO_REUSEPORT, SO_RCVLOWAT, SO_SNDLOWAT, SO_RCVTIMEO,
    SO_SNDTIMEO, SO_BINDTODEVICE, SO_PRIORITY, SO_PASSCRED, SO_ACCEPTCONN,
];

/// IPPROTO_TCP option names.
pub static TCP_OPTIONS: [BitsEntry; 6] =
    bits_table![TCP_NODELAY, TCP_MAXSEG, TCP_CORK, TCP_KEEPIDLE, TCP_KEEPINTVL, TCP_KEEPCNT];

/// shutdown(2) directions.
pub static SHUTDOWN_HOW: [BitsEntry; 3] = bits_table![SHUT_RD, SHUT_WR, SHUT_RDWR];

pub fn domain(sb: &mut StringBuffer, domain: c_int) {
    parse_bits::print_single(sb, i64::from(domain), &DOMAINS);
}

/// Render a socket type with any SOCK_NONBLOCK / SOCK_CLOEXEC bits.
pub fn socket_type(sb: &mut StringBuffer, kind: c_int) {
    let flags = kind & (libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC);
    parse_bits::print_single(sb, i64::from(kind & !flags), &TYPES);
    if flags != 0 {
        sb.puts(" | ");
        parse_bits::print(sb, i64::from(flags), &TYPE_FLAGS);
    }
}

pub fn protocol(sb: &mut StringBuffer, protocol: c_int) {
    parse_bits::print_single(sb, i64::from(protocol), &PROTOCOLS);
}

pub fn sockopt_level(sb: &mut StringBuffer, level: c_int) {
    parse_bits::print_single(sb, i64::from(level), &LEVELS);
}

/// Render an option name in the context of its level.
pub fn sockopt_name(sb: &mut StringBuffer, level: c_int, name: c_int) {
    match level {
        libc::SOL_SOCKET => parse_bits::print_single(sb, i64::from(name), &SOCKET_OPTIONS),
        libc::IPPROTO_TCP => parse_bits::print_single(sb, i64::from(name), &TCP_OPTIONS),
        _ => {
            let _ = write!(sb, "{name}");
        }
    }
}

pub fn shutdown_how(sb: &mut StringBuffer, how: c_int) {
    parse_bits::print_single(sb, i64::from(how), &SHUTDOWN_HOW);
}

/// Render a socket address of `len` bytes.
pub fn sockaddr(sb: &mut StringBuffer, addr: *const libc::sockaddr, len: libc::socklen_t) {
    let len = len as usize;
    let family_size = std::mem::size_of::<libc::sa_family_t>();
    if addr.is_null() || len < family_size || !probe::is_readable(addr as *const c_void, len) {
        super::pointer::pointer(sb, addr as *const c_void);
        return;
    }
    let bytes = match probe::read_bytes(addr as *const c_void, len) {
        Some(bytes) => bytes,
        None => {
            super::pointer::pointer(sb, addr as *const c_void);
            return;
        }
    };
    let family = libc::sa_family_t::from_ne_bytes([bytes[0], bytes[1]]);
    match c_int::from(family) {
        libc::AF_INET if len >= std::mem::size_of::<libc::sockaddr_in>() => {
            // SAFETY: the length check guarantees a full sockaddr_in.
            let sin: libc::sockaddr_in = unsafe { std::ptr::read_unaligned(bytes.as_ptr() as *const _) };
            let address = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
            let _ = write!(
                sb,
                "{{ sin_family = AF_INET, sin_port = {}, sin_addr = {} }}",
                u16::from_be(sin.sin_port),
                address
            );
        }
        libc::AF_INET6 if len >= std::mem::size_of::<libc::sockaddr_in6>() => {
            // SAFETY: the length check guarantees a full sockaddr_in6.
            let sin6: libc::sockaddr_in6 = unsafe { std::ptr::read_unaligned(bytes.as_ptr() as *const _) };
            let address = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
            let _ = write!(
                sb,
                "{{ sin6_family = AF_INET6, sin6_port = {}, sin6_addr = {} }}",
                u16::from_be(sin6.sin6_port),
                address
            );
        }
        libc::AF_UNIX => {
            let path = &bytes[family_size..];
            sb.puts("{ sun_family = AF_UNIX, sun_path = ");
            if path.first() == Some(&0) {
                sb.putc('@');
                let name = &path[1..];
                sb.puts_quoted(name);
            } else {
                let end = path.iter().position(|&b| b == 0).unwrap_or(path.len());
                sb.puts_quoted(&path[..end]);
            }
            sb.puts(" }");
        }
        _ => {
            sb.puts("{ sa_family = ");
            domain(sb, c_int::from(family));
            sb.puts(" }");
        }
    }
}

/// Path component of an AF_UNIX address, when that is what `addr` holds.
pub fn unix_path(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Vec<u8>> {
    let bytes = probe::read_bytes(addr as *const c_void, len as usize)?;
    if bytes.len() < 3 {
        return None;
    }
    let family = libc::sa_family_t::from_ne_bytes([bytes[0], bytes[1]]);
    if c_int::from(family) != libc::AF_UNIX || bytes[2] == 0 {
        return None;
    }
    let path = &bytes[2..];
    let end = path.iter().position(|&b| b == 0).unwrap_or(path.len());
    Some(path[..end].to_vec())
}

pub fn domain_table() -> &'static BitsTable {
    &DOMAINS
}

pub fn type_table() -> &'static BitsTable {
    &TYPES
}

pub fn protocol_table() -> &'static BitsTable {
    &PROTOCOLS
}

pub fn level_table() -> &'static BitsTable {
    &LEVELS
}

pub fn socket_option_table() -> &'static BitsTable {
    &SOCKET_OPTIONS
}

pub fn shutdown_table() -> &'static BitsTable {
    &SHUTDOWN_HOW
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn inet_address() {
        let sin = libc::sockaddr_in {
            sin_family: libc::AF_INET as libc::sa_family_t,
            sin_port: 8080u16.to_be(),
            sin_addr: libc::in_addr {
                s_addr: u32::from(Ipv4Addr::new(127, 0, 0, 1)).to_be(),
            },
            sin_zero: [0; 8],
        };
        let mut sb = StringBuffer::new(256, Options::default());
        sockaddr(
            &mut sb,
            &sin as *const _ as *const libc::sockaddr,
            std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        );
        assert_eq!(
            sb.as_str(),
            "{ sin_family = AF_INET, sin_port = 8080, sin_addr = 127.0.0.1 }"
        );
    }

    #[test]
    fn unreadable_address_is_a_pointer() {
        let mut sb = StringBuffer::new(64, Options::default());
        sockaddr(&mut sb, 0x40 as *const libc::sockaddr, 16);
        assert_eq!(sb.as_str(), "0x40");
    }

    #[test]
    fn socket_type_with_flags() {
        let mut sb = StringBuffer::new(64, Options::default());
        socket_type(&mut sb, libc::SOCK_STREAM | libc::SOCK_CLOEXEC);
        assert_eq!(sb.as_str(), "SOCK_STREAM | SOCK_CLOEXEC");
    }
}
