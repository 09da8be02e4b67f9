/*============================================================
  Synavera Project: Explain
  Module: explain_core::calls::network
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Explainers for the socket calls: socket, bind, connect,
    listen, accept, setsockopt and shutdown.

  Security / Safety Notes:
    Socket state is read with getsockopt only; nothing is
    bound, connected or sent.

  Dependencies:
    analysers::socket, render::socket, path_resolution for
    AF_UNIX addresses.

  Operational Scope:
    The networking section of the call registry.

  Revision History:
    2026-10-18 COD  Authored socket explainers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Addresses are decoded, never dereferenced blindly
============================================================*/

use std::fmt::Write;
use std::net::SocketAddr;
use std::os::raw::{c_int, c_void};

use super::{path_errno, struct_bytes, Args, CallEntry, Echo, Explainer};
use crate::analysers::limits::{einval_vague, enobufs};
use crate::analysers::socket::{
    eaddrinuse, eaddrnotavail, eafnosupport, ealready, econnrefused, einprogress, eisconn, enetunreach, enotconn,
    enotsock, eopnotsupp, etimedout, is_listening, socket_domain, socket_kind,
};
use crate::analysers::{ebadf, efault, eintr, emfile, enfile, enomem_kernel_or_user, generic, software_error};
use crate::capability::{self, Capability};
use crate::error::{ExplainError, Result};
use crate::parse_bits::{self, BitsEntry};
use crate::path_resolution::{FinalComponent, Want};
use crate::probe;
use crate::render::pointer::{int_star, pointer};
use crate::render::socket::{
    domain, domain_table, level_table, protocol, protocol_table, shutdown_how, shutdown_table, sockaddr,
    sockopt_level, sockopt_name, socket_option_table, socket_type, unix_path, TCP_OPTIONS, TYPES, TYPE_FLAGS,
};
use crate::string_buffer::StringBuffer;

/// Family stored in the first two bytes of a socket address.
fn address_family(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<c_int> {
    let bytes = probe::read_bytes(addr as *const c_void, (len as usize).min(2))?;
    (bytes.len() == 2).then(|| c_int::from(libc::sa_family_t::from_ne_bytes([bytes[0], bytes[1]])))
}

/// Port of an AF_INET or AF_INET6 address.
fn inet_port(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<u16> {
    let family = address_family(addr, len)?;
    if family != libc::AF_INET && family != libc::AF_INET6 {
        return None;
    }
    let bytes = probe::read_bytes(addr as *const c_void, 4)?;
    Some(u16::from_be_bytes([bytes[2], bytes[3]]))
}

fn ebadf_socket(sb: &mut StringBuffer, fildes: c_int) {
    ebadf(sb, fildes, "fildes");
}

/// Causes every socket call shares.
fn socket_common(sb: &mut StringBuffer, errnum: c_int, fildes: c_int) -> bool {
    match errnum {
        libc::EBADF => ebadf_socket(sb, fildes),
        libc::ENOTSOCK => enotsock(sb, fildes, "fildes"),
        libc::ENOBUFS => enobufs(sb),
        libc::ENOMEM => enomem_kernel_or_user(sb),
        _ => return false,
    }
    true
}

fn privileged_port(sb: &mut StringBuffer, port: u16) {
    let _ = write!(sb, "the address is protected, port {port} is below 1024");
    capability::explain_if_missing(sb, Capability::NetBindService);
}

pub struct Socket {
    pub domain: c_int,
    pub kind: c_int,
    pub protocol: c_int,
}

impl Explainer for Socket {
    fn name(&self) -> &'static str {
        "socket"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "socket")
            .arg("domain", |sb| domain(sb, self.domain))
            .arg("type", |sb| socket_type(sb, self.kind))
            .arg("protocol", |sb| protocol(sb, self.protocol))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        let base = self.kind & !(libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC);
        match errnum {
            libc::EACCES => {
                sb.puts("the process does not have permission to create a socket of the specified type and/or protocol");
                if base == libc::SOCK_RAW || self.domain == libc::AF_PACKET {
                    capability::explain_if_missing(sb, Capability::NetRaw);
                }
            }
            libc::EAFNOSUPPORT => {
                sb.puts("the implementation does not support the specified address family (");
                domain(sb, self.domain);
                sb.putc(')');
            }
            libc::EINVAL => {
                if parse_bits::find_by_value(i64::from(base), &TYPES).is_none() {
                    sb.puts("the type argument is not a valid socket type");
                } else {
                    sb.puts("the type argument contains invalid flags, or the protocol or domain is unknown");
                }
                software_error(sb);
            }
            libc::EMFILE => emfile(sb),
            libc::ENFILE => enfile(sb),
            libc::ENOBUFS => enobufs(sb),
            libc::ENOMEM => enomem_kernel_or_user(sb),
            libc::EPROTONOSUPPORT => {
                sb.puts("the protocol type or the specified protocol is not supported within this domain (");
                domain(sb, self.domain);
                sb.puts(", ");
                socket_type(sb, self.kind);
                sb.puts(", ");
                protocol(sb, self.protocol);
                sb.putc(')');
            }
            _ => generic(sb, errnum, "socket"),
        }
    }
}

/// bind and connect; `connecting` selects which.
pub struct Address {
    pub connecting: bool,
    pub fildes: c_int,
    pub addr: *const libc::sockaddr,
    pub addrlen: libc::socklen_t,
}

impl Address {
    fn unix_cause(&self, sb: &mut StringBuffer, errnum: c_int) -> bool {
        let Some(path) = unix_path(self.addr, self.addrlen) else {
            return false;
        };
        let fc = if self.connecting {
            FinalComponent {
                st_mode: libc::S_IFSOCK,
                must_be_a_st_mode: true,
                ..FinalComponent::wanting(Want::WRITE)
            }
        } else {
            FinalComponent::new_entry(libc::S_IFSOCK)
        };
        path_errno(sb, errnum, &path, "addr", &fc)
    }

    /// Pathname errors reported for an address that carries no pathname.
    fn no_pathname(&self, sb: &mut StringBuffer, errnum: c_int, call: &str) {
        if !matches!(
            errnum,
            libc::ENOENT | libc::ENOTDIR | libc::ELOOP | libc::ENAMETOOLONG | libc::EROFS | libc::EACCES
        ) {
            return generic(sb, errnum, call);
        }
        sb.puts("addr is not an AF_UNIX address, so it has no pathname that could have caused this error");
        if let Some(family) = address_family(self.addr, self.addrlen) {
            sb.puts(" (");
            domain(sb, family);
            sb.putc(')');
        }
    }

    fn bind_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EACCES => match inet_port(self.addr, self.addrlen) {
                Some(port) if port != 0 && port < 1024 => privileged_port(sb, port),
                _ => {
                    if !self.unix_cause(sb, errnum) {
                        sb.puts("the address is protected and the process does not have permission to use it");
                    }
                }
            },
            libc::EADDRINUSE => {
                eaddrinuse(sb, "addr");
                if unix_path(self.addr, self.addrlen).is_some() {
                    sb.puts(", the socket file already exists");
                } else if inet_port(self.addr, self.addrlen) == Some(0) {
                    sb.puts(", all ephemeral ports are in use");
                }
            }
            libc::EADDRNOTAVAIL => eaddrnotavail(sb, "addr"),
            libc::EINVAL => {
                if probe::is_open(self.fildes) && self.addrlen < std::mem::size_of::<libc::sa_family_t>() as u32 {
                    sb.puts("the addrlen argument is too small for a socket address");
                } else {
                    sb.puts("the socket is already bound to an address, or addrlen is wrong for the address family");
                }
                software_error(sb);
            }
            _ => {
                if !self.unix_cause(sb, errnum) {
                    self.no_pathname(sb, errnum, "bind");
                }
            }
        }
    }

    fn connect_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EACCES | libc::EPERM => {
                if !self.unix_cause(sb, libc::EACCES) {
                    sb.puts(
                        "the user tried to connect to a broadcast address without having the socket broadcast flag \
                         enabled, or the connection request failed because of a local firewall rule",
                    );
                }
            }
            libc::EADDRINUSE => eaddrinuse(sb, "local address"),
            libc::EAGAIN => sb.puts("there are no more free local ports"),
            libc::EALREADY => ealready(sb, "fildes"),
            libc::ECONNREFUSED => {
                econnrefused(sb);
                if let Some(path) = unix_path(self.addr, self.addrlen) {
                    sb.puts(", the socket file ");
                    sb.puts_quoted(&path);
                    sb.puts(" has no listener");
                }
            }
            libc::EINPROGRESS => einprogress(sb, "fildes"),
            libc::EINTR => eintr(sb, "connect"),
            libc::EISCONN => eisconn(sb, "fildes"),
            libc::ENETUNREACH => enetunreach(sb),
            libc::ETIMEDOUT => etimedout(sb),
            _ => {
                if !self.unix_cause(sb, errnum) {
                    self.no_pathname(sb, errnum, "connect");
                }
            }
        }
    }
}

impl Explainer for Address {
    fn name(&self) -> &'static str {
        if self.connecting {
            "connect"
        } else {
            "bind"
        }
    }

    fn render_call(&self, sb: &mut StringBuffer, errnum: c_int) {
        Echo::new(sb, self.name())
            .fildes("fildes", self.fildes)
            .arg("addr", |sb| {
                if errnum == libc::EFAULT {
                    pointer(sb, self.addr as *const c_void);
                } else {
                    sockaddr(sb, self.addr, self.addrlen);
                }
            })
            .value("addrlen", self.addrlen)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if socket_common(sb, errnum, self.fildes) {
            return;
        }
        match errnum {
            libc::EAFNOSUPPORT => eafnosupport(sb, self.fildes, "addr", address_family(self.addr, self.addrlen)),
            libc::EFAULT => efault(sb, "addr"),
            _ if self.connecting => self.connect_cause(sb, errnum),
            _ => self.bind_cause(sb, errnum),
        }
    }
}

pub struct Listen {
    pub fildes: c_int,
    pub backlog: c_int,
}

impl Explainer for Listen {
    fn name(&self) -> &'static str {
        "listen"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "listen")
            .fildes("fildes", self.fildes)
            .value("backlog", self.backlog)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if socket_common(sb, errnum, self.fildes) {
            return;
        }
        match errnum {
            libc::EADDRINUSE => {
                sb.puts("another socket is already listening on the same port");
            }
            libc::EOPNOTSUPP => eopnotsupp(sb, self.fildes, "fildes", "listen"),
            _ => generic(sb, errnum, "listen"),
        }
    }
}

pub struct Accept {
    pub fildes: c_int,
    pub addr: *const libc::sockaddr,
    pub addrlen: *const libc::socklen_t,
}

impl Explainer for Accept {
    fn name(&self) -> &'static str {
        "accept"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "accept")
            .fildes("fildes", self.fildes)
            .pointer("addr", self.addr as *const c_void)
            .arg("addrlen", |sb| int_star(sb, self.addrlen as *const c_int))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if socket_common(sb, errnum, self.fildes) {
            return;
        }
        match errnum {
            libc::EAGAIN => sb.puts(
                "the socket is marked non-blocking and no connections are present to be accepted",
            ),
            libc::ECONNABORTED => sb.puts("a connection has been aborted"),
            libc::EFAULT => {
                if !self.addrlen.is_null() && !probe::is_readable(self.addrlen as *const c_void, 4) {
                    efault(sb, "addrlen");
                } else {
                    efault(sb, "addr");
                }
            }
            libc::EINTR => eintr(sb, "accept"),
            libc::EINVAL => {
                if is_listening(self.fildes) == Some(false) {
                    sb.puts("the socket is not listening for connections, a listen(2) call is required first");
                } else {
                    einval_vague(sb, "addrlen");
                }
            }
            libc::EMFILE => emfile(sb),
            libc::ENFILE => enfile(sb),
            libc::EOPNOTSUPP => {
                eopnotsupp(sb, self.fildes, "fildes", "accept");
                if socket_kind(self.fildes).is_some_and(|k| k != libc::SOCK_STREAM) {
                    sb.puts(", it is not of type SOCK_STREAM");
                }
            }
            libc::EPERM => sb.puts("firewall rules forbid the connection"),
            _ => generic(sb, errnum, "accept"),
        }
    }
}

pub struct Setsockopt {
    pub fildes: c_int,
    pub level: c_int,
    pub name: c_int,
    pub value: *const c_void,
    pub len: libc::socklen_t,
}

impl Explainer for Setsockopt {
    fn name(&self) -> &'static str {
        "setsockopt"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "setsockopt")
            .fildes("fildes", self.fildes)
            .arg("level", |sb| sockopt_level(sb, self.level))
            .arg("name", |sb| sockopt_name(sb, self.level, self.name))
            .arg("data", |sb| {
                if self.len as usize == std::mem::size_of::<c_int>() {
                    int_star(sb, self.value as *const c_int);
                } else {
                    pointer(sb, self.value);
                }
            })
            .value("data_size", self.len)
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if socket_common(sb, errnum, self.fildes) {
            return;
        }
        match errnum {
            libc::EFAULT => efault(sb, "data"),
            libc::EINVAL => {
                sb.puts("the data_size argument is invalid for the option, or the data is out of range");
                software_error(sb);
            }
            libc::ENOPROTOOPT => {
                sb.puts("the option is unknown at the level indicated");
                if sb.options().dialect_specific {
                    if let Some(family) = socket_domain(self.fildes) {
                        sb.puts(" (");
                        domain(sb, family);
                        sb.puts(", ");
                        sockopt_level(sb, self.level);
                        sb.putc(')');
                    }
                }
            }
            libc::EPERM | libc::EACCES => {
                sb.puts("the process does not have permission to set this option");
                capability::explain_if_missing(sb, Capability::NetAdmin);
            }
            _ => generic(sb, errnum, "setsockopt"),
        }
    }
}

pub struct Shutdown {
    pub fildes: c_int,
    pub how: c_int,
}

impl Explainer for Shutdown {
    fn name(&self) -> &'static str {
        "shutdown"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "shutdown")
            .fildes("fildes", self.fildes)
            .arg("how", |sb| shutdown_how(sb, self.how))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if socket_common(sb, errnum, self.fildes) {
            return;
        }
        match errnum {
            libc::EINVAL => {
                sb.puts("the how argument is not one of SHUT_RD, SHUT_WR or SHUT_RDWR");
                software_error(sb);
            }
            libc::ENOTCONN => enotconn(sb, "fildes"),
            _ => generic(sb, errnum, "shutdown"),
        }
    }
}

/// `127.0.0.1:80`, `[::1]:80`, `unix:/path` or `/path` as raw bytes.
pub fn parse_sockaddr(text: &str) -> Option<Vec<u8>> {
    if let Ok(address) = text.parse::<SocketAddr>() {
        return Some(match address {
            SocketAddr::V4(v4) => {
                let sin = libc::sockaddr_in {
                    sin_family: libc::AF_INET as libc::sa_family_t,
                    sin_port: v4.port().to_be(),
                    sin_addr: libc::in_addr {
                        s_addr: u32::from(*v4.ip()).to_be(),
                    },
                    sin_zero: [0; 8],
                };
                struct_bytes(&sin)
            }
            SocketAddr::V6(v6) => {
                let sin6 = libc::sockaddr_in6 {
                    sin6_family: libc::AF_INET6 as libc::sa_family_t,
                    sin6_port: v6.port().to_be(),
                    sin6_flowinfo: v6.flowinfo(),
                    sin6_addr: libc::in6_addr {
                        s6_addr: v6.ip().octets(),
                    },
                    sin6_scope_id: v6.scope_id(),
                };
                struct_bytes(&sin6)
            }
        });
    }
    let path = text.strip_prefix("unix:").unwrap_or(text);
    if !path.starts_with('/') && !text.starts_with("unix:") {
        return None;
    }
    let mut bytes = (libc::AF_UNIX as libc::sa_family_t).to_ne_bytes().to_vec();
    bytes.extend_from_slice(path.as_bytes());
    bytes.push(0);
    Some(bytes)
}

fn parse_socket(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let domain = args.symbolic("domain", domain_table())? as c_int;
    let kinds: Vec<BitsEntry> = TYPES.iter().chain(TYPE_FLAGS.iter()).copied().collect();
    let kind = args.symbolic("type", &kinds)? as c_int;
    let protocol = args.symbolic_or("protocol", protocol_table(), 0)? as c_int;
    Ok(Box::new(Socket { domain, kind, protocol }))
}

fn parse_address(args: &mut Args<'_>, connecting: bool) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let text = args.optional().unwrap_or("");
    let bytes = parse_sockaddr(text).ok_or_else(|| ExplainError::parse("addr", text, "not a socket address"))?;
    let addrlen = bytes.len() as libc::socklen_t;
    let addr = args.bytes(&bytes) as *const libc::sockaddr;
    Ok(Box::new(Address {
        connecting,
        fildes,
        addr,
        addrlen,
    }))
}

fn parse_bind(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_address(args, false)
}

fn parse_connect(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    parse_address(args, true)
}

fn parse_listen(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let backlog = if args.has_more() { args.int("backlog")? } else { libc::SOMAXCONN };
    Ok(Box::new(Listen { fildes, backlog }))
}

fn parse_accept(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let addr = args.buffer("addr")? as *const libc::sockaddr;
    let len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    let addrlen = args.bytes(&len.to_ne_bytes()) as *const libc::socklen_t;
    Ok(Box::new(Accept { fildes, addr, addrlen }))
}

fn parse_setsockopt(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let level = args.symbolic("level", level_table())? as c_int;
    let name = match level {
        libc::IPPROTO_TCP => args.symbolic("name", &TCP_OPTIONS)?,
        libc::SOL_SOCKET => args.symbolic("name", socket_option_table())?,
        _ => args.long("name")?,
    } as c_int;
    let value = if args.has_more() { args.int("data")? } else { 1 };
    let value = args.bytes(&value.to_ne_bytes());
    Ok(Box::new(Setsockopt {
        fildes,
        level,
        name,
        value,
        len: std::mem::size_of::<c_int>() as libc::socklen_t,
    }))
}

fn parse_shutdown(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let fildes = args.fildes("fildes")?;
    let how = args.symbolic("how", shutdown_table())? as c_int;
    Ok(Box::new(Shutdown { fildes, how }))
}

pub(crate) static CALLS: [CallEntry; 7] = [
    CallEntry {
        name: "socket",
        synopsis: "domain type [protocol]",
        errnos: &[
            libc::EACCES,
            libc::EAFNOSUPPORT,
            libc::EINVAL,
            libc::EMFILE,
            libc::ENFILE,
            libc::ENOBUFS,
            libc::ENOMEM,
            libc::EPROTONOSUPPORT,
        ],
        sample: &["AF_INET", "SOCK_RAW", "IPPROTO_ICMP"],
        parse: parse_socket,
    },
    CallEntry {
        name: "bind",
        synopsis: "fildes addr",
        errnos: &[
            libc::EACCES,
            libc::EADDRINUSE,
            libc::EADDRNOTAVAIL,
            libc::EAFNOSUPPORT,
            libc::EBADF,
            libc::EFAULT,
            libc::EINVAL,
            libc::ELOOP,
            libc::ENAMETOOLONG,
            libc::ENOENT,
            libc::ENOMEM,
            libc::ENOTDIR,
            libc::ENOTSOCK,
            libc::EROFS,
        ],
        sample: &["0", "127.0.0.1:80"],
        parse: parse_bind,
    },
    CallEntry {
        name: "connect",
        synopsis: "fildes addr",
        errnos: &[
            libc::EACCES,
            libc::EADDRINUSE,
            libc::EAFNOSUPPORT,
            libc::EAGAIN,
            libc::EALREADY,
            libc::EBADF,
            libc::ECONNREFUSED,
            libc::EFAULT,
            libc::EINPROGRESS,
            libc::EINTR,
            libc::EISCONN,
            libc::ENETUNREACH,
            libc::ENOTSOCK,
            libc::EPERM,
            libc::ETIMEDOUT,
        ],
        sample: &["0", "unix:/no/such/socket"],
        parse: parse_connect,
    },
    CallEntry {
        name: "listen",
        synopsis: "fildes [backlog]",
        errnos: &[libc::EADDRINUSE, libc::EBADF, libc::ENOTSOCK, libc::EOPNOTSUPP],
        sample: &["0", "5"],
        parse: parse_listen,
    },
    CallEntry {
        name: "accept",
        synopsis: "fildes [addr]",
        errnos: &[
            libc::EAGAIN,
            libc::EBADF,
            libc::ECONNABORTED,
            libc::EFAULT,
            libc::EINTR,
            libc::EINVAL,
            libc::EMFILE,
            libc::ENFILE,
            libc::ENOBUFS,
            libc::ENOMEM,
            libc::ENOTSOCK,
            libc::EOPNOTSUPP,
            libc::EPERM,
        ],
        sample: &["0"],
        parse: parse_accept,
    },
    CallEntry {
        name: "setsockopt",
        synopsis: "fildes level name [value]",
        errnos: &[libc::EBADF, libc::EFAULT, libc::EINVAL, libc::ENOPROTOOPT, libc::ENOTSOCK, libc::EPERM],
        sample: &["0", "SOL_SOCKET", "SO_REUSEADDR", "1"],
        parse: parse_setsockopt,
    },
    CallEntry {
        name: "shutdown",
        synopsis: "fildes how",
        errnos: &[libc::EBADF, libc::EINVAL, libc::ENOTCONN, libc::ENOTSOCK],
        sample: &["0", "SHUT_RDWR"],
        parse: parse_shutdown,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
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
    fn socket_calls_cover_shared_errors() {
        for entry in CALLS.iter().filter(|e| e.name != "socket") {
            assert!(entry.errnos.contains(&libc::EBADF), "{}", entry.name);
            assert!(entry.errnos.contains(&libc::ENOTSOCK), "{}", entry.name);
        }
    }

    #[test]
    fn bind_pathname_errors_on_an_inet_address() {
        let bytes = parse_sockaddr("127.0.0.1:8080").unwrap();
        let bind = Address {
            connecting: false,
            fildes: 3,
            addr: bytes.as_ptr() as *const libc::sockaddr,
            addrlen: bytes.len() as libc::socklen_t,
        };
        for errnum in [libc::ENOENT, libc::ENOTDIR, libc::ELOOP, libc::ENAMETOOLONG, libc::EROFS] {
            let (_, cause) = explain(&bind, errnum);
            assert_eq!(
                cause,
                "addr is not an AF_UNIX address, so it has no pathname that could have caused this error (AF_INET)"
            );
        }
    }

    #[test]
    fn bind_privileged_port() {
        let bytes = parse_sockaddr("127.0.0.1:80").unwrap();
        let bind = Address {
            connecting: false,
            fildes: 3,
            addr: bytes.as_ptr() as *const libc::sockaddr,
            addrlen: bytes.len() as libc::socklen_t,
        };
        let mut call = StringBuffer::new(1024, Options::default());
        bind.render_call(&mut call, libc::EACCES);
        assert!(
            call.as_str().contains("addr = { sin_family = AF_INET, sin_port = 80, sin_addr = 127.0.0.1 }, addrlen = 16"),
            "{}",
            call.as_str()
        );
        let (_, cause) = explain(&bind, libc::EACCES);
        assert!(cause.starts_with("the address is protected, port 80 is below 1024"), "{cause}");
    }

    #[test]
    fn connect_to_missing_unix_socket() {
        let bytes = parse_sockaddr("unix:/no/such/dir/sock").unwrap();
        let connect = Address {
            connecting: true,
            fildes: 3,
            addr: bytes.as_ptr() as *const libc::sockaddr,
            addrlen: bytes.len() as libc::socklen_t,
        };
        let (_, cause) = explain(&connect, libc::ENOENT);
        assert!(cause.contains("\"no\""), "{cause}");
    }

    #[test]
    fn accept_on_unlistened_socket() {
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let accept = Accept {
            fildes: socket.as_raw_fd(),
            addr: std::ptr::null(),
            addrlen: std::ptr::null(),
        };
        let (_, cause) = explain(&accept, libc::EINVAL);
        assert!(cause.starts_with("the socket is not listening for connections"), "{cause}");
    }

    #[test]
    fn shutdown_on_a_file() {
        let file = tempfile::tempfile().unwrap();
        let shutdown = Shutdown {
            fildes: file.as_raw_fd(),
            how: libc::SHUT_RDWR,
        };
        let (call, cause) = explain(&shutdown, libc::ENOTSOCK);
        assert!(call.ends_with("how = SHUT_RDWR)"), "{call}");
        assert_eq!(cause, "the fildes argument does not refer to a socket, it is a regular file");
    }

    #[test]
    fn socket_addresses_parse() {
        assert_eq!(parse_sockaddr("[::1]:443").map(|b| b.len()), Some(28));
        assert!(parse_sockaddr("not an address").is_none());
        let unix = parse_sockaddr("/run/x.sock").unwrap();
        assert_eq!(&unix[2..], b"/run/x.sock\0");
    }

    #[test]
    fn is_socket_agrees_with_fstat() {
        let (a, _b) = std::os::unix::net::UnixStream::pair().unwrap();
        assert!(crate::analysers::socket::is_socket(a.as_raw_fd()));
    }
}
