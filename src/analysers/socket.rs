/*============================================================
  Synavera Project: Explain
  Module: explain_core::analysers::socket
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Socket causes: not a socket, address family and protocol
    mismatches, connection state errors.

  Security / Safety Notes:
    getsockopt(SO_TYPE/SO_DOMAIN) and fstat probes only.

  Dependencies:
    probe, render::socket, render::file_type.

  Operational Scope:
    socket/bind/connect/listen/accept/setsockopt/shutdown.

  Revision History:
    2026-10-18 COD  Authored socket analysers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - The socket's own domain and type are quoted when known
============================================================*/

use std::fmt::Write;
use std::os::raw::c_int;

use crate::probe::{self, ErrnoGuard};
use crate::render::file_type::file_type_st;
use crate::render::socket::{domain, socket_type};
use crate::string_buffer::StringBuffer;

fn sockopt_int(fildes: c_int, name: c_int) -> Option<c_int> {
    let _guard = ErrnoGuard::new();
    let mut value: c_int = 0;
    let mut len = std::mem::size_of::<c_int>() as libc::socklen_t;
    // SAFETY: value and len are valid out-parameters of the declared size.
    let rc = unsafe {
        libc::getsockopt(
            fildes,
            libc::SOL_SOCKET,
            name,
            &mut value as *mut c_int as *mut libc::c_void,
            &mut len,
        )
    };
    (rc == 0).then_some(value)
}

/// Address family of an open socket.
pub fn socket_domain(fildes: c_int) -> Option<c_int> {
    sockopt_int(fildes, libc::SO_DOMAIN)
}

/// SOCK_* type of an open socket.
pub fn socket_kind(fildes: c_int) -> Option<c_int> {
    sockopt_int(fildes, libc::SO_TYPE)
}

/// Whether `listen(2)` has been called on the socket.
pub fn is_listening(fildes: c_int) -> Option<bool> {
    sockopt_int(fildes, libc::SO_ACCEPTCONN).map(|v| v != 0)
}

/// Whether `fildes` refers to a socket.
pub fn is_socket(fildes: c_int) -> bool {
    probe::fstat(fildes).is_ok_and(|st| st.st_mode & libc::S_IFMT == libc::S_IFSOCK)
}

/// The descriptor is open but is not a socket.
pub fn enotsock(sb: &mut StringBuffer, fildes: c_int, caption: &str) {
    let _ = write!(sb, "the {caption} argument does not refer to a socket");
    if let Ok(st) = probe::fstat(fildes) {
        sb.puts(", it is a ");
        file_type_st(sb, &st);
    }
}

pub fn eaddrinuse(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(sb, "the {caption} argument is already in use by another socket");
}

pub fn eaddrnotavail(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(
        sb,
        "the {caption} argument does not refer to an interface or address available on the local machine"
    );
}

/// The address family in the argument does not match the socket.
pub fn eafnosupport(sb: &mut StringBuffer, fildes: c_int, caption: &str, family: Option<c_int>) {
    let _ = write!(sb, "the {caption} argument ");
    if let Some(family) = family {
        sb.putc('(');
        domain(sb, family);
        sb.puts(") ");
    }
    sb.puts("is not a valid address for the address family of the socket");
    if let Some(own) = socket_domain(fildes) {
        sb.puts(" (");
        domain(sb, own);
        sb.putc(')');
    }
}

pub fn econnrefused(sb: &mut StringBuffer) {
    sb.puts("no one is listening on the remote address");
}

pub fn eisconn(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(sb, "the {caption} argument refers to a socket that is already connected");
}

pub fn enotconn(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(sb, "the {caption} argument refers to a socket that is not connected");
}

pub fn enetunreach(sb: &mut StringBuffer) {
    sb.puts("the network of the remote address is not reachable from this host");
}

pub fn etimedout(sb: &mut StringBuffer) {
    sb.puts(
        "the timeout expired while attempting the connection, the server may be too busy to accept new \
         connections, or a firewall may be discarding the packets",
    );
}

pub fn einprogress(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(
        sb,
        "the {caption} argument refers to a non-blocking socket and the connection cannot be completed immediately"
    );
}

pub fn ealready(sb: &mut StringBuffer, caption: &str) {
    let _ = write!(
        sb,
        "the {caption} argument refers to a non-blocking socket and a previous connection attempt has not yet \
         been completed"
    );
}

/// The operation does not apply to this type of socket.
pub fn eopnotsupp(sb: &mut StringBuffer, fildes: c_int, caption: &str, call: &str) {
    let _ = write!(sb, "the {caption} argument refers to a socket type that does not support the {call} call");
    if let Some(kind) = socket_kind(fildes) {
        sb.puts(" (");
        socket_type(sb, kind);
        sb.putc(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use std::os::unix::io::AsRawFd;

    #[test]
    fn a_regular_file_is_not_a_socket() {
        let file = tempfile::tempfile().unwrap();
        let mut sb = StringBuffer::new(256, Options::default());
        enotsock(&mut sb, file.as_raw_fd(), "fildes");
        assert_eq!(sb.as_str(), "the fildes argument does not refer to a socket, it is a regular file");
    }

    #[test]
    fn unix_socket_attributes() {
        let (a, _b) = std::os::unix::net::UnixStream::pair().unwrap();
        assert!(is_socket(a.as_raw_fd()));
        assert_eq!(socket_domain(a.as_raw_fd()), Some(libc::AF_UNIX));
        assert_eq!(socket_kind(a.as_raw_fd()), Some(libc::SOCK_STREAM));
    }
}
