/*============================================================
  Synavera Project: Explain
  Module: explain_core::errno_info
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Name, number and description of every Linux error number,
    plus the strerror-style rendering used in assembled
    messages.

  Security / Safety Notes:
    Static data only.

  Dependencies:
    libc for the numeric values.

  Operational Scope:
    Used by the explanation assembler, the generic analyser
    and the CLI errno argument parser.

  Revision History:
    2026-10-18 COD  Established errno table.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Single table as source of truth
    - Stable descriptions independent of the C library locale
============================================================*/

use std::fmt::Write;
use std::os::raw::c_int;

use crate::string_buffer::StringBuffer;

/// One row of the errno table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrnoInfo {
    pub number: c_int,
    pub name: &'static str,
    pub description: &'static str,
}

macro_rules! errno {
    ($name:ident, $text:literal) => {
        ErrnoInfo {
            number: libc::$name,
            name: stringify!($name),
            description: $text,
        }
    };
}

static TABLE: &[ErrnoInfo] = &[
    errno!(EPERM, "Operation not permitted"),
    errno!(ENOENT, "No such file or directory"),
    errno!(ESRCH, "No such process"),
    errno!(EINTR, "Interrupted system call"),
    errno!(EIO, "Input/output error"),
    errno!(ENXIO, "No such device or address"),
    errno!(E2BIG, "Argument list too long"),
    errno!(ENOEXEC, "Exec format error"),
    errno!(EBADF, "Bad file descriptor"),
    errno!(ECHILD, "No child processes"),
    errno!(EAGAIN, "Resource temporarily unavailable"),
    errno!(ENOMEM, "Cannot allocate memory"),
    errno!(EACCES, "Permission denied"),
    errno!(EFAULT, "Bad address"),
    errno!(ENOTBLK, "Block device required"),
    errno!(EBUSY, "Device or resource busy"),
    errno!(EEXIST, "File exists"),
    errno!(EXDEV, "Invalid cross-device link"),
    errno!(ENODEV, "No such device"),
    errno!(ENOTDIR, "Not a directory"),
    errno!(EISDIR, "Is a directory"),
    errno!(EINVAL, "Invalid argument"),
    errno!(ENFILE, "Too many open files in system"),
    errno!(EMFILE, "Too many open files"),
    errno!(ENOTTY, "Inappropriate ioctl for device"),
    errno!(ETXTBSY, "Text file busy"),
    errno!(EFBIG, "File too large"),
    errno!(ENOSPC, "No space left on device"),
    errno!(ESPIPE, "Illegal seek"),
    errno!(EROFS, "Read-only file system"),
    errno!(EMLINK, "Too many links"),
    errno!(EPIPE, "Broken pipe"),
    errno!(EDOM, "Numerical argument out of domain"),
    errno!(ERANGE, "Numerical result out of range"),
    errno!(EDEADLK, "Resource deadlock avoided"),
    errno!(ENAMETOOLONG, "File name too long"),
    errno!(ENOLCK, "No locks available"),
    errno!(ENOSYS, "Function not implemented"),
    errno!(ENOTEMPTY, "Directory not empty"),
    errno!(ELOOP, "Too many levels of symbolic links"),
    errno!(ENOMSG, "No message of desired type"),
    errno!(EIDRM, "Identifier removed"),
    errno!(ECHRNG, "Channel number out of range"),
    errno!(EL2NSYNC, "Level 2 not synchronized"),
    errno!(EL3HLT, "Level 3 halted"),
    errno!(EL3RST, "Level 3 reset"),
    errno!(ELNRNG, "Link number out of range"),
    errno!(EUNATCH, "Protocol driver not attached"),
    errno!(ENOCSI, "No CSI structure available"),
    errno!(EL2HLT, "Level 2 halted"),
    errno!(EBADE, "Invalid exchange"),
    errno!(EBADR, "Invalid request descriptor"),
    errno!(EXFULL, "Exchange full"),
    errno!(ENOANO, "No anode"),
    errno!(EBADRQC, "Invalid request code"),
    errno!(EBADSLT, "Invalid slot"),
    errno!(EBFONT, "Bad font file format"),
    errno!(ENOSTR, "Device not a stream"),
    errno!(ENODATA, "No data available"),
    errno!(ETIME, "Timer expired"),
    errno!(ENOSR, "Out of streams resources"),
    errno!(ENONET, "Machine is not on the network"),
    errno!(ENOPKG, "Package not installed"),
    errno!(EREMOTE, "Object is remote"),
    errno!(ENOLINK, "Link has been severed"),
    errno!(EADV, "Advertise error"),
    errno!(ESRMNT, "Srmount error"),
    errno!(ECOMM, "Communication error on send"),
    errno!(EPROTO, "Protocol error"),
    errno!(EMULTIHOP, "Multihop attempted"),
    errno!(EDOTDOT, "RFS specific error"),
    errno!(EBADMSG, "Bad message"),
    errno!(EOVERFLOW, "Value too large for defined data type"),
    errno!(ENOTUNIQ, "Name not unique on network"),
    errno!(EBADFD, "File descriptor in bad state"),
    errno!(EREMCHG, "Remote address changed"),
    errno!(ELIBACC, "Can not access a needed shared library"),
    errno!(ELIBBAD, "Accessing a corrupted shared library"),
    errno!(ELIBSCN, ".lib section in a.out corrupted"),
    errno!(ELIBMAX, "Attempting to link in too many shared libraries"),
    errno!(ELIBEXEC, "Cannot exec a shared library directly"),
    errno!(EILSEQ, "Invalid or incomplete multibyte or wide character"),
    errno!(ERESTART, "Interrupted system call should be restarted"),
    errno!(ESTRPIPE, "Streams pipe error"),
    errno!(EUSERS, "Too many users"),
    errno!(ENOTSOCK, "Socket operation on non-socket"),
    errno!(EDESTADDRREQ, "Destination address required"),
    errno!(EMSGSIZE, "Message too long"),
    errno!(EPROTOTYPE, "Protocol wrong type for socket"),
    errno!(ENOPROTOOPT, "Protocol not available"),
    errno!(EPROTONOSUPPORT, "Protocol not supported"),
    errno!(ESOCKTNOSUPPORT, "Socket type not supported"),
    errno!(EOPNOTSUPP, "Operation not supported"),
    errno!(EPFNOSUPPORT, "Protocol family not supported"),
    errno!(EAFNOSUPPORT, "Address family not supported by protocol"),
    errno!(EADDRINUSE, "Address already in use"),
    errno!(EADDRNOTAVAIL, "Cannot assign requested address"),
    errno!(ENETDOWN, "Network is down"),
    errno!(ENETUNREACH, "Network is unreachable"),
    errno!(ENETRESET, "Network dropped connection on reset"),
    errno!(ECONNABORTED, "Software caused connection abort"),
    errno!(ECONNRESET, "Connection reset by peer"),
    errno!(ENOBUFS, "No buffer space available"),
    errno!(EISCONN, "Transport endpoint is already connected"),
    errno!(ENOTCONN, "Transport endpoint is not connected"),
    errno!(ESHUTDOWN, "Cannot send after transport endpoint shutdown"),
    errno!(ETOOMANYREFS, "Too many references: cannot splice"),
    errno!(ETIMEDOUT, "Connection timed out"),
    errno!(ECONNREFUSED, "Connection refused"),
    errno!(EHOSTDOWN, "Host is down"),
    errno!(EHOSTUNREACH, "No route to host"),
    errno!(EALREADY, "Operation already in progress"),
    errno!(EINPROGRESS, "Operation now in progress"),
    errno!(ESTALE, "Stale file handle"),
    errno!(EUCLEAN, "Structure needs cleaning"),
    errno!(ENOTNAM, "Not a XENIX named type file"),
    errno!(ENAVAIL, "No XENIX semaphores available"),
    errno!(EISNAM, "Is a named type file"),
    errno!(EREMOTEIO, "Remote I/O error"),
    errno!(EDQUOT, "Disk quota exceeded"),
    errno!(ENOMEDIUM, "No medium found"),
    errno!(EMEDIUMTYPE, "Wrong medium type"),
    errno!(ECANCELED, "Operation canceled"),
    errno!(ENOKEY, "Required key not available"),
    errno!(EKEYEXPIRED, "Key has expired"),
    errno!(EKEYREVOKED, "Key has been revoked"),
    errno!(EKEYREJECTED, "Key was rejected by service"),
    errno!(EOWNERDEAD, "Owner died"),
    errno!(ENOTRECOVERABLE, "State not recoverable"),
    errno!(ERFKILL, "Operation not possible due to RF-kill"),
    errno!(EHWPOISON, "Memory page has hardware error"),
    // Aliases come after the canonical spelling so lookups by number
    // find the canonical name first.
    errno!(EWOULDBLOCK, "Resource temporarily unavailable"),
    errno!(EDEADLOCK, "Resource deadlock avoided"),
    errno!(ENOTSUP, "Operation not supported"),
];

/// Look up an error number.
pub fn find_by_number(number: c_int) -> Option<&'static ErrnoInfo> {
    TABLE.iter().find(|info| info.number == number)
}

/// Look up a symbolic name such as `ENOENT`; case insensitive.
pub fn find_by_name(name: &str) -> Option<&'static ErrnoInfo> {
    TABLE.iter().find(|info| info.name.eq_ignore_ascii_case(name))
}

/// Closest symbolic name to `name`, for error suggestions.
pub fn suggest_name(name: &str) -> Option<&'static str> {
    crate::fstrcmp::best_match(name, TABLE.iter().map(|info| info.name))
}

/// Every known entry, canonical names first.
pub fn all() -> &'static [ErrnoInfo] {
    TABLE
}

/// Description text for `number`, as strerror would report it.
pub fn strerror(number: c_int) -> String {
    match find_by_number(number) {
        Some(info) => info.description.to_string(),
        None if number == 0 => "Success".to_string(),
        None => format!("Unknown error {number}"),
    }
}

/// Symbolic name for `number`, if known.
pub fn name_of(number: c_int) -> Option<&'static str> {
    find_by_number(number).map(|info| info.name)
}

/// Write the strerror text, adding `(N, ENAME)` when the
/// numeric-errno option is on.
pub fn print_strerror(sb: &mut StringBuffer, number: c_int) {
    sb.puts(&strerror(number));
    if sb.options().numeric_errno {
        let _ = write!(sb, " ({number}");
        if let Some(name) = name_of(number) {
            let _ = write!(sb, ", {name}");
        }
        sb.putc(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn canonical_names_win_for_aliases() {
        assert_eq!(name_of(libc::EAGAIN), Some("EAGAIN"));
        assert_eq!(name_of(libc::EOPNOTSUPP), Some("EOPNOTSUPP"));
        assert_eq!(find_by_name("ewouldblock").map(|i| i.number), Some(libc::EAGAIN));
    }

    #[test]
    fn descriptions_match_the_c_library() {
        assert_eq!(strerror(libc::ENOENT), "No such file or directory");
        assert_eq!(strerror(libc::ELOOP), "Too many levels of symbolic links");
        assert_eq!(strerror(0), "Success");
        assert_eq!(strerror(9999), "Unknown error 9999");
    }

    #[test]
    fn numeric_errno_option_controls_suffix() {
        let mut with = StringBuffer::new(128, Options::default());
        print_strerror(&mut with, libc::ENOENT);
        assert_eq!(with.as_str(), "No such file or directory (2, ENOENT)");

        let options = Options {
            numeric_errno: false,
            ..Options::default()
        };
        let mut without = StringBuffer::new(128, options);
        print_strerror(&mut without, libc::ENOENT);
        assert_eq!(without.as_str(), "No such file or directory");
    }

    #[test]
    fn suggestions_for_misspelled_names() {
        assert_eq!(suggest_name("ENOENTT"), Some("ENOENT"));
    }
}
