/*============================================================
  Synavera Project: Explain
  Module: explain_core::calls::memory
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Explainers for heap allocation and memory mapping:
    malloc, calloc, realloc, mmap and munmap.

  Security / Safety Notes:
    Never touches the memory being described; alignment and
    limits are checked arithmetically.

  Dependencies:
    analysers::memory, render::memory, mount.

  Operational Scope:
    The memory section of the call registry.

  Revision History:
    2026-10-18 COD  Authored allocation and mapping explainers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Requested sizes are quoted against the limit they broke
============================================================*/

use std::fmt::Write;
use std::os::raw::{c_int, c_void};

use super::{Args, CallEntry, Echo, Explainer};
use crate::analysers::fildes::{ebadf, is_open_for_reading, is_open_for_writing, not_open_for_reading};
use crate::analysers::limits::rlimit_value;
use crate::analysers::{self, enomem_user, generic, software_error};
use crate::error::Result;
use crate::mount;
use crate::probe;
use crate::render::file_type::file_type_st;
use crate::render::memory::{map_flags, parse_map_flags, parse_prot, prot};
use crate::render::pointer::{pointer, size};
use crate::string_buffer::StringBuffer;

const MAP_TYPE_MASK: c_int = 0x0f;

fn is_aligned(value: u64) -> bool {
    value % probe::page_size() as u64 == 0
}

fn page_size_note(sb: &mut StringBuffer) {
    if sb.options().dialect_specific {
        let _ = write!(sb, " (page size is {})", probe::page_size());
    }
}

/// malloc, and the size half of calloc.
pub struct Malloc {
    pub size: usize,
}

impl Explainer for Malloc {
    fn name(&self) -> &'static str {
        "malloc"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "malloc").arg("size", |sb| size(sb, self.size)).finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::ENOMEM => enomem_user(sb, self.size as u64),
            _ => generic(sb, errnum, "malloc"),
        }
    }
}

pub struct Calloc {
    pub nmemb: usize,
    pub size: usize,
}

impl Explainer for Calloc {
    fn name(&self) -> &'static str {
        "calloc"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "calloc")
            .arg("nmemb", |sb| size(sb, self.nmemb))
            .arg("size", |sb| size(sb, self.size))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        if errnum != libc::ENOMEM {
            return generic(sb, errnum, "calloc");
        }
        match self.nmemb.checked_mul(self.size) {
            Some(total) => enomem_user(sb, total as u64),
            None => {
                sb.puts("the product of the nmemb and size arguments overflows the address space");
                software_error(sb);
            }
        }
    }
}

pub struct Realloc {
    pub ptr: *const c_void,
    pub size: usize,
}

impl Explainer for Realloc {
    fn name(&self) -> &'static str {
        "realloc"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "realloc")
            .pointer("ptr", self.ptr)
            .arg("size", |sb| size(sb, self.size))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::ENOMEM => {
                enomem_user(sb, self.size as u64);
                if !self.ptr.is_null() {
                    sb.footnote_str("the original block is left untouched");
                }
            }
            _ => generic(sb, errnum, "realloc"),
        }
    }
}

pub struct Mmap {
    pub addr: *const c_void,
    pub length: usize,
    pub prot: c_int,
    pub flags: c_int,
    pub fildes: c_int,
    pub offset: i64,
}

impl Mmap {
    fn anonymous(&self) -> bool {
        self.flags & libc::MAP_ANONYMOUS != 0
    }

    fn einval(&self, sb: &mut StringBuffer) {
        if self.length == 0 {
            sb.puts("the length argument is zero");
        } else if !matches!(self.flags & MAP_TYPE_MASK, libc::MAP_SHARED | libc::MAP_PRIVATE | 0x03) {
            sb.puts("the flags argument contains neither MAP_PRIVATE nor MAP_SHARED, or contains both");
        } else if self.flags & libc::MAP_FIXED != 0 && !is_aligned(self.addr as u64) {
            sb.puts("the addr argument is not aligned to a page boundary and MAP_FIXED was requested");
            page_size_note(sb);
        } else if !self.anonymous() && !is_aligned(self.offset as u64) {
            sb.puts("the offset argument is not a multiple of the page size");
            page_size_note(sb);
        } else {
            sb.puts("the addr, length or offset argument is too large or not page aligned");
        }
        software_error(sb);
    }

    fn eacces(&self, sb: &mut StringBuffer) {
        let st = match probe::fstat(self.fildes) {
            Ok(st) => st,
            Err(_) => return ebadf(sb, self.fildes, "fildes"),
        };
        let kind = st.st_mode & libc::S_IFMT;
        if kind != libc::S_IFREG && kind != libc::S_IFCHR && kind != libc::S_IFBLK {
            sb.puts("the fildes argument refers to a ");
            file_type_st(sb, &st);
            sb.puts(", a regular file or device was expected");
            return;
        }
        if is_open_for_reading(self.fildes) == Some(false) {
            return not_open_for_reading(sb, self.fildes, "fildes");
        }
        let shared = self.flags & MAP_TYPE_MASK != libc::MAP_PRIVATE;
        if shared && self.prot & libc::PROT_WRITE != 0 && is_open_for_writing(self.fildes) == Some(false) {
            sb.puts("MAP_SHARED was requested with PROT_WRITE, but the fildes argument is not open for writing");
            return;
        }
        let append = probe::file_status_flags(self.fildes).is_some_and(|f| f & libc::O_APPEND != 0);
        if self.prot & libc::PROT_WRITE != 0 && append {
            sb.puts("PROT_WRITE was requested, but the file is open in append-only mode");
            return;
        }
        sb.puts("the fildes argument is not suitable for the requested mapping");
    }

    fn enomem(&self, sb: &mut StringBuffer) {
        let count = std::fs::read_to_string("/proc/self/maps").map(|m| m.lines().count()).ok();
        let maximum = std::fs::read_to_string("/proc/sys/vm/max_map_count")
            .ok()
            .and_then(|text| text.trim().parse::<usize>().ok());
        if let (Some(count), Some(maximum)) = (count, maximum) {
            if count >= maximum {
                sb.puts("the process's maximum number of mappings would have been exceeded");
                if sb.options().dialect_specific {
                    let _ = write!(sb, " ({maximum})");
                }
                return;
            }
        }
        if self.flags & libc::MAP_FIXED != 0 && !self.addr.is_null() {
            sb.puts("the addr argument exceeds the virtual address space of the CPU");
            return;
        }
        enomem_user(sb, self.length as u64);
    }

    fn fildes_path(&self) -> Option<Vec<u8>> {
        use std::os::unix::ffi::OsStrExt;
        probe::fildes_to_path(self.fildes).map(|p| p.as_os_str().as_bytes().to_vec())
    }
}

impl Explainer for Mmap {
    fn name(&self) -> &'static str {
        "mmap"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        let echo = Echo::new(sb, "mmap")
            .pointer("addr", self.addr)
            .arg("length", |sb| size(sb, self.length))
            .arg("prot", |sb| prot(sb, self.prot))
            .arg("flags", |sb| map_flags(sb, self.flags));
        if self.anonymous() && self.fildes == -1 {
            echo.value("fildes", -1).value("offset", self.offset).finish();
        } else {
            echo.fildes("fildes", self.fildes).value("offset", self.offset).finish();
        }
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EACCES => self.eacces(sb),
            libc::EAGAIN => {
                sb.puts("the file has been locked, or too much memory has been locked");
                rlimit_value(sb, "RLIMIT_MEMLOCK", libc::RLIMIT_MEMLOCK);
            }
            libc::EBADF => {
                ebadf(sb, self.fildes, "fildes");
                if !self.anonymous() {
                    sb.footnote_str("MAP_ANONYMOUS was not set");
                }
            }
            libc::EINVAL => self.einval(sb),
            libc::ENFILE => analysers::enfile(sb),
            libc::ENODEV => {
                sb.puts("the underlying file system of the specified file does not support memory mapping");
                if let Some(path) = self.fildes_path() {
                    mount::mount_point(sb, &path);
                }
            }
            libc::ENOMEM => self.enomem(sb),
            libc::EOVERFLOW => sb.puts("the number of pages used for length plus number of pages used for offset would overflow"),
            libc::EPERM => {
                if self.prot & libc::PROT_EXEC != 0 && self.fildes_path().is_some_and(|p| mount::is_noexec(&p)) {
                    sb.puts("the prot argument asks for PROT_EXEC but the mapped area belongs to a file on a file system that was mounted noexec");
                    if let Some(path) = self.fildes_path() {
                        mount::mount_point(sb, &path);
                    }
                } else {
                    sb.puts("the operation was prevented by a file seal");
                }
            }
            libc::ETXTBSY => sb.puts("MAP_DENYWRITE was set but the object specified by fildes is open for writing"),
            _ => generic(sb, errnum, "mmap"),
        }
    }
}

pub struct Munmap {
    pub addr: *const c_void,
    pub length: usize,
}

impl Explainer for Munmap {
    fn name(&self) -> &'static str {
        "munmap"
    }

    fn render_call(&self, sb: &mut StringBuffer, _errnum: c_int) {
        Echo::new(sb, "munmap")
            .pointer("addr", self.addr)
            .arg("length", |sb| size(sb, self.length))
            .finish();
    }

    fn render_cause(&self, sb: &mut StringBuffer, errnum: c_int) {
        match errnum {
            libc::EINVAL => {
                if self.length == 0 {
                    sb.puts("the length argument is zero");
                } else if !is_aligned(self.addr as u64) {
                    sb.puts("the addr argument is not a multiple of the page size");
                    page_size_note(sb);
                } else {
                    sb.puts("the addr and length arguments describe a range outside the process's address space");
                }
                software_error(sb);
            }
            libc::ENOMEM => {
                sb.puts("unmapping part of a region would have split it, exceeding the process's maximum number of mappings");
            }
            _ => generic(sb, errnum, "munmap"),
        }
    }
}

fn parse_malloc(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    Ok(Box::new(Malloc { size: args.size("size")? }))
}

fn parse_calloc(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let nmemb = args.size("nmemb")?;
    let size = args.size("size")?;
    Ok(Box::new(Calloc { nmemb, size }))
}

fn parse_realloc(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let ptr = args.buffer("ptr")? as *const c_void;
    let size = args.size("size")?;
    Ok(Box::new(Realloc { ptr, size }))
}

fn parse_mmap(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let addr = args.buffer("addr")? as *const c_void;
    let length = args.size("length")?;
    let prot = args.parsed("prot", parse_prot)?;
    let flags = args.parsed("flags", parse_map_flags)?;
    let fildes = if args.has_more() { args.fildes("fildes")? } else { -1 };
    let offset = if args.has_more() { args.long("offset")? } else { 0 };
    Ok(Box::new(Mmap {
        addr,
        length,
        prot,
        flags,
        fildes,
        offset,
    }))
}

fn parse_munmap(args: &mut Args<'_>) -> Result<Box<dyn Explainer>> {
    let addr = args.buffer("addr")? as *const c_void;
    let length = args.size("length")?;
    Ok(Box::new(Munmap { addr, length }))
}

pub(crate) static CALLS: [CallEntry; 5] = [
    CallEntry {
        name: "malloc",
        synopsis: "size",
        errnos: &[libc::ENOMEM],
        sample: &["1099511627776"],
        parse: parse_malloc,
    },
    CallEntry {
        name: "calloc",
        synopsis: "nmemb size",
        errnos: &[libc::ENOMEM],
        sample: &["1024", "1073741824"],
        parse: parse_calloc,
    },
    CallEntry {
        name: "realloc",
        synopsis: "ptr size",
        errnos: &[libc::ENOMEM],
        sample: &["NULL", "1099511627776"],
        parse: parse_realloc,
    },
    CallEntry {
        name: "mmap",
        synopsis: "addr length prot flags [fildes [offset]]",
        errnos: &[
            libc::EACCES,
            libc::EAGAIN,
            libc::EBADF,
            libc::EINVAL,
            libc::ENFILE,
            libc::ENODEV,
            libc::ENOMEM,
            libc::EOVERFLOW,
            libc::EPERM,
            libc::ETXTBSY,
        ],
        sample: &["NULL", "4096", "PROT_READ", "MAP_PRIVATE | MAP_ANONYMOUS"],
        parse: parse_mmap,
    },
    CallEntry {
        name: "munmap",
        synopsis: "addr length",
        errnos: &[libc::EINVAL, libc::ENOMEM],
        sample: &["@0x1001", "4096"],
        parse: parse_munmap,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn explain(explainer: &dyn Explainer, errnum: c_int) -> (String, String) {
        let mut call = StringBuffer::new(1024, Options::default());
        explainer.render_call(&mut call, errnum);
        let mut cause = StringBuffer::with_footnotes(4096, Options::default());
        explainer.render_cause(&mut cause, errnum);
        let notes = cause.footnotes().map(|n| n.as_str().to_string()).unwrap_or_default();
        (call.as_str().to_string(), format!("{}{}", cause.as_str(), notes))
    }

    #[test]
    fn calloc_overflow_is_a_software_error() {
        let calloc = Calloc {
            nmemb: usize::MAX,
            size: 2,
        };
        let (_, cause) = explain(&calloc, libc::ENOMEM);
        assert!(cause.starts_with("the product of the nmemb and size arguments overflows"), "{cause}");
        assert!(cause.contains("software error"), "{cause}");
    }

    #[test]
    fn anonymous_mapping_echo() {
        let mmap = Mmap {
            addr: std::ptr::null(),
            length: 4096,
            prot: libc::PROT_READ | libc::PROT_WRITE,
            flags: libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            fildes: -1,
            offset: 0,
        };
        let (call, _) = explain(&mmap, libc::ENOMEM);
        assert_eq!(
            call,
            "mmap(addr = NULL, length = 4096, prot = PROT_READ | PROT_WRITE, \
             flags = MAP_PRIVATE | MAP_ANONYMOUS, fildes = -1, offset = 0)"
        );
    }

    #[test]
    fn mmap_einval_reasons() {
        let mut mmap = Mmap {
            addr: std::ptr::null(),
            length: 0,
            prot: libc::PROT_READ,
            flags: libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            fildes: -1,
            offset: 0,
        };
        let (_, cause) = explain(&mmap, libc::EINVAL);
        assert!(cause.starts_with("the length argument is zero"), "{cause}");

        mmap.length = 4096;
        mmap.flags = libc::MAP_ANONYMOUS;
        let (_, cause) = explain(&mmap, libc::EINVAL);
        assert!(cause.starts_with("the flags argument contains neither MAP_PRIVATE nor MAP_SHARED"), "{cause}");
    }

    #[test]
    fn mmap_of_a_write_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = std::fs::File::create(dir.path().join("data")).unwrap();
        use std::os::fd::AsRawFd;
        let mmap = Mmap {
            addr: std::ptr::null(),
            length: 4096,
            prot: libc::PROT_READ,
            flags: libc::MAP_SHARED,
            fildes: file.as_raw_fd(),
            offset: 0,
        };
        let (_, cause) = explain(&mmap, libc::EACCES);
        assert!(cause.starts_with("the fildes argument is not open for reading, it was opened O_WRONLY"), "{cause}");
    }

    #[test]
    fn munmap_misaligned_address() {
        let munmap = Munmap {
            addr: 0x1001 as *const c_void,
            length: 4096,
        };
        let (call, cause) = explain(&munmap, libc::EINVAL);
        assert_eq!(call, "munmap(addr = 0x1001, length = 4096)");
        assert!(cause.starts_with("the addr argument is not a multiple of the page size"), "{cause}");
    }
}
