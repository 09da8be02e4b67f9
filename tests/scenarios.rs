//! End-to-end explanations through the public library surface.

use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::os::unix::io::AsRawFd;

use explain_core::calls::directory::Mkdir;
use explain_core::calls::file_io::{Open, WriteCall};
use explain_core::ioctl::Ioctl;
use explain_core::{because, message_into, message_with_options, Options};

fn options() -> Options {
    Options {
        numeric_errno: true,
        dialect_specific: true,
        ..Options::default()
    }
}

#[test]
fn opening_a_nonexistent_file() {
    let path = CString::new("/no/such/file").unwrap();
    let open = Open {
        pathname: path.as_ptr(),
        flags: libc::O_RDONLY,
        mode: 0,
    };
    let text = message_with_options(&open, libc::ENOENT, options());
    assert!(
        text.starts_with(
            "open(pathname = \"/no/such/file\", flags = O_RDONLY) failed, No such file or directory (2, ENOENT), because "
        ),
        "{text}"
    );
    assert!(text.contains("there is no \"no\" directory in the pathname \"/\" directory"), "{text}");
}

/// A descriptor number that was open a moment ago and is now closed.
fn closed_descriptor() -> i32 {
    let file = std::fs::File::open("/dev/null").unwrap();
    // SAFETY: F_DUPFD duplicates a descriptor we own; the copy is closed at once.
    unsafe {
        let fd = libc::fcntl(file.as_raw_fd(), libc::F_DUPFD, 200);
        assert!(fd >= 200);
        libc::close(fd);
        fd
    }
}

#[test]
fn writing_to_a_closed_descriptor() {
    let fildes = closed_descriptor();
    let data = [0u8; 1];
    let write = WriteCall {
        fildes,
        data: data.as_ptr() as *const c_void,
        data_size: 1,
    };
    let text = message_with_options(&write, libc::EBADF, options());
    assert!(text.starts_with(&format!("write(fildes = {fildes}, data = 0x")), "{text}");
    assert!(text.contains("Bad file descriptor (9, EBADF), because "), "{text}");
    assert!(text.contains(&format!("({fildes}) does not refer to an open file")), "{text}");
    assert!(text.contains("software error"), "{text}");
}

#[test]
fn making_a_directory_that_exists() {
    let path = CString::new("/tmp").unwrap();
    let mkdir = Mkdir {
        pathname: path.as_ptr(),
        mode: 0o755,
    };
    let text = message_with_options(&mkdir, libc::EEXIST, options());
    assert!(text.starts_with("mkdir(pathname = \"/tmp\", mode = 0755) failed, File exists"), "{text}");
    assert!(text.contains("there is already a \"tmp\" directory in the pathname \"/\" directory"), "{text}");
}

#[test]
fn too_many_open_files_cites_the_limit() {
    let path = CString::new("/etc/passwd").unwrap();
    let open = Open {
        pathname: path.as_ptr(),
        flags: libc::O_RDONLY,
        mode: 0,
    };
    let text = message_with_options(&open, libc::EMFILE, options());
    assert!(text.contains("maximum number of file descriptors open"), "{text}");
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: getrlimit writes into the struct we own.
    assert_eq!(unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) }, 0);
    assert!(text.contains(&format!("(RLIMIT_NOFILE is {})", limit.rlim_cur)), "{text}");

    let terse = Options {
        dialect_specific: false,
        ..options()
    };
    let text = message_with_options(&open, libc::EMFILE, terse);
    assert!(!text.contains("RLIMIT_NOFILE"), "{text}");
}

#[test]
fn unknown_ioctl_request_on_a_character_device() {
    let null = std::fs::File::open("/dev/null").unwrap();
    let ioctl = Ioctl {
        fildes: null.as_raw_fd(),
        request: 0xDEAD_BEEF,
        data: 0x1000 as *const c_void,
    };
    let text = message_with_options(&ioctl, libc::EINVAL, options());
    assert!(text.contains("request = 0xDEADBEEF, data = 0x1000) failed, Invalid argument"), "{text}");
    assert!(text.ends_with("because the ioctl request or the ioctl data is not valid"), "{text}");
}

#[test]
fn terminal_request_on_a_regular_file() {
    let file = tempfile::tempfile().unwrap();
    let data = [0u8; 64];
    let ioctl = Ioctl {
        fildes: file.as_raw_fd(),
        request: libc::TCGETS as u64,
        data: data.as_ptr() as *const c_void,
    };
    let text = message_with_options(&ioctl, libc::ENOTTY, options());
    assert!(text.contains("request = TCGETS"), "{text}");
    assert!(
        text.ends_with("because the fildes argument does not refer to a terminal, it is a regular file"),
        "{text}"
    );
}

#[test]
fn because_clause_alone() {
    let path = CString::new("/tmp").unwrap();
    let mkdir = Mkdir {
        pathname: path.as_ptr(),
        mode: 0o755,
    };
    let text = because(&mkdir, libc::EEXIST);
    assert!(text.starts_with("there is already a \"tmp\" directory"), "{text}");
}

#[test]
fn invalid_pointers_are_shown_not_followed() {
    let open = Open {
        pathname: 0x10 as *const c_char,
        flags: libc::O_RDONLY,
        mode: 0,
    };
    let text = message_with_options(&open, libc::EFAULT, options());
    assert!(text.contains("pathname = 0x10"), "{text}");

    let open = Open {
        pathname: std::ptr::null(),
        ..open
    };
    let text = message_with_options(&open, libc::EFAULT, options());
    assert!(text.contains("pathname = NULL"), "{text}");
}

#[test]
fn overlong_pathname_keeps_its_cause() {
    let path = CString::new(format!("/{}", "d/".repeat(2500))).unwrap();
    let open = Open {
        pathname: path.as_ptr(),
        flags: libc::O_RDONLY,
        mode: 0,
    };
    let text = message_with_options(&open, libc::ENAMETOOLONG, options());
    assert!(text.contains("\"... (5001 bytes), flags = O_RDONLY) failed"), "{text}");
    let (_, cause) = text.split_once(", because ").expect("cause present");
    assert!(cause.starts_with("pathname exceeds the system maximum path length"), "{text}");
}

#[test]
fn caller_buffers_bound_the_output() {
    let path = CString::new("/no/such/file").unwrap();
    let open = Open {
        pathname: path.as_ptr(),
        flags: libc::O_RDONLY,
        mode: 0,
    };
    for size in [0usize, 1, 2, 5, 17, 64, 100, 160, 1000] {
        let mut buffer = vec![0xffu8; size];
        let written = message_into(&mut buffer, &open, libc::ENOENT);
        if size == 0 {
            assert_eq!(written, 0);
            continue;
        }
        assert!(written < size, "{written} >= {size}");
        assert_eq!(buffer[written], 0);
        assert!(std::str::from_utf8(&buffer[..written]).is_ok());
    }
}
