//! Properties that hold across the whole call registry.

use explain_core::calls::{self, registry};
use explain_core::parse_bits::{self, BitsTable};
use explain_core::probe;
use explain_core::render::{memory, mode, open_flags, process, socket};
use explain_core::string_buffer::StringBuffer;
use explain_core::{errno_info, explain_by_name, message_with_options, Options};

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

#[test]
fn every_documented_errno_has_a_cause() {
    let options = Options::default();
    for entry in registry() {
        let sample = words(entry.sample);
        let parsed = calls::parse(entry.name, &sample).unwrap_or_else(|err| panic!("{}: {err}", entry.name));
        for &errnum in entry.errnos {
            let text = message_with_options(parsed.explainer(), errnum, options);
            let echo = format!("{}(", parsed.explainer().name());
            assert!(text.contains(&echo), "{}: {text}", entry.name);
            assert!(text.contains(&errno_info::strerror(errnum)), "{}: {text}", entry.name);
            let cause = text
                .split_once(", because ")
                .map(|(_, cause)| cause.trim())
                .unwrap_or_else(|| panic!("{} {}: no cause in {text}", entry.name, errnum));
            assert!(!cause.is_empty(), "{}: {text}", entry.name);
        }
    }
}

#[test]
fn vague_causes_still_name_the_argument() {
    let cases: &[(&str, &[&str], i32, &str)] = &[
        ("bind", &["0", "127.0.0.1:80"], libc::ENOENT, "addr"),
        ("bind", &["0", "127.0.0.1:80"], libc::EROFS, "addr"),
        ("open", &["/no/such/file", "O_RDONLY"], libc::ENXIO, "pathname"),
        ("open", &["/no/such/file", "O_RDONLY"], libc::ENODEV, "pathname"),
        ("open", &["/no/such/file", "O_RDONLY"], libc::EISDIR, "pathname"),
        ("creat", &["/tmp/new-file", "0644"], libc::ENXIO, "pathname"),
        ("pwrite", &["7", "100", "-1"], libc::ENXIO, "offset"),
        ("pread", &["7", "100", "0"], libc::ENXIO, "offset"),
        ("truncate", &["/no/such/file", "0"], libc::EINVAL, "pathname"),
        ("realpath", &["/no/such/file"], libc::EINVAL, "pathname"),
        ("fcntl", &["0", "F_SETFL", "O_NONBLOCK"], libc::EACCES, "fildes"),
        ("execvp", &["no-such-program", "no-such-program"], libc::E2BIG, "argv"),
        ("execvp", &["no-such-program", "no-such-program"], libc::ETXTBSY, "no-such-program"),
    ];
    for &(name, args, errnum, caption) in cases {
        let text = explain_by_name(name, &words(args), errnum, Options::default()).unwrap();
        let (_, cause) = text.split_once(", because ").unwrap_or_else(|| panic!("{name}: {text}"));
        assert!(cause.contains(caption), "{name} {errnum}: {text}");
    }
}

#[test]
fn explanations_leave_errno_alone() {
    let options = Options::default();
    for entry in registry() {
        let sample = words(entry.sample);
        let Ok(parsed) = calls::parse(entry.name, &sample) else {
            continue;
        };
        for &errnum in entry.errnos {
            probe::set_errno(libc::EDOM);
            let _ = message_with_options(parsed.explainer(), errnum, options);
            assert_eq!(probe::errno(), libc::EDOM, "{} {errnum}", entry.name);
        }
    }
}

#[test]
fn explain_by_name_matches_typed_call() {
    let text = explain_by_name("mkdir", &words(&["/tmp", "0755"]), libc::EEXIST, Options::default()).unwrap();
    assert!(text.starts_with("mkdir(pathname = \"/tmp\", mode = 0755) failed, File exists"), "{text}");
    assert!(explain_by_name("mkdri", &[], libc::EEXIST, Options::default()).is_err());
}

fn round_trip(table: &BitsTable, extra: &[i64]) {
    let mut values: Vec<i64> = vec![0];
    for a in table {
        values.push(a.value);
        for b in table {
            values.push(a.value | b.value);
        }
    }
    values.extend_from_slice(extra);
    for value in values {
        let mut sb = StringBuffer::new(1024, Options::default());
        parse_bits::print(&mut sb, value, table);
        let parsed = parse_bits::parse(sb.as_str(), table);
        assert_eq!(parsed.ok(), Some(value), "{value:#x} rendered as {}", sb.as_str());
    }
}

#[test]
fn symbolic_renderings_parse_back() {
    round_trip(&open_flags::OPEN_FLAGS, &[0x4000_0000, 0o777]);
    round_trip(&memory::PROT, &[0x100]);
    round_trip(&memory::MAP_FLAGS, &[0x8000_0000]);
    round_trip(&mode::PERMISSION_BITS, &[0o7777]);
    round_trip(&mode::ACCESS_MODES, &[]);
    round_trip(&process::WAIT_OPTIONS, &[]);
    round_trip(&socket::TYPE_FLAGS, &[1]);
}
