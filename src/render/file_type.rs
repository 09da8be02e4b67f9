/*============================================================
  Synavera Project: Explain
  Module: explain_core::render::file_type
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Name file types in prose ("regular file", "directory") and
    compose the `"name" type` captions used throughout path
    diagnostics, optionally naming the device driver.

  Security / Safety Notes:
    Reads /proc/devices and /sys/dev symlinks only.

  Dependencies:
    libc for mode and device number macros.

  Operational Scope:
    Used by the walker, the analysers and the ioctl explainers.

  Revision History:
    2026-10-18 COD  Authored file type rendering.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Extra device detail gated by option
============================================================*/

use std::fmt;
use std::fmt::Write;

use crate::string_buffer::StringBuffer;

/// Coarse file type derived from `st_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    KernelSpecial,
    Socket,
    SymbolicLink,
    Regular,
    BlockDevice,
    Directory,
    CharacterDevice,
    NamedPipe,
    Unknown(u32),
}

impl FileType {
    /// Classify the `S_IFMT` bits of a mode.
    pub fn from_mode(mode: u32) -> Self {
        match mode & libc::S_IFMT {
            0 => FileType::KernelSpecial,
            libc::S_IFSOCK => FileType::Socket,
            libc::S_IFLNK => FileType::SymbolicLink,
            libc::S_IFREG => FileType::Regular,
            libc::S_IFBLK => FileType::BlockDevice,
            libc::S_IFDIR => FileType::Directory,
            libc::S_IFCHR => FileType::CharacterDevice,
            libc::S_IFIFO => FileType::NamedPipe,
            other => FileType::Unknown(other),
        }
    }

    pub fn is_device(self) -> bool {
        matches!(self, FileType::BlockDevice | FileType::CharacterDevice)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::KernelSpecial => f.write_str("kernel special file"),
            FileType::Socket => f.write_str("socket"),
            FileType::SymbolicLink => f.write_str("symbolic link"),
            FileType::Regular => f.write_str("regular file"),
            FileType::BlockDevice => f.write_str("block special device"),
            FileType::Directory => f.write_str("directory"),
            FileType::CharacterDevice => f.write_str("character special device"),
            FileType::NamedPipe => f.write_str("named pipe"),
            FileType::Unknown(bits) => write!(f, "unknown file type ({bits:#o})"),
        }
    }
}

/// Name the file type encoded in `mode`.
pub fn file_type(sb: &mut StringBuffer, mode: u32) {
    let _ = write!(sb, "{}", FileType::from_mode(mode));
}

/// Name the file type of `st`, prefixed with device driver details
/// when extra-device-info is on.
pub fn file_type_st(sb: &mut StringBuffer, st: &libc::stat) {
    let kind = FileType::from_mode(st.st_mode);
    if sb.options().extra_device_info && kind.is_device() {
        let class = if kind == FileType::BlockDevice {
            DeviceClass::Block
        } else {
            DeviceClass::Char
        };
        if usb_in_dev_symlink(class, st.st_rdev) {
            sb.puts("usb ");
        }
        if let Some(driver) = proc_devices_name(class, major(st.st_rdev)) {
            sb.puts(&driver);
            sb.putc(' ');
        }
    }
    let _ = write!(sb, "{kind}");
}

/// `[caption ]"name"[ type]`; the type is omitted when `mode` is None.
pub fn caption_name_type(sb: &mut StringBuffer, caption: Option<&str>, name: &[u8], mode: Option<u32>) {
    if let Some(caption) = caption {
        sb.puts(caption);
        sb.putc(' ');
    }
    sb.puts_quoted(name);
    if let Some(mode) = mode {
        sb.putc(' ');
        file_type(sb, mode);
    }
}

/// Like [`caption_name_type`] but with full stat detail when present.
pub fn caption_name_type_st(
    sb: &mut StringBuffer,
    caption: Option<&str>,
    name: &[u8],
    st: Option<&libc::stat>,
) {
    if let Some(caption) = caption {
        sb.puts(caption);
        sb.putc(' ');
    }
    sb.puts_quoted(name);
    if let Some(st) = st {
        sb.putc(' ');
        file_type_st(sb, st);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceClass {
    Block,
    Char,
}

pub(crate) fn major(dev: libc::dev_t) -> u32 {
    libc::major(dev)
}

pub(crate) fn minor(dev: libc::dev_t) -> u32 {
    libc::minor(dev)
}

fn usb_in_dev_symlink(class: DeviceClass, dev: libc::dev_t) -> bool {
    let dir = match class {
        DeviceClass::Block => "block",
        DeviceClass::Char => "char",
    };
    let link = format!("/sys/dev/{dir}/{}:{}", major(dev), minor(dev));
    std::fs::read_link(link)
        .map(|target| target.to_string_lossy().contains("/usb"))
        .unwrap_or(false)
}

fn proc_devices_name(class: DeviceClass, major: u32) -> Option<String> {
    let text = std::fs::read_to_string("/proc/devices").ok()?;
    parse_proc_devices(&text, class, major)
}

fn parse_proc_devices(text: &str, class: DeviceClass, wanted: u32) -> Option<String> {
    let mut section = None;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("Character devices") {
            section = Some(DeviceClass::Char);
            continue;
        }
        if line.starts_with("Block devices") {
            section = Some(DeviceClass::Block);
            continue;
        }
        if section != Some(class) {
            continue;
        }
        let mut fields = line.split_whitespace();
        let number = fields.next().and_then(|n| n.parse::<u32>().ok());
        if number == Some(wanted) {
            return fields.next().map(str::to_string);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    #[test]
    fn names_for_every_type() {
        assert_eq!(FileType::from_mode(libc::S_IFREG | 0o644).to_string(), "regular file");
        assert_eq!(FileType::from_mode(libc::S_IFDIR).to_string(), "directory");
        assert_eq!(FileType::from_mode(libc::S_IFCHR).to_string(), "character special device");
        assert_eq!(FileType::from_mode(libc::S_IFIFO).to_string(), "named pipe");
        assert_eq!(FileType::from_mode(0).to_string(), "kernel special file");
    }

    #[test]
    fn captions_quote_names() {
        let mut sb = StringBuffer::new(128, Options::default());
        caption_name_type(&mut sb, Some("pathname"), b"/", Some(libc::S_IFDIR));
        sb.puts(", ");
        caption_name_type(&mut sb, None, b"no", None);
        assert_eq!(sb.as_str(), "pathname \"/\" directory, \"no\"");
    }

    #[test]
    fn proc_devices_sections_are_respected() {
        let text = "Character devices:\n  1 mem\n  4 tty\n\nBlock devices:\n  8 sd\n  4 weird\n";
        assert_eq!(parse_proc_devices(text, DeviceClass::Char, 4).as_deref(), Some("tty"));
        assert_eq!(parse_proc_devices(text, DeviceClass::Block, 4).as_deref(), Some("weird"));
        assert_eq!(parse_proc_devices(text, DeviceClass::Block, 1), None);
    }
}
