/*============================================================
  Synavera Project: Explain
  Module: explain_core::options
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Parse the EXPLAIN_OPTIONS environment variable and layer it
    over configuration and client settings to produce the
    option snapshot carried by every diagnostic.

  Security / Safety Notes:
    Reads the environment once; never writes it. Unknown
    options are ignored, never fatal.

  Dependencies:
    strum for option-name parsing; logger for debug warnings.

  Operational Scope:
    Consulted by every renderer and analyser through the
    StringBuffer they write to.

  Revision History:
    2026-10-18 COD  Authored layered option parsing.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic precedence: default < config < env < client
    - Unknown input ignored with an optional warning
    - Immutable snapshot after initialisation
============================================================*/

use std::str::FromStr;
use std::sync::OnceLock;

use strum::{EnumString, IntoStaticStr, VariantNames};

use crate::fstrcmp::best_match;
use crate::logger::{LogLevel, Logger};

/// Primary environment variable holding comma separated options.
pub const ENV_VAR: &str = "EXPLAIN_OPTIONS";
/// Fallback environment variable honoured when the primary is unset.
pub const ENV_VAR_FALLBACK: &str = "LIBEXPLAIN_OPTIONS";

/// Recognised option names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum OptionKey {
    Debug,
    NumericErrno,
    DialectSpecific,
    #[strum(serialize = "program-name", serialize = "assemble-program-name")]
    ProgramName,
    SymbolicModeBits,
    ExtraDeviceInfo,
    HangingIndent,
    InternalStrerror,
}

/// Snapshot of every option that influences message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub debug: bool,
    pub numeric_errno: bool,
    pub dialect_specific: bool,
    pub program_name: bool,
    pub symbolic_mode_bits: bool,
    pub extra_device_info: bool,
    pub hanging_indent: u16,
    /// Whether non-ASCII text may be emitted verbatim.
    pub utf8_output: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug: false,
            numeric_errno: true,
            dialect_specific: true,
            program_name: true,
            symbolic_mode_bits: false,
            extra_device_info: true,
            hanging_indent: 0,
            utf8_output: false,
        }
    }
}

/// An option entry that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionWarning {
    pub text: String,
    pub suggestion: Option<&'static str>,
}

impl Options {
    /// Options resolved from the process environment, computed once.
    pub fn current() -> Options {
        static CURRENT: OnceLock<Options> = OnceLock::new();
        *CURRENT.get_or_init(|| Options::resolve(None, env_text().as_deref(), None))
    }

    /// Layer configuration, environment and client text over the defaults.
    pub fn resolve(config: Option<&str>, env: Option<&str>, client: Option<&str>) -> Options {
        let mut options = Options {
            utf8_output: locale_is_utf8(),
            ..Options::default()
        };
        let mut warnings = Vec::new();
        for layer in [config, env, client].into_iter().flatten() {
            warnings.extend(options.apply(layer));
        }
        if options.debug && !warnings.is_empty() {
            for warning in &warnings {
                let message = match warning.suggestion {
                    Some(name) => format!("unknown option \"{}\", did you mean \"{name}\"?", warning.text),
                    None => format!("unknown option \"{}\"", warning.text),
                };
                Logger::diagnostic(LogLevel::Warn, "OPTIONS", message);
            }
        }
        options
    }

    /// Apply one comma separated option string, returning the entries
    /// that were not understood.
    pub fn apply(&mut self, text: &str) -> Vec<OptionWarning> {
        let mut warnings = Vec::new();
        for raw in text.split(',') {
            let entry = raw.trim();
            if entry.is_empty() {
                continue;
            }
            if !self.apply_entry(entry) {
                let name = entry.split('=').next().unwrap_or(entry);
                let bare = strip_negation(name).unwrap_or(name);
                warnings.push(OptionWarning {
                    text: entry.to_string(),
                    suggestion: best_match(bare, OptionKey::VARIANTS.iter().copied()),
                });
            }
        }
        warnings
    }

    fn apply_entry(&mut self, entry: &str) -> bool {
        let (name, value) = match entry.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (entry, None),
        };

        let (key, negated) = match OptionKey::from_str(name) {
            Ok(key) => (key, false),
            Err(_) => match strip_negation(name).map(OptionKey::from_str) {
                Some(Ok(key)) => (key, true),
                _ => return false,
            },
        };

        let flag = match value {
            None => Some(true),
            Some(value) => parse_boolean(value),
        }
        .map(|flag| flag != negated);
        match (key, flag) {
            (OptionKey::HangingIndent, _) => match (negated, value.map(str::parse::<u16>)) {
                (true, _) => self.hanging_indent = 0,
                (false, Some(Ok(n))) => self.hanging_indent = n,
                _ => return false,
            },
            (_, None) => return false,
            (OptionKey::Debug, Some(flag)) => self.debug = flag,
            (OptionKey::NumericErrno, Some(flag)) => self.numeric_errno = flag,
            (OptionKey::DialectSpecific, Some(flag)) => self.dialect_specific = flag,
            (OptionKey::ProgramName, Some(flag)) => self.program_name = flag,
            (OptionKey::SymbolicModeBits, Some(flag)) => self.symbolic_mode_bits = flag,
            (OptionKey::ExtraDeviceInfo, Some(flag)) => self.extra_device_info = flag,
            (OptionKey::InternalStrerror, Some(_)) => {}
        }
        true
    }

    /// Hanging indent to apply for the given line width.
    pub fn hanging_indent_for(&self, width: usize) -> usize {
        let limit = (width + 5) / 10;
        usize::from(self.hanging_indent).min(limit)
    }
}

fn strip_negation(name: &str) -> Option<&str> {
    let lower = name.get(..3)?;
    if lower.eq_ignore_ascii_case("no-") {
        Some(&name[3..])
    } else {
        None
    }
}

fn parse_boolean(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "1" => Some(true),
        "no" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Option text from the environment, primary variable first.
pub fn env_text() -> Option<String> {
    std::env::var(ENV_VAR)
        .ok()
        .or_else(|| std::env::var(ENV_VAR_FALLBACK).ok())
}

fn locale_is_utf8() -> bool {
    for var in ["LC_ALL", "LC_CTYPE", "LANG"] {
        if let Ok(value) = std::env::var(var) {
            if value.is_empty() {
                continue;
            }
            let lower = value.to_ascii_lowercase();
            return lower.contains("utf-8") || lower.contains("utf8");
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = Options::default();
        assert!(!options.debug);
        assert!(options.numeric_errno);
        assert!(options.dialect_specific);
        assert!(options.program_name);
        assert!(!options.symbolic_mode_bits);
        assert!(options.extra_device_info);
        assert_eq!(options.hanging_indent, 0);
    }

    #[test]
    fn negation_and_values() {
        let mut options = Options::default();
        let warnings = options.apply("no-numeric-errno, Symbolic-Mode-Bits,dialect-specific=no");
        assert!(warnings.is_empty());
        assert!(!options.numeric_errno);
        assert!(options.symbolic_mode_bits);
        assert!(!options.dialect_specific);
    }

    #[test]
    fn program_name_aliases() {
        let mut options = Options::default();
        options.apply("no-program-name");
        assert!(!options.program_name);
        options.apply("assemble-program-name=true");
        assert!(options.program_name);
    }

    #[test]
    fn hanging_indent_is_parsed_and_clamped() {
        let mut options = Options::default();
        options.apply("hanging-indent=12");
        assert_eq!(options.hanging_indent, 12);
        assert_eq!(options.hanging_indent_for(75), 8);
        assert_eq!(options.hanging_indent_for(200), 12);
    }

    #[test]
    fn unknown_options_are_reported_with_suggestion() {
        let mut options = Options::default();
        let warnings = options.apply("debgu,frobnicate");
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].suggestion, Some("debug"));
        assert_eq!(warnings[1].suggestion, None);
        assert_eq!(options, Options::default());
    }

    #[test]
    fn later_layers_win() {
        let options = Options::resolve(Some("no-debug,hanging-indent=2"), Some("debug"), Some("no-debug"));
        assert!(!options.debug);
        assert_eq!(options.hanging_indent, 2);
    }
}
