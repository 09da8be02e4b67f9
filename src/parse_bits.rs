/*============================================================
  Synavera Project: Explain
  Module: explain_core::parse_bits
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Ordered (name, value) tables that drive symbolic rendering
    of flag sets and enumerations, and the inverse parser that
    turns `O_WRONLY|O_CREAT` style text back into a number.

  Security / Safety Notes:
    Pure computation over static tables.

  Dependencies:
    thiserror for the parse error; fstrcmp for suggestions.

  Operational Scope:
    Used by every symbolic renderer and by the CLI argument
    parser.

  Revision History:
    2026-10-18 COD  Authored bit table rendering and parsing.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Table order fixes canonical spelling
    - Leftover bits never silently dropped
    - Parser accepts everything the renderer emits
============================================================*/

use std::fmt::Write;

use thiserror::Error;

use crate::fstrcmp::best_match;
use crate::string_buffer::StringBuffer;

/// One symbolic name and the bits it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitsEntry {
    pub name: &'static str,
    pub value: i64,
}

/// An ordered table; equal values list the preferred spelling first.
pub type BitsTable = [BitsEntry];

/// Build table rows from libc constants of the same name.
#[macro_export]
macro_rules! bits_table {
    ($($name:ident),* $(,)?) => {
        [$($crate::parse_bits::BitsEntry {
            name: stringify!($name),
            value: libc::$name as i64,
        }),*]
    };
}

/// Failure to interpret symbolic text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown symbol \"{token}\"{}", suggestion_text(.suggestion))]
pub struct ParseBitsError {
    pub token: String,
    pub suggestion: Option<&'static str>,
}

fn suggestion_text(suggestion: &Option<&'static str>) -> String {
    suggestion
        .map(|name| format!(", did you mean \"{name}\"?"))
        .unwrap_or_default()
}

/// Entry whose value equals `value` exactly.
pub fn find_by_value(value: i64, table: &BitsTable) -> Option<&BitsEntry> {
    table.iter().find(|entry| entry.value == value)
}

/// Entry spelled exactly `name`.
pub fn find_by_name<'t>(name: &str, table: &'t BitsTable) -> Option<&'t BitsEntry> {
    table.iter().find(|entry| entry.name == name)
}

/// Entry spelled most like `name`, above the suggestion threshold.
pub fn find_by_name_fuzzy<'t>(name: &str, table: &'t BitsTable) -> Option<&'t BitsEntry> {
    let best = best_match(name, table.iter().map(|entry| entry.name))?;
    find_by_name(best, table)
}

/// Render a flag set: names joined by `" | "`, leftovers in hex.
pub fn print(sb: &mut StringBuffer, value: i64, table: &BitsTable) {
    if value == 0 {
        match find_by_value(0, table) {
            Some(entry) => sb.puts(entry.name),
            None => sb.putc('0'),
        }
        return;
    }
    let mut remaining = value;
    let mut first = true;
    for entry in table {
        if entry.value == 0 || remaining & entry.value != entry.value {
            continue;
        }
        if !first {
            sb.puts(" | ");
        }
        sb.puts(entry.name);
        first = false;
        remaining &= !entry.value;
        if remaining == 0 {
            return;
        }
    }
    if !first {
        sb.puts(" | ");
    }
    let _ = write!(sb, "{:#x}", remaining);
}

/// Render a single-valued enumeration, falling back to decimal.
pub fn print_single(sb: &mut StringBuffer, value: i64, table: &BitsTable) {
    match find_by_value(value, table) {
        Some(entry) => sb.puts(entry.name),
        None => {
            let _ = write!(sb, "{value}");
        }
    }
}

/// Parse an integer literal in C syntax: decimal, `0x` hex, leading
/// `0` octal, optional sign.
pub fn parse_c_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if body.is_empty() {
        return None;
    }
    let magnitude = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else if body.len() > 1 && body.starts_with('0') {
        u64::from_str_radix(&body[1..], 8).ok()?
    } else {
        body.parse::<u64>().ok()?
    };
    let value = magnitude as i64;
    Some(if negative { value.wrapping_neg() } else { value })
}

/// Parse `A | B | 0x10`, names and numbers, into the OR of their values.
pub fn parse(text: &str, table: &BitsTable) -> Result<i64, ParseBitsError> {
    let mut result = 0i64;
    for token in text.split('|') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some(number) = parse_c_integer(token) {
            result |= number;
            continue;
        }
        match find_by_name(token, table) {
            Some(entry) => result |= entry.value,
            None => {
                return Err(ParseBitsError {
                    token: token.to_string(),
                    suggestion: find_by_name_fuzzy(token, table).map(|entry| entry.name),
                })
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    const TABLE: [BitsEntry; 4] = [
        BitsEntry { name: "BOTH", value: 0x3 },
        BitsEntry { name: "LOW", value: 0x1 },
        BitsEntry { name: "HIGH", value: 0x2 },
        BitsEntry { name: "BIG", value: 0x100 },
    ];

    fn render(value: i64) -> String {
        let mut sb = StringBuffer::new(128, Options::default());
        print(&mut sb, value, &TABLE);
        sb.into_string()
    }

    #[test]
    fn greedy_from_table_top() {
        assert_eq!(render(0x3), "BOTH");
        assert_eq!(render(0x101), "LOW | BIG");
        assert_eq!(render(0x1003), "BOTH | 0x1000");
        assert_eq!(render(0x40), "0x40");
        assert_eq!(render(0), "0");
    }

    #[test]
    fn single_values_fall_back_to_decimal() {
        let mut sb = StringBuffer::new(64, Options::default());
        print_single(&mut sb, 2, &TABLE);
        sb.putc(' ');
        print_single(&mut sb, 7, &TABLE);
        assert_eq!(sb.as_str(), "HIGH 7");
    }

    #[test]
    fn c_integers() {
        assert_eq!(parse_c_integer("0x1F"), Some(31));
        assert_eq!(parse_c_integer("0755"), Some(0o755));
        assert_eq!(parse_c_integer("-100"), Some(-100));
        assert_eq!(parse_c_integer("0"), Some(0));
        assert_eq!(parse_c_integer("08"), None);
        assert_eq!(parse_c_integer("abc"), None);
    }

    #[test]
    fn parser_accepts_rendered_text() {
        for value in [0x3, 0x101, 0x1003, 0x40, 0x102] {
            assert_eq!(parse(&render(value), &TABLE), Ok(value));
        }
    }

    #[test]
    fn unknown_symbols_carry_suggestions() {
        let err = parse("LOW | HIHG", &TABLE).unwrap_err();
        assert_eq!(err.token, "HIHG");
        assert_eq!(err.suggestion, Some("HIGH"));
        assert!(err.to_string().contains("did you mean \"HIGH\""));
    }
}
