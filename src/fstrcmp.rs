/*============================================================
  Synavera Project: Explain
  Module: explain_core::fstrcmp
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Fuzzy string similarity used for "did you mean" hints on
    unknown option names, symbolic constants and missing
    directory entries.

  Security / Safety Notes:
    Pure computation over borrowed input.

  Dependencies:
    None beyond std.

  Operational Scope:
    Called by options, parse_bits and the path walker.

  Revision History:
    2026-10-18 COD  Introduced similarity scoring.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic scoring
    - Bounded memory proportional to the shorter input
============================================================*/

/// Similarity threshold above which a suggestion is offered.
pub const SUGGESTION_THRESHOLD: f64 = 0.6;

/// Similarity of two strings in the range 0.0 (disjoint) to 1.0 (equal).
///
/// The score is `2 * common / (len(a) + len(b))` where `common` is the
/// length of the longest common subsequence of the two byte strings.
pub fn fstrcmp(a: &str, b: &str) -> f64 {
    similarity(a.as_bytes(), b.as_bytes())
}

/// Case-insensitive variant of [`fstrcmp`].
pub fn fstrcasecmp(a: &str, b: &str) -> f64 {
    let a = a.to_ascii_lowercase();
    let b = b.to_ascii_lowercase();
    similarity(a.as_bytes(), b.as_bytes())
}

fn similarity(a: &[u8], b: &[u8]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut previous = vec![0usize; short.len() + 1];
    let mut current = vec![0usize; short.len() + 1];
    for &lc in long {
        for (j, &sc) in short.iter().enumerate() {
            current[j + 1] = if lc == sc {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    let common = previous[short.len()];
    (2 * common) as f64 / total as f64
}

/// Return the candidate most similar to `needle`, if any scores above
/// the suggestion threshold.
pub fn best_match<'a, I>(needle: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = fstrcasecmp(needle, candidate);
        if score > SUGGESTION_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(fstrcmp("debug", "debug"), 1.0);
        assert_eq!(fstrcmp("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(fstrcmp("abc", "xyz"), 0.0);
        assert_eq!(fstrcmp("abc", ""), 0.0);
    }

    #[test]
    fn near_misses_score_high() {
        assert!(fstrcmp("numeric-erno", "numeric-errno") > 0.9);
        assert!(fstrcasecmp("O_RDONY", "o_rdonly") > 0.8);
    }

    #[test]
    fn best_match_respects_threshold() {
        let names = ["debug", "numeric-errno", "dialect-specific"];
        assert_eq!(best_match("dialect-specfic", names), Some("dialect-specific"));
        assert_eq!(best_match("zzz", names), None);
    }
}
