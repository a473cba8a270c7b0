//! Display-name <-> slug conversion.
//!
//! # Responsibility
//! - Encode user-facing names into filesystem-safe slugs.
//! - Decode slugs back into readable labels, rendering collision suffixes
//!   as `(N)`.
//!
//! # Invariants
//! - `encode` is deterministic: trim, lowercase, spaces to underscores.
//! - Only suffixes `_<N>` with `N < 100` are treated as disambiguators.
//! - The codec is lossy; `decode(encode(x))` need not equal `x`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Largest-exclusive numeric suffix rendered as a disambiguator.
pub const DISAMBIGUATOR_LIMIT: u64 = 100;

static NUMERIC_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([0-9]+)$").expect("valid numeric suffix regex"));

/// Encodes a display name into an on-disk slug.
pub fn encode(display: &str) -> String {
    display.trim().to_lowercase().replace(' ', "_")
}

/// Decodes an on-disk slug into a display label.
///
/// `note_3` becomes `Note (3)`; `entry_104` becomes `Entry 104`.
pub fn decode(slug: &str) -> String {
    if let Some(caps) = NUMERIC_SUFFIX_RE.captures(slug) {
        let suffix = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        // Overflowing suffixes are far past the limit, so they stay literal.
        if let Ok(number) = suffix.parse::<u64>() {
            if number < DISAMBIGUATOR_LIMIT {
                let start = caps.get(0).map(|m| m.start()).unwrap_or(slug.len());
                let base = title_case(&slug[..start].replace('_', " "));
                return format!("{base} ({number})");
            }
        }
    }
    title_case(&slug.replace('_', " "))
}

/// Returns whether a candidate display name is unusable after trimming.
pub fn is_blank(display: &str) -> bool {
    encode(display).is_empty()
}

/// Upper-cases the first letter of every letter run and lower-cases the rest.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_is_letter = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, is_blank, title_case};

    #[test]
    fn encode_trims_lowercases_and_underscores() {
        assert_eq!(encode("My First Entry"), "my_first_entry");
        assert_eq!(encode("  Daily Log "), "daily_log");
    }

    #[test]
    fn decode_title_cases_words() {
        assert_eq!(decode("my_first_entry"), "My First Entry");
    }

    #[test]
    fn decode_renders_small_suffix_as_disambiguator() {
        assert_eq!(decode("note_3"), "Note (3)");
        assert_eq!(decode("monday_2"), "Monday (2)");
        assert_eq!(decode("plan_99"), "Plan (99)");
    }

    #[test]
    fn decode_leaves_large_suffix_literal() {
        assert_eq!(decode("entry_104"), "Entry 104");
        assert_eq!(decode("entry_100"), "Entry 100");
        assert_eq!(decode("log_99999999999999999999999"), "Log 99999999999999999999999");
    }

    #[test]
    fn decode_is_lossy_for_mixed_case_input() {
        assert_eq!(decode(&encode("iPhone Notes")), "Iphone Notes");
    }

    #[test]
    fn title_case_restarts_after_non_letters() {
        assert_eq!(title_case("it's 2nd"), "It'S 2Nd");
    }

    #[test]
    fn blank_names_are_detected() {
        assert!(is_blank("   "));
        assert!(is_blank(""));
        assert!(!is_blank(" a "));
    }
}
