//! Time-of-day input handling.
//!
//! Clinicians type times as bare digits on a touch keypad. [`normalize`] turns the keystrokes
//! into a progressively formatted `HH:MM` string and [`can_be_valid_time`] drives the live
//! "this can no longer become a valid time" indicator. Neither function fails: out-of-range
//! input degrades to the raw digits plus a separate validity flag.

use crate::clock::Clock;

/// Result of normalizing raw time input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedTime {
    /// Text to show back in the input field.
    pub text: String,
    /// Whether `text` can still be completed into a valid time.
    pub valid: bool,
}

fn digits_of(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parses two ASCII digits. Callers only pass slices of a digit-only string.
fn two_digit(digits: &str) -> u32 {
    digits.bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

/// Normalizes raw keystrokes into a partial or complete `HH:MM` time.
///
/// Non-digit characters are stripped first, then:
/// - 0–2 digits are returned unchanged,
/// - 3 digits become `HH:M`,
/// - 4 digits become `HH:MM` when hour ≤ 23 and minute ≤ 59, else the raw 4 digits,
/// - longer input is truncated to its first 4 digits and treated as above.
pub fn normalize(raw: &str) -> String {
    let digits = digits_of(raw);

    match digits.len() {
        0..=2 => digits,
        3 => format!("{}:{}", &digits[..2], &digits[2..]),
        _ => {
            let first4 = &digits[..4];
            let hours = two_digit(&first4[..2]);
            let minutes = two_digit(&first4[2..]);
            if hours <= 23 && minutes <= 59 {
                format!("{}:{}", &first4[..2], &first4[2..])
            } else {
                first4.to_string()
            }
        }
    }
}

/// Normalizes `raw` and reports whether the result can still become a valid time.
pub fn normalize_checked(raw: &str) -> NormalizedTime {
    let text = normalize(raw);
    let valid = can_be_valid_time(&text);
    NormalizedTime { text, valid }
}

/// Answers whether a partial input could still be completed into a valid time.
///
/// Permissive for prefixes and strict once enough digits exist to decide:
/// - empty: valid,
/// - 1 digit: valid iff ≤ 2,
/// - 2 digits: valid iff hour ≤ 23,
/// - 3 digits: valid iff hour ≤ 23 and the tens-of-minutes digit ≤ 5,
/// - 4 or more: valid iff hour ≤ 23 and minute ≤ 59.
pub fn can_be_valid_time(partial: &str) -> bool {
    let digits = digits_of(partial);

    match digits.len() {
        0 => true,
        1 => two_digit(&digits) <= 2,
        2 => two_digit(&digits) <= 23,
        3 => two_digit(&digits[..2]) <= 23 && two_digit(&digits[2..3]) <= 5,
        _ => two_digit(&digits[..2]) <= 23 && two_digit(&digits[2..4]) <= 59,
    }
}

/// Strict check for a complete `HH:MM` time of day.
pub fn is_complete_time(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    let (hh, mm) = (&text[..2], &text[3..]);
    if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
        return false;
    }
    two_digit(hh) <= 23 && two_digit(mm) <= 59
}

/// Returns the time to stamp an entry with.
///
/// A non-empty custom time is used verbatim; otherwise the clock's current `HH:MM` is used.
pub fn resolve_time(custom: &str, clock: &dyn Clock) -> String {
    if custom.is_empty() {
        clock.now_hhmm()
    } else {
        custom.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    #[test]
    fn test_normalize_four_digits() {
        assert_eq!(normalize("0130"), "01:30");
        assert_eq!(normalize("2359"), "23:59");
        assert_eq!(normalize("0000"), "00:00");
    }

    #[test]
    fn test_normalize_invalid_four_digits_stay_raw() {
        assert_eq!(normalize("9999"), "9999");
        assert_eq!(normalize("2460"), "2460");
        assert_eq!(normalize("1260"), "1260");
    }

    #[test]
    fn test_normalize_short_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("5"), "5");
        assert_eq!(normalize("14"), "14");
        assert_eq!(normalize("143"), "14:3");
    }

    #[test]
    fn test_normalize_strips_non_digits() {
        assert_eq!(normalize("14:3"), "14:3");
        assert_eq!(normalize("14:30"), "14:30");
        assert_eq!(normalize("ab"), "");
        assert_eq!(normalize("1a4b3c0"), "14:30");
    }

    #[test]
    fn test_normalize_truncates_long_input() {
        assert_eq!(normalize("143059"), "14:30");
        assert_eq!(normalize("99991"), "9999");
    }

    #[test]
    fn test_can_be_valid_time_prefixes() {
        assert!(can_be_valid_time(""));
        assert!(can_be_valid_time("2"));
        assert!(!can_be_valid_time("3"));
        assert!(can_be_valid_time("23"));
        assert!(!can_be_valid_time("24"));
        assert!(can_be_valid_time("23:5"));
        assert!(!can_be_valid_time("23:6"));
        assert!(can_be_valid_time("23:59"));
        assert!(!can_be_valid_time("2360"));
    }

    #[test]
    fn test_normalize_checked_flags_invalid() {
        let result = normalize_checked("9999");
        assert_eq!(result.text, "9999");
        assert!(!result.valid);

        let result = normalize_checked("0915");
        assert_eq!(result.text, "09:15");
        assert!(result.valid);
    }

    #[test]
    fn test_is_complete_time() {
        assert!(is_complete_time("00:00"));
        assert!(is_complete_time("23:59"));
        assert!(!is_complete_time("24:00"));
        assert!(!is_complete_time("9:30"));
        assert!(!is_complete_time("12:3"));
        assert!(!is_complete_time("ab:cd"));
    }

    #[test]
    fn test_resolve_time() {
        let clock = FixedClock::new("08:05");
        assert_eq!(resolve_time("", &clock), "08:05");
        assert_eq!(resolve_time("14:30", &clock), "14:30");
    }
}
