//! EAN-13 checksum validation.
//!
//! Standard weighting: 1-based odd positions count once, even positions count
//! three times. The check digit is `(10 - sum % 10) % 10` and must equal the
//! thirteenth digit.

/// Returns true iff `code` is exactly 13 ASCII digits with a valid check digit.
///
/// Anything else (wrong length, unicode digits, whitespace) is invalid; the
/// function never panics and never allocates.
pub fn is_valid(code: &str) -> bool {
    let bytes = code.as_bytes();
    if bytes.len() != 13 || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let digit = |i: usize| (bytes[i] - b'0') as u32;
    let mut sum = 0u32;
    for i in 0..12 {
        // `i` is 0-based, so even 1-based positions are odd indices.
        let weight = if i % 2 == 1 { 3 } else { 1 };
        sum += digit(i) * weight;
    }
    (10 - sum % 10) % 10 == digit(12)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_valid_codes() {
        assert!(is_valid("4006381333931"));
        assert!(is_valid("5901234123457"));
        assert!(is_valid("9780471117094"));
    }

    #[test]
    fn rejects_wrong_check_digit() {
        assert!(!is_valid("4006381333932"));
        assert!(!is_valid("5901234123450"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid(""));
        assert!(!is_valid("590123412345"));
        assert!(!is_valid("59012341234577"));
    }

    #[test]
    fn rejects_non_ascii_digits() {
        assert!(!is_valid("590123412345a"));
        assert!(!is_valid("5901234 23457"));
        // Arabic-Indic digits are digits to char::is_numeric but not to us.
        assert!(!is_valid("٥٩٠١٢٣٤١٢٣٤٥٧"));
    }

    #[test]
    fn leading_zeros_participate_in_the_sum() {
        // UPC-A codes embedded in EAN-13 start with 0.
        assert!(is_valid("0012345678905"));
        assert!(!is_valid("0012345678904"));
    }

    #[test]
    fn matches_manual_weighted_sum() {
        // Brute-force the check digit for a handful of prefixes.
        for prefix in ["400638133393", "978014300723", "000000000000"] {
            let digits: Vec<u32> = prefix.chars().map(|c| c.to_digit(10).unwrap()).collect();
            let sum: u32 = digits
                .iter()
                .enumerate()
                .map(|(i, d)| if (i + 1) % 2 == 0 { d * 3 } else { *d })
                .sum();
            let check = (10 - sum % 10) % 10;
            for candidate in 0..10u32 {
                let code = format!("{prefix}{candidate}");
                assert_eq!(is_valid(&code), candidate == check, "code {code}");
            }
        }
    }
}
