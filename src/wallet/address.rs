//! Dogecoin address format checks and display helpers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Mainnet: 'D', a restricted second character, then 32 base58 characters.
    static ref DOGE_ADDRESS: Regex =
        Regex::new(r"^D[5-9A-HJ-NP-U][1-9A-HJ-NP-Za-km-z]{32}$").unwrap();
}

pub fn is_valid_address(address: &str) -> bool {
    DOGE_ADDRESS.is_match(address)
}

/// Abbreviate for display: first 8 and last 6 characters. Counts characters,
/// not bytes, so arbitrary (even non-address) input cannot split a codepoint.
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 14 {
        return address.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "D6abcdefghijkmnopqrstuvwxyz1234567";

    #[test]
    fn accepts_well_formed_address() {
        assert_eq!(VALID.len(), 34);
        assert!(is_valid_address(VALID));
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert!(!is_valid_address(&format!("A{}", &VALID[1..])));
        assert!(!is_valid_address(&format!("d{}", &VALID[1..])));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_address(&VALID[..33]));
        assert!(!is_valid_address(&format!("{}a", VALID)));
        assert!(!is_valid_address(""));
    }

    #[test]
    fn rejects_forbidden_characters() {
        // 0, O, I and l are not in the base58 alphabet.
        for c in ['0', 'O', 'I', 'l'] {
            let mut candidate = VALID.to_string();
            candidate.replace_range(10..11, &c.to_string());
            assert!(!is_valid_address(&candidate), "accepted {}", c);
        }
    }

    #[test]
    fn rejects_bad_second_character() {
        assert!(!is_valid_address(&format!("D1{}", &VALID[2..])));
        assert!(!is_valid_address(&format!("Dz{}", &VALID[2..])));
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(format_address(VALID), "D6abcdef...234567");
        assert_eq!(format_address("short"), "short");
    }

    #[test]
    fn formats_multibyte_input_without_panicking() {
        let candidate = "Dögécoin-àddréss-with-áccents-1234567890";
        let shown = format_address(candidate);
        assert_eq!(shown.chars().count(), 8 + 3 + 6);
        assert!(shown.starts_with("Dögé"));
        assert!(shown.ends_with("567890"));
    }
}
