//! Citizen identity helpers: PII masking for public responses and the
//! normalized comparisons used by registration validation.

use chrono::NaiveDate;

/// First word of a full name. Hyphens and underscores also split words.
pub fn first_name(full_name: &str) -> String {
    full_name
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .find(|part| !part.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Mask a full name, keeping the first name and the last surname readable.
///
/// `"João Silva Santos"` becomes `"João S**** Santos"`. A two-word name
/// masks the surname; a single word keeps only its first character.
pub fn mask_name(full_name: &str) -> String {
    let parts: Vec<&str> = full_name.split_whitespace().collect();
    match parts.as_slice() {
        [] => String::new(),
        [only] => mask_word(only),
        [first, last] => format!("{first} {}", mask_word(last)),
        [first, middle @ .., last] => {
            let masked: Vec<String> = middle.iter().map(|w| mask_word(w)).collect();
            format!("{first} {} {last}", masked.join(" "))
        }
    }
}

/// Lowercase and collapse whitespace so names compare independent of
/// capitalization and spacing.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case and whitespace-insensitive exact comparison. An empty reference
/// name never matches.
pub fn names_match(provided: &str, reference: &str) -> bool {
    let reference = normalize_name(reference);
    !reference.is_empty() && normalize_name(provided) == reference
}

/// Parse a birth date given as `YYYY-MM-DD` or `DD/MM/YYYY`.
pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

fn mask_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(head) => {
            let hidden = chars.count();
            format!("{head}{}", "*".repeat(hidden))
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_name() {
        assert_eq!(first_name("João Silva Santos"), "João");
        assert_eq!(first_name("  Ana-Maria Souza"), "Ana");
        assert_eq!(first_name(""), "");
    }

    #[test]
    fn masks_middle_names_char_aware() {
        assert_eq!(mask_name("João Silva Santos"), "João S**** Santos");
        assert_eq!(mask_name("Maria Conceição"), "Maria C********");
        assert_eq!(mask_name("Zé"), "Z*");
        assert_eq!(mask_name("   "), "");
    }

    #[test]
    fn names_compare_normalized() {
        assert!(names_match("  joão   SILVA santos", "João Silva Santos"));
        assert!(!names_match("João Silva", "João Silva Santos"));
        assert!(!names_match("", ""));
    }

    #[test]
    fn birth_dates_accept_both_formats() {
        let expected = NaiveDate::from_ymd_opt(1990, 5, 17);
        assert_eq!(parse_birth_date("1990-05-17"), expected);
        assert_eq!(parse_birth_date("17/05/1990"), expected);
        assert_eq!(parse_birth_date("1990/05/17"), None);
    }
}
