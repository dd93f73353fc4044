//! Built-in parameter constraint fragments.
//!
//! Constraints are unanchored regular expression fragments without capture
//! groups. They are spliced into a route's compiled pattern, so a fragment
//! restricts only the segment captured for its parameter.

/// Digits only.
pub const NUMBER: &str = "[0-9]+";

/// ASCII letters only.
pub const ALPHA: &str = "[a-zA-Z]+";

/// ASCII letters and digits.
pub const ALPHA_NUMERIC: &str = "[a-zA-Z0-9]+";

/// Canonical hyphenated UUID, any version, either case.
pub const UUID: &str =
    "[\\da-fA-F]{8}-[\\da-fA-F]{4}-[\\da-fA-F]{4}-[\\da-fA-F]{4}-[\\da-fA-F]{12}";

/// Builds a fragment accepting exactly one of the given literal values.
///
/// Values are escaped, so `where_in("format", ["json", "c++"])` only matches
/// those two strings.
///
/// ```rust
/// use trellis_router::constraint::one_of;
///
/// assert_eq!(one_of(["draft", "published"]), "(?:draft|published)");
/// ```
#[must_use]
pub fn one_of<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let alternatives = values
        .into_iter()
        .map(|v| regex::escape(v.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    format!("(?:{alternatives})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn anchored(fragment: &str) -> Regex {
        Regex::new(&format!("^{fragment}$")).unwrap()
    }

    #[test]
    fn test_number() {
        let re = anchored(NUMBER);
        assert!(re.is_match("123"));
        assert!(!re.is_match("12a"));
        assert!(!re.is_match(""));
    }

    #[test]
    fn test_alpha_and_alpha_numeric() {
        assert!(anchored(ALPHA).is_match("abcXYZ"));
        assert!(!anchored(ALPHA).is_match("abc1"));
        assert!(anchored(ALPHA_NUMERIC).is_match("abc1"));
        assert!(!anchored(ALPHA_NUMERIC).is_match("abc-1"));
    }

    #[test]
    fn test_uuid() {
        let re = anchored(UUID);
        assert!(re.is_match("0190b7c4-3f5e-7a2b-9c1d-4e5f6a7b8c9d"));
        assert!(re.is_match("0190B7C4-3F5E-7A2B-9C1D-4E5F6A7B8C9D"));
        assert!(!re.is_match("0190b7c4-3f5e-7a2b-9c1d"));
        assert!(!re.is_match("not-a-uuid"));
    }

    #[test]
    fn test_one_of_escapes() {
        let re = anchored(&one_of(["c++", "rust"]));
        assert!(re.is_match("c++"));
        assert!(re.is_match("rust"));
        assert!(!re.is_match("c"));
    }
}
