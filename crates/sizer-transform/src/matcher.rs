//! Case-insensitive substring matching

use crate::error::ConfigurationError;
use regex::{Regex, RegexBuilder};

/// Matches text containing any of a set of literal substrings, ignoring case
#[derive(Debug, Clone)]
pub struct SubstringMatcher {
    substrings: Vec<String>,
    regex: Regex,
}

impl SubstringMatcher {
    /// Compile an escaped alternation of `substrings`
    ///
    /// # Errors
    /// Returns [`ConfigurationError::EmptyList`] when `substrings` is empty
    pub fn new(parameter: &'static str, substrings: &[String]) -> Result<Self, ConfigurationError> {
        if substrings.is_empty() {
            return Err(ConfigurationError::EmptyList { parameter });
        }
        let pattern = substrings
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
        Ok(Self {
            substrings: substrings.to_vec(),
            regex,
        })
    }

    /// True when `text` contains at least one substring
    #[inline]
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Substrings in the order given
    #[inline]
    #[must_use]
    pub fn substrings(&self) -> &[String] {
        &self.substrings
    }
}

impl PartialEq for SubstringMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.substrings == other.substrings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(values: &[&str]) -> SubstringMatcher {
        let owned: Vec<String> = values.iter().map(|s| (*s).to_string()).collect();
        SubstringMatcher::new("include_values", &owned).unwrap()
    }

    #[test]
    fn matches_any_ignoring_case() {
        let m = matcher(&["prod", "STAGE"]);
        assert!(m.is_match("Prod-East"));
        assert!(m.is_match("stage01"));
        assert!(!m.is_match("dev"));
    }

    #[test]
    fn metacharacters_are_literal() {
        let m = matcher(&["(64-bit)", "a.b"]);
        assert!(m.is_match("Ubuntu (64-bit)"));
        assert!(m.is_match("xa.by"));
        assert!(!m.is_match("axb"));
    }

    #[test]
    fn empty_list_rejected() {
        let err = SubstringMatcher::new("profile_list", &[]).unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyList { parameter: "profile_list" });
    }
}
