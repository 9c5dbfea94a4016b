//! selector::matcher
//!
//! Glob-to-predicate compilation.
//!
//! Selection atoms use a single wildcard (`*`); everything else is literal.
//! Patterns compile once into a case-insensitive, fully-anchored matcher,
//! producing a pure predicate over normalized strings.

use regex::Regex;

/// A compiled, case-insensitive glob pattern.
#[derive(Debug, Clone)]
pub(crate) struct GlobMatcher {
    regex: Regex,
}

impl GlobMatcher {
    /// Compile a glob pattern (only `*` is a metacharacter).
    pub(crate) fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let escaped = regex::escape(pattern).replace(r"\*", ".*");
        let regex = Regex::new(&format!("(?i)^{escaped}$"))?;
        Ok(Self { regex })
    }

    /// Whether the whole of `text` matches the pattern.
    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_match_is_case_insensitive() {
        let matcher = GlobMatcher::compile("db.Orders").unwrap();
        assert!(matcher.is_match("db.orders"));
        assert!(matcher.is_match("DB.ORDERS"));
        assert!(!matcher.is_match("db.orders_v2"));
    }

    #[test]
    fn star_matches_any_run() {
        let matcher = GlobMatcher::compile("*_facts").unwrap();
        assert!(matcher.is_match("db.order_facts"));
        assert!(matcher.is_match("_facts"));
        assert!(!matcher.is_match("db.order_facts_v2"));
    }

    #[test]
    fn bare_star_matches_everything() {
        let matcher = GlobMatcher::compile("*").unwrap();
        assert!(matcher.is_match(""));
        assert!(matcher.is_match("anything.at.all"));
    }

    #[test]
    fn interior_star() {
        let matcher = GlobMatcher::compile("*2_*").unwrap();
        assert!(matcher.is_match("model2_1"));
        assert!(matcher.is_match("model2_2"));
        assert!(!matcher.is_match("model2"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let matcher = GlobMatcher::compile("db.orders").unwrap();
        // The '.' must not act as a regex wildcard.
        assert!(!matcher.is_match("dbxorders"));

        let matcher = GlobMatcher::compile("a+b").unwrap();
        assert!(matcher.is_match("a+b"));
        assert!(!matcher.is_match("aab"));
    }
}
