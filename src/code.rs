// Copyright 2025 Cowboy AI, LLC.

//! Normalized category codes.
//!
//! Reporting schemes spell the same code in several ways: `1.A`, `1A`,
//! `1 a` and `1-A` all name the same IPCC category. Every lookup goes through
//! a [`CodeKey`], which drops whitespace and the separator characters
//! `. - _ : /` and uppercases what is left. Codes that consist only of
//! separators (a bare `-` is a legal code) keep their trimmed spelling.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Characters ignored when comparing codes.
const SEPARATORS: &[char] = &['.', '-', '_', ':', '/'];

/// Normalized lookup key for a category code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CodeKey(String);

impl CodeKey {
    /// Normalize a code into its lookup key.
    pub fn new(code: &str) -> Self {
        let trimmed = code.trim();
        let key: String = trimmed
            .chars()
            .filter(|ch| !ch.is_whitespace() && !SEPARATORS.contains(ch))
            .flat_map(char::to_uppercase)
            .collect();

        if key.is_empty() {
            Self(trimmed.to_uppercase())
        } else {
            Self(key)
        }
    }

    /// View the underlying key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for keys derived from blank codes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for CodeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CodeKey {
    fn from(code: &str) -> Self {
        CodeKey::new(code)
    }
}

/// Normalize a code the way every categorization lookup does.
pub fn normalize_code(code: &str) -> CodeKey {
    CodeKey::new(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1.A", "1A" ; "dotted")]
    #[test_case("1A", "1A" ; "compact")]
    #[test_case(" 1.a ", "1A" ; "padded lowercase")]
    #[test_case("1-A_1:b/ii", "1A1BII" ; "mixed separators")]
    #[test_case("M.0.EL", "M0EL" ; "ipcc2006 extension code")]
    #[test_case("-", "-" ; "separator only")]
    #[test_case("+", "+" ; "operator code")]
    fn normalizes(code: &str, expected: &str) {
        assert_eq!(normalize_code(code).as_str(), expected);
    }

    #[test]
    fn spellings_compare_equal() {
        assert_eq!(CodeKey::new("1.A.1"), CodeKey::new("1a1"));
        assert_ne!(CodeKey::new("1.A.1"), CodeKey::new("1.A.2"));
        assert_ne!(CodeKey::new("-"), CodeKey::new("+"));
    }

    #[test]
    fn blank_codes_produce_empty_keys() {
        assert!(CodeKey::new("   ").is_empty());
        assert!(!CodeKey::new("0").is_empty());
    }
}
