// Copyright 2025 Cowboy AI, LLC.

//! Conversion rules between two categorizations
//!
//! A rule relates a weighted sum of categories in one scheme to a weighted
//! sum in another, e.g. `1.A.1 + 1.A.2 = 1.A`. Factors are usually `+1`, but
//! `-1` models relationships like `A = B - C`. Rules may be restricted to
//! selected categories of auxiliary categorizations (for example a rule that
//! only holds for certain gases).
//!
//! Formulas are written as category codes joined by `+` and `-`, with an
//! optional leading sign. Codes made of ASCII letters, digits and `.` may be
//! written bare; anything else is double-quoted, with `\` escaping the next
//! character.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::categorization::Categorization;
use crate::category::Category;
use crate::code::CodeKey;
use crate::errors::{CategorizationError, CategorizationResult};
use crate::registry::CategorizationRegistry;

/// Category codes with their factors, in order of first appearance
pub type CodeFactors = IndexMap<String, i32>;

/// Parse a formula like `A + B - "C D"` into code factors.
///
/// Repeated codes accumulate: `-A + B - A` yields `A: -2, B: 1`.
pub fn parse_formula(formula: &str) -> CategorizationResult<CodeFactors> {
    let mut scanner = Scanner::new(formula);
    let mut factors = CodeFactors::new();

    let sign = scanner.operator().unwrap_or(1);
    let code = scanner.code()?;
    *factors.entry(code).or_insert(0) += sign;

    loop {
        scanner.skip_whitespace();
        if scanner.at_end() {
            break;
        }
        let Some(sign) = scanner.operator() else {
            return Err(scanner.error("Expected '+' or '-'"));
        };
        let code = scanner.code()?;
        *factors.entry(code).or_insert(0) += sign;
    }

    Ok(factors)
}

/// Parse a whitespace-separated list of codes; quoting as in formulas
pub fn parse_auxiliary_codes(codes: &str) -> CategorizationResult<Vec<String>> {
    let mut scanner = Scanner::new(codes);
    let mut parsed = Vec::new();

    loop {
        scanner.skip_whitespace();
        if scanner.at_end() {
            break;
        }
        parsed.push(scanner.code()?);
    }

    Ok(parsed)
}

struct Scanner<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn operator(&mut self) -> Option<i32> {
        self.skip_whitespace();
        let sign = match self.peek()? {
            '+' => 1,
            '-' => -1,
            _ => return None,
        };
        self.pos += 1;
        Some(sign)
    }

    fn code(&mut self) -> CategorizationResult<String> {
        self.skip_whitespace();
        match self.peek() {
            Some('"') => self.quoted(),
            Some(ch) if is_word_char(ch) => {
                let start = self.pos;
                while self.peek().is_some_and(is_word_char) {
                    self.pos += 1;
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
            _ => Err(self.error("Expected category code")),
        }
    }

    fn quoted(&mut self) -> CategorizationResult<String> {
        let start = self.pos;
        self.pos += 1;
        let mut code = String::new();

        loop {
            match self.peek() {
                None => {
                    self.pos = start;
                    return Err(self.error("Unterminated quoted code"));
                }
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => {
                    self.pos += 1;
                    let Some(escaped) = self.peek() else {
                        return Err(self.error("Expected character after '\\'"));
                    };
                    code.push(escaped);
                    self.pos += 1;
                }
                Some(ch) => {
                    code.push(ch);
                    self.pos += 1;
                }
            }
        }

        if code.is_empty() {
            self.pos = start;
            return Err(self.error("Empty quoted code"));
        }
        Ok(code)
    }

    fn error(&self, reason: &str) -> CategorizationError {
        CategorizationError::ParseError {
            input: self.input.to_string(),
            reason: reason.to_string(),
            position: self.pos,
        }
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '.'
}

/// Shape of a rule by the number of categories on each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCardinality {
    /// One category maps to one category
    OneToOne,
    /// One category of the first scheme maps to several of the second
    OneToMany,
    /// Several categories of the first scheme map to one of the second
    ManyToOne,
    /// Several categories on both sides
    ManyToMany,
}

/// Rule converting between categories of two categorizations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRule {
    /// Codes of the first categorization with their factors
    pub factors_categories_a: CodeFactors,
    /// Codes of the second categorization with their factors
    pub factors_categories_b: CodeFactors,
    /// Auxiliary categorization name to the codes the rule is restricted to.
    ///
    /// A missing entry or an empty set does not restrict the rule.
    #[serde(default)]
    pub auxiliary_categories: IndexMap<String, BTreeSet<String>>,
    /// Notes and explanations for humans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ConversionRule {
    /// Create an unrestricted rule
    pub fn new(factors_categories_a: CodeFactors, factors_categories_b: CodeFactors) -> Self {
        Self {
            factors_categories_a,
            factors_categories_b,
            auxiliary_categories: IndexMap::new(),
            comment: None,
        }
    }

    /// Create an unrestricted rule from two formulas
    pub fn from_formulas(formula_a: &str, formula_b: &str) -> CategorizationResult<Self> {
        Ok(Self::new(parse_formula(formula_a)?, parse_formula(formula_b)?))
    }

    /// Restrict the rule to some categories of an auxiliary categorization
    pub fn with_auxiliary_categories<I, S>(mut self, categorization: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auxiliary_categories
            .entry(categorization.into())
            .or_default()
            .extend(codes.into_iter().map(Into::into));
        self
    }

    /// Attach a comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Shape of the rule
    pub fn cardinality(&self) -> RuleCardinality {
        match (
            self.factors_categories_a.len() == 1,
            self.factors_categories_b.len() == 1,
        ) {
            (true, true) => RuleCardinality::OneToOne,
            (true, false) => RuleCardinality::OneToMany,
            (false, true) => RuleCardinality::ManyToOne,
            (false, false) => RuleCardinality::ManyToMany,
        }
    }

    /// True if the rule is restricted by any auxiliary categorization
    pub fn is_restricted(&self) -> bool {
        self.auxiliary_categories.values().any(|codes| !codes.is_empty())
    }

    /// Check the rule against selected auxiliary categories.
    ///
    /// `selection` maps auxiliary categorization names to one selected code.
    /// Every restriction of the rule must be met by the selection.
    pub fn applies_to(&self, selection: &HashMap<String, String>) -> bool {
        self.auxiliary_categories
            .iter()
            .filter(|(_, codes)| !codes.is_empty())
            .all(|(categorization, codes)| {
                selection.get(categorization).is_some_and(|selected| {
                    let selected = CodeKey::new(selected);
                    codes.iter().any(|code| CodeKey::new(code) == selected)
                })
            })
    }
}

/// Rules for conversion between two categorizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRules {
    /// Name of the first categorization
    pub categorization_a_name: String,
    /// Name of the second categorization
    pub categorization_b_name: String,
    /// Names of the auxiliary categorizations
    #[serde(default)]
    pub auxiliary_categorizations_names: Vec<String>,
    /// The individual rules
    pub rules: Vec<ConversionRule>,
    /// Notes and explanations for humans
    #[serde(default)]
    pub comment: Option<String>,
    /// Citable reference(s)
    #[serde(default)]
    pub references: Option<String>,
    /// Where the conversion originates
    #[serde(default)]
    pub institution: Option<String>,
    /// The date of the last change
    #[serde(default)]
    pub last_update: Option<NaiveDate>,
    /// The version, if there are multiple versions
    #[serde(default)]
    pub version: Option<String>,
}

impl ConversionRules {
    /// Create rules between two categorizations
    pub fn new(
        categorization_a_name: impl Into<String>,
        categorization_b_name: impl Into<String>,
        rules: Vec<ConversionRule>,
    ) -> Self {
        Self {
            categorization_a_name: categorization_a_name.into(),
            categorization_b_name: categorization_b_name.into(),
            auxiliary_categorizations_names: Vec::new(),
            rules,
            comment: None,
            references: None,
            institution: None,
            last_update: None,
            version: None,
        }
    }

    /// Rules of the given shape
    pub fn rules_with(&self, cardinality: RuleCardinality) -> impl Iterator<Item = &ConversionRule> {
        self.rules
            .iter()
            .filter(move |rule| rule.cardinality() == cardinality)
    }

    /// Check that every code used by the rules exists in its categorization
    pub fn ensure_valid(&self, registry: &CategorizationRegistry) -> CategorizationResult<()> {
        let (cat_a, cat_b) = self.categorizations(registry)?;

        for rule in &self.rules {
            for (factors, categorization) in [
                (&rule.factors_categories_a, cat_a),
                (&rule.factors_categories_b, cat_b),
            ] {
                for code in factors.keys() {
                    categorization.lookup(code)?;
                }
            }

            for (name, codes) in &rule.auxiliary_categories {
                if !self.auxiliary_categorizations_names.contains(name) {
                    return Err(CategorizationError::UndeclaredAuxiliary(name.clone()));
                }
                let auxiliary = registry.lookup(name)?;
                for code in codes {
                    auxiliary.lookup(code)?;
                }
            }
        }

        debug!(
            categorization_a = %self.categorization_a_name,
            categorization_b = %self.categorization_b_name,
            rules = self.rules.len(),
            "validated conversion rules"
        );
        Ok(())
    }

    /// Categories of each side that no rule mentions
    pub fn unmapped_categories(
        &self,
        registry: &CategorizationRegistry,
    ) -> CategorizationResult<(Vec<Arc<Category>>, Vec<Arc<Category>>)> {
        let (cat_a, cat_b) = self.categorizations(registry)?;
        let unmapped_a = unmapped(cat_a, self.rules.iter().map(|rule| &rule.factors_categories_a));
        let unmapped_b = unmapped(cat_b, self.rules.iter().map(|rule| &rule.factors_categories_b));
        Ok((unmapped_a, unmapped_b))
    }

    fn categorizations<'r>(
        &self,
        registry: &'r CategorizationRegistry,
    ) -> CategorizationResult<(&'r Categorization, &'r Categorization)> {
        let cat_a = registry.lookup(&self.categorization_a_name)?;
        let cat_b = registry.lookup(&self.categorization_b_name)?;
        Ok((cat_a.as_ref(), cat_b.as_ref()))
    }
}

fn unmapped<'a>(
    categorization: &Categorization,
    factors: impl Iterator<Item = &'a CodeFactors>,
) -> Vec<Arc<Category>> {
    let mapped: HashSet<&str> = factors
        .flat_map(|factors| factors.keys())
        .filter_map(|code| categorization.get(code))
        .map(|category| category.canonical_code())
        .collect();

    categorization
        .categories()
        .filter(|category| !mapped.contains(category.canonical_code()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn factors(pairs: &[(&str, i32)]) -> CodeFactors {
        pairs.iter().map(|(code, factor)| (code.to_string(), *factor)).collect()
    }

    #[test_case("A + B", &[("A", 1), ("B", 1)] ; "sum")]
    #[test_case("-A+B", &[("A", -1), ("B", 1)] ; "leading minus")]
    #[test_case("\"-asdf.#\" + B", &[("-asdf.#", 1), ("B", 1)] ; "quoted code")]
    #[test_case(" A  -  B", &[("A", 1), ("B", -1)] ; "padding")]
    #[test_case("-A", &[("A", -1)] ; "single negative")]
    #[test_case("-A+B - \"A\"", &[("A", -2), ("B", 1)] ; "repeated code accumulates")]
    #[test_case("\"+\" - \"-\"", &[("+", 1), ("-", -1)] ; "operator codes")]
    #[test_case("b + \"argl,5\" + c", &[("b", 1), ("argl,5", 1), ("c", 1)] ; "comma in quotes")]
    #[test_case("b + \"argl\\\"5\" + c", &[("b", 1), ("argl\"5", 1), ("c", 1)] ; "escaped quote")]
    fn parses_formulas(formula: &str, expected: &[(&str, i32)]) {
        assert_eq!(parse_formula(formula).unwrap(), factors(expected));
    }

    #[test_case("-A-", 3 ; "dangling operator")]
    #[test_case("", 0 ; "empty")]
    #[test_case("A B", 2 ; "missing operator")]
    #[test_case("A + \"B", 4 ; "unterminated quote")]
    fn rejects_malformed_formulas(formula: &str, position: usize) {
        match parse_formula(formula) {
            Err(CategorizationError::ParseError { position: at, .. }) => assert_eq!(at, position),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn parses_auxiliary_codes() {
        assert_eq!(parse_auxiliary_codes("A B").unwrap(), ["A", "B"]);
        assert_eq!(parse_auxiliary_codes("\"a b\" c").unwrap(), ["a b", "c"]);
        assert!(parse_auxiliary_codes("").unwrap().is_empty());
        assert!(parse_auxiliary_codes("A + B").is_err());
    }

    #[test]
    fn cardinality_follows_side_sizes() {
        let rule = ConversionRule::from_formulas("1.A", "1.A.1 + 1.A.2").unwrap();
        assert_eq!(rule.cardinality(), RuleCardinality::OneToMany);
        let rule = ConversionRule::from_formulas("1 + 2", "0").unwrap();
        assert_eq!(rule.cardinality(), RuleCardinality::ManyToOne);
    }

    #[test]
    fn auxiliary_restrictions() {
        let rule = ConversionRule::from_formulas("A.5", "4")
            .unwrap()
            .with_auxiliary_categories("gas", ["CO2", "CH4"])
            .with_auxiliary_categories("aux2", Vec::<String>::new());
        assert!(rule.is_restricted());

        let mut selection = HashMap::new();
        assert!(!rule.applies_to(&selection));
        selection.insert("gas".to_string(), "co2".to_string());
        assert!(rule.applies_to(&selection));
        selection.insert("gas".to_string(), "N2O".to_string());
        assert!(!rule.applies_to(&selection));

        let open = ConversionRule::from_formulas("A", "B").unwrap();
        assert!(open.applies_to(&HashMap::new()));
    }
}
