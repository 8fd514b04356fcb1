// Copyright 2025 Cowboy AI, LLC.

//! Categories - single entries of a categorization

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::code::CodeKey;
use crate::errors::{CategorizationError, CategorizationResult};
use crate::info::{Info, InfoValue};

/// One entry in a categorization.
///
/// A category is identified by its canonical code (the first of its codes);
/// the remaining codes are accepted alternative spellings. Categories are
/// immutable once built and are shared between a categorization and its
/// extensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    codes: Vec<String>,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Info::is_empty")]
    info: Info,
}

impl Category {
    /// Create a category with a single code
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> CategorizationResult<Self> {
        Self::with_codes([code.into()], title)
    }

    /// Create a category from its canonical code followed by alternative codes
    pub fn with_codes<I, S>(codes: I, title: impl Into<String>) -> CategorizationResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let title = title.into();
        let codes: Vec<String> = codes
            .into_iter()
            .map(|code| code.into().trim().to_string())
            .collect();

        let Some(canonical) = codes.first() else {
            return Err(CategorizationError::EmptyCodes { title });
        };

        let mut seen = HashSet::with_capacity(codes.len());
        for code in &codes {
            let key = CodeKey::new(code);
            if key.is_empty() {
                return Err(CategorizationError::InvalidCode {
                    code: code.clone(),
                    reason: format!("blank code in category {title:?}"),
                });
            }
            if !seen.insert(code.as_str()) {
                return Err(CategorizationError::DuplicateCode {
                    code: code.clone(),
                    existing: canonical.clone(),
                    duplicate: canonical.clone(),
                });
            }
        }

        Ok(Self {
            codes,
            title,
            comment: None,
            info: Info::new(),
        })
    }

    /// Attach a free-text comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Replace the info mapping
    pub fn with_info(mut self, info: Info) -> Self {
        self.info = info;
        self
    }

    /// Add a single info entry
    pub fn with_info_value(mut self, key: impl Into<String>, value: impl Into<InfoValue>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }

    /// The canonical code
    pub fn canonical_code(&self) -> &str {
        // construction guarantees at least one code
        &self.codes[0]
    }

    /// All codes, canonical first
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Accepted alternative spellings
    pub fn alternative_codes(&self) -> &[String] {
        &self.codes[1..]
    }

    /// Human-readable name
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Optional notes
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Non-standard metadata
    pub fn info(&self) -> &Info {
        &self.info
    }

    /// Check whether any spelling of `code` names this category
    pub fn matches(&self, code: &str) -> bool {
        let key = CodeKey::new(code);
        self.keys().any(|own| own == key)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = CodeKey> + '_ {
        self.codes.iter().map(|code| CodeKey::new(code))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.canonical_code(), self.title)
    }
}
