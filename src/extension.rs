// Copyright 2025 Cowboy AI, LLC.

//! Extension builder - derive a new categorization from an existing one
//!
//! The base is never touched. The extension references the base's category
//! values, adds the new ones, and builds a fresh code index and hierarchy.
//! Every input is validated before the new categorization is allocated.

use std::collections::HashMap;
use std::iter;
use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::categorization::Categorization;
use crate::category::Category;
use crate::code::CodeKey;
use crate::errors::{CategorizationError, CategorizationResult};
use crate::hierarchy::HierarchyDef;
use crate::info::{Info, InfoValue};

/// A category to add, keyed by its canonical code in the extension request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewCategory {
    /// Human-readable name
    pub title: String,
    /// Optional notes
    #[serde(default)]
    pub comment: Option<String>,
    /// Accepted alternative spellings
    #[serde(default)]
    pub alternative_codes: Vec<String>,
    /// Non-standard metadata
    #[serde(default)]
    pub info: Info,
}

impl NewCategory {
    /// Create a new category request with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Attach a comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Accept another spelling of the code
    pub fn with_alternative_code(mut self, code: impl Into<String>) -> Self {
        self.alternative_codes.push(code.into());
        self
    }

    /// Add a single info entry
    pub fn with_info_value(mut self, key: impl Into<String>, value: impl Into<InfoValue>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }

    fn into_category(self, code: String) -> CategorizationResult<Category> {
        let codes = iter::once(code).chain(self.alternative_codes);
        let category = Category::with_codes(codes, self.title)?.with_info(self.info);
        Ok(match self.comment {
            Some(comment) => category.with_comment(comment),
            None => category,
        })
    }
}

/// How new child-sets combine with the base hierarchy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HierarchyMode {
    /// Add child-sets as further alternative decompositions
    #[default]
    Append,
    /// Drop the base edges; the given child-sets form the whole hierarchy
    Replace,
}

/// Collects additions and metadata overrides for one extension
#[derive(Debug, Clone)]
pub struct ExtensionBuilder<'a> {
    base: &'a Categorization,
    name: String,
    categories: IndexMap<String, NewCategory>,
    children: Vec<(String, Vec<String>)>,
    mode: HierarchyMode,
    title: Option<String>,
    comment: Option<String>,
    references: Option<String>,
    institution: Option<String>,
    last_update: Option<NaiveDate>,
    version: Option<Option<String>>,
    top_level_category: Option<String>,
}

impl<'a> ExtensionBuilder<'a> {
    pub(crate) fn new(base: &'a Categorization, name: impl Into<String>) -> Self {
        Self {
            base,
            name: name.into(),
            categories: IndexMap::new(),
            children: Vec::new(),
            mode: HierarchyMode::Append,
            title: None,
            comment: None,
            references: None,
            institution: None,
            last_update: None,
            version: None,
            top_level_category: None,
        }
    }

    /// Add a category under its canonical code
    pub fn category(mut self, code: impl Into<String>, category: NewCategory) -> Self {
        self.categories.insert(code.into(), category);
        self
    }

    /// Add several categories
    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = (S, NewCategory)>,
        S: Into<String>,
    {
        self.categories
            .extend(categories.into_iter().map(|(code, category)| (code.into(), category)));
        self
    }

    /// Add one child-set for `parent`; base and new codes may be used
    pub fn children<I, S>(mut self, parent: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children
            .push((parent.into(), children.into_iter().map(Into::into).collect()));
        self
    }

    /// Use the given child-sets as the whole hierarchy instead of appending
    pub fn replace_hierarchy(mut self) -> Self {
        self.mode = HierarchyMode::Replace;
        self
    }

    /// Override the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Override the comment
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Override the references
    pub fn references(mut self, references: impl Into<String>) -> Self {
        self.references = Some(references.into());
        self
    }

    /// Override the institution
    pub fn institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = Some(institution.into());
        self
    }

    /// Override the date of the last change
    pub fn last_update(mut self, last_update: NaiveDate) -> Self {
        self.last_update = Some(last_update);
        self
    }

    /// Override the version; `None` clears it
    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = Some(version);
        self
    }

    /// Designate a different top-level category
    pub fn top_level_category(mut self, code: impl Into<String>) -> Self {
        self.top_level_category = Some(code.into());
        self
    }

    /// Validate all additions and produce the extended categorization
    pub fn build(self) -> CategorizationResult<Categorization> {
        let base = self.base;

        let mut added_keys: HashMap<CodeKey, String> = HashMap::new();
        let mut added = Vec::with_capacity(self.categories.len());
        for (code, request) in self.categories {
            let category = request.into_category(code)?;
            for (key, spelling) in category.keys().zip(category.codes()) {
                if let Some(existing) = base.get(spelling) {
                    return Err(CategorizationError::DuplicateCode {
                        code: spelling.clone(),
                        existing: existing.canonical_code().to_string(),
                        duplicate: category.canonical_code().to_string(),
                    });
                }
                if let Some(existing) = added_keys.insert(key, category.canonical_code().to_string()) {
                    if existing == category.canonical_code() {
                        continue;
                    }
                    return Err(CategorizationError::DuplicateCode {
                        code: spelling.clone(),
                        existing,
                        duplicate: category.canonical_code().to_string(),
                    });
                }
            }
            added.push(Arc::new(category));
        }

        let known = |code: &str| base.contains(code) || added_keys.contains_key(&CodeKey::new(code));
        for (parent, children) in &self.children {
            for code in iter::once(parent).chain(children) {
                if !known(code) {
                    return Err(CategorizationError::unknown_code(code.as_str(), self.name.as_str()));
                }
            }
        }
        if let Some(code) = &self.top_level_category {
            if !known(code) {
                return Err(CategorizationError::unknown_code(code.as_str(), self.name.as_str()));
            }
        }

        let hierarchy = match base.hierarchy() {
            Some(hierarchy) => {
                let mut children: Vec<(String, Vec<String>)> = match self.mode {
                    HierarchyMode::Append => base
                        .edge_list()
                        .into_iter()
                        .map(|(parent, set)| (parent, set.into_iter().collect()))
                        .collect(),
                    HierarchyMode::Replace => Vec::new(),
                };
                let added_sets = self.children.len();
                children.extend(self.children);
                info!(
                    base = %base.name(),
                    extension = %self.name,
                    added_sets,
                    mode = ?self.mode,
                    "extending hierarchy"
                );

                Some(HierarchyDef {
                    children,
                    canonical_top_level_category: self
                        .top_level_category
                        .or_else(|| hierarchy.top_level_category().map(str::to_string)),
                    total_sum: hierarchy.total_sum(),
                })
            }
            None if self.children.is_empty() && self.top_level_category.is_none() => None,
            None => return Err(CategorizationError::NotHierarchical(base.name().to_string())),
        };

        let mut metadata = base.metadata().clone();
        metadata.name = self.name;
        if let Some(title) = self.title {
            metadata.title = title;
        }
        if let Some(comment) = self.comment {
            metadata.comment = comment;
        }
        if let Some(references) = self.references {
            metadata.references = references;
        }
        if let Some(institution) = self.institution {
            metadata.institution = institution;
        }
        if let Some(last_update) = self.last_update {
            metadata.last_update = last_update;
        }
        if let Some(version) = self.version {
            metadata.version = version;
        }

        let added_count = added.len();
        let mut categories = base.shared_categories();
        categories.extend(added);

        let extended = Categorization::assemble(metadata, categories, hierarchy)?;
        info!(
            base = %base.name(),
            extension = %extended.name(),
            added_categories = added_count,
            "extended categorization"
        );
        Ok(extended)
    }
}

impl Categorization {
    /// Extend with new categories and additional child-sets.
    ///
    /// All other metadata is copied from `self`; use [`Categorization::extension`]
    /// to override it or to replace the hierarchy.
    pub fn extend(
        &self,
        name: impl Into<String>,
        categories: IndexMap<String, NewCategory>,
        children: Vec<(String, Vec<String>)>,
    ) -> CategorizationResult<Categorization> {
        children
            .into_iter()
            .fold(self.extension(name).categories(categories), |builder, (parent, set)| {
                builder.children(parent, set)
            })
            .build()
    }

    /// Start an extension with the full set of options
    pub fn extension(&self, name: impl Into<String>) -> ExtensionBuilder<'_> {
        ExtensionBuilder::new(self, name)
    }
}
