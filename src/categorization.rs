// Copyright 2025 Cowboy AI, LLC.

//! Categorizations - named classification schemes
//!
//! A categorization owns its categories behind `Arc`s, an index from every
//! normalized code (canonical and alternative) to the owning category, and,
//! for hierarchical schemes, a validated [`Hierarchy`]. It is immutable after
//! construction; extension produces a new value.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::Category;
use crate::code::CodeKey;
use crate::errors::{CategorizationError, CategorizationResult};
use crate::hierarchy::{ChildSet, Hierarchy, HierarchyDef};

/// Descriptive metadata of a categorization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategorizationMetadata {
    /// The unique name/code, e.g. `IPCC2006`
    pub name: String,
    /// A short, descriptive title for humans
    pub title: String,
    /// Notes and explanations for humans
    #[serde(default)]
    pub comment: String,
    /// Citable reference(s)
    #[serde(default)]
    pub references: String,
    /// Where the categorization originates
    #[serde(default)]
    pub institution: String,
    /// The date of the last change
    pub last_update: NaiveDate,
    /// The version, if there are multiple versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl CategorizationMetadata {
    /// Create metadata with empty comment, references and institution
    pub fn new(name: impl Into<String>, title: impl Into<String>, last_update: NaiveDate) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            comment: String::new(),
            references: String::new(),
            institution: String::new(),
            last_update,
            version: None,
        }
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the references
    pub fn with_references(mut self, references: impl Into<String>) -> Self {
        self.references = references.into();
        self
    }

    /// Set the institution
    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = institution.into();
        self
    }

    /// Set the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// A single categorization system
#[derive(Debug, Clone)]
pub struct Categorization {
    metadata: CategorizationMetadata,
    categories: IndexMap<String, Arc<Category>>,
    index: HashMap<CodeKey, Arc<Category>>,
    hierarchy: Option<Hierarchy>,
}

impl Categorization {
    /// Create a flat (non-hierarchical) categorization
    pub fn new(
        metadata: CategorizationMetadata,
        categories: impl IntoIterator<Item = Category>,
    ) -> CategorizationResult<Self> {
        Self::assemble(metadata, categories.into_iter().map(Arc::new).collect(), None)
    }

    /// Create a hierarchical categorization
    pub fn hierarchical(
        metadata: CategorizationMetadata,
        categories: impl IntoIterator<Item = Category>,
        hierarchy: HierarchyDef,
    ) -> CategorizationResult<Self> {
        Self::assemble(
            metadata,
            categories.into_iter().map(Arc::new).collect(),
            Some(hierarchy),
        )
    }

    /// Index categories and validate the hierarchy; nothing is kept on failure.
    pub(crate) fn assemble(
        metadata: CategorizationMetadata,
        categories: Vec<Arc<Category>>,
        hierarchy: Option<HierarchyDef>,
    ) -> CategorizationResult<Self> {
        let mut by_code: IndexMap<String, Arc<Category>> = IndexMap::with_capacity(categories.len());
        let mut index: HashMap<CodeKey, Arc<Category>> = HashMap::new();

        for category in categories {
            for (key, code) in category.keys().zip(category.codes()) {
                if let Some(existing) = index.get(&key) {
                    if Arc::ptr_eq(existing, &category) {
                        continue;
                    }
                    return Err(CategorizationError::DuplicateCode {
                        code: code.clone(),
                        existing: existing.canonical_code().to_string(),
                        duplicate: category.canonical_code().to_string(),
                    });
                }
                index.insert(key, Arc::clone(&category));
            }
            by_code.insert(category.canonical_code().to_string(), category);
        }

        let hierarchy = match hierarchy {
            Some(def) => Some(resolve_hierarchy(&metadata.name, &index, def)?),
            None => None,
        };

        debug!(
            categorization = %metadata.name,
            categories = by_code.len(),
            codes = index.len(),
            hierarchical = hierarchy.is_some(),
            "indexed categorization"
        );

        Ok(Self {
            metadata,
            categories: by_code,
            index,
            hierarchy,
        })
    }

    /// All descriptive metadata
    pub fn metadata(&self) -> &CategorizationMetadata {
        &self.metadata
    }

    /// The unique name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// The human-readable title
    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// Notes and explanations
    pub fn comment(&self) -> &str {
        &self.metadata.comment
    }

    /// Citable reference(s)
    pub fn references(&self) -> &str {
        &self.metadata.references
    }

    /// Originating institution
    pub fn institution(&self) -> &str {
        &self.metadata.institution
    }

    /// Date of the last change
    pub fn last_update(&self) -> NaiveDate {
        self.metadata.last_update
    }

    /// Version, if the scheme has several
    pub fn version(&self) -> Option<&str> {
        self.metadata.version.as_deref()
    }

    /// True if parents and children are defined
    pub fn is_hierarchical(&self) -> bool {
        self.hierarchy.is_some()
    }

    /// Whether child-sets are expected to sum to their parent
    pub fn total_sum(&self) -> bool {
        self.hierarchy.as_ref().is_some_and(Hierarchy::total_sum)
    }

    /// The hierarchy of a hierarchical scheme
    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref()
    }

    /// The root used for level computation
    pub fn canonical_top_level_category(&self) -> Option<&Arc<Category>> {
        self.hierarchy
            .as_ref()
            .and_then(Hierarchy::top_level_category)
            .and_then(|code| self.categories.get(code))
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// True if the scheme has no categories
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// All categories in definition order
    pub fn categories(&self) -> impl Iterator<Item = &Arc<Category>> {
        self.categories.values()
    }

    /// Canonical codes in definition order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Every accepted code, canonical and alternative
    pub fn all_codes(&self) -> impl Iterator<Item = &str> {
        self.categories
            .values()
            .flat_map(|category| category.codes().iter().map(String::as_str))
    }

    /// Resolve any spelling of a code to its category
    pub fn lookup(&self, code: &str) -> CategorizationResult<&Arc<Category>> {
        self.get(code)
            .ok_or_else(|| CategorizationError::unknown_code(code, self.name()))
    }

    /// Resolve a code, or `None` if no category matches
    pub fn get(&self, code: &str) -> Option<&Arc<Category>> {
        self.index.get(&CodeKey::new(code))
    }

    /// Check whether any category matches the code
    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(&CodeKey::new(code))
    }

    /// Every alternative child-set of the category.
    ///
    /// Each inner vector is one set, ordered by canonical code. Leaves and
    /// categories of flat schemes have no child-sets.
    pub fn children_of(&self, code: &str) -> CategorizationResult<Vec<Vec<&Arc<Category>>>> {
        let category = self.lookup(code)?;
        let Some(hierarchy) = &self.hierarchy else {
            return Ok(Vec::new());
        };

        Ok(hierarchy
            .children_of(category.canonical_code())
            .iter()
            .map(|set| self.resolve_all(set.iter()))
            .collect())
    }

    /// Every category listing this one in any of its child-sets
    pub fn parents_of(&self, code: &str) -> CategorizationResult<Vec<&Arc<Category>>> {
        let category = self.lookup(code)?;
        let Some(hierarchy) = &self.hierarchy else {
            return Ok(Vec::new());
        };

        Ok(self.resolve_all(hierarchy.parents_of(category.canonical_code()).iter()))
    }

    /// Minimum number of parent hops up to the canonical top-level category
    pub fn level_of(&self, code: &str) -> CategorizationResult<usize> {
        let category = self.lookup(code)?;
        let top = self
            .hierarchy
            .as_ref()
            .and_then(Hierarchy::top_level_category)
            .ok_or_else(|| CategorizationError::LevelUndefined {
                categorization: self.name().to_string(),
            })?;

        self.hierarchy
            .as_ref()
            .and_then(|hierarchy| hierarchy.level_of(category.canonical_code()))
            .ok_or_else(|| CategorizationError::UnreachableCategory {
                code: category.canonical_code().to_string(),
                categorization: self.name().to_string(),
                top: top.to_string(),
            })
    }

    /// All categories below this one in any decomposition
    pub fn descendants_of(&self, code: &str) -> CategorizationResult<Vec<&Arc<Category>>> {
        let category = self.lookup(code)?;
        Ok(match &self.hierarchy {
            Some(hierarchy) => {
                self.resolve_all(hierarchy.descendants_of(category.canonical_code()).iter())
            }
            None => Vec::new(),
        })
    }

    /// All categories above this one
    pub fn ancestors_of(&self, code: &str) -> CategorizationResult<Vec<&Arc<Category>>> {
        let category = self.lookup(code)?;
        Ok(match &self.hierarchy {
            Some(hierarchy) => {
                self.resolve_all(hierarchy.ancestors_of(category.canonical_code()).iter())
            }
            None => Vec::new(),
        })
    }

    /// True if the category has no child-sets
    pub fn is_leaf(&self, code: &str) -> CategorizationResult<bool> {
        let category = self.lookup(code)?;
        Ok(self
            .hierarchy
            .as_ref()
            .map_or(true, |hierarchy| hierarchy.is_leaf(category.canonical_code())))
    }

    pub(crate) fn shared_categories(&self) -> Vec<Arc<Category>> {
        self.categories.values().cloned().collect()
    }

    pub(crate) fn edge_list(&self) -> Vec<(String, ChildSet)> {
        self.hierarchy
            .as_ref()
            .map(Hierarchy::edge_list)
            .unwrap_or_default()
    }

    fn resolve_all<'a, I>(&self, codes: I) -> Vec<&Arc<Category>>
    where
        I: Iterator<Item = &'a String>,
    {
        codes
            .filter_map(|code| self.categories.get(code.as_str()))
            .collect()
    }
}

impl PartialEq for Categorization {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
            && self.categories == other.categories
            && self.hierarchy == other.hierarchy
    }
}

impl Display for Categorization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.metadata.name)
    }
}

/// Resolve every code of the definition to a canonical code and build the hierarchy
fn resolve_hierarchy(
    name: &str,
    index: &HashMap<CodeKey, Arc<Category>>,
    def: HierarchyDef,
) -> CategorizationResult<Hierarchy> {
    let canonical = |code: &str| -> CategorizationResult<String> {
        index
            .get(&CodeKey::new(code))
            .map(|category| category.canonical_code().to_string())
            .ok_or_else(|| CategorizationError::unknown_code(code, name))
    };

    let mut edges = Vec::with_capacity(def.children.len());
    for (parent, children) in &def.children {
        let set = children
            .iter()
            .map(|child| canonical(child.as_str()))
            .collect::<CategorizationResult<ChildSet>>()?;
        edges.push((canonical(parent.as_str())?, set));
    }

    let top = def
        .canonical_top_level_category
        .as_deref()
        .map(canonical)
        .transpose()?;

    Hierarchy::build(name, edges, top, def.total_sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(name: &str) -> CategorizationMetadata {
        CategorizationMetadata::new(name, "Test", NaiveDate::from_ymd_opt(2021, 1, 1).unwrap())
    }

    fn categories() -> Vec<Category> {
        vec![
            Category::new("0", "National Total").unwrap(),
            Category::with_codes(["1", "1.0"], "Energy").unwrap(),
            Category::with_codes(["1.A", "1A"], "Fuel Combustion").unwrap(),
            Category::new("2", "Industrial Processes").unwrap(),
        ]
    }

    #[test]
    fn lookup_resolves_alternative_codes() {
        let cat = Categorization::new(metadata("flat"), categories()).unwrap();

        assert_eq!(cat.lookup("1A").unwrap().canonical_code(), "1.A");
        assert_eq!(cat.lookup("1.a").unwrap().canonical_code(), "1.A");
        assert!(cat.contains("1.0"));
        assert!(!cat.contains("3"));
        assert_eq!(cat.len(), 4);
        assert_eq!(cat.all_codes().count(), 6);
    }

    #[test]
    fn unknown_code_is_an_error() {
        let cat = Categorization::new(metadata("flat"), categories()).unwrap();
        assert_eq!(
            cat.lookup("does-not-exist").unwrap_err(),
            CategorizationError::unknown_code("does-not-exist", "flat")
        );
    }

    #[test]
    fn duplicate_codes_across_categories_fail() {
        let mut cats = categories();
        cats.push(Category::new("1 A", "Clash").unwrap());

        let err = Categorization::new(metadata("clash"), cats).unwrap_err();
        assert_eq!(
            err,
            CategorizationError::DuplicateCode {
                code: "1 A".to_string(),
                existing: "1.A".to_string(),
                duplicate: "1 A".to_string(),
            }
        );
    }

    #[test]
    fn flat_scheme_has_no_hierarchy() {
        let cat = Categorization::new(metadata("flat"), categories()).unwrap();

        assert!(!cat.is_hierarchical());
        assert!(!cat.total_sum());
        assert!(cat.children_of("1").unwrap().is_empty());
        assert!(cat.parents_of("1").unwrap().is_empty());
        assert!(cat.is_leaf("1").unwrap());
        assert!(matches!(
            cat.level_of("1"),
            Err(CategorizationError::LevelUndefined { .. })
        ));
    }

    #[test]
    fn dangling_edges_are_rejected_at_construction() {
        let err = Categorization::hierarchical(
            metadata("dangling"),
            categories(),
            HierarchyDef::new().children("1", ["1.A", "1.B"]),
        )
        .unwrap_err();
        assert_eq!(err, CategorizationError::unknown_code("1.B", "dangling"));
    }

    #[test]
    fn hierarchy_codes_may_use_alternative_spellings() {
        let cat = Categorization::hierarchical(
            metadata("tree"),
            categories(),
            HierarchyDef::new()
                .children("0", ["1.0", "2"])
                .children("1", ["1A"])
                .top_level_category("0")
                .total_sum(true),
        )
        .unwrap();

        assert!(cat.total_sum());
        assert_eq!(cat.canonical_top_level_category().unwrap().canonical_code(), "0");
        assert_eq!(cat.level_of("1a").unwrap(), 2);

        let parents: Vec<&str> = cat
            .parents_of("1.A")
            .unwrap()
            .into_iter()
            .map(|category| category.canonical_code())
            .collect();
        assert_eq!(parents, ["1"]);
    }

    #[test]
    fn unreachable_category_has_no_level() {
        let cat = Categorization::hierarchical(
            metadata("tree"),
            categories(),
            HierarchyDef::new().children("0", ["1"]).top_level_category("0"),
        )
        .unwrap();

        assert!(matches!(
            cat.level_of("2"),
            Err(CategorizationError::UnreachableCategory { .. })
        ));
    }
}
