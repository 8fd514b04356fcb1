// Copyright 2025 Cowboy AI, LLC.

//! Plain data shapes exchanged with loaders
//!
//! Loaders (files, catalogs, databases) live outside this crate. They hand
//! over a [`CategorizationDef`], which mirrors the usual on-disk layout: the
//! scheme metadata next to a map from canonical code to category record,
//! where each record lists its alternative child-sets.

use std::fmt;
use std::iter;

use indexmap::map::Entry;
use indexmap::IndexMap;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::categorization::{Categorization, CategorizationMetadata};
use crate::category::Category;
use crate::errors::{CategorizationError, CategorizationResult};
use crate::hierarchy::HierarchyDef;
use crate::info::Info;

/// One category record as supplied by a loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryDef {
    /// Human-readable name
    pub title: String,
    /// Optional notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Accepted alternative spellings of the code
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_codes: Vec<String>,
    /// Non-standard metadata
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub info: Info,
    /// Alternative child-sets of this category
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Vec<String>>,
}

impl CategoryDef {
    /// Create a record with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            comment: None,
            alternative_codes: Vec::new(),
            info: Info::new(),
            children: Vec::new(),
        }
    }
}

/// A complete categorization as supplied by a loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategorizationDef {
    /// Scheme metadata
    #[serde(flatten)]
    pub metadata: CategorizationMetadata,
    /// True if child-sets are defined
    #[serde(default)]
    pub hierarchical: bool,
    /// Whether child-sets are expected to sum to their parent
    #[serde(default)]
    pub total_sum: bool,
    /// Root used for level computation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_top_level_category: Option<String>,
    /// Category records keyed by canonical code; a repeated key is rejected
    #[serde(deserialize_with = "unique_categories")]
    #[schemars(with = "IndexMap<String, CategoryDef>")]
    pub categories: IndexMap<String, CategoryDef>,
}

fn unique_categories<'de, D>(deserializer: D) -> Result<IndexMap<String, CategoryDef>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueCategories;

    impl<'de> Visitor<'de> for UniqueCategories {
        type Value = IndexMap<String, CategoryDef>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map from category code to category record")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut categories = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((code, record)) = access.next_entry::<String, CategoryDef>()? {
                match categories.entry(code) {
                    Entry::Occupied(entry) => {
                        let code = entry.key().clone();
                        return Err(de::Error::custom(CategorizationError::DuplicateCode {
                            code: code.clone(),
                            existing: code.clone(),
                            duplicate: code,
                        }));
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(record);
                    }
                }
            }
            Ok(categories)
        }
    }

    deserializer.deserialize_map(UniqueCategories)
}

impl CategorizationDef {
    /// JSON schema of the definition format
    pub fn json_schema() -> RootSchema {
        schemars::schema_for!(CategorizationDef)
    }
}

impl Categorization {
    /// Build a categorization from loader data
    pub fn from_def(def: CategorizationDef) -> CategorizationResult<Self> {
        let CategorizationDef {
            metadata,
            hierarchical,
            total_sum,
            canonical_top_level_category,
            categories,
        } = def;

        let mut hierarchy = HierarchyDef {
            children: Vec::new(),
            canonical_top_level_category,
            total_sum,
        };
        let mut built = Vec::with_capacity(categories.len());

        for (code, record) in categories {
            hierarchy
                .children
                .extend(record.children.into_iter().map(|set| (code.clone(), set)));

            let codes = iter::once(code).chain(record.alternative_codes);
            let mut category = Category::with_codes(codes, record.title)?.with_info(record.info);
            if let Some(comment) = record.comment {
                category = category.with_comment(comment);
            }
            built.push(category);
        }

        if hierarchical {
            return Self::hierarchical(metadata, built, hierarchy);
        }
        if hierarchy != HierarchyDef::default() {
            return Err(CategorizationError::NotHierarchical(metadata.name));
        }
        Self::new(metadata, built)
    }

    /// Parse loader data from JSON
    pub fn from_json_str(json: &str) -> CategorizationResult<Self> {
        let def: CategorizationDef = serde_json::from_str(json)?;
        Self::from_def(def)
    }

    /// Export into the loader data shape
    pub fn to_def(&self) -> CategorizationDef {
        let hierarchy = self.hierarchy();
        let categories = self
            .categories()
            .map(|category| {
                let children = hierarchy
                    .map(|hierarchy| {
                        hierarchy
                            .children_of(category.canonical_code())
                            .iter()
                            .map(|set| set.iter().cloned().collect())
                            .collect()
                    })
                    .unwrap_or_default();

                let record = CategoryDef {
                    title: category.title().to_string(),
                    comment: category.comment().map(str::to_string),
                    alternative_codes: category.alternative_codes().to_vec(),
                    info: category.info().clone(),
                    children,
                };
                (category.canonical_code().to_string(), record)
            })
            .collect();

        CategorizationDef {
            metadata: self.metadata().clone(),
            hierarchical: self.is_hierarchical(),
            total_sum: self.total_sum(),
            canonical_top_level_category: hierarchy
                .and_then(|hierarchy| hierarchy.top_level_category())
                .map(str::to_string),
            categories,
        }
    }
}

impl TryFrom<CategorizationDef> for Categorization {
    type Error = CategorizationError;

    fn try_from(def: CategorizationDef) -> Result<Self, Self::Error> {
        Categorization::from_def(def)
    }
}

impl Serialize for Categorization {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_def().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> serde_json::Value {
        json!({
            "name": "IPCC_sample",
            "title": "IPCC sample",
            "comment": "Reduced IPCC 2006 sectors",
            "references": "doi:10.1234/ipcc",
            "institution": "IPCC",
            "last_update": "2010-06-30",
            "version": "2006",
            "hierarchical": true,
            "total_sum": true,
            "canonical_top_level_category": "0",
            "categories": {
                "0": {"title": "National Total", "children": [["1", "2"]]},
                "1": {"title": "Energy", "children": [["1.A", "1.B"]]},
                "1.A": {
                    "title": "Fuel Combustion Activities",
                    "alternative_codes": ["1A"],
                    "info": {"gases": ["CO2", "CH4", "N2O"]}
                },
                "1.B": {"title": "Fugitive emissions from fuels", "alternative_codes": ["1B"]},
                "2": {"title": "Industrial Processes and Product Use", "comment": "IPPU"}
            }
        })
    }

    #[test]
    fn builds_from_loader_data() {
        let cat = Categorization::from_json_str(&sample_json().to_string()).unwrap();

        assert_eq!(cat.name(), "IPCC_sample");
        assert_eq!(cat.version(), Some("2006"));
        assert!(cat.total_sum());
        assert_eq!(cat.lookup("1a").unwrap().title(), "Fuel Combustion Activities");
        assert_eq!(cat.lookup("2").unwrap().comment(), Some("IPPU"));
        assert_eq!(cat.level_of("1B").unwrap(), 2);
    }

    #[test]
    fn export_round_trips() {
        let cat = Categorization::from_json_str(&sample_json().to_string()).unwrap();
        let def = cat.to_def();
        assert_eq!(Categorization::from_def(def.clone()).unwrap(), cat);
        assert_eq!(serde_json::to_value(&cat).unwrap(), serde_json::to_value(&def).unwrap());
    }

    #[test]
    fn children_on_flat_scheme_are_rejected() {
        let mut value = sample_json();
        value["hierarchical"] = json!(false);

        let err = Categorization::from_json_str(&value.to_string()).unwrap_err();
        assert_eq!(err, CategorizationError::NotHierarchical("IPCC_sample".to_string()));
    }

    #[test]
    fn repeated_category_keys_are_rejected() {
        let json = r#"{
            "name": "P",
            "title": "Repeated",
            "last_update": "2020-01-01",
            "categories": {"1.A": {"title": "First"}, "1.A": {"title": "Second"}}
        }"#;

        match Categorization::from_json_str(json) {
            Err(CategorizationError::SerializationError(message)) => {
                assert!(message.contains("Duplicate code \"1.A\""), "{message}");
            }
            other => panic!("expected a duplicate code failure, got {other:?}"),
        }
        assert!(serde_json::from_str::<CategorizationDef>(json).is_err());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = Categorization::from_json_str("{\"name\": 1}").unwrap_err();
        assert!(matches!(err, CategorizationError::SerializationError(_)));
    }

    #[test]
    fn schema_lists_category_records() {
        let schema = serde_json::to_value(CategorizationDef::json_schema()).unwrap();
        assert!(schema["properties"]["categories"].is_object());
        assert!(schema["definitions"]["CategoryDef"].is_object());
    }
}
