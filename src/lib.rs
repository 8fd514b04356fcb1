// Copyright 2025 Cowboy AI, LLC.

//! # Climate Categories
//!
//! Categorizations used in climate policy: emission sectors, gases, products,
//! countries and similar classification schemes.
//!
//! This crate provides:
//! - **Categories**: a canonical code plus accepted alternate spellings, a
//!   title, an optional comment and free-form info
//! - **Categorizations**: immutable, named schemes with code lookup that is
//!   tolerant of punctuation, whitespace and case
//! - **Hierarchies**: multiple alternative decompositions of a parent,
//!   levels counted from a top-level category, ancestors and descendants
//! - **Extensions**: derive a new scheme from an existing one by adding
//!   categories and child relations, leaving the original untouched
//! - **Consistency checks**: verify values against the total-sum contract
//! - **Registry**: a set of loaded schemes with cross-scheme code search
//! - **Conversions**: rules relating categories of two schemes
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use climate_categories::{Categorization, CategorizationMetadata, Category, HierarchyDef};
//!
//! let metadata = CategorizationMetadata::new(
//!     "SECTORS",
//!     "Sectors",
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//! );
//! let sectors = Categorization::hierarchical(
//!     metadata,
//!     vec![
//!         Category::new("0", "Total").unwrap(),
//!         Category::with_codes(["1.A", "1A"], "Fuel Combustion").unwrap(),
//!         Category::new("1.B", "Fugitive Emissions").unwrap(),
//!     ],
//!     HierarchyDef::new().children("0", ["1.A", "1.B"]).top_level_category("0"),
//! )
//! .unwrap();
//!
//! assert_eq!(sectors.lookup("1a").unwrap().canonical_code(), "1.A");
//! assert_eq!(sectors.level_of("1 A").unwrap(), 1);
//! ```

#![warn(missing_docs)]

mod categorization;
mod category;
mod code;
mod consistency;
mod conversions;
mod definition;
mod errors;
mod extension;
mod hierarchy;
mod info;
mod registry;

pub use categorization::{Categorization, CategorizationMetadata};
pub use category::Category;
pub use code::{normalize_code, CodeKey};
pub use consistency::{TotalSumConfig, TotalSumReport, TotalSumViolation};
pub use conversions::{
    parse_auxiliary_codes, parse_formula, CodeFactors, ConversionRule, ConversionRules,
    RuleCardinality,
};
pub use definition::{CategorizationDef, CategoryDef};
pub use errors::{CategorizationError, CategorizationResult};
pub use extension::{ExtensionBuilder, HierarchyMode, NewCategory};
pub use hierarchy::{ChildSet, Hierarchy, HierarchyDef};
pub use info::{Info, InfoValue};
pub use registry::{CategorizationRegistry, CodeMatch};
