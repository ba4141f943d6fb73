// src/extract/mod.rs

//! Text mining for installer output.
//!
//! - [`field`] defines the fixed field set and `StructuredInstallationInfo`.
//! - [`rules`] holds `FieldRule` and the built-in installer patterns.
//! - [`extractor`] applies an ordered rule set with a lenient or strict
//!   absence policy.

pub mod extractor;
pub mod field;
pub mod rules;

pub use extractor::{Extractor, Strictness};
pub use field::{Field, StructuredInstallationInfo};
pub use rules::{FieldRule, PostProcess, installer_rules};
