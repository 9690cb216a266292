//! kwconvert Core
//!
//! Core types shared across kwconvert components.
//!
//! This crate provides:
//! - The admission rule input model (rules, criteria, rule types)
//! - Criterion name and operator vocabularies of the source rule format
//! - Conversion configuration
//! - Error types and result handling

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConversionConfig, PolicyMode};
pub use error::{Error, Result};
pub use types::{AdmissionRule, Criterion, RuleType, RESERVED_RULE_ID_MAX};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConversionConfig, PolicyMode};
    pub use crate::error::{Error, Result};
    pub use crate::types::{criteria, ops, AdmissionRule, Criterion, RuleType};
}
