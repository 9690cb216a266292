//! kwconvert Policy Engine
//!
//! Converts NeuVector admission control rules into Kubewarden policies.
//!
//! A rule flows through:
//! - Meta-criterion expansion (bundles such as PSP best practice)
//! - Custom rule diversion to a [`CustomRuleBridge`]
//! - Validation against the [`CriterionRegistry`]
//! - Policy synthesis as a `ClusterAdmissionPolicy` or a
//!   `ClusterAdmissionPolicyGroup`

pub mod builder;
pub mod converter;
pub mod custom;
pub mod factory;
pub mod handlers;
pub mod meta;
pub mod module;
pub mod policy;
pub mod registry;
pub mod validator;

pub use builder::{GroupPolicyBuilder, PolicyBuilder, SinglePolicyBuilder};
pub use converter::{ConversionResult, RuleConverter, RuleOutcome, SummaryEntry, SummaryStatus};
pub use custom::{CustomArtifact, CustomRuleBridge, NoCustomRuleBridge};
pub use factory::PolicyFactory;
pub use handlers::{ApplicableResource, PolicyHandler};
pub use meta::{MetaCriterion, MetaCriterionExpander};
pub use policy::{ClusterAdmissionPolicy, ClusterAdmissionPolicyGroup, Policy};
pub use registry::{CriterionMapping, CriterionRegistry, SupportEntry, ValueShape};
pub use validator::RuleValidator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::converter::{ConversionResult, RuleConverter, RuleOutcome, SummaryEntry, SummaryStatus};
    pub use crate::custom::{CustomArtifact, CustomRuleBridge};
    pub use crate::policy::{ClusterAdmissionPolicy, ClusterAdmissionPolicyGroup, Policy};
    pub use crate::registry::{CriterionRegistry, SupportEntry};
    pub use kwconvert_core::prelude::*;
}
