//! # Tessera Authorization Core
//!
//! Embeddable authorization decisions over ordered, declarative rules.
//!
//! ## Features
//!
//! - **ACL / RBAC** literal, wildcard and glob patterns on subject, resource and action
//! - **ABAC** attribute predicates over subject and resource attributes
//! - **Domains** tenant / namespace scoping with hierarchical patterns
//! - **Paths** resource path templates (`/projects/{id}/**`)
//! - **Priority-first resolution** with stable tie-breaking and default deny
//! - **Ahead-of-time compilation** into content-addressed decision tables
//!
//! ## Example
//!
//! ```rust
//! use tessera_authz::{Action, Effect, Policy, PolicyCompiler, PolicyEvaluator, PolicyRule, Resource, Subject};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = Policy::new(vec![
//!         PolicyRule::allow("role:admin", "delete").resource("doc:*").build()?,
//!         PolicyRule::deny("*", "*").priority(0).build()?,
//!     ]);
//!
//!     let subject = Subject::new("role:admin");
//!     let resource = Resource::new("doc:42");
//!     let action = Action::new("delete");
//!
//!     let effect = PolicyEvaluator::new().evaluate(&policy, &subject, &resource, &action);
//!     assert_eq!(effect, Effect::Allow);
//!
//!     let (compiled, _content_id) = PolicyCompiler::new().compile(&policy)?;
//!     assert_eq!(compiled.decide(&subject, &resource, &action), effect);
//!
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod policy;
pub mod repository;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use compiler::{CompileMode, CompiledCache, CompiledPolicy, ContentId, PolicyCompiler};
pub use engine::{AuthzEngine, EngineConfig, EvaluationMode};
pub use error::{AuthzError, Result};
pub use evaluator::PolicyEvaluator;
pub use matcher::{Operator, Predicate, RuleMatcher};
pub use policy::{Policy, PolicyRule, RuleRecord};
pub use repository::{InMemoryPolicyRepository, PolicyRepository};
pub use resolver::EffectResolver;
pub use types::{
    AccessRequest, Action, Decision, DecisionReason, Domain, Effect, Priority, Resource, Subject,
    DEFAULT_PRIORITY,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
