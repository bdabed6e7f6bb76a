pub mod errors;
pub mod symbol;
pub mod source;
pub mod resolver;
pub mod override_resolver; // child-first resolver installed for a run
pub mod context;
pub mod config;
pub mod lifecycle;

pub use config::OverrideConfig;
pub use context::AmbientContext;
pub use errors::{Error, Result};
pub use lifecycle::{LifecycleController, RunListener};
pub use override_resolver::{NamespaceOverrideResolver, NamespacePrefixes};
pub use resolver::{Resolver, SourceResolver};
pub use source::{DirectorySource, MemorySource, SourceSet, SymbolSource};
pub use symbol::{same_instance, structurally_equal, Symbol, SymbolRef};
