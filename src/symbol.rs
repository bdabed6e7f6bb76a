use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A loaded, named unit. Two loads of the same name from different
/// resolvers produce structurally equal but distinct instances.
#[derive(Debug, Clone, Serialize)]
pub struct Symbol {
    name: String,
    definition: Value,
    /// Which resolver (and source) produced this instance.
    origin: String,
}

/// Shared handle to a loaded symbol. Identity is pointer identity.
pub type SymbolRef = Arc<Symbol>;

impl Symbol {
    pub fn new(name: impl Into<String>, definition: Value, origin: impl Into<String>) -> Self {
        Self { name: name.into(), definition, origin: origin.into() }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn definition(&self) -> &Value { &self.definition }
    pub fn origin(&self) -> &str { &self.origin }
}

// Structural equality ignores where the instance was loaded from.
impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.definition == other.definition
    }
}

impl Eq for Symbol {}

/// Reference-identity check, the comparison downstream consumers rely on.
pub fn same_instance(a: &SymbolRef, b: &SymbolRef) -> bool {
    Arc::ptr_eq(a, b)
}

/// Same name and definition, wherever each instance was loaded from.
pub fn structurally_equal(a: &SymbolRef, b: &SymbolRef) -> bool {
    **a == **b
}
