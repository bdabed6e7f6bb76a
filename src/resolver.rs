use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use crate::errors::{Error, Result};
use crate::override_resolver::NamespaceOverrideResolver;
use crate::source::SourceSet;
use crate::symbol::{Symbol, SymbolRef};

/// Maps symbol names to loaded instances, usually through a parent chain.
pub trait Resolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<SymbolRef>;

    fn describe(&self) -> String;

    /// Directories this resolver loads from, if it exposes them.
    fn source_roots(&self) -> Vec<PathBuf> { Vec::new() }

    /// Downcast hook so callers can tell an override apart from any other resolver.
    fn as_override(self: Arc<Self>) -> Option<Arc<NamespaceOverrideResolver>> { None }
}

/// Identity of two resolver handles, ignoring vtable metadata.
pub fn same_resolver(a: &Arc<dyn Resolver>, b: &Arc<dyn Resolver>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Per-name cache. Callers asking for the same name are serialized on that
/// name's slot only, so unrelated names resolve in parallel.
#[derive(Default)]
pub(crate) struct SymbolCache {
    slots: Mutex<HashMap<String, Arc<Mutex<Option<SymbolRef>>>>>,
}

impl SymbolCache {
    pub(crate) fn get_or_load<F>(&self, name: &str, load: F) -> Result<SymbolRef>
    where
        F: FnOnce() -> Result<SymbolRef>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(name.to_string()).or_default())
        };
        let mut guard = slot.lock();
        if let Some(sym) = guard.as_ref() {
            debug!(symbol = name, "cache hit");
            return Ok(Arc::clone(sym));
        }
        match load() {
            Ok(sym) => {
                *guard = Some(Arc::clone(&sym));
                Ok(sym)
            }
            Err(e) => {
                drop(guard);
                self.evict_empty(name, &slot);
                Err(e)
            }
        }
    }

    // Drops a slot left empty by a failed load, unless another caller is
    // still waiting on it. Takes the outer lock before the slot lock.
    fn evict_empty(&self, name: &str, slot: &Arc<Mutex<Option<SymbolRef>>>) {
        let mut slots = self.slots.lock();
        let unshared = Arc::strong_count(slot) == 2;
        if unshared && slot.lock().is_none() {
            slots.remove(name);
        }
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.lock().values().filter(|s| s.lock().is_some()).count()
    }
}

/// Ordinary parent-first resolver: asks its parent, then its own sources.
pub struct SourceResolver {
    label: String,
    parent: Option<Arc<dyn Resolver>>,
    roots: Vec<PathBuf>,
    sources: SourceSet,
    cache: SymbolCache,
}

impl SourceResolver {
    pub fn new(label: impl Into<String>, sources: SourceSet) -> Self {
        Self { label: label.into(), parent: None, roots: Vec::new(), sources, cache: SymbolCache::default() }
    }

    /// Directory-backed resolver; the roots are advertised through `source_roots`.
    pub fn from_roots(label: impl Into<String>, roots: Vec<PathBuf>) -> Result<Self> {
        let sources = SourceSet::from_roots(&roots)?;
        Ok(Self { roots, ..Self::new(label, sources) })
    }

    pub fn with_parent(mut self, parent: Arc<dyn Resolver>) -> Self {
        self.parent = Some(parent);
        self
    }

    fn load(&self, name: &str) -> Result<SymbolRef> {
        if let Some(parent) = &self.parent {
            match parent.resolve(name) {
                Ok(sym) => return Ok(sym),
                Err(Error::Resolution { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        match self.sources.find(name)? {
            Some((def, src)) => {
                debug!(resolver = %self.label, symbol = name, source = %src, "loaded");
                Ok(Arc::new(Symbol::new(name, def, format!("{}:{src}", self.label))))
            }
            None => Err(Error::unresolved(name)),
        }
    }
}

impl Resolver for SourceResolver {
    fn resolve(&self, name: &str) -> Result<SymbolRef> {
        self.cache.get_or_load(name, || self.load(name))
    }

    fn describe(&self) -> String { self.label.clone() }

    fn source_roots(&self) -> Vec<PathBuf> { self.roots.clone() }
}
