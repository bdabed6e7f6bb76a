//! Resolver that loads names under configured prefixes from its own sources
//! before asking the delegate, yielding instances distinct from the delegate's.

use itertools::Itertools;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use crate::errors::{Error, Result};
use crate::resolver::{Resolver, SymbolCache};
use crate::source::SourceSet;
use crate::symbol::{Symbol, SymbolRef};

/// Immutable set of name prefixes eligible for local-first resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespacePrefixes(Vec<String>);

impl NamespacePrefixes {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(prefixes.into_iter().map(Into::into).filter(|p| !p.is_empty()).sorted().dedup().collect())
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.iter().any(|p| name.starts_with(p.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for NamespacePrefixes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}

pub struct NamespaceOverrideResolver {
    delegate: Option<Arc<dyn Resolver>>,
    prefixes: NamespacePrefixes,
    local: SourceSet,
    roots: Vec<PathBuf>,
    cache: SymbolCache,
}

impl NamespaceOverrideResolver {
    /// Wraps `delegate` with an explicit local source set.
    pub fn new(delegate: Option<Arc<dyn Resolver>>, prefixes: NamespacePrefixes, local: SourceSet) -> Self {
        Self { delegate, prefixes, local, roots: Vec::new(), cache: SymbolCache::default() }
    }

    /// Builds the local view from the delegate's own roots, or from
    /// `fallback_roots` when the delegate exposes none.
    pub fn over_delegate(
        delegate: Option<Arc<dyn Resolver>>,
        prefixes: NamespacePrefixes,
        fallback_roots: &[PathBuf],
    ) -> Result<Self> {
        let roots = match delegate.as_ref().map(|d| d.source_roots()) {
            Some(r) if !r.is_empty() => r,
            _ => fallback_roots.to_vec(),
        };
        let local = SourceSet::from_roots(&roots)?;
        Ok(Self { roots, ..Self::new(delegate, prefixes, local) })
    }

    pub fn delegate(&self) -> Option<&Arc<dyn Resolver>> { self.delegate.as_ref() }
    pub fn prefixes(&self) -> &NamespacePrefixes { &self.prefixes }
    pub fn cached_len(&self) -> usize { self.cache.len() }
    pub fn is_closed(&self) -> bool { self.local.is_closed() }

    /// Releases the local source handles. Later local lookups find nothing.
    pub fn close(&self) -> io::Result<()> {
        self.local.close()
    }

    fn delegate_resolve(&self, name: &str) -> Result<SymbolRef> {
        match &self.delegate {
            Some(d) => {
                debug!(symbol = name, delegate = %d.describe(), "delegating");
                d.resolve(name)
            }
            None => Err(Error::unresolved(name)),
        }
    }

    fn load(&self, name: &str) -> Result<SymbolRef> {
        if !self.prefixes.matches(name) {
            return self.delegate_resolve(name);
        }
        match self.local.find(name)? {
            Some((def, src)) => {
                debug!(symbol = name, source = %src, "loaded child-first");
                Ok(Arc::new(Symbol::new(name, def, format!("override:{src}"))))
            }
            None => self.delegate_resolve(name),
        }
    }
}

impl Resolver for NamespaceOverrideResolver {
    fn resolve(&self, name: &str) -> Result<SymbolRef> {
        self.cache.get_or_load(name, || self.load(name))
    }

    fn describe(&self) -> String {
        format!("override{} over {}", self.prefixes, self.delegate.as_ref().map_or_else(|| "<none>".into(), |d| d.describe()))
    }

    fn source_roots(&self) -> Vec<PathBuf> { self.roots.clone() }

    fn as_override(self: Arc<Self>) -> Option<Arc<NamespaceOverrideResolver>> { Some(self) }
}
