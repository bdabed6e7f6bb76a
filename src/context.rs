use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use crate::errors::{Error, Result};
use crate::resolver::{same_resolver, Resolver};
use crate::symbol::SymbolRef;

/// The single slot holding the resolver used for unqualified lookups.
///
/// Only the lifecycle controller is expected to write it. Components receive
/// the context they act on as an `Arc<AmbientContext>`; `global()` exists
/// for hosts that really want one process-wide slot.
#[derive(Default)]
pub struct AmbientContext {
    slot: RwLock<Option<Arc<dyn Resolver>>>,
}

impl AmbientContext {
    pub fn new(initial: Option<Arc<dyn Resolver>>) -> Self {
        Self { slot: RwLock::new(initial) }
    }

    pub fn global() -> Arc<AmbientContext> {
        static GLOBAL: OnceLock<Arc<AmbientContext>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(AmbientContext::default())))
    }

    pub fn current(&self) -> Option<Arc<dyn Resolver>> {
        self.slot.read().clone()
    }

    /// Installs `next` and hands back whatever was there.
    pub fn replace(&self, next: Option<Arc<dyn Resolver>>) -> Option<Arc<dyn Resolver>> {
        std::mem::replace(&mut *self.slot.write(), next)
    }

    pub fn is_current(&self, resolver: &Arc<dyn Resolver>) -> bool {
        self.slot.read().as_ref().is_some_and(|cur| same_resolver(cur, resolver))
    }

    /// Resolve through whatever is currently installed.
    pub fn resolve(&self, name: &str) -> Result<SymbolRef> {
        match self.current() {
            Some(r) => r.resolve(name),
            None => Err(Error::unresolved(name)),
        }
    }
}

/// Slot equality: both empty, or both holding the same resolver instance.
pub fn same_slot(a: &Option<Arc<dyn Resolver>>, b: &Option<Arc<dyn Resolver>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => same_resolver(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::SourceResolver;
    use crate::source::{MemorySource, SourceSet};
    use serde_json::json;

    #[test]
    fn replace_returns_previous_value() {
        let a: Arc<dyn Resolver> = Arc::new(SourceResolver::new("a", SourceSet::new()));
        let b: Arc<dyn Resolver> = Arc::new(SourceResolver::new("b", SourceSet::new()));
        let ctx = AmbientContext::new(Some(Arc::clone(&a)));

        let prev = ctx.replace(Some(Arc::clone(&b)));
        assert!(same_slot(&prev, &Some(a)));
        assert!(ctx.is_current(&b));
        assert!(same_slot(&ctx.replace(None), &Some(b)));
        assert!(ctx.current().is_none());
    }

    #[test]
    fn resolve_uses_installed_resolver() {
        let ctx = AmbientContext::default();
        assert!(matches!(ctx.resolve("a.B"), Err(Error::Resolution { .. })));

        ctx.replace(Some(Arc::new(SourceResolver::new(
            "r",
            SourceSet::new().with(MemorySource::new("m").with("a.B", json!(true))),
        ))));
        assert_eq!(ctx.resolve("a.B").unwrap().definition(), &json!(true));
    }

    #[test]
    fn global_is_shared() {
        assert!(Arc::ptr_eq(&AmbientContext::global(), &AmbientContext::global()));
    }
}
