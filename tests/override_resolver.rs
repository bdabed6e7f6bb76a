use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use symbol_isolation::{
    same_instance, structurally_equal, NamespaceOverrideResolver, NamespacePrefixes, Resolver, SourceResolver,
    SourceSet, SymbolSource,
};

const PREFIX: &str = "ns.coroutines.";

/// Knows every name; the definition is derived from the name.
struct AnyName;

impl SymbolSource for AnyName {
    fn label(&self) -> String { "any".into() }

    fn find(&self, name: &str) -> symbol_isolation::Result<Option<Value>> {
        Ok(Some(json!({ "name": name })))
    }
}

fn pair() -> (Arc<dyn Resolver>, NamespaceOverrideResolver) {
    let app: Arc<dyn Resolver> = Arc::new(SourceResolver::new("app", SourceSet::new().with(AnyName)));
    let ov = NamespaceOverrideResolver::new(
        Some(Arc::clone(&app)),
        NamespacePrefixes::new([PREFIX]),
        SourceSet::new().with(AnyName),
    );
    (app, ov)
}

fn matching_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9]{0,10}(\\.[A-Z][A-Za-z0-9]{0,6}){0,2}".prop_map(|s| format!("{PREFIX}{s}"))
}

fn other_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[A-Z][A-Za-z0-9]{0,8}){1,3}"
}

proptest! {
    #[test]
    fn matching_names_are_idempotent_and_diverge_from_delegate(name in matching_name()) {
        let (app, ov) = pair();
        let held = app.resolve(&name).unwrap();

        let first = ov.resolve(&name).unwrap();
        let second = ov.resolve(&name).unwrap();
        prop_assert!(same_instance(&first, &second));
        prop_assert!(!same_instance(&held, &first));
        prop_assert!(structurally_equal(&held, &first));
    }

    #[test]
    fn other_names_are_idempotent_and_match_delegate(name in other_name()) {
        prop_assume!(!name.starts_with(PREFIX));
        let (app, ov) = pair();

        let first = ov.resolve(&name).unwrap();
        let second = ov.resolve(&name).unwrap();
        prop_assert!(same_instance(&first, &second));
        prop_assert!(same_instance(&app.resolve(&name).unwrap(), &first));
    }
}
