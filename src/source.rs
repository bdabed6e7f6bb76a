use serde_json::Value;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use crate::errors::{Error, Result};

/// A place symbol definitions can be loaded from.
pub trait SymbolSource: Send + Sync {
    /// Human-readable label, recorded as part of a symbol's origin.
    fn label(&self) -> String;
    /// Look up the raw definition for `name`. `Ok(None)` means not here.
    fn find(&self, name: &str) -> Result<Option<Value>>;
    /// Release whatever handles the source holds.
    fn close(&self) -> io::Result<()> { Ok(()) }
}

/// Symbols stored as `<root>/a/b/C.json` for the name `a.b.C`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::Configuration(format!(
                "source root `{}` is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path { &self.root }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in name.split('.') {
            // rejects empty segments as well as anything that could escape the root
            if segment.is_empty() || segment.contains(['/', '\\']) {
                return None;
            }
            path.push(segment);
        }
        path.set_extension("json");
        Some(path)
    }
}

impl SymbolSource for DirectorySource {
    fn label(&self) -> String { self.root.display().to_string() }

    fn find(&self, name: &str) -> Result<Option<Value>> {
        let Some(path) = self.path_for(name) else { return Ok(None) };
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Load { name: name.to_string(), reason: format!("{}: {e}", path.display()) })
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| Error::Load { name: name.to_string(), reason: format!("{}: {e}", path.display()) })
    }
}

/// In-memory source, handy for hosts that synthesize symbols.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    label: String,
    defs: HashMap<String, Value>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), defs: HashMap::new() }
    }

    pub fn with(mut self, name: impl Into<String>, definition: Value) -> Self {
        self.defs.insert(name.into(), definition);
        self
    }
}

impl SymbolSource for MemorySource {
    fn label(&self) -> String { self.label.clone() }

    fn find(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.defs.get(name).cloned())
    }
}

/// Ordered list of sources. The first source that knows a name wins.
#[derive(Default)]
pub struct SourceSet {
    sources: Vec<Box<dyn SymbolSource>>,
    closed: AtomicBool,
}

impl SourceSet {
    pub fn new() -> Self { Self::default() }

    /// Open a directory source per root. Any bad root fails the whole set.
    pub fn from_roots<P: AsRef<Path>>(roots: &[P]) -> Result<Self> {
        let mut set = Self::new();
        for root in roots {
            set.push(DirectorySource::open(root.as_ref())?);
        }
        Ok(set)
    }

    pub fn push<S: SymbolSource + 'static>(&mut self, source: S) {
        self.sources.push(Box::new(source));
    }

    pub fn with<S: SymbolSource + 'static>(mut self, source: S) -> Self {
        self.push(source);
        self
    }

    pub fn len(&self) -> usize { self.sources.len() }
    pub fn is_empty(&self) -> bool { self.sources.is_empty() }
    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }

    /// Returns the definition and the label of the source that held it.
    /// A closed set finds nothing.
    pub fn find(&self, name: &str) -> Result<Option<(Value, String)>> {
        if self.is_closed() {
            return Ok(None);
        }
        for source in &self.sources {
            if let Some(def) = source.find(name)? {
                return Ok(Some((def, source.label())));
            }
        }
        Ok(None)
    }

    /// Closes every source even if one fails; reports the first failure.
    /// Closing twice is a no-op.
    pub fn close(&self) -> io::Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut first_err = None;
        for source in &self.sources {
            if let Err(e) = source.close() {
                debug!(source = %source.label(), error = %e, "source failed to close");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn directory_source_maps_dotted_names_to_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ns/coroutines")).unwrap();
        std::fs::write(dir.path().join("ns/coroutines/Marker.json"), r#"{"kind":"interface"}"#).unwrap();

        let src = DirectorySource::open(dir.path()).unwrap();
        assert_eq!(src.find("ns.coroutines.Marker").unwrap(), Some(json!({"kind": "interface"})));
        assert_eq!(src.find("ns.coroutines.Missing").unwrap(), None);
        assert_eq!(src.find("ns..Marker").unwrap(), None);
    }

    #[test]
    fn directory_source_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirectorySource::open(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn malformed_definition_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Broken.json"), "{not json").unwrap();
        let src = DirectorySource::open(dir.path()).unwrap();
        assert!(matches!(src.find("Broken"), Err(Error::Load { .. })));
    }

    #[test]
    fn first_source_wins_and_closed_set_finds_nothing() {
        let set = SourceSet::new()
            .with(MemorySource::new("a").with("x.Y", json!(1)))
            .with(MemorySource::new("b").with("x.Y", json!(2)));
        assert_eq!(set.find("x.Y").unwrap(), Some((json!(1), "a".to_string())));

        set.close().unwrap();
        assert!(set.is_closed());
        assert_eq!(set.find("x.Y").unwrap(), None);
        set.close().unwrap();
    }
}
