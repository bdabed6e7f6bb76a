use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::errors::{Error, Result};
use crate::override_resolver::NamespacePrefixes;

/// Environment variable listing fallback source roots, like a classpath.
pub const SYMBOL_PATH_ENV: &str = "SYMBOL_PATH";

pub const DEFAULT_PREFIX: &str = "ns.coroutines.";

/// Settings for the override resolver, fixed once the controller is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Names starting with any of these load child-first.
    pub prefixes: Vec<String>,
    /// Used when the delegate does not expose its own roots.
    pub fallback_roots: Vec<PathBuf>,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self { prefixes: vec![DEFAULT_PREFIX.to_string()], fallback_roots: Vec::new() }
    }
}

impl OverrideConfig {
    /// Defaults plus fallback roots taken from `SYMBOL_PATH`.
    pub fn from_env() -> Self {
        let roots = std::env::var_os(SYMBOL_PATH_ENV)
            .map(|v| split_symbol_path(&v))
            .unwrap_or_default();
        Self::default().with_fallback_roots(roots)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text).map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))
    }

    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fallback_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.fallback_roots = roots;
        self
    }

    pub fn namespace_prefixes(&self) -> NamespacePrefixes {
        NamespacePrefixes::new(self.prefixes.iter().cloned())
    }
}

/// Splits a platform path list, dropping empty entries.
pub fn split_symbol_path(value: &std::ffi::OsStr) -> Vec<PathBuf> {
    std::env::split_paths(value).filter(|p| !p.as_os_str().is_empty()).collect()
}
