use thiserror::Error;

/// Errors raised while resolving symbols or driving the override lifecycle.
#[derive(Debug, Error)]
pub enum Error {
    // Neither the local source set nor the delegate knows the symbol
    #[error("symbol `{name}` could not be resolved")]
    Resolution { name: String },

    // A source found the symbol but its definition is unusable
    #[error("symbol `{name}` failed to load: {reason}")]
    Load { name: String, reason: String },

    // Malformed source roots or config file; fatal at construction
    #[error("configuration error: {0}")]
    Configuration(String),

    // Releasing the override's sources failed; fatal for the run
    #[error("failed to release override resolver sources")]
    Teardown {
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn unresolved(name: &str) -> Self {
        Error::Resolution { name: name.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
