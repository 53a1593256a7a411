use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("reading filter list {}: {source}", .path.display())]
    ListRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compiling rule storage: {0}")]
    Compile(String),

    #[error("invalid rule {text:?}: {reason}")]
    InvalidRule { text: String, reason: String },

    #[error("invalid dns result: rules are empty")]
    EmptyDnsResult,

    #[error("{name}: {source}")]
    Checker {
        name: &'static str,
        #[source]
        source: Box<FilterError>,
    },

    #[error("upstream check failed: {0}")]
    Upstream(String),
}

impl FilterError {
    /// Wraps an error with the name of the host checker that produced it.
    pub fn in_checker(self, name: &'static str) -> Self {
        FilterError::Checker {
            name,
            source: Box::new(self),
        }
    }
}
