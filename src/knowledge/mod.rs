pub mod types;
pub mod loader;

pub use types::*;
pub use loader::*;

use thiserror::Error;

/// Errors raised while loading the knowledge base. All of them are fatal:
/// a process must not start with a partial or corrupt table set.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {file}: {message}")]
    Parse { file: String, message: String },

    #[error("invalid pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("panel {0} defines no name aliases")]
    NoNames(String),

    #[error("panel {0} defines no components")]
    NoComponents(String),

    #[error("duplicate panel id {0}")]
    DuplicatePanel(String),
}
