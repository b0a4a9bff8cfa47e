use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading a grammar module.
///
/// Every variant means nothing was published: a failed load never leaves a
/// partially populated entry in the module table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("grammar library for {name} not found in {searched:?}")]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("failed to load grammar library {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("grammar library {path} missing language function {symbol}")]
    MissingSymbol {
        path: PathBuf,
        symbol: String,
        #[source]
        source: libloading::Error,
    },

    #[error("module {entry_point} failed to initialize: {message}")]
    Init { entry_point: String, message: String },

    #[error("module {entry_point} published malformed exports: {reason}")]
    MalformedExports { entry_point: String, reason: String },

    #[error("grammar {name} from {entry_point} is already registered by {existing}")]
    DuplicateName {
        name: String,
        entry_point: String,
        existing: String,
    },
}
