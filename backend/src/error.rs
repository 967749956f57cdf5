//! Load-time error taxonomy.
//!
//! Only structural problems are errors. Cell-level coercion failures
//! degrade to `None` fields, and an empty working set after filtering is
//! a state, not an error.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data source not found: {0}")]
    SourceMissing(PathBuf),

    #[error("source has {found} columns, expected at least {expected}")]
    TooFewColumns { found: usize, expected: usize },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
