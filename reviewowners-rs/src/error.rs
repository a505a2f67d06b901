use std::{io, path::PathBuf};

use crate::host::{HostError, PullRequestRef};

/// Errors that end a run. Team lookups never surface here; they are logged
/// and skipped.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing or invalid configuration: {0}")]
    Config(String),

    #[error("failed to read rules file {}", .path.display())]
    ReadRules {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to {operation} for {pr}")]
    Remote {
        operation: &'static str,
        pr: String,
        #[source]
        source: HostError,
    },
}

impl Error {
    pub(crate) fn remote(
        operation: &'static str,
        pr: &PullRequestRef,
    ) -> impl FnOnce(HostError) -> Error {
        let pr = pr.to_string();
        move |source| Error::Remote {
            operation,
            pr,
            source,
        }
    }
}

/// Result type alias using the crate's `Error`.
pub type Result<T> = std::result::Result<T, Error>;
