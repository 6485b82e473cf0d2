//! SSH adapter error types.

use std::path::PathBuf;

/// Errors raised while setting up the SSH adapter.
///
/// Once running, the adapter never returns errors; command failures become
/// failed action results.
#[derive(Debug, thiserror::Error)]
pub enum SshError {
    /// The connection multiplexing directory could not be created.
    #[error("failed to create control directory {path}")]
    ControlDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
