use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Contract violations raised by the harness itself.
///
/// Any of these means the dump directory can no longer be trusted to mirror
/// what the decoder saw. Drivers return them immediately without purging,
/// and the binary turns them into a process abort.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to read input {}: {source}", path.display())]
    Input { path: PathBuf, source: io::Error },

    #[error("failed to write dump record {}: {source}", path.display())]
    Record { path: PathBuf, source: io::Error },

    #[error("failed to read dump record {}: {source}", path.display())]
    Replay { path: PathBuf, source: io::Error },

    #[error("dump directory {} is unusable: {source}", path.display())]
    DumpDir { path: PathBuf, source: io::Error },
}

impl HarnessError {
    pub fn path(&self) -> &Path {
        match self {
            HarnessError::Input { path, .. }
            | HarnessError::Record { path, .. }
            | HarnessError::Replay { path, .. }
            | HarnessError::DumpDir { path, .. } => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
