use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::slot::Slot;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to write {slot} to {}: {source}", path.display())]
    WriteState {
        slot: Slot,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {slot} from {}: {source}", path.display())]
    ReadState {
        slot: Slot,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("battery I/O failed for {}: {source}", path.display())]
    Battery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("screen capture to {} failed: {source}", path.display())]
    Screenshot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::WriteState { path, .. }
            | Self::ReadState { path, .. }
            | Self::Battery { path, .. }
            | Self::Screenshot { path, .. } => path,
        }
    }
}
