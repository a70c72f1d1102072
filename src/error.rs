//! Error types for pager sessions.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagerError {
    #[error("Failed to create pager pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("Failed to duplicate {stream} descriptor: {source}")]
    Duplicate {
        stream: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to redirect {stream} into the pager: {source}")]
    Redirect {
        stream: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to restore {stream}: {source}")]
    Restore {
        stream: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to change SIGINT disposition: {0}")]
    Signal(#[source] io::Error),

    #[error("Failed to wait for pager: {0}")]
    Wait(#[source] io::Error),

    #[error("Pager exited abnormally: {0}")]
    PagerExited(ExitStatus),
}

impl PagerError {
    /// Exit status of the pager, if this error came from an abnormal exit
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self {
            PagerError::PagerExited(status) => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PagerError>;
