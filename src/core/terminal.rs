//! Terminal environment snapshot
//!
//! Decides whether a pager session makes sense for the current process.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::io;

use crossterm::tty::IsTty;

use crate::config::{Config, DUMB_TERM};

/// Why a session was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// stdout or stderr is not attached to a terminal
    NotATerminal,
    /// The terminal type is unset, empty or dumb
    DumbTerminal,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::NotATerminal => write!(f, "output is not a terminal"),
            Skip::DumbTerminal => write!(f, "terminal is dumb"),
        }
    }
}

/// Snapshot of the facts a session decides on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terminal {
    pub stdout_tty: bool,
    pub stderr_tty: bool,
    /// Value of the terminal type variable, not necessarily Unicode
    pub term: Option<OsString>,
    /// Value of the pager command variable, not necessarily Unicode
    pub pager: Option<OsString>,
}

impl Terminal {
    /// Read the live process state
    pub fn detect(config: &Config) -> Self {
        Self {
            stdout_tty: io::stdout().is_tty(),
            stderr_tty: io::stderr().is_tty(),
            term: env::var_os(&config.term_var),
            pager: env::var_os(&config.pager_var),
        }
    }

    /// Both streams must be terminals and the terminal must not be dumb
    pub fn eligibility(&self) -> Result<(), Skip> {
        if !self.stdout_tty || !self.stderr_tty {
            return Err(Skip::NotATerminal);
        }
        match self.term.as_deref() {
            Some(term) if term.is_empty() || term == DUMB_TERM => Err(Skip::DumbTerminal),
            Some(_) => Ok(()),
            None => Err(Skip::DumbTerminal),
        }
    }
}
