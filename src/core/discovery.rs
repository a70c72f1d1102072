//! Pager discovery
//!
//! Builds the ordered candidate list and resolves names on the search path.
//! Commands are kept as `OsString`s: a pager variable does not have to be
//! valid Unicode to name a working pager.

use std::borrow::Cow;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;

/// A pager command line. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerCommand {
    /// Full argument vector, program name first
    argv: Vec<OsString>,
}

impl PagerCommand {
    /// Build from an argument vector. An empty vector yields `None`.
    pub fn new<I, S>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    /// Whitespace-tokenize a command line. Blank input yields `None`.
    pub fn parse(command: &str) -> Option<Self> {
        Self::parse_os(OsStr::new(command))
    }

    /// Like `parse`, splitting the raw bytes on ASCII whitespace
    pub fn parse_os(command: &OsStr) -> Option<Self> {
        Self::new(
            command
                .as_bytes()
                .split(|b| b.is_ascii_whitespace())
                .filter(|token| !token.is_empty())
                .map(|token| OsString::from_vec(token.to_vec())),
        )
    }

    /// Program name as given
    pub fn name(&self) -> &OsStr {
        &self.argv[0]
    }

    /// Program name for logs and display
    pub fn display_name(&self) -> Cow<'_, str> {
        self.name().to_string_lossy()
    }

    /// Arguments after the program name
    pub fn args(&self) -> &[OsString] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[OsString] {
        &self.argv
    }
}

/// Candidates in priority order: the pager variable, then the fallbacks
pub fn candidates(config: &Config, pager_var: Option<&OsStr>) -> Vec<PagerCommand> {
    if let Some(value) = pager_var {
        if value.to_str().is_none() {
            debug!(pager = %value.to_string_lossy(), "Pager variable is not valid Unicode, using its raw bytes");
        }
    }

    pager_var
        .into_iter()
        .chain(config.fallbacks.iter().map(OsStr::new))
        .filter_map(PagerCommand::parse_os)
        .collect()
}

/// Resolve `name` against `$PATH`
pub fn which(name: &OsStr) -> Option<PathBuf> {
    find_executable(name, env::var_os("PATH").as_deref())
}

/// Resolve `name` against a search path. Names containing a slash are
/// checked as given.
pub fn find_executable(name: &OsStr, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    if name.as_bytes().contains(&b'/') {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }

    let search_path = search_path?;
    env::split_paths(search_path)
        .map(|dir| {
            // empty entries mean the current directory
            if dir.as_os_str().is_empty() {
                PathBuf::from(".").join(name)
            } else {
                dir.join(name)
            }
        })
        .find(|path| is_executable(path))
}

fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}
