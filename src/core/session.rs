//! Session management
//!
//! A `Session` ties together the pager process, the saved stdout/stderr
//! descriptors and the SIGINT guard. It is either active (pager running,
//! streams redirected) or inactive, in which case ending it does nothing.
//!
//! If the process dies without ending an active session the pager is
//! orphaned; it sees end of input once the process's descriptors close.
//! A failed restore leaves stdout/stderr pointing wherever they pointed
//! when it failed; there is no recovery from that.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::os::fd::AsFd;
use std::path::PathBuf;

use tracing::{debug, error};

use super::discovery::{self, PagerCommand};
use super::pager::{self, Pager};
use super::redirect::{FdRedirector, Pipe, SavedStreams, StreamRedirector};
use super::signal::InterruptGuard;
use super::terminal::Terminal;
use crate::config::Config;
use crate::error::{PagerError, Result};

struct Active {
    pager: Pager,
    redirector: FdRedirector,
    saved: SavedStreams,
    interrupt: InterruptGuard,
}

/// One pager redirection lifecycle
pub struct Session {
    active: Option<Active>,
}

impl Session {
    /// A session that never paged
    pub fn inactive() -> Self {
        Self { active: None }
    }

    /// Start paging stdout and stderr if the process is on a capable terminal
    /// and some pager starts. Otherwise returns an inactive session.
    pub fn begin(config: &Config) -> Result<Self> {
        Self::begin_for(&Terminal::detect(config), config)
    }

    /// Like `begin`, deciding on an already detected terminal
    pub fn begin_for(terminal: &Terminal, config: &Config) -> Result<Self> {
        if let Err(skip) = terminal.eligibility() {
            debug!("Not paging: {}", skip);
            return Ok(Self::inactive());
        }

        let candidates = discovery::candidates(config, terminal.pager.as_deref());
        Self::start(&candidates, &config.pager_env(), FdRedirector::standard(), discovery::which)
    }

    pub(crate) fn start<F>(
        candidates: &[PagerCommand],
        env: &BTreeMap<String, String>,
        redirector: FdRedirector,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&OsStr) -> Option<PathBuf>,
    {
        let pipe = Pipe::new()?;
        let Some(pager) = pager::spawn_first(candidates, env, &pipe.read, lookup)? else {
            return Ok(Self::inactive());
        };
        drop(pipe.read);

        let saved = match redirector.redirect(pipe.write.as_fd()) {
            Ok(saved) => saved,
            Err(e) => {
                drop(pipe.write);
                abandon(pager);
                return Err(e);
            }
        };
        // fds 1 and 2 now hold the only write ends
        drop(pipe.write);

        let interrupt = match InterruptGuard::ignore() {
            Ok(guard) => guard,
            Err(e) => {
                let _ = unwind(&redirector, saved, pager);
                return Err(e);
            }
        };

        debug!("Paging through {}", pager.name());
        Ok(Self {
            active: Some(Active {
                pager,
                redirector,
                saved,
                interrupt,
            }),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Name of the running pager, if any
    pub fn pager_name(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.pager.name())
    }

    /// End the session, blocking until the pager exits
    pub fn end(mut self) -> Result<()> {
        self.close()
    }

    /// Restore stdout and stderr, wait for the pager and report its status.
    ///
    /// Every teardown step runs even if an earlier one fails; the first
    /// failure is returned. Inactive sessions, including ones already
    /// closed, return `Ok(())` at once.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };

        let restored = active.redirector.restore(active.saved);
        let finished = active.pager.finish();
        let released = active.interrupt.release();

        restored?;
        let status = finished?;
        released?;

        if !status.success() {
            return Err(PagerError::PagerExited(status));
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::inactive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            error!("Failed to close pager session: {}", e);
        }
    }
}

/// Undo a redirection and get rid of the pager after a failed setup.
///
/// If fd 1 or 2 could not be put back it still holds the pipe's write end,
/// the pager never sees EOF, and it has to be killed instead of waited for.
fn unwind(redirector: &FdRedirector, saved: SavedStreams, pager: Pager) -> Result<()> {
    match redirector.restore(saved) {
        Ok(()) => {
            abandon(pager);
            Ok(())
        }
        Err(e) => {
            error!("Failed to restore streams after a failed setup: {}", e);
            if let Err(e) = pager.terminate() {
                debug!("Failed to reap killed pager: {}", e);
            }
            Err(e)
        }
    }
}

/// Reap a pager we won't be using. It sees EOF once the write ends are gone.
fn abandon(pager: Pager) {
    if let Err(e) = pager.finish() {
        debug!("Failed to reap abandoned pager: {}", e);
    }
}
