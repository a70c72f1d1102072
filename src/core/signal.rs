//! SIGINT suppression
//!
//! While a pager session is active the interrupt key belongs to the pager
//! (less uses it to abort a search, for example), so the calling process
//! ignores SIGINT until the guard is released.

use std::io;
use std::mem::MaybeUninit;
use std::ptr;

use tracing::debug;

use crate::error::{PagerError, Result};

/// Ignores SIGINT for as long as it is held
pub struct InterruptGuard {
    previous: Option<libc::sigaction>,
}

impl InterruptGuard {
    /// Ignore SIGINT, remembering the current disposition
    pub fn ignore() -> Result<Self> {
        // SAFETY: a zeroed sigaction is a valid value to fill in
        let mut ignore: libc::sigaction = unsafe { MaybeUninit::zeroed().assume_init() };
        ignore.sa_sigaction = libc::SIG_IGN;
        let mut previous = MaybeUninit::<libc::sigaction>::zeroed();

        // SAFETY: both pointers reference live sigaction values
        let rc = unsafe {
            libc::sigemptyset(&mut ignore.sa_mask);
            libc::sigaction(libc::SIGINT, &ignore, previous.as_mut_ptr())
        };
        if rc == -1 {
            return Err(PagerError::Signal(io::Error::last_os_error()));
        }

        debug!("SIGINT ignored");
        Ok(Self {
            // SAFETY: sigaction filled it in
            previous: Some(unsafe { previous.assume_init() }),
        })
    }

    /// Restore the previous SIGINT disposition. Later calls do nothing.
    pub fn release(&mut self) -> Result<()> {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };
        // SAFETY: previous came from sigaction
        if unsafe { libc::sigaction(libc::SIGINT, &previous, ptr::null_mut()) } == -1 {
            return Err(PagerError::Signal(io::Error::last_os_error()));
        }
        debug!("SIGINT disposition restored");
        Ok(())
    }

    pub fn is_held(&self) -> bool {
        self.previous.is_some()
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
