//! ttypager - page a program's own output
//!
//! When both stdout and stderr are attached to a (non-dumb) terminal,
//! [`begin`] starts a pager and points file descriptors 1 and 2 at its
//! input, so everything the program prints, from any library, is paged.
//! [`end`] puts the descriptors back and waits for the user to quit the
//! pager. Anywhere paging doesn't apply, the session is inactive and the
//! program prints normally.
//!
//! # Pager Selection
//!
//! 1. `$PAGER`, split on whitespace
//! 2. `pager` (Debian alternatives)
//! 3. `less`
//! 4. `more`
//!
//! The pager runs with `LESS=FRSM` and `LESSCHARSET=utf-8` added to its
//! environment.
//!
//! # Example
//!
//! ```no_run
//! fn main() -> Result<(), ttypager::PagerError> {
//!     let session = ttypager::begin()?;
//!     for i in 0..10 {
//!         println!("{} hello from my pager!", i);
//!     }
//!     ttypager::end(session)
//! }
//! ```

#[cfg(not(unix))]
compile_error!("ttypager requires a unix-like platform");

pub mod config;
pub mod core;
pub mod error;

pub use crate::config::Config;
pub use crate::core::discovery::PagerCommand;
pub use crate::core::redirect::{FdRedirector, StreamRedirector};
pub use crate::core::session::Session;
pub use crate::core::terminal::{Skip, Terminal};
pub use crate::error::{PagerError, Result};

/// Begin a session using `~/.ttypager/config.toml` or the defaults
pub fn begin() -> Result<Session> {
    Session::begin(&Config::load())
}

/// End a session, blocking until the pager exits
pub fn end(session: Session) -> Result<()> {
    session.end()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io;
    use std::os::fd::RawFd;
    use std::sync::{Arc, Mutex, MutexGuard};

    static SIGNAL_LOCK: Mutex<()> = Mutex::new(());

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a debug-level subscriber on this thread, returning its logs
    pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let result = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap_or_else(|e| e.into_inner())).into_owned();
        (result, logs)
    }

    /// Serializes tests that touch the process-wide SIGINT disposition
    pub fn signal_lock() -> MutexGuard<'static, ()> {
        SIGNAL_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn write_fd(fd: RawFd, data: &[u8]) {
        let n = unsafe { libc::write(fd, data.as_ptr().cast(), data.len()) };
        assert_eq!(n, data.len() as isize);
    }
}
