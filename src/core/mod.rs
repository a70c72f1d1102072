//! Core pager session components.
//!
//! - **terminal**: Decides whether paging makes sense (tty, `TERM`)
//! - **discovery**: Pager candidates and `PATH` lookup
//! - **pager**: The spawned pager process
//! - **redirect**: Descriptor-level stdout/stderr substitution
//! - **signal**: SIGINT suppression while the pager runs
//! - **session**: The begin/end lifecycle tying it all together
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── Pager (child process reading the pipe)
//! ├── FdRedirector + SavedStreams (fd 1/2 → pipe, and back)
//! └── InterruptGuard (SIGINT ignored until release)
//! ```

pub mod discovery;
pub mod pager;
pub mod redirect;
pub mod session;
pub mod signal;
pub mod terminal;
