//! Stream redirection
//!
//! Descriptor-level substitution of stdout and stderr. Everything written to
//! the redirected descriptors, through Rust's `std::io` or any library that
//! writes to fd 1 and 2 directly, ends up in the target.

use std::io::{self, Write};
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use crate::error::{PagerError, Result};

/// Swaps a pair of output streams onto a target and back
pub trait StreamRedirector {
    /// What `redirect` hands back for `restore`
    type Saved;

    /// Point both streams at `target`, keeping copies of the originals
    fn redirect(&self, target: BorrowedFd<'_>) -> Result<Self::Saved>;

    /// Put the original streams back
    fn restore(&self, saved: Self::Saved) -> Result<()>;
}

/// A unidirectional close-on-exec pipe
#[derive(Debug)]
pub struct Pipe {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

impl Pipe {
    pub fn new() -> Result<Self> {
        let mut fds: [libc::c_int; 2] = [-1; 2];
        // SAFETY: fds points at two writable ints
        if unsafe { libc::pipe(fds.as_mut_ptr()) } == -1 {
            return Err(PagerError::Pipe(io::Error::last_os_error()));
        }
        // SAFETY: pipe() succeeded so both fds are open and ours
        let (read, write) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

        set_cloexec(read.as_raw_fd()).map_err(PagerError::Pipe)?;
        set_cloexec(write.as_raw_fd()).map_err(PagerError::Pipe)?;

        Ok(Self { read, write })
    }
}

/// Copies of the original descriptors
#[derive(Debug)]
pub struct SavedStreams {
    pub stdout: OwnedFd,
    pub stderr: OwnedFd,
}

/// Redirects a pair of raw descriptors, stdout and stderr by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdRedirector {
    stdout: RawFd,
    stderr: RawFd,
}

impl Default for FdRedirector {
    fn default() -> Self {
        Self::standard()
    }
}

impl FdRedirector {
    /// The process's real stdout and stderr
    pub fn standard() -> Self {
        Self::new(libc::STDOUT_FILENO, libc::STDERR_FILENO)
    }

    pub fn new(stdout: RawFd, stderr: RawFd) -> Self {
        Self { stdout, stderr }
    }
}

impl StreamRedirector for FdRedirector {
    type Saved = SavedStreams;

    fn redirect(&self, target: BorrowedFd<'_>) -> Result<SavedStreams> {
        let stdout = duplicate(self.stdout).map_err(|source| PagerError::Duplicate {
            stream: "stdout",
            source,
        })?;
        let stderr = duplicate(self.stderr).map_err(|source| PagerError::Duplicate {
            stream: "stderr",
            source,
        })?;

        let _ = io::stdout().flush();
        if let Err(source) = dup2(target.as_raw_fd(), self.stdout) {
            return Err(PagerError::Redirect { stream: "stdout", source });
        }
        if let Err(source) = dup2(target.as_raw_fd(), self.stderr) {
            // put stdout back so the caller is not left half redirected
            let _ = dup2(stdout.as_raw_fd(), self.stdout);
            return Err(PagerError::Redirect { stream: "stderr", source });
        }

        Ok(SavedStreams { stdout, stderr })
    }

    fn restore(&self, saved: SavedStreams) -> Result<()> {
        // A flush can fail once the pager has gone away. Nothing to do about it.
        let _ = io::stdout().flush();
        let stdout = dup2(saved.stdout.as_raw_fd(), self.stdout)
            .map_err(|source| PagerError::Restore { stream: "stdout", source });
        drop(saved.stdout);

        let _ = io::stderr().flush();
        let stderr = dup2(saved.stderr.as_raw_fd(), self.stderr)
            .map_err(|source| PagerError::Restore { stream: "stderr", source });
        drop(saved.stderr);

        stdout.and(stderr)
    }
}

/// Close-on-exec duplicate of `fd`, so later children don't inherit it
fn duplicate(fd: RawFd) -> io::Result<OwnedFd> {
    // SAFETY: fcntl with F_DUPFD_CLOEXEC only reads fd
    let new = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 0) };
    if new == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: fcntl returned a fresh descriptor we now own
    Ok(unsafe { OwnedFd::from_raw_fd(new) })
}

fn dup2(src: RawFd, dst: RawFd) -> io::Result<()> {
    loop {
        // SAFETY: dup2 on descriptors; dst is replaced atomically
        if unsafe { libc::dup2(src, dst) } != -1 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

fn set_cloexec(fd: RawFd) -> io::Result<()> {
    // SAFETY: fcntl on an fd we own
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_fd;
    use std::fs::{self, File};
    use std::io::Read;
    use std::os::fd::AsFd;

    fn is_cloexec(fd: RawFd) -> bool {
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        flags & libc::FD_CLOEXEC != 0
    }

    #[test]
    fn test_pipe_is_cloexec() {
        let pipe = Pipe::new().unwrap();
        assert!(is_cloexec(pipe.read.as_raw_fd()));
        assert!(is_cloexec(pipe.write.as_raw_fd()));
    }

    #[test]
    fn test_pipe_carries_bytes() {
        let pipe = Pipe::new().unwrap();
        write_fd(pipe.write.as_raw_fd(), b"hello");
        drop(pipe.write);

        let mut out = String::new();
        File::from(pipe.read).read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_redirect_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out");
        let err_path = dir.path().join("err");
        let out = File::create(&out_path).unwrap();
        let err = File::create(&err_path).unwrap();
        let redirector = FdRedirector::new(out.as_raw_fd(), err.as_raw_fd());

        let pipe = Pipe::new().unwrap();
        let saved = redirector.redirect(pipe.write.as_fd()).unwrap();
        assert!(is_cloexec(saved.stdout.as_raw_fd()));
        assert!(is_cloexec(saved.stderr.as_raw_fd()));

        write_fd(out.as_raw_fd(), b"one\n");
        write_fd(err.as_raw_fd(), b"two\n");

        redirector.restore(saved).unwrap();
        write_fd(out.as_raw_fd(), b"after out\n");
        write_fd(err.as_raw_fd(), b"after err\n");

        // Only the pipe's own write end should remain
        drop(pipe.write);
        let mut piped = String::new();
        File::from(pipe.read).read_to_string(&mut piped).unwrap();
        assert_eq!(piped, "one\ntwo\n");

        assert_eq!(fs::read_to_string(&out_path).unwrap(), "after out\n");
        assert_eq!(fs::read_to_string(&err_path).unwrap(), "after err\n");
    }

    #[test]
    fn test_redirect_bad_descriptor() {
        let pipe = Pipe::new().unwrap();
        let redirector = FdRedirector::new(-1, -1);
        let err = redirector.redirect(pipe.write.as_fd()).unwrap_err();
        assert!(matches!(err, PagerError::Duplicate { stream: "stdout", .. }));
    }
}
