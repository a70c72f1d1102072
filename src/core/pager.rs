//! Pager process
//!
//! A spawned `Pager` is running until `finish` consumes it and hands back
//! the exit status, so it can only ever be waited on once.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::{debug, info, warn};

use super::discovery::PagerCommand;
use crate::error::{PagerError, Result};

/// A running pager process
#[derive(Debug)]
pub struct Pager {
    name: String,
    child: Child,
}

impl Pager {
    /// Start `command` from `program` with stdin on `input`.
    ///
    /// stdout and stderr are inherited, so the pager draws on whatever the
    /// process's real streams point at when this is called.
    pub fn spawn(
        command: &PagerCommand,
        program: &Path,
        env: &BTreeMap<String, String>,
        input: OwnedFd,
    ) -> io::Result<Self> {
        let child = Command::new(program)
            .arg0(command.name())
            .args(command.args())
            .envs(env)
            .stdin(Stdio::from(input))
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        Ok(Self {
            name: command.display_name().into_owned(),
            child,
        })
    }

    /// Name the pager was started under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Wake the pager in case job control stopped it, then block until it exits
    pub fn finish(mut self) -> Result<ExitStatus> {
        self.resume();
        let status = self.child.wait().map_err(PagerError::Wait)?;
        debug!("Pager {} exited: {}", self.name, status);
        Ok(status)
    }

    /// Kill the pager and reap it, for when its input can't be closed
    pub fn terminate(mut self) -> Result<ExitStatus> {
        // fails only if the child already exited, which wait handles
        let _ = self.child.kill();
        let status = self.child.wait().map_err(PagerError::Wait)?;
        debug!("Pager {} terminated: {}", self.name, status);
        Ok(status)
    }

    fn resume(&self) {
        // SAFETY: plain kill(2) on our own child
        if unsafe { libc::kill(self.child.id() as libc::pid_t, libc::SIGCONT) } == -1 {
            let err = io::Error::last_os_error();
            // already reaped or gone
            if err.raw_os_error() != Some(libc::ESRCH) {
                warn!("Failed to send SIGCONT to pager {}: {}", self.name, err);
            }
        }
    }
}

/// Start the first candidate that resolves and spawns.
///
/// Every candidate is tried at most once. Skips are logged at debug level
/// with their reason; a single warning is logged if nothing starts.
pub fn spawn_first<F>(
    candidates: &[PagerCommand],
    env: &BTreeMap<String, String>,
    input: &OwnedFd,
    lookup: F,
) -> Result<Option<Pager>>
where
    F: Fn(&OsStr) -> Option<PathBuf>,
{
    for command in candidates {
        let Some(program) = lookup(command.name()) else {
            debug!(pager = %command.display_name(), "Pager candidate not found on PATH");
            continue;
        };
        let stdin = input.try_clone().map_err(PagerError::Pipe)?;
        match Pager::spawn(command, &program, env, stdin) {
            Ok(pager) => {
                info!("Started pager {} ({}) pid {}", pager.name(), program.display(), pager.id());
                return Ok(Some(pager));
            }
            Err(e) => {
                debug!(pager = %command.display_name(), error = %e, "Pager candidate failed to start");
            }
        }
    }

    warn!("Failed to find a suitable pager, continuing without one");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::redirect::Pipe;
    use crate::test_support::write_fd;
    use std::fs;
    use std::os::fd::AsRawFd;
    use std::os::unix::process::ExitStatusExt;

    fn sh(script: &str) -> PagerCommand {
        PagerCommand::new(["sh", "-c", script]).unwrap()
    }

    fn bin_sh(_: &OsStr) -> Option<PathBuf> {
        Some(PathBuf::from("/bin/sh"))
    }

    #[test]
    fn test_pager_reads_pipe_with_env() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut env = BTreeMap::new();
        env.insert("OUT".to_string(), out.to_str().unwrap().to_string());
        env.insert("LESS".to_string(), "FRSM".to_string());

        let pipe = Pipe::new().unwrap();
        let pager = Pager::spawn(
            &sh("printf '%s\\n' \"$LESS\" > \"$OUT\"; cat >> \"$OUT\""),
            Path::new("/bin/sh"),
            &env,
            pipe.read,
        )
        .unwrap();
        assert_eq!(pager.name(), "sh");

        write_fd(pipe.write.as_raw_fd(), b"paged\n");
        drop(pipe.write);

        let status = pager.finish().unwrap();
        assert!(status.success());
        assert_eq!(fs::read_to_string(&out).unwrap(), "FRSM\npaged\n");
    }

    #[test]
    fn test_abnormal_exit_status() {
        let pipe = Pipe::new().unwrap();
        let pager = Pager::spawn(&sh("exit 3"), Path::new("/bin/sh"), &BTreeMap::new(), pipe.read).unwrap();

        let status = pager.finish().unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_killed_pager() {
        let pipe = Pipe::new().unwrap();
        let pager = Pager::spawn(&sh("exec sleep 30"), Path::new("/bin/sh"), &BTreeMap::new(), pipe.read).unwrap();

        unsafe { libc::kill(pager.id() as libc::pid_t, libc::SIGKILL) };
        let status = pager.finish().unwrap();
        assert!(!status.success());
        assert_eq!(status.signal(), Some(libc::SIGKILL));
    }

    #[test]
    fn test_terminate_blocked_pager() {
        let pipe = Pipe::new().unwrap();
        let pager = Pager::spawn(&sh("cat > /dev/null"), Path::new("/bin/sh"), &BTreeMap::new(), pipe.read).unwrap();

        // the write end stays open, so only a kill ends the pager
        let status = pager.terminate().unwrap();
        assert!(!status.success());
        drop(pipe.write);
    }

    #[test]
    fn test_spawn_first_skips_unresolved() {
        let pipe = Pipe::new().unwrap();
        let candidates = vec![
            PagerCommand::parse("nonexistent-pager").unwrap(),
            sh("exit 0"),
        ];
        let lookup = |name: &OsStr| if name == "sh" { bin_sh(name) } else { None };

        let pager = spawn_first(&candidates, &BTreeMap::new(), &pipe.read, lookup)
            .unwrap()
            .unwrap();
        assert_eq!(pager.name(), "sh");
        assert!(pager.finish().unwrap().success());
    }

    #[test]
    fn test_spawn_first_skips_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pipe = Pipe::new().unwrap();
        let broken = dir.path().join("broken");
        let candidates = vec![PagerCommand::parse("broken").unwrap(), sh("exit 0")];
        let lookup = |name: &OsStr| {
            if name == "broken" {
                // a path that cannot be executed
                Some(broken.clone())
            } else {
                bin_sh(name)
            }
        };

        let pager = spawn_first(&candidates, &BTreeMap::new(), &pipe.read, lookup)
            .unwrap()
            .unwrap();
        assert_eq!(pager.name(), "sh");
        pager.finish().unwrap();
    }

    #[test]
    fn test_spawn_first_none() {
        let pipe = Pipe::new().unwrap();
        let candidates = vec![PagerCommand::parse("less").unwrap()];
        let pager = spawn_first(&candidates, &BTreeMap::new(), &pipe.read, |_| None).unwrap();
        assert!(pager.is_none());
    }
}
