//! Checked subprocess execution.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Result, StorageError};

/// Run a command to completion and capture its stdout. A nonzero exit
/// becomes an error carrying the command's stderr.
pub fn run_checked<I, S>(program: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| StorageError::Spawn {
            command: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        log::error!(
            "[command] {} exited {:?}: {}",
            program,
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Err(StorageError::command_failed(program, &output));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Block until `path` exists, polling every 50ms up to `total_wait`.
/// Used for loop and partition device nodes the kernel creates
/// asynchronously.
pub fn wait_for_path(path: &Path, total_wait: Duration) -> Result<()> {
    let start = Instant::now();
    while start.elapsed() < total_wait {
        if path.exists() {
            return Ok(());
        }
        thread::sleep(Duration::from_millis(50));
    }
    Err(StorageError::PathTimeout(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_checked_captures_stdout() {
        let out = run_checked("echo", ["hello"]).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn test_run_checked_reports_nonzero_exit() {
        let err = run_checked("false", Vec::<&str>::new()).unwrap_err();
        match err {
            StorageError::Command { command, status, .. } => {
                assert_eq!(command, "false");
                assert_eq!(status, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_checked_missing_program_is_spawn_error() {
        let err = run_checked("definitely-not-a-real-binary", Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, StorageError::Spawn { .. }));
    }

    #[test]
    fn test_wait_for_path_finds_existing_path() {
        wait_for_path(Path::new("/"), Duration::from_millis(100)).unwrap();
    }

    #[test]
    fn test_wait_for_path_times_out() {
        let err = wait_for_path(
            Path::new("/definitely/not/a/real/path"),
            Duration::from_millis(60),
        )
        .unwrap_err();
        assert!(matches!(err, StorageError::PathTimeout(_)));
    }
}
