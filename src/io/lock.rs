use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory write lock on a workspace directory.
///
/// Held for the whole read-modify-write of a mutating command so two `sm`
/// processes never interleave their portfolio replacements.
pub struct WorkspaceLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: {holder} is writing")]
    Timeout { path: PathBuf, holder: String },
}

impl WorkspaceLock {
    /// Lock `<dir>/.lock`, waiting up to `timeout`
    pub fn acquire(dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        while try_lock(&file).is_err() {
            if start.elapsed() >= timeout {
                let holder = holder_of(&lock_path);
                return Err(LockError::Timeout { path: lock_path, holder });
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        // record the holder for whoever times out next
        let mut file = file;
        if let Err(e) = file.set_len(0).and_then(|_| writeln!(file, "{}", std::process::id())) {
            tracing::debug!(error = %e, "could not record lock holder");
        }
        tracing::debug!(path = %lock_path.display(), "workspace lock acquired");
        Ok(WorkspaceLock {
            _file: file,
            path: lock_path,
        })
    }

    pub fn acquire_default(dir: &Path) -> Result<Self, LockError> {
        Self::acquire(dir, Duration::from_secs(5))
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        // flock is released with the file handle
        let _ = fs::remove_file(&self.path);
    }
}

/// `sm (pid N)` from the lock file, or a generic description
fn holder_of(lock_path: &Path) -> String {
    fs::read_to_string(lock_path)
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .map(|pid| format!("sm (pid {})", pid))
        .unwrap_or_else(|| "another sm process".to_string())
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
