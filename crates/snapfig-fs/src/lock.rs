//! PID file guarded by an advisory lock
//!
//! The background runner holds the lock for as long as it runs, so a second
//! runner cannot start against the same vault and `status` can tell a live
//! PID file from one left behind by a crash.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// An exclusively locked PID file, removed again on drop.
#[derive(Debug)]
pub struct PidLock {
    file: File,
    path: PathBuf,
    pid: u32,
}

impl PidLock {
    /// Lock the file at `path` and record the current process id in it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] when another process holds the lock.
    pub fn acquire(path: &NormalizedPath) -> Result<Self> {
        let native = path.to_native();
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&native)
            .map_err(|e| Error::io(&native, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(Error::AlreadyRunning {
                path: native,
                pid: read_pid(&mut file),
            });
        }

        let pid = std::process::id();
        file.set_len(0)
            .and_then(|_| file.seek(SeekFrom::Start(0)))
            .and_then(|_| file.write_all(pid.to_string().as_bytes()))
            .and_then(|_| file.sync_all())
            .map_err(|e| Error::io(&native, e))?;

        tracing::debug!(path = %path, pid, "Acquired PID lock");
        Ok(Self {
            file,
            path: native,
            pid,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for PidLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = fs::remove_file(&self.path);
    }
}

/// Id of the live process holding the lock at `path`, if any.
///
/// A file nobody holds the lock on is stale and reported as `None`.
pub fn running_pid(path: &NormalizedPath) -> Result<Option<u32>> {
    let native = path.to_native();
    let mut file = match OpenOptions::new().read(true).write(true).open(&native) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(&native, e)),
    };

    if file.try_lock_exclusive().is_ok() {
        let _ = file.unlock();
        return Ok(None);
    }
    Ok(read_pid(&mut file))
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut content = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut content).ok()?;
    content.trim().parse().ok()
}
