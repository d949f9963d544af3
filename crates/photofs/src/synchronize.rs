// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

//! Cross-process locking and detection of stale caches.
//!
//! Every process that works with the same storage root shares two
//! files: a lock file that exists only while some process holds the
//! lock, and a counter file that is incremented after every write.
//! A process that sees the counter change since it last looked knows
//! that another process has modified the store.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::working_file::WorkingFile;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./synchronize_test.rs"]
mod synchronize_test;

/// The default time to wait for another process to release the lock.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

type StaleCallback = Box<dyn Fn() -> Result<()> + Send + Sync>;

/// A named, file-based lock shared by every process using
/// the same storage root.
pub struct Lock {
    lock_file: PathBuf,
    count_file: PathBuf,
    timeout: Duration,
    last_seen: AtomicU64,
    callbacks: Mutex<Vec<StaleCallback>>,
}

impl std::fmt::Debug for Lock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("lock_file", &self.lock_file)
            .field("count_file", &self.count_file)
            .field("timeout", &self.timeout)
            .field("last_seen", &self.last_seen.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Lock {
    /// Open the lock called `name` in the given directory.
    ///
    /// The write counter is created if it does not exist yet, and
    /// its current value is taken as already seen.
    pub fn open<P: AsRef<Path>>(root: P, name: &str, timeout: Duration) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|err| {
            Error::StorageWriteError("create_dir_all on lock root", root.to_owned(), err)
        })?;
        let count_file = root.join(format!("{name}.count"));
        match std::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&count_file)
        {
            Ok(mut file) => file.write_all(b"0").map_err(|err| {
                Error::StorageWriteError("write of initial count", count_file.clone(), err)
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(err) => {
                return Err(Error::StorageWriteError(
                    "create of count file",
                    count_file,
                    err,
                ));
            }
        }
        let lock = Self {
            lock_file: root.join(format!("{name}.lock")),
            count_file,
            timeout,
            last_seen: AtomicU64::new(0),
            callbacks: Mutex::new(Vec::new()),
        };
        lock.last_seen.store(lock.read_count()?, Ordering::Release);
        Ok(lock)
    }

    pub fn lock_file(&self) -> &Path {
        &self.lock_file
    }

    pub fn count_file(&self) -> &Path {
        &self.count_file
    }

    /// Register a callback to be run when another process
    /// is found to have written to the store.
    pub fn on_stale<F>(&self, callback: F) -> Result<()>
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.callbacks
            .lock()
            .map_err(|err| Error::LockPoisoned(err.to_string()))?
            .push(Box::new(callback));
        Ok(())
    }

    /// Acquire the lock, waiting up to the configured timeout.
    ///
    /// Once held, the stale callbacks are run if the write counter has
    /// changed since this process last saw it. Should any of them fail
    /// the lock is released and the error returned.
    pub fn grab(&self) -> Result<LockGuard<'_>> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match std::fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&self.lock_file)
            {
                Ok(mut file) => {
                    if let Err(err) = write!(file, "{}", std::process::id()) {
                        tracing::warn!(?err, path = ?self.lock_file, "failed to record lock owner");
                    }
                    break;
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(Error::LockUnavailable(
                            self.lock_file.clone(),
                            self.timeout,
                        ));
                    }
                    std::thread::sleep(RETRY_INTERVAL);
                }
                Err(err) => {
                    return Err(Error::StorageWriteError(
                        "open lock file for write exclusively",
                        self.lock_file.clone(),
                        err,
                    ));
                }
            }
        }
        tracing::trace!(path = ?self.lock_file, "lock acquired");
        let guard = LockGuard { lock: self };
        self.check_stale()?;
        Ok(guard)
    }

    /// Check the write counter without taking the lock, running the
    /// stale callbacks if it has changed.
    ///
    /// Returns true if the callbacks were run.
    pub fn refresh(&self) -> Result<bool> {
        self.check_stale()
    }

    fn check_stale(&self) -> Result<bool> {
        let current = self.read_count()?;
        let last_seen = self.last_seen.load(Ordering::Acquire);
        if current <= last_seen {
            return Ok(false);
        }
        tracing::debug!(last_seen, current, "store was modified by another process");
        {
            let callbacks = self
                .callbacks
                .lock()
                .map_err(|err| Error::LockPoisoned(err.to_string()))?;
            for callback in callbacks.iter() {
                callback()?;
            }
        }
        self.last_seen.store(current, Ordering::Release);
        Ok(true)
    }

    fn read_count(&self) -> Result<u64> {
        let data = match std::fs::read_to_string(&self.count_file) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => {
                return Err(Error::StorageReadError(
                    "read of count file",
                    self.count_file.clone(),
                    err,
                ));
            }
        };
        let data = data.trim();
        if data.is_empty() {
            return Ok(0);
        }
        data.parse()
            .map_err(|err| Error::MalformedCount(self.count_file.clone(), err))
    }
}

/// Proof that the [`Lock`] is held, releasing it when dropped.
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a Lock,
}

impl LockGuard<'_> {
    /// Record that this process has written to the store.
    ///
    /// Other processes will find the store stale on their next check,
    /// while this one will not.
    pub fn increment_count(&self) -> Result<u64> {
        let count = self.lock.read_count()? + 1;
        WorkingFile::new(&self.lock.count_file).write(count.to_string().as_bytes())?;
        self.lock.last_seen.store(count, Ordering::Release);
        tracing::debug!(count, "incremented write count");
        Ok(count)
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.lock.lock_file) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(?err, path = ?self.lock.lock_file, "failed to remove lock file");
            }
        }
    }
}
