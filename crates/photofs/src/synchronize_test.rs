// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rstest::rstest;

use super::Lock;
use crate::Error;

fixtures!();

fn open(dir: &std::path::Path) -> Lock {
    Lock::open(dir, "photofs", Duration::from_millis(100)).expect("failed to open lock")
}

fn counting(lock: &Lock) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    lock.on_stale(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();
    calls
}

#[rstest]
fn test_open_initializes_counter(tmpdir: tempfile::TempDir) {
    let lock = open(tmpdir.path());
    let count = std::fs::read_to_string(lock.count_file()).unwrap();
    assert_eq!(count, "0");
    assert!(!lock.lock_file().exists());
}

#[rstest]
fn test_guard_releases_lock(tmpdir: tempfile::TempDir) {
    let lock = open(tmpdir.path());
    {
        let _guard = lock.grab().unwrap();
        assert!(lock.lock_file().exists());
    }
    assert!(!lock.lock_file().exists());
    drop(lock.grab().unwrap());
}

#[rstest]
fn test_grab_times_out(tmpdir: tempfile::TempDir) {
    let a = open(tmpdir.path());
    let b = open(tmpdir.path());
    let _held = a.grab().unwrap();
    let res = b.grab();
    assert!(matches!(res, Err(Error::LockUnavailable(..))));
}

#[rstest]
fn test_stale_callback_runs_once(tmpdir: tempfile::TempDir) {
    init_logging();
    let a = open(tmpdir.path());
    let b = open(tmpdir.path());
    let calls = counting(&a);

    {
        let guard = b.grab().unwrap();
        guard.increment_count().unwrap();
        guard.increment_count().unwrap();
    }
    {
        let guard = b.grab().unwrap();
        assert_eq!(guard.increment_count().unwrap(), 3);
    }

    drop(a.grab().unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    drop(a.grab().unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1, "should not run again without writes");
}

#[rstest]
fn test_own_writes_are_not_stale(tmpdir: tempfile::TempDir) {
    let a = open(tmpdir.path());
    let calls = counting(&a);
    {
        let guard = a.grab().unwrap();
        guard.increment_count().unwrap();
    }
    drop(a.grab().unwrap());
    assert!(!a.refresh().unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
fn test_refresh_without_lock(tmpdir: tempfile::TempDir) {
    let a = open(tmpdir.path());
    let b = open(tmpdir.path());
    let calls = counting(&a);
    b.grab().unwrap().increment_count().unwrap();

    let _held = b.grab().unwrap();
    assert!(a.refresh().unwrap(), "refresh should not need the lock");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[rstest]
fn test_failed_callback_releases_lock(tmpdir: tempfile::TempDir) {
    let a = open(tmpdir.path());
    let b = open(tmpdir.path());
    a.on_stale(|| Err("reload failed".into())).unwrap();
    b.grab().unwrap().increment_count().unwrap();

    assert!(matches!(a.grab(), Err(Error::String(_))));
    assert!(!a.lock_file().exists());
    // the change has still not been handled
    assert!(a.grab().is_err());
}

#[rstest]
fn test_malformed_counter(tmpdir: tempfile::TempDir) {
    let a = open(tmpdir.path());
    std::fs::write(a.count_file(), "many").unwrap();
    assert!(matches!(a.refresh(), Err(Error::MalformedCount(..))));
}
