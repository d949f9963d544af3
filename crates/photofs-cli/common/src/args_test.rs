// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use rstest::rstest;

use super::{log_filter, open_library, photofs_error};

#[rstest]
#[case(0, None, None, "photofs=info,warn")]
#[case(0, Some("photofs=trace"), None, "photofs=trace")]
#[case(1, Some("photofs=trace"), None, "photofs=debug,info")]
#[case(2, None, Some("fuser=debug"), "photofs=trace,info,fuser=debug")]
#[case(5, None, None, "trace")]
fn test_log_filter(
    #[case] verbosity: usize,
    #[case] existing: Option<&str>,
    #[case] overrides: Option<&str>,
    #[case] expected: &str,
) {
    let actual = log_filter(
        verbosity,
        existing.map(String::from),
        overrides.map(String::from),
    );
    assert_eq!(actual, expected);
}

#[rstest]
fn test_open_library_shares_lock() {
    let tmpdir = tempfile::Builder::new()
        .prefix("photofs-test-")
        .tempdir()
        .unwrap();
    let mut config = photofs_config::Config::default();
    config.storage.root = tmpdir.path().join("storage");
    config.lock.timeout_ms = 50;

    let first = open_library(&config).unwrap();
    let second = open_library(&config).unwrap();
    assert_eq!(config.lock_timeout(), Duration::from_millis(50));

    let _guard = first.lock().grab().unwrap();
    let res = second.lock().grab();
    assert!(matches!(res, Err(photofs::Error::LockUnavailable(..))));
}

fn out_of_space() -> photofs::Error {
    photofs::Error::StorageWriteError(
        "write of working file",
        "/storage/photofs.json.work".into(),
        std::io::Error::from_raw_os_error(libc::ENOSPC),
    )
}

#[rstest]
fn test_photofs_error_skips_io_causes() {
    let err = anyhow::Error::from(out_of_space());
    assert!(matches!(
        photofs_error(&*err),
        Some(photofs::Error::StorageWriteError(..))
    ));
    assert!(
        err.root_cause().downcast_ref::<photofs::Error>().is_none(),
        "the io error is the root cause"
    );
}

#[rstest]
fn test_photofs_error_through_context() {
    let err = anyhow::Error::from(out_of_space()).context("failed to import photos");
    let found = photofs_error(&*err);
    assert!(
        matches!(found, Some(photofs::Error::StorageWriteError(_, _, io_err))
            if io_err.raw_os_error() == Some(libc::ENOSPC)),
        "{found:?}"
    );
    let other = anyhow::anyhow!("not a photofs error");
    assert!(photofs_error(&*other).is_none());
}

#[rstest]
fn test_handle_result_codes() {
    fn handle(result: anyhow::Result<i32>) -> i32 {
        crate::handle_result!(result)
    }
    assert_eq!(handle(Ok(0)), 0);
    assert_eq!(handle(Err(out_of_space().into())), 1);
}
