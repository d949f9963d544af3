// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can be mapped onto an operating system error number.
pub trait OsError {
    /// The errno that best describes this error, if any.
    fn os_error(&self) -> Option<i32>;
}

impl OsError for io::Error {
    fn os_error(&self) -> Option<i32> {
        match self.raw_os_error() {
            Some(errno) => Some(errno),
            None => match self.kind() {
                io::ErrorKind::NotFound => Some(libc::ENOENT),
                io::ErrorKind::PermissionDenied => Some(libc::EACCES),
                io::ErrorKind::AlreadyExists => Some(libc::EEXIST),
                io::ErrorKind::NotADirectory => Some(libc::ENOTDIR),
                _ => None,
            },
        }
    }
}

#[derive(Diagnostic, Debug, Error)]
#[diagnostic(
    url(
        "https://photofs.dev/error_codes#{}",
        self.code().unwrap_or_else(|| Box::new("photofs::generic"))
    )
)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Lock {0} is held by another process, gave up after {1:?}")]
    #[diagnostic(
        code("photofs::lock_unavailable"),
        help("If no other photofs process is running, the lock file may be stale and can be removed")
    )]
    LockUnavailable(PathBuf, Duration),
    #[error("Cannot access shared state, lock has been poisoned: {0}")]
    LockPoisoned(String),

    #[error("Malformed data in {0}")]
    MalformedData(PathBuf, #[source] serde_json::Error),
    #[error("Malformed write counter in {0}")]
    MalformedCount(PathBuf, #[source] std::num::ParseIntError),
    #[error("Malformed name {0:?}: {1}")]
    MalformedName(String, &'static str),

    #[error("Storage read error from {0} at {1}")]
    StorageReadError(&'static str, PathBuf, #[source] io::Error),
    #[error("Storage write error from {0} at {1}")]
    StorageWriteError(&'static str, PathBuf, #[source] io::Error),

    #[error("{0}")]
    String(String),
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn not_permitted(what: impl std::fmt::Display) -> Self {
        Self::NotPermitted(what.to_string())
    }

    pub fn already_exists(what: impl std::fmt::Display) -> Self {
        Self::AlreadyExists(what.to_string())
    }

    pub fn not_a_directory(what: impl std::fmt::Display) -> Self {
        Self::NotADirectory(what.to_string())
    }

    pub fn invalid_argument(what: impl std::fmt::Display) -> Self {
        Self::InvalidArgument(what.to_string())
    }
}

impl OsError for Error {
    fn os_error(&self) -> Option<i32> {
        match self {
            Error::NotFound(_) => Some(libc::ENOENT),
            Error::NotPermitted(_) => Some(libc::EPERM),
            Error::AlreadyExists(_) => Some(libc::EEXIST),
            Error::NotADirectory(_) => Some(libc::ENOTDIR),
            Error::InvalidArgument(_) | Error::MalformedName(..) => Some(libc::EINVAL),
            Error::LockUnavailable(..) => Some(libc::EAGAIN),
            Error::StorageReadError(_, _, err) | Error::StorageWriteError(_, _, err) => {
                err.os_error()
            }
            Error::LockPoisoned(_)
            | Error::MalformedData(..)
            | Error::MalformedCount(..)
            | Error::String(_) => None,
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::String(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Error {
        Error::String(err.to_string())
    }
}
