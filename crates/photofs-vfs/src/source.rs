// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::SystemTime;

use photofs::{Error, Result};

use crate::{NodeKind, Stat};

/// One entry of a real directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Read access to the real filesystem that holds the photos.
pub trait SourceFs: Send + Sync + std::fmt::Debug {
    fn stat(&self, path: &Path) -> Result<Stat>;

    /// The entries of a directory, sorted by name.
    fn read_dir(&self, path: &Path) -> Result<Vec<SourceEntry>>;
}

/// The local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl SourceFs for LocalFs {
    fn stat(&self, path: &Path) -> Result<Stat> {
        let metadata = std::fs::metadata(path).map_err(|err| read_error(path, err))?;
        let kind = if metadata.is_dir() {
            NodeKind::Directory
        } else {
            NodeKind::File
        };
        Ok(Stat {
            kind,
            perm: (metadata.permissions().mode() & 0o7777) as u16,
            size: metadata.len(),
            mtime: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<SourceEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path).map_err(|err| read_error(path, err))? {
            let entry = entry.map_err(|err| read_error(path, err))?;
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(path = ?entry.path(), "skipping entry with a non utf-8 name");
                continue;
            };
            // follow links, a dangling one is shown as a file
            let is_dir = std::fs::metadata(entry.path())
                .map(|m| m.is_dir())
                .unwrap_or(false);
            entries.push(SourceEntry { name, is_dir });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

fn read_error(path: &Path, err: std::io::Error) -> Error {
    match err.kind() {
        std::io::ErrorKind::NotFound => Error::not_found(path.display()),
        std::io::ErrorKind::NotADirectory => Error::not_a_directory(path.display()),
        _ => Error::StorageReadError("read of source path", path.to_owned(), err),
    }
}
