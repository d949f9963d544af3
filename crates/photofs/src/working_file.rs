// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Enables atomic file updates by writing to a working file
/// and then replacing the original.
pub(crate) struct WorkingFile {
    original: PathBuf,
}

impl WorkingFile {
    pub fn new<P: Into<PathBuf>>(original: P) -> Self {
        Self {
            original: original.into(),
        }
    }

    fn working(&self) -> PathBuf {
        let mut name = self.original.file_name().unwrap_or_default().to_owned();
        name.push(".work");
        self.original.with_file_name(name)
    }

    /// Replace the contents of the original file.
    pub fn write(self, data: &[u8]) -> Result<()> {
        let working = self.working();
        if let Err(err) = write_and_sync(&working, data) {
            if let Err(err) = std::fs::remove_file(&working) {
                tracing::warn!(
                    "failed to clean up working file after failing to write it: {err}"
                );
            }
            return Err(Error::StorageWriteError("write of working file", working, err));
        }
        if let Err(err) = std::fs::rename(&working, &self.original) {
            if let Err(err) = std::fs::remove_file(&working) {
                tracing::warn!(
                    "failed to clean up working file after failing to finalize it: {err}"
                );
            }
            return Err(Error::StorageWriteError(
                "rename of working file",
                self.original,
                err,
            ));
        }
        Ok(())
    }
}

fn write_and_sync(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}
