// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{Database, DatabaseStore};
use crate::working_file::WorkingFile;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./json_test.rs"]
mod json_test;

/// The name of the database file within a storage root.
pub const DATABASE_FILE: &str = "photofs.json";

/// A repository persisted as a single json document on disk.
#[derive(Debug)]
pub struct JsonRepository {
    path: PathBuf,
    database: RwLock<Database>,
}

impl JsonRepository {
    /// Open the repository stored in the given directory, creating
    /// the directory if needed.
    ///
    /// A missing database file is treated as an empty repository.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|err| {
            Error::StorageWriteError("create_dir_all on storage root", root.to_owned(), err)
        })?;
        let path = root.join(DATABASE_FILE);
        let database = read_database(&path)?;
        tracing::debug!(path = ?path, images = database.images.len(), "opened json repository");
        Ok(Self {
            path,
            database: RwLock::new(database),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatabaseStore for JsonRepository {
    fn database(&self) -> &RwLock<Database> {
        &self.database
    }

    fn load(&self) -> Result<Database> {
        read_database(&self.path)
    }

    fn persist(&self, database: &Database) -> Result<()> {
        let data = serde_json::to_vec_pretty(database)
            .map_err(|err| Error::MalformedData(self.path.clone(), err))?;
        WorkingFile::new(&self.path).write(&data)
    }
}

fn read_database(path: &Path) -> Result<Database> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Database::default());
        }
        Err(err) => {
            return Err(Error::StorageReadError(
                "read on database file",
                path.to_owned(),
                err,
            ));
        }
    };
    serde_json::from_slice(&data).map_err(|err| Error::MalformedData(path.to_owned(), err))
}
