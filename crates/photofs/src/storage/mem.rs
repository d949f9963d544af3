// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::RwLock;

use super::{Database, DatabaseStore};
use crate::Result;

/// A repository that only lives in memory.
///
/// Saving and reloading do nothing, which makes this store
/// suitable for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemRepository {
    database: RwLock<Database>,
}

impl MemRepository {
    pub fn new(database: Database) -> Self {
        Self {
            database: RwLock::new(database),
        }
    }
}

impl DatabaseStore for MemRepository {
    fn database(&self) -> &RwLock<Database> {
        &self.database
    }

    fn load(&self) -> Result<Database> {
        Ok(self.read()?.clone())
    }

    fn persist(&self, _database: &Database) -> Result<()> {
        Ok(())
    }
}
