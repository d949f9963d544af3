// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use super::{Repository, TagApplication, TagRecord, validate_tag_name};
use crate::{Error, Image, Result};

#[cfg(test)]
#[path = "./database_test.rs"]
mod database_test;

/// The complete contents of a photo library, as it is stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    pub images: BTreeSet<Image>,
    pub tags: BTreeMap<String, BTreeSet<Image>>,
    /// Current applications, oldest first.
    pub applications: Vec<TagApplication>,
    pub next_sequence: u64,
}

impl Database {
    pub fn add_image(&mut self, image: Image) -> Image {
        self.images.insert(image.clone());
        image
    }

    pub fn add_tag(&mut self, name: &str) -> Result<bool> {
        validate_tag_name(name)?;
        if self.tags.contains_key(name) {
            return Ok(false);
        }
        self.tags.insert(name.to_string(), BTreeSet::new());
        Ok(true)
    }

    pub fn delete_tag(&mut self, name: &str) -> Result<()> {
        if self.tags.remove(name).is_none() {
            return Err(Error::not_found(format!("tag {name}")));
        }
        self.applications.retain(|a| a.tag != name);
        Ok(())
    }

    pub fn apply_tag(&mut self, name: &str, image: &Image) -> Result<()> {
        let members = self
            .tags
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("tag {name}")))?;
        self.images.insert(image.clone());
        if members.insert(image.clone()) {
            self.applications.push(TagApplication {
                tag: name.to_string(),
                image: image.clone(),
                sequence: self.next_sequence,
            });
            self.next_sequence += 1;
        }
        Ok(())
    }

    pub fn unapply_tag(&mut self, name: &str, image: &Image) -> Result<()> {
        let members = self
            .tags
            .get_mut(name)
            .ok_or_else(|| Error::not_found(format!("tag {name}")))?;
        if members.remove(image) {
            self.applications
                .retain(|a| !(a.tag == name && &a.image == image));
        }
        Ok(())
    }

    pub fn tag_record(&self, name: &str) -> Option<TagRecord> {
        self.tags.get(name).map(|images| TagRecord {
            name: name.to_string(),
            images: images.iter().cloned().collect(),
        })
    }

    pub fn recent_applications(&self, limit: usize) -> Vec<TagApplication> {
        self.applications.iter().rev().take(limit).cloned().collect()
    }
}

/// A store that holds its whole [`Database`] in memory, loading
/// and persisting it all at once.
pub trait DatabaseStore: Send + Sync + std::fmt::Debug {
    /// The in-memory copy of the database.
    fn database(&self) -> &RwLock<Database>;

    /// Read the database from the backing store.
    fn load(&self) -> Result<Database>;

    /// Write the database to the backing store.
    fn persist(&self, database: &Database) -> Result<()>;

    fn read(&self) -> Result<RwLockReadGuard<'_, Database>> {
        self.database()
            .read()
            .map_err(|err| Error::LockPoisoned(err.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Database>> {
        self.database()
            .write()
            .map_err(|err| Error::LockPoisoned(err.to_string()))
    }
}

impl<T: DatabaseStore> Repository for T {
    fn find_by_path(&self, path: &str) -> Result<Option<Image>> {
        let image = Image::new(path);
        Ok(self.read()?.images.get(&image).cloned())
    }

    fn images(&self) -> Result<Vec<Image>> {
        Ok(self.read()?.images.iter().cloned().collect())
    }

    fn add_image(&self, image: Image) -> Result<Image> {
        Ok(self.write()?.add_image(image))
    }

    fn find_by_name(&self, name: &str) -> Result<Option<TagRecord>> {
        Ok(self.read()?.tag_record(name))
    }

    fn tags(&self) -> Result<Vec<TagRecord>> {
        let database = self.read()?;
        Ok(database
            .tags
            .keys()
            .filter_map(|name| database.tag_record(name))
            .collect())
    }

    fn add_tag(&self, name: &str) -> Result<bool> {
        self.write()?.add_tag(name)
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.write()?.delete_tag(name)
    }

    fn apply_tag(&self, name: &str, image: &Image) -> Result<()> {
        self.write()?.apply_tag(name, image)
    }

    fn unapply_tag(&self, name: &str, image: &Image) -> Result<()> {
        self.write()?.unapply_tag(name, image)
    }

    fn recent_applications(&self, limit: usize) -> Result<Vec<TagApplication>> {
        Ok(self.read()?.recent_applications(limit))
    }

    fn reload(&self) -> Result<()> {
        let loaded = self.load()?;
        *self.write()? = loaded;
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let database = self.read()?;
        self.persist(&database)
    }
}
