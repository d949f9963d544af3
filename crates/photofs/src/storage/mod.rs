// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

//! The persistent side of a photo library.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Image, Result};

mod database;
mod json;
mod mem;

pub use database::{Database, DatabaseStore};
pub use json::JsonRepository;
pub use mem::MemRepository;

/// The persisted form of a tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRecord {
    pub name: String,
    pub images: Vec<Image>,
}

/// One application of a tag to an image.
///
/// Sequence numbers increase with every application made in a
/// store, and so order them from oldest to newest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagApplication {
    pub tag: String,
    pub image: Image,
    pub sequence: u64,
}

/// Storage for images, tags and the applications of tags to images.
///
/// Implementations may keep a cache of the backing store, in which case
/// [`Repository::reload`] must discard it and [`Repository::save`] must
/// flush everything that has changed since.
pub trait Repository: Send + Sync + std::fmt::Debug {
    fn find_by_path(&self, path: &str) -> Result<Option<Image>>;

    fn find_by_paths(&self, paths: &[&str]) -> Result<HashMap<String, Option<Image>>> {
        paths
            .iter()
            .map(|path| Ok((path.to_string(), self.find_by_path(path)?)))
            .collect()
    }

    /// All known images, sorted by path.
    fn images(&self) -> Result<Vec<Image>>;

    /// Track a new image, returning the committed value. Adding
    /// an image that is already tracked does nothing.
    fn add_image(&self, image: Image) -> Result<Image>;

    fn find_by_name(&self, name: &str) -> Result<Option<TagRecord>>;

    /// All tags, sorted by name.
    fn tags(&self) -> Result<Vec<TagRecord>>;

    /// Create a new, empty tag. Returns false if it already existed.
    fn add_tag(&self, name: &str) -> Result<bool>;

    /// Remove a tag along with all of its applications.
    fn delete_tag(&self, name: &str) -> Result<()>;

    fn apply_tag(&self, name: &str, image: &Image) -> Result<()>;

    fn unapply_tag(&self, name: &str, image: &Image) -> Result<()>;

    /// The most recent applications, newest first.
    fn recent_applications(&self, limit: usize) -> Result<Vec<TagApplication>>;

    fn reload(&self) -> Result<()>;

    fn save(&self) -> Result<()>;
}

/// Ensure that the given string is a valid tag name.
///
/// Tag names become directory names, so they must be a single,
/// non-special path component.
pub fn validate_tag_name<S: AsRef<str>>(name: S) -> Result<()> {
    let name = name.as_ref();
    let reason = if name.is_empty() {
        "tag names cannot be empty"
    } else if name == "." || name == ".." {
        "tag names cannot be a relative path component"
    } else if name.contains('/') {
        "tag names cannot contain '/'"
    } else if name.contains('\0') {
        "tag names cannot contain a null byte"
    } else {
        return Ok(());
    };
    Err(Error::MalformedName(name.to_string(), reason))
}
