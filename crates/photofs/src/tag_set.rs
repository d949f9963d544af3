// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::{Error, Image, ImageSet, Result, Tag};

#[cfg(test)]
#[path = "./tag_set_test.rs"]
mod tag_set_test;

/// A collection of uniquely named tags.
///
/// Clones share the same collection.
#[derive(Clone, Debug, Default)]
pub struct TagSet {
    tags: Arc<DashMap<String, Tag>>,
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<T: IntoIterator<Item = Tag>>(iter: T) -> Self {
        Self {
            tags: Arc::new(
                iter.into_iter()
                    .map(|tag| (tag.name().to_string(), tag))
                    .collect(),
            ),
        }
    }
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the tag unless one of the same name already exists.
    ///
    /// Returns true if the tag was inserted.
    pub fn add_if_absent(&self, tag: Tag) -> bool {
        match self.tags.entry(tag.name().to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(tag);
                true
            }
        }
    }

    pub fn find_by_name<S: AsRef<str>>(&self, name: S) -> Option<Tag> {
        self.tags.get(name.as_ref()).map(|t| t.value().clone())
    }

    pub fn contains<S: AsRef<str>>(&self, name: S) -> bool {
        self.tags.contains_key(name.as_ref())
    }

    pub fn delete<S: AsRef<str>>(&self, name: S) -> Option<Tag> {
        self.tags.remove(name.as_ref()).map(|(_, tag)| tag)
    }

    /// Give a tag a new name.
    ///
    /// Since tags are identified by name, this copies the members into
    /// a new tag and then removes the old one.
    pub fn rename<S1: AsRef<str>, S2: AsRef<str>>(&self, old: S1, new: S2) -> Result<Tag> {
        let (old, new) = (old.as_ref(), new.as_ref());
        let existing = self
            .find_by_name(old)
            .ok_or_else(|| Error::not_found(format!("tag {old}")))?;
        let renamed = Tag::with_images(new, existing.range().into_iter().collect());
        if !self.add_if_absent(renamed.clone()) {
            return Err(Error::already_exists(format!("tag {new}")));
        }
        self.delete(old);
        Ok(renamed)
    }

    /// All tags, sorted by name.
    pub fn tags(&self) -> Vec<Tag> {
        let mut tags: Vec<_> = self.tags.iter().map(|t| t.value().clone()).collect();
        tags.sort();
        tags
    }

    pub fn names(&self) -> Vec<String> {
        self.tags().iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// The images that carry every one of the named tags.
    ///
    /// No names, or any name that is not a known tag,
    /// produces an empty set.
    pub fn intersection<S: AsRef<str>>(&self, names: &[S]) -> ImageSet {
        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            match self.find_by_name(name) {
                Some(tag) => tags.push(tag),
                None => return ImageSet::new(),
            }
        }
        let Some(first) = tags.first() else {
            return ImageSet::new();
        };
        let sets: Vec<&ImageSet> = tags.iter().map(|t| t.images()).collect();
        first.intersect(&sets)
    }

    /// Index every image in the given set by the tags applied to it.
    ///
    /// Images that carry no tags are not included.
    pub fn find_by_images(&self, images: &ImageSet) -> HashMap<Image, Vec<Tag>> {
        let mut index: HashMap<Image, Vec<Tag>> = HashMap::new();
        for tag in self.tags() {
            for image in tag.range() {
                if images.contains(&image) {
                    index.entry(image).or_default().push(tag.clone());
                }
            }
        }
        index
    }

    /// A new set of the tags applied to at least one of the given images,
    /// each limited to only those images.
    ///
    /// The returned tags are live views, so adding to one of them
    /// adds to the original tag.
    pub fn limit_to_images(&self, images: &ImageSet) -> TagSet {
        self.tags()
            .into_iter()
            .map(|tag| Tag::with_images(tag.name(), tag.restrict_to(images)))
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}
