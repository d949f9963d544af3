// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use crate::ImageSet;

/// A named set of images.
///
/// Tags are identified by name alone, two tags with the same
/// name are equal no matter which images they hold.
#[derive(Clone, Debug)]
pub struct Tag {
    name: Arc<str>,
    images: ImageSet,
}

impl Tag {
    /// Create a new tag with no members.
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self::with_images(name, ImageSet::new())
    }

    pub fn with_images<S: AsRef<str>>(name: S, images: ImageSet) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            images,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn images(&self) -> &ImageSet {
        &self.images
    }
}

impl std::ops::Deref for Tag {
    type Target = ImageSet;

    fn deref(&self) -> &Self::Target {
        &self.images
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tag {}

impl std::hash::Hash for Tag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
