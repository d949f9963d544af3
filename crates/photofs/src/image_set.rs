// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use dashmap::DashSet;

use crate::Image;

#[cfg(test)]
#[path = "./image_set_test.rs"]
mod image_set_test;

type Filter = dyn Fn(&Image) -> bool + Send + Sync;

enum Inner {
    /// Owns the members of every set derived from it.
    Root(DashSet<Image>),
    /// A live, uncached view of the parent's members.
    Derived { parent: ImageSet, filter: Box<Filter> },
}

/// A set of images, either holding its members directly or lazily
/// filtering another set.
///
/// Clones share the same underlying set. Derived sets always reflect the
/// current contents of their parent at the moment they are read, and any
/// [`ImageSet::add`] or [`ImageSet::remove`] is applied to the root set of
/// the chain.
#[derive(Clone)]
pub struct ImageSet {
    inner: Arc<Inner>,
}

impl Default for ImageSet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ImageSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSet")
            .field("root", &self.is_root())
            .field("images", &self.range())
            .finish()
    }
}

impl FromIterator<Image> for ImageSet {
    fn from_iter<T: IntoIterator<Item = Image>>(iter: T) -> Self {
        Self {
            inner: Arc::new(Inner::Root(iter.into_iter().collect())),
        }
    }
}

impl ImageSet {
    /// Create a new, empty root set.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner::Root(DashSet::new())),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(*self.inner, Inner::Root(_))
    }

    fn root(&self) -> &DashSet<Image> {
        let mut current = self;
        loop {
            match &*current.inner {
                Inner::Root(images) => return images,
                Inner::Derived { parent, .. } => current = parent,
            }
        }
    }

    /// Add an image to the root of this chain, returning false if
    /// it was already there.
    pub fn add(&self, image: Image) -> bool {
        self.root().insert(image)
    }

    /// Remove an image from the root of this chain, returning false
    /// if it was not there.
    pub fn remove(&self, image: &Image) -> bool {
        self.root().remove(image).is_some()
    }

    pub fn contains(&self, image: &Image) -> bool {
        match &*self.inner {
            Inner::Root(images) => images.contains(image),
            Inner::Derived { parent, filter } => filter(image) && parent.contains(image),
        }
    }

    /// Find a member of this set by its path.
    pub fn find<S: AsRef<str>>(&self, path: S) -> Option<Image> {
        let image = Image::new(path);
        self.contains(&image).then_some(image)
    }

    /// The current members of this set, sorted by path.
    pub fn range(&self) -> Vec<Image> {
        let mut images: Vec<Image> = match &*self.inner {
            Inner::Root(images) => images.iter().map(|i| i.key().clone()).collect(),
            Inner::Derived { parent, filter } => {
                let mut images = parent.range();
                images.retain(|i| filter(i));
                return images;
            }
        };
        images.sort();
        images
    }

    pub fn len(&self) -> usize {
        match &*self.inner {
            Inner::Root(images) => images.len(),
            Inner::Derived { .. } => self.range().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &*self.inner {
            Inner::Root(images) => images.is_empty(),
            Inner::Derived { .. } => self.range().is_empty(),
        }
    }

    /// Create a derived set holding only the members of this one
    /// that match the given predicate.
    pub fn filter<F>(&self, filter: F) -> ImageSet
    where
        F: Fn(&Image) -> bool + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner::Derived {
                parent: self.clone(),
                filter: Box::new(filter),
            }),
        }
    }

    /// Create a derived set of the members of this one that are
    /// also in the other set.
    pub fn restrict_to(&self, other: &ImageSet) -> ImageSet {
        let other = other.clone();
        self.filter(move |image| other.contains(image))
    }

    /// Intersect this set with all the given sets.
    ///
    /// The result is a new root set, detached from this one and from the
    /// operands. An empty operand list produces an empty set.
    pub fn intersect(&self, others: &[&ImageSet]) -> ImageSet {
        if others.is_empty() {
            return ImageSet::new();
        }
        self.range()
            .into_iter()
            .filter(|image| others.iter().all(|other| other.contains(image)))
            .collect()
    }
}
