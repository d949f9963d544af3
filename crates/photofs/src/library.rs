// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use arc_swap::ArcSwap;
use itertools::Itertools;

use crate::storage::{Repository, validate_tag_name};
use crate::synchronize::Lock;
use crate::{Error, Image, ImageSet, Result, Tag, TagSet};

#[cfg(test)]
#[path = "./library_test.rs"]
mod library_test;

/// An in-memory view of everything in a repository.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub images: ImageSet,
    pub tags: TagSet,
}

impl Catalog {
    /// Read the full contents of a repository.
    pub fn load(repository: &dyn Repository) -> Result<Self> {
        let images = repository.images()?.into_iter().collect();
        let tags = repository
            .tags()?
            .into_iter()
            .map(|record| Tag::with_images(record.name, record.images.into_iter().collect()))
            .collect();
        Ok(Self { images, tags })
    }
}

/// A repository, its cached [`Catalog`] and the lock
/// that keeps them consistent with other processes.
///
/// The catalog is replaced whenever the lock reports that another
/// process has written to the repository.
#[derive(Debug)]
pub struct Library {
    repository: Arc<dyn Repository>,
    lock: Lock,
    catalog: Arc<ArcSwap<Catalog>>,
}

impl Library {
    pub fn new(repository: Arc<dyn Repository>, lock: Lock) -> Result<Self> {
        let catalog = Arc::new(ArcSwap::from_pointee(Catalog::load(&*repository)?));
        {
            let repository = Arc::clone(&repository);
            let catalog = Arc::clone(&catalog);
            lock.on_stale(move || {
                repository.reload()?;
                let reloaded = Catalog::load(&*repository)?;
                tracing::debug!(
                    images = reloaded.images.len(),
                    tags = reloaded.tags.len(),
                    "reloaded stale catalog"
                );
                catalog.store(Arc::new(reloaded));
                Ok(())
            })?;
        }
        Ok(Self {
            repository,
            lock,
            catalog,
        })
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repository
    }

    pub fn lock(&self) -> &Lock {
        &self.lock
    }

    /// The current snapshot of the catalog.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.load_full()
    }

    /// Reload the catalog if another process has written to the
    /// repository, without waiting for the lock.
    pub fn refresh(&self) -> Result<bool> {
        self.lock.refresh()
    }

    /// Run a read-only operation while holding the lock.
    pub fn locked<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Catalog) -> Result<T>,
    {
        let _guard = self.lock.grab()?;
        op(&self.catalog())
    }

    /// Run an operation that modifies the library while holding the lock.
    ///
    /// If the operation changed anything, the repository is saved and
    /// other processes are notified, even when the operation then fails.
    /// Changes that cannot be saved are discarded from the cache.
    pub fn write<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T>,
    {
        let guard = self.lock.grab()?;
        let mut txn = Transaction {
            repository: &*self.repository,
            catalog: self.catalog(),
            dirty: false,
        };
        let result = op(&mut txn);
        if txn.dirty {
            if let Err(err) = self.repository.save() {
                self.discard_unsaved();
                return Err(err);
            }
            guard.increment_count()?;
        }
        result
    }

    /// Return the repository and catalog to what was last saved.
    fn discard_unsaved(&self) {
        let reloaded = self
            .repository
            .reload()
            .and_then(|_| Catalog::load(&*self.repository));
        match reloaded {
            Ok(catalog) => self.catalog.store(Arc::new(catalog)),
            Err(err) => tracing::warn!(%err, "failed to discard unsaved changes"),
        }
    }

    /// The distinct tag names among the `limit` most recent
    /// applications, newest first.
    pub fn recent_tag_names(&self, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .repository
            .recent_applications(limit)?
            .into_iter()
            .map(|application| application.tag)
            .unique()
            .collect())
    }
}

/// Modifications to a [`Library`], made while its lock is held.
///
/// Every change is written to both the repository and the catalog.
pub struct Transaction<'a> {
    repository: &'a dyn Repository,
    catalog: Arc<Catalog>,
    dirty: bool,
}

impl Transaction<'_> {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn tag(&self, name: &str) -> Result<Tag> {
        self.catalog
            .tags
            .find_by_name(name)
            .ok_or_else(|| Error::not_found(format!("tag {name}")))
    }

    /// Start tracking an image.
    pub fn add_image(&mut self, image: Image) -> Result<Image> {
        if let Some(existing) = self.catalog.images.find(image.path()) {
            return Ok(existing);
        }
        let committed = self.repository.add_image(image)?;
        self.catalog.images.add(committed.clone());
        self.dirty = true;
        Ok(committed)
    }

    pub fn create_tag(&mut self, name: &str) -> Result<Tag> {
        validate_tag_name(name)?;
        if self.catalog.tags.contains(name) || !self.repository.add_tag(name)? {
            return Err(Error::already_exists(format!("tag {name}")));
        }
        let tag = Tag::new(name);
        self.catalog.tags.add_if_absent(tag.clone());
        self.dirty = true;
        Ok(tag)
    }

    pub fn delete_tag(&mut self, name: &str) -> Result<()> {
        self.tag(name)?;
        self.repository.delete_tag(name)?;
        self.catalog.tags.delete(name);
        self.dirty = true;
        Ok(())
    }

    /// Apply each of the named tags to the image.
    pub fn apply_tags<S: AsRef<str>>(&mut self, names: &[S], image: &Image) -> Result<()> {
        for name in names {
            let tag = self.tag(name.as_ref())?;
            self.repository.apply_tag(tag.name(), image)?;
            self.catalog.images.add(image.clone());
            tag.add(image.clone());
            self.dirty = true;
        }
        Ok(())
    }

    /// Remove each of the named tags from the image.
    pub fn remove_tags<S: AsRef<str>>(&mut self, names: &[S], image: &Image) -> Result<()> {
        for name in names {
            let tag = self.tag(name.as_ref())?;
            self.repository.unapply_tag(tag.name(), image)?;
            tag.remove(image);
            self.dirty = true;
        }
        Ok(())
    }

    pub fn rename_tag(&mut self, old: &str, new: &str) -> Result<Tag> {
        validate_tag_name(new)?;
        let existing = self.tag(old)?;
        if self.catalog.tags.contains(new) || !self.repository.add_tag(new)? {
            return Err(Error::already_exists(format!("tag {new}")));
        }
        self.dirty = true;
        for image in existing.range() {
            self.repository.apply_tag(new, &image)?;
        }
        self.repository.delete_tag(old)?;
        self.catalog.tags.rename(old, new)
    }
}
