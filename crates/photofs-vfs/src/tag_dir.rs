// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use photofs::{Catalog, Error, Image, ImageSet, Result, Transaction};

use crate::{Context, Dir, Directory, File, Node, NodeInfo, Payload, Stat};

#[cfg(test)]
#[path = "./tag_dir_test.rs"]
mod tag_dir_test;

/// The name of the summary file in every chain root.
pub const STATS_FILE: &str = "stats";

/// The images that a tag directory can show and accept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Domain {
    /// Every image in the library
    All,
    /// Only images below this real directory
    Within(PathBuf),
}

impl Domain {
    pub fn images(&self, catalog: &Catalog) -> ImageSet {
        match self {
            Self::All => catalog.images.clone(),
            Self::Within(dir) => {
                let dir = dir.to_string_lossy().into_owned();
                catalog.images.filter(move |image| image.is_within(&dir))
            }
        }
    }
}

/// Which tags are listed at the root of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Every tag
    All,
    /// Only tags applied to at least one image in the domain
    Applied,
    /// Only tags among this many of the most recent applications
    Recent(usize),
}

/// A directory of the images that carry every tag in its chain.
///
/// The root of a chain has no tags of its own and lists one directory
/// per tag. Every directory below it narrows the set of images by one
/// more tag, and lists the remaining tags that would narrow it further.
#[derive(Clone, Debug)]
pub struct TagDir {
    ctx: Arc<Context>,
    info: NodeInfo,
    query: Vec<String>,
    domain: Domain,
    scope: Scope,
}

impl TagDir {
    /// Create the root of a new chain of tags.
    pub fn new(ctx: Arc<Context>, info: NodeInfo, domain: Domain, scope: Scope) -> Self {
        Self {
            ctx,
            info,
            query: Vec::new(),
            domain,
            scope,
        }
    }

    /// The names of the tags that this directory intersects.
    pub fn query(&self) -> &[String] {
        &self.query
    }

    pub fn is_chain_root(&self) -> bool {
        self.query.is_empty()
    }

    fn extend(&self, tag: &str) -> Result<TagDir> {
        let mut query = self.query.clone();
        query.push(tag.to_string());
        Ok(Self {
            ctx: Arc::clone(&self.ctx),
            info: self.info.child(tag, None)?,
            query,
            domain: self.domain.clone(),
            scope: self.scope,
        })
    }

    /// The images shown in this directory.
    pub fn effective(&self, catalog: &Catalog) -> ImageSet {
        let domain = self.domain.images(catalog);
        catalog.tags.intersection(&self.query).restrict_to(&domain)
    }

    /// The names of the tags listed as subdirectories.
    fn tag_names(&self, catalog: &Catalog) -> Result<Vec<String>> {
        if !self.is_chain_root() {
            let effective = self.effective(catalog);
            let names: BTreeSet<String> = catalog
                .tags
                .find_by_images(&effective)
                .into_values()
                .flatten()
                .map(|tag| tag.name().to_string())
                .filter(|name| !self.query.contains(name))
                .collect();
            return Ok(names.into_iter().collect());
        }
        match self.scope {
            Scope::All => Ok(catalog.tags.names()),
            Scope::Applied => Ok(catalog
                .tags
                .limit_to_images(&self.domain.images(catalog))
                .names()),
            Scope::Recent(limit) => Ok(self
                .ctx
                .library
                .recent_tag_names(limit)?
                .into_iter()
                .filter(|name| catalog.tags.contains(name))
                .collect()),
        }
    }

    fn stats(&self, catalog: &Catalog, names: &[String]) -> Vec<u8> {
        let domain = self.domain.images(catalog);
        let mut out = String::new();
        for name in names {
            let count = catalog
                .tags
                .find_by_name(name)
                .map(|tag| tag.restrict_to(&domain).len())
                .unwrap_or_default();
            out.push_str(&format!("{name}: {count}\n"));
        }
        out.into_bytes()
    }

    /// Find the image a payload refers to, if it may be tagged here.
    fn resolve(&self, catalog: &Catalog, payload: &Payload) -> Result<Image> {
        let image = match payload {
            Payload::Image(image) => Some(image.clone()),
            Payload::Path(path) => catalog.images.find(path.to_string_lossy()),
        };
        match image {
            Some(image) if self.domain.images(catalog).contains(&image) => Ok(image),
            _ => Err(Error::not_permitted(format!(
                "{payload:?} is not an image that can be tagged in {}",
                self.info.location()
            ))),
        }
    }

    /// Apply every tag of this chain to the image.
    fn tag(&self, txn: &mut Transaction<'_>, payload: &Payload) -> Result<Image> {
        if self.is_chain_root() {
            return Err(Error::not_permitted(format!(
                "cannot tag images in {}, it holds no tags",
                self.info.location()
            )));
        }
        let image = self.resolve(txn.catalog(), payload)?;
        if self.effective(txn.catalog()).contains(&image) {
            return Err(Error::not_permitted(format!(
                "{image} is already in {}",
                self.info.location()
            )));
        }
        txn.apply_tags(&self.query, &image)?;
        tracing::debug!(%image, tags = ?self.query, "tagged image");
        Ok(image)
    }
}

impl Dir for TagDir {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn stat(&self) -> Result<Stat> {
        let size = self.nodes()?.keys().map(|name| name.len() as u64).sum();
        // the owner write bit signals that images may be tagged here
        Ok(Stat::directory(
            Stat::READ_ONLY | 0o200,
            size,
            self.ctx.started,
        ))
    }

    fn nodes(&self) -> Result<BTreeMap<String, Node>> {
        let catalog = self.ctx.library.catalog();
        let names = self.tag_names(&catalog)?;
        let mut nodes = BTreeMap::new();
        if self.is_chain_root() {
            let info = self.info.child(STATS_FILE, None)?;
            let stats = File::synthetic(info, self.stats(&catalog, &names), self.ctx.started);
            nodes.insert(STATS_FILE.to_string(), stats.into());
        } else {
            // tag directories keep their names, images are renamed around them
            let images = self.effective(&catalog).range();
            for (name, image) in display_names_avoiding(images, names.iter().cloned()) {
                let target = PathBuf::from(image.path());
                let info = self.info.child(&name, Some(Payload::Image(image)))?;
                nodes.insert(name, File::link(info, target, self.ctx.started).into());
            }
        }
        for name in names {
            let dir = Directory::from(self.extend(&name)?);
            nodes.insert(name, dir.into());
        }
        Ok(nodes)
    }

    fn lookup(&self, name: &str) -> Result<Option<Node>> {
        if let Some(node) = self.nodes()?.remove(name) {
            return Ok(Some(node));
        }
        // below the chain root, every other tag can be entered
        // even when it would not narrow the listing
        let catalog = self.ctx.library.catalog();
        if self.is_chain_root()
            || self.query.iter().any(|tag| tag == name)
            || !catalog.tags.contains(name)
        {
            return Ok(None);
        }
        Ok(Some(Directory::from(self.extend(name)?).into()))
    }

    fn mkdir(&self, name: &str) -> Result<()> {
        if !self.is_chain_root() {
            return Err(Error::not_permitted(format!(
                "tags can only be created at the root of {}",
                self.info.location()
            )));
        }
        self.ctx
            .library
            .write(|txn| txn.create_tag(name).map(|_| ()))
    }

    fn rmdir(&self, name: &str) -> Result<()> {
        if !self.is_chain_root() {
            return Err(Error::not_permitted(format!(
                "tags can only be removed at the root of {}",
                self.info.location()
            )));
        }
        self.ctx.library.write(|txn| {
            let tag = txn
                .catalog()
                .tags
                .find_by_name(name)
                .ok_or_else(|| Error::not_found(format!("tag {name}")))?;
            if !tag.is_empty() {
                return Err(Error::not_permitted(format!(
                    "tag {name} is still applied to {} images",
                    tag.len()
                )));
            }
            txn.delete_tag(name)
        })
    }

    fn remove(&self, name: &str) -> Result<()> {
        let node = Directory::from(self.clone()).child(name)?;
        let image = match &node {
            Node::File(file) if !self.is_chain_root() => file.info().payload().image().cloned(),
            _ => None,
        };
        let Some(image) = image else {
            return Err(Error::not_permitted(format!(
                "cannot remove {}",
                node.location()
            )));
        };
        self.ctx
            .library
            .write(|txn| txn.remove_tags(&self.query, &image))
    }

    fn soft_move(&self, node: &Node, _name: &str) -> Result<()> {
        self.ctx
            .library
            .write(|txn| self.tag(txn, node.payload()).map(|_| ()))
    }

    fn symlink(&self, target: &Payload, _name: &str) -> Result<Image> {
        self.ctx.library.write(|txn| self.tag(txn, target))
    }

    fn add(&self, image: &Image) -> Result<()> {
        let payload = Payload::Image(image.clone());
        self.ctx
            .library
            .write(|txn| self.tag(txn, &payload).map(|_| ()))
    }
}

/// Name each image by its [`Image::name`], adding a suffix
/// to any name that was already taken by an earlier image.
///
/// Images are expected in sorted order, so that the names are stable.
pub fn display_names(images: Vec<Image>) -> Vec<(String, Image)> {
    display_names_avoiding(images, std::iter::empty())
}

/// Like [`display_names`], treating every reserved name as already taken.
pub fn display_names_avoiding<I>(images: Vec<Image>, reserved: I) -> Vec<(String, Image)>
where
    I: IntoIterator<Item = String>,
{
    let mut taken: HashSet<String> = reserved.into_iter().collect();
    let mut named = Vec::with_capacity(images.len());
    for image in images {
        let name = image.name();
        let mut candidate = name.clone();
        let mut index = 1;
        while !taken.insert(candidate.clone()) {
            candidate = with_suffix(&name, &image.extensions().join("."), index);
            index += 1;
        }
        named.push((candidate, image));
    }
    named
}

fn with_suffix(name: &str, extensions: &str, index: usize) -> String {
    let suffix = match index {
        1..=25 => char::from(b'a' + index as u8).to_string(),
        _ => index.to_string(),
    };
    if extensions.is_empty() {
        return format!("{name}-{suffix}");
    }
    match name.strip_suffix(&format!(".{extensions}")) {
        Some(base) => format!("{base}-{suffix}.{extensions}"),
        None => format!("{name}-{suffix}"),
    }
}
