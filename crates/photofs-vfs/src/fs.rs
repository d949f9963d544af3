// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::sync::Arc;

use photofs::{Error, Image, Result};

use crate::{
    Content,
    Context,
    Dir,
    Directory,
    Node,
    NodeKind,
    Payload,
    RelativePath,
    RootDir,
    Stat,
};

#[cfg(test)]
#[path = "./fs_test.rs"]
mod fs_test;

/// Answers filesystem requests by path.
///
/// Every request resolves its path from the root directory, after
/// reloading the library if another process has written to it.
#[derive(Debug)]
pub struct Filesystem {
    ctx: Arc<Context>,
    root: Directory,
}

impl Filesystem {
    pub fn new(ctx: Context) -> Self {
        let ctx = Arc::new(ctx);
        let root = RootDir::new(Arc::clone(&ctx)).into();
        Self { ctx, root }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Find the node at the given path.
    pub fn search(&self, path: &RelativePath) -> Result<Node> {
        self.root.search(path)
    }

    fn directory(&self, path: &RelativePath) -> Result<Directory> {
        self.search(path)?.into_dir()
    }

    /// The directory that holds the given path, and the name within it.
    fn parent_of<'a>(&self, path: &'a RelativePath) -> Result<(Directory, &'a str)> {
        let Some(parent) = path.parent() else {
            return Err(Error::not_permitted("cannot modify the root directory"));
        };
        Ok((self.directory(&parent)?, path.name()))
    }

    pub fn getattr(&self, path: &RelativePath) -> Result<Stat> {
        tracing::trace!(%path, "getattr");
        self.ctx.library.refresh()?;
        self.search(path)?.stat()
    }

    /// The names and kinds of the entries in a directory.
    pub fn readdir(&self, path: &RelativePath) -> Result<Vec<(String, NodeKind)>> {
        tracing::trace!(%path, "readdir");
        self.ctx.library.refresh()?;
        let nodes = self.directory(path)?.nodes()?;
        Ok(nodes
            .into_iter()
            .map(|(name, node)| {
                let kind = node.kind();
                (name, kind)
            })
            .collect())
    }

    pub fn readlink(&self, path: &RelativePath) -> Result<PathBuf> {
        tracing::trace!(%path, "readlink");
        self.ctx.library.refresh()?;
        match self.search(path)? {
            Node::File(file) => match file.target() {
                Some(target) => Ok(target.to_owned()),
                None => Err(Error::invalid_argument(format!("{path} is not a link"))),
            },
            Node::Dir(_) => Err(Error::invalid_argument(format!("{path} is not a link"))),
        }
    }

    /// The full contents of a generated file.
    pub fn read(&self, path: &RelativePath) -> Result<Arc<[u8]>> {
        tracing::trace!(%path, "read");
        self.ctx.library.refresh()?;
        match self.search(path)? {
            Node::File(file) => match file.content() {
                Content::Data(data) => Ok(Arc::clone(data)),
                Content::Link(_) => Err(Error::invalid_argument(format!("{path} is a link"))),
            },
            Node::Dir(_) => Err(Error::invalid_argument(format!("{path} is a directory"))),
        }
    }

    pub fn mkdir(&self, path: &RelativePath) -> Result<()> {
        tracing::trace!(%path, "mkdir");
        if path.is_this() {
            return Err(Error::already_exists("/"));
        }
        self.ctx.library.refresh()?;
        let (parent, name) = self.parent_of(path)?;
        parent.mkdir(name)
    }

    pub fn rmdir(&self, path: &RelativePath) -> Result<()> {
        tracing::trace!(%path, "rmdir");
        self.ctx.library.refresh()?;
        let (parent, name) = self.parent_of(path)?;
        parent.rmdir(name)
    }

    pub fn unlink(&self, path: &RelativePath) -> Result<()> {
        tracing::trace!(%path, "unlink");
        self.ctx.library.refresh()?;
        let (parent, name) = self.parent_of(path)?;
        parent.remove(name)
    }

    pub fn rename(&self, from: &RelativePath, to: &RelativePath) -> Result<()> {
        tracing::trace!(%from, %to, "rename");
        self.ctx.library.refresh()?;
        let (source, name) = self.parent_of(from)?;
        let (dest, new_name) = self.parent_of(to)?;
        source.rename(name, &dest, new_name)
    }

    /// Link the target into the directory of `link`.
    ///
    /// Targets inside of the mount are resolved to the node they point
    /// at, anything else is taken as a real path. Relative targets start
    /// from the directory of `link` and may climb out of the mount.
    ///
    /// Since the created entry is named by the image it shows, the
    /// location of that entry is returned, which is not necessarily `link`.
    pub fn symlink(&self, target: &Path, link: &RelativePath) -> Result<RelativePath> {
        tracing::trace!(?target, %link, "symlink");
        self.ctx.library.refresh()?;
        let (parent, name) = self.parent_of(link)?;
        let payload = self.resolve_target(target, link)?;
        let image = parent.symlink(&payload, name)?;
        let nodes = parent.nodes()?;
        let created = nodes
            .values()
            .find(|node| node.payload().image() == Some(&image))
            .map(|node| node.location().clone());
        Ok(created.unwrap_or_else(|| link.clone()))
    }

    fn resolve_target(&self, target: &Path, link: &RelativePath) -> Result<Payload> {
        let mountpoint = &self.ctx.config.mountpoint;
        let (inside, real) = if target.is_relative() {
            let base = link.parent().unwrap_or_default();
            (
                base.join_within(target.to_string_lossy()),
                base.to_path(mountpoint).join(target),
            )
        } else {
            let inside = target
                .strip_prefix(mountpoint)
                .ok()
                .and_then(|rest| RelativePath::within_root(rest.to_string_lossy()));
            (inside, target.to_owned())
        };
        if let Some(path) = inside {
            return Ok(self.search(&path)?.payload().clone());
        }
        let real = Image::new(real.to_string_lossy());
        Ok(Payload::Path(PathBuf::from(real.path())))
    }
}
