// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use photofs::Result;

use crate::{
    Context,
    Dir,
    Directory,
    Domain,
    File,
    Node,
    NodeInfo,
    Payload,
    Scope,
    Stat,
    TagDir,
};

#[cfg(test)]
#[path = "./mirrored_dir_test.rs"]
mod mirrored_dir_test;

/// The tag space of the images below a mirrored directory.
pub const TAGS_DIR: &str = "tags";
/// Like [`TAGS_DIR`], limited to tags that are already in use.
pub const TAGS_APPLIED_DIR: &str = "tags-applied";

/// A read-only view of a real directory.
#[derive(Clone, Debug)]
pub struct MirroredDir {
    ctx: Arc<Context>,
    info: NodeInfo,
    real: PathBuf,
}

impl MirroredDir {
    pub fn new(ctx: Arc<Context>, info: NodeInfo, real: PathBuf) -> Self {
        Self { ctx, info, real }
    }

    /// The real directory shown here.
    pub fn real_path(&self) -> &Path {
        &self.real
    }
}

impl Dir for MirroredDir {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn stat(&self) -> Result<Stat> {
        let mut stat = self.ctx.source.stat(&self.real)?;
        stat.perm &= Stat::READ_ONLY;
        Ok(stat)
    }

    fn nodes(&self) -> Result<BTreeMap<String, Node>> {
        let catalog = self.ctx.library.catalog();
        let mut nodes = BTreeMap::new();
        for entry in self.ctx.source.read_dir(&self.real)? {
            let path = self.real.join(&entry.name);
            let node: Node = if entry.is_dir {
                let info = self.info.child(&entry.name, Some(Payload::Path(path.clone())))?;
                Directory::from(MirroredDir::new(Arc::clone(&self.ctx), info, path)).into()
            } else {
                let payload = match catalog.images.find(path.to_string_lossy()) {
                    Some(image) => Payload::Image(image),
                    None => Payload::Path(path.clone()),
                };
                let info = self.info.child(&entry.name, Some(payload))?;
                File::link(info, path, self.ctx.started).into()
            };
            nodes.insert(entry.name, node);
        }

        let domain = Domain::Within(self.real.clone());
        let images = domain.images(&catalog);
        if images.is_empty() {
            return Ok(nodes);
        }
        let tags = TagDir::new(
            Arc::clone(&self.ctx),
            self.info.child(TAGS_DIR, None)?,
            domain.clone(),
            Scope::All,
        );
        nodes.insert(TAGS_DIR.to_string(), Directory::from(tags).into());
        if !catalog.tags.limit_to_images(&images).is_empty() {
            let applied = TagDir::new(
                Arc::clone(&self.ctx),
                self.info.child(TAGS_APPLIED_DIR, None)?,
                domain,
                Scope::Applied,
            );
            nodes.insert(TAGS_APPLIED_DIR.to_string(), Directory::from(applied).into());
        }
        Ok(nodes)
    }

    fn rename(&self, name: &str, dest: &Directory, new_name: &str) -> Result<()> {
        let node = Directory::from(self.clone()).child(name)?;
        dest.soft_move(&node, new_name)
    }
}
