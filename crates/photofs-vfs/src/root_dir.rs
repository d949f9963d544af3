// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Arc;

use photofs::Result;

use crate::{
    Context,
    Dir,
    Directory,
    Domain,
    MirroredDir,
    Node,
    NodeInfo,
    Payload,
    Scope,
    Stat,
    TagDir,
};

/// The mirrored source tree.
pub const MIRROR_DIR: &str = "o";
/// The tag space over every image.
pub const TAG_SPACE_DIR: &str = "t";
/// The tag space of recently applied tags.
pub const RECENT_DIR: &str = "r";

/// The top of the mounted filesystem.
#[derive(Clone, Debug)]
pub struct RootDir {
    ctx: Arc<Context>,
    info: NodeInfo,
}

impl RootDir {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            ctx,
            info: NodeInfo::root(),
        }
    }
}

impl Dir for RootDir {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn stat(&self) -> Result<Stat> {
        Ok(Stat::directory(Stat::READ_ONLY, 0, self.ctx.started))
    }

    fn nodes(&self) -> Result<BTreeMap<String, Node>> {
        let this: Node = Directory::from(self.clone()).into();
        let source = self.ctx.config.source.clone();
        let mirror = MirroredDir::new(
            Arc::clone(&self.ctx),
            self.info
                .child(MIRROR_DIR, Some(Payload::Path(source.clone())))?,
            source,
        );
        let tags = TagDir::new(
            Arc::clone(&self.ctx),
            self.info.child(TAG_SPACE_DIR, None)?,
            Domain::All,
            Scope::All,
        );
        let recent = TagDir::new(
            Arc::clone(&self.ctx),
            self.info.child(RECENT_DIR, None)?,
            Domain::All,
            Scope::Recent(self.ctx.config.recent_tags),
        );
        Ok(BTreeMap::from([
            (String::from("."), this.clone()),
            (String::from(".."), this),
            (MIRROR_DIR.to_string(), Directory::from(mirror).into()),
            (TAG_SPACE_DIR.to_string(), Directory::from(tags).into()),
            (RECENT_DIR.to_string(), Directory::from(recent).into()),
        ]))
    }
}
