// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use enum_dispatch::enum_dispatch;
use photofs::{Error, Image, Result};

use crate::{MirroredDir, Node, NodeInfo, Payload, RelativePath, RootDir, Stat, TagDir};

/// Every kind of directory in the filesystem.
#[enum_dispatch(Dir)]
#[derive(Clone, Debug)]
pub enum Directory {
    RootDir,
    MirroredDir,
    TagDir,
}

/// The operations of a directory.
///
/// Unless a directory overrides them, every modification
/// fails as not permitted.
#[enum_dispatch]
pub trait Dir {
    fn info(&self) -> &NodeInfo;

    fn stat(&self) -> Result<Stat>;

    /// Compute the current children of this directory, by name.
    fn nodes(&self) -> Result<BTreeMap<String, Node>>;

    /// Find a single child by name, if it exists.
    fn lookup(&self, name: &str) -> Result<Option<Node>> {
        Ok(self.nodes()?.remove(name))
    }

    /// Create a new directory within this one.
    fn mkdir(&self, name: &str) -> Result<()> {
        Err(denied(self.info(), "mkdir", name))
    }

    fn rmdir(&self, name: &str) -> Result<()> {
        Err(denied(self.info(), "rmdir", name))
    }

    /// Move the named child of this directory into `dest`.
    fn rename(&self, name: &str, _dest: &Directory, _new_name: &str) -> Result<()> {
        Err(denied(self.info(), "rename", name))
    }

    /// Remove the named child from this directory.
    fn remove(&self, name: &str) -> Result<()> {
        Err(denied(self.info(), "remove", name))
    }

    /// Accept a node that is moved here from another directory.
    fn soft_move(&self, node: &Node, _name: &str) -> Result<()> {
        Err(denied(self.info(), "move", node.name()))
    }

    /// Create a link to the given target, returning the linked image.
    fn symlink(&self, _target: &Payload, name: &str) -> Result<Image> {
        Err(denied(self.info(), "symlink", name))
    }

    fn add(&self, image: &Image) -> Result<()> {
        Err(denied(self.info(), "add", image))
    }
}

fn denied(info: &NodeInfo, op: &str, name: impl std::fmt::Display) -> Error {
    Error::not_permitted(format!("{op} {name} in {}", info.location()))
}

impl Directory {
    /// Find the node at the given path below this directory.
    pub fn search(&self, path: &RelativePath) -> Result<Node> {
        let Some(name) = path.top_name() else {
            return Ok(Node::Dir(self.clone()));
        };
        let rest = path.descend();
        match self.child(name)? {
            Node::Dir(dir) => dir.search(&rest),
            file if rest.is_this() => Ok(file),
            file => Err(Error::not_a_directory(file.location())),
        }
    }

    /// The named child of this directory.
    pub fn child(&self, name: &str) -> Result<Node> {
        self.lookup(name)?
            .ok_or_else(|| Error::not_found(self.info().location().join(name)))
    }
}
