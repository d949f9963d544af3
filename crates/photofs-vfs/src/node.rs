// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use photofs::{Error, Image, Result};

use crate::{Dir, Directory, RelativePath};

#[cfg(test)]
#[path = "./node_test.rs"]
mod node_test;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    Symlink,
    File,
}

/// The metadata reported for a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stat {
    pub kind: NodeKind,
    pub perm: u16,
    pub size: u64,
    pub mtime: SystemTime,
}

impl Stat {
    /// Permissions for anything that cannot be modified.
    pub const READ_ONLY: u16 = 0o555;

    pub fn directory(perm: u16, size: u64, mtime: SystemTime) -> Self {
        Self {
            kind: NodeKind::Directory,
            perm,
            size,
            mtime,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// The value that identifies what a node represents.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Payload {
    /// A real path, or a location in the mount for purely virtual nodes
    Path(PathBuf),
    Image(Image),
}

impl Payload {
    pub fn image(&self) -> Option<&Image> {
        match self {
            Self::Image(image) => Some(image),
            Self::Path(_) => None,
        }
    }
}

/// The identity of a node within the mounted filesystem.
///
/// Nodes do not hold on to their parent; it is
/// recomputed from their location when needed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeInfo {
    name: String,
    location: RelativePath,
    payload: Payload,
}

impl NodeInfo {
    /// Describe a new node called `name` within `parent`.
    ///
    /// Without a payload, the node is identified by its own location.
    pub fn new(name: &str, parent: Option<&Node>, payload: Option<Payload>) -> Result<Self> {
        match parent {
            None => Self::at(RelativePath::root(), name, payload),
            Some(Node::Dir(dir)) => dir.info().child(name, payload),
            Some(Node::File(file)) => Err(Error::invalid_argument(format!(
                "parent of {name} must be a directory, got {}",
                file.info().location
            ))),
        }
    }

    /// Describe the root of the filesystem.
    pub fn root() -> Self {
        Self {
            name: String::from("/"),
            location: RelativePath::root(),
            payload: Payload::Path(PathBuf::from("/")),
        }
    }

    /// Describe a node within this one, which must be a directory.
    pub fn child(&self, name: &str, payload: Option<Payload>) -> Result<Self> {
        Self::at(self.location.clone(), name, payload)
    }

    fn at(parent: RelativePath, name: &str, payload: Option<Payload>) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::invalid_argument("node name cannot be empty"));
        }
        let location = parent.join(name);
        let payload =
            payload.unwrap_or_else(|| Payload::Path(PathBuf::from(location.to_string())));
        Ok(Self {
            name: name.to_string(),
            location,
            payload,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &RelativePath {
        &self.location
    }

    pub fn parent(&self) -> Option<RelativePath> {
        self.location.parent()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

#[derive(Clone, Debug)]
pub enum Content {
    /// A symbolic link to the given path.
    Link(PathBuf),
    /// A file whose contents are generated.
    Data(Arc<[u8]>),
}

/// A leaf node.
#[derive(Clone, Debug)]
pub struct File {
    info: NodeInfo,
    content: Content,
    mtime: SystemTime,
}

impl File {
    pub fn link(info: NodeInfo, target: PathBuf, mtime: SystemTime) -> Self {
        Self {
            info,
            content: Content::Link(target),
            mtime,
        }
    }

    pub fn synthetic(info: NodeInfo, data: Vec<u8>, mtime: SystemTime) -> Self {
        Self {
            info,
            content: Content::Data(data.into()),
            mtime,
        }
    }

    pub fn info(&self) -> &NodeInfo {
        &self.info
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn target(&self) -> Option<&Path> {
        match &self.content {
            Content::Link(target) => Some(target),
            Content::Data(_) => None,
        }
    }

    pub fn stat(&self) -> Stat {
        match &self.content {
            Content::Link(target) => Stat {
                kind: NodeKind::Symlink,
                perm: Stat::READ_ONLY,
                size: target.as_os_str().len() as u64,
                mtime: self.mtime,
            },
            Content::Data(data) => Stat {
                kind: NodeKind::File,
                perm: 0o444,
                size: data.len() as u64,
                mtime: self.mtime,
            },
        }
    }
}

/// Any entry in the mounted filesystem.
///
/// Nodes are views computed on request. Two nodes are
/// equal when they have the same payload.
#[derive(Clone, Debug)]
pub enum Node {
    Dir(Directory),
    File(File),
}

impl Node {
    pub fn info(&self) -> &NodeInfo {
        match self {
            Self::Dir(dir) => dir.info(),
            Self::File(file) => file.info(),
        }
    }

    pub fn name(&self) -> &str {
        self.info().name()
    }

    pub fn location(&self) -> &RelativePath {
        self.info().location()
    }

    pub fn payload(&self) -> &Payload {
        self.info().payload()
    }

    /// The kind of this node, without computing its full [`Stat`].
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Dir(_) => NodeKind::Directory,
            Self::File(file) => match file.content() {
                Content::Link(_) => NodeKind::Symlink,
                Content::Data(_) => NodeKind::File,
            },
        }
    }

    pub fn stat(&self) -> Result<Stat> {
        match self {
            Self::Dir(dir) => dir.stat(),
            Self::File(file) => Ok(file.stat()),
        }
    }

    pub fn as_dir(&self) -> Option<&Directory> {
        match self {
            Self::Dir(dir) => Some(dir),
            Self::File(_) => None,
        }
    }

    pub fn into_dir(self) -> Result<Directory> {
        match self {
            Self::Dir(dir) => Ok(dir),
            Self::File(file) => Err(Error::not_a_directory(file.info().location())),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.payload() == other.payload()
    }
}

impl From<Directory> for Node {
    fn from(dir: Directory) -> Self {
        Self::Dir(dir)
    }
}

impl From<File> for Node {
    fn from(file: File) -> Self {
        Self::File(file)
    }
}
