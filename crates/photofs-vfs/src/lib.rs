// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

//! The PhotoFS virtual filesystem
//!
//! Nodes are computed from the library on every request, so the tree
//! never needs to be invalidated. The `fuse-backend` feature serves
//! the tree over FUSE on linux.

#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
#[macro_use]
mod fixtures;

mod context;
mod dir;
mod fs;
#[cfg(all(unix, feature = "fuse-backend"))]
mod fuse;
mod mirrored_dir;
mod node;
mod path;
mod root_dir;
mod source;
mod tag_dir;

pub use context::{Config, Context};
pub use dir::{Dir, Directory};
pub use fs::Filesystem;
#[cfg(all(unix, feature = "fuse-backend"))]
pub use fuse::Session;
pub use mirrored_dir::{MirroredDir, TAGS_APPLIED_DIR, TAGS_DIR};
pub use node::{Content, File, Node, NodeInfo, NodeKind, Payload, Stat};
pub use path::RelativePath;
pub use root_dir::{MIRROR_DIR, RECENT_DIR, RootDir, TAG_SPACE_DIR};
pub use source::{LocalFs, SourceEntry, SourceFs};
pub use tag_dir::{Domain, STATS_FILE, Scope, TagDir, display_names, display_names_avoiding};
