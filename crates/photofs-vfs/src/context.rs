// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use photofs::Library;

use crate::SourceFs;

/// Options to configure the mounted filesystem.
#[derive(Debug, Clone)]
pub struct Config {
    /// The real directory mirrored under `o/`
    pub source: PathBuf,
    /// Where the filesystem is mounted, used to resolve
    /// link targets that point back into the mount
    pub mountpoint: PathBuf,
    /// The number of recent tag applications listed under `r/`
    pub recent_tags: usize,
    /// The user id that should own all files and directories
    pub uid: nix::unistd::Uid,
    /// The group id that should own all files and directories
    pub gid: nix::unistd::Gid,
}

/// Everything that the nodes of the filesystem need to compute themselves.
#[derive(Debug)]
pub struct Context {
    pub library: Arc<Library>,
    pub source: Arc<dyn SourceFs>,
    pub config: Config,
    /// Reported as the modification time of virtual nodes.
    pub started: SystemTime,
}

impl Context {
    pub fn new(library: Arc<Library>, source: Arc<dyn SourceFs>, config: Config) -> Self {
        Self {
            library,
            source,
            config,
            started: SystemTime::now(),
        }
    }
}
