// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::Args;
use photofs_cli_common as cli;

/// Rename a tag, keeping all of its photos
#[derive(Debug, Args)]
pub struct CmdRenameTag {
    /// The current name of the tag
    #[clap(value_name = "OLD")]
    old: String,

    /// The new name for the tag, which must not exist yet
    #[clap(value_name = "NEW")]
    new: String,
}

impl CmdRenameTag {
    pub fn run(&mut self, config: &photofs_config::Config) -> Result<i32> {
        let library = cli::open_library(config)?;
        let tag = library.write(|txn| txn.rename_tag(&self.old, &self.new))?;
        tracing::info!(from = %self.old, to = %tag, images = tag.len(), "renamed tag");
        Ok(0)
    }
}
