// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use photofs_cli_common as cli;

/// List all tags in the library
#[derive(Debug, Args)]
pub struct CmdTags {
    /// Also list the photos that carry each tag
    #[clap(long, short)]
    long: bool,
}

impl CmdTags {
    pub fn run(&mut self, config: &photofs_config::Config) -> Result<i32> {
        let library = cli::open_library(config)?;
        // hold the lock so that the listing is consistent
        library.locked(|catalog| {
            for tag in catalog.tags.tags() {
                println!("{}: {}", tag.name(), tag.len().to_string().dimmed());
                if self.long {
                    for image in tag.range() {
                        println!("  {}", image.to_string().cyan());
                    }
                }
            }
            Ok(())
        })?;
        Ok(0)
    }
}
