// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use photofs_cli_common as cli;

mod cmd_import;
mod cmd_rename_tag;
mod cmd_tags;

fn main() {
    // because this function exits right away it does not
    // properly handle destruction of data, so we put the actual
    // logic into a separate function/scope
    std::process::exit(main2())
}
fn main2() -> i32 {
    let mut opt = Opt::parse();
    opt.logging.configure();

    let config = match photofs_config::load_config() {
        Err(err) => {
            tracing::error!(err = ?err, "failed to load config");
            return 1;
        }
        Ok(config) => config,
    };
    let result = opt.cmd.run(&config);

    cli::handle_result!(result)
}

/// Manage the photo library behind a photofs mount
///
/// Changes made here are picked up by running mounts
/// the next time that they are accessed.
#[derive(Debug, Parser)]
#[clap(name = "photofs", version = photofs::VERSION)]
pub struct Opt {
    #[clap(flatten)]
    logging: cli::Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Import(cmd_import::CmdImport),
    Tags(cmd_tags::CmdTags),
    RenameTag(cmd_rename_tag::CmdRenameTag),
}

impl Command {
    pub fn run(&mut self, config: &photofs_config::Config) -> Result<i32> {
        match self {
            Self::Import(cmd) => cmd.run(config),
            Self::Tags(cmd) => cmd.run(config),
            Self::RenameTag(cmd) => cmd.run(config),
        }
    }
}
