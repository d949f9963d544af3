// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use photofs::Image;
use photofs_cli_common as cli;

#[cfg(test)]
#[path = "./cmd_import_test.rs"]
mod cmd_import_test;

/// Add photos to the library
///
/// Directories are searched recursively, and only files with a
/// known photo extension are added.
#[derive(Debug, Args)]
pub struct CmdImport {
    /// Do not add anything, only list the photos that would be added
    #[clap(long)]
    dry_run: bool,

    /// The photos or directories of photos to add
    #[clap(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,
}

impl CmdImport {
    pub fn run(&mut self, config: &photofs_config::Config) -> Result<i32> {
        let photos = find_photos(&self.paths)?;
        if self.dry_run {
            for photo in photos.iter() {
                println!("{photo}");
            }
            return Ok(0);
        }

        let library = cli::open_library(config)?;
        let added = library.write(|txn| {
            let mut added = 0;
            for photo in photos {
                if txn.catalog().images.contains(&photo) {
                    continue;
                }
                txn.add_image(photo)?;
                added += 1;
            }
            Ok(added)
        })?;
        tracing::info!(added, "imported photos");
        Ok(0)
    }
}

/// Every photo at or below the given paths, by absolute path.
fn find_photos(paths: &[PathBuf]) -> Result<Vec<Image>> {
    let mut photos = Vec::new();
    for path in paths {
        let root = path
            .canonicalize()
            .with_context(|| format!("Invalid path: {}", path.display()))?;
        for entry in walkdir::WalkDir::new(&root).follow_links(true).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("Failed to read from {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(image) = image_for(entry.path()) else {
                tracing::debug!(path = %entry.path().display(), "skipping non-photo");
                continue;
            };
            photos.push(image);
        }
    }
    photos.sort();
    photos.dedup();
    Ok(photos)
}

fn image_for(path: &Path) -> Option<Image> {
    let Some(path) = path.to_str() else {
        tracing::warn!(path = %path.display(), "skipping path that is not valid utf-8");
        return None;
    };
    Some(Image::new(path)).filter(Image::is_photo)
}
