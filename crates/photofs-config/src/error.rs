// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::io;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Diagnostic, Debug, Error)]
#[diagnostic(
    url(
        "https://photofs.dev/error_codes#{}",
        self.code().unwrap_or_else(|| Box::new("photofs::generic"))
    )
)]
pub enum Error {
    #[error("Invalid path {0}")]
    InvalidPath(std::path::PathBuf, #[source] io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
