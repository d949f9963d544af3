// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use photofs::Library;
use photofs::storage::JsonRepository;
use photofs::synchronize::Lock;
use tracing_subscriber::prelude::*;

#[cfg(test)]
#[path = "./args_test.rs"]
mod args_test;

const PHOTOFS_LOG: &str = "PHOTOFS_LOG";

/// The name of the lock shared by every process that uses a storage root.
const LOCK_NAME: &str = "photofs";

/// Command line flags for configuring logging
#[derive(Debug, Clone, clap::Args)]
pub struct Logging {
    /// Make output more verbose, can be specified more than once
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Logging {
    pub fn configure(&self) {
        configure_logging(self.verbose as usize)
    }
}

/// The logging filter for a level of verbosity.
///
/// With no extra verbosity, `PHOTOFS_LOG` replaces the default
/// filter. `RUST_LOG` is always appended to whatever is chosen.
fn log_filter(verbosity: usize, existing: Option<String>, overrides: Option<String>) -> String {
    let mut config = match verbosity {
        0 => existing.unwrap_or_else(|| "photofs=info,warn".to_string()),
        1 => "photofs=debug,info".to_string(),
        2 => "photofs=trace,info".to_string(),
        3 => "photofs=trace,debug".to_string(),
        _ => "trace".to_string(),
    };
    if let Some(overrides) = overrides {
        config.push(',');
        config.push_str(&overrides);
    }
    config
}

pub fn configure_logging(verbosity: usize) {
    let config = log_filter(
        verbosity,
        std::env::var(PHOTOFS_LOG).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let env_filter = tracing_subscriber::filter::EnvFilter::new(config);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(verbosity > 2)
        .with_writer(std::io::stderr);
    let sub = tracing_subscriber::registry().with(fmt_layer.with_filter(env_filter));
    if let Err(err) = tracing::subscriber::set_global_default(sub) {
        eprintln!("WARNING: failed to configure logging: {err}");
    }
}

/// Open the library kept in the configured storage root.
pub fn open_library(config: &photofs_config::Config) -> photofs::Result<Library> {
    let root = &config.storage.root;
    let repository = Arc::new(JsonRepository::open(root)?);
    let lock = Lock::open(root, LOCK_NAME, config.lock_timeout())?;
    tracing::debug!(root = %root.display(), "opened library");
    Library::new(repository, lock)
}

/// The outermost [`photofs::Error`] among an error and its causes.
pub fn photofs_error<'a>(
    err: &'a (dyn std::error::Error + 'static),
) -> Option<&'a photofs::Error> {
    std::iter::successors(Some(err), |err| err.source()).find_map(|err| err.downcast_ref())
}

#[macro_export(local_inner_macros)]
macro_rules! handle_result {
    ($result:ident) => {{
        match $result {
            Err(err) => match $crate::photofs_error(&*err) {
                Some(photofs::Error::LockUnavailable(path, _)) => {
                    tracing::error!("{err}");
                    tracing::error!(
                        " > if no other photofs process is running, remove {}",
                        path.display()
                    );
                    1
                }
                Some(photofs::Error::StorageWriteError(_, path, io_err))
                    if std::matches!(
                        io_err.raw_os_error(),
                        Some($crate::__private::libc::ENOSPC)
                    ) =>
                {
                    tracing::error!("Out of disk space writing to {path}", path = path.display());
                    1
                }
                _ => {
                    tracing::error!("{err:#}");
                    1
                }
            },
            Ok(code) => code,
        }
    }};
}
