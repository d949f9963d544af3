// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use fuser::MountOption;
use photofs_cli_common as cli;
use photofs_vfs::{Config, Filesystem, LocalFs, Session};
use tokio::signal::unix::{SignalKind, signal};

#[cfg(test)]
#[path = "./cmd_mount_test.rs"]
mod cmd_mount_test;

fn main() {
    // because this function exits right away it does not
    // properly handle destruction of data, so we put the actual
    // logic into a separate function/scope
    std::process::exit(main2())
}
fn main2() -> i32 {
    let opt = CmdMount::parse();
    opt.logging.configure();

    let config = match photofs_config::load_config() {
        Err(err) => {
            tracing::error!(err = ?err, "failed to load config");
            return 1;
        }
        Ok(config) => config,
    };
    let result = opt.run(&config);

    cli::handle_result!(result)
}

/// Mount a photo library as a filesystem
#[derive(Debug, Parser)]
#[clap(name = "photofs-mount", version = photofs::VERSION)]
pub struct CmdMount {
    #[clap(flatten)]
    logging: cli::Logging,

    /// Do not daemonize the filesystem, run it in the foreground instead
    #[clap(long, short)]
    foreground: bool,

    /// Do not disconnect the filesystem logs from stderr
    ///
    /// Although the filesystem will still daemonize, the logs will
    /// still appear in the stderr of the calling process/shell
    #[clap(long, short, env = "PHOTOFS_MOUNT_LOG_FOREGROUND")]
    log_foreground: bool,

    /// Options for the mount in the form opt1,opt2=value
    ///
    /// In addition to all existing fuse mount options, the following custom
    /// options are also supported:
    ///
    ///  uid    - the user id that should own all files in the mount, defaults to
    ///           the effective user id of the caller. Only allowed when running
    ///           as root/sudo.
    ///  gid    - the group id that should own all files in the mount, defaults to
    ///           the effective group id of the caller. Only allowed when running
    ///           as root/sudo.
    ///  recent - the number of recent tag applications listed under r/
    #[clap(long, short, value_delimiter = ',')]
    options: Vec<String>,

    /// The directory of photos to mirror, instead of the configured one
    #[clap(long)]
    source: Option<PathBuf>,

    /// The location where to mount the photo library
    #[clap(name = "MOUNTPOINT")]
    mountpoint: PathBuf,
}

/// The settings of a mount, after applying the command line options.
#[derive(Debug)]
struct MountSettings {
    uid: nix::unistd::Uid,
    gid: nix::unistd::Gid,
    recent_tags: usize,
    mount_options: Vec<MountOption>,
}

impl MountSettings {
    /// Apply the parsed mount options on top of the required ones.
    fn new(
        options: Vec<MountOption>,
        calling_uid: nix::unistd::Uid,
        calling_gid: nix::unistd::Gid,
        recent_tags: usize,
    ) -> Result<Self> {
        // these will cause conflicts later on if their counterpart is also provided
        let mut settings = Self {
            uid: calling_uid,
            gid: calling_gid,
            recent_tags,
            mount_options: vec![
                MountOption::NoDev,
                MountOption::NoSuid,
                MountOption::FSName("photofs".into()),
                MountOption::Subtype("photofs".into()),
            ],
        };
        for option in options {
            match option {
                MountOption::CUSTOM(opt) => match opt.split_once('=') {
                    Some(("recent", num)) => {
                        settings.recent_tags = num.parse().map_err(|err| {
                            anyhow!("Invalid parameter value for recent={num}: {err}")
                        })?
                    }
                    Some(("uid", num)) if calling_uid.is_root() => {
                        settings.uid = num
                            .parse::<u32>()
                            .map(nix::unistd::Uid::from_raw)
                            .map_err(|err| {
                                anyhow!("Invalid parameter value for uid={num}: {err}")
                            })?
                    }
                    Some(("gid", num)) if calling_uid.is_root() => {
                        settings.gid = num
                            .parse::<u32>()
                            .map(nix::unistd::Gid::from_raw)
                            .map_err(|err| {
                                anyhow!("Invalid parameter value for gid={num}: {err}")
                            })?
                    }
                    Some(("uid", _)) | Some(("gid", _)) => {
                        bail!("Must be root to launch with alternate uid/gid");
                    }
                    _ => bail!("Unsupported mount option, or missing value: {opt}"),
                },
                MountOption::FSName(_) | MountOption::Subtype(_) => {
                    bail!("The filesystem name and type cannot be changed")
                }
                MountOption::Dev | MountOption::Suid => {
                    bail!("Device files and setuid bits are never allowed")
                }
                option if settings.mount_options.contains(&option) => {}
                option => settings.mount_options.push(option),
            }
        }
        Ok(settings)
    }
}

impl CmdMount {
    pub fn run(&self, config: &photofs_config::Config) -> Result<i32> {
        let calling_uid = nix::unistd::geteuid();
        let calling_gid = nix::unistd::getegid();

        let settings = MountSettings::new(
            parse_options_from_args(&self.options),
            calling_uid,
            calling_gid,
            config.mount.recent_tags,
        )?;
        tracing::debug!("Mount settings: {settings:#?}");

        if settings.gid != calling_gid {
            nix::unistd::setgid(settings.gid).context("Failed to set desired group (actual)")?;
            nix::unistd::setegid(settings.gid)
                .context("Failed to set desired group (effective)")?;
        }
        if settings.uid != calling_uid {
            nix::unistd::setuid(settings.uid).context("Failed to become desired user (actual)")?;
            nix::unistd::seteuid(settings.uid)
                .context("Failed to become desired user (effective)")?;
        }

        let mountpoint = self
            .mountpoint
            .canonicalize()
            .context("Invalid mount point")?;
        let source = self
            .source
            .as_ref()
            .unwrap_or(&config.source.root)
            .canonicalize()
            .context("Invalid source directory")?;

        if !calling_uid.is_root() {
            // unprivileged callers must have write access to the directory that
            // they are trying to mount over.
            nix::unistd::access(&mountpoint, nix::unistd::AccessFlags::W_OK)
                .context("Must have write access to mountpoint")?;
        }

        let library = cli::open_library(config).context("Failed to open the photo library")?;
        let ctx = photofs_vfs::Context::new(
            Arc::new(library),
            Arc::new(LocalFs),
            Config {
                source,
                mountpoint: mountpoint.clone(),
                recent_tags: settings.recent_tags,
                uid: settings.uid,
                gid: settings.gid,
            },
        );

        tracing::debug!("Establishing fuse session...");
        let mut session = fuser::Session::new(
            Session::new(Filesystem::new(ctx)),
            &mountpoint,
            &settings.mount_options,
        )
        .context("Failed to create a FUSE session")?;

        if !self.foreground {
            tracing::debug!("Moving into background...");
            // We cannot daemonize until the session is established above,
            // otherwise initial use of the filesystem may not show any mount
            // at all.
            nix::unistd::daemon(false, self.log_foreground)?;
        }

        // We also cannot go multi-thread until the daemonization process above
        // is complete, otherwise we can end up with deadlocks.
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to establish runtime")?;

        let result = rt.block_on(async move {
            let mut interrupt =
                signal(SignalKind::interrupt()).context("interrupt signal handler")?;
            let mut quit = signal(SignalKind::quit()).context("quit signal handler")?;
            let mut terminate =
                signal(SignalKind::terminate()).context("terminate signal handler")?;

            tracing::info!(mountpoint = %mountpoint.display(), "Starting FUSE filesystem");
            // the session blocks its thread, so it runs on the blocking
            // pool where it cannot stall the signal handlers
            let fut = tokio::task::spawn_blocking(move || session.run());
            tokio::select! {
                res = fut => {
                    tracing::info!("Filesystem shutting down");
                    res.context("FUSE session failed")
                }
                // we explicitly catch any signal related to interruption
                // and will act by shutting down the filesystem early
                _ = terminate.recv() => Err(anyhow!("Terminate signal received, filesystem shutting down")),
                _ = interrupt.recv() => Err(anyhow!("Interrupt signal received, filesystem shutting down")),
                _ = quit.recv() => Err(anyhow!("Quit signal received, filesystem shutting down")),
            }
        });

        // the blocked session thread may never return
        // once a signal was received, so do not wait on it
        rt.shutdown_timeout(std::time::Duration::from_secs(2));
        result??;
        Ok(0)
    }
}

/// Copies from the private [`fuser::MountOption::from_str`]
fn parse_options_from_args(args: &[String]) -> Vec<MountOption> {
    args.iter()
        .map(|s| match s.as_str() {
            "auto_unmount" => MountOption::AutoUnmount,
            "allow_other" => MountOption::AllowOther,
            "allow_root" => MountOption::AllowRoot,
            "default_permissions" => MountOption::DefaultPermissions,
            "dev" => MountOption::Dev,
            "nodev" => MountOption::NoDev,
            "suid" => MountOption::Suid,
            "nosuid" => MountOption::NoSuid,
            "ro" => MountOption::RO,
            "rw" => MountOption::RW,
            "exec" => MountOption::Exec,
            "noexec" => MountOption::NoExec,
            "atime" => MountOption::Atime,
            "noatime" => MountOption::NoAtime,
            "dirsync" => MountOption::DirSync,
            "sync" => MountOption::Sync,
            "async" => MountOption::Async,
            x if x.starts_with("fsname=") => MountOption::FSName(x[7..].into()),
            x if x.starts_with("subtype=") => MountOption::Subtype(x[8..].into()),
            x => MountOption::CUSTOM(x.into()),
        })
        .collect()
}
