// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

macro_rules! fixtures {
    () => {
        use rstest::fixture;

        #[allow(dead_code)]
        fn init_logging() {
            let sub = tracing_subscriber::FmtSubscriber::builder()
                .with_max_level(tracing::Level::TRACE)
                .without_time()
                .with_test_writer()
                .finish();
            let _ = tracing::subscriber::set_global_default(sub);
        }

        #[allow(dead_code)]
        #[fixture]
        fn tmpdir() -> tempfile::TempDir {
            tempfile::Builder::new()
                .prefix("photofs-test-")
                .tempdir()
                .expect("failed to create dir for test")
        }

        /// A filesystem over a small source tree in a temporary directory.
        ///
        /// The tree holds `2001/a.jpg`, `2001/b.jpg`, `2002/c.jpg` and
        /// `notes.txt`; every jpg is tracked by the library, which has
        /// no tags yet. The mountpoint is `<tmpdir>/mnt`.
        #[allow(dead_code)]
        #[fixture]
        fn filesystem(tmpdir: tempfile::TempDir) -> (tempfile::TempDir, crate::Filesystem) {
            let repo = std::sync::Arc::new(photofs::storage::MemRepository::default());
            filesystem_over(tmpdir, repo)
        }

        /// Like [`filesystem`], but stored as json in `<tmpdir>/storage`
        /// so that [`storage_library`] can open it again.
        #[allow(dead_code)]
        #[fixture]
        fn json_filesystem(tmpdir: tempfile::TempDir) -> (tempfile::TempDir, crate::Filesystem) {
            let repo = photofs::storage::JsonRepository::open(tmpdir.path().join("storage"))
                .expect("failed to open json repository for test");
            filesystem_over(tmpdir, std::sync::Arc::new(repo))
        }

        /// Another library over the storage of a [`json_filesystem`],
        /// standing in for a second process.
        #[allow(dead_code)]
        fn storage_library(tmpdir: &std::path::Path) -> photofs::Library {
            let root = tmpdir.join("storage");
            let repo = photofs::storage::JsonRepository::open(&root)
                .expect("failed to open json repository for test");
            let lock = photofs::synchronize::Lock::open(
                &root,
                "photofs",
                std::time::Duration::from_millis(200),
            )
            .expect("failed to open lock for test");
            photofs::Library::new(std::sync::Arc::new(repo), lock)
                .expect("failed to create library")
        }

        #[allow(dead_code)]
        fn filesystem_over(
            tmpdir: tempfile::TempDir,
            repo: std::sync::Arc<dyn photofs::storage::Repository>,
        ) -> (tempfile::TempDir, crate::Filesystem) {
            let source = tmpdir.path().join("source");
            for dir in ["2001", "2002"] {
                std::fs::create_dir_all(source.join(dir)).expect("failed to create source dir");
            }
            for file in ["2001/a.jpg", "2001/b.jpg", "2002/c.jpg", "notes.txt"] {
                std::fs::write(source.join(file), b"data").expect("failed to create source file");
            }

            let lock = photofs::synchronize::Lock::open(
                tmpdir.path().join("storage"),
                "photofs",
                std::time::Duration::from_millis(200),
            )
            .expect("failed to open lock for test");
            let library = photofs::Library::new(repo, lock).expect("failed to create library");
            library
                .write(|txn| {
                    for file in ["2001/a.jpg", "2001/b.jpg", "2002/c.jpg"] {
                        txn.add_image(photofs::Image::new(source.join(file).to_string_lossy()))?;
                    }
                    Ok(())
                })
                .expect("failed to add test images");

            let config = crate::Config {
                source,
                mountpoint: tmpdir.path().join("mnt"),
                recent_tags: 10,
                uid: nix::unistd::getuid(),
                gid: nix::unistd::getgid(),
            };
            let ctx = crate::Context::new(
                std::sync::Arc::new(library),
                std::sync::Arc::new(crate::LocalFs),
                config,
            );
            (tmpdir, crate::Filesystem::new(ctx))
        }

        /// The real path of a file in the [`filesystem`] source tree.
        #[allow(dead_code)]
        fn source_image(fs: &crate::Filesystem, file: &str) -> photofs::Image {
            photofs::Image::new(fs.context().config.source.join(file).to_string_lossy())
        }
    };
}
