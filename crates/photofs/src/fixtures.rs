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

        /// A library over an empty in-memory repository, locked in `dir`.
        #[allow(dead_code)]
        fn mem_library(dir: &std::path::Path) -> crate::Library {
            let repo = std::sync::Arc::new(crate::storage::MemRepository::default());
            let lock = crate::synchronize::Lock::open(
                dir,
                "photofs",
                std::time::Duration::from_millis(200),
            )
            .expect("failed to open lock for test");
            crate::Library::new(repo, lock).expect("failed to create library for test")
        }
    };
}
