// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use photofs::{Error, OsError};
use rstest::rstest;

use super::{TAGS_APPLIED_DIR, TAGS_DIR};
use crate::{Filesystem, NodeKind, RelativePath};

fixtures!();

fn path(path: &str) -> RelativePath {
    RelativePath::new(path)
}

fn names(fs: &Filesystem, dir: &str) -> Vec<String> {
    fs.readdir(&path(dir))
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

#[rstest]
fn test_mirrors_source(filesystem: (tempfile::TempDir, Filesystem)) {
    let (_tmpdir, fs) = filesystem;
    let listing = fs.readdir(&path("o")).unwrap();
    assert_eq!(
        listing,
        vec![
            (String::from("2001"), NodeKind::Directory),
            (String::from("2002"), NodeKind::Directory),
            (String::from("notes.txt"), NodeKind::Symlink),
            (TAGS_DIR.to_string(), NodeKind::Directory),
        ]
    );
    let target = fs.readlink(&path("o/2001/a.jpg")).unwrap();
    assert_eq!(target, fs.context().config.source.join("2001/a.jpg"));
}

#[rstest]
fn test_read_only(filesystem: (tempfile::TempDir, Filesystem)) {
    let (_tmpdir, fs) = filesystem;
    let stat = fs.getattr(&path("o/2001")).unwrap();
    assert!(stat.is_dir());
    assert_eq!(stat.perm & 0o222, 0);

    let err = fs.mkdir(&path("o/2003")).unwrap_err();
    assert_eq!(err.os_error(), Some(libc::EPERM));
    let err = fs.rmdir(&path("o/2001")).unwrap_err();
    assert_eq!(err.os_error(), Some(libc::EPERM));
    let err = fs.unlink(&path("o/notes.txt")).unwrap_err();
    assert_eq!(err.os_error(), Some(libc::EPERM));
    assert!(fs.context().config.source.join("notes.txt").exists());
}

#[rstest]
fn test_no_tags_without_images(filesystem: (tempfile::TempDir, Filesystem)) {
    let (_tmpdir, fs) = filesystem;
    std::fs::create_dir(fs.context().config.source.join("empty")).unwrap();
    assert!(names(&fs, "o/empty").is_empty());
}

#[rstest]
fn test_rename_tags_image(filesystem: (tempfile::TempDir, Filesystem)) {
    let (_tmpdir, fs) = filesystem;
    fs.mkdir(&path("t/good")).unwrap();
    assert!(!names(&fs, "o/2001").contains(&TAGS_APPLIED_DIR.to_string()));

    fs.rename(&path("o/2001/a.jpg"), &path("t/good/a.jpg")).unwrap();
    let image = source_image(&fs, "2001/a.jpg");
    assert_eq!(names(&fs, "t/good"), vec![image.name()]);
    assert!(
        fs.context().config.source.join("2001/a.jpg").exists(),
        "the real file is never moved"
    );

    assert!(names(&fs, "o/2001").contains(&TAGS_APPLIED_DIR.to_string()));
    assert!(!names(&fs, "o/2002").contains(&TAGS_APPLIED_DIR.to_string()));
    assert_eq!(names(&fs, "o/2001/tags-applied"), vec!["good", "stats"]);
    assert_eq!(names(&fs, "o/2001/tags-applied/good"), vec![image.name()]);
}

#[rstest]
fn test_rename_untracked_is_not_permitted(filesystem: (tempfile::TempDir, Filesystem)) {
    let (_tmpdir, fs) = filesystem;
    fs.mkdir(&path("t/good")).unwrap();
    let res = fs.rename(&path("o/notes.txt"), &path("t/good/notes.txt"));
    assert!(matches!(res, Err(Error::NotPermitted(_))));
}

#[rstest]
fn test_scoped_tags_reject_other_images(filesystem: (tempfile::TempDir, Filesystem)) {
    let (_tmpdir, fs) = filesystem;
    fs.mkdir(&path("o/2002/tags/good")).unwrap();
    assert_eq!(names(&fs, "t"), vec!["good", "stats"], "tags are shared");

    let res = fs.rename(&path("o/2001/a.jpg"), &path("o/2002/tags/good/a.jpg"));
    assert!(matches!(res, Err(Error::NotPermitted(_))));
    fs.rename(&path("o/2002/c.jpg"), &path("o/2002/tags/good/c.jpg"))
        .unwrap();
    assert_eq!(names(&fs, "t/good"), vec![source_image(&fs, "2002/c.jpg").name()]);
}
