// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use super::Library;
use crate::storage::{JsonRepository, Repository};
use crate::synchronize::Lock;
use crate::{Error, Image};

fixtures!();

fn json_library(dir: &std::path::Path) -> Library {
    let repo = Arc::new(JsonRepository::open(dir).unwrap());
    let lock = Lock::open(dir, "photofs", Duration::from_millis(200)).unwrap();
    Library::new(repo, lock).unwrap()
}

fn count(dir: &std::path::Path) -> String {
    std::fs::read_to_string(dir.join("photofs.count")).unwrap()
}

#[rstest]
fn test_write_updates_catalog_and_store(tmpdir: tempfile::TempDir) {
    let library = mem_library(tmpdir.path());
    let image = Image::new("/photos/1.jpg");
    library
        .write(|txn| {
            txn.add_image(image.clone())?;
            txn.create_tag("good")?;
            txn.create_tag("better")?;
            txn.apply_tags(&["good", "better"], &image)
        })
        .unwrap();

    let catalog = library.catalog();
    assert_eq!(catalog.tags.intersection(&["good", "better"]).range(), vec![image.clone()]);
    let record = library.repository().find_by_name("better").unwrap().unwrap();
    assert_eq!(record.images, vec![image]);
    assert_eq!(count(tmpdir.path()), "1");
}

#[rstest]
fn test_write_without_changes_does_not_count(tmpdir: tempfile::TempDir) {
    let library = mem_library(tmpdir.path());
    library.write(|txn| Ok(txn.catalog().tags.len())).unwrap();
    assert_eq!(count(tmpdir.path()), "0");
}

#[rstest]
fn test_create_duplicate_tag(tmpdir: tempfile::TempDir) {
    let library = mem_library(tmpdir.path());
    library.write(|txn| txn.create_tag("good").map(|_| ())).unwrap();
    let res = library.write(|txn| txn.create_tag("good").map(|_| ()));
    assert!(matches!(res, Err(Error::AlreadyExists(_))));
    assert!(!library.lock().lock_file().exists(), "lock released on error");
}

#[rstest]
fn test_remove_and_delete_tag(tmpdir: tempfile::TempDir) {
    let library = mem_library(tmpdir.path());
    let image = Image::new("/1.jpg");
    library
        .write(|txn| {
            txn.create_tag("good")?;
            txn.apply_tags(&["good"], &image)?;
            txn.remove_tags(&["good"], &image)?;
            txn.delete_tag("good")
        })
        .unwrap();
    assert!(library.catalog().tags.is_empty());
    assert!(library.catalog().images.contains(&image));
    let res = library.write(|txn| txn.delete_tag("good"));
    assert!(matches!(res, Err(Error::NotFound(_))));
}

#[rstest]
fn test_rename_tag(tmpdir: tempfile::TempDir) {
    let library = mem_library(tmpdir.path());
    let image = Image::new("/1.jpg");
    library
        .write(|txn| {
            txn.create_tag("old")?;
            txn.create_tag("taken")?;
            txn.apply_tags(&["old"], &image)?;
            txn.rename_tag("old", "new").map(|_| ())
        })
        .unwrap();
    assert_eq!(library.catalog().tags.names(), vec!["new", "taken"]);
    let record = library.repository().find_by_name("new").unwrap().unwrap();
    assert_eq!(record.images, vec![image]);
    assert!(library.repository().find_by_name("old").unwrap().is_none());

    let res = library.write(|txn| txn.rename_tag("new", "taken").map(|_| ()));
    assert!(matches!(res, Err(Error::AlreadyExists(_))));
}

#[rstest]
fn test_other_process_write_reloads(tmpdir: tempfile::TempDir) {
    init_logging();
    let mounted = json_library(tmpdir.path());
    let command = json_library(tmpdir.path());
    let image = Image::new("/photos/1.jpg");
    command
        .write(|txn| {
            txn.create_tag("good")?;
            txn.apply_tags(&["good"], &image)
        })
        .unwrap();

    assert!(mounted.catalog().tags.is_empty(), "not reloaded yet");
    assert!(mounted.refresh().unwrap());
    assert_eq!(mounted.catalog().tags.names(), vec!["good"]);
    assert!(mounted.catalog().images.contains(&image));

    mounted
        .write(|txn| txn.remove_tags(&["good"], &image))
        .unwrap();
    command.locked(|_| Ok(())).unwrap();
    assert!(command.catalog().tags.intersection(&["good"]).is_empty());
}

#[rstest]
fn test_recent_tag_names(tmpdir: tempfile::TempDir) {
    let library = mem_library(tmpdir.path());
    library
        .write(|txn| {
            for name in ["a", "b", "c"] {
                txn.create_tag(name)?;
            }
            txn.apply_tags(&["a"], &Image::new("/1.jpg"))?;
            txn.apply_tags(&["b"], &Image::new("/1.jpg"))?;
            txn.apply_tags(&["c"], &Image::new("/1.jpg"))?;
            txn.apply_tags(&["b"], &Image::new("/2.jpg"))
        })
        .unwrap();
    assert_eq!(library.recent_tag_names(3).unwrap(), vec!["b", "c"]);
    assert_eq!(library.recent_tag_names(10).unwrap(), vec!["b", "c", "a"]);
}

#[rstest]
fn test_failed_save_discards_changes(tmpdir: tempfile::TempDir) {
    let library = json_library(tmpdir.path());
    library.write(|txn| txn.create_tag("good").map(|_| ())).unwrap();

    // a directory in place of the working file cannot be written
    std::fs::create_dir(tmpdir.path().join("photofs.json.work")).unwrap();
    let res = library.write(|txn| txn.create_tag("better").map(|_| ()));
    assert!(matches!(res, Err(Error::StorageWriteError(..))), "{res:?}");

    let catalog = library.catalog();
    assert!(catalog.tags.contains("good"));
    assert!(!catalog.tags.contains("better"));
    assert!(library.repository().find_by_name("better").unwrap().is_none());
    assert_eq!(count(tmpdir.path()), "1");
    assert!(!library.lock().lock_file().exists());
}
