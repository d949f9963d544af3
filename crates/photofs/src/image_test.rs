// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::Image;

#[rstest]
#[case("/photos/2001/a.jpg", "/photos/2001/a.jpg")]
#[case("photos//2001/./a.jpg", "photos/2001/a.jpg")]
#[case("/photos/2001/../2002/a.jpg", "/photos/2002/a.jpg")]
#[case("/../a.jpg", "/a.jpg")]
fn test_image_path_normalized(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(Image::new(input).path(), expected);
}

#[rstest]
fn test_image_identity_by_path() {
    assert_eq!(Image::new("/a//b.jpg"), Image::new("/a/b.jpg"));
    assert_ne!(Image::new("/a/b.jpg"), Image::new("/a/b.JPG"));
}

#[rstest]
#[case("/photos/2001/a.jpg", "photos-2001-a.jpg")]
#[case("relative/a.jpg", "relative-a.jpg")]
fn test_image_name(#[case] path: &str, #[case] expected: &str) {
    assert_eq!(Image::new(path).name(), expected);
}

#[rstest]
#[case("a/b/scan.tiff.jpg", "scan", vec!["tiff", "jpg"])]
#[case("a/b/.hidden.jpg", ".hidden", vec!["jpg"])]
#[case("a/b/.hidden", ".hidden", vec![])]
#[case("a/b/noext", "noext", vec![])]
fn test_image_extensions(#[case] path: &str, #[case] stem: &str, #[case] extensions: Vec<&str>) {
    let image = Image::new(path);
    assert_eq!(image.stem(), stem);
    assert_eq!(image.extensions(), extensions);
}

#[rstest]
#[case("a/b/1984-01-23-001-8x10-scan.xcf.jpg", "a/b/1984-01-23-001")]
#[case("a/b/1984-1-3b-12.jpg", "a/b/1984-1-3b-12")]
#[case("a/b/IMG_1234.small.xcf.jpg", "a/b/1234")]
#[case("a/b/sunset.jpg", "a/b/sunset")]
#[case("/top.jpg", "/top")]
#[case("1.jpg", "1")]
fn test_reference_path(#[case] path: &str, #[case] expected: &str) {
    assert_eq!(Image::new(path).reference_path(), expected);
}

#[rstest]
#[case("a/b/1.jpg", "a/b/1.JPG", true)]
#[case("a/b/IMG_0001.CR2", "a/b/0001.edited.jpg", true)]
#[case("a/b/1.jpg", "a/1.jpg", false)]
#[case("a/b/1.jpg", "a/b/1.jpg", false)]
#[case("a/b/1.jpg", "a/b/2.jpg", false)]
fn test_is_sidecar(#[case] left: &str, #[case] right: &str, #[case] expected: bool) {
    assert_eq!(Image::new(left).is_sidecar(&Image::new(right)), expected);
}

#[rstest]
#[case("/photos/2001/a.jpg", "/photos", true)]
#[case("/photos/2001/a.jpg", "/photos/", true)]
#[case("/photos2/a.jpg", "/photos", false)]
#[case("/photos", "/photos", false)]
#[case("/photos/a.jpg", "/", true)]
fn test_is_within(#[case] path: &str, #[case] dir: &str, #[case] expected: bool) {
    assert_eq!(Image::new(path).is_within(dir), expected);
}

#[rstest]
#[case("a/IMG_1.JPG", true)]
#[case("a/scan.xcf", true)]
#[case("a/notes.txt", false)]
#[case("a/noext", false)]
fn test_is_photo(#[case] path: &str, #[case] expected: bool) {
    assert_eq!(Image::new(path).is_photo(), expected);
}
