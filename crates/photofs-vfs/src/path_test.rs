// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::RelativePath;

#[rstest]
#[case("/", "")]
#[case("", "")]
#[case(".", "")]
#[case("./t/good", "t/good")]
#[case("//t//good/", "t/good")]
#[case("/t/./good", "t/good")]
#[case("/t/bad/../good", "t/good")]
#[case("/../t", "t")]
fn test_normalize(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(RelativePath::new(input).as_str(), expected);
}

#[rstest]
fn test_equality_after_normalization() {
    assert_eq!(RelativePath::new("/t/good/"), RelativePath::new("t//good"));
}

#[rstest]
fn test_descend() {
    let path = RelativePath::new("/t/good/better");
    assert!(!path.is_this());
    assert_eq!(path.top_name(), Some("t"));
    let rest = path.descend();
    assert_eq!(rest.as_str(), "good/better");
    let rest = rest.descend().descend();
    assert!(rest.is_this());
    assert_eq!(rest.top_name(), None);
    assert!(rest.descend().is_this());
}

#[rstest]
#[case("/t/good/better", Some("t/good"), "better")]
#[case("/t", Some(""), "t")]
#[case("/", None, "")]
fn test_parent_and_name(#[case] input: &str, #[case] parent: Option<&str>, #[case] name: &str) {
    let path = RelativePath::new(input);
    assert_eq!(path.parent().as_ref().map(|p| p.as_str()), parent);
    assert_eq!(path.name(), name);
}

#[rstest]
fn test_join_and_display() {
    let path = RelativePath::root().join("t").join("good");
    assert_eq!(path.as_str(), "t/good");
    assert_eq!(path.to_string(), "/t/good");
}

#[rstest]
#[case("t/good", "../o/a.jpg", Some("t/o/a.jpg"))]
#[case("t/good", "../../o/a.jpg", Some("o/a.jpg"))]
#[case("t/good", "../../../a.jpg", None)]
#[case("", "../a.jpg", None)]
#[case("", "o/../../a.jpg", None)]
fn test_join_within(#[case] base: &str, #[case] path: &str, #[case] expected: Option<&str>) {
    let joined = RelativePath::new(base).join_within(path);
    assert_eq!(joined.as_ref().map(|p| p.as_str()), expected);
}
