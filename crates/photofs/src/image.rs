// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "./image_test.rs"]
mod image_test;

/// File extensions (lowercase, final extension only) that are
/// considered to be photographs when importing a directory.
pub const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "tif", "tiff", "webp", "heic", "heif", "xcf", "dng", "cr2",
    "cr3", "crw", "nef", "nrw", "arw", "srf", "sr2", "orf", "raf", "rw2", "pef", "raw",
];

/// `YYYY-M-D[suffix]-frame[-notes]`
static NORMALIZED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{1,2}-\d{1,2}[A-Za-z]*)-(\d+)(?:-.*)?$")
        .expect("normalized name pattern should compile")
});

static TRAILING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)$").expect("trailing digits pattern should compile"));

/// A single image file, identified solely by its normalized path.
///
/// All other attributes are derived from the path, which is why it
/// cannot be changed once the image has been created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Image {
    path: String,
}

impl Image {
    pub fn new<S: AsRef<str>>(path: S) -> Self {
        Self {
            path: normalize(path.as_ref()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The visible file name of this image inside of tag directories.
    ///
    /// Path separators are replaced with dashes so that the name is unique
    /// for each path, eg: `/photos/2001/a.jpg` becomes `photos-2001-a.jpg`.
    pub fn name(&self) -> String {
        let name = self.path.replace('/', "-");
        match name.strip_prefix('-') {
            Some(stripped) => stripped.to_string(),
            None => name,
        }
    }

    /// The final component of the path.
    pub fn basename(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((_, base)) => base,
            None => &self.path,
        }
    }

    /// The directory containing this image, if the path has one.
    pub fn dirname(&self) -> Option<&str> {
        match self.path.rsplit_once('/') {
            Some(("", _)) => Some("/"),
            Some((dir, _)) => Some(dir),
            None => None,
        }
    }

    /// The basename with all extensions removed.
    pub fn stem(&self) -> &str {
        split_extensions(self.basename()).0
    }

    /// Every extension of the basename, in order.
    ///
    /// Everything after the first dot is considered an extension,
    /// so `scan.xcf.jpg` has the extensions `xcf` and `jpg`. A leading
    /// dot does not start an extension.
    pub fn extensions(&self) -> Vec<&str> {
        let (_, extensions) = split_extensions(self.basename());
        if extensions.is_empty() {
            return Vec::new();
        }
        extensions.split('.').collect()
    }

    /// True if the final extension is one of the [`PHOTO_EXTENSIONS`].
    pub fn is_photo(&self) -> bool {
        self.extensions()
            .last()
            .map(|ext| PHOTO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// The part of the file name that identifies the photograph itself,
    /// independent of format variants and edits.
    pub fn reference_name(&self) -> String {
        let stem = self.stem();
        if let Some(captures) = NORMALIZED_NAME.captures(stem) {
            return format!("{}-{}", &captures[1], &captures[2]);
        }
        if let Some(captures) = TRAILING_DIGITS.captures(stem) {
            return captures[1].to_string();
        }
        stem.to_string()
    }

    /// The [`Self::reference_name`] joined onto this image's directory.
    pub fn reference_path(&self) -> String {
        let name = self.reference_name();
        match self.dirname() {
            Some("/") => format!("/{name}"),
            Some(dir) => format!("{dir}/{name}"),
            None => name,
        }
    }

    /// True if the other image is a different file of the same photograph.
    pub fn is_sidecar(&self, other: &Image) -> bool {
        self.path != other.path && self.reference_path() == other.reference_path()
    }

    /// True if this image is somewhere below the given directory.
    pub fn is_within<S: AsRef<str>>(&self, dir: S) -> bool {
        let dir = dir.as_ref().trim_end_matches('/');
        if dir.is_empty() {
            return self.path.starts_with('/');
        }
        self.path
            .strip_prefix(dir)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
    }
}

impl std::fmt::Display for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<String> for Image {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&str> for Image {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<Image> for String {
    fn from(image: Image) -> Self {
        image.path
    }
}

/// Split a basename into its stem and (possibly compound) extension.
fn split_extensions(basename: &str) -> (&str, &str) {
    let skip = usize::from(basename.starts_with('.'));
    match basename[skip..].find('.') {
        Some(index) => {
            let index = skip + index;
            (&basename[..index], &basename[index + 1..])
        }
        None => (basename, ""),
    }
}

/// Collapse repeated separators and `.`/`..` components.
fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if absolute => continue,
                _ => parts.push(".."),
            },
            part => parts.push(part),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}
