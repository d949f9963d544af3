// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use relative_path::{Component, RelativePathBuf};

#[cfg(test)]
#[path = "./path_test.rs"]
mod path_test;

/// A location within the mounted filesystem, relative to its root.
///
/// Paths are normalized on creation: leading separators and `.`
/// components are dropped and `..` is resolved, never climbing
/// above the root. Two paths are equal if their normalized forms are.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(RelativePathBuf);

impl RelativePath {
    pub fn new<S: AsRef<str>>(path: S) -> Self {
        Self(normalize(path.as_ref()).0)
    }

    /// Like [`Self::new`], but `None` if any `..` would climb above the root.
    pub fn within_root<S: AsRef<str>>(path: S) -> Option<Self> {
        match normalize(path.as_ref()) {
            (normalized, false) => Some(Self(normalized)),
            (_, true) => None,
        }
    }

    /// The path of the filesystem root.
    pub fn root() -> Self {
        Self::default()
    }

    /// True if this path has no components, referring
    /// to the node where the search starts.
    pub fn is_this(&self) -> bool {
        self.0.as_str().is_empty()
    }

    /// The first component, if any.
    pub fn top_name(&self) -> Option<&str> {
        self.components().next()
    }

    /// This path without its first component.
    pub fn descend(&self) -> RelativePath {
        let mut components = self.components();
        components.next();
        Self(components.collect())
    }

    /// This path without its last component, if it has one.
    pub fn parent(&self) -> Option<RelativePath> {
        if self.is_this() {
            return None;
        }
        self.0.parent().map(|p| Self(p.to_relative_path_buf()))
    }

    /// The last component, or an empty string for the root.
    pub fn name(&self) -> &str {
        self.0.file_name().unwrap_or_default()
    }

    pub fn join<S: AsRef<str>>(&self, name: S) -> RelativePath {
        Self::new(self.0.join(name.as_ref()).as_str())
    }

    /// Join a relative path onto this one, unless it leaves the root.
    pub fn join_within<S: AsRef<str>>(&self, path: S) -> Option<RelativePath> {
        Self::within_root(self.0.join(path.as_ref()).as_str())
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.components().filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The absolute form of this path under the given directory.
    pub fn to_path<P: AsRef<std::path::Path>>(&self, base: P) -> std::path::PathBuf {
        self.0.to_path(base)
    }
}

/// Resolve `.` and `..` components, also reporting
/// whether a `..` was dropped at the root.
fn normalize(path: &str) -> (RelativePathBuf, bool) {
    let mut normalized = RelativePathBuf::new();
    let mut climbed = false;
    for component in relative_path::RelativePath::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                climbed |= !normalized.pop();
            }
            Component::Normal(name) => normalized.push(name),
        }
    }
    (normalized, climbed)
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl From<&str> for RelativePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}
