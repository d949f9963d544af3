// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

//! Tagged photo collections, their persistent storage and the
//! cross-process protocol that keeps cached views consistent.

#![deny(unsafe_op_in_unsafe_fn)]

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
#[macro_use]
mod fixtures;

mod error;
mod image;
mod image_set;
mod library;
pub mod storage;
pub mod synchronize;
mod tag;
mod tag_set;
mod working_file;

pub use error::{Error, OsError, Result};
pub use image::{Image, PHOTO_EXTENSIONS};
pub use image_set::ImageSet;
pub use library::{Catalog, Library, Transaction};
pub use tag::Tag;
pub use tag_set::TagSet;
