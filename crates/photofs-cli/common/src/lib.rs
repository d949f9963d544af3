// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

//! Common macros and argument structures for the photofs command line

mod args;

pub use args::{Logging, configure_logging, open_library, photofs_error};

#[doc(hidden)]
pub mod __private {
    pub use libc;
}
