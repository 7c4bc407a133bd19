//! Patches version 0 Android boot images so the system only brings up the
//! little cluster, optionally disabling dm-verity and forced encryption.
//!
//! The image is decoded, the kernel cmdline and the gzip ramdisk are patched
//! with fixed literals, and everything is written back page aligned.

#[macro_use]
mod layouts;

pub mod cmdline;
pub mod compress;
pub mod constants;
pub mod error;
pub mod header;
pub mod image;
pub mod patcher;
pub mod ramdisk;
pub mod report;
mod utils;

pub use error::{PatchError, Result};
pub use patcher::{PatchOptions, patch_file, patch_image};
pub use utils::align_to;
