//! Reading and writing Amlogic resources images.
//!
//! A resources image is the `logo.img`-style container the Amlogic U-Boot
//! bootloader loads named binary assets (boot splash bitmaps and the like)
//! from: a 64-byte header followed by a chain of 64-byte item records, each
//! pointing at its payload and at the next record by absolute file offset.
//!
//! # Examples
//!
//! ```no_run
//! use std::fs::File;
//!
//! use amlres::ResourceImage;
//!
//! let mut file = File::open("logo.img")?;
//! let image = ResourceImage::from_reader(&mut file)?;
//!
//! for item in image.items() {
//!     println!("{} ({} bytes)", item.name(), item.size());
//! }
//!
//! # Ok::<(), amlres::FormatError>(())
//! ```

mod error;
pub mod res;

pub use error::FormatError;

pub use res::{ImageHeader, ResourceImage, ResourceItem};
