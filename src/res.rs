//! Amlogic resources image format module

use std::io::{self, Read};

use crate::error::FormatError;

mod crc;
mod header;
mod image;
mod item;

/// Alignment unit for item placement within a packed image, in bytes.
pub const ITEM_ALIGN_SZ: u32 = 16;
/// Size of the image header record.
pub const IMG_HEAD_SZ: u32 = ITEM_ALIGN_SZ * 4;
/// Size of one item header record.
pub const ITEM_HEAD_SZ: u32 = ITEM_ALIGN_SZ * 4;
/// Magic bytes at offset 8 of the image header.
pub const IMG_MAGIC: &[u8; 8] = b"AML_RES!";
/// Magic number at the start of every item header record.
pub const ITEM_MAGIC: u32 = 0x27051956;
/// Length of the name field in an item header record.
pub const ITEM_NAME_LEN: usize = 32;

pub const IMG_VERSION_V1: i32 = 0x01;
pub const IMG_VERSION_V2: i32 = 0x02;

/// Upper bound on the number of records followed during chain traversal.
///
/// The on-disk chain has no cycle protection of its own; a chain that is
/// still going after this many records is reported as unterminated instead
/// of being walked forever.
pub const ITEM_CHAIN_LIMIT: usize = 4096;

pub use crc::crc32;
pub use header::ImageHeader;
pub use image::ResourceImage;
pub use item::ResourceItem;

/// Reads exactly `buf.len()` bytes from `reader`, reporting a short read as
/// a `TruncatedRead` rather than a bare I/O error.
pub(crate) fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), FormatError> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => FormatError::TruncatedRead(buf.len()),
        _ => FormatError::Io(err),
    })
}
