use std::io;

use thiserror::Error;

/// Errors that can occur while decoding or encoding a resources image.
///
/// Format corruption is never transient, so none of these are retried;
/// decode either returns a fully valid image or fails with the first
/// problem it finds.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("The image magic value is invalid: {:?}", _0)]
    InvalidMagic([u8; 8]),

    #[error("The item magic value is invalid: {:#010x}", _0)]
    InvalidItemMagic(u32),

    #[error("Image version {} is not supported", _0)]
    UnsupportedVersion(i32),

    #[error("The item chain did not terminate within {} records", _0)]
    UnterminatedChain(usize),

    #[error("The input ended before {} bytes could be read", _0)]
    TruncatedRead(usize),

    #[error("The stored {} checksum {:#010x} does not match the computed {:#010x}", _0, _1, _2)]
    ChecksumMismatch(&'static str, u32, u32),

    #[error("I/O error: {}", _0)]
    Io(#[from] io::Error),
}
