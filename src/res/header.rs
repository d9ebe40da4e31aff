use std::fmt;
use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::FormatError;
use crate::res::{read_exact, IMG_HEAD_SZ, IMG_MAGIC, IMG_VERSION_V2, ITEM_ALIGN_SZ};

/// Length of the opaque tail that pads the header out to 64 bytes
const RESERVED_LEN: usize = IMG_HEAD_SZ as usize - 8 * 3 - 4;

/// The 64-byte header at offset 0 of every resources image.
#[derive(Clone)]
pub struct ImageHeader {
    /// crc32 checksum of the image, covering everything behind this field
    pub(crate) crc: u32,
    /// Format version; versions 1 and 2 share this layout
    pub(crate) version: i32,
    /// Declared total image size in bytes
    pub(crate) img_sz: u32,
    /// Declared number of item records
    pub(crate) img_item_num: u32,
    /// Alignment unit for item placement
    pub(crate) align_sz: u32,
    /// Opaque tail, round-tripped byte-for-byte
    pub(crate) reserved: [u8; RESERVED_LEN],
}

impl ImageHeader {
    /// Reads and parses the image header from the current position of
    /// `reader`, returning `ImageHeader` on success, `FormatError` otherwise.
    ///
    /// The declared size and item count are taken at face value; decoding an
    /// image trusts the item chain terminator, not these fields.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, FormatError> {
        let mut buf = [0u8; IMG_HEAD_SZ as usize];
        read_exact(reader, &mut buf)?;

        let mut cursor = Cursor::new(&buf[..]);

        // Read the image checksum
        let crc = cursor.read_u32::<LittleEndian>()?;

        // Read the format version
        let version = cursor.read_i32::<LittleEndian>()?;

        // Read and validate the magic bytes
        let mut magic = [0u8; 8];
        cursor.read_exact(&mut magic)?;

        if &magic != IMG_MAGIC {
            return Err(FormatError::InvalidMagic(magic));
        }

        if version > IMG_VERSION_V2 {
            return Err(FormatError::UnsupportedVersion(version));
        }

        // Read the declared image size
        let img_sz = cursor.read_u32::<LittleEndian>()?;

        // Read the declared item count
        let img_item_num = cursor.read_u32::<LittleEndian>()?;

        // Read the alignment unit
        let align_sz = cursor.read_u32::<LittleEndian>()?;

        // Read the reserved tail verbatim
        let mut reserved = [0u8; RESERVED_LEN];
        cursor.read_exact(&mut reserved)?;

        Ok(ImageHeader {
            crc,
            version,
            img_sz,
            img_item_num,
            align_sz,
            reserved,
        })
    }

    /// Writes the 64-byte header record to the given `writer`
    ///
    /// The checksum, size and count fields are serialized as currently set;
    /// re-packing an image updates them before calling this.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), FormatError> {
        // Write the image checksum
        writer.write_all(&self.crc.to_le_bytes())?;

        // Write the format version
        writer.write_all(&self.version.to_le_bytes())?;

        // Write the magic bytes
        writer.write_all(IMG_MAGIC)?;

        // Write the declared image size
        writer.write_all(&self.img_sz.to_le_bytes())?;

        // Write the declared item count
        writer.write_all(&self.img_item_num.to_le_bytes())?;

        // Write the alignment unit
        writer.write_all(&self.align_sz.to_le_bytes())?;

        // Write the reserved tail byte-for-byte
        writer.write_all(&self.reserved)?;

        Ok(())
    }
}

impl Default for ImageHeader {
    fn default() -> ImageHeader {
        ImageHeader {
            crc: 0,
            version: IMG_VERSION_V2,
            img_sz: 0,
            img_item_num: 0,
            align_sz: ITEM_ALIGN_SZ,
            reserved: [0u8; RESERVED_LEN],
        }
    }
}

impl fmt::Debug for ImageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHeader")
            .field("crc", &format_args!("{:#010x}", self.crc))
            .field("version", &self.version)
            .field("img_sz", &self.img_sz)
            .field("img_item_num", &self.img_item_num)
            .field("align_sz", &self.align_sz)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;

    fn sample_header_bytes() -> [u8; 64] {
        let mut buf = [0u8; 64];
        buf[0..4].copy_from_slice(&0xDEADBEEFu32.to_le_bytes());
        buf[4..8].copy_from_slice(&2i32.to_le_bytes());
        buf[8..16].copy_from_slice(b"AML_RES!");
        buf[16..20].copy_from_slice(&4096u32.to_le_bytes());
        buf[20..24].copy_from_slice(&2u32.to_le_bytes());
        buf[24..28].copy_from_slice(&16u32.to_le_bytes());
        buf
    }

    #[test]
    fn it_should_read_header() {
        let bytes = sample_header_bytes();
        let mut cursor = Cursor::new(&bytes[..]);
        let header = ImageHeader::from_reader(&mut cursor).unwrap();

        assert_eq!(header.crc, 0xDEADBEEF);
        assert_eq!(header.version, 2);
        assert_eq!(header.img_sz, 4096);
        assert_eq!(header.img_item_num, 2);
        assert_eq!(header.align_sz, 16);
    }

    #[test]
    fn it_should_reject_invalid_magic() {
        let mut buf = sample_header_bytes();
        buf[8] = b'X';

        let mut cursor = Cursor::new(&buf[..]);
        let err = ImageHeader::from_reader(&mut cursor).unwrap_err();

        assert!(matches!(err, FormatError::InvalidMagic(_)));
    }

    #[test]
    fn it_should_read_both_supported_versions() {
        for version in &[1i32, 2i32] {
            let mut buf = sample_header_bytes();
            buf[4..8].copy_from_slice(&version.to_le_bytes());

            let mut cursor = Cursor::new(&buf[..]);
            let header = ImageHeader::from_reader(&mut cursor).unwrap();

            assert_eq!(header.version, *version);
        }
    }

    #[test]
    fn it_should_reject_newer_versions() {
        let mut buf = sample_header_bytes();
        buf[4..8].copy_from_slice(&3i32.to_le_bytes());

        let mut cursor = Cursor::new(&buf[..]);
        let err = ImageHeader::from_reader(&mut cursor).unwrap_err();

        assert!(matches!(err, FormatError::UnsupportedVersion(3)));
    }

    #[test]
    fn it_should_write_identical_header_bytes() {
        let bytes = sample_header_bytes();
        let mut cursor = Cursor::new(&bytes[..]);
        let header = ImageHeader::from_reader(&mut cursor).unwrap();

        let mut buf: Vec<u8> = Vec::with_capacity(64);
        header.write_to(&mut buf).unwrap();

        assert_eq_hex!(&buf[..], &bytes[..]);
    }

    #[test]
    fn it_should_report_truncated_input() {
        let bytes = sample_header_bytes();
        let mut cursor = Cursor::new(&bytes[..10]);
        let err = ImageHeader::from_reader(&mut cursor).unwrap_err();

        assert!(matches!(err, FormatError::TruncatedRead(64)));
    }
}
