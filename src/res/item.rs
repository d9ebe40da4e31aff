use std::fmt;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt};
use log::warn;

use crate::error::FormatError;
use crate::res::{crc32, read_exact, ITEM_HEAD_SZ, ITEM_MAGIC, ITEM_NAME_LEN};

/// One named asset carried by a resources image, together with the metadata
/// of its 64-byte item header record.
///
/// The record and its payload are decoupled in the file: `start` is an
/// absolute offset of its own and the payload may live anywhere, including
/// in front of the record. Re-packing always writes them contiguously.
#[derive(Clone)]
pub struct ResourceItem {
    /// Header checksum: crc32 of the record with this field zeroed
    pub(crate) hcrc: u32,
    /// Absolute file offset of the payload
    pub(crate) start: u32,
    /// Unused by the bootloader, round-tripped verbatim
    pub(crate) end: u32,
    /// Absolute file offset of the next item record; 0 terminates the chain
    pub(crate) next: u32,
    /// Payload checksum (crc32)
    pub(crate) dcrc: u32,
    // Classification bytes, opaque to the codec
    pub(crate) index: u8,
    pub(crate) nums: u8,
    pub(crate) item_type: u8,
    pub(crate) comp: u8,
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
}

impl ResourceItem {
    /// Creates a new item carrying `data`, with every offset, checksum and
    /// classification byte zeroed until the image is packed.
    pub fn with_data<S: Into<String>>(name: S, data: Vec<u8>) -> ResourceItem {
        let name = name.into();

        if name.len() > ITEM_NAME_LEN {
            warn!(
                "Item name {:?} is longer than {} bytes and will be truncated on disk",
                name, ITEM_NAME_LEN
            );
        }

        ResourceItem {
            hcrc: 0,
            start: 0,
            end: 0,
            next: 0,
            dcrc: 0,
            index: 0,
            nums: 0,
            item_type: 0,
            comp: 0,
            name,
            data,
        }
    }

    /// Reads and parses the item record at `offset`, along with the payload
    /// it points at, returning `ResourceItem` on success, `FormatError`
    /// otherwise.
    pub fn from_reader<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Self, FormatError> {
        reader.seek(SeekFrom::Start(offset))?;

        let mut buf = [0u8; ITEM_HEAD_SZ as usize];
        read_exact(reader, &mut buf)?;

        let mut cursor = Cursor::new(&buf[..]);

        // Read and validate the item magic
        let magic = cursor.read_u32::<LittleEndian>()?;

        if magic != ITEM_MAGIC {
            return Err(FormatError::InvalidItemMagic(magic));
        }

        // Read the header checksum
        let hcrc = cursor.read_u32::<LittleEndian>()?;

        // Read the payload length
        let size = cursor.read_u32::<LittleEndian>()?;

        // Read the payload offset
        let start = cursor.read_u32::<LittleEndian>()?;

        // Read the reserved end field
        let end = cursor.read_u32::<LittleEndian>()?;

        // Read the offset of the next item record
        let next = cursor.read_u32::<LittleEndian>()?;

        // Read the payload checksum
        let dcrc = cursor.read_u32::<LittleEndian>()?;

        // Read the classification bytes
        let index = cursor.read_u8()?;
        let nums = cursor.read_u8()?;
        let item_type = cursor.read_u8()?;
        let comp = cursor.read_u8()?;

        // Read the name field and strip its trailing NUL padding
        let mut name_buf = [0u8; ITEM_NAME_LEN];
        cursor.read_exact(&mut name_buf)?;

        let name_len = name_buf
            .iter()
            .rposition(|&byte| byte != 0)
            .map_or(0, |pos| pos + 1);
        let name = String::from_utf8_lossy(&name_buf[..name_len]).into_owned();

        // The payload lives at its own absolute offset, not necessarily
        // right behind the record.
        reader.seek(SeekFrom::Start(u64::from(start)))?;

        let mut data = vec![0u8; size as usize];
        read_exact(reader, &mut data)?;

        Ok(ResourceItem {
            hcrc,
            start,
            end,
            next,
            dcrc,
            index,
            nums,
            item_type,
            comp,
            name,
            data,
        })
    }

    /// Writes the item record immediately followed by its payload to the
    /// given `writer`
    ///
    /// The `start` and `next` offsets are serialized as currently set;
    /// re-packing an image recomputes them before calling this.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), FormatError> {
        writer.write_all(&self.record_bytes(self.hcrc))?;
        writer.write_all(&self.data)?;

        Ok(())
    }

    /// Recomputes the header and payload checksums and compares them against
    /// the stored ones.
    pub fn verify_checksums(&self) -> Result<(), FormatError> {
        let hcrc = crc32(&self.record_bytes(0));

        if hcrc != self.hcrc {
            return Err(FormatError::ChecksumMismatch("item header", self.hcrc, hcrc));
        }

        let dcrc = crc32(&self.data);

        if dcrc != self.dcrc {
            return Err(FormatError::ChecksumMismatch("item data", self.dcrc, dcrc));
        }

        Ok(())
    }

    /// The asset name, as stored in the record minus the NUL padding.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The payload length in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The absolute file offset the payload was read from, or will be
    /// written to once the image is packed.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// The raw payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Refreshes the stored checksums from the current record contents.
    ///
    /// The payload checksum is part of the record, so it has to be computed
    /// first.
    pub(crate) fn update_checksums(&mut self) {
        self.dcrc = crc32(&self.data);
        self.hcrc = crc32(&self.record_bytes(0));
    }

    /// Serializes the 64-byte item record with the given header checksum
    /// value and the name field padded back out to 32 bytes with NULs.
    fn record_bytes(&self, hcrc: u32) -> [u8; ITEM_HEAD_SZ as usize] {
        let mut buf = [0u8; ITEM_HEAD_SZ as usize];

        buf[0..4].copy_from_slice(&ITEM_MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&hcrc.to_le_bytes());
        buf[8..12].copy_from_slice(&(self.data.len() as u32).to_le_bytes());
        buf[12..16].copy_from_slice(&self.start.to_le_bytes());
        buf[16..20].copy_from_slice(&self.end.to_le_bytes());
        buf[20..24].copy_from_slice(&self.next.to_le_bytes());
        buf[24..28].copy_from_slice(&self.dcrc.to_le_bytes());
        buf[28] = self.index;
        buf[29] = self.nums;
        buf[30] = self.item_type;
        buf[31] = self.comp;

        let name = self.name.as_bytes();
        let name_len = name.len().min(ITEM_NAME_LEN);
        buf[32..32 + name_len].copy_from_slice(&name[..name_len]);

        buf
    }
}

impl fmt::Debug for ResourceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceItem")
            .field("name", &self.name)
            .field("size", &self.data.len())
            .field("start", &format_args!("{:#x}", self.start))
            .field("next", &format_args!("{:#x}", self.next))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;
    use hex_literal::hex;

    fn sample_record(name: &[u8], size: u32, start: u32, next: u32) -> [u8; 64] {
        let mut buf = [0u8; 64];
        buf[0..4].copy_from_slice(&ITEM_MAGIC.to_le_bytes());
        buf[8..12].copy_from_slice(&size.to_le_bytes());
        buf[12..16].copy_from_slice(&start.to_le_bytes());
        buf[20..24].copy_from_slice(&next.to_le_bytes());
        buf[32..32 + name.len()].copy_from_slice(name);
        buf
    }

    #[test]
    fn it_should_read_item_with_detached_payload() {
        // A bitmap-ish payload placed in front of the record it belongs to
        let payload = hex!("42 4d 36 00 0c 00 00");

        let mut image = vec![0u8; 128];
        image[8..15].copy_from_slice(&payload);
        image[64..128].copy_from_slice(&sample_record(b"boot", 7, 8, 0));

        let mut cursor = Cursor::new(image);
        let item = ResourceItem::from_reader(&mut cursor, 64).unwrap();

        assert_eq!(item.name, "boot");
        assert_eq!(item.data, payload);
        assert_eq!(item.start, 8);
        assert_eq!(item.next, 0);
    }

    #[test]
    fn it_should_reject_invalid_item_magic() {
        let mut record = sample_record(b"boot", 0, 64, 0);
        record[0..4].copy_from_slice(&0xBADC0DEu32.to_le_bytes());

        let mut cursor = Cursor::new(&record[..]);
        let err = ResourceItem::from_reader(&mut cursor, 0).unwrap_err();

        assert!(matches!(err, FormatError::InvalidItemMagic(0x0BADC0DE)));
    }

    #[test]
    fn it_should_strip_name_padding() {
        let mut image = vec![0u8; 64];
        image.extend_from_slice(&sample_record(b"logo", 4, 0, 0));
        image[0..4].copy_from_slice(b"data");

        let mut cursor = Cursor::new(image);
        let item = ResourceItem::from_reader(&mut cursor, 64).unwrap();

        assert_eq!(item.name, "logo");

        // Re-padding the name reproduces the original 32-byte field
        let record = item.record_bytes(item.hcrc);
        assert_eq_hex!(&record[32..36], b"logo");
        assert!(record[36..64].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn it_should_write_record_and_payload_contiguously() {
        let mut item = ResourceItem::with_data("boot", b"splash".to_vec());
        item.start = 128;
        item.update_checksums();

        let mut buf: Vec<u8> = Vec::new();
        item.write_to(&mut buf).unwrap();

        assert_eq!(buf.len(), 64 + 6);
        assert_eq_hex!(&buf[0..4], &ITEM_MAGIC.to_le_bytes());
        assert_eq!(&buf[64..], b"splash");
    }

    #[test]
    fn it_should_verify_checksums() {
        let mut item = ResourceItem::with_data("boot", b"splash".to_vec());
        item.update_checksums();

        item.verify_checksums().unwrap();

        // A flipped payload byte leaves the record intact but breaks the
        // payload checksum
        item.data[0] ^= 1;
        let err = item.verify_checksums().unwrap_err();
        assert!(matches!(err, FormatError::ChecksumMismatch("item data", ..)));
    }

    #[test]
    fn it_should_report_truncated_payload() {
        // The record declares 32 payload bytes at offset 64, right at EOF
        let record = sample_record(b"boot", 32, 64, 0);

        let mut cursor = Cursor::new(&record[..]);
        let err = ResourceItem::from_reader(&mut cursor, 0).unwrap_err();

        assert!(matches!(err, FormatError::TruncatedRead(32)));
    }
}
