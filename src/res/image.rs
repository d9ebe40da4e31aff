use std::io::{Read, Seek, SeekFrom};

use log::trace;

use crate::error::FormatError;
use crate::res::{
    crc32, ImageHeader, ResourceItem, IMG_HEAD_SZ, ITEM_ALIGN_SZ, ITEM_CHAIN_LIMIT, ITEM_HEAD_SZ,
};

/// An in-memory resources image: the header plus every item in chain order.
#[derive(Debug, Clone, Default)]
pub struct ResourceImage {
    header: ImageHeader,
    items: Vec<ResourceItem>,
}

impl ResourceImage {
    /// Creates an image from named assets, ready to be packed.
    ///
    /// Items are numbered in the order given; the classification type and
    /// compression bytes are left at zero.
    pub fn from_assets<I>(assets: I) -> ResourceImage
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let mut items: Vec<ResourceItem> = assets
            .into_iter()
            .map(|(name, data)| ResourceItem::with_data(name, data))
            .collect();

        let nums = items.len() as u8;

        for (index, item) in items.iter_mut().enumerate() {
            item.index = index as u8;
            item.nums = nums;
        }

        ResourceImage {
            header: ImageHeader::default(),
            items,
        }
    }

    /// Reads and parses an entire resources image from `reader`, returning
    /// `ResourceImage` on success, `FormatError` otherwise.
    ///
    /// Stored checksums are not verified; the bootloader itself never checks
    /// them either.
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self, FormatError> {
        Self::read_image(reader, false)
    }

    /// Same as [`ResourceImage::from_reader`], but additionally recomputes
    /// every item's header and payload checksums, failing with
    /// `ChecksumMismatch` when a stored value disagrees.
    pub fn from_reader_strict<R: Read + Seek>(reader: &mut R) -> Result<Self, FormatError> {
        Self::read_image(reader, true)
    }

    fn read_image<R: Read + Seek>(reader: &mut R, verify: bool) -> Result<Self, FormatError> {
        reader.seek(SeekFrom::Start(0))?;

        let header = ImageHeader::from_reader(reader)?;

        // The first item record sits right behind the header. From there on
        // the chain decides where to go; the declared item count is never
        // consulted and traversal stops at the null terminator.
        let mut offset = u64::from(IMG_HEAD_SZ);
        let mut items = Vec::new();

        loop {
            if items.len() >= ITEM_CHAIN_LIMIT {
                return Err(FormatError::UnterminatedChain(ITEM_CHAIN_LIMIT));
            }

            let item = ResourceItem::from_reader(reader, offset)?;

            if verify {
                item.verify_checksums()?;
            }

            trace!("Read {:?} at offset {:#x}", item, offset);

            let next = item.next;
            items.push(item);

            if next == 0 {
                break;
            }

            offset = u64::from(next);
        }

        Ok(ResourceImage { header, items })
    }

    /// Serializes the image and returns the packed bytes.
    ///
    /// Items are laid out in chain order behind the header: each 64-byte
    /// record is immediately followed by its payload, zero-padded up to the
    /// next alignment boundary. The item offsets, checksums, declared item
    /// count, declared size and the image checksum are all recomputed, and
    /// the updated values are left on the image.
    pub fn pack(&mut self) -> Result<Vec<u8>, FormatError> {
        self.header.img_item_num = self.items.len() as u32;

        // Lay every item out before serializing anything; the header
        // checksums cover the start and next fields.
        let item_count = self.items.len();
        let mut offset = IMG_HEAD_SZ;

        for (index, item) in self.items.iter_mut().enumerate() {
            item.start = offset + ITEM_HEAD_SZ;

            let end_of_data = item.start + item.data.len() as u32;
            let padded = align_up(end_of_data, ITEM_ALIGN_SZ);

            item.next = if index + 1 == item_count { 0 } else { padded };
            item.update_checksums();

            offset = padded;
        }

        self.header.img_sz = offset;
        self.header.crc = 0;

        let mut packed = Vec::with_capacity(self.header.img_sz as usize);
        self.header.write_to(&mut packed)?;

        for item in &self.items {
            item.write_to(&mut packed)?;
            packed.resize(align_up(packed.len() as u32, ITEM_ALIGN_SZ) as usize, 0);
        }

        // The image checksum covers everything behind the crc field itself.
        // It is patched into the serialized bytes last.
        let crc = crc32(&packed[4..]);
        packed[0..4].copy_from_slice(&crc.to_le_bytes());
        self.header.crc = crc;

        Ok(packed)
    }

    /// The image header.
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    /// The items in chain order.
    pub fn items(&self) -> &[ResourceItem] {
        &self.items
    }
}

/// Rounds `value` up to the next multiple of `align`.
fn align_up(value: u32, align: u32) -> u32 {
    (value + align - 1) / align * align
}
