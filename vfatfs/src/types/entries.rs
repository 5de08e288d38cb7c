// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{attr::Fat32Attributes, constant::*};

/// One 32-byte directory slot, classified by its first byte and attribute.
#[derive(Debug, Clone, Copy)]
pub enum RawSlot {
    EndOfDirectory,
    Deleted,
    LongName(Fat32LFNEntry),
    Short(Fat32Entry),
}

impl RawSlot {
    pub fn classify(slot: &[u8; FAT_DIR_ENTRY_SIZE]) -> Self {
        match slot[0] {
            FAT_EOD => return RawSlot::EndOfDirectory,
            FAT_ENTRY_DELETED => return RawSlot::Deleted,
            _ => {}
        }

        let lfn_bits = Fat32Attributes::LFN.bits();
        if slot[11] & lfn_bits == lfn_bits {
            // Both layouts are exactly 32 bytes, the conversion cannot fail.
            match Fat32LFNEntry::read_from_bytes(slot) {
                Ok(lfn) => RawSlot::LongName(lfn),
                Err(_) => RawSlot::Deleted,
            }
        } else {
            match Fat32Entry::read_from_bytes(slot) {
                Ok(entry) => RawSlot::Short(entry),
                Err(_) => RawSlot::Deleted,
            }
        }
    }
}

/// Short (8.3) directory entry.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat32Entry {
    pub name: [u8; 11],
    pub attr: u8,
    pub nt_reserved: u8,
    pub creation_time_tenth: u8,
    pub creation_time: u16,
    pub creation_date: u16,
    pub access_date: u16,
    pub first_cluster_high: u16,
    pub write_time: u16,
    pub write_date: u16,
    pub first_cluster_low: u16,
    pub file_size: u32,
}

impl Fat32Entry {
    /// Builds a raw short entry, mostly for crafting directory images.
    pub fn new(name: [u8; 11], attr: u8, cluster: u32, size: u32) -> Self {
        let high = ((cluster >> 16) & 0xFFFF) as u16;
        let low = (cluster & 0xFFFF) as u16;
        Self {
            name,
            attr,
            nt_reserved: 0,
            creation_time_tenth: 0,
            creation_time: 0,
            creation_date: 0,
            access_date: 0,
            first_cluster_high: high.to_le(),
            write_time: 0,
            write_date: 0,
            first_cluster_low: low.to_le(),
            file_size: size.to_le(),
        }
    }

    pub fn with_write_time(mut self, date: u16, time: u16) -> Self {
        self.write_date = date.to_le();
        self.write_time = time.to_le();
        self
    }

    pub fn attributes(&self) -> Fat32Attributes {
        Fat32Attributes::from_bits_retain(self.attr)
    }

    pub fn first_cluster(&self) -> u32 {
        let high = u16::from_le(self.first_cluster_high) as u32;
        let low = u16::from_le(self.first_cluster_low) as u32;
        (high << 16) | low
    }

    pub fn file_size(&self) -> u32 {
        u32::from_le(self.file_size)
    }

    pub fn is_dot(&self) -> bool {
        &self.name == FAT_DOT_NAME || &self.name == FAT_DOTDOT_NAME
    }
}

/// Long-name fragment: 13 UTF-16 units split across three fields.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat32LFNEntry {
    pub order: u8,
    pub name1: [u16; 5],
    pub attr: u8,
    pub type_field: u8,
    pub checksum: u8,
    pub name2: [u16; 6],
    pub zero: u16,
    pub name3: [u16; 2],
}

impl Fat32LFNEntry {
    pub fn new(
        order: u8,
        is_last: bool,
        name_chunk: &[u16], // max 13
        checksum: u8,
    ) -> Self {
        let mut units = [LFN_PAD; LFN_CHARS_PER_ENTRY];
        for (slot, &c) in units.iter_mut().zip(name_chunk) {
            *slot = c.to_le();
        }
        if name_chunk.len() < LFN_CHARS_PER_ENTRY {
            units[name_chunk.len()] = LFN_TERMINATOR;
        }

        let mut name1 = [0u16; 5];
        let mut name2 = [0u16; 6];
        let mut name3 = [0u16; 2];
        name1.copy_from_slice(&units[0..5]);
        name2.copy_from_slice(&units[5..11]);
        name3.copy_from_slice(&units[11..13]);

        Self {
            order: if is_last { order | LFN_LAST_FLAG } else { order },
            name1,
            attr: Fat32Attributes::LFN.bits(),
            type_field: 0x00,
            checksum,
            name2,
            zero: 0,
            name3,
        }
    }

    pub fn ordinal(&self) -> u8 {
        self.order & LFN_ORDINAL_MASK
    }

    pub fn is_last(&self) -> bool {
        self.order & LFN_LAST_FLAG != 0
    }

    /// The 13 code units in name order (name1, name2, name3).
    pub fn extract_utf16(&self) -> [u16; LFN_CHARS_PER_ENTRY] {
        let mut out = [LFN_PAD; LFN_CHARS_PER_ENTRY];
        let name1 = self.name1;
        let name2 = self.name2;
        let name3 = self.name3;
        out[0..5].copy_from_slice(&name1);
        out[5..11].copy_from_slice(&name2);
        out[11..13].copy_from_slice(&name3);
        for unit in out.iter_mut() {
            *unit = u16::from_le(*unit);
        }
        out
    }
}
