// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// FAT32 volume boot record, byte for byte.
///
/// Multi-byte fields are stored little-endian; read them through the
/// accessor methods rather than directly.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat32Vbr {
    pub jump_boot: [u8; 3],
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entry_count: u16,
    pub total_sectors_16: u16,
    pub media: u8,
    pub fat_size_16: u16,
    pub sectors_per_track: u16,
    pub num_heads: u16,
    pub hidden_sectors: u32,
    pub total_sectors_32: u32,

    // FAT32 Extended BPB
    pub fat_size_32: u32,
    pub ext_flags: u16,
    pub fs_version: u16,
    pub root_cluster: u32,
    pub fsinfo_sector: u16,
    pub backup_boot_sector: u16,
    pub reserved: [u8; 12],

    pub drive_number: u8,
    pub reserved1: u8,
    pub boot_signature: u8,
    pub volume_id: u32,
    pub volume_label: [u8; 11],
    pub fs_type: [u8; 8],

    pub boot_code: [u8; 420],
    pub signature: [u8; 2],
}

impl Fat32Vbr {
    #[inline]
    pub fn bytes_per_sector(&self) -> u16 {
        u16::from_le(self.bytes_per_sector)
    }

    #[inline]
    pub fn reserved_sectors(&self) -> u16 {
        u16::from_le(self.reserved_sectors)
    }

    #[inline]
    pub fn root_entry_count(&self) -> u16 {
        u16::from_le(self.root_entry_count)
    }

    #[inline]
    pub fn total_sectors_16(&self) -> u16 {
        u16::from_le(self.total_sectors_16)
    }

    #[inline]
    pub fn total_sectors_32(&self) -> u32 {
        u32::from_le(self.total_sectors_32)
    }

    #[inline]
    pub fn fat_size_16(&self) -> u16 {
        u16::from_le(self.fat_size_16)
    }

    #[inline]
    pub fn fat_size_32(&self) -> u32 {
        u32::from_le(self.fat_size_32)
    }

    #[inline]
    pub fn root_cluster(&self) -> u32 {
        u32::from_le(self.root_cluster)
    }

    #[inline]
    pub fn volume_id(&self) -> u32 {
        u32::from_le(self.volume_id)
    }
}
