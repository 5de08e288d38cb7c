// SPDX-License-Identifier: MIT

// === Boot Sector ===

pub const FAT_BOOT_SECTOR_SIZE: usize = 512;
pub const FAT_VALID_SECTOR_SIZES: [u16; 4] = [512, 1024, 2048, 4096];
pub const FAT_SIGNATURE: [u8; 2] = [0x55, 0xAA]; // BS offset 510

// === FAT Width Thresholds (data cluster counts) ===

pub const FAT12_MAX_CLUSTERS: u32 = 4085;
pub const FAT16_MAX_CLUSTERS: u32 = 65525;

// === FAT Region ===

pub const FAT_ENTRY_SIZE: usize = 4;
pub const FAT_MASK: u32 = 0x0FFF_FFFF; // FAT32 uses 28 bits
pub const FAT_FIRST_CLUSTER: u32 = 2;
pub const FAT_FREE: u32 = 0x0000_0000;
pub const FAT_BAD_CLUSTER: u32 = 0x0FFF_FFF7;
pub const FAT_EOC_MIN: u32 = 0x0FFF_FFF8;
pub const FAT_EOC: u32 = 0x0FFF_FFFF;

// === Directory Entries ===

pub const FAT_DIR_ENTRY_SIZE: usize = 32;
pub const FAT_EOD: u8 = 0x00;
pub const FAT_ENTRY_DELETED: u8 = 0xE5;
pub const FAT_ENTRY_KANJI_ESCAPE: u8 = 0x05; // stored for a leading 0xE5 byte
pub const FAT_DOT_NAME: &[u8; 11] = b".          ";
pub const FAT_DOTDOT_NAME: &[u8; 11] = b"..         ";

// NTRes case bits (Windows NT and later)
pub const FAT_NT_LOWER_BASE: u8 = 0x08;
pub const FAT_NT_LOWER_EXT: u8 = 0x10;

// === Long File Names ===

pub const LFN_LAST_FLAG: u8 = 0x40;
pub const LFN_ORDINAL_MASK: u8 = 0x3F;
pub const LFN_CHARS_PER_ENTRY: usize = 13;
pub const LFN_MAX_FRAGMENTS: u8 = 20; // 20 * 13 >= 255
pub const LFN_PAD: u16 = 0xFFFF;
pub const LFN_TERMINATOR: u16 = 0x0000;
