// SPDX-License-Identifier: MIT

//! Hand-built FAT32 volumes for unit tests.
//!
//! Volumes are sparse: only written sectors take memory, everything else
//! reads back as zeros.

use std::{collections::HashMap, sync::Mutex};

use vfatio::{BlockIO, BlockIOResult};
use zerocopy::IntoBytes;

use crate::{
    attr::Fat32Attributes,
    boot::BootParameters,
    constant::*,
    types::{Fat32Entry, Fat32LFNEntry, Fat32Vbr},
    utils::lfn_checksum,
};

pub type Slot = [u8; FAT_DIR_ENTRY_SIZE];

const SECTOR: u64 = 512;

#[derive(Default)]
pub struct SparseImage {
    sectors: Mutex<HashMap<u64, Box<[u8; 512]>>>,
}

impl SparseImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, offset: u64, data: &[u8]) {
        let mut sectors = self.sectors.lock().unwrap();
        for (i, &b) in data.iter().enumerate() {
            let pos = offset + i as u64;
            let sector = sectors
                .entry(pos / SECTOR)
                .or_insert_with(|| Box::new([0u8; 512]));
            sector[(pos % SECTOR) as usize] = b;
        }
    }
}

impl BlockIO for SparseImage {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let sectors = self.sectors.lock().unwrap();
        for (i, out) in buf.iter_mut().enumerate() {
            let pos = offset + i as u64;
            *out = sectors
                .get(&(pos / SECTOR))
                .map_or(0, |s| s[(pos % SECTOR) as usize]);
        }
        Ok(())
    }
}

/// Raw BPB values; the default is a minimal valid FAT32 volume
/// (512-byte clusters, 65 600 data clusters).
#[derive(Debug, Clone)]
pub struct Geometry {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub root_entry_count: u16,
    pub fat_size: u32,
    pub total_sectors: u32,
    pub root_cluster: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            bytes_per_sector: 512,
            sectors_per_cluster: 1,
            reserved_sectors: 32,
            fat_count: 2,
            root_entry_count: 0,
            fat_size: 520,
            total_sectors: 32 + 2 * 520 + 65_600,
            root_cluster: 2,
        }
    }
}

pub fn boot_sector(g: &Geometry) -> Vec<u8> {
    let mut volume_label = [b' '; 11];
    volume_label[..7].copy_from_slice(b"TESTVOL");

    let vbr = Fat32Vbr {
        jump_boot: [0xEB, 0x58, 0x90],
        oem_name: *b"MSWIN4.1",
        bytes_per_sector: g.bytes_per_sector.to_le(),
        sectors_per_cluster: g.sectors_per_cluster,
        reserved_sectors: g.reserved_sectors.to_le(),
        num_fats: g.fat_count,
        root_entry_count: g.root_entry_count.to_le(),
        total_sectors_16: 0,
        media: 0xF8,
        fat_size_16: 0,
        sectors_per_track: 0,
        num_heads: 0,
        hidden_sectors: 0,
        total_sectors_32: g.total_sectors.to_le(),
        fat_size_32: g.fat_size.to_le(),
        ext_flags: 0,
        fs_version: 0,
        root_cluster: g.root_cluster.to_le(),
        fsinfo_sector: 1u16.to_le(),
        backup_boot_sector: 6u16.to_le(),
        reserved: [0u8; 12],
        drive_number: 0x80,
        reserved1: 0,
        boot_signature: 0x29,
        volume_id: 0x1234_5678u32.to_le(),
        volume_label,
        fs_type: *b"FAT32   ",
        boot_code: [0u8; 420],
        signature: FAT_SIGNATURE,
    };
    vbr.as_bytes().to_vec()
}

/// A volume under construction: boot sector written, FAT and data empty
/// except for the root directory's end-of-chain marker.
pub struct TestVolume {
    pub image: SparseImage,
    pub params: BootParameters,
}

impl TestVolume {
    pub fn new() -> Self {
        Self::with_geometry(&Geometry::default())
    }

    pub fn with_geometry(g: &Geometry) -> Self {
        let image = SparseImage::new();
        let sector = boot_sector(g);
        image.write(0, &sector);
        let params = BootParameters::parse(&sector).unwrap();
        let vol = Self { image, params };
        vol.set_fat(g.root_cluster, FAT_EOC);
        vol
    }

    pub fn root(&self) -> u32 {
        self.params.root_cluster
    }

    pub fn set_fat(&self, cluster: u32, value: u32) {
        let off = self.params.fat_entry_offset(cluster);
        self.image.write(off, &value.to_le_bytes());
    }

    /// Links `clusters` in order and terminates the chain.
    pub fn chain(&self, clusters: &[u32]) {
        for pair in clusters.windows(2) {
            self.set_fat(pair[0], pair[1]);
        }
        if let Some(&last) = clusters.last() {
            self.set_fat(last, FAT_EOC);
        }
    }

    /// Writes `data` across `clusters` (which need not be contiguous).
    pub fn write_data(&self, clusters: &[u32], data: &[u8]) {
        let cs = self.params.cluster_size as usize;
        for (chunk, &cluster) in data.chunks(cs).zip(clusters) {
            self.image.write(self.params.cluster_offset(cluster), chunk);
        }
    }

    /// Writes a directory's slots across `clusters`.
    pub fn write_dir(&self, clusters: &[u32], slots: &[Slot]) {
        let data: Vec<u8> = slots.iter().flatten().copied().collect();
        self.write_data(clusters, &data);
    }
}

pub fn short_slot(name: &[u8; 11], attr: Fat32Attributes, cluster: u32, size: u32) -> Slot {
    let mut slot = [0u8; FAT_DIR_ENTRY_SIZE];
    slot.copy_from_slice(Fat32Entry::new(*name, attr.bits(), cluster, size).as_bytes());
    slot
}

pub fn file_slot(name: &[u8; 11], cluster: u32, size: u32) -> Slot {
    short_slot(name, Fat32Attributes::ARCHIVE, cluster, size)
}

pub fn dir_slot(name: &[u8; 11], cluster: u32) -> Slot {
    short_slot(name, Fat32Attributes::DIRECTORY, cluster, 0)
}

/// Long-name fragments for `long`, in on-disk order (0x40|N first).
pub fn lfn_slots(long: &str, short: &[u8; 11]) -> Vec<Slot> {
    let units: Vec<u16> = long.encode_utf16().collect();
    let chunks: Vec<&[u16]> = units.chunks(LFN_CHARS_PER_ENTRY).collect();
    let checksum = lfn_checksum(short);

    let mut out = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate().rev() {
        let order = (i + 1) as u8;
        let is_last = i + 1 == chunks.len();
        let mut slot = [0u8; FAT_DIR_ENTRY_SIZE];
        slot.copy_from_slice(Fat32LFNEntry::new(order, is_last, chunk, checksum).as_bytes());
        out.push(slot);
    }
    out
}

/// Fragments followed by their short entry.
pub fn long_entry(long: &str, short: Slot) -> Vec<Slot> {
    let mut name = [0u8; 11];
    name.copy_from_slice(&short[..11]);
    let mut out = lfn_slots(long, &name);
    out.push(short);
    out
}
