// SPDX-License-Identifier: MIT

use core::fmt;

use vfatio::{BlockIO, BlockIOStructExt};
use zerocopy::FromBytes;

use crate::{constant::*, errors::*, types::Fat32Vbr};

/// FAT flavour, decided solely by the number of data clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatWidth {
    Fat12,
    Fat16,
    Fat32,
}

impl FatWidth {
    pub fn from_cluster_count(cluster_count: u32) -> Self {
        if cluster_count < FAT12_MAX_CLUSTERS {
            FatWidth::Fat12
        } else if cluster_count < FAT16_MAX_CLUSTERS {
            FatWidth::Fat16
        } else {
            FatWidth::Fat32
        }
    }
}

impl fmt::Display for FatWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FatWidth::Fat12 => "FAT12",
            FatWidth::Fat16 => "FAT16",
            FatWidth::Fat32 => "FAT32",
        };
        f.write_str(name)
    }
}

/// BIOS Parameter Block fields plus the geometry derived from them.
///
/// Built once at mount time and shared read-only by every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootParameters {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub root_max_entries: u16,
    pub total_sectors_16: u16,
    pub total_sectors_32: u32,
    pub sectors_per_fat_16: u16,
    pub sectors_per_fat_32: u32,
    pub root_cluster: u32,
    pub volume_id: u32,
    pub volume_label: [u8; 11],
    pub has_signature: bool,

    // Derived geometry
    pub fat_offset: u64,
    pub data_offset: u64,
    pub cluster_size: u32,
    pub cluster_count: u32,
    pub width: FatWidth,
}

impl BootParameters {
    /// Parses the first sector of the volume.
    ///
    /// Only the first 512 bytes are looked at; a shorter buffer is a
    /// truncated device.
    pub fn parse(sector: &[u8]) -> MountResult<Self> {
        let raw = sector
            .get(..FAT_BOOT_SECTOR_SIZE)
            .ok_or(MountError::Io(BlockIOError::ShortRead))?;
        let vbr = Fat32Vbr::read_from_bytes(raw)
            .map_err(|_| MountError::UnexpectedFormat("Malformed boot sector"))?;
        Self::from_vbr(&vbr)
    }

    /// Reads and parses the boot sector from offset 0 of `io`.
    pub fn read_from<IO: BlockIO + ?Sized>(io: &IO) -> MountResult<Self> {
        let vbr: Fat32Vbr = io.read_struct(0)?;
        Self::from_vbr(&vbr)
    }

    pub fn from_vbr(vbr: &Fat32Vbr) -> MountResult<Self> {
        let bytes_per_sector = vbr.bytes_per_sector();
        let sectors_per_cluster = vbr.sectors_per_cluster;
        let reserved_sectors = vbr.reserved_sectors();
        let fat_count = vbr.num_fats;
        let root_max_entries = vbr.root_entry_count();

        ensure!(
            FAT_VALID_SECTOR_SIZES.contains(&bytes_per_sector),
            MountError::UnexpectedFormat("Invalid bytes per sector")
        );
        ensure!(
            sectors_per_cluster.is_power_of_two(),
            MountError::UnexpectedFormat("Sectors per cluster is not a power of two")
        );
        ensure!(
            fat_count != 0,
            MountError::UnexpectedFormat("No FAT copies")
        );
        ensure!(
            root_max_entries == 0,
            MountError::UnexpectedFormat("Fixed root directory is not FAT32")
        );

        let mut params = Self {
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors,
            fat_count,
            root_max_entries,
            total_sectors_16: vbr.total_sectors_16(),
            total_sectors_32: vbr.total_sectors_32(),
            sectors_per_fat_16: vbr.fat_size_16(),
            sectors_per_fat_32: vbr.fat_size_32(),
            root_cluster: vbr.root_cluster(),
            volume_id: vbr.volume_id(),
            volume_label: vbr.volume_label,
            has_signature: vbr.signature == FAT_SIGNATURE,
            fat_offset: 0,
            data_offset: 0,
            cluster_size: bytes_per_sector as u32 * sectors_per_cluster as u32,
            cluster_count: 0,
            width: FatWidth::Fat12,
        };

        let fat_size = params.sectors_per_fat();
        let total_sectors = params.total_sectors();
        ensure!(fat_size != 0, MountError::UnexpectedFormat("FAT size is zero"));
        ensure!(
            total_sectors != 0,
            MountError::UnexpectedFormat("Total sector count is zero")
        );

        let meta_sectors = reserved_sectors as u64
            + fat_count as u64 * fat_size as u64
            + params.root_dir_sectors() as u64;
        let data_sectors = (total_sectors as u64)
            .checked_sub(meta_sectors)
            .ok_or(MountError::UnexpectedFormat(
                "Reserved and FAT regions exceed the volume",
            ))?;

        params.cluster_count = (data_sectors / sectors_per_cluster as u64) as u32;
        params.width = FatWidth::from_cluster_count(params.cluster_count);
        params.fat_offset = reserved_sectors as u64 * bytes_per_sector as u64;
        params.data_offset = meta_sectors * bytes_per_sector as u64;

        if params.width != FatWidth::Fat32 {
            bail!(MountError::UnsupportedWidth(params.width));
        }
        ensure!(
            params.is_valid_cluster(params.root_cluster),
            MountError::UnexpectedFormat("Root cluster out of range")
        );

        if !params.has_signature {
            log::warn!("boot sector lacks the 0x55AA signature, mounting anyway");
        }

        Ok(params)
    }

    /// Whichever of the two fields is nonzero; the 16-bit one wins when both are.
    #[inline]
    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }

    /// Whichever of the two fields is nonzero; the 16-bit one wins when both are.
    #[inline]
    pub fn sectors_per_fat(&self) -> u32 {
        if self.sectors_per_fat_16 != 0 {
            self.sectors_per_fat_16 as u32
        } else {
            self.sectors_per_fat_32
        }
    }

    #[inline]
    pub fn root_dir_sectors(&self) -> u32 {
        let bps = self.bytes_per_sector as u32;
        (self.root_max_entries as u32 * FAT_DIR_ENTRY_SIZE as u32).div_ceil(bps)
    }

    /// Highest addressable cluster: bounded by the data region and by the
    /// number of entries one FAT copy can hold.
    #[inline]
    pub fn max_cluster(&self) -> u32 {
        let fat_entries =
            self.sectors_per_fat() as u64 * self.bytes_per_sector as u64 / FAT_ENTRY_SIZE as u64;
        let by_fat = fat_entries.saturating_sub(1).min(u32::MAX as u64) as u32;
        (self.cluster_count + 1).min(by_fat)
    }

    #[inline]
    pub fn is_valid_cluster(&self, cluster: u32) -> bool {
        (FAT_FIRST_CLUSTER..=self.max_cluster()).contains(&cluster)
    }

    /// Byte offset of a data cluster. The caller validates the index.
    #[inline]
    pub fn cluster_offset(&self, cluster: u32) -> u64 {
        self.data_offset + (cluster - FAT_FIRST_CLUSTER) as u64 * self.cluster_size as u64
    }

    /// Byte offset of a cluster's entry in the first FAT copy.
    #[inline]
    pub fn fat_entry_offset(&self, cluster: u32) -> u64 {
        self.fat_offset + cluster as u64 * FAT_ENTRY_SIZE as u64
    }

    /// Bytes covered by the data region.
    #[inline]
    pub fn data_size(&self) -> u64 {
        self.cluster_count as u64 * self.cluster_size as u64
    }

    pub fn volume_label_str(&self) -> &str {
        let label = core::str::from_utf8(&self.volume_label).unwrap_or("");
        label.trim_end_matches([' ', '\0'])
    }
}
