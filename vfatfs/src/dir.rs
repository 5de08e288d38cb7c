// SPDX-License-Identifier: MIT

//! Directory stream decoding.
//!
//! A directory is a sequence of 32-byte slots spread over a cluster chain.
//! [`DirDecoder`] turns slots into entries one at a time, merging long-name
//! fragments with the short entry that follows them; [`DirIter`] feeds it
//! lazily, one cluster per device read.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec, vec::Vec};

use vfatio::prelude::*;

use crate::{
    attr::{Fat32Attributes, FileAttributes},
    boot::BootParameters,
    chain::{ChainIter, ClusterChain},
    constant::*,
    errors::*,
    types::{Fat32Entry, Fat32LFNEntry, RawSlot},
    utils::{lfn_checksum, name_utils, time_utils},
};

/// A decoded directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Long name when a valid one precedes the entry, the short name otherwise.
    pub name: String,
    pub short_name: String,
    pub raw_name: [u8; 11],
    pub fat_attr: Fat32Attributes,
    pub attr: FileAttributes,
    pub size: u32,
    pub first_cluster: u32,
    pub has_long_name: bool,
}

impl DirEntry {
    fn from_short(entry: &Fat32Entry, long_name: Option<String>) -> Self {
        let raw_name = entry.name;
        let short_name = name_utils::decode_sfn(&raw_name, entry.nt_reserved);

        let mut attr = FileAttributes::from_fat_attr(entry.attr);
        attr.created = time_utils::fat_datetime(
            u16::from_le(entry.creation_date),
            u16::from_le(entry.creation_time),
            entry.creation_time_tenth,
        );
        attr.modified = time_utils::fat_datetime(
            u16::from_le(entry.write_date),
            u16::from_le(entry.write_time),
            0,
        );
        attr.accessed = time_utils::fat_date(u16::from_le(entry.access_date))
            .map(|d| d.midnight());

        let has_long_name = long_name.is_some();
        Self {
            name: long_name.unwrap_or_else(|| short_name.clone()),
            short_name,
            raw_name,
            fat_attr: entry.attributes(),
            attr,
            size: entry.file_size(),
            first_cluster: entry.first_cluster(),
            has_long_name,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.attr.dir
    }

    /// Case-insensitive match against the long or the short name.
    pub fn matches(&self, name: &str) -> bool {
        name_utils::names_equal(&self.name, name)
            || (self.has_long_name && name_utils::names_equal(&self.short_name, name))
    }
}

/// Outcome of feeding one slot to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Entry(DirEntry),
    Skip,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LfnState {
    NoPendingFragments,
    /// `next` is the ordinal the following fragment must carry; 0 once the
    /// fragment with ordinal 1 has been stored.
    AccumulatingFragments { next: u8, checksum: u8 },
}

/// Push-based decoder over the slots of one directory.
#[derive(Debug)]
pub struct DirDecoder {
    state: LfnState,
    units: Vec<u16>,
    ended: bool,
}

impl Default for DirDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DirDecoder {
    pub fn new() -> Self {
        Self {
            state: LfnState::NoPendingFragments,
            units: Vec::new(),
            ended: false,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn push(&mut self, slot: &[u8; FAT_DIR_ENTRY_SIZE]) -> Step {
        if self.ended {
            return Step::End;
        }

        match RawSlot::classify(slot) {
            RawSlot::EndOfDirectory => {
                self.ended = true;
                self.reset();
                Step::End
            }
            RawSlot::Deleted => {
                self.reset();
                Step::Skip
            }
            RawSlot::LongName(lfn) => {
                self.push_fragment(&lfn);
                Step::Skip
            }
            RawSlot::Short(entry) => self.push_short(&entry),
        }
    }

    fn reset(&mut self) {
        self.state = LfnState::NoPendingFragments;
        self.units.clear();
    }

    fn push_fragment(&mut self, lfn: &Fat32LFNEntry) {
        let ordinal = lfn.ordinal();

        if lfn.is_last() {
            if self.state != LfnState::NoPendingFragments {
                log::debug!("long name interrupted by a new one, dropping partial name");
            }
            self.reset();
            if ordinal == 0 || ordinal > LFN_MAX_FRAGMENTS {
                log::debug!("long name fragment with ordinal {ordinal} ignored");
                return;
            }
            self.units = vec![LFN_PAD; ordinal as usize * LFN_CHARS_PER_ENTRY];
            self.store(ordinal, lfn);
            self.state = LfnState::AccumulatingFragments {
                next: ordinal - 1,
                checksum: lfn.checksum,
            };
            return;
        }

        match self.state {
            LfnState::AccumulatingFragments { next, checksum }
                if next != 0 && ordinal == next && lfn.checksum == checksum =>
            {
                self.store(ordinal, lfn);
                self.state = LfnState::AccumulatingFragments {
                    next: next - 1,
                    checksum,
                };
            }
            _ => {
                log::debug!("out-of-sequence long name fragment (ordinal {ordinal}), discarding");
                self.reset();
            }
        }
    }

    fn store(&mut self, ordinal: u8, lfn: &Fat32LFNEntry) {
        let start = (ordinal as usize - 1) * LFN_CHARS_PER_ENTRY;
        if let Some(dst) = self.units.get_mut(start..start + LFN_CHARS_PER_ENTRY) {
            dst.copy_from_slice(&lfn.extract_utf16());
        }
    }

    fn push_short(&mut self, entry: &Fat32Entry) -> Step {
        let attributes = entry.attributes();
        if attributes.is_volume_label() || entry.is_dot() {
            self.reset();
            return Step::Skip;
        }

        let long_name = match self.state {
            LfnState::AccumulatingFragments { next: 0, checksum } => {
                if checksum == lfn_checksum(&entry.name) {
                    Some(name_utils::decode_lfn_units(&self.units)).filter(|n| !n.is_empty())
                } else {
                    log::debug!("long name checksum mismatch, using short name");
                    None
                }
            }
            LfnState::AccumulatingFragments { .. } => {
                log::debug!("incomplete long name, using short name");
                None
            }
            LfnState::NoPendingFragments => None,
        };

        self.reset();
        if long_name.is_none() && entry.name[0] == b' ' {
            log::debug!("short entry with blank name {:02X?} skipped", entry.name);
            return Step::Skip;
        }
        Step::Entry(DirEntry::from_short(entry, long_name))
    }
}

/// Lazy directory listing: reads one cluster at a time and stops at the
/// end-of-directory marker. Not restartable.
pub struct DirIter<'a, 'b, IO: ?Sized> {
    params: &'a BootParameters,
    io: &'b IO,
    chain: ChainIter<'a, 'b, IO>,
    buf: Vec<u8>,
    pos: usize,
    decoder: DirDecoder,
    finished: bool,
}

impl<'a, 'b, IO: BlockIO + ?Sized> DirIter<'a, 'b, IO> {
    pub fn new(io: &'b IO, params: &'a BootParameters, first_cluster: u32) -> Self {
        Self {
            params,
            io,
            chain: ClusterChain::new(params, first_cluster).walk(io),
            buf: Vec::new(),
            pos: 0,
            decoder: DirDecoder::new(),
            finished: false,
        }
    }

    fn load_next_cluster(&mut self) -> Option<FsResult<()>> {
        let cluster = match self.chain.next()? {
            Ok(c) => c,
            Err(e) => return Some(Err(e.into())),
        };
        self.buf.resize(self.params.cluster_size as usize, 0);
        self.pos = 0;
        let res = self.io.read_block_best_effort(
            self.params.cluster_offset(cluster),
            &mut self.buf,
            self.params.bytes_per_sector as usize,
        );
        Some(res.map_err(FsError::from))
    }
}

impl<IO: BlockIO + ?Sized> Iterator for DirIter<'_, '_, IO> {
    type Item = FsResult<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            if self.pos + FAT_DIR_ENTRY_SIZE > self.buf.len() {
                match self.load_next_cluster() {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        self.finished = true;
                        return Some(Err(e));
                    }
                    None => {
                        self.finished = true;
                        return None;
                    }
                }
            }

            let mut slot = [0u8; FAT_DIR_ENTRY_SIZE];
            slot.copy_from_slice(&self.buf[self.pos..self.pos + FAT_DIR_ENTRY_SIZE]);
            self.pos += FAT_DIR_ENTRY_SIZE;

            match self.decoder.push(&slot) {
                Step::Entry(entry) => return Some(Ok(entry)),
                Step::Skip => {}
                Step::End => self.finished = true,
            }
        }
        None
    }
}

/// Collects every entry of the directory starting at `first_cluster`.
pub fn read_dir<IO: BlockIO + ?Sized>(
    io: &IO,
    params: &BootParameters,
    first_cluster: u32,
) -> FsResult<Vec<DirEntry>> {
    DirIter::new(io, params, first_cluster).collect()
}
