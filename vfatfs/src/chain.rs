// SPDX-License-Identifier: MIT

use alloc::collections::BTreeSet;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use vfatio::prelude::*;

use crate::{boot::BootParameters, constant::*, errors::*};

/// Classified value of a FAT entry (already masked to 28 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    Free,
    Next(u32),
    Bad,
    EndOfChain,
    /// Reserved or out-of-range link.
    Invalid(u32),
}

impl FatEntry {
    pub fn classify(value: u32, params: &BootParameters) -> Self {
        let value = value & FAT_MASK;
        match value {
            FAT_FREE => FatEntry::Free,
            FAT_BAD_CLUSTER => FatEntry::Bad,
            v if v >= FAT_EOC_MIN => FatEntry::EndOfChain,
            v if params.is_valid_cluster(v) => FatEntry::Next(v),
            v => FatEntry::Invalid(v),
        }
    }
}

/// Reads the raw entry of `cluster` in the first FAT copy, masked to 28 bits.
#[inline]
pub fn read_fat_entry<IO: BlockIO + ?Sized>(
    io: &IO,
    params: &BootParameters,
    cluster: u32,
) -> ChainResult<u32> {
    let raw = io.read_u32_at(params.fat_entry_offset(cluster))?;
    Ok(raw & FAT_MASK)
}

/// Restartable description of a cluster chain.
///
/// Each call to [`ClusterChain::walk`] starts a fresh lazy traversal.
#[derive(Debug, Clone, Copy)]
pub struct ClusterChain<'a> {
    params: &'a BootParameters,
    first: u32,
}

impl<'a> ClusterChain<'a> {
    pub fn new(params: &'a BootParameters, first: u32) -> Self {
        Self { params, first }
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn walk<'b, IO: BlockIO + ?Sized>(&self, io: &'b IO) -> ChainIter<'a, 'b, IO> {
        let first = self.first & FAT_MASK;
        let state = if first == FAT_FREE || first >= FAT_EOC_MIN {
            // Empty file convention, or an already terminated chain
            Cursor::Done
        } else {
            Cursor::At(first)
        };
        ChainIter {
            params: self.params,
            io,
            state,
            seen: 0,
            visited: BTreeSet::new(),
        }
    }

    /// Contiguous runs `(start, len)` of the whole chain.
    pub fn runs<'b, IO: BlockIO + ?Sized>(&self, io: &'b IO) -> RunIter<ChainIter<'a, 'b, IO>> {
        RunIter::new(self.walk(io))
    }

    /// Cluster reached after following `n` links, `None` if the chain is shorter.
    pub fn nth_cluster<IO: BlockIO + ?Sized>(&self, io: &IO, n: usize) -> ChainResult<Option<u32>> {
        let mut walk = self.walk(io);
        if walk.advance(n)? < n {
            return Ok(None);
        }
        walk.next().transpose()
    }

    pub fn collect_chain<IO: BlockIO + ?Sized>(&self, io: &IO) -> ChainResult<Vec<u32>> {
        self.walk(io).collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum Cursor {
    At(u32),
    Failed(ChainError),
    Done,
}

/// Lazy walk over a cluster chain.
///
/// A cluster is yielded before its successor is validated, so a corrupt link
/// surfaces as an error on the following call. No cluster is yielded twice:
/// a link back to any cluster of the same walk fails with `CycleDetected`.
pub struct ChainIter<'a, 'b, IO: ?Sized> {
    params: &'a BootParameters,
    io: &'b IO,
    state: Cursor,
    seen: u32,
    visited: BTreeSet<u32>,
}

impl<IO: BlockIO + ?Sized> ChainIter<'_, '_, IO> {
    /// Follows up to `n` links, returning how many were actually followed.
    /// Unlike `Iterator::nth`, errors along the way are not swallowed.
    pub fn advance(&mut self, n: usize) -> ChainResult<usize> {
        for done in 0..n {
            match self.next() {
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => return Ok(done),
            }
        }
        Ok(n)
    }

    /// Contiguous runs over the remainder of this walk.
    pub fn runs(self) -> RunIter<Self> {
        RunIter::new(self)
    }
}

impl<IO: BlockIO + ?Sized> Iterator for ChainIter<'_, '_, IO> {
    type Item = ChainResult<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        let c = match self.state {
            Cursor::At(c) => c,
            Cursor::Failed(e) => {
                self.state = Cursor::Done;
                return Some(Err(e));
            }
            Cursor::Done => return None,
        };

        if !self.params.is_valid_cluster(c) {
            self.state = Cursor::Done;
            return Some(Err(ChainError::BadCluster(c)));
        }

        self.seen += 1;
        // Backstop; the visited set already rejects repeats.
        if self.seen > self.params.cluster_count || !self.visited.insert(c) {
            log::warn!("cluster chain exceeds {} links", self.params.cluster_count);
            self.state = Cursor::Done;
            return Some(Err(ChainError::CycleDetected));
        }

        let value = match read_fat_entry(self.io, self.params, c) {
            Ok(v) => v,
            Err(e) => {
                self.state = Cursor::Done;
                return Some(Err(e));
            }
        };

        self.state = match FatEntry::classify(value, self.params) {
            FatEntry::EndOfChain => Cursor::Done,
            FatEntry::Next(next) if self.visited.contains(&next) => {
                log::debug!("cluster {c} links back to cluster {next}");
                Cursor::Failed(ChainError::CycleDetected)
            }
            FatEntry::Next(next) => Cursor::At(next),
            FatEntry::Bad | FatEntry::Free | FatEntry::Invalid(_) => {
                log::debug!("cluster {c} links to invalid entry 0x{value:08X}");
                Cursor::Failed(ChainError::BadCluster(value))
            }
        };

        Some(Ok(c))
    }
}

/// Coalesces consecutive clusters into `(start, len)` runs.
///
/// Generic over any cluster source so a bounded walk (`take(n)`) can be
/// batched without reading links it does not need.
pub struct RunIter<I> {
    inner: I,
    start: u32,
    len: u32,
    finished: bool,
}

impl<I> RunIter<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            start: 0,
            len: 0,
            finished: false,
        }
    }
}

impl<I> Iterator for RunIter<I>
where
    I: Iterator<Item = ChainResult<u32>>,
{
    type Item = ChainResult<(u32, u32)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            match self.inner.next() {
                Some(Ok(c)) => {
                    if self.len > 0 && c == self.start + self.len {
                        self.len += 1;
                        continue;
                    }
                    let out = (self.start, self.len);
                    self.start = c;
                    self.len = 1;
                    if out.1 > 0 {
                        return Some(Ok(out));
                    }
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    if self.len > 0 {
                        return Some(Ok((self.start, self.len)));
                    }
                    return None;
                }
            }
        }
    }
}
