// SPDX-License-Identifier: MIT

use core::sync::atomic::{AtomicU64, Ordering};

use crate::{BlockIO, BlockIOResult};

/// Simple counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub read_bytes: u64,

    // Alignment (useful to observe the effect of read_block_best_effort)
    pub aligned_reads: u64,
    pub unaligned_reads: u64,

    pub max_read: u64,
}

#[derive(Default, Debug)]
struct AtomicStats {
    reads: AtomicU64,
    read_bytes: AtomicU64,
    aligned_reads: AtomicU64,
    unaligned_reads: AtomicU64,
    max_read: AtomicU64,
}

/// Transparent instrumentation wrapper.
///
/// Counters are atomic so the wrapper stays usable behind `&self` from
/// several threads.
#[derive(Debug)]
pub struct IOCounter<IO: BlockIO> {
    inner: IO,
    stats: AtomicStats,
    /// Local "block" alignment (e.g., 512, 4096, cluster_size...)
    pub align: u64,
}

impl<IO: BlockIO> IOCounter<IO> {
    #[inline]
    pub fn new(inner: IO) -> Self {
        Self::with_align(inner, 1)
    }

    #[inline]
    pub fn with_align(inner: IO, align: u64) -> Self {
        let align = if align == 0 { 1 } else { align };
        Self {
            inner,
            stats: AtomicStats::default(),
            align,
        }
    }

    pub fn snapshot(&self) -> IoStats {
        IoStats {
            reads: self.stats.reads.load(Ordering::Relaxed),
            read_bytes: self.stats.read_bytes.load(Ordering::Relaxed),
            aligned_reads: self.stats.aligned_reads.load(Ordering::Relaxed),
            unaligned_reads: self.stats.unaligned_reads.load(Ordering::Relaxed),
            max_read: self.stats.max_read.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.stats.reads.store(0, Ordering::Relaxed);
        self.stats.read_bytes.store(0, Ordering::Relaxed);
        self.stats.aligned_reads.store(0, Ordering::Relaxed);
        self.stats.unaligned_reads.store(0, Ordering::Relaxed);
        self.stats.max_read.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub fn inner(&self) -> &IO {
        &self.inner
    }

    #[inline]
    pub fn into_inner(self) -> IO {
        self.inner
    }
}

impl<IO: BlockIO> BlockIO for IOCounter<IO> {
    #[inline]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let len = buf.len() as u64;
        let aligned = offset.is_multiple_of(self.align) && len.is_multiple_of(self.align);
        if aligned {
            self.stats.aligned_reads.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.unaligned_reads.fetch_add(1, Ordering::Relaxed);
        }

        self.stats.reads.fetch_add(1, Ordering::Relaxed);
        self.stats.read_bytes.fetch_add(len, Ordering::Relaxed);
        self.stats.max_read.fetch_max(len, Ordering::Relaxed);

        self.inner.read_at(offset, buf)
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.inner.partition_offset()
    }

    #[inline]
    fn len_hint(&self) -> Option<u64> {
        self.inner.len_hint()
    }
}
