// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
mod macros;

// Core modules
pub mod errors;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod file;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::BlockIO;
    pub use super::BlockIOExt;
    pub use super::BlockIOStructExt;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemBlockIO;

    #[cfg(feature = "std")]
    pub use super::file::{FileBlockIO, LockedBlockIO};
}

pub use errors::*;

// Constants

/// Maximum size of internal scratch buffer (used for chunked reads).
/// 4 KiB = typical page size and common disk sector/cluster size.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Read-only block IO abstraction.
///
/// Every read is positioned: it names its absolute offset and never moves a
/// shared cursor, so a single device can serve concurrent callers through
/// `&self`. Backends that only have a shared cursor must serialise
/// internally (see `LockedBlockIO`).
pub trait BlockIO {
    /// Reads exactly `buf.len()` bytes from `offset` (relative to the partition start).
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> BlockIOResult;

    /// Byte offset of the partition inside the underlying device.
    fn partition_offset(&self) -> u64 {
        0
    }

    /// Total readable length in bytes, when the backend knows it.
    fn len_hint(&self) -> Option<u64> {
        None
    }
}

impl<T: BlockIO + ?Sized> BlockIO for &T {
    #[inline(always)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        (**self).read_at(offset, buf)
    }

    fn partition_offset(&self) -> u64 {
        (**self).partition_offset()
    }

    fn len_hint(&self) -> Option<u64> {
        (**self).len_hint()
    }
}

#[cfg(feature = "alloc")]
impl<T: BlockIO + ?Sized> BlockIO for alloc::boxed::Box<T> {
    #[inline(always)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        (**self).read_at(offset, buf)
    }

    fn partition_offset(&self) -> u64 {
        (**self).partition_offset()
    }

    fn len_hint(&self) -> Option<u64> {
        (**self).len_hint()
    }
}

#[cfg(feature = "alloc")]
impl<T: BlockIO + ?Sized> BlockIO for alloc::sync::Arc<T> {
    #[inline(always)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        (**self).read_at(offset, buf)
    }

    fn partition_offset(&self) -> u64 {
        (**self).partition_offset()
    }

    fn len_hint(&self) -> Option<u64> {
        (**self).len_hint()
    }
}

/// Extension helpers for BlockIO.
///
/// Provides:
/// - chunked and aligned reads
/// - little-endian primitive reads (read_u16_at/u32/u64)
pub trait BlockIOExt: BlockIO {
    /// Reads `buf.len()` bytes from `offset` in chunks of `chunk_size` or less.
    #[inline(always)]
    fn read_in_chunks(&self, offset: u64, buf: &mut [u8], chunk_size: usize) -> BlockIOResult {
        let chunk_size = chunk_size.max(1);
        let mut off = offset;

        for chunk in buf.chunks_mut(chunk_size) {
            self.read_at(off, chunk)?;
            off += chunk.len() as u64;
        }

        Ok(())
    }

    /// Reads a block or range of blocks of `block_size` starting at `offset`.
    ///
    /// If offset and length are aligned to `block_size`, performs a single read.
    /// Otherwise, falls back to reading in `BLOCK_BUF_SIZE` chunks.
    ///
    /// Useful for FS implementations (cluster reads).
    #[inline(always)]
    fn read_block_best_effort(
        &self,
        offset: u64,
        buf: &mut [u8],
        block_size: usize,
    ) -> BlockIOResult {
        let block = block_size.max(1);
        if offset.is_multiple_of(block as u64) && buf.len().is_multiple_of(block) {
            self.read_at(offset, buf)
        } else {
            self.read_in_chunks(offset, buf, BLOCK_BUF_SIZE)
        }
    }

    // Implements little-endian read helpers for primitive types (u16, u32, u64)
    blockio_impl_primitive_read!(u8, u16, u32, u64);
}

impl<T: BlockIO + ?Sized> BlockIOExt for T {}

/// Extension trait for reading on-disk structs using zerocopy.
pub trait BlockIOStructExt: BlockIO {
    /// Reads a struct of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &self,
        offset: u64,
    ) -> BlockIOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(BlockIOError::Other("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| BlockIOError::Other("read_struct failed"))
    }
}

impl<T: BlockIO + ?Sized> BlockIOStructExt for T {}
