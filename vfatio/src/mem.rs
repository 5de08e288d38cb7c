// SPDX-License-Identifier: MIT

use crate::{BlockIO, BlockIOError, BlockIOResult};

/// In-memory implementation of `BlockIO`.
///
/// Backed by anything that derefs to a byte slice (`Vec<u8>`, `&[u8]`, ...).
/// Useful for tests, RAM disks and images already loaded in memory.
#[derive(Debug, Clone)]
pub struct MemBlockIO<B: AsRef<[u8]>> {
    buffer: B,
    partition_offset: u64,
}

impl<B: AsRef<[u8]>> MemBlockIO<B> {
    #[inline]
    pub fn new(buffer: B) -> Self {
        Self {
            buffer,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(buffer: B, partition_offset: u64) -> Self {
        Self {
            buffer,
            partition_offset,
        }
    }

    #[inline]
    pub fn into_inner(self) -> B {
        self.buffer
    }

    #[inline]
    fn check_bounds(&self, abs_off: u64, len: usize) -> BlockIOResult<usize> {
        let end = abs_off
            .checked_add(len as u64)
            .ok_or(BlockIOError::OutOfBounds)?;
        if end > self.buffer.as_ref().len() as u64 {
            return Err(BlockIOError::OutOfBounds);
        }
        Ok(abs_off as usize)
    }
}

impl<B: AsRef<[u8]>> BlockIO for MemBlockIO<B> {
    #[inline(always)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let abs_offset = self
            .partition_offset
            .checked_add(offset)
            .ok_or(BlockIOError::OutOfBounds)?;
        let start = self.check_bounds(abs_offset, buf.len())?;
        buf.copy_from_slice(&self.buffer.as_ref()[start..start + buf.len()]);
        Ok(())
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.partition_offset
    }

    #[inline]
    fn len_hint(&self) -> Option<u64> {
        Some((self.buffer.as_ref().len() as u64).saturating_sub(self.partition_offset))
    }
}
