// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use crate::{BlockIO, BlockIOError, BlockIOResult};

/// File or block-device backed `BlockIO` using positioned reads.
///
/// On unix every read goes through `pread(2)`, so concurrent callers never
/// share a file cursor. Elsewhere the file is serialised behind a mutex.
#[derive(Debug)]
pub struct FileBlockIO {
    #[cfg(unix)]
    file: File,
    #[cfg(not(unix))]
    file: Mutex<File>,
    partition_offset: u64,
    len: Option<u64>,
}

impl FileBlockIO {
    /// Opens `path` read-only.
    pub fn open(path: impl AsRef<Path>) -> BlockIOResult<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }

    #[inline]
    pub fn new(file: File) -> Self {
        Self::new_with_offset(file, 0)
    }

    pub fn new_with_offset(file: File, partition_offset: u64) -> Self {
        // Block devices report a zero length through metadata.
        let len = file
            .metadata()
            .ok()
            .map(|m| m.len())
            .filter(|&l| l > 0)
            .map(|l| l.saturating_sub(partition_offset));

        Self {
            #[cfg(unix)]
            file,
            #[cfg(not(unix))]
            file: Mutex::new(file),
            partition_offset,
            len,
        }
    }
}

impl BlockIO for FileBlockIO {
    #[cfg(unix)]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        use std::os::unix::fs::FileExt;

        let abs_offset = self
            .partition_offset
            .checked_add(offset)
            .ok_or(BlockIOError::OutOfBounds)?;
        self.file.read_exact_at(buf, abs_offset)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let abs_offset = self
            .partition_offset
            .checked_add(offset)
            .ok_or(BlockIOError::OutOfBounds)?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| BlockIOError::Other("device lock poisoned"))?;
        file.seek(SeekFrom::Start(abs_offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.partition_offset
    }

    #[inline]
    fn len_hint(&self) -> Option<u64> {
        self.len
    }
}

/// Adapter for readers that only offer a shared cursor (`Read + Seek`).
///
/// A single mutex guards seek+read so that concurrent calls cannot interleave.
#[derive(Debug)]
pub struct LockedBlockIO<T: Read + Seek> {
    inner: Mutex<T>,
    partition_offset: u64,
}

impl<T: Read + Seek> LockedBlockIO<T> {
    #[inline]
    pub fn new(inner: T) -> Self {
        Self::new_with_offset(inner, 0)
    }

    #[inline]
    pub fn new_with_offset(inner: T, partition_offset: u64) -> Self {
        Self {
            inner: Mutex::new(inner),
            partition_offset,
        }
    }

    pub fn into_inner(self) -> BlockIOResult<T> {
        self.inner
            .into_inner()
            .map_err(|_| BlockIOError::Other("device lock poisoned"))
    }
}

impl<T: Read + Seek> BlockIO for LockedBlockIO<T> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let abs_offset = self
            .partition_offset
            .checked_add(offset)
            .ok_or(BlockIOError::OutOfBounds)?;
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| BlockIOError::Other("device lock poisoned"))?;
        inner.seek(SeekFrom::Start(abs_offset))?;
        inner.read_exact(buf)?;
        Ok(())
    }

    #[inline]
    fn partition_offset(&self) -> u64 {
        self.partition_offset
    }
}
