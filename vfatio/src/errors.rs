// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for BlockIO operations.
pub type BlockIOResult<T = ()> = core::result::Result<T, BlockIOError>;

/// Error type for BlockIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockIOError {
    Other(&'static str),
    OutOfBounds,
    /// The device returned fewer bytes than requested.
    ShortRead,
    #[cfg(feature = "std")]
    Device(std::io::ErrorKind),
}

impl BlockIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            BlockIOError::Other(msg) => msg,
            BlockIOError::OutOfBounds => "Out of bounds",
            BlockIOError::ShortRead => "Short read",
            #[cfg(feature = "std")]
            BlockIOError::Device(_) => "Device error",
        }
    }
}

impl From<&'static str> for BlockIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        BlockIOError::Other(msg)
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for BlockIOError {
    #[cold]
    #[inline(never)]
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => BlockIOError::ShortRead,
            kind => BlockIOError::Device(kind),
        }
    }
}

impl fmt::Display for BlockIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        #[cfg(feature = "std")]
        if let BlockIOError::Device(kind) = self {
            write!(f, " ({kind})")?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BlockIOError {}
