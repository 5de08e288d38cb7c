// SPDX-License-Identifier: MIT

use core::fmt;

pub use vfatio::errors::*;

use crate::boot::FatWidth;

// POSIX error numbers handed back to the host call surface.
pub const ENOENT: i32 = 2;
pub const EIO: i32 = 5;
pub const ENOTDIR: i32 = 20;
pub const EISDIR: i32 = 21;

/// Fatal mount-time failure: no mount context exists afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountError {
    Io(BlockIOError),
    UnexpectedFormat(&'static str),
    UnsupportedWidth(FatWidth),
}

impl MountError {
    pub fn msg(&self) -> &'static str {
        match self {
            MountError::Io(_) => "IO error while reading the boot sector",
            MountError::UnexpectedFormat(msg) => msg,
            MountError::UnsupportedWidth(_) => "Unsupported FAT width",
        }
    }

    pub fn source(&self) -> Option<BlockIOError> {
        match self {
            MountError::Io(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountError::Io(e) => write!(f, "{}: {e}", self.msg()),
            MountError::UnsupportedWidth(width) => {
                write!(f, "{}: {width}, only FAT32 can be mounted", self.msg())
            }
            _ => write!(f, "{}", self.msg()),
        }
    }
}

/// Failure while following a cluster chain through the FAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainError {
    Io(BlockIOError),
    BadCluster(u32),
    CycleDetected,
    ShortChain,
}

impl ChainError {
    pub fn msg(&self) -> &'static str {
        match self {
            ChainError::Io(_) => "IO error",
            ChainError::BadCluster(_) => "Bad or out-of-range cluster in chain",
            ChainError::CycleDetected => "Cluster chain loops",
            ChainError::ShortChain => "Cluster chain ends before the file does",
        }
    }

    pub fn source(&self) -> Option<BlockIOError> {
        match self {
            ChainError::Io(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::Io(e) => write!(f, "{}: {e}", self.msg()),
            ChainError::BadCluster(value) => write!(f, "{} (0x{value:08X})", self.msg()),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

/// Per-call failure of the filesystem call surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    Io(BlockIOError),
    Chain(ChainError),
    NotFound,
    NotADirectory,
    IsADirectory,
    Invalid(&'static str),
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::Io(_) => "IO error",
            FsError::Chain(_) => "Cluster chain error",
            FsError::NotFound => "No such file or directory",
            FsError::NotADirectory => "Not a directory",
            FsError::IsADirectory => "Is a directory",
            FsError::Invalid(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<ChainError> {
        match self {
            FsError::Io(e) => Some(ChainError::Io(*e)),
            FsError::Chain(e) => Some(*e),
            _ => None,
        }
    }

    /// POSIX error number for the host (positive; negate for FUSE).
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound => ENOENT,
            FsError::NotADirectory => ENOTDIR,
            FsError::IsADirectory => EISDIR,
            _ => EIO,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::Io(e) => write!(f, "{}: {e}", self.msg()),
            FsError::Chain(e) => write!(f, "{}: {e}", self.msg()),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MountError {}

#[cfg(feature = "std")]
impl std::error::Error for ChainError {}

#[cfg(feature = "std")]
impl std::error::Error for FsError {}

crate::fs_error_wiring! {
    BlockIOError => [MountError::Io, ChainError::Io, FsError::Io],
    ChainError => [FsError::Chain],
}

pub type MountResult<T = ()> = Result<T, MountError>;
pub type ChainResult<T = ()> = Result<T, ChainError>;
pub type FsResult<T = ()> = Result<T, FsError>;
