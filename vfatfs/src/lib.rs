// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate alloc;

#[macro_use]
mod macros;

// On-disk format
pub mod attr;
pub mod constant;
pub mod types;
pub mod utils;

// Engine
pub mod boot;
pub mod chain;
pub mod dir;
pub mod errors;
pub mod reader;
pub mod resolver;

// Call surface
pub mod fs;

#[cfg(test)]
mod test_support;

pub mod prelude {
    pub use super::attr::*;
    pub use super::boot::{BootParameters, FatWidth};
    pub use super::chain::{ClusterChain, FatEntry};
    pub use super::dir::{DirDecoder, DirEntry, DirIter, Step};
    pub use super::errors::*;
    pub use super::fs::*;
    pub use super::reader::FileReader;
    pub use super::resolver::{ResolvedNode, Resolver};
    pub use super::utils::lfn_checksum;
    pub use vfatio::prelude::*;
}

pub use fs::{MountEnv, MountOptions, Stat, Vfat};
