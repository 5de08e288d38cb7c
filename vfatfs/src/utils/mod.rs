// SPDX-License-Identifier: MIT

pub mod checksum_utils;
pub mod name_utils;
pub mod path_utils;
pub mod time_utils;

pub use checksum_utils::lfn_checksum;
