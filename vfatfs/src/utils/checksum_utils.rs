// SPDX-License-Identifier: MIT

/// Rolling checksum linking long-name fragments to their short entry:
/// rotate right by one bit, then add the next byte (8-bit wrapping).
///
/// Computed over the 11 raw name bytes exactly as stored on disk.
#[inline(always)]
pub fn lfn_checksum(name: &[u8; 11]) -> u8 {
    name.iter()
        .fold(0u8, |sum, &b| sum.rotate_right(1).wrapping_add(b))
}
