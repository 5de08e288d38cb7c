// SPDX-License-Identifier: MIT

#[cfg(not(feature = "std"))]
use alloc::string::String;

use crate::constant::*;

/// Renders an 8.3 name as `BASE.EXT` (no dot without extension).
///
/// Trailing spaces are trimmed, a leading 0x05 stands for 0xE5 and the NT
/// case bits lower-case the base and/or the extension. Bytes above 0x7F are
/// mapped as Latin-1.
pub fn decode_sfn(sfn: &[u8; 11], nt_flags: u8) -> String {
    let (base_raw, ext_raw) = sfn.split_at(8);
    let lower_base = nt_flags & FAT_NT_LOWER_BASE != 0;
    let lower_ext = nt_flags & FAT_NT_LOWER_EXT != 0;

    let mut out = String::with_capacity(12);
    push_sfn_part(&mut out, trim_spaces(base_raw), lower_base, true);

    let ext = trim_spaces(ext_raw);
    if !ext.is_empty() {
        out.push('.');
        push_sfn_part(&mut out, ext, lower_ext, false);
    }
    out
}

fn trim_spaces(raw: &[u8]) -> &[u8] {
    let len = raw.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    &raw[..len]
}

fn push_sfn_part(out: &mut String, part: &[u8], lower: bool, is_base: bool) {
    for (i, &b) in part.iter().enumerate() {
        let b = if is_base && i == 0 && b == FAT_ENTRY_KANJI_ESCAPE {
            FAT_ENTRY_DELETED
        } else {
            b
        };
        let b = if lower { b.to_ascii_lowercase() } else { b };
        out.push(char::from(b));
    }
}

/// Decodes long-name units, stopping at the first 0x0000 or 0xFFFF.
/// Unpaired surrogates become U+FFFD.
pub fn decode_lfn_units(units: &[u16]) -> String {
    let end = units
        .iter()
        .position(|&u| u == LFN_TERMINATOR || u == LFN_PAD)
        .unwrap_or(units.len());
    char::decode_utf16(units[..end].iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Case-insensitive name comparison (Unicode simple lower-casing).
pub fn names_equal(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
