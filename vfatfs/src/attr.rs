// SPDX-License-Identifier: MIT

use time::PrimitiveDateTime;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fat32Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;
        const LFN       = 0x0F;
    }
}

impl Fat32Attributes {
    /// Low nibble fully set: the slot is a long-name fragment.
    #[inline]
    pub fn is_long_name(self) -> bool {
        self.contains(Fat32Attributes::LFN)
    }

    #[inline]
    pub fn is_volume_label(self) -> bool {
        !self.is_long_name() && self.contains(Fat32Attributes::VOLUME_ID)
    }
}

/// Decoded metadata of a directory entry.
///
/// FAT stores local wall-clock times without a zone; timestamps are kept as
/// `PrimitiveDateTime` and only given an offset by the call surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttributes {
    pub read_only: bool,
    pub hidden: bool,
    pub system: bool,
    pub archive: bool,
    pub dir: bool,
    pub created: Option<PrimitiveDateTime>,
    pub modified: Option<PrimitiveDateTime>,
    pub accessed: Option<PrimitiveDateTime>,
}

impl FileAttributes {
    /// Directory attributes with every timestamp set to `at`.
    pub fn new_dir(at: Option<PrimitiveDateTime>) -> Self {
        Self {
            dir: true,
            created: at,
            modified: at,
            accessed: at,
            ..Default::default()
        }
    }

    pub fn from_fat_attr(attr: u8) -> Self {
        let fat_attr = Fat32Attributes::from_bits_truncate(attr);
        FileAttributes {
            read_only: fat_attr.contains(Fat32Attributes::READ_ONLY),
            hidden: fat_attr.contains(Fat32Attributes::HIDDEN),
            system: fat_attr.contains(Fat32Attributes::SYSTEM),
            dir: fat_attr.contains(Fat32Attributes::DIRECTORY),
            archive: fat_attr.contains(Fat32Attributes::ARCHIVE),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfn_pattern() {
        let lfn = Fat32Attributes::from_bits_retain(0x0F);
        assert!(lfn.is_long_name());
        assert!(!lfn.is_volume_label());

        // Extra high bits do not hide the pattern
        let noisy = Fat32Attributes::from_bits_retain(0x3F);
        assert!(noisy.is_long_name());

        let label = Fat32Attributes::VOLUME_ID | Fat32Attributes::ARCHIVE;
        assert!(label.is_volume_label());
        assert!(!Fat32Attributes::DIRECTORY.is_long_name());
    }

    #[test]
    fn test_from_fat_attr() {
        let attr = FileAttributes::from_fat_attr(0x10 | 0x02);
        assert!(attr.dir);
        assert!(attr.hidden);
        assert!(!attr.archive);
        assert!(attr.created.is_none());

        let file = FileAttributes::from_fat_attr(0x21);
        assert!(file.read_only);
        assert!(file.archive);
        assert!(!file.dir);
    }

    #[test]
    fn test_new_dir_timestamps() {
        let at = Some(PrimitiveDateTime::MIN);
        let attr = FileAttributes::new_dir(at);
        assert!(attr.dir);
        assert_eq!(attr.created, at);
        assert_eq!(attr.accessed, at);
        assert!(!attr.read_only && !attr.hidden);
    }
}
