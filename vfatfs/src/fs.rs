// SPDX-License-Identifier: MIT

//! Filesystem call surface: `getattr`, `readdir` and `read` over a mounted
//! volume.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use time::{OffsetDateTime, PrimitiveDateTime};
use vfatio::BlockIO;

use crate::{
    boot::BootParameters,
    dir::DirEntry,
    errors::*,
    reader::FileReader,
    resolver::{ResolvedNode, Resolver},
};

// File type bits of st_mode.
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;

/// Size unit of `Stat::blocks`.
pub const STAT_BLOCK_SIZE: u64 = 512;

/// Process facts injected by the host at mount time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountEnv {
    pub uid: u32,
    pub gid: u32,
    pub mount_time: OffsetDateTime,
    /// Permission bits for directories.
    pub dir_mode: u32,
    /// Permission bits for regular files.
    pub file_mode: u32,
}

impl Default for MountEnv {
    fn default() -> Self {
        Self {
            uid: 0,
            gid: 0,
            mount_time: OffsetDateTime::UNIX_EPOCH,
            dir_mode: 0o555,
            file_mode: 0o444,
        }
    }
}

/// Mount-time configuration built by the host.
#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    pub env: MountEnv,
}

impl MountOptions {
    pub fn new(env: MountEnv) -> Self {
        Self { env }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    RegularFile,
}

/// POSIX-like attribute record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub kind: FileKind,
    /// File type and permission bits.
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    /// Allocated 512-byte blocks.
    pub blocks: u64,
    pub blksize: u32,
    pub atime: OffsetDateTime,
    pub mtime: OffsetDateTime,
    pub ctime: OffsetDateTime,
}

/// A mounted FAT32 volume.
///
/// Immutable after [`Vfat::mount`]; every operation takes `&self` and may run
/// concurrently when `IO` is `Sync`.
pub struct Vfat<IO: BlockIO> {
    io: IO,
    params: BootParameters,
    env: MountEnv,
}

impl<IO: BlockIO> Vfat<IO> {
    /// Reads the boot sector and builds the mount context.
    pub fn mount(io: IO, options: MountOptions) -> MountResult<Self> {
        let params = BootParameters::read_from(&io)?;

        if let Some(len) = io.len_hint() {
            let end = params.data_offset + params.data_size();
            if end > len {
                log::warn!("volume claims {end} bytes but the device holds {len}");
            }
        }

        log::info!(
            "mounted FAT32 volume {:?}: {} clusters of {} bytes, root at cluster {}",
            params.volume_label_str(),
            params.cluster_count,
            params.cluster_size,
            params.root_cluster
        );
        log::debug!(
            "FAT at 0x{:X} ({} copies of {} sectors), data at 0x{:X}",
            params.fat_offset,
            params.fat_count,
            params.sectors_per_fat(),
            params.data_offset
        );

        Ok(Self {
            io,
            params,
            env: options.env,
        })
    }

    pub fn params(&self) -> &BootParameters {
        &self.params
    }

    pub fn env(&self) -> &MountEnv {
        &self.env
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn into_inner(self) -> IO {
        self.io
    }

    pub fn resolver(&self) -> Resolver<'_, IO> {
        let at = self.env.mount_time;
        Resolver::new(
            &self.io,
            &self.params,
            PrimitiveDateTime::new(at.date(), at.time()),
        )
    }

    pub fn reader(&self) -> FileReader<'_, IO> {
        FileReader::new(&self.io, &self.params)
    }

    pub fn getattr(&self, path: &str) -> FsResult<Stat> {
        log::trace!("getattr {path:?}");
        let node = self.resolver().resolve(path)?;
        Ok(self.stat(&node))
    }

    /// Lists a directory through `filler(name, stat, next_offset)`.
    ///
    /// `.` and `..` come first, then one record per entry. Listing stops as
    /// soon as `filler` returns `true` (its buffer is full).
    pub fn readdir<F>(&self, path: &str, mut filler: F) -> FsResult<()>
    where
        F: FnMut(&str, &Stat, u64) -> bool,
    {
        log::trace!("readdir {path:?}");
        let resolver = self.resolver();
        let node = resolver.resolve(path)?;
        ensure!(node.is_dir(), FsError::NotADirectory);

        let dir_stat = self.stat(&node);
        if filler(".", &dir_stat, 1) || filler("..", &dir_stat, 2) {
            return Ok(());
        }

        for (i, entry) in resolver.entries(&node)?.enumerate() {
            let entry = entry?;
            let stat = self.entry_stat(&entry);
            if filler(&entry.name, &stat, i as u64 + 3) {
                break;
            }
        }
        Ok(())
    }

    /// Reads up to `buf.len()` bytes at `offset`; 0 at or past end of file.
    pub fn read(&self, path: &str, buf: &mut [u8], offset: u64) -> FsResult<usize> {
        log::trace!("read {path:?} {} bytes at {offset}", buf.len());
        let node = self.resolver().resolve(path)?;
        ensure!(!node.is_dir(), FsError::IsADirectory);
        self.reader()
            .read(node.first_cluster, node.size, offset, buf)
            .inspect_err(|e| log::error!("read {path:?} failed: {e}"))
    }

    /// Whole content of the file at `path`.
    pub fn read_to_end(&self, path: &str) -> FsResult<Vec<u8>> {
        let node = self.resolver().resolve(path)?;
        ensure!(!node.is_dir(), FsError::IsADirectory);
        let mut buf = vec![0u8; node.size as usize];
        let n = self
            .reader()
            .read(node.first_cluster, node.size, 0, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    pub fn stat(&self, node: &ResolvedNode) -> Stat {
        self.make_stat(
            node.is_dir(),
            node.size,
            node.attr.accessed,
            node.attr.modified,
            node.attr.created,
        )
    }

    pub fn entry_stat(&self, entry: &DirEntry) -> Stat {
        self.make_stat(
            entry.is_dir(),
            entry.size,
            entry.attr.accessed,
            entry.attr.modified,
            entry.attr.created,
        )
    }

    fn make_stat(
        &self,
        is_dir: bool,
        size: u32,
        accessed: Option<PrimitiveDateTime>,
        modified: Option<PrimitiveDateTime>,
        created: Option<PrimitiveDateTime>,
    ) -> Stat {
        let (kind, mode) = if is_dir {
            (FileKind::Directory, S_IFDIR | self.env.dir_mode)
        } else {
            (FileKind::RegularFile, S_IFREG | self.env.file_mode)
        };
        let size = if is_dir { 0 } else { size as u64 };

        let mtime = modified.map_or(self.env.mount_time, PrimitiveDateTime::assume_utc);
        let atime = accessed.map_or(mtime, PrimitiveDateTime::assume_utc);
        let ctime = created.map_or(mtime, PrimitiveDateTime::assume_utc);

        Stat {
            kind,
            mode,
            nlink: 1,
            uid: self.env.uid,
            gid: self.env.gid,
            size,
            blocks: size.div_ceil(STAT_BLOCK_SIZE),
            blksize: self.params.cluster_size,
            atime,
            mtime,
            ctime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constant::FAT_EOC, test_support::*};
    use time::macros::datetime;

    fn env() -> MountEnv {
        MountEnv {
            uid: 1000,
            gid: 100,
            mount_time: datetime!(2024-05-01 10:00:00 UTC),
            ..Default::default()
        }
    }

    /// /DOCS/REPORT.TXT (700 bytes over clusters 6, 7), /EMPTY.TXT
    fn mounted() -> Vfat<SparseImage> {
        let vol = TestVolume::new();
        vol.write_dir(
            &[2],
            &[
                dir_slot(b"DOCS       ", 3),
                file_slot(b"EMPTY   TXT", 0, 0),
            ],
        );
        vol.set_fat(3, FAT_EOC);
        vol.write_dir(&[3], &long_entry("Report.txt", file_slot(b"REPORT  TXT", 6, 700)));
        vol.chain(&[6, 7]);
        let data: Vec<u8> = (0..700u32).map(|i| (i % 13) as u8).collect();
        vol.write_data(&[6, 7], &data);

        Vfat::mount(vol.image, MountOptions::new(env())).unwrap()
    }

    #[test]
    fn test_mount_rejects_garbage() {
        let io = vfatio::prelude::MemBlockIO::new(vec![0u8; 4096]);
        let err = Vfat::mount(io, MountOptions::default()).err();
        assert!(matches!(err, Some(MountError::UnexpectedFormat(_))));
    }

    #[test]
    fn test_getattr_root() {
        let fs = mounted();
        let st = fs.getattr("/").unwrap();
        assert_eq!(st.kind, FileKind::Directory);
        assert_eq!(st.mode, S_IFDIR | 0o555);
        assert_eq!(st.uid, 1000);
        assert_eq!(st.gid, 100);
        assert_eq!(st.nlink, 1);
        assert_eq!(st.mtime, env().mount_time);
        assert_eq!(st.ctime, env().mount_time);
    }

    #[test]
    fn test_getattr_file() {
        let fs = mounted();
        let st = fs.getattr("/docs/report.txt").unwrap();
        assert_eq!(st.kind, FileKind::RegularFile);
        assert_eq!(st.mode, S_IFREG | 0o444);
        assert_eq!(st.size, 700);
        assert_eq!(st.blocks, 2);
        assert_eq!(st.blksize, 512);
        // No timestamps on disk: mount time
        assert_eq!(st.mtime, env().mount_time);

        assert_eq!(fs.getattr("/docs/nope"), Err(FsError::NotFound));
        assert_eq!(fs.getattr("/docs/nope").unwrap_err().errno(), ENOENT);
    }

    #[test]
    fn test_readdir() {
        let fs = mounted();
        let mut seen = Vec::new();
        fs.readdir("/", |name, st, off| {
            seen.push((name.to_string(), st.kind, off));
            false
        })
        .unwrap();
        assert_eq!(
            seen,
            [
                (".".to_string(), FileKind::Directory, 1),
                ("..".to_string(), FileKind::Directory, 2),
                ("DOCS".to_string(), FileKind::Directory, 3),
                ("EMPTY.TXT".to_string(), FileKind::RegularFile, 4),
            ]
        );
    }

    #[test]
    fn test_readdir_stops_when_full() {
        let fs = mounted();
        let mut names = Vec::new();
        fs.readdir("/", |name, _, _| {
            names.push(name.to_string());
            names.len() == 3
        })
        .unwrap();
        assert_eq!(names, [".", "..", "DOCS"]);
    }

    #[test]
    fn test_readdir_errors() {
        let fs = mounted();
        let err = fs.readdir("/EMPTY.TXT", |_, _, _| false).unwrap_err();
        assert_eq!(err, FsError::NotADirectory);
        assert_eq!(err.errno(), ENOTDIR);
        assert_eq!(fs.readdir("/nope", |_, _, _| false), Err(FsError::NotFound));
    }

    #[test]
    fn test_read() {
        let fs = mounted();
        let mut buf = [0u8; 64];
        let n = fs.read("/DOCS/Report.txt", &mut buf, 500).unwrap();
        assert_eq!(n, 64);
        let expected: Vec<u8> = (500..564u32).map(|i| (i % 13) as u8).collect();
        assert_eq!(&buf[..], &expected[..]);

        assert_eq!(fs.read("/DOCS/Report.txt", &mut buf, 700).unwrap(), 0);
        assert_eq!(fs.read("/EMPTY.TXT", &mut buf, 0).unwrap(), 0);

        let err = fs.read("/DOCS", &mut buf, 0).unwrap_err();
        assert_eq!(err, FsError::IsADirectory);
        assert_eq!(err.errno(), EISDIR);
    }

    #[test]
    fn test_read_to_end() {
        let fs = mounted();
        let data = fs.read_to_end("/docs/REPORT.TXT").unwrap();
        assert_eq!(data.len(), 700);
        assert_eq!(data[699], (699 % 13) as u8);
    }

    #[test]
    fn test_concurrent_reads() {
        let fs = mounted();
        let expected = fs.read_to_end("/DOCS/Report.txt").unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..10 {
                        assert_eq!(fs.read_to_end("/DOCS/Report.txt").unwrap(), expected);
                    }
                });
            }
        });
    }
}
