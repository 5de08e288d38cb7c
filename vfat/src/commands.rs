// vfat/src/commands.rs

use std::{collections::HashSet, io::Write};

use anyhow::Context;
use colored::Colorize;
use vfatfs::{
    dir::read_dir,
    fs::{FileKind, S_IFDIR, S_IFREG},
    prelude::*,
    utils::path_utils::{extract_name_from_path, join_paths},
};

use crate::utils::pretty_bytes;

/// Wraps a per-call error with its path and errno.
fn fs_err(path: &str, e: FsError) -> anyhow::Error {
    anyhow::anyhow!("{path}: {e} (errno {})", e.errno())
}

fn mode_string(mode: u32) -> String {
    let kind = if mode & S_IFDIR == S_IFDIR {
        'd'
    } else if mode & S_IFREG == S_IFREG {
        '-'
    } else {
        '?'
    };
    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

fn paint_name(name: &str, kind: FileKind) -> String {
    match kind {
        FileKind::Directory => name.blue().bold().to_string(),
        FileKind::RegularFile => name.to_string(),
    }
}

pub fn info<IO: BlockIO>(fs: &Vfat<IOCounter<IO>>) -> anyhow::Result<()> {
    let p = fs.params();
    println!("{}", "Volume".bold());
    println!("  label          : {}", p.volume_label_str());
    println!("  id             : {:08X}", p.volume_id);
    println!("  type           : {}", p.width);
    println!("  signature      : {}", if p.has_signature { "0x55AA" } else { "missing" });
    println!("{}", "Geometry".bold());
    println!("  sector size    : {} bytes", p.bytes_per_sector);
    println!("  cluster size   : {}", pretty_bytes(p.cluster_size as u64));
    println!("  reserved       : {} sectors", p.reserved_sectors);
    println!("  FAT copies     : {} x {} sectors", p.fat_count, p.sectors_per_fat());
    println!("  total sectors  : {}", p.total_sectors());
    println!("  data clusters  : {} ({})", p.cluster_count, pretty_bytes(p.data_size()));
    println!("  root cluster   : {}", p.root_cluster);
    println!("  FAT offset     : 0x{:X}", p.fat_offset);
    println!("  data offset    : 0x{:X}", p.data_offset);
    print_io_stats(fs);
    Ok(())
}

pub fn print_io_stats<IO: BlockIO>(fs: &Vfat<IOCounter<IO>>) {
    let stats = fs.io().snapshot();
    println!("{}", "IO".bold());
    println!("  reads          : {}", stats.reads);
    println!("  bytes          : {}", pretty_bytes(stats.read_bytes));
    println!("  largest read   : {}", pretty_bytes(stats.max_read));
}

pub fn stat<IO: BlockIO>(fs: &Vfat<IO>, path: &str) -> anyhow::Result<()> {
    let st = fs.getattr(path).map_err(|e| fs_err(path, e))?;
    let kind = match st.kind {
        FileKind::Directory => "directory",
        FileKind::RegularFile => "regular file",
    };
    println!("  File: {path}");
    println!(
        "  Size: {:<12} Blocks: {:<8} IO Block: {:<6} {kind}",
        st.size, st.blocks, st.blksize
    );
    println!(
        "Access: ({:04o}/{})  Uid: {:>5}  Gid: {:>5}  Links: {}",
        st.mode & 0o7777,
        mode_string(st.mode),
        st.uid,
        st.gid,
        st.nlink
    );
    println!("Access: {}", st.atime);
    println!("Modify: {}", st.mtime);
    println!("Change: {}", st.ctime);
    Ok(())
}

fn ls_line(name: &str, st: &Stat, long: bool) -> String {
    if !long {
        return paint_name(name, st.kind);
    }
    format!(
        "{} {:>10} {} {}",
        mode_string(st.mode),
        st.size,
        st.mtime.date(),
        paint_name(name, st.kind)
    )
}

pub fn ls<IO: BlockIO>(fs: &Vfat<IO>, path: &str, long: bool) -> anyhow::Result<()> {
    let st = fs.getattr(path).map_err(|e| fs_err(path, e))?;
    if st.kind == FileKind::RegularFile {
        println!("{}", ls_line(extract_name_from_path(path), &st, long));
        return Ok(());
    }

    let mut out = std::io::stdout().lock();
    let mut io_err = None;
    fs.readdir(path, |name, st, _| {
        if name == "." || name == ".." {
            return false;
        }
        let line = ls_line(name, st, long);
        match writeln!(out, "{line}") {
            Ok(()) => false,
            Err(e) => {
                io_err = Some(e);
                true
            }
        }
    })
    .map_err(|e| fs_err(path, e))?;

    if let Some(e) = io_err {
        return Err(e).context("writing listing");
    }
    Ok(())
}

pub fn cat<IO: BlockIO>(fs: &Vfat<IO>, path: &str) -> anyhow::Result<()> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut offset = 0u64;
    let mut out = std::io::stdout().lock();
    loop {
        let n = fs.read(path, &mut buf, offset).map_err(|e| fs_err(path, e))?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).context("writing to stdout")?;
        offset += n as u64;
    }
    out.flush().context("flushing stdout")?;
    Ok(())
}

struct TreeItem {
    path: String,
    line: String,
    prefix: String,
    depth: usize,
    /// Cluster to list, `None` for files.
    dir_cluster: Option<u32>,
}

/// Writes the tree under `path` to `out`, depth first and without recursion.
///
/// A directory that cannot be listed is reported and skipped. Each directory
/// cluster is listed once; an entry leading back to one already listed is
/// printed but not descended into.
pub fn tree<IO: BlockIO, W: Write>(
    fs: &Vfat<IO>,
    path: &str,
    max_depth: Option<usize>,
    out: &mut W,
) -> anyhow::Result<()> {
    let params = fs.params();
    let root = fs.resolver().resolve(path).map_err(|e| fs_err(path, e))?;
    let kind = if root.is_dir() { FileKind::Directory } else { FileKind::RegularFile };

    let (mut dirs, mut files) = (0usize, 0usize);
    let mut listed = HashSet::new();
    let mut stack = vec![TreeItem {
        path: path.to_string(),
        line: paint_name(path, kind),
        prefix: String::new(),
        depth: 0,
        dir_cluster: root.is_dir().then(|| root.dir_cluster(params)),
    }];

    while let Some(item) = stack.pop() {
        writeln!(out, "{}", item.line)?;
        if item.depth > 0 {
            if item.dir_cluster.is_some() {
                dirs += 1;
            } else {
                files += 1;
            }
        }
        let Some(cluster) = item.dir_cluster else {
            continue;
        };
        if max_depth.is_some_and(|max| item.depth >= max) {
            continue;
        }
        if !listed.insert(cluster) {
            log::warn!("{}: directory cluster {cluster} already listed, not descending", item.path);
            continue;
        }

        let entries = match read_dir(fs.io(), params, cluster) {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("{}", fs_err(&item.path, e));
                continue;
            }
        };

        let count = entries.len();
        // Pushed in reverse so siblings pop in directory order.
        for (i, entry) in entries.into_iter().enumerate().rev() {
            let last = i + 1 == count;
            let kind = if entry.is_dir() { FileKind::Directory } else { FileKind::RegularFile };
            let dir_cluster = entry.is_dir().then(|| {
                if entry.first_cluster == 0 {
                    params.root_cluster
                } else {
                    entry.first_cluster
                }
            });
            stack.push(TreeItem {
                path: join_paths(&item.path, &entry.name),
                line: format!(
                    "{}{}{}",
                    item.prefix,
                    if last { "└── " } else { "├── " },
                    paint_name(&entry.name, kind)
                ),
                prefix: format!("{}{}", item.prefix, if last { "    " } else { "│   " }),
                depth: item.depth + 1,
                dir_cluster,
            });
        }
    }

    writeln!(out, "\n{dirs} directories, {files} files")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Cursor, Seek, SeekFrom};

    use vfatfs::MountOptions;

    fn image_with_loop() -> Vec<u8> {
        let mut cursor = Cursor::new(vec![0u8; 40 * 1024 * 1024]);
        fatfs::format_volume(
            &mut cursor,
            fatfs::FormatVolumeOptions::new().fat_type(fatfs::FatType::Fat32),
        )
        .unwrap();
        cursor.seek(SeekFrom::Start(0)).unwrap();
        {
            let fs = fatfs::FileSystem::new(&mut cursor, fatfs::FsOptions::new()).unwrap();
            let root = fs.root_dir();
            root.create_dir("LOOP").unwrap();
            root.create_dir("LOOP/INNER").unwrap();
            let mut f = root.create_file("A.TXT").unwrap();
            f.write_all(b"hello").unwrap();
        }
        let mut image = cursor.into_inner();

        // Point /LOOP back at the root directory (start cluster 0).
        let (root, cluster_size) = {
            let fs = Vfat::mount(MemBlockIO::new(&image[..]), MountOptions::default()).unwrap();
            let params = fs.params();
            (
                params.cluster_offset(params.root_cluster) as usize,
                params.cluster_size as usize,
            )
        };
        let slot = image[root..root + cluster_size]
            .chunks(32)
            .position(|s| &s[..11] == b"LOOP       ")
            .unwrap();
        let at = root + slot * 32;
        image[at + 20..at + 22].fill(0);
        image[at + 26..at + 28].fill(0);
        image
    }

    #[test]
    fn test_tree_stops_at_directory_loop() {
        let image = image_with_loop();
        let fs = Vfat::mount(MemBlockIO::new(image), MountOptions::default()).unwrap();

        // The loop itself resolves: each component is one bounded scan.
        assert!(fs.getattr("/LOOP/LOOP/LOOP/A.TXT").is_ok());

        let mut out = Vec::new();
        tree(&fs, "/", None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().filter(|l| l.contains("LOOP")).count(), 1);
        assert_eq!(text.lines().filter(|l| l.contains("A.TXT")).count(), 1);
        assert!(!text.contains("INNER"));
        assert!(text.ends_with("1 directories, 1 files\n"));
    }

    #[test]
    fn test_tree_depth_limit() {
        let image = image_with_loop();
        let fs = Vfat::mount(MemBlockIO::new(image), MountOptions::default()).unwrap();

        let mut out = Vec::new();
        tree(&fs, "/", Some(0), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("0 directories, 0 files\n"));
    }

    #[test]
    fn test_mode_string() {
        assert_eq!(mode_string(S_IFDIR | 0o555), "dr-xr-xr-x");
        assert_eq!(mode_string(S_IFREG | 0o444), "-r--r--r--");
        assert_eq!(mode_string(S_IFREG | 0o640), "-rw-r-----");
    }
}
