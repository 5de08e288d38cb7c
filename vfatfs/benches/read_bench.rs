use criterion::{Criterion, criterion_group, criterion_main};
use std::io::{Cursor, Write};

use vfatfs::prelude::*;

criterion_group!(benches, vfat_read_bench);
criterion_main!(benches);

const SIZE_BYTES: usize = 40 * 1024 * 1024;
const FILE_BYTES: usize = 1024 * 1024;

fn build_image() -> Vec<u8> {
    let mut cursor = Cursor::new(vec![0u8; SIZE_BYTES]);
    fatfs::format_volume(
        &mut cursor,
        fatfs::FormatVolumeOptions::new().fat_type(fatfs::FatType::Fat32),
    )
    .expect("format failed");
    {
        let fs = fatfs::FileSystem::new(&mut cursor, fatfs::FsOptions::new()).expect("open failed");
        let root = fs.root_dir();
        root.create_dir("deep").unwrap();
        root.create_dir("deep/er").unwrap();
        root.create_dir("deep/er/still").unwrap();
        let data: Vec<u8> = (0..FILE_BYTES).map(|i| i as u8).collect();
        let mut f = root.create_file("deep/er/still/payload.bin").unwrap();
        f.write_all(&data).unwrap();

        root.create_dir("wide").unwrap();
        for i in 0..200 {
            let mut f = root
                .create_file(&format!("wide/a fairly long entry name {i:03}.txt"))
                .unwrap();
            f.write_all(b"x").unwrap();
        }
    }
    cursor.into_inner()
}

pub fn vfat_read_bench(c: &mut Criterion) {
    let image = build_image();
    let fs = Vfat::mount(MemBlockIO::new(image.clone()), MountOptions::default())
        .expect("mount failed");
    let mut buf = vec![0u8; FILE_BYTES];

    c.bench_function("vfat_resolve_deep", |b| {
        b.iter(|| fs.getattr("/deep/er/still/payload.bin").unwrap());
    });

    c.bench_function("vfat_readdir_wide", |b| {
        b.iter(|| {
            let mut count = 0usize;
            fs.readdir("/wide", |_, _, _| {
                count += 1;
                false
            })
            .unwrap();
            count
        });
    });

    c.bench_function("vfat_read_1m_mem", |b| {
        b.iter(|| fs.read("/deep/er/still/payload.bin", &mut buf, 0).unwrap());
    });

    let mut file = tempfile::NamedTempFile::new().expect("tempfile failed");
    file.write_all(&image).expect("write failed");
    file.flush().expect("flush failed");
    let fs = Vfat::mount(
        FileBlockIO::open(file.path()).expect("open failed"),
        MountOptions::default(),
    )
    .expect("mount failed");

    c.bench_function("vfat_read_1m_file", |b| {
        b.iter(|| fs.read("/deep/er/still/payload.bin", &mut buf, 0).unwrap());
    });
}
