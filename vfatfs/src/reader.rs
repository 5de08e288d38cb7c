// SPDX-License-Identifier: MIT

use vfatio::prelude::*;

use crate::{
    boot::BootParameters,
    chain::{ClusterChain, RunIter},
    errors::*,
};

/// Byte-range reads through a file's cluster chain.
pub struct FileReader<'a, IO: BlockIO + ?Sized> {
    io: &'a IO,
    params: &'a BootParameters,
}

impl<'a, IO: BlockIO + ?Sized> FileReader<'a, IO> {
    pub fn new(io: &'a IO, params: &'a BootParameters) -> Self {
        Self { io, params }
    }

    /// Fills `buf` from `offset` of a file of `file_size` bytes starting at
    /// `first_cluster`, and returns the byte count, clipped at end of file.
    ///
    /// Only the links covering the requested range are followed; adjacent
    /// clusters are fetched in a single device read.
    pub fn read(
        &self,
        first_cluster: u32,
        file_size: u32,
        offset: u64,
        buf: &mut [u8],
    ) -> FsResult<usize> {
        let file_size = file_size as u64;
        if offset >= file_size || buf.is_empty() {
            return Ok(0);
        }
        let len = (buf.len() as u64).min(file_size - offset) as usize;

        let cs = self.params.cluster_size as u64;
        let skip = offset / cs;
        let mut intra = offset % cs;
        let needed = (intra + len as u64).div_ceil(cs);

        let mut walk = ClusterChain::new(self.params, first_cluster).walk(self.io);
        if (walk.advance(skip as usize)? as u64) < skip {
            log::warn!(
                "chain at cluster {first_cluster} ends before offset {offset} (size {file_size})"
            );
            return Err(ChainError::ShortChain.into());
        }

        let mut written = 0usize;
        for run in RunIter::new(walk.take(needed as usize)) {
            let (start, count) = run?;
            let run_bytes = count as u64 * cs - intra;
            let take = run_bytes.min((len - written) as u64) as usize;

            self.io.read_at(
                self.params.cluster_offset(start) + intra,
                &mut buf[written..written + take],
            )?;
            written += take;
            intra = 0;
            if written == len {
                break;
            }
        }

        if written < len {
            log::warn!(
                "chain at cluster {first_cluster} ends after {written} of {len} requested bytes"
            );
            return Err(ChainError::ShortChain.into());
        }
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    /// 3 clusters of 512 bytes, byte i of the file = i % 251.
    fn sample(clusters: &[u32]) -> (TestVolume, Vec<u8>) {
        let vol = TestVolume::new();
        let data: Vec<u8> = (0..1500u32).map(|i| (i % 251) as u8).collect();
        vol.chain(clusters);
        vol.write_data(clusters, &data);
        (vol, data)
    }

    #[test]
    fn test_read_across_cluster_boundary() {
        let (vol, data) = sample(&[5, 6, 7]);
        let reader = FileReader::new(&vol.image, &vol.params);

        let mut buf = [0u8; 100];
        assert_eq!(reader.read(5, 1500, 500, &mut buf).unwrap(), 100);
        assert_eq!(&buf[..], &data[500..600]);
    }

    #[test]
    fn test_fragmented_file() {
        let (vol, data) = sample(&[40, 12, 13]);
        let reader = FileReader::new(&vol.image, &vol.params);

        let mut buf = vec![0u8; 1500];
        assert_eq!(reader.read(40, 1500, 0, &mut buf).unwrap(), 1500);
        assert_eq!(buf, data);

        let mut buf = [0u8; 600];
        assert_eq!(reader.read(40, 1500, 300, &mut buf).unwrap(), 600);
        assert_eq!(&buf[..], &data[300..900]);
    }

    #[test]
    fn test_contiguous_runs_batched() {
        let (vol, data) = sample(&[5, 6, 7]);
        let counter = IOCounter::new(&vol.image);
        let reader = FileReader::new(&counter, &vol.params);

        let mut buf = vec![0u8; 1500];
        reader.read(5, 1500, 0, &mut buf).unwrap();
        assert_eq!(buf, data);

        // 3 FAT entries + 1 data read
        assert_eq!(counter.snapshot().reads, 4);
    }

    #[test]
    fn test_clipped_at_eof() {
        let (vol, data) = sample(&[5, 6, 7]);
        let reader = FileReader::new(&vol.image, &vol.params);

        let mut buf = [0u8; 100];
        assert_eq!(reader.read(5, 1500, 1450, &mut buf).unwrap(), 50);
        assert_eq!(&buf[..50], &data[1450..]);

        assert_eq!(reader.read(5, 1500, 1500, &mut buf).unwrap(), 0);
        assert_eq!(reader.read(5, 1500, 9000, &mut buf).unwrap(), 0);
        assert_eq!(reader.read(5, 1500, 0, &mut []).unwrap(), 0);
    }

    #[test]
    fn test_empty_file() {
        let vol = TestVolume::new();
        let reader = FileReader::new(&vol.image, &vol.params);
        let mut buf = [0u8; 16];
        assert_eq!(reader.read(0, 0, 0, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_truncated_chain() {
        // Size claims 3 clusters, chain holds 2
        let (vol, _) = sample(&[5, 6]);
        let reader = FileReader::new(&vol.image, &vol.params);

        let mut buf = vec![0u8; 1500];
        assert_eq!(
            reader.read(5, 1500, 0, &mut buf),
            Err(FsError::Chain(ChainError::ShortChain))
        );

        // Starting beyond the chain
        let mut buf = [0u8; 10];
        assert_eq!(
            reader.read(5, 1500, 1200, &mut buf),
            Err(FsError::Chain(ChainError::ShortChain))
        );

        // The part that exists is still readable
        assert_eq!(reader.read(5, 1500, 0, &mut buf).unwrap(), 10);
    }

    #[test]
    fn test_cyclic_chain() {
        // 5 -> 6 -> 5
        let (vol, data) = sample(&[5, 6, 7]);
        vol.set_fat(6, 5);
        let reader = FileReader::new(&vol.image, &vol.params);

        let mut buf = vec![0u8; 1500];
        assert_eq!(
            reader.read(5, 1500, 0, &mut buf),
            Err(FsError::Chain(ChainError::CycleDetected))
        );

        // The first two clusters are distinct and still readable
        let mut buf = vec![0u8; 1024];
        assert_eq!(reader.read(5, 1500, 0, &mut buf).unwrap(), 1024);
        assert_eq!(&buf[..], &data[..1024]);
    }

    #[test]
    fn test_damage_beyond_range_is_not_read() {
        let (vol, data) = sample(&[5, 6, 7]);
        vol.set_fat(6, crate::constant::FAT_BAD_CLUSTER);
        let reader = FileReader::new(&vol.image, &vol.params);

        let mut buf = [0u8; 200];
        assert_eq!(reader.read(5, 1500, 100, &mut buf).unwrap(), 200);
        assert_eq!(&buf[..], &data[100..300]);

        let mut buf = [0u8; 200];
        assert_eq!(
            reader.read(5, 1500, 1100, &mut buf),
            Err(FsError::Chain(ChainError::BadCluster(
                crate::constant::FAT_BAD_CLUSTER
            )))
        );
    }
}
