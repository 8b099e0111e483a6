//! Common utilities for tests
#![allow(dead_code)]

use fatfs150::{BlockDevice, Error, FileSystem, Result, BLOCK_SIZE, FAT_EOC, FAT_FREE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder") -> println!("[test] placeholder");
#[macro_export]
macro_rules! log {
    ($msg:expr, $($arg:tt)*) => {
        println!("{}[test] {}{}", crate::common::ORANGE, format!($msg, $($arg)*), crate::common::RESET)
    };
}

pub struct RamDisk {
    data: Vec<u8>,
    num_blocks: usize,
    pub writes: usize,
    pub fail_writes: bool,
}

impl RamDisk {
    /// Creates a new RamDisk with the specified number of blocks.
    /// Each block is BLOCK_SIZE bytes.
    pub fn new(num_blocks: usize) -> Self {
        RamDisk {
            data: vec![0u8; num_blocks * BLOCK_SIZE],
            num_blocks,
            writes: 0,
            fail_writes: false,
        }
    }

    pub fn block(&self, block_id: usize) -> &[u8] {
        &self.data[block_id * BLOCK_SIZE..(block_id + 1) * BLOCK_SIZE]
    }

    pub fn block_mut(&mut self, block_id: usize) -> &mut [u8] {
        &mut self.data[block_id * BLOCK_SIZE..(block_id + 1) * BLOCK_SIZE]
    }
}

impl BlockDevice for RamDisk {
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&mut self, block_id: usize, buf: &mut [u8]) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(Error::InvalidBlockId(block_id));
        }
        buf.copy_from_slice(self.block(block_id));
        Ok(())
    }

    fn write_block(&mut self, block_id: usize, buf: &[u8]) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(Error::InvalidBlockId(block_id));
        }
        if self.fail_writes {
            return Err(Error::Io(std::io::ErrorKind::Other));
        }
        self.block_mut(block_id).copy_from_slice(buf);
        self.writes += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // In a RAM disk, flushing is a no-op since data is already in memory.
        Ok(())
    }
}

/// A freshly formatted in-memory volume with `data_blocks` data blocks.
pub fn formatted(data_blocks: usize) -> FileSystem<RamDisk> {
    let disk = RamDisk::new(fatfs150::required_blocks(data_blocks));
    FileSystem::format(disk, data_blocks).unwrap()
}

pub fn payload(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill(&mut data[..]);
    data
}

/// Checks the FAT free count and every file's chain against its size.
pub fn check_invariants(fs: &FileSystem<RamDisk>) {
    let fat = fs.fat();
    let zeros = (0..fat.len() as u16).filter(|&i| fat.get(i) == Some(FAT_FREE)).count();
    assert_eq!(fat.free_count(), zeros);
    assert_eq!(fat.free_count() + fat.used_count(), fs.superblock().data_blocks as usize);

    let mut chained = 0;
    for file in fs.list() {
        assert_eq!(file.size == 0, file.first_block == FAT_EOC, "{}", file);
        let len = fat.chain_len(file.first_block).unwrap();
        assert_eq!(len, (file.size as usize).div_ceil(BLOCK_SIZE), "{}", file);
        chained += len;
    }
    assert_eq!(chained, fat.used_count());
}
