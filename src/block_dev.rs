use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::config::BLOCK_SIZE;
use crate::error::{FsError, Result};

pub trait BlockDevice {
    /// Returns the number of blocks in the block device.
    fn num_blocks(&self) -> usize;

    /// Reads a block of data from the block device.
    /// buf.len() must be equal to BLOCK_SIZE.
    fn read_block(&mut self, block_id: usize, buf: &mut [u8]) -> Result<()>;

    /// Writes a block of data to the block device.
    /// buf.len() must be equal to BLOCK_SIZE.
    fn write_block(&mut self, block_id: usize, buf: &[u8]) -> Result<()>;

    /// Flushes any buffered data to the backing store.
    fn flush(&mut self) -> Result<()>;
}

/// A disk image on the host file system, addressed in `BLOCK_SIZE` blocks.
#[derive(Debug)]
pub struct FileDisk {
    file: File,
    num_blocks: usize,
}

impl FileDisk {
    /// Opens an existing image. Its length must be a whole number of blocks.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::options().read(true).write(true).open(path.as_ref())?;
        let len = file.metadata()?.len() as usize;
        if len % BLOCK_SIZE != 0 {
            return Err(FsError::InvalidVolume);
        }
        debug!("opened disk image {} ({} blocks)", path.as_ref().display(), len / BLOCK_SIZE);
        Ok(Self { file, num_blocks: len / BLOCK_SIZE })
    }

    /// Creates (or truncates) a zero-filled image of `num_blocks` blocks.
    pub fn create(path: impl AsRef<Path>, num_blocks: usize) -> Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        file.set_len((num_blocks * BLOCK_SIZE) as u64)?;
        debug!("created disk image {} ({} blocks)", path.as_ref().display(), num_blocks);
        Ok(Self { file, num_blocks })
    }

    fn seek_to(&mut self, block_id: usize, len: usize) -> Result<()> {
        if block_id >= self.num_blocks {
            return Err(FsError::InvalidBlockId(block_id));
        }
        if len != BLOCK_SIZE {
            return Err(FsError::Io(std::io::ErrorKind::InvalidInput));
        }
        self.file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))?;
        Ok(())
    }
}

impl BlockDevice for FileDisk {
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&mut self, block_id: usize, buf: &mut [u8]) -> Result<()> {
        self.seek_to(block_id, buf.len())?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&mut self, block_id: usize, buf: &[u8]) -> Result<()> {
        self.seek_to(block_id, buf.len())?;
        self.file.write_all(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}
