use alloc::vec;
use alloc::vec::Vec;

use log::{debug, info, warn};

use crate::config::*;
use crate::directory::Directory;
use crate::fat::Fat;
use crate::fd::{Fd, FdTable};
use crate::file::{fread, fwrite};
use crate::structs::*;
use crate::superblock::{read_superblock, write_superblock};
use crate::{BlockDevice, Error, Result};

/// A mounted volume. Owns the block device and the in-memory mirrors of the
/// superblock, FAT, root directory and the handle table.
///
/// Every mutating call writes the metadata it touched back to the device before returning.
/// The engine is single-threaded; wrap it in a lock to share it.
#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    device: D,
    superblock: SuperBlock,
    fat: Fat,
    directory: Directory,
    fds: FdTable,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Writes an empty volume with `data_blocks` data blocks and mounts it.
    /// The device must hold exactly `required_blocks(data_blocks)` blocks.
    pub fn format(mut device: D, data_blocks: usize) -> Result<Self> {
        let superblock = SuperBlock::new(data_blocks)?;
        if device.num_blocks() != superblock.total_blocks as usize {
            return Err(Error::InvalidGeometry);
        }

        write_superblock(&mut device, &superblock)?;
        Fat::new(data_blocks).persist(&mut device, &superblock)?;
        Directory::new().persist(&mut device, &superblock)?;
        device.flush()?;
        info!(
            "formatted volume: {} blocks, {} FAT blocks, {} data blocks",
            superblock.total_blocks, superblock.fat_blocks, superblock.data_blocks
        );

        Self::mount(device)
    }

    /// Validates the volume on `device` and loads its FAT and directory.
    /// Nothing is written; on failure the device is dropped with the error.
    pub fn mount(mut device: D) -> Result<Self> {
        let superblock = read_superblock(&mut device)?;
        let fat = Fat::load(&mut device, &superblock)?;
        let directory = Directory::load(&mut device, &superblock)?;
        directory.check(&fat)?;
        info!(
            "mounted volume: {} blocks, {}/{} data blocks free, {}/{} directory slots free",
            superblock.total_blocks,
            fat.free_count(),
            fat.len(),
            directory.free_slots(),
            MAX_FILES
        );
        Ok(Self {
            device,
            superblock,
            fat,
            directory,
            fds: FdTable::new(),
        })
    }

    /// Releases the volume and hands back the device.
    /// Refused with `FileOpen` while any handle is open, in which case the
    /// engine is returned untouched.
    pub fn unmount(mut self) -> core::result::Result<D, (Self, Error)> {
        let open = self.fds.open_count();
        if open > 0 {
            warn!("unmount refused: {} handles still open", open);
            return Err((self, Error::FileOpen));
        }
        if let Err(e) = self.device.flush() {
            return Err((self, e));
        }
        info!("unmounted volume");
        Ok(self.device)
    }

    pub fn volume_info(&self) -> VolumeInfo {
        let sb = &self.superblock;
        VolumeInfo {
            total_blocks: sb.total_blocks as usize,
            fat_blocks: sb.fat_blocks as usize,
            root_dir_block: sb.root_dir_block as usize,
            data_start: sb.data_start as usize,
            data_blocks: sb.data_blocks as usize,
            fat_free: self.fat.free_count(),
            dir_free: self.directory.free_slots(),
            dir_slots: MAX_FILES,
        }
    }

    /// Creates an empty file.
    pub fn create(&mut self, name: &str) -> Result<()> {
        let index = self.directory.create(&mut self.device, &self.superblock, name)?;
        debug!("created {} (slot {})", name, index);
        Ok(())
    }

    /// Removes a file and releases its blocks. Refused with `FileOpen` while a handle refers to it.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        let index = self.directory.find(name).ok_or(Error::NotFound)?;
        if self.fds.references(index) {
            return Err(Error::FileOpen);
        }

        let first_block = self.directory.entry(index)?.first_block;
        let freed = self.fat.free_chain(first_block)?;
        self.directory.remove(&mut self.device, &self.superblock, index)?;
        self.fat.persist(&mut self.device, &self.superblock)?;
        debug!("deleted {}, {} blocks released", name, freed);
        Ok(())
    }

    pub fn list(&self) -> Vec<FileStat> {
        self.directory.list()
    }

    pub fn open(&mut self, name: &str) -> Result<Fd> {
        validate_name(name)?;
        let index = self.directory.find(name).ok_or(Error::NotFound)?;
        let fd = self.fds.open(index)?;
        debug!("opened {} as {}", name, fd);
        Ok(fd)
    }

    pub fn close(&mut self, fd: Fd) -> Result<()> {
        self.fds.close(fd)?;
        debug!("closed {}", fd);
        Ok(())
    }

    pub fn file_size(&self, fd: Fd) -> Result<usize> {
        let file = self.fds.get(fd)?;
        Ok(self.directory.stat(file.dir_index)? as usize)
    }

    pub fn tell(&self, fd: Fd) -> Result<usize> {
        self.fds.tell(fd)
    }

    /// Moves the offset of `fd`. Seeking to the file size is allowed and appends on the next write.
    pub fn seek(&mut self, fd: Fd, offset: usize) -> Result<()> {
        let size = self.file_size(fd)?;
        self.fds.seek(fd, offset, size)
    }

    /// Reads up to `buf.len()` bytes at the current offset and advances it.
    /// A short count means end of file.
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize> {
        let file = self.fds.get(fd)?;
        let entry = self.directory.entry(file.dir_index)?;
        let bytes_read = fread(
            &mut self.device,
            &self.superblock,
            &self.fat,
            entry,
            file.offset,
            buf,
        )?;
        self.fds.get_mut(fd)?.offset += bytes_read;
        Ok(bytes_read)
    }

    /// Reads up to `count` bytes at the current offset into a fresh buffer.
    pub fn read_vec(&mut self, fd: Fd, count: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        let bytes_read = self.read(fd, &mut buf)?;
        buf.truncate(bytes_read);
        Ok(buf)
    }

    /// Writes `data` at the current offset, growing the file as needed, and advances the offset.
    /// Returns fewer bytes than requested when the volume fills up.
    pub fn write(&mut self, fd: Fd, data: &[u8]) -> Result<usize> {
        let file = self.fds.get(fd)?;
        if data.is_empty() {
            return Ok(0);
        }

        let mut entry = self.directory.entry(file.dir_index)?.clone();
        let bytes_written = fwrite(
            &mut self.device,
            &self.superblock,
            &mut self.fat,
            &mut entry,
            file.offset,
            data,
        )?;

        self.directory.update(
            &mut self.device,
            &self.superblock,
            file.dir_index,
            entry.size,
            entry.first_block,
        )?;
        self.fat.persist(&mut self.device, &self.superblock)?;
        self.fds.get_mut(fd)?.offset += bytes_written;
        if bytes_written < data.len() {
            warn!("short write to {}: {} of {} bytes", entry.name, bytes_written, data.len());
        }
        Ok(bytes_written)
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    pub fn fat(&self) -> &Fat {
        &self.fat
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}
