//! The root directory: a single block of `MAX_FILES` fixed-size records, mirrored in memory.
//! Every mutation writes the whole block back before returning.

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::debug;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::*;
use crate::{BlockDevice, Fat};

#[derive(Debug, Clone)]
pub struct Directory {
    slots: Vec<Option<DirEntry>>,
}

impl Directory {
    pub fn new() -> Self {
        Self {
            slots: alloc::vec![None; MAX_FILES],
        }
    }

    pub fn load<D: BlockDevice>(device: &mut D, superblock: &SuperBlock) -> Result<Self> {
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        device.read_block(superblock.root_dir_block as usize, buf.as_mut_slice())?;

        let mut slots = Vec::with_capacity(MAX_FILES);
        for record in buf.chunks_exact(DIR_ENTRY_SIZE) {
            let entry = DirEntry::decode(record)?;
            if let Some(entry) = &entry {
                if entry.first_block != FAT_EOC && entry.first_block >= superblock.data_blocks {
                    return Err(FsError::InvalidVolume);
                }
            }
            slots.push(entry);
        }
        Ok(Self { slots })
    }

    /// Cross-checks live entries against `fat`: names are unique, a file is empty
    /// exactly when it has no first block, each chain holds `ceil(size / BLOCK_SIZE)`
    /// blocks, and no block belongs to two files.
    pub fn check(&self, fat: &Fat) -> Result<()> {
        let mut owned = alloc::vec![false; fat.len()];
        for (i, entry) in self.slots.iter().enumerate() {
            let Some(entry) = entry else { continue };
            if self.find(&entry.name) != Some(i) {
                return Err(FsError::InvalidVolume);
            }
            if (entry.size == 0) != (entry.first_block == FAT_EOC) {
                return Err(FsError::InvalidVolume);
            }
            if fat.chain_len(entry.first_block)? != (entry.size as usize).div_ceil(BLOCK_SIZE) {
                return Err(FsError::InvalidVolume);
            }
            let mut cur = entry.first_block;
            while cur != FAT_EOC {
                if core::mem::replace(&mut owned[cur as usize], true) {
                    return Err(FsError::InvalidVolume);
                }
                cur = fat.next(cur)?;
            }
        }
        Ok(())
    }

    pub fn persist<D: BlockDevice>(&self, device: &mut D, superblock: &SuperBlock) -> Result<()> {
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        for (record, slot) in buf.chunks_exact_mut(DIR_ENTRY_SIZE).zip(&self.slots) {
            DirEntry::encode(slot.as_ref(), record);
        }
        device.write_block(superblock.root_dir_block as usize, buf.as_slice())
    }

    /// Slot index of the file called `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|entry| entry.name == name))
    }

    /// Claims the first empty slot for a new, empty file.
    pub fn create<D: BlockDevice>(
        &mut self,
        device: &mut D,
        superblock: &SuperBlock,
        name: &str,
    ) -> Result<usize> {
        let entry = DirEntry::new(name)?;
        if self.find(name).is_some() {
            return Err(FsError::AlreadyExists);
        }
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(FsError::DirectoryFull)?;

        self.slots[index] = Some(entry);
        if let Err(e) = self.persist(device, superblock) {
            self.slots[index] = None;
            return Err(e);
        }
        debug!("directory: created {} in slot {}", name, index);
        Ok(index)
    }

    /// Clears slot `index` and returns what it held. The caller owns releasing its chain.
    pub fn remove<D: BlockDevice>(
        &mut self,
        device: &mut D,
        superblock: &SuperBlock,
        index: usize,
    ) -> Result<DirEntry> {
        let entry = self
            .slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(FsError::NotFound)?;
        self.persist(device, superblock)?;
        debug!("directory: removed {} from slot {}", entry.name, index);
        Ok(entry)
    }

    pub fn entry(&self, index: usize) -> Result<&DirEntry> {
        self.slots
            .get(index)
            .and_then(Option::as_ref)
            .ok_or(FsError::NotFound)
    }

    pub fn stat(&self, index: usize) -> Result<u32> {
        Ok(self.entry(index)?.size)
    }

    /// Records a new size and first block for slot `index`, then persists.
    pub fn update<D: BlockDevice>(
        &mut self,
        device: &mut D,
        superblock: &SuperBlock,
        index: usize,
        size: u32,
        first_block: u16,
    ) -> Result<()> {
        let entry = self
            .slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(FsError::NotFound)?;
        entry.size = size;
        entry.first_block = first_block;
        self.persist(device, superblock)
    }

    /// Live entries in slot order.
    pub fn list(&self) -> Vec<FileStat> {
        self.slots.iter().flatten().map(FileStat::from).collect()
    }

    pub fn free_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }
}
