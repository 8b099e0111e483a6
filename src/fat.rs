//! In-memory mirror of the File Allocation Table.
//! Entry `i` describes data block `i`: free, end of chain, or the index of the next block.
//! Free entries are found first-fit, so allocation is deterministic.

use alloc::boxed::Box;
use alloc::vec::Vec;

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::{BlockDevice, SuperBlock};

#[derive(Debug, Clone)]
pub struct Fat {
    entries: Vec<u16>,
    free: usize,
}

impl Fat {
    /// An all-free table for a freshly formatted volume.
    pub fn new(data_blocks: usize) -> Self {
        Self {
            entries: alloc::vec![FAT_FREE; data_blocks],
            free: data_blocks,
        }
    }

    /// Reads the FAT blocks in order. Entries past `data_blocks` in the last block are padding.
    pub fn load<D: BlockDevice>(device: &mut D, superblock: &SuperBlock) -> Result<Self> {
        let data_blocks = superblock.data_blocks as usize;
        let mut entries = Vec::with_capacity(data_blocks);
        let mut buf = Box::new([0u8; BLOCK_SIZE]);

        for block_id in superblock.fat_range() {
            device.read_block(block_id, buf.as_mut_slice())?;
            let remaining = data_blocks - entries.len();
            let count = remaining.min(FAT_ENTRIES_PER_BLOCK);
            for raw in buf.chunks_exact(FAT_ENTRY_SIZE).take(count) {
                let entry = LittleEndian::read_u16(raw);
                if entry != FAT_FREE && entry != FAT_EOC && entry as usize >= data_blocks {
                    return Err(FsError::InvalidVolume);
                }
                entries.push(entry);
            }
        }

        let free = entries.iter().filter(|&&e| e == FAT_FREE).count();
        Ok(Self { entries, free })
    }

    /// Writes every FAT block back, in block order.
    pub fn persist<D: BlockDevice>(&self, device: &mut D, superblock: &SuperBlock) -> Result<()> {
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        for (i, block_id) in superblock.fat_range().enumerate() {
            buf.fill(0);
            let start = (i * FAT_ENTRIES_PER_BLOCK).min(self.entries.len());
            let end = (start + FAT_ENTRIES_PER_BLOCK).min(self.entries.len());
            for (raw, &entry) in buf.chunks_exact_mut(FAT_ENTRY_SIZE).zip(&self.entries[start..end]) {
                LittleEndian::write_u16(raw, entry);
            }
            device.write_block(block_id, buf.as_slice())?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn free_count(&self) -> usize {
        self.free
    }

    pub fn used_count(&self) -> usize {
        self.entries.len() - self.free
    }

    pub fn get(&self, index: u16) -> Option<u16> {
        self.entries.get(index as usize).copied()
    }

    /// Follows one link. `FAT_EOC` means `index` is the tail of its chain.
    pub fn next(&self, index: u16) -> Result<u16> {
        match self.get(index) {
            Some(FAT_FREE) | None => Err(FsError::InvalidVolume),
            Some(next) => Ok(next),
        }
    }

    pub fn find_free(&self) -> Option<u16> {
        self.find_free_from(0)
    }

    /// First free entry at or after `start`.
    pub fn find_free_from(&self, start: usize) -> Option<u16> {
        self.entries
            .iter()
            .skip(start)
            .position(|&e| e == FAT_FREE)
            .map(|i| (start + i) as u16)
    }

    /// Claims a free entry as a one-block chain.
    pub fn allocate_chain_head(&mut self) -> Option<u16> {
        let index = self.find_free()?;
        self.entries[index as usize] = FAT_EOC;
        self.free -= 1;
        trace!("fat: new chain at {}", index);
        Some(index)
    }

    /// Appends a free entry after `tail`, which must currently end its chain.
    /// A link value of 0 reads as free, so entry 0 is never a link target.
    pub fn extend(&mut self, tail: u16) -> Result<u16> {
        if self.get(tail) != Some(FAT_EOC) {
            return Err(FsError::InvalidVolume);
        }
        let index = self.find_free_from(1).ok_or(FsError::OutOfSpace)?;
        self.entries[tail as usize] = index;
        self.entries[index as usize] = FAT_EOC;
        self.free -= 1;
        trace!("fat: {} -> {}", tail, index);
        Ok(index)
    }

    /// Number of entries in the chain starting at `head`. An empty chain has length 0.
    pub fn chain_len(&self, head: u16) -> Result<usize> {
        let mut len = 0;
        let mut cur = head;
        while cur != FAT_EOC {
            if len >= self.entries.len() {
                return Err(FsError::InvalidVolume);
            }
            cur = self.next(cur)?;
            len += 1;
        }
        Ok(len)
    }

    /// Frees every entry of the chain starting at `head`, the tail included.
    /// Returns how many entries were released.
    pub fn free_chain(&mut self, head: u16) -> Result<usize> {
        // Validate the whole chain first so a corrupt link frees nothing.
        let len = self.chain_len(head)?;
        let mut cur = head;
        for _ in 0..len {
            let next = self.entries[cur as usize];
            self.entries[cur as usize] = FAT_FREE;
            self.free += 1;
            cur = next;
        }
        trace!("fat: freed {} entries from {}", len, head);
        Ok(len)
    }
}
