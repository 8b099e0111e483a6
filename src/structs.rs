//! On-disk records and the snapshots handed out to callers.
//!
//! Every record is encoded field by field in little-endian byte order.
//! Superblock (block 0):
//! - 0..8   signature
//! - 8..10  total block count
//! - 10..12 root directory block
//! - 12..14 data region start
//! - 14..16 data block count
//! - 16     FAT block count
//! - rest   zero padding
//!
//! Directory record (`DIR_ENTRY_SIZE` bytes, `MAX_FILES` per block):
//! - 0..16  name, NUL padded
//! - 16..20 size in bytes
//! - 20..22 first data block index
//! - rest   zero padding

use alloc::string::String;
use core::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::config::*;
use crate::error::{FsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub signature: [u8; 8],
    pub total_blocks: u16,
    pub root_dir_block: u16,
    pub data_start: u16,
    pub data_blocks: u16,
    pub fat_blocks: u8,
}

impl SuperBlock {
    /// Lays out a fresh volume with `data_blocks` data blocks.
    pub fn new(data_blocks: usize) -> Result<Self> {
        if data_blocks == 0 || data_blocks > MAX_DATA_BLOCKS {
            return Err(FsError::InvalidGeometry);
        }
        let fat_blocks = fat_blocks_for(data_blocks);
        let total_blocks = required_blocks(data_blocks);
        Ok(Self {
            signature: *SIGNATURE,
            total_blocks: total_blocks as u16,
            root_dir_block: (FAT_START + fat_blocks) as u16,
            data_start: (FAT_START + fat_blocks + 1) as u16,
            data_blocks: data_blocks as u16,
            fat_blocks: fat_blocks as u8,
        })
    }

    pub fn decode(buf: &[u8]) -> Self {
        let mut signature = [0u8; 8];
        signature.copy_from_slice(&buf[0..8]);
        Self {
            signature,
            total_blocks: LittleEndian::read_u16(&buf[8..10]),
            root_dir_block: LittleEndian::read_u16(&buf[10..12]),
            data_start: LittleEndian::read_u16(&buf[12..14]),
            data_blocks: LittleEndian::read_u16(&buf[14..16]),
            fat_blocks: buf[16],
        }
    }

    pub fn encode(&self, buf: &mut [u8]) {
        buf.fill(0);
        buf[0..8].copy_from_slice(&self.signature);
        LittleEndian::write_u16(&mut buf[8..10], self.total_blocks);
        LittleEndian::write_u16(&mut buf[10..12], self.root_dir_block);
        LittleEndian::write_u16(&mut buf[12..14], self.data_start);
        LittleEndian::write_u16(&mut buf[14..16], self.data_blocks);
        buf[16] = self.fat_blocks;
    }

    pub fn fat_range(&self) -> core::ops::Range<usize> {
        FAT_START..FAT_START + self.fat_blocks as usize
    }

    /// Absolute block id of the data block at FAT index `index`.
    pub fn data_block_id(&self, index: u16) -> usize {
        self.data_start as usize + index as usize
    }
}

/// Number of FAT blocks needed to describe `data_blocks` entries.
pub fn fat_blocks_for(data_blocks: usize) -> usize {
    (data_blocks * FAT_ENTRY_SIZE).div_ceil(BLOCK_SIZE)
}

/// Number of device blocks a volume with `data_blocks` data blocks occupies:
/// superblock, FAT, root directory and data region.
pub fn required_blocks(data_blocks: usize) -> usize {
    1 + fat_blocks_for(data_blocks) + 1 + data_blocks
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub size: u32,
    pub first_block: u16,
}

impl DirEntry {
    pub fn new(name: &str) -> Result<Self> {
        validate_name(name)?;
        Ok(Self {
            name: String::from(name),
            size: 0,
            first_block: FAT_EOC,
        })
    }

    /// Decodes one record. An empty name marks a free slot.
    pub fn decode(record: &[u8]) -> Result<Option<Self>> {
        let name_buf = &record[..FILENAME_LEN];
        if name_buf[0] == 0 {
            return Ok(None);
        }
        let name_len = name_buf.iter().position(|&c| c == 0).ok_or(FsError::InvalidVolume)?;
        let name = core::str::from_utf8(&name_buf[..name_len]).map_err(|_| FsError::InvalidVolume)?;
        Ok(Some(Self {
            name: String::from(name),
            size: LittleEndian::read_u32(&record[16..20]),
            first_block: LittleEndian::read_u16(&record[20..22]),
        }))
    }

    pub fn encode(entry: Option<&Self>, record: &mut [u8]) {
        record.fill(0);
        if let Some(entry) = entry {
            record[..entry.name.len()].copy_from_slice(entry.name.as_bytes());
            LittleEndian::write_u32(&mut record[16..20], entry.size);
            LittleEndian::write_u16(&mut record[20..22], entry.first_block);
        }
    }
}

/// A name must fit in the name buffer with its NUL terminator.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_FILE_NAME_LEN || name.as_bytes().contains(&0) {
        return Err(FsError::InvalidName);
    }
    Ok(())
}

/// One line of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub name: String,
    pub size: u32,
    pub first_block: u16,
}

impl From<&DirEntry> for FileStat {
    fn from(entry: &DirEntry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            first_block: entry.first_block,
        }
    }
}

impl fmt::Display for FileStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file: {}, size: {}, data_blk: {}", self.name, self.size, self.first_block)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeInfo {
    pub total_blocks: usize,
    pub fat_blocks: usize,
    pub root_dir_block: usize,
    pub data_start: usize,
    pub data_blocks: usize,
    pub fat_free: usize,
    pub dir_free: usize,
    pub dir_slots: usize,
}

impl fmt::Display for VolumeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FS Info:")?;
        writeln!(f, "total_blk_count={}", self.total_blocks)?;
        writeln!(f, "fat_blk_count={}", self.fat_blocks)?;
        writeln!(f, "rdir_blk={}", self.root_dir_block)?;
        writeln!(f, "data_blk={}", self.data_start)?;
        writeln!(f, "data_blk_count={}", self.data_blocks)?;
        writeln!(f, "fat_free_ratio={}/{}", self.fat_free, self.data_blocks)?;
        write!(f, "rdir_free_ratio={}/{}", self.dir_free, self.dir_slots)
    }
}
