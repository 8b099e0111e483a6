//! Byte-range reads and writes over a file's block chain.
//! Every block is moved through a one-block bounce buffer, so a partial-block
//! write reads the block, patches the touched range and writes it back whole.

use alloc::boxed::Box;

use log::{trace, warn};

use crate::config::*;
use crate::error::{FsError, Result};
use crate::{BlockDevice, DirEntry, Fat, SuperBlock};

/// Walks `steps` links from `first_block`.
/// Returns the block reached (possibly `FAT_EOC` when the walk lands just past
/// the tail) along with the block visited before it.
fn locate(fat: &Fat, first_block: u16, steps: usize) -> Result<(Option<u16>, u16)> {
    let mut prev = None;
    let mut cur = first_block;
    for _ in 0..steps {
        if cur == FAT_EOC {
            return Err(FsError::InvalidVolume);
        }
        prev = Some(cur);
        cur = fat.next(cur)?;
    }
    Ok((prev, cur))
}

/// Reads from `entry` starting at byte `offset` into `buffer`.
/// Never reads past the file size. Returns the number of bytes read, 0 at end of file.
pub fn fread(
    device: &mut impl BlockDevice,
    superblock: &SuperBlock,
    fat: &Fat,
    entry: &DirEntry,
    offset: usize,
    buffer: &mut [u8],
) -> Result<usize> {
    let size = entry.size as usize;
    if offset >= size || buffer.is_empty() {
        return Ok(0);
    }

    let wanted = buffer.len().min(size - offset);
    let (_, mut current_block) = locate(fat, entry.first_block, offset / BLOCK_SIZE)?;
    let mut block_offset = offset % BLOCK_SIZE;
    let mut bytes_read = 0;
    let mut bounce = Box::new([0u8; BLOCK_SIZE]);

    while bytes_read < wanted && current_block != FAT_EOC {
        device.read_block(superblock.data_block_id(current_block), bounce.as_mut_slice())?;
        let bytes_to_read = (wanted - bytes_read).min(BLOCK_SIZE - block_offset);
        buffer[bytes_read..bytes_read + bytes_to_read]
            .copy_from_slice(&bounce[block_offset..block_offset + bytes_to_read]);
        trace!("read {} bytes from data block {}", bytes_to_read, current_block);

        bytes_read += bytes_to_read;
        block_offset = 0;
        current_block = fat.next(current_block)?;
    }

    Ok(bytes_read)
}

/// Writes `buffer` into `entry` starting at byte `offset`, growing the chain as needed.
/// `entry` carries the updated size and first block on return; persisting it and
/// the FAT is the caller's job. When the FAT runs out the write stops short and the
/// bytes stored so far are reported.
pub fn fwrite(
    device: &mut impl BlockDevice,
    superblock: &SuperBlock,
    fat: &mut Fat,
    entry: &mut DirEntry,
    offset: usize,
    buffer: &[u8],
) -> Result<usize> {
    if buffer.is_empty() {
        return Ok(0);
    }

    if entry.first_block != FAT_EOC {
        return write_chain(device, superblock, fat, entry, offset, buffer);
    }

    let Some(head) = fat.allocate_chain_head() else {
        warn!("no free block for {}, nothing written", entry.name);
        return Ok(0);
    };
    entry.first_block = head;
    write_chain(device, superblock, fat, entry, offset, buffer).inspect_err(|_| {
        // Nothing of the new chain reached the directory; give its blocks back.
        let _ = fat.free_chain(head);
        entry.first_block = FAT_EOC;
    })
}

fn write_chain(
    device: &mut impl BlockDevice,
    superblock: &SuperBlock,
    fat: &mut Fat,
    entry: &mut DirEntry,
    offset: usize,
    buffer: &[u8],
) -> Result<usize> {
    let (mut prev_block, mut current_block) = locate(fat, entry.first_block, offset / BLOCK_SIZE)?;
    let mut block_offset = offset % BLOCK_SIZE;
    let mut bytes_written = 0;
    let mut bounce = Box::new([0u8; BLOCK_SIZE]);

    while bytes_written < buffer.len() {
        if current_block == FAT_EOC {
            let tail = prev_block.ok_or(FsError::InvalidVolume)?;
            match fat.extend(tail) {
                Ok(next) => current_block = next,
                Err(FsError::OutOfSpace) => {
                    warn!(
                        "FAT exhausted writing {}: {} of {} bytes stored",
                        entry.name,
                        bytes_written,
                        buffer.len()
                    );
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let block_id = superblock.data_block_id(current_block);
        let bytes_to_write = (buffer.len() - bytes_written).min(BLOCK_SIZE - block_offset);
        device.read_block(block_id, bounce.as_mut_slice())?;
        bounce[block_offset..block_offset + bytes_to_write]
            .copy_from_slice(&buffer[bytes_written..bytes_written + bytes_to_write]);
        device.write_block(block_id, bounce.as_slice())?;
        trace!("wrote {} bytes to data block {}", bytes_to_write, current_block);

        bytes_written += bytes_to_write;
        block_offset = 0;
        prev_block = Some(current_block);
        current_block = fat.next(current_block)?;
    }

    let end = offset + bytes_written;
    if end > entry.size as usize {
        entry.size = end as u32;
    }
    Ok(bytes_written)
}
