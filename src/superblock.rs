use alloc::boxed::Box;

use log::warn;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::structs::{fat_blocks_for, required_blocks, SuperBlock};
use crate::BlockDevice;

/// Reads block 0 and checks it describes a volume that fits `device`.
/// Read-only: nothing is written on failure.
pub fn read_superblock<D: BlockDevice>(device: &mut D) -> Result<SuperBlock> {
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(SUPERBLOCK_ID, buf.as_mut_slice())?;
    let superblock = SuperBlock::decode(buf.as_slice());
    check_geometry(&superblock, device.num_blocks())?;
    Ok(superblock)
}

pub fn write_superblock<D: BlockDevice>(device: &mut D, superblock: &SuperBlock) -> Result<()> {
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    superblock.encode(buf.as_mut_slice());
    device.write_block(SUPERBLOCK_ID, buf.as_slice())?;
    Ok(())
}

fn check_geometry(sb: &SuperBlock, device_blocks: usize) -> Result<()> {
    if &sb.signature != SIGNATURE {
        warn!("bad volume signature {:?}", sb.signature);
        return Err(FsError::InvalidVolume);
    }
    if sb.total_blocks as usize != device_blocks {
        warn!("volume claims {} blocks, device has {}", sb.total_blocks, device_blocks);
        return Err(FsError::InvalidVolume);
    }

    let data_blocks = sb.data_blocks as usize;
    let fat_blocks = sb.fat_blocks as usize;
    let consistent = data_blocks > 0
        && data_blocks <= MAX_DATA_BLOCKS
        && fat_blocks == fat_blocks_for(data_blocks)
        && sb.root_dir_block as usize == FAT_START + fat_blocks
        && sb.data_start as usize == sb.root_dir_block as usize + 1
        && required_blocks(data_blocks) == device_blocks;
    if !consistent {
        warn!("inconsistent volume geometry {:?}", sb);
        return Err(FsError::InvalidVolume);
    }
    Ok(())
}
