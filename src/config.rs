pub const SIGNATURE: &[u8; 8] = b"ECS150FS";

pub const BLOCK_SIZE: usize = 4096;
pub const SUPERBLOCK_ID: usize = 0; // Block ID for the superblock
pub const FAT_START: usize = 1; // FAT region always follows the superblock

pub const FAT_EOC: u16 = 0xFFFF; // End of chain sentinel
pub const FAT_FREE: u16 = 0;
pub const FAT_ENTRY_SIZE: usize = 2;
pub const FAT_ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / FAT_ENTRY_SIZE;
pub const MAX_DATA_BLOCKS: usize = 8192;

pub const MAX_FILES: usize = 128; // Slots in the root directory
pub const MAX_OPEN: usize = 32; // Slots in the handle table
pub const FILENAME_LEN: usize = 16; // Name buffer, NUL terminator included
pub const MAX_FILE_NAME_LEN: usize = FILENAME_LEN - 1;
pub const DIR_ENTRY_SIZE: usize = 32; // name + size (4) + first block (2) + padding
