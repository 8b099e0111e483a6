//! A single-volume FAT file system living inside one fixed-size block device.
//! Flat namespace, no permissions or timestamps.
//!
//! Linear layout:
//! - Superblock (block 0)
//! - File Allocation Table (blocks 1..=fat_blocks)
//! - Root directory (one block)
//! - Data blocks, one per FAT entry
//!
//! Layers (from bottom to top):
//! 1. Block Device: fixed-size block reads and writes.    | User implemented (`FileDisk` provided)
//! 2. Superblock: volume geometry, validated at mount.
//! 3. FAT / Directory: in-memory mirrors, written back after every mutation.
//! 4. Handles: open files and their offsets.
//! 5. File I/O: byte ranges mapped onto block chains through a bounce buffer.
//! 6. FileSystem: the mounted engine tying the layers together.

extern crate alloc;

mod config;
mod block_dev;
mod error;
mod structs;
mod superblock;
mod fat;
mod directory;
mod fd;
mod file;
mod fs;

pub use block_dev::{BlockDevice, FileDisk};
pub use config::*;
pub use structs::*;
pub use superblock::{read_superblock, write_superblock};
pub use fat::Fat;
pub use directory::Directory;
pub use fd::{Fd, FdTable, OpenFile};
pub use file::{fread, fwrite};
pub use fs::*;
pub use error::FsError as Error;
pub use error::Result;
