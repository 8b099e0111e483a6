//! Table of open handles. Each handle pairs a directory slot with a byte offset.

use core::fmt;

use crate::config::MAX_OPEN;
use crate::error::{FsError, Result};

/// An open file handle, as returned by `FileSystem::open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fd(pub usize);

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fd{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFile {
    pub dir_index: usize,
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct FdTable {
    slots: [Option<OpenFile>; MAX_OPEN],
}

impl FdTable {
    pub fn new() -> Self {
        Self { slots: [None; MAX_OPEN] }
    }

    pub fn open(&mut self, dir_index: usize) -> Result<Fd> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(FsError::TooManyOpenFiles)?;
        self.slots[index] = Some(OpenFile { dir_index, offset: 0 });
        Ok(Fd(index))
    }

    pub fn close(&mut self, fd: Fd) -> Result<OpenFile> {
        self.slots
            .get_mut(fd.0)
            .and_then(Option::take)
            .ok_or(FsError::BadHandle)
    }

    pub fn get(&self, fd: Fd) -> Result<OpenFile> {
        self.slots
            .get(fd.0)
            .copied()
            .flatten()
            .ok_or(FsError::BadHandle)
    }

    pub fn tell(&self, fd: Fd) -> Result<usize> {
        Ok(self.get(fd)?.offset)
    }

    /// Moves the offset of `fd`. `size` is the current size of its file;
    /// seeking exactly to the end is allowed.
    pub fn seek(&mut self, fd: Fd, offset: usize, size: usize) -> Result<()> {
        let file = self.get_mut(fd)?;
        if offset > size {
            return Err(FsError::OffsetOutOfRange);
        }
        file.offset = offset;
        Ok(())
    }

    pub(crate) fn get_mut(&mut self, fd: Fd) -> Result<&mut OpenFile> {
        self.slots
            .get_mut(fd.0)
            .and_then(Option::as_mut)
            .ok_or(FsError::BadHandle)
    }

    /// Whether any open handle refers to directory slot `dir_index`.
    pub fn references(&self, dir_index: usize) -> bool {
        self.slots.iter().flatten().any(|file| file.dir_index == dir_index)
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}
