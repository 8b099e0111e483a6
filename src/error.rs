use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[error("volume signature or geometry does not match the block device")]
    InvalidVolume,
    #[error("cannot lay out a volume with the requested geometry")]
    InvalidGeometry,
    #[error("file name is empty or longer than the name limit")]
    InvalidName,
    #[error("a file with this name already exists")]
    AlreadyExists,
    #[error("no such file")]
    NotFound,
    #[error("root directory has no free slot")]
    DirectoryFull,
    #[error("handle table is full")]
    TooManyOpenFiles,
    #[error("handle is not open")]
    BadHandle,
    #[error("file is still open")]
    FileOpen,
    #[error("offset lies past the end of the file")]
    OffsetOutOfRange,
    #[error("no free data block left")]
    OutOfSpace,
    #[error("block {0} is outside the device")]
    InvalidBlockId(usize),
    #[error("block device I/O failure: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        FsError::Io(err.kind())
    }
}

pub type Result<T> = core::result::Result<T, FsError>;
