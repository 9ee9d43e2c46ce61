use thiserror::Error;

/// Broad failure classes every [`FsError`] falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    CapacityExceeded,
    InvalidArgument,
    PermissionDenied,
    NotOpen,
    InvalidImage,
    Io,
}

#[derive(Debug, Error)]
pub enum FsError {
    #[error("File not found in directory.")]
    NotFound,
    #[error("{0}: File does not exist.")]
    HostFileNotFound(String),
    #[error("Disk image filename not found.")]
    ImageNotFound,
    #[error("No files found.")]
    NoFilesFound,

    #[error("File already exists: {0}.")]
    AlreadyExists(String),
    #[error("A disk image is already open.")]
    AlreadyOpen,

    #[error("File is too large.")]
    FileTooLarge,
    #[error("Not enough free disk space.")]
    OutOfSpace,
    #[error("Can not find a free inode.")]
    OutOfInodes,
    #[error("Could not find a free directory entry.")]
    DirectoryFull,
    #[error("File has no free block slot left.")]
    InodeFull,

    #[error("Only supports filenames of up to 64 characters.")]
    NameTooLong,
    #[error("Filename must not be empty.")]
    EmptyName,
    #[error("Invalid attribute: {0}.")]
    InvalidAttribute(String),
    #[error("Invalid cipher key: {0}.")]
    InvalidKey(String),
    #[error("No {0} specified.")]
    MissingArgument(&'static str),
    #[error("Invalid parameter: {0}.")]
    InvalidParameter(String),
    #[error("Requested range {start}..{end} is outside the file ({size} bytes).")]
    OutOfBounds { start: usize, end: usize, size: usize },
    #[error("Block {0} is not a valid data block.")]
    InvalidBlockId(usize),

    #[error("File is marked read-only.")]
    ReadOnly,

    #[error("Disk image is not open.")]
    NotOpen,
    #[error("Not a valid disk image: {0}.")]
    InvalidImage(String),
    #[error("Filesystem is corrupted: {0}.")]
    Corrupted(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::NotFound
            | FsError::HostFileNotFound(_)
            | FsError::ImageNotFound
            | FsError::NoFilesFound => ErrorKind::NotFound,
            FsError::AlreadyExists(_) | FsError::AlreadyOpen => ErrorKind::AlreadyExists,
            FsError::FileTooLarge
            | FsError::OutOfSpace
            | FsError::OutOfInodes
            | FsError::DirectoryFull
            | FsError::InodeFull => ErrorKind::CapacityExceeded,
            FsError::NameTooLong
            | FsError::EmptyName
            | FsError::InvalidAttribute(_)
            | FsError::InvalidKey(_)
            | FsError::MissingArgument(_)
            | FsError::InvalidParameter(_)
            | FsError::OutOfBounds { .. }
            | FsError::InvalidBlockId(_) => ErrorKind::InvalidArgument,
            FsError::ReadOnly => ErrorKind::PermissionDenied,
            FsError::NotOpen => ErrorKind::NotOpen,
            FsError::InvalidImage(_) | FsError::Corrupted(_) => ErrorKind::InvalidImage,
            FsError::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = core::result::Result<T, FsError>;
