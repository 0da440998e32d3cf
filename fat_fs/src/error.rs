use std::fmt;
use std::io;

/// A structural fault found while walking a chain through the allocation
/// table. Either aborts the walking operation without mutating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFault {
    /// The chain revisited a block it already passed through.
    Loop { block: u16 },
    /// A link points outside the valid data-block range.
    InvalidLink { block: u16, value: u16 },
}

/// Failure outcomes of the filesystem operations.
///
/// Every operation reports exactly one of these to its caller; nothing is
/// raised across layers. `Io` wraps a backing-store access failure and is
/// fatal for the operation in progress (never retried).
#[derive(Debug)]
pub enum FsError {
    /// A path component that should name a directory does not exist.
    DirectoryNotFound,
    /// The final path component names nothing in its parent.
    NameNotFound,
    /// create/mkdir target name is already taken in the parent.
    AlreadyExists,
    /// The allocator is exhausted, or a directory block has no free slot.
    NoSpace,
    /// Empty or otherwise unusable name.
    InvalidName,
    /// unlink on a directory that still holds entries.
    NotEmpty,
    /// The path names a file where a directory is required.
    NotADirectory,
    /// Loop or out-of-range link while walking a chain.
    CorruptChain(ChainFault),
    Io(io::Error),
}

pub type FsResult<T> = Result<T, FsError>;

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::DirectoryNotFound => write!(f, "directory not found"),
            FsError::NameNotFound => write!(f, "file or directory not found"),
            FsError::AlreadyExists => write!(f, "already exists"),
            FsError::NoSpace => write!(f, "no space left on device"),
            FsError::InvalidName => write!(f, "invalid name"),
            FsError::NotEmpty => write!(f, "directory is not empty"),
            FsError::NotADirectory => write!(f, "not a directory"),
            FsError::CorruptChain(ChainFault::Loop { block }) => {
                write!(f, "loop detected in chain at block {block}")
            }
            FsError::CorruptChain(ChainFault::InvalidLink { block, value }) => {
                write!(f, "invalid table value at block {block}: {value:#06x}")
            }
            FsError::Io(e) => write!(f, "backing store i/o error: {e}"),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FsError {
    fn from(e: io::Error) -> Self {
        FsError::Io(e)
    }
}
