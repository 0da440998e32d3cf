//! A FAT-style filesystem inside a single flat backing file.
//!
//! The volume is 2048 blocks of 1024 bytes: an allocation table in the first
//! four blocks, the root directory in the fifth, data and subdirectory
//! blocks after that. Files and directories are chains of blocks linked
//! through the table; directories are a single block of 32 fixed-size
//! records each.
//!
//! ```no_run
//! use fat_fs::{FileDisk, FileSystem};
//!
//! # fn main() -> Result<(), fat_fs::FsError> {
//! let mut fs = FileSystem::new(FileDisk::new("filesystem.dat"));
//! fs.initialize()?;
//! fs.mkdir("/docs")?;
//! fs.create("/docs/notes")?;
//! fs.write("/docs/notes", b"hello")?;
//! assert_eq!(fs.read("/docs/notes")?, b"hello");
//! # Ok(())
//! # }
//! ```

pub mod check;
pub mod dir;
pub mod error;
pub mod fat;
pub mod fs;
pub mod params;
pub mod path;
pub mod store;

pub use check::{CheckReport, Finding};
pub use error::{ChainFault, FsError, FsResult};
pub use fs::{EntryKind, FileSystem, ListEntry, Stats, TreeNode};
pub use store::{BlockDevice, FileDisk, MemDisk};
