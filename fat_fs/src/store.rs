//! Block-level access to the backing store.
//!
//! Everything above this layer addresses whole blocks by index; this is the
//! only module that turns an index into a byte offset. One positioned
//! transfer per call, no caching, no partial blocks.

use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::FsResult;
use crate::params::{BLOCK_SIZE, BLOCKS};

// ─── Device abstraction ────────────────────────────────────────────────────────

/// A fixed-geometry array of `BLOCKS` blocks of `BLOCK_SIZE` bytes.
///
/// The buffer type makes short transfers unrepresentable; an out-of-range
/// index is reported as an i/o fault.
pub trait BlockDevice {
    fn read_block(&mut self, index: u16, buf: &mut [u8; BLOCK_SIZE]) -> FsResult<()>;
    fn write_block(&mut self, index: u16, buf: &[u8; BLOCK_SIZE]) -> FsResult<()>;

    /// Overwrite one block with zeroes.
    fn zero_block(&mut self, index: u16) -> FsResult<()> {
        self.write_block(index, &[0u8; BLOCK_SIZE])
    }

    /// Zero-fill the whole volume. Bulk convenience for `initialize`, not
    /// something any per-allocation path should reach for.
    fn zero_all(&mut self) -> FsResult<()> {
        for index in 0..BLOCKS as u16 {
            self.zero_block(index)?;
        }
        Ok(())
    }
}

fn check_index(index: u16) -> FsResult<u64> {
    if (index as usize) < BLOCKS {
        Ok(index as u64 * BLOCK_SIZE as u64)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("block index {index} out of range"),
        )
        .into())
    }
}

// ─── Flat-file backend ─────────────────────────────────────────────────────────

/// Production backend: a single flat file on the host filesystem.
///
/// Each call opens the file, performs one seek plus one exact-size transfer,
/// and drops the handle before returning. A write interrupted mid-transfer
/// leaves the volume corrupted; there is no journal, only the consistency
/// checker's detection.
pub struct FileDisk {
    path: PathBuf,
}

impl FileDisk {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> io::Result<std::fs::File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)
    }
}

impl BlockDevice for FileDisk {
    fn read_block(&mut self, index: u16, buf: &mut [u8; BLOCK_SIZE]) -> FsResult<()> {
        let offset = check_index(index)?;
        let mut file = self.open()?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&mut self, index: u16, buf: &[u8; BLOCK_SIZE]) -> FsResult<()> {
        let offset = check_index(index)?;
        let mut file = self.open()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(())
    }
}

// ─── In-memory backend ─────────────────────────────────────────────────────────

/// A `Vec`-backed volume for ephemeral filesystems and unit tests.
pub struct MemDisk {
    data: Vec<u8>,
}

impl MemDisk {
    pub fn new() -> Self {
        Self { data: vec![0u8; BLOCKS * BLOCK_SIZE] }
    }

    /// Raw volume bytes, for byte-level assertions.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for MemDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&mut self, index: u16, buf: &mut [u8; BLOCK_SIZE]) -> FsResult<()> {
        let offset = check_index(index)? as usize;
        buf.copy_from_slice(&self.data[offset..offset + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&mut self, index: u16, buf: &[u8; BLOCK_SIZE]) -> FsResult<()> {
        let offset = check_index(index)? as usize;
        self.data[offset..offset + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
