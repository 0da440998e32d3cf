//! File and directory operations over one mounted volume.
//!
//! `FileSystem` owns the block device, the allocation table, and the working
//! directory. Every mutating operation saves the table before reporting
//! success; a reload then sees exactly what the caller was told.

use std::collections::HashSet;

use log::{debug, info};

use crate::check::{self, CheckReport};
use crate::dir::{self, DirEntry};
use crate::error::{ChainFault, FsError, FsResult};
use crate::fat::{AllocTable, FatEntry};
use crate::params::{BLOCK_SIZE, BLOCKS, DIR_ENTRIES, ROOT_BLOCK};
use crate::path;
use crate::store::BlockDevice;

/// What a directory slot holds, as reported by `list` and `tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One row of a directory listing.
#[derive(Debug, Clone)]
pub struct ListEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u32,
}

/// One node of the recursive `tree` listing.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub kind: EntryKind,
    pub children: Vec<TreeNode>,
}

/// Block accounting snapshot. `used + free == total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub total_blocks: usize,
    pub used_blocks: usize,
    pub free_blocks: usize,
    pub block_size: usize,
}

// ─── Filesystem ────────────────────────────────────────────────────────────────

pub struct FileSystem<D: BlockDevice> {
    dev: D,
    table: AllocTable,
    current_dir: u16,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Wrap a device. The table is blank until `initialize` or `load`.
    pub fn new(dev: D) -> Self {
        Self { dev, table: AllocTable::new(), current_dir: ROOT_BLOCK }
    }

    pub fn current_dir(&self) -> u16 {
        self.current_dir
    }

    /// Format the volume: zero every block, then lay down a fresh table
    /// (reserved table blocks, end-of-chain root, everything else free).
    pub fn initialize(&mut self) -> FsResult<()> {
        self.dev.zero_all()?;
        self.table.reset();
        self.table.save(&mut self.dev)?;
        self.current_dir = ROOT_BLOCK;
        info!("filesystem initialized: {} blocks of {} bytes", BLOCKS, BLOCK_SIZE);
        Ok(())
    }

    /// Read the table back from an existing volume.
    pub fn load(&mut self) -> FsResult<()> {
        self.table.load(&mut self.dev)?;
        self.current_dir = ROOT_BLOCK;
        info!("filesystem loaded, {} blocks free", self.table.count_free());
        Ok(())
    }

    // ─── Directory operations ──────────────────────────────────────────────

    /// Create a directory at `path`. The parent walk matches directory
    /// entries only; a missing intermediate is `DirectoryNotFound`.
    pub fn mkdir(&mut self, p: &str) -> FsResult<()> {
        let name = path::file_name(p).ok_or(FsError::InvalidName)?;
        let parent = path::resolve_parent(&mut self.dev, self.current_dir, p)?
            .ok_or(FsError::DirectoryNotFound)?;

        if self.find_slot_by_name(parent, name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }

        let block = self.table.allocate().ok_or(FsError::NoSpace)?;
        let Some(slot) = self.find_empty_slot(parent)? else {
            // Leave no trace when the parent is full.
            self.table.free(block);
            return Err(FsError::NoSpace);
        };

        dir::write_entry(&mut self.dev, parent, slot, &DirEntry::new_dir(name, block))?;
        self.dev.zero_block(block)?;
        self.table.save(&mut self.dev)?;
        debug!("mkdir {p}: block {block}, parent {parent} slot {slot}");
        Ok(())
    }

    /// Create an empty file at `path`, claiming one block for it.
    pub fn create(&mut self, p: &str) -> FsResult<()> {
        let parent = path::resolve_parent(&mut self.dev, self.current_dir, p)?
            .ok_or(FsError::DirectoryNotFound)?;
        let name = path::file_name(p).ok_or(FsError::InvalidName)?;

        if self.find_slot_by_name(parent, name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }

        let block = self.table.allocate().ok_or(FsError::NoSpace)?;
        let Some(slot) = self.find_empty_slot(parent)? else {
            self.table.free(block);
            return Err(FsError::NoSpace);
        };

        dir::write_entry(&mut self.dev, parent, slot, &DirEntry::new_file(name, block))?;
        self.table.save(&mut self.dev)?;
        debug!("create {p}: block {block}, parent {parent} slot {slot}");
        Ok(())
    }

    /// Delete a file or an empty directory, releasing its chain. The slot's
    /// attribute byte is cleared in place; the other bytes stay stale until
    /// the slot is reused.
    pub fn unlink(&mut self, p: &str) -> FsResult<()> {
        let parent = path::resolve_parent(&mut self.dev, self.current_dir, p)?
            .ok_or(FsError::DirectoryNotFound)?;
        let name = path::file_name(p).ok_or(FsError::InvalidName)?;
        let (slot, mut entry) = self
            .find_slot_by_name(parent, name)?
            .ok_or(FsError::NameNotFound)?;

        if entry.is_dir() && !self.is_directory_empty(entry.first_block as u16)? {
            return Err(FsError::NotEmpty);
        }

        self.table.free_chain(entry.first_block as u16);
        entry.attributes = dir::ATTR_EMPTY;
        dir::write_entry(&mut self.dev, parent, slot, &entry)?;
        self.table.save(&mut self.dev)?;
        debug!("unlink {p}: parent {parent} slot {slot}");
        Ok(())
    }

    /// Move the working directory. `/` alone selects the root.
    pub fn change_dir(&mut self, p: &str) -> FsResult<()> {
        let block = path::resolve_dir(&mut self.dev, self.current_dir, p)?
            .ok_or(FsError::DirectoryNotFound)?;
        self.current_dir = block;
        Ok(())
    }

    // ─── File data operations ──────────────────────────────────────────────

    /// Replace a file's contents. The old chain is released first, then a
    /// fresh chain is allocated chunk by chunk. Exhaustion mid-write leaves
    /// the partial chain in place; the table is still saved so the damage
    /// is visible to the consistency checker rather than hidden.
    pub fn write(&mut self, p: &str, data: &[u8]) -> FsResult<()> {
        let (parent, slot, mut entry) = self.find_file(p)?;

        self.table.free_chain(entry.first_block as u16);

        let first = match self.table.allocate() {
            Some(b) => b,
            None => {
                self.table.save(&mut self.dev)?;
                return Err(FsError::NoSpace);
            }
        };
        entry.first_block = first as u32;

        self.write_chain(first, data)?;

        entry.size = data.len() as u32;
        dir::write_entry(&mut self.dev, parent, slot, &entry)?;
        self.table.save(&mut self.dev)?;
        debug!("write {p}: {} bytes from block {first}", data.len());
        Ok(())
    }

    /// Append to a file: fill the free tail of its last block, then extend
    /// the chain like `write`. A full last block has no free tail; the
    /// first new byte goes into a freshly linked block.
    pub fn append(&mut self, p: &str, data: &[u8]) -> FsResult<()> {
        let (parent, slot, mut entry) = self.find_file(p)?;

        let last = self.walk_to_last_block(entry.first_block as u16)?;

        let size = entry.size as usize;
        let free_tail = match size % BLOCK_SIZE {
            0 if size > 0 => 0,
            rem => BLOCK_SIZE - rem,
        };

        let mut offset = 0;
        if free_tail > 0 && !data.is_empty() {
            let take = free_tail.min(data.len());
            let mut buf = [0u8; BLOCK_SIZE];
            self.dev.read_block(last, &mut buf)?;
            let at = BLOCK_SIZE - free_tail;
            buf[at..at + take].copy_from_slice(&data[..take]);
            self.dev.write_block(last, &buf)?;
            offset = take;
        }

        let mut current = last;
        while offset < data.len() {
            let next = match self.table.allocate() {
                Some(b) => b,
                None => {
                    self.table.save(&mut self.dev)?;
                    return Err(FsError::NoSpace);
                }
            };
            self.table.set(current, FatEntry::Next(next));
            current = next;

            let take = (data.len() - offset).min(BLOCK_SIZE);
            let mut buf = [0u8; BLOCK_SIZE];
            buf[..take].copy_from_slice(&data[offset..offset + take]);
            self.dev.write_block(current, &buf)?;
            offset += take;
        }
        self.table.set(current, FatEntry::EndOfChain);

        entry.size += data.len() as u32;
        dir::write_entry(&mut self.dev, parent, slot, &entry)?;
        self.table.save(&mut self.dev)?;
        debug!("append {p}: {} bytes, last block {current}", data.len());
        Ok(())
    }

    /// Read a file's contents, following its chain for exactly `size` bytes.
    pub fn read(&mut self, p: &str) -> FsResult<Vec<u8>> {
        let (_, _, entry) = self.find_file(p)?;

        let mut out = Vec::with_capacity(entry.size as usize);
        let mut remaining = entry.size as usize;
        let mut current = entry.first_block as u16;

        while remaining > 0 && current != 0 && (current as usize) < BLOCKS {
            let mut buf = [0u8; BLOCK_SIZE];
            self.dev.read_block(current, &mut buf)?;
            let take = remaining.min(BLOCK_SIZE);
            out.extend_from_slice(&buf[..take]);
            remaining -= take;

            match self.table.get(current) {
                FatEntry::Next(n) => current = n,
                _ => break,
            }
        }
        Ok(out)
    }

    // ─── Read-only reporting ───────────────────────────────────────────────

    /// Entries of the directory at `path`, or of the working directory.
    pub fn list(&mut self, p: Option<&str>) -> FsResult<Vec<ListEntry>> {
        let block = match p {
            Some(p) if !p.is_empty() => path::resolve(&mut self.dev, self.current_dir, p)?
                .ok_or(FsError::DirectoryNotFound)?,
            _ => self.current_dir,
        };

        let mut entries = Vec::new();
        for slot in 0..DIR_ENTRIES {
            let entry = dir::read_entry(&mut self.dev, block, slot)?;
            if entry.is_empty() {
                continue;
            }
            entries.push(ListEntry {
                name: entry.name_string(),
                kind: if entry.is_dir() { EntryKind::Directory } else { EntryKind::File },
                size: entry.size,
            });
        }
        Ok(entries)
    }

    /// Nested listing rooted at the working directory.
    pub fn tree(&mut self) -> FsResult<Vec<TreeNode>> {
        self.tree_at(self.current_dir)
    }

    fn tree_at(&mut self, block: u16) -> FsResult<Vec<TreeNode>> {
        let mut nodes = Vec::new();
        for slot in 0..DIR_ENTRIES {
            let entry = dir::read_entry(&mut self.dev, block, slot)?;
            if entry.is_empty() {
                continue;
            }
            let node = if entry.is_dir() {
                TreeNode {
                    name: entry.name_string(),
                    kind: EntryKind::Directory,
                    children: self.tree_at(entry.first_block as u16)?,
                }
            } else {
                TreeNode { name: entry.name_string(), kind: EntryKind::File, children: Vec::new() }
            };
            nodes.push(node);
        }
        Ok(nodes)
    }

    pub fn stats(&self) -> Stats {
        let free = self.table.count_free();
        Stats {
            total_blocks: BLOCKS,
            used_blocks: BLOCKS - free,
            free_blocks: free,
            block_size: BLOCK_SIZE,
        }
    }

    /// Structural validation: directory-tree reachability cross-checked
    /// against the table. Read-only, reports every finding.
    pub fn check(&mut self) -> FsResult<CheckReport> {
        check::run(&mut self.dev, &self.table)
    }

    // ─── Internals ─────────────────────────────────────────────────────────

    /// Locate the file entry named by `path` in its parent directory.
    fn find_file(&mut self, p: &str) -> FsResult<(u16, usize, DirEntry)> {
        let parent = path::resolve_parent(&mut self.dev, self.current_dir, p)?
            .ok_or(FsError::DirectoryNotFound)?;
        let name = path::file_name(p).ok_or(FsError::InvalidName)?;
        for slot in 0..DIR_ENTRIES {
            let entry = dir::read_entry(&mut self.dev, parent, slot)?;
            if entry.is_file() && entry.matches_name(name) {
                return Ok((parent, slot, entry));
            }
        }
        Err(FsError::NameNotFound)
    }

    /// First slot whose (non-empty) entry carries `name`, any attribute.
    fn find_slot_by_name(&mut self, block: u16, name: &str) -> FsResult<Option<(usize, DirEntry)>> {
        for slot in 0..DIR_ENTRIES {
            let entry = dir::read_entry(&mut self.dev, block, slot)?;
            if entry.matches_name(name) {
                return Ok(Some((slot, entry)));
            }
        }
        Ok(None)
    }

    fn find_empty_slot(&mut self, block: u16) -> FsResult<Option<usize>> {
        for slot in 0..DIR_ENTRIES {
            if dir::read_entry(&mut self.dev, block, slot)?.is_empty() {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }

    fn is_directory_empty(&mut self, block: u16) -> FsResult<bool> {
        for slot in 0..DIR_ENTRIES {
            if !dir::read_entry(&mut self.dev, block, slot)?.is_empty() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Follow a chain to its final block, rejecting loops and links that
    /// point outside the volume. Fails without having mutated anything.
    fn walk_to_last_block(&mut self, first: u16) -> FsResult<u16> {
        let mut visited = HashSet::new();
        let mut current = first;
        loop {
            match self.table.get(current) {
                FatEntry::EndOfChain => return Ok(current),
                FatEntry::Next(n) if n > 0 && (n as usize) < BLOCKS => {
                    if !visited.insert(current) {
                        return Err(FsError::CorruptChain(ChainFault::Loop { block: current }));
                    }
                    current = n;
                }
                other => {
                    return Err(FsError::CorruptChain(ChainFault::InvalidLink {
                        block: current,
                        value: other.to_raw(),
                    }));
                }
            }
        }
    }

    /// Write `data` over a fresh chain starting at the already-allocated
    /// `first`, linking further blocks as needed. Zero bytes write nothing:
    /// the single allocated block simply stays end-of-chain.
    fn write_chain(&mut self, first: u16, data: &[u8]) -> FsResult<()> {
        let mut current = first;
        let mut offset = 0;
        while offset < data.len() {
            let take = (data.len() - offset).min(BLOCK_SIZE);
            let mut buf = [0u8; BLOCK_SIZE];
            buf[..take].copy_from_slice(&data[offset..offset + take]);
            self.dev.write_block(current, &buf)?;
            offset += take;

            if offset < data.len() {
                let next = match self.table.allocate() {
                    Some(b) => b,
                    None => {
                        self.table.save(&mut self.dev)?;
                        return Err(FsError::NoSpace);
                    }
                };
                self.table.set(current, FatEntry::Next(next));
                current = next;
            }
        }
        Ok(())
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
