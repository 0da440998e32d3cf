//! Structural consistency validation.
//!
//! Re-derives "which blocks should be in use" by walking the directory tree
//! from the root, then cross-checks that against the allocation table. Never
//! mutates, never stops at the first problem; every finding is collected and
//! the walk continues.

use std::fmt;

use log::warn;

use crate::dir;
use crate::error::FsResult;
use crate::fat::{AllocTable, FatEntry};
use crate::params::{BLOCK_SIZE, BLOCKS, DIR_ENTRIES, FAT_BLOCKS, ROOT_BLOCK};
use crate::store::BlockDevice;

/// One detected inconsistency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// An entry's first block lies outside the valid data range.
    InvalidFirstBlock { name: String, block: u32 },
    /// A block is claimed by more than one entry or chain.
    BlockAlreadyUsed { block: u16 },
    /// A file chain ran into a non-terminator before its end-of-chain mark.
    ChainTerminatedImproperly { name: String },
    /// A file's chain capacity cannot hold its recorded size.
    SizeMismatch { name: String, capacity: usize, size: u32 },
    /// The table says in-use, but no directory entry reaches the block.
    OrphanBlock { block: u16 },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::InvalidFirstBlock { name, block } => {
                write!(f, "entry '{name}' has invalid first block {block}")
            }
            Finding::BlockAlreadyUsed { block } => {
                write!(f, "block {block} is already used")
            }
            Finding::ChainTerminatedImproperly { name } => {
                write!(f, "file '{name}' chain terminated improperly")
            }
            Finding::SizeMismatch { name, capacity, size } => {
                write!(f, "file '{name}' size mismatch: {capacity} block bytes < size {size}")
            }
            Finding::OrphanBlock { block } => {
                write!(f, "block {block} is allocated but not referenced")
            }
        }
    }
}

/// Everything a single validation pass found.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn is_consistent(&self) -> bool {
        self.findings.is_empty()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consistent() {
            return write!(f, "filesystem is consistent");
        }
        for (i, finding) in self.findings.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "inconsistency: {finding}")?;
        }
        Ok(())
    }
}

// ─── Validation pass ───────────────────────────────────────────────────────────

/// Walk the tree from the root and cross-check against `table`.
pub fn run(dev: &mut impl BlockDevice, table: &AllocTable) -> FsResult<CheckReport> {
    let mut used = vec![false; BLOCKS];
    for block in 0..FAT_BLOCKS {
        used[block] = true;
    }

    let mut report = CheckReport::default();
    check_directory(dev, table, ROOT_BLOCK, &mut used, &mut report)?;

    // Anything the table holds in-use that the tree never reached leaked.
    for block in 0..BLOCKS {
        if table.get(block as u16) != FatEntry::Free && !used[block] {
            report.findings.push(Finding::OrphanBlock { block: block as u16 });
        }
    }

    if !report.is_consistent() {
        warn!("consistency check: {} finding(s)", report.findings.len());
    }
    Ok(report)
}

fn check_directory(
    dev: &mut impl BlockDevice,
    table: &AllocTable,
    dir_block: u16,
    used: &mut [bool],
    report: &mut CheckReport,
) -> FsResult<()> {
    used[dir_block as usize] = true;

    for slot in 0..DIR_ENTRIES {
        let entry = dir::read_entry(dev, dir_block, slot)?;
        if entry.is_empty() {
            continue;
        }

        let first = entry.first_block;
        if first == 0 || first >= BLOCKS as u32 {
            report
                .findings
                .push(Finding::InvalidFirstBlock { name: entry.name_string(), block: first });
            continue;
        }
        let first = first as u16;

        if used[first as usize] {
            report.findings.push(Finding::BlockAlreadyUsed { block: first });
            continue;
        }

        if entry.is_file() {
            check_file_chain(table, first, entry.size, &entry.name_string(), used, report);
        } else {
            check_directory(dev, table, first, used, report)?;
        }
    }
    Ok(())
}

/// Walk one file chain, marking blocks and summing capacity. The walk cannot
/// spin: a revisited block trips the already-used finding and stops.
fn check_file_chain(
    table: &AllocTable,
    first: u16,
    size: u32,
    name: &str,
    used: &mut [bool],
    report: &mut CheckReport,
) {
    let mut current = first;
    let mut capacity = 0usize;

    loop {
        if used[current as usize] {
            report.findings.push(Finding::BlockAlreadyUsed { block: current });
            break;
        }
        used[current as usize] = true;
        capacity += BLOCK_SIZE;

        match table.get(current) {
            FatEntry::EndOfChain => break,
            FatEntry::Next(n) if (n as usize) < BLOCKS => current = n,
            _ => {
                // Free, reserved, or out-of-range: the chain has no proper end.
                report
                    .findings
                    .push(Finding::ChainTerminatedImproperly { name: name.to_string() });
                break;
            }
        }
    }

    if capacity < size as usize {
        report.findings.push(Finding::SizeMismatch { name: name.to_string(), capacity, size });
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
