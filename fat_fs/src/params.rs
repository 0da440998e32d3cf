//! Volume geometry. All of these are fixed at compile time and the on-disk
//! layout depends on every one of them; changing a value reformats the world.

/// Bytes per block, the unit of every device transfer.
pub const BLOCK_SIZE: usize = 1024;

/// Total addressable blocks in the volume (2 MiB backing file).
pub const BLOCKS: usize = 2048;

/// Each allocation-table entry is one unsigned 16-bit value.
pub const FAT_ENTRY_SIZE: usize = 2;

/// Blocks occupied by the allocation table itself, at the start of the volume.
pub const FAT_BLOCKS: usize = (BLOCKS * FAT_ENTRY_SIZE).div_ceil(BLOCK_SIZE);

/// The root directory lives in the first block after the allocation table.
/// It is never referenced by any directory entry, only by this constant.
pub const ROOT_BLOCK: u16 = FAT_BLOCKS as u16;

/// Fixed size of one directory record.
pub const DIR_ENTRY_SIZE: usize = 32;

/// Directory slots per block.
pub const DIR_ENTRIES: usize = BLOCK_SIZE / DIR_ENTRY_SIZE;

/// Name field width: 32 bytes minus attributes (1), first_block (4), size (4).
pub const FILENAME_LEN: usize = DIR_ENTRY_SIZE - 1 - 4 - 4;
