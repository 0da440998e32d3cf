//! Slash-delimited path descent over directory blocks.
//!
//! A path starting with `/` walks from the root block, anything else from
//! the caller-supplied current directory. Empty components and `.` are
//! skipped. `..` is accepted but deliberately does not ascend; the volume
//! stores no parent links, so the component is a syntactic no-op.

use crate::dir::{self, DirEntry};
use crate::error::FsResult;
use crate::params::{DIR_ENTRIES, ROOT_BLOCK};
use crate::store::BlockDevice;

/// Resolve a path to the block it names: a directory's block, or, for a
/// file, its first data block. A file match wins immediately and any
/// trailing components after it are ignored. `Ok(None)` means not found.
pub fn resolve(dev: &mut impl BlockDevice, current: u16, path: &str) -> FsResult<Option<u16>> {
    let (mut block, rest) = start_block(current, path);
    for component in components(rest) {
        if is_noop(component) {
            continue;
        }
        match find_named(dev, block, component)? {
            Some(entry) if entry.is_dir() => block = entry.first_block as u16,
            Some(entry) => return Ok(Some(entry.first_block as u16)),
            None => return Ok(None),
        }
    }
    Ok(Some(block))
}

/// Resolve the directory that should contain the path's final component.
/// The final component itself is not validated, or even looked at.
pub fn resolve_parent(dev: &mut impl BlockDevice, current: u16, path: &str) -> FsResult<Option<u16>> {
    let (mut block, rest) = start_block(current, path);
    let parts = components(rest);
    let parent_parts = &parts[..parts.len().saturating_sub(1)];
    for &component in parent_parts {
        if is_noop(component) {
            continue;
        }
        match find_named_dir(dev, block, component)? {
            Some(entry) => block = entry.first_block as u16,
            None => return Ok(None),
        }
    }
    Ok(Some(block))
}

/// Resolve a path that must name a directory at every step, the `cd` walk.
pub fn resolve_dir(dev: &mut impl BlockDevice, current: u16, path: &str) -> FsResult<Option<u16>> {
    let (mut block, rest) = start_block(current, path);
    for component in components(rest) {
        if is_noop(component) {
            continue;
        }
        match find_named_dir(dev, block, component)? {
            Some(entry) => block = entry.first_block as u16,
            None => return Ok(None),
        }
    }
    Ok(Some(block))
}

/// The final path component, the name an operation creates or deletes.
pub fn file_name(path: &str) -> Option<&str> {
    components(path).last().copied().filter(|c| !c.is_empty() && *c != "." && *c != "..")
}

// ─── Walk internals ────────────────────────────────────────────────────────────

fn start_block(current: u16, path: &str) -> (u16, &str) {
    match path.strip_prefix('/') {
        Some(rest) => (ROOT_BLOCK, rest),
        None => (current, path),
    }
}

/// Split into components, discarding trailing empties so `a/b/` and `a/b`
/// walk identically.
fn components(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = path.split('/').collect();
    while parts.last() == Some(&"") {
        parts.pop();
    }
    parts
}

fn is_noop(component: &str) -> bool {
    component.is_empty() || component == "." || component == ".."
}

/// First non-empty slot whose name matches, any attribute.
fn find_named(
    dev: &mut impl BlockDevice,
    block: u16,
    name: &str,
) -> FsResult<Option<DirEntry>> {
    for slot in 0..DIR_ENTRIES {
        let entry = dir::read_entry(dev, block, slot)?;
        if entry.matches_name(name) {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

/// Like `find_named`, but only a directory entry counts as a match.
fn find_named_dir(
    dev: &mut impl BlockDevice,
    block: u16,
    name: &str,
) -> FsResult<Option<DirEntry>> {
    for slot in 0..DIR_ENTRIES {
        let entry = dir::read_entry(dev, block, slot)?;
        if entry.is_dir() && entry.matches_name(name) {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

// ─── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::DirEntry;
    use crate::store::MemDisk;

    /// Build `/docs/notes` (file, block 8) and `/docs/sub/` (block 7) plus
    /// a root-level file `/top` (block 9) by hand.
    fn sample_tree() -> MemDisk {
        let mut disk = MemDisk::new();
        dir::write_entry(&mut disk, ROOT_BLOCK, 0, &DirEntry::new_dir("docs", 6)).unwrap();
        dir::write_entry(&mut disk, ROOT_BLOCK, 1, &DirEntry::new_file("top", 9)).unwrap();
        dir::write_entry(&mut disk, 6, 0, &DirEntry::new_file("notes", 8)).unwrap();
        dir::write_entry(&mut disk, 6, 1, &DirEntry::new_dir("sub", 7)).unwrap();
        disk
    }

    // ── resolve ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_path_is_the_starting_block() {
        let mut disk = sample_tree();
        assert_eq!(resolve(&mut disk, 6, "").unwrap(), Some(6));
        assert_eq!(resolve_parent(&mut disk, 6, "").unwrap(), Some(6));
    }

    #[test]
    fn absolute_walk_from_root() {
        let mut disk = sample_tree();
        assert_eq!(resolve(&mut disk, 6, "/docs").unwrap(), Some(6));
        assert_eq!(resolve(&mut disk, 6, "/docs/sub").unwrap(), Some(7));
        assert_eq!(resolve(&mut disk, 6, "/docs/notes").unwrap(), Some(8));
    }

    #[test]
    fn relative_walk_from_current() {
        let mut disk = sample_tree();
        assert_eq!(resolve(&mut disk, 6, "notes").unwrap(), Some(8));
        assert_eq!(resolve(&mut disk, 6, "sub").unwrap(), Some(7));
        assert_eq!(resolve(&mut disk, ROOT_BLOCK, "docs/sub").unwrap(), Some(7));
    }

    #[test]
    fn missing_component_is_none() {
        let mut disk = sample_tree();
        assert_eq!(resolve(&mut disk, ROOT_BLOCK, "/nope").unwrap(), None);
        assert_eq!(resolve(&mut disk, ROOT_BLOCK, "/docs/nope/deep").unwrap(), None);
    }

    #[test]
    fn dot_and_empty_components_are_skipped() {
        let mut disk = sample_tree();
        assert_eq!(resolve(&mut disk, ROOT_BLOCK, "./docs//sub/.").unwrap(), Some(7));
        assert_eq!(resolve(&mut disk, ROOT_BLOCK, "docs/").unwrap(), Some(6));
    }

    #[test]
    fn dotdot_does_not_ascend() {
        let mut disk = sample_tree();
        // `..` is skipped, so this resolves inside docs, not at the root.
        assert_eq!(resolve(&mut disk, 6, "../notes").unwrap(), Some(8));
    }

    #[test]
    fn file_match_ignores_trailing_components() {
        let mut disk = sample_tree();
        assert_eq!(resolve(&mut disk, ROOT_BLOCK, "/top/anything/else").unwrap(), Some(9));
    }

    // ── resolve_parent ───────────────────────────────────────────────────────

    #[test]
    fn parent_of_nested_path() {
        let mut disk = sample_tree();
        assert_eq!(resolve_parent(&mut disk, ROOT_BLOCK, "/docs/notes").unwrap(), Some(6));
        assert_eq!(resolve_parent(&mut disk, ROOT_BLOCK, "/docs/sub/new").unwrap(), Some(7));
        assert_eq!(resolve_parent(&mut disk, ROOT_BLOCK, "/newfile").unwrap(), Some(ROOT_BLOCK));
    }

    #[test]
    fn parent_does_not_validate_the_leaf() {
        let mut disk = sample_tree();
        assert_eq!(resolve_parent(&mut disk, ROOT_BLOCK, "/docs/does-not-exist").unwrap(), Some(6));
    }

    #[test]
    fn parent_does_not_descend_into_files() {
        let mut disk = sample_tree();
        assert_eq!(resolve_parent(&mut disk, ROOT_BLOCK, "/top/child").unwrap(), None);
    }

    // ── resolve_dir ──────────────────────────────────────────────────────────

    #[test]
    fn dir_walk_rejects_files() {
        let mut disk = sample_tree();
        assert_eq!(resolve_dir(&mut disk, ROOT_BLOCK, "/docs/sub").unwrap(), Some(7));
        assert_eq!(resolve_dir(&mut disk, ROOT_BLOCK, "/top").unwrap(), None);
    }

    #[test]
    fn slash_alone_is_the_root() {
        let mut disk = sample_tree();
        assert_eq!(resolve_dir(&mut disk, 6, "/").unwrap(), Some(ROOT_BLOCK));
    }

    // ── file_name ────────────────────────────────────────────────────────────

    #[test]
    fn file_name_is_the_last_component() {
        assert_eq!(file_name("/docs/notes"), Some("notes"));
        assert_eq!(file_name("notes"), Some("notes"));
        assert_eq!(file_name("/docs/sub/"), Some("sub"));
        assert_eq!(file_name("/"), None);
        assert_eq!(file_name(""), None);
        assert_eq!(file_name("/docs/.."), None);
    }
}
