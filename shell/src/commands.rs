//! Command dispatch: one line of input in, one block of output text out.
//!
//! This layer only tokenizes, calls the filesystem, and formats. All the
//! actual semantics live in `fat_fs`.

use std::fmt::Write;

use fat_fs::{BlockDevice, EntryKind, FileSystem, TreeNode};

pub struct Shell<D: BlockDevice> {
    fs: FileSystem<D>,
}

impl<D: BlockDevice> Shell<D> {
    pub fn new(fs: FileSystem<D>) -> Self {
        Self { fs }
    }

    /// Execute one command line and print its output.
    pub fn execute(&mut self, line: &str) {
        let out = self.dispatch(line);
        if !out.is_empty() {
            println!("{out}");
        }
    }

    /// Execute one command line and return its output text.
    pub fn dispatch(&mut self, line: &str) -> String {
        let line = line.trim();
        if line.is_empty() {
            return String::new();
        }
        let (cmd, args) = match line.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd, args.trim()),
            None => (line, ""),
        };

        match cmd.to_ascii_lowercase().as_str() {
            "init" => self.init(),
            "load" => self.load(),
            "ls" => self.list(args),
            "mkdir" => self.mkdir(args),
            "create" => self.create(args),
            "unlink" => self.unlink(args),
            "cd" => self.change_dir(args),
            "tree" => self.tree(),
            "write" => self.write_data(args, false),
            "append" => self.write_data(args, true),
            "read" => self.read(args),
            "check" => self.check(),
            "stats" => self.stats(),
            "help" => help_text(),
            _ => "Unknown command. Type 'help' for a list of commands.".into(),
        }
    }

    // ─── Command handlers ──────────────────────────────────────────────────

    fn init(&mut self) -> String {
        match self.fs.initialize() {
            Ok(()) => "FileSystem initialized.".into(),
            Err(e) => format!("Error: {e}."),
        }
    }

    fn load(&mut self) -> String {
        match self.fs.load() {
            Ok(()) => "FileSystem loaded from disk.".into(),
            Err(e) => format!("Error: could not load the file system: {e}."),
        }
    }

    fn list(&mut self, args: &str) -> String {
        let path = if args.is_empty() { None } else { Some(args) };
        match self.fs.list(path) {
            Ok(entries) => {
                let mut out = String::from("Listing directory:");
                for entry in entries {
                    let kind = match entry.kind {
                        EntryKind::File => "File",
                        EntryKind::Directory => "Directory",
                    };
                    write!(out, "\n{kind}: {}", entry.name).unwrap();
                }
                out
            }
            Err(e) => format!("Error: {e}."),
        }
    }

    fn mkdir(&mut self, args: &str) -> String {
        if args.is_empty() {
            return "Usage: mkdir /path".into();
        }
        match self.fs.mkdir(args) {
            Ok(()) => format!("Directory created: {args}"),
            Err(e) => format!("Error: {e}."),
        }
    }

    fn create(&mut self, args: &str) -> String {
        if args.is_empty() {
            return "Usage: create /path/file".into();
        }
        match self.fs.create(args) {
            Ok(()) => format!("File created: {args}"),
            Err(e) => format!("Error: {e}."),
        }
    }

    fn unlink(&mut self, args: &str) -> String {
        if args.is_empty() {
            return "Usage: unlink /path/file_or_directory".into();
        }
        match self.fs.unlink(args) {
            Ok(()) => format!("Deleted: {args}"),
            Err(e) => format!("Error: {e}."),
        }
    }

    fn change_dir(&mut self, args: &str) -> String {
        if args.is_empty() {
            return "Usage: cd /path".into();
        }
        match self.fs.change_dir(args) {
            Ok(()) => format!("Changed to directory: {args}"),
            Err(e) => format!("Error: {e}."),
        }
    }

    fn tree(&mut self) -> String {
        match self.fs.tree() {
            Ok(nodes) => {
                let mut out = String::new();
                render_tree(&nodes, 0, &mut out);
                // Drop the trailing newline from the last rendered row.
                out.pop();
                out
            }
            Err(e) => format!("Error: {e}."),
        }
    }

    fn write_data(&mut self, args: &str, append: bool) -> String {
        let usage = if append {
            "Usage: append \"data\" [rep] /path/file"
        } else {
            "Usage: write \"data\" [rep] /path/file"
        };
        let Some((data, path)) = parse_data_args(args) else {
            return usage.into();
        };
        let result = if append {
            self.fs.append(path, data.as_bytes())
        } else {
            self.fs.write(path, data.as_bytes())
        };
        match result {
            Ok(()) if append => format!("Data appended to file: {path}"),
            Ok(()) => format!("Data written to file: {path}"),
            Err(e) => format!("Error: {e}."),
        }
    }

    fn read(&mut self, args: &str) -> String {
        if args.is_empty() {
            return "Usage: read /path/file".into();
        }
        match self.fs.read(args) {
            Ok(data) => {
                format!("Data in file: {args}: {}", String::from_utf8_lossy(&data))
            }
            Err(e) => format!("Error: {e}."),
        }
    }

    fn check(&mut self) -> String {
        match self.fs.check() {
            Ok(report) if report.is_consistent() => "FileSystem is consistent.".into(),
            Ok(report) => {
                let mut out = String::new();
                for finding in &report.findings {
                    writeln!(out, "Inconsistency: {finding}").unwrap();
                }
                out.pop();
                out
            }
            Err(e) => format!("Error: {e}."),
        }
    }

    fn stats(&mut self) -> String {
        let stats = self.fs.stats();
        format!(
            "FileSystem Stats:\n\
             Total Blocks: {}\n\
             Used Blocks: {}\n\
             Free Blocks: {}\n\
             Block Size: {} bytes",
            stats.total_blocks, stats.used_blocks, stats.free_blocks, stats.block_size
        )
    }
}

// ─── Formatting helpers ────────────────────────────────────────────────────────

fn render_tree(nodes: &[TreeNode], depth: usize, out: &mut String) {
    for node in nodes {
        for _ in 0..depth {
            out.push_str("  ");
        }
        let suffix = if node.kind == EntryKind::Directory { "/" } else { "" };
        writeln!(out, "- {}{suffix}", node.name).unwrap();
        render_tree(&node.children, depth + 1, out);
    }
}

/// Parse the `"data" [rep] /path` argument form shared by write and append.
/// Returns the data with repetitions applied, plus the path.
fn parse_data_args(args: &str) -> Option<(String, &str)> {
    let rest = args.trim_start().strip_prefix('"')?;
    let close = rest.find('"')?;
    let data = &rest[..close];
    let rest = rest[close + 1..].trim_start();

    let (rep, path) = match rest.split_once(char::is_whitespace) {
        Some((first, remainder))
            if !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()) =>
        {
            (first.parse::<usize>().ok()?, remainder.trim())
        }
        _ => (1, rest),
    };
    if path.is_empty() {
        return None;
    }
    Some((data.repeat(rep), path))
}

fn help_text() -> String {
    "Available commands:\n\
     \x20 init                              - Initialize the file system\n\
     \x20 load                              - Load the file system from disk\n\
     \x20 ls [/path]                        - List directory contents\n\
     \x20 mkdir /path                       - Create a new directory\n\
     \x20 create /path/file                 - Create a new file\n\
     \x20 unlink /path/file                 - Delete a file or a directory\n\
     \x20 cd /path                          - Change directory\n\
     \x20 write \"data\" [rep] /path/file     - Write data to a file\n\
     \x20 append \"data\" [rep] /path/file    - Append data to a file\n\
     \x20 read /path/file                   - Read data from a file\n\
     \x20 tree                              - Display directory structure\n\
     \x20 stats                             - Show file system statistics\n\
     \x20 check                             - Check file system consistency\n\
     \x20 help                              - Show this help message\n\
     \x20 exit                              - Exit the shell"
        .into()
}

// ─── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use fat_fs::MemDisk;

    fn shell() -> Shell<MemDisk> {
        let mut shell = Shell::new(FileSystem::new(MemDisk::new()));
        assert_eq!(shell.dispatch("init"), "FileSystem initialized.");
        shell
    }

    // ── parse_data_args ──────────────────────────────────────────────────────

    #[test]
    fn parse_plain_data_and_path() {
        assert_eq!(parse_data_args("\"hello\" /f"), Some(("hello".into(), "/f")));
    }

    #[test]
    fn parse_with_repeat_count() {
        assert_eq!(parse_data_args("\"ab\" 3 /f"), Some(("ababab".into(), "/f")));
    }

    #[test]
    fn parse_numeric_path_without_repeat() {
        // A lone trailing token is the path even when it looks like a number.
        assert_eq!(parse_data_args("\"x\" 123"), Some(("x".into(), "123")));
    }

    #[test]
    fn parse_empty_data() {
        assert_eq!(parse_data_args("\"\" /f"), Some((String::new(), "/f")));
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert_eq!(parse_data_args("no-quotes /f"), None);
        assert_eq!(parse_data_args("\"unterminated /f"), None);
        assert_eq!(parse_data_args("\"data\""), None);
        assert_eq!(parse_data_args(""), None);
    }

    // ── dispatch ─────────────────────────────────────────────────────────────

    #[test]
    fn unknown_command() {
        let mut shell = shell();
        assert_eq!(
            shell.dispatch("frobnicate"),
            "Unknown command. Type 'help' for a list of commands."
        );
    }

    #[test]
    fn create_write_read_cycle() {
        let mut shell = shell();
        assert_eq!(shell.dispatch("create /f"), "File created: /f");
        assert_eq!(shell.dispatch("write \"Hello World!\" 2 /f"), "Data written to file: /f");
        assert_eq!(
            shell.dispatch("read /f"),
            "Data in file: /f: Hello World!Hello World!"
        );
    }

    #[test]
    fn append_composes() {
        let mut shell = shell();
        shell.dispatch("create /f");
        shell.dispatch("write \"Hello\" /f");
        assert_eq!(shell.dispatch("append \" World!\" /f"), "Data appended to file: /f");
        assert_eq!(shell.dispatch("read /f"), "Data in file: /f: Hello World!");
    }

    #[test]
    fn ls_reports_files_and_directories() {
        let mut shell = shell();
        shell.dispatch("mkdir /d");
        shell.dispatch("create /file1");
        let out = shell.dispatch("ls /");
        assert!(out.starts_with("Listing directory:"));
        assert!(out.contains("Directory: d"));
        assert!(out.contains("File: file1"));
    }

    #[test]
    fn tree_is_indented() {
        let mut shell = shell();
        shell.dispatch("mkdir /dir1");
        shell.dispatch("mkdir /dir1/subdir1");
        shell.dispatch("create /dir1/subdir1/file1");
        assert_eq!(shell.dispatch("tree"), "- dir1/\n  - subdir1/\n    - file1");
    }

    #[test]
    fn cd_then_relative_create() {
        let mut shell = shell();
        shell.dispatch("mkdir /testdir");
        assert_eq!(shell.dispatch("cd /testdir"), "Changed to directory: /testdir");
        shell.dispatch("create testfile");
        assert!(shell.dispatch("ls").contains("File: testfile"));
    }

    #[test]
    fn unlink_removes_from_listing() {
        let mut shell = shell();
        shell.dispatch("create /testfile");
        assert_eq!(shell.dispatch("unlink /testfile"), "Deleted: /testfile");
        assert!(!shell.dispatch("ls /").contains("testfile"));
    }

    #[test]
    fn errors_are_single_messages() {
        let mut shell = shell();
        assert_eq!(shell.dispatch("read /ghost"), "Error: file or directory not found.");
        assert_eq!(shell.dispatch("mkdir"), "Usage: mkdir /path");
        assert_eq!(shell.dispatch("write data-without-quotes /f"), "Usage: write \"data\" [rep] /path/file");
    }

    #[test]
    fn check_reports_consistent_volume() {
        let mut shell = shell();
        shell.dispatch("mkdir /d");
        shell.dispatch("create /d/f");
        assert_eq!(shell.dispatch("check"), "FileSystem is consistent.");
    }

    #[test]
    fn stats_after_init() {
        let mut shell = shell();
        let out = shell.dispatch("stats");
        assert!(out.starts_with("FileSystem Stats:"));
        assert!(out.contains("Total Blocks: 2048"));
        assert!(out.contains("Block Size: 1024 bytes"));
    }
}
