//! Interactive shell over a flat-file volume.
//!
//! Usage: `shell [backing-file]`, default `filesystem.dat`. Run `init` once
//! on a new file, `load` on an existing one.

mod commands;
mod logger;

use std::io::{self, BufRead, Write};

use fat_fs::{FileDisk, FileSystem};

fn main() {
    logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "filesystem.dat".into());
    let fs = FileSystem::new(FileDisk::new(&path));
    let mut shell = commands::Shell::new(fs);

    println!("FileSystem Shell. Type 'help' for commands.");
    let stdin = io::stdin();
    loop {
        print!("\n> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::error!("stdin read failed: {e}");
                break;
            }
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") {
            break;
        }
        shell.execute(line);
    }
}
