//! Common utilities for tests

#![allow(unused)]

use std::fs;
use std::path::PathBuf;

use flatfs::FileSystem;

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder") -> println!("[test] placeholder");
#[macro_export]
macro_rules! log {
    ($msg:expr, $($arg:tt)*) => {
        println!("{}[test] {}{}", crate::common::ORANGE, format!($msg, $($arg)*), crate::common::RESET)
    };
}

/// A directory for one test's host files and image, emptied on creation.
/// Paths are kept relative and short because inserted files are stored under
/// the path they were inserted from, which is limited to 64 bytes.
pub struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    pub fn new(test: &str) -> Self {
        let dir = PathBuf::from("target/flatfs-tests").join(test);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Scratch { dir }
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.join(name).to_string_lossy().into_owned()
    }

    /// Writes a host file and returns its path.
    pub fn write(&self, name: &str, content: &[u8]) -> String {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, name: &str) -> Vec<u8> {
        fs::read(self.path(name)).unwrap()
    }
}

/// A filesystem with a freshly created image open.
pub fn mounted(scratch: &Scratch) -> FileSystem {
    let image = scratch.path("disk.img");
    let mut fs = FileSystem::new();
    fs.createfs(&image).unwrap();
    fs.openfs(&image).unwrap();
    fs
}

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}
