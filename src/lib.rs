//! Flatfs is a flat, single-volume filesystem emulated inside a 64 MiB block arena
//! that is saved to and restored from a single image file.
//!
//! Flatfs's linear layout (block indices):
//! - 0..=17      Directory table (256 fixed slots)
//! - 18          Superblock header
//! - 19          Free inode bitmap
//! - 20..=537    Inode table (256 inodes)
//! - 992..=999   Free block bitmap
//! - 1001..      Data blocks
//!
//! Flatfs's layers (from bottom to top):
//! 1. Block Device: block and byte-range access.           | `BlockDevice`, implemented by `Arena`
//! 2. Bitmaps: first-fit allocation of blocks and inodes.   | Fs implemented
//! 3. Inode / Directory: fixed tables of records.           | Fs implemented
//! 4. File: block-chain reads and chunked writes.           | Fs implemented
//! 5. FileSystem: image lifecycle and named-file operations.| Fs implemented
//! 6. Command: the text command surface a shell drives.     | Fs implemented (prompt loop in the binary)
//!
//! There is exactly one owner of the arena; none of the invariants are guarded
//! against concurrent mutation. Wrap the `FileSystem` in a lock to share it.

mod config;
mod block_dev;
mod arena;
mod structs;
mod bitmap;
mod superblock;
mod inode;
mod directory;
mod file;
mod cipher;
mod image;
mod list;
mod fs;
mod command;
mod error;

pub use arena::Arena;
pub use bitmap::Bitmap;
pub use block_dev::BlockDevice;
pub use cipher::{parse_key, xor_in_place};
pub use command::{execute, Command, MAX_NUM_ARGUMENTS};
pub use config::*;
pub use error::ErrorKind;
pub use error::FsError as Error;
pub use error::Result;
pub use fs::*;
pub use list::{format_date, hex_dump, ListEntry, ListFilter};
pub use structs::*;
