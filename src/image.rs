//! Image persistence. An image is the arena verbatim: NUM_BLOCKS blocks of
//! BLOCK_SIZE bytes, read and written in one bulk transfer.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;

use crate::arena::Arena;
use crate::error::{FsError, Result};

pub fn read_image(path: &Path) -> Result<Arena> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FsError::ImageNotFound,
        _ => FsError::Io(e),
    })?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    Arena::from_bytes(bytes)
}

/// Writes the whole arena to `path`, replacing any previous content.
pub fn write_image(path: &Path, arena: &Arena) -> Result<()> {
    fs::write(path, arena.as_bytes())?;
    debug!("wrote {} bytes to {}", arena.as_bytes().len(), path.display());
    Ok(())
}
