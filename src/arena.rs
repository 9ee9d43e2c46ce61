//! The block arena: every block of the filesystem, held in one contiguous heap buffer.
//! The arena is the "disk"; image persistence copies it to and from a file in bulk.

use crate::block_dev::{check_block_buf, BlockDevice};
use crate::config::*;
use crate::error::{FsError, Result};

pub struct Arena {
    bytes: Box<[u8]>,
}

impl Arena {
    /// A zeroed arena of NUM_BLOCKS blocks.
    pub fn new() -> Self {
        Self {
            bytes: vec![0u8; IMAGE_SIZE].into_boxed_slice(),
        }
    }

    /// Takes ownership of a raw image. The length must be exactly IMAGE_SIZE.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != IMAGE_SIZE {
            return Err(FsError::InvalidImage(format!(
                "image is {} bytes, expected {}",
                bytes.len(),
                IMAGE_SIZE
            )));
        }
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Borrows a whole block in place.
    pub fn block(&self, block_id: usize) -> Result<&[u8]> {
        if block_id >= NUM_BLOCKS {
            return Err(FsError::InvalidBlockId(block_id));
        }
        let start = block_id * BLOCK_SIZE;
        Ok(&self.bytes[start..start + BLOCK_SIZE])
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Arena {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("num_blocks", &NUM_BLOCKS)
            .field("block_size", &BLOCK_SIZE)
            .finish()
    }
}

impl BlockDevice for Arena {
    fn num_blocks(&self) -> usize {
        NUM_BLOCKS
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<()> {
        check_block_buf(self, block_id, buf.len())?;
        let start = block_id * BLOCK_SIZE;
        buf.copy_from_slice(&self.bytes[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&mut self, block_id: usize, buf: &[u8]) -> Result<()> {
        check_block_buf(self, block_id, buf.len())?;
        let start = block_id * BLOCK_SIZE;
        self.bytes[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        let end = offset + buf.len();
        if end > IMAGE_SIZE {
            return Err(FsError::InvalidBlockId(end / BLOCK_SIZE));
        }
        buf.copy_from_slice(&self.bytes[offset..end]);
        Ok(())
    }

    fn write_at(&mut self, offset: usize, buf: &[u8]) -> Result<()> {
        let end = offset + buf.len();
        if end > IMAGE_SIZE {
            return Err(FsError::InvalidBlockId(end / BLOCK_SIZE));
        }
        self.bytes[offset..end].copy_from_slice(buf);
        Ok(())
    }
}
