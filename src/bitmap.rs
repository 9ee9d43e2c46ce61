//! Management of the free-block bitmap and the free-inode bitmap.
//! A set bit means the item is available. Both maps are scanned first-fit,
//! so allocation order is deterministic and observable through `df`.

use log::debug;

use crate::config::*;
use crate::error::{FsError, Result};
use crate::{BlockDevice, SuperBlock};

/// A bitmap region of the device: `total_items` bits packed from `start` onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitmap {
    pub start: usize,
    pub blocks: usize,
    pub total_items: usize,
}

const BITS_PER_BLOCK: usize = BLOCK_SIZE * 8;

impl SuperBlock {
    pub fn block_bitmap(&self) -> Bitmap {
        Bitmap {
            start: self.block_bitmap_start as usize,
            blocks: self.block_bitmap_blocks as usize,
            total_items: self.num_blocks as usize,
        }
    }

    pub fn inode_bitmap(&self) -> Bitmap {
        Bitmap {
            start: self.inode_bitmap_start as usize,
            blocks: INODE_BITMAP_BLOCKS,
            total_items: self.num_files as usize,
        }
    }
}

/// Clears the first set bit at or after `from` and returns its item id.
fn take_first_fit_bit(device: &mut impl BlockDevice, bitmap: &Bitmap, from: usize) -> Result<Option<usize>> {
    let mut buf = vec![0u8; BLOCK_SIZE];
    let first_block = from / BITS_PER_BLOCK;

    for i in first_block..bitmap.blocks {
        let current_block_id = bitmap.start + i;
        device.read_block(current_block_id, &mut buf)?;

        let skip = if i == first_block { from % BITS_PER_BLOCK } else { 0 };
        let Some(bit) = first_set_bit(&buf, skip) else {
            continue;
        };
        let current_item_id = i * BITS_PER_BLOCK + bit;
        if current_item_id >= bitmap.total_items {
            return Ok(None);
        }
        buf[bit / 8] &= !(1 << (bit % 8));
        device.write_block(current_block_id, &buf)?;
        return Ok(Some(current_item_id));
    }

    Ok(None)
}

/// Position of the first set bit at or after `skip` within one bitmap block.
fn first_set_bit(buf: &[u8], skip: usize) -> Option<usize> {
    let mut byte = skip / 8;
    let head = buf[byte] & (0xFFu8 << (skip % 8));
    if head != 0 {
        return Some(byte * 8 + head.trailing_zeros() as usize);
    }
    byte += 1;

    // Byte steps up to a word boundary, then whole words.
    while byte < buf.len() && byte % 8 != 0 {
        if buf[byte] != 0 {
            return Some(byte * 8 + buf[byte].trailing_zeros() as usize);
        }
        byte += 1;
    }
    while byte + 8 <= buf.len() {
        let word = u64::from_le_bytes(buf[byte..byte + 8].try_into().ok()?);
        if word != 0 {
            return Some(byte * 8 + word.trailing_zeros() as usize);
        }
        byte += 8;
    }
    None
}

/// Sets a specific bit. Returns the previous value of the bit.
fn set_bit_at(device: &mut impl BlockDevice, bitmap: &Bitmap, item_id: usize, value: bool) -> Result<bool> {
    let (block_id, byte_offset, bit_offset) = locate(bitmap, item_id)?;
    let mut buf = vec![0u8; BLOCK_SIZE];

    device.read_block(block_id, &mut buf)?;
    let pre_value = buf[byte_offset] & (1 << bit_offset) != 0;
    if value {
        buf[byte_offset] |= 1 << bit_offset;
    } else {
        buf[byte_offset] &= !(1 << bit_offset);
    }
    device.write_block(block_id, &buf)?;

    Ok(pre_value)
}

fn test_bit(device: &impl BlockDevice, bitmap: &Bitmap, item_id: usize) -> Result<bool> {
    let (block_id, byte_offset, bit_offset) = locate(bitmap, item_id)?;
    let mut buf = vec![0u8; BLOCK_SIZE];
    device.read_block(block_id, &mut buf)?;
    Ok(buf[byte_offset] & (1 << bit_offset) != 0)
}

fn locate(bitmap: &Bitmap, item_id: usize) -> Result<(usize, usize, usize)> {
    if item_id >= bitmap.total_items {
        return Err(FsError::InvalidParameter(format!(
            "bitmap item {} out of range (0..{})",
            item_id, bitmap.total_items
        )));
    }
    let block_id = bitmap.start + item_id / BITS_PER_BLOCK;
    let byte_offset = (item_id % BITS_PER_BLOCK) / 8;
    Ok((block_id, byte_offset, item_id % 8))
}

/// Counts set bits in `[from, total_items)`.
fn count_set_bits(device: &impl BlockDevice, bitmap: &Bitmap, from: usize) -> Result<usize> {
    let mut buf = vec![0u8; BLOCK_SIZE];
    let mut count = 0;

    for i in 0..bitmap.blocks {
        device.read_block(bitmap.start + i, &mut buf)?;
        for (j, &byte) in buf.iter().enumerate() {
            let first_item = i * BITS_PER_BLOCK + j * 8;
            if first_item >= bitmap.total_items {
                return Ok(count);
            }
            if first_item + 8 <= from {
                continue;
            }
            let mut mask = 0xFFu8;
            if first_item < from {
                mask &= 0xFF << (from - first_item);
            }
            if first_item + 8 > bitmap.total_items {
                mask &= 0xFF >> (first_item + 8 - bitmap.total_items);
            }
            count += (byte & mask).count_ones() as usize;
        }
    }

    Ok(count)
}

/// Sets every item bit of the bitmap to `value`. Padding bits past `total_items` stay clear.
pub fn fill_bitmap(device: &mut impl BlockDevice, bitmap: &Bitmap, value: bool) -> Result<()> {
    let mut buf = vec![0u8; BLOCK_SIZE];
    for i in 0..bitmap.blocks {
        buf.fill(0);
        if value {
            let items = bitmap.total_items.saturating_sub(i * BITS_PER_BLOCK).min(BITS_PER_BLOCK);
            buf[..items / 8].fill(0xFF);
            for k in 0..items % 8 {
                buf[items / 8] |= 1 << k;
            }
        }
        device.write_block(bitmap.start + i, &buf)?;
    }
    Ok(())
}

// Public API for the data bitmap and the inode bitmap.

/// Allocates the first free data block, clearing its bit.
/// Reserved blocks below `first_data_block` are never handed out.
pub fn alloc_data_block(device: &mut impl BlockDevice, superblock: &SuperBlock) -> Result<usize> {
    let block_id = take_first_fit_bit(device, &superblock.block_bitmap(), superblock.first_data_block as usize)?
        .ok_or(FsError::OutOfSpace)?;
    debug!("allocated block {}", block_id);
    Ok(block_id)
}

/// Frees a data block, setting its bit.
pub fn free_data_block(device: &mut impl BlockDevice, superblock: &SuperBlock, block_id: usize) -> Result<()> {
    check_data_block(superblock, block_id)?;
    set_bit_at(device, &superblock.block_bitmap(), block_id, true)?;
    Ok(())
}

/// Marks a specific data block as used. Returns whether it was free before.
pub fn claim_data_block(device: &mut impl BlockDevice, superblock: &SuperBlock, block_id: usize) -> Result<bool> {
    check_data_block(superblock, block_id)?;
    set_bit_at(device, &superblock.block_bitmap(), block_id, false)
}

pub fn is_data_block_free(device: &impl BlockDevice, superblock: &SuperBlock, block_id: usize) -> Result<bool> {
    check_data_block(superblock, block_id)?;
    test_bit(device, &superblock.block_bitmap(), block_id)
}

/// Number of available blocks in the data region.
pub fn count_free_data_blocks(device: &impl BlockDevice, superblock: &SuperBlock) -> Result<usize> {
    count_set_bits(device, &superblock.block_bitmap(), superblock.first_data_block as usize)
}

fn check_data_block(superblock: &SuperBlock, block_id: usize) -> Result<()> {
    if block_id < superblock.first_data_block as usize || block_id >= superblock.num_blocks as usize {
        return Err(FsError::InvalidBlockId(block_id));
    }
    Ok(())
}

/// Allocates the first free inode slot, clearing its bit.
pub fn alloc_inode_id(device: &mut impl BlockDevice, superblock: &SuperBlock) -> Result<u32> {
    let inode_id = take_first_fit_bit(device, &superblock.inode_bitmap(), 0)?.ok_or(FsError::OutOfInodes)?;
    debug!("allocated inode {}", inode_id);
    Ok(inode_id as u32)
}

pub fn free_inode_id(device: &mut impl BlockDevice, superblock: &SuperBlock, inode_id: u32) -> Result<()> {
    set_bit_at(device, &superblock.inode_bitmap(), inode_id as usize, true)?;
    Ok(())
}

/// Marks a specific inode slot as used. Returns whether it was free before.
pub fn claim_inode_id(device: &mut impl BlockDevice, superblock: &SuperBlock, inode_id: u32) -> Result<bool> {
    set_bit_at(device, &superblock.inode_bitmap(), inode_id as usize, false)
}

pub fn is_inode_free(device: &impl BlockDevice, superblock: &SuperBlock, inode_id: u32) -> Result<bool> {
    test_bit(device, &superblock.inode_bitmap(), inode_id as usize)
}
