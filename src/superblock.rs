use log::debug;

use crate::bitmap::fill_bitmap;
use crate::config::*;
use crate::directory::write_entry;
use crate::error::{FsError, Result};
use crate::inode::write_inode;
use crate::{BlockDevice, DirEntry, Inode, SuperBlock};

pub fn read_superblock(device: &impl BlockDevice) -> Result<SuperBlock> {
    let mut buf = vec![0u8; BLOCK_SIZE];
    device.read_block(SUPERBLOCK_ID, &mut buf)?;
    let superblock = SuperBlock::decode(&buf)?;

    if superblock.magic != MAGIC {
        return Err(FsError::InvalidImage(format!("bad magic {:#010x}", superblock.magic)));
    }
    if superblock.version != VERSION {
        return Err(FsError::InvalidImage(format!(
            "unsupported version {}",
            superblock.version
        )));
    }
    superblock.validate()?;

    Ok(superblock)
}

pub fn write_superblock(device: &mut impl BlockDevice, superblock: &SuperBlock) -> Result<()> {
    let mut buf = vec![0u8; BLOCK_SIZE];
    superblock.encode(&mut buf)?;
    device.write_block(SUPERBLOCK_ID, &buf)
}

impl SuperBlock {
    /// Checks that the regions described by the header are the compiled-in ones
    /// and that they do not overlap each other or the data region.
    pub fn validate(&self) -> Result<()> {
        if *self != SuperBlock::new() {
            return Err(FsError::InvalidImage("layout does not match this build".into()));
        }
        let regions = [
            ("directory", self.dir_start, self.dir_blocks),
            ("superblock", SUPERBLOCK_ID as u32, 1),
            ("inode bitmap", self.inode_bitmap_start, INODE_BITMAP_BLOCKS as u32),
            ("inode table", self.inode_table_start, self.inode_table_blocks),
            ("block bitmap", self.block_bitmap_start, self.block_bitmap_blocks),
        ];
        for (i, (name, start, len)) in regions.iter().enumerate() {
            if start + len > self.first_data_block {
                return Err(FsError::InvalidImage(format!("{} overlaps the data region", name)));
            }
            for (other, other_start, other_len) in &regions[i + 1..] {
                if *start < other_start + other_len && *other_start < start + len {
                    return Err(FsError::InvalidImage(format!("{} overlaps {}", name, other)));
                }
            }
        }
        Ok(())
    }
}

/// Lays a fresh, empty filesystem over a zeroed device: header, every bitmap bit
/// available, every directory slot and inode slot cleared.
pub fn format_fs(device: &mut impl BlockDevice) -> Result<SuperBlock> {
    let superblock = SuperBlock::new();
    superblock.validate()?;
    write_superblock(device, &superblock)?;

    fill_bitmap(device, &superblock.inode_bitmap(), true)?;
    fill_bitmap(device, &superblock.block_bitmap(), true)?;

    for slot in 0..superblock.num_files as usize {
        write_entry(device, &superblock, slot, &DirEntry::NULL)?;
    }
    let empty = Inode::empty();
    for inode_id in 0..superblock.num_files {
        write_inode(device, &superblock, inode_id, &empty)?;
    }

    debug!(
        "formatted: {} directory slots, {} inodes, data blocks {}..{}",
        superblock.num_files, superblock.num_files, superblock.first_data_block, superblock.num_blocks
    );
    Ok(superblock)
}
