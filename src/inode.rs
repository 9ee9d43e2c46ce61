//! Management of reading and writing to inodes.

use crate::config::*;
use crate::error::{FsError, Result};
use crate::{BlockDevice, Inode, SuperBlock};

fn inode_offset(superblock: &SuperBlock, inode_id: u32) -> Result<usize> {
    if inode_id >= superblock.num_files {
        return Err(FsError::Corrupted(format!("inode {} out of range", inode_id)));
    }
    Ok(superblock.inode_table_start as usize * BLOCK_SIZE + inode_id as usize * INODE_SIZE)
}

pub fn get_inode(device: &impl BlockDevice, superblock: &SuperBlock, inode_id: u32) -> Result<Inode> {
    let offset = inode_offset(superblock, inode_id)?;
    let mut buf = [0u8; INODE_SIZE];
    device.read_at(offset, &mut buf)?;
    Inode::decode(&buf)
}

pub fn write_inode(
    device: &mut impl BlockDevice,
    superblock: &SuperBlock,
    inode_id: u32,
    inode: &Inode,
) -> Result<()> {
    let offset = inode_offset(superblock, inode_id)?;
    let mut buf = [0u8; INODE_SIZE];
    inode.encode(&mut buf)?;
    device.write_at(offset, &buf)
}

impl Inode {
    /// First unused block slot, where the next block of a growing file goes.
    pub fn find_free_block_slot(&self) -> Option<usize> {
        self.blocks.iter().position(Option::is_none)
    }

    /// The block references that make up the file content, in order.
    /// Fails if a slot the file size calls for is empty.
    pub fn data_blocks(&self) -> Result<Vec<usize>> {
        let count = self.block_count();
        if count > MAX_BLOCKS_PER_FILE {
            return Err(FsError::Corrupted(format!("file size {} too large", self.file_size)));
        }
        self.blocks[..count]
            .iter()
            .enumerate()
            .map(|(i, block)| {
                block
                    .map(usize::from)
                    .ok_or_else(|| FsError::Corrupted(format!("missing block {} of {}", i, count)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::superblock::format_fs;
    use crate::{Arena, Attributes};

    #[test]
    fn inodes_do_not_overlap() {
        let mut arena = Arena::new();
        let sb = format_fs(&mut arena).unwrap();

        let mut first = Inode::empty();
        first.in_use = true;
        first.file_size = 3000;
        first.blocks[..3].copy_from_slice(&[Some(1001), Some(1002), Some(1003)]);
        let mut last = Inode::empty();
        last.in_use = true;
        last.attribute = Attributes::HIDDEN;

        write_inode(&mut arena, &sb, 0, &first).unwrap();
        write_inode(&mut arena, &sb, NUM_FILES as u32 - 1, &last).unwrap();

        let back = get_inode(&arena, &sb, 0).unwrap();
        assert_eq!(back, first);
        assert_eq!(back.data_blocks().unwrap(), vec![1001, 1002, 1003]);
        assert_eq!(back.find_free_block_slot(), Some(3));
        assert_eq!(get_inode(&arena, &sb, NUM_FILES as u32 - 1).unwrap(), last);
        assert!(!get_inode(&arena, &sb, 1).unwrap().in_use);
        assert!(get_inode(&arena, &sb, NUM_FILES as u32).is_err());
    }

    #[test]
    fn missing_block_is_reported() {
        let mut inode = Inode::empty();
        inode.file_size = (BLOCK_SIZE + 1) as u32;
        inode.blocks[0] = Some(1001);
        assert!(matches!(inode.data_blocks(), Err(FsError::Corrupted(_))));
    }
}
