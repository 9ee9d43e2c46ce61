//! Reading and writing file content through an inode's block chain.

use log::{debug, warn};

use crate::bitmap::{alloc_data_block, claim_data_block, free_data_block};
use crate::config::*;
use crate::error::{FsError, Result};
use crate::{BlockDevice, Inode, SuperBlock};

/// Materializes the whole content of a file.
/// Every block contributes BLOCK_SIZE bytes except the last, which contributes
/// only what remains of `file_size`, so no trailing padding leaks out.
pub fn fread(device: &impl BlockDevice, inode: &Inode) -> Result<Vec<u8>> {
    let file_size = inode.file_size as usize;
    let blocks = inode.data_blocks()?;
    let mut content = Vec::with_capacity(file_size);
    let mut block_buf = vec![0u8; BLOCK_SIZE];

    for (i, &block_id) in blocks.iter().enumerate() {
        device.read_block(block_id, &mut block_buf)?;
        let len = if i + 1 == blocks.len() {
            file_size - i * BLOCK_SIZE
        } else {
            BLOCK_SIZE
        };
        content.extend_from_slice(&block_buf[..len]);
    }

    Ok(content)
}

/// Stores `content` into the inode's blocks one BLOCK_SIZE chunk at a time.
///
/// With `reuse`, the block already referenced at each position is overwritten in
/// place and only missing positions get a new block; references past the new end
/// are released. Without it, every chunk gets a freshly allocated block appended
/// at the inode's first free slot.
///
/// On failure the inode keeps every block attached so far. The caller is expected
/// to persist the inode either way.
pub fn fwrite(
    device: &mut impl BlockDevice,
    superblock: &SuperBlock,
    inode: &mut Inode,
    content: &[u8],
    reuse: bool,
) -> Result<()> {
    if content.len() > MAX_FILE_SIZE {
        return Err(FsError::FileTooLarge);
    }
    let mut block_buf = vec![0u8; BLOCK_SIZE];

    for (i, chunk) in content.chunks(BLOCK_SIZE).enumerate() {
        let block_id = match (reuse, inode.blocks[i]) {
            (true, Some(block_id)) => {
                let block_id = usize::from(block_id);
                claim_data_block(device, superblock, block_id)?;
                block_id
            }
            (true, None) => {
                let block_id = alloc_data_block(device, superblock)?;
                inode.blocks[i] = Some(block_id as u16);
                block_id
            }
            (false, _) => {
                let slot = inode.find_free_block_slot().ok_or(FsError::InodeFull)?;
                let block_id = alloc_data_block(device, superblock)?;
                inode.blocks[slot] = Some(block_id as u16);
                block_id
            }
        };

        block_buf.fill(0);
        block_buf[..chunk.len()].copy_from_slice(chunk);
        device.write_block(block_id, &block_buf)?;
    }

    if reuse {
        let needed = content.len().div_ceil(BLOCK_SIZE);
        let surplus = inode.blocks[needed..].iter().filter(|b| b.is_some()).count();
        if surplus > 0 {
            warn!("file shrank, releasing {} trailing blocks", surplus);
        }
        for slot in inode.blocks[needed..].iter_mut() {
            if let Some(block_id) = slot.take() {
                free_data_block(device, superblock, usize::from(block_id))?;
            }
        }
    }

    debug!("stored {} bytes in {} blocks", content.len(), content.len().div_ceil(BLOCK_SIZE));
    Ok(())
}

/// Releases every block the inode references. The references themselves are
/// left in place so the content can be recovered while nothing reuses them.
pub fn release_blocks(device: &mut impl BlockDevice, superblock: &SuperBlock, inode: &Inode) -> Result<()> {
    for block_id in inode.blocks.iter().flatten() {
        free_data_block(device, superblock, usize::from(*block_id))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::count_free_data_blocks;
    use crate::superblock::format_fs;
    use crate::Arena;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn last_block_is_trimmed() {
        let mut arena = Arena::new();
        let sb = format_fs(&mut arena).unwrap();
        for len in [1, BLOCK_SIZE - 1, BLOCK_SIZE, BLOCK_SIZE + 1, 3 * BLOCK_SIZE] {
            let mut inode = Inode::empty();
            let content = pattern(len);
            fwrite(&mut arena, &sb, &mut inode, &content, false).unwrap();
            inode.file_size = len as u32;
            assert_eq!(fread(&arena, &inode).unwrap(), content, "length {}", len);
            release_blocks(&mut arena, &sb, &inode).unwrap();
        }
    }

    #[test]
    fn reuse_keeps_positions_and_frees_tail() {
        let mut arena = Arena::new();
        let sb = format_fs(&mut arena).unwrap();
        let free_before = count_free_data_blocks(&arena, &sb).unwrap();

        let mut inode = Inode::empty();
        fwrite(&mut arena, &sb, &mut inode, &pattern(3 * BLOCK_SIZE), false).unwrap();
        let first = inode.blocks[0];

        fwrite(&mut arena, &sb, &mut inode, &[7u8; 10], true).unwrap();
        inode.file_size = 10;
        assert_eq!(inode.blocks[0], first);
        assert_eq!(inode.blocks[1], None);
        assert_eq!(fread(&arena, &inode).unwrap(), vec![7u8; 10]);
        assert_eq!(count_free_data_blocks(&arena, &sb).unwrap(), free_before - 1);
    }

    #[test]
    fn empty_content_uses_no_blocks() {
        let mut arena = Arena::new();
        let sb = format_fs(&mut arena).unwrap();
        let mut inode = Inode::empty();
        fwrite(&mut arena, &sb, &mut inode, &[], false).unwrap();
        assert_eq!(inode.find_free_block_slot(), Some(0));
        assert!(fread(&arena, &inode).unwrap().is_empty());
    }
}
