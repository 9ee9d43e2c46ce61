//! The flat directory table: NUM_FILES fixed slots binding names to inodes.

use crate::config::*;
use crate::error::{FsError, Result};
use crate::{BlockDevice, DirEntry, SuperBlock};

fn entry_offset(superblock: &SuperBlock, slot: usize) -> Result<usize> {
    if slot >= superblock.num_files as usize {
        return Err(FsError::Corrupted(format!("directory slot {} out of range", slot)));
    }
    Ok(superblock.dir_start as usize * BLOCK_SIZE + slot * DIR_ENTRY_SIZE)
}

pub fn get_entry(device: &impl BlockDevice, superblock: &SuperBlock, slot: usize) -> Result<DirEntry> {
    let offset = entry_offset(superblock, slot)?;
    let mut buf = [0u8; DIR_ENTRY_SIZE];
    device.read_at(offset, &mut buf)?;
    DirEntry::decode(&buf)
}

pub fn write_entry(
    device: &mut impl BlockDevice,
    superblock: &SuperBlock,
    slot: usize,
    entry: &DirEntry,
) -> Result<()> {
    let offset = entry_offset(superblock, slot)?;
    let mut buf = [0u8; DIR_ENTRY_SIZE];
    entry.encode(&mut buf)?;
    device.write_at(offset, &buf)
}

/// Every slot of the directory table in order.
pub fn read_dir(device: &impl BlockDevice, superblock: &SuperBlock) -> Result<Vec<DirEntry>> {
    let mut buf = vec![0u8; superblock.num_files as usize * DIR_ENTRY_SIZE];
    device.read_at(superblock.dir_start as usize * BLOCK_SIZE, &mut buf)?;
    buf.chunks_exact(DIR_ENTRY_SIZE)
        .map(|chunk| {
            let record: &[u8; DIR_ENTRY_SIZE] = chunk
                .try_into()
                .map_err(|_| FsError::Corrupted("short directory record".into()))?;
            DirEntry::decode(record)
        })
        .collect()
}

/// Slot of the in-use entry named `name`, exact and case-sensitive.
pub fn search_directory(device: &impl BlockDevice, superblock: &SuperBlock, name: &str) -> Result<Option<usize>> {
    Ok(read_dir(device, superblock)?
        .iter()
        .position(|entry| entry.in_use && entry.name_eq(name)))
}

/// Slot of the first inactive entry still carrying `name`, the candidate for undelete.
pub fn search_deleted(device: &impl BlockDevice, superblock: &SuperBlock, name: &str) -> Result<Option<usize>> {
    Ok(read_dir(device, superblock)?
        .iter()
        .position(|entry| !entry.in_use && entry.inode.is_some() && entry.name_eq(name)))
}

/// First slot not in use.
pub fn find_free_entry(device: &impl BlockDevice, superblock: &SuperBlock) -> Result<usize> {
    read_dir(device, superblock)?
        .iter()
        .position(|entry| !entry.in_use)
        .ok_or(FsError::DirectoryFull)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::superblock::format_fs;
    use crate::Arena;

    #[test]
    fn lookup_ignores_inactive_entries() {
        let mut arena = Arena::new();
        let sb = format_fs(&mut arena).unwrap();

        let mut entry = DirEntry::new("a.txt", 4).unwrap();
        write_entry(&mut arena, &sb, 3, &entry).unwrap();
        assert_eq!(search_directory(&arena, &sb, "a.txt").unwrap(), Some(3));
        assert_eq!(search_directory(&arena, &sb, "A.txt").unwrap(), None);
        assert_eq!(find_free_entry(&arena, &sb).unwrap(), 0);

        entry.in_use = false;
        write_entry(&mut arena, &sb, 3, &entry).unwrap();
        assert_eq!(search_directory(&arena, &sb, "a.txt").unwrap(), None);
        assert_eq!(search_deleted(&arena, &sb, "a.txt").unwrap(), Some(3));
        assert_eq!(get_entry(&arena, &sb, 3).unwrap().inode, Some(4));
    }

    #[test]
    fn full_directory() {
        let mut arena = Arena::new();
        let sb = format_fs(&mut arena).unwrap();
        for slot in 0..NUM_FILES {
            let entry = DirEntry::new(&format!("f{}", slot), slot as u32).unwrap();
            write_entry(&mut arena, &sb, slot, &entry).unwrap();
        }
        assert!(matches!(find_free_entry(&arena, &sb), Err(FsError::DirectoryFull)));
        assert_eq!(read_dir(&arena, &sb).unwrap().len(), NUM_FILES);
    }
}
