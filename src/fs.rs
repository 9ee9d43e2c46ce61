use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info, warn};

use crate::bitmap::{
    alloc_inode_id, claim_data_block, claim_inode_id, count_free_data_blocks, free_inode_id, is_data_block_free,
    is_inode_free,
};
use crate::cipher::xor_in_place;
use crate::config::*;
use crate::directory::{find_free_entry, get_entry, read_dir, search_deleted, search_directory, write_entry};
use crate::file::{fread, fwrite, release_blocks};
use crate::image::{read_image, write_image};
use crate::inode::{get_inode, write_inode};
use crate::list::{ListEntry, ListFilter};
use crate::structs::encode_name;
use crate::superblock::{format_fs, read_superblock};
use crate::{Arena, Attributes, DirEntry, Error, Inode, Result, SuperBlock};

/// The mounted filesystem: the arena and the bookkeeping of which image backs it.
///
/// All operations run synchronously on the in-memory arena. Nothing reaches the
/// image file until [`FileSystem::savefs`]; there is no rollback, so a failed
/// operation leaves whatever it had changed so far.
#[derive(Debug)]
pub struct FileSystem {
    arena: Arena,
    superblock: SuperBlock,
    image: Option<PathBuf>,
}

/// Attribute edits accepted by [`FileSystem::attrib`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttribChange {
    Set(Attributes),
    Clear(Attributes),
}

impl AttribChange {
    /// Parses `+h`, `+r`, `-h` or `-r`.
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "+h" => Ok(Self::Set(Attributes::HIDDEN)),
            "+r" => Ok(Self::Set(Attributes::READONLY)),
            "-h" => Ok(Self::Clear(Attributes::HIDDEN)),
            "-r" => Ok(Self::Clear(Attributes::READONLY)),
            other => Err(Error::InvalidAttribute(other.to_string())),
        }
    }
}

impl FileSystem {
    /// A filesystem with an empty arena and no image open.
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            superblock: SuperBlock::new(),
            image: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.image.is_some()
    }

    /// Path of the image currently backing the arena.
    pub fn image_name(&self) -> Option<&Path> {
        self.image.as_deref()
    }

    pub fn superblock(&self) -> &SuperBlock {
        &self.superblock
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    fn ensure_open(&self) -> Result<()> {
        if self.image.is_none() {
            return Err(Error::NotOpen);
        }
        Ok(())
    }

    // Image lifecycle

    /// Resets the arena to an empty filesystem and writes it to a new image at `name`.
    /// The image is not left open.
    pub fn createfs(&mut self, name: &str) -> Result<()> {
        encode_name(name)?;
        if self.is_open() {
            return Err(Error::AlreadyOpen);
        }

        let mut arena = Arena::new();
        let superblock = format_fs(&mut arena)?;
        write_image(Path::new(name), &arena)?;

        self.arena = arena;
        self.superblock = superblock;
        info!("created image {}", name);
        Ok(())
    }

    /// Loads the image at `name` into the arena and marks it open.
    pub fn openfs(&mut self, name: &str) -> Result<()> {
        if self.is_open() {
            return Err(Error::AlreadyOpen);
        }

        let path = PathBuf::from(name);
        let arena = read_image(&path)?;
        let superblock = read_superblock(&arena)?;

        self.arena = arena;
        self.superblock = superblock;
        self.image = Some(path);
        info!("opened image {}", name);
        Ok(())
    }

    /// Writes the whole arena to the open image, replacing its content.
    pub fn savefs(&mut self) -> Result<()> {
        let path = self.image.as_ref().ok_or(Error::NotOpen)?;
        write_image(path, &self.arena)?;
        info!("saved image {}", path.display());
        Ok(())
    }

    /// Detaches the arena from its image. Unsaved changes are not written.
    pub fn closefs(&mut self) -> Result<()> {
        let path = self.image.take().ok_or(Error::NotOpen)?;
        info!("closed image {}", path.display());
        Ok(())
    }

    // Reporting

    /// Free bytes in the data region.
    pub fn df(&self) -> Result<usize> {
        self.ensure_open()?;
        Ok(count_free_data_blocks(&self.arena, &self.superblock)? * BLOCK_SIZE)
    }

    /// In-use directory entries that pass `filter`, in table order.
    /// Fails with [`Error::NoFilesFound`] when nothing matches.
    pub fn list(&self, filter: ListFilter) -> Result<Vec<ListEntry>> {
        self.ensure_open()?;
        let mut rows = Vec::new();

        for entry in read_dir(&self.arena, &self.superblock)?.iter().filter(|e| e.in_use) {
            let inode = self.entry_inode(entry)?.1;
            if inode.attribute.contains(Attributes::HIDDEN) && !filter.show_hidden {
                continue;
            }
            rows.push(ListEntry {
                name: entry.name(),
                size: inode.file_size,
                date: inode.date,
                attribute: inode.attribute,
                show_attributes: filter.show_attributes,
            });
        }

        if rows.is_empty() {
            return Err(Error::NoFilesFound);
        }
        Ok(rows)
    }

    // File lifecycle

    /// Copies the host file at `path` into the image under the same name.
    ///
    /// An existing file of that name is overwritten in place, reusing its inode and
    /// block positions. Either way the size and date are refreshed and the READONLY
    /// and HIDDEN attributes are cleared.
    pub fn insert(&mut self, path: &str) -> Result<()> {
        self.ensure_open()?;
        encode_name(path)?;

        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::HostFileNotFound(path.to_string()),
            _ => Error::Io(e),
        })?;
        if metadata.len() > MAX_FILE_SIZE as u64 {
            return Err(Error::FileTooLarge);
        }

        let existing = match search_directory(&self.arena, &self.superblock, path)? {
            Some(slot) => Some(self.entry_inode(&get_entry(&self.arena, &self.superblock, slot)?)?),
            None => None,
        };
        // An overwrite gets its current blocks back.
        let reclaimable = existing.as_ref().map_or(0, |(_, inode)| inode.block_count());
        let needed = (metadata.len() as usize).div_ceil(BLOCK_SIZE);
        if needed > count_free_data_blocks(&self.arena, &self.superblock)? + reclaimable {
            return Err(Error::OutOfSpace);
        }

        let content = fs::read(path)?;
        if content.len() > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge);
        }
        info!("Reading {} bytes from {}", content.len(), path);

        let (inode_id, mut inode, reuse) = match existing {
            Some((inode_id, inode)) => {
                debug!("overwriting {} in place (inode {})", path, inode_id);
                (inode_id, inode, true)
            }
            None => {
                let slot = find_free_entry(&self.arena, &self.superblock)?;
                let inode_id = alloc_inode_id(&mut self.arena, &self.superblock)?;
                write_entry(&mut self.arena, &self.superblock, slot, &DirEntry::new(path, inode_id)?)?;
                debug!("new file {} in slot {} (inode {})", path, slot, inode_id);
                (inode_id, Inode::empty(), false)
            }
        };

        inode.in_use = true;
        inode.file_size = content.len() as u32;
        inode.date = Utc::now().timestamp();
        inode.attribute.remove(Attributes::READONLY | Attributes::HIDDEN);

        // The inode is written even if the copy fails part way, so the blocks
        // allocated so far stay accounted to it.
        let copied = fwrite(&mut self.arena, &self.superblock, &mut inode, &content, reuse);
        write_inode(&mut self.arena, &self.superblock, inode_id, &inode)?;
        copied
    }

    /// Writes the content of `name` to the host file `new_name`, or to `name` when absent.
    pub fn retrieve(&self, name: &str, new_name: Option<&str>) -> Result<()> {
        let content = self.read_all(name)?;
        let dest = new_name.unwrap_or(name);
        fs::write(dest, &content)?;
        info!("retrieved {} ({} bytes) to {}", name, content.len(), dest);
        Ok(())
    }

    /// `count` bytes of `name` starting at byte `start`.
    pub fn read(&self, name: &str, start: usize, count: usize) -> Result<Vec<u8>> {
        let content = self.read_all(name)?;
        let end = start.checked_add(count).filter(|&end| end <= content.len()).ok_or(
            Error::OutOfBounds {
                start,
                end: start.saturating_add(count),
                size: content.len(),
            },
        )?;
        Ok(content[start..end].to_vec())
    }

    /// The whole content of `name`.
    pub fn read_all(&self, name: &str) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let (_, _, inode) = self.lookup(name)?;
        fread(&self.arena, &inode)
    }

    /// Removes `name`. Its directory entry and inode keep their references so
    /// [`FileSystem::undelete`] can bring the file back.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.ensure_open()?;
        let (slot, inode_id, mut inode) = self.lookup(name)?;
        if inode.attribute.contains(Attributes::READONLY) {
            return Err(Error::ReadOnly);
        }

        let mut entry = get_entry(&self.arena, &self.superblock, slot)?;
        entry.in_use = false;
        write_entry(&mut self.arena, &self.superblock, slot, &entry)?;

        inode.in_use = false;
        write_inode(&mut self.arena, &self.superblock, inode_id, &inode)?;
        free_inode_id(&mut self.arena, &self.superblock, inode_id)?;
        release_blocks(&mut self.arena, &self.superblock, &inode)?;

        debug!("deleted {} (inode {})", name, inode_id);
        Ok(())
    }

    /// Restores a deleted file by re-marking its entry, inode and blocks in use.
    ///
    /// Only safe while nothing has been allocated since the delete: a later insert
    /// may have taken the inode slot or any of the blocks. When the bitmaps show
    /// such a conflict the undelete is refused rather than double-allocating.
    pub fn undelete(&mut self, name: &str) -> Result<()> {
        self.ensure_open()?;
        if search_directory(&self.arena, &self.superblock, name)?.is_some() {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        let slot = search_deleted(&self.arena, &self.superblock, name)?.ok_or(Error::NotFound)?;
        let mut entry = get_entry(&self.arena, &self.superblock, slot)?;
        let (inode_id, mut inode) = self.entry_inode(&entry)?;

        if !is_inode_free(&self.arena, &self.superblock, inode_id)? {
            warn!("undelete {}: inode {} was reused", name, inode_id);
            return Err(Error::AlreadyExists(format!("inode {} of {}", inode_id, name)));
        }
        let blocks = inode.data_blocks()?;
        for &block_id in &blocks {
            if !is_data_block_free(&self.arena, &self.superblock, block_id)? {
                warn!("undelete {}: block {} was reused", name, block_id);
                return Err(Error::AlreadyExists(format!("block {} of {}", block_id, name)));
            }
        }

        entry.in_use = true;
        write_entry(&mut self.arena, &self.superblock, slot, &entry)?;
        inode.in_use = true;
        write_inode(&mut self.arena, &self.superblock, inode_id, &inode)?;
        claim_inode_id(&mut self.arena, &self.superblock, inode_id)?;
        for block_id in blocks {
            claim_data_block(&mut self.arena, &self.superblock, block_id)?;
        }

        debug!("undeleted {} (inode {})", name, inode_id);
        Ok(())
    }

    pub fn attrib(&mut self, change: AttribChange, name: &str) -> Result<()> {
        self.ensure_open()?;
        let (_, inode_id, mut inode) = self.lookup(name)?;
        match change {
            AttribChange::Set(flags) => inode.attribute.insert(flags),
            AttribChange::Clear(flags) => inode.attribute.remove(flags),
        }
        write_inode(&mut self.arena, &self.superblock, inode_id, &inode)
    }

    /// XORs the content of `name` with `key`, writes the result to the host file
    /// of the same name and re-inserts it, so the file gets fresh blocks and a new date.
    pub fn encrypt(&mut self, name: &str, key: u8) -> Result<()> {
        self.ensure_open()?;
        let (_, _, inode) = self.lookup(name)?;
        if inode.attribute.contains(Attributes::READONLY) {
            return Err(Error::ReadOnly);
        }
        let mut content = fread(&self.arena, &inode)?;
        xor_in_place(&mut content, key);
        fs::write(name, &content)?;
        self.delete(name)?;
        self.insert(name)
    }

    /// The same transform as [`FileSystem::encrypt`]; XOR undoes itself.
    pub fn decrypt(&mut self, name: &str, key: u8) -> Result<()> {
        self.encrypt(name, key)
    }

    // Lookup helpers

    /// Directory slot, inode id and inode of the in-use file `name`.
    fn lookup(&self, name: &str) -> Result<(usize, u32, Inode)> {
        let slot = search_directory(&self.arena, &self.superblock, name)?.ok_or(Error::NotFound)?;
        let entry = get_entry(&self.arena, &self.superblock, slot)?;
        let (inode_id, inode) = self.entry_inode(&entry)?;
        Ok((slot, inode_id, inode))
    }

    fn entry_inode(&self, entry: &DirEntry) -> Result<(u32, Inode)> {
        let inode_id = entry
            .inode
            .ok_or_else(|| Error::Corrupted(format!("entry {} has no inode", entry.name())))?;
        Ok((inode_id, get_inode(&self.arena, &self.superblock, inode_id)?))
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}
