use std::io::{Cursor, Write};

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::config::*;
use crate::error::{FsError, Result};

/// On-disk header stored in block SUPERBLOCK_ID. Describes where every region lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub magic: u32,
    pub version: u32,
    pub block_size: u32,
    pub num_blocks: u32,
    pub num_files: u32,
    pub max_blocks_per_file: u32,

    pub dir_start: u32,
    pub dir_blocks: u32,
    pub inode_bitmap_start: u32,
    pub inode_table_start: u32,
    pub inode_table_blocks: u32,
    pub block_bitmap_start: u32,
    pub block_bitmap_blocks: u32,
    pub first_data_block: u32,
}

bitflags! {
    /// Per-file attribute bits. Unknown bits are preserved as read from the image.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attributes: u8 {
        const READONLY = 0x01;
        const HIDDEN = 0x02;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; MAX_FILE_NAME_LEN],
    pub in_use: bool,
    pub inode: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    /// Ordered block references; `None` marks an unused slot.
    pub blocks: [Option<u16>; MAX_BLOCKS_PER_FILE],
    pub in_use: bool,
    pub file_size: u32,
    /// Unix seconds of the last insert, NEVER if the slot was never written.
    pub date: i64,
    pub attribute: Attributes,
}

impl SuperBlock {
    /// The header describing the compiled-in layout.
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            block_size: BLOCK_SIZE as u32,
            num_blocks: NUM_BLOCKS as u32,
            num_files: NUM_FILES as u32,
            max_blocks_per_file: MAX_BLOCKS_PER_FILE as u32,
            dir_start: DIR_START as u32,
            dir_blocks: DIR_BLOCKS as u32,
            inode_bitmap_start: INODE_BITMAP_START as u32,
            inode_table_start: INODE_TABLE_START as u32,
            inode_table_blocks: INODE_TABLE_BLOCKS as u32,
            block_bitmap_start: BLOCK_BITMAP_START as u32,
            block_bitmap_blocks: BLOCK_BITMAP_BLOCKS as u32,
            first_data_block: FIRST_DATA_BLOCK as u32,
        }
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<()> {
        let mut cur = Cursor::new(buf);
        for field in [
            self.magic,
            self.version,
            self.block_size,
            self.num_blocks,
            self.num_files,
            self.max_blocks_per_file,
            self.dir_start,
            self.dir_blocks,
            self.inode_bitmap_start,
            self.inode_table_start,
            self.inode_table_blocks,
            self.block_bitmap_start,
            self.block_bitmap_blocks,
            self.first_data_block,
        ] {
            cur.write_u32::<LittleEndian>(field)?;
        }
        Ok(())
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        Ok(Self {
            magic: cur.read_u32::<LittleEndian>()?,
            version: cur.read_u32::<LittleEndian>()?,
            block_size: cur.read_u32::<LittleEndian>()?,
            num_blocks: cur.read_u32::<LittleEndian>()?,
            num_files: cur.read_u32::<LittleEndian>()?,
            max_blocks_per_file: cur.read_u32::<LittleEndian>()?,
            dir_start: cur.read_u32::<LittleEndian>()?,
            dir_blocks: cur.read_u32::<LittleEndian>()?,
            inode_bitmap_start: cur.read_u32::<LittleEndian>()?,
            inode_table_start: cur.read_u32::<LittleEndian>()?,
            inode_table_blocks: cur.read_u32::<LittleEndian>()?,
            block_bitmap_start: cur.read_u32::<LittleEndian>()?,
            block_bitmap_blocks: cur.read_u32::<LittleEndian>()?,
            first_data_block: cur.read_u32::<LittleEndian>()?,
        })
    }
}

impl Default for SuperBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl DirEntry {
    pub const NULL: Self = Self {
        name: [0; MAX_FILE_NAME_LEN],
        in_use: false,
        inode: None,
    };

    pub fn new(name: &str, inode_id: u32) -> Result<Self> {
        Ok(Self {
            name: encode_name(name)?,
            in_use: true,
            inode: Some(inode_id),
        })
    }

    /// The stored name without NUL padding.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&c| c == 0).unwrap_or(self.name.len());
        &self.name[..end]
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    pub fn name_eq(&self, name: &str) -> bool {
        self.name_bytes() == name.as_bytes()
    }

    pub fn encode(&self, buf: &mut [u8; DIR_ENTRY_SIZE]) -> Result<()> {
        let mut cur = Cursor::new(&mut buf[..]);
        cur.write_all(&self.name)?;
        cur.write_u16::<LittleEndian>(self.in_use as u16)?;
        cur.write_u16::<LittleEndian>(0)?;
        let inode = match self.inode {
            Some(id) => id as i32,
            None => NULL_INODE,
        };
        cur.write_i32::<LittleEndian>(inode)?;
        Ok(())
    }

    pub fn decode(buf: &[u8; DIR_ENTRY_SIZE]) -> Result<Self> {
        let mut name = [0u8; MAX_FILE_NAME_LEN];
        name.copy_from_slice(&buf[..MAX_FILE_NAME_LEN]);
        let mut cur = Cursor::new(&buf[MAX_FILE_NAME_LEN..]);
        let in_use = cur.read_u16::<LittleEndian>()? != 0;
        let _pad = cur.read_u16::<LittleEndian>()?;
        let inode = cur.read_i32::<LittleEndian>()?;
        Ok(Self {
            name,
            in_use,
            inode: u32::try_from(inode).ok(),
        })
    }
}

/// Validates a file name and pads it into the fixed name field.
pub fn encode_name(name: &str) -> Result<[u8; MAX_FILE_NAME_LEN]> {
    let bytes = name.as_bytes();
    if bytes.is_empty() {
        return Err(FsError::EmptyName);
    }
    if bytes.len() > MAX_FILE_NAME_LEN {
        return Err(FsError::NameTooLong);
    }
    let mut arr = [0u8; MAX_FILE_NAME_LEN];
    arr[..bytes.len()].copy_from_slice(bytes);
    Ok(arr)
}

impl Inode {
    pub fn empty() -> Self {
        Self {
            blocks: [None; MAX_BLOCKS_PER_FILE],
            in_use: false,
            file_size: 0,
            date: NEVER,
            attribute: Attributes::empty(),
        }
    }

    /// Number of block references a file of this size must hold.
    pub fn block_count(&self) -> usize {
        (self.file_size as usize).div_ceil(BLOCK_SIZE)
    }

    pub fn encode(&self, buf: &mut [u8; INODE_SIZE]) -> Result<()> {
        let mut cur = Cursor::new(&mut buf[..]);
        for block in &self.blocks {
            cur.write_u16::<LittleEndian>(block.unwrap_or(NULL_BLOCK))?;
        }
        cur.write_u16::<LittleEndian>(self.in_use as u16)?;
        cur.write_u16::<LittleEndian>(0)?;
        cur.write_u32::<LittleEndian>(self.file_size)?;
        cur.write_i64::<LittleEndian>(self.date)?;
        cur.write_u8(self.attribute.bits())?;
        cur.write_all(&[0u8; 7])?;
        Ok(())
    }

    pub fn decode(buf: &[u8; INODE_SIZE]) -> Result<Self> {
        let mut cur = Cursor::new(&buf[..]);
        let mut blocks = [None; MAX_BLOCKS_PER_FILE];
        for slot in blocks.iter_mut() {
            let id = cur.read_u16::<LittleEndian>()?;
            *slot = (id != NULL_BLOCK).then_some(id);
        }
        let in_use = cur.read_u16::<LittleEndian>()? != 0;
        let _pad = cur.read_u16::<LittleEndian>()?;
        let file_size = cur.read_u32::<LittleEndian>()?;
        let date = cur.read_i64::<LittleEndian>()?;
        let attribute = Attributes::from_bits_retain(cur.read_u8()?);
        Ok(Self {
            blocks,
            in_use,
            file_size,
            date,
            attribute,
        })
    }
}

impl Default for Inode {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_entry_layout() {
        let entry = DirEntry::new("notes.txt", 7).unwrap();
        let mut buf = [0u8; DIR_ENTRY_SIZE];
        entry.encode(&mut buf).unwrap();
        assert_eq!(&buf[..9], b"notes.txt");
        assert_eq!(buf[64], 1);
        assert_eq!(&buf[68..72], &7i32.to_le_bytes());

        let free = DirEntry::NULL;
        free.encode(&mut buf).unwrap();
        assert_eq!(&buf[68..72], &(-1i32).to_le_bytes());
        assert_eq!(DirEntry::decode(&buf).unwrap().inode, None);
    }

    #[test]
    fn full_length_name_has_no_terminator() {
        let name = "x".repeat(MAX_FILE_NAME_LEN);
        let entry = DirEntry::new(&name, 0).unwrap();
        assert_eq!(entry.name(), name);
        assert!(entry.name_eq(&name));
        assert!(matches!(
            DirEntry::new(&"x".repeat(MAX_FILE_NAME_LEN + 1), 0),
            Err(FsError::NameTooLong)
        ));
    }

    #[test]
    fn inode_preserves_unknown_attribute_bits() {
        let mut inode = Inode::empty();
        inode.blocks[0] = Some(FIRST_DATA_BLOCK as u16);
        inode.attribute = Attributes::from_bits_retain(0x81);
        inode.file_size = 10;
        let mut buf = [0u8; INODE_SIZE];
        inode.encode(&mut buf).unwrap();
        assert_eq!(buf[2064], 0x81);

        let back = Inode::decode(&buf).unwrap();
        assert_eq!(back, inode);
        assert!(back.attribute.contains(Attributes::READONLY));
        assert_eq!(back.blocks[1], None);
    }
}
