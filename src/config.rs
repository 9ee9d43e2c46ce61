use static_assertions::const_assert;

pub const MAGIC: u32 = 0x464C4653; // "FLFS" in ASCII
pub const VERSION: u32 = 1;

pub const BLOCK_SIZE: usize = 1024;
pub const NUM_BLOCKS: usize = 65536;
pub const IMAGE_SIZE: usize = NUM_BLOCKS * BLOCK_SIZE; // 64 MiB
pub const NUM_FILES: usize = 256; // Directory slots and inode slots
pub const MAX_BLOCKS_PER_FILE: usize = 1024;
pub const MAX_FILE_SIZE: usize = 1024 * 1024; // 1 MiB
pub const MAX_FILE_NAME_LEN: usize = 64;

// Directory table
pub const DIR_START: usize = 0;
pub const DIR_ENTRY_SIZE: usize = 72; // name[64] + in_use u16 + pad + inode i32
pub const DIR_BLOCKS: usize = (NUM_FILES * DIR_ENTRY_SIZE).div_ceil(BLOCK_SIZE);

pub const SUPERBLOCK_ID: usize = 18;

// Free inode bitmap, one bit per inode slot
pub const INODE_BITMAP_START: usize = 19;
pub const INODE_BITMAP_BLOCKS: usize = NUM_FILES.div_ceil(BLOCK_SIZE * 8);

// Inode table
pub const INODE_TABLE_START: usize = 20;
pub const INODE_SIZE: usize = 2072; // blocks[1024] u16 + in_use + pad + size + date + attribute + reserved
pub const INODE_TABLE_BLOCKS: usize = (NUM_FILES * INODE_SIZE).div_ceil(BLOCK_SIZE);

// Free block bitmap, one bit per block index
pub const BLOCK_BITMAP_BLOCKS: usize = NUM_BLOCKS / (BLOCK_SIZE * 8);
pub const BLOCK_BITMAP_START: usize = 1000 - BLOCK_BITMAP_BLOCKS;

pub const FIRST_DATA_BLOCK: usize = 1001;

/// Value stored in an inode block slot that holds no block.
/// Block 0 is the directory table, so it can never be a data block.
pub const NULL_BLOCK: u16 = 0;
/// Value stored in a directory entry that references no inode.
pub const NULL_INODE: i32 = -1;
/// Timestamp of an inode that was never written.
pub const NEVER: i64 = -1;

const_assert!(MAX_FILE_SIZE <= MAX_BLOCKS_PER_FILE * BLOCK_SIZE);
const_assert!(NUM_BLOCKS <= u16::MAX as usize + 1);
const_assert!(DIR_START + DIR_BLOCKS <= SUPERBLOCK_ID);
const_assert!(SUPERBLOCK_ID < INODE_BITMAP_START);
const_assert!(INODE_BITMAP_START + INODE_BITMAP_BLOCKS <= INODE_TABLE_START);
const_assert!(INODE_TABLE_START + INODE_TABLE_BLOCKS <= BLOCK_BITMAP_START);
const_assert!(BLOCK_BITMAP_START + BLOCK_BITMAP_BLOCKS < FIRST_DATA_BLOCK);
const_assert!(MAX_BLOCKS_PER_FILE * 2 + 24 == INODE_SIZE);
