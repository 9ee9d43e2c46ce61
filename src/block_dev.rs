use crate::error::{FsError, Result};

pub trait BlockDevice {
    /// Returns the number of blocks in the block device.
    fn num_blocks(&self) -> usize;

    /// Reads a block of data from the block device.
    /// buf.len() must be equal to block_size().
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<()>;

    /// Writes a block of data to the block device.
    /// buf.len() must be equal to block_size().
    fn write_block(&mut self, block_id: usize, buf: &[u8]) -> Result<()>;

    /// Returns the size of each block in bytes.
    fn block_size(&self) -> usize {
        crate::config::BLOCK_SIZE
    }

    /// Reads `buf.len()` bytes starting at an absolute byte offset.
    /// Records in the reserved region are not block aligned, so the range may span blocks.
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        let block_size = self.block_size();
        let mut block_buf = vec![0u8; block_size];
        let mut done = 0;

        while done < buf.len() {
            let pos = offset + done;
            let block_id = pos / block_size;
            let inner = pos % block_size;
            let len = (block_size - inner).min(buf.len() - done);
            self.read_block(block_id, &mut block_buf)?;
            buf[done..done + len].copy_from_slice(&block_buf[inner..inner + len]);
            done += len;
        }
        Ok(())
    }

    /// Writes `buf` starting at an absolute byte offset, read-modify-writing partial blocks.
    fn write_at(&mut self, offset: usize, buf: &[u8]) -> Result<()> {
        let block_size = self.block_size();
        let mut block_buf = vec![0u8; block_size];
        let mut done = 0;

        while done < buf.len() {
            let pos = offset + done;
            let block_id = pos / block_size;
            let inner = pos % block_size;
            let len = (block_size - inner).min(buf.len() - done);
            if len < block_size {
                self.read_block(block_id, &mut block_buf)?;
            }
            block_buf[inner..inner + len].copy_from_slice(&buf[done..done + len]);
            self.write_block(block_id, &block_buf)?;
            done += len;
        }
        Ok(())
    }
}

pub(crate) fn check_block_buf(device: &impl BlockDevice, block_id: usize, len: usize) -> Result<()> {
    if block_id >= device.num_blocks() {
        return Err(FsError::InvalidBlockId(block_id));
    }
    if len != device.block_size() {
        return Err(FsError::InvalidParameter(format!(
            "block buffer of {} bytes, expected {}",
            len,
            device.block_size()
        )));
    }
    Ok(())
}
