use std::{
    io,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    disk::{
        block_device::BlockStore,
        types::{Block, BLOCK_SIZE},
    },
    fs::error::Result,
};

/// 内存中的块设备，初始全零。主要用于测试和试运行。
#[derive(Debug)]
pub struct MemDisk {
    blocks: Mutex<Vec<Block>>,
}

impl MemDisk {
    pub fn new(nblocks: u32) -> Self {
        Self {
            blocks: Mutex::new(vec![[0u8; BLOCK_SIZE]; nblocks as usize]),
        }
    }

    fn blocks(&self) -> MutexGuard<'_, Vec<Block>> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn out_of_range(block_no: u32, nblocks: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("block {} beyond end of device ({} blocks)", block_no, nblocks),
    )
}

impl BlockStore for MemDisk {
    fn read(&self, _ino: u32, block_no: u32, buf: &mut Block) -> Result<()> {
        let blocks = self.blocks();
        let block = blocks
            .get(block_no as usize)
            .ok_or_else(|| out_of_range(block_no, blocks.len()))?;
        buf.copy_from_slice(block);
        Ok(())
    }

    fn write(&self, _ino: u32, block_no: u32, buf: &Block) -> Result<()> {
        let mut blocks = self.blocks();
        let len = blocks.len();
        let block = blocks
            .get_mut(block_no as usize)
            .ok_or_else(|| out_of_range(block_no, len))?;
        block.copy_from_slice(buf);
        Ok(())
    }

    fn getsize(&self, _ino: u32) -> Result<u32> {
        Ok(self.blocks().len() as u32)
    }

    fn setsize(&self, _ino: u32, nblocks: u32) -> Result<()> {
        self.blocks().resize(nblocks as usize, [0u8; BLOCK_SIZE]);
        Ok(())
    }
}
