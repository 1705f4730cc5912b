use crate::{disk::types::Block, fs::error::Result};

/// 块存储接口：按 (资源号, 块号) 读写定长块。
///
/// 原始设备只有一个资源，忽略 `ino`；文件系统层把自己的每个 inode
/// 当作一个资源重新暴露出去，因此各层可以叠加。
pub trait BlockStore: Send + Sync {
    fn read(&self, ino: u32, block_no: u32, buf: &mut Block) -> Result<()>;
    fn write(&self, ino: u32, block_no: u32, buf: &Block) -> Result<()>;
    fn getsize(&self, ino: u32) -> Result<u32>;
    fn setsize(&self, ino: u32, nblocks: u32) -> Result<()>;
}

impl<S: BlockStore + ?Sized> BlockStore for &S {
    fn read(&self, ino: u32, block_no: u32, buf: &mut Block) -> Result<()> {
        (**self).read(ino, block_no, buf)
    }

    fn write(&self, ino: u32, block_no: u32, buf: &Block) -> Result<()> {
        (**self).write(ino, block_no, buf)
    }

    fn getsize(&self, ino: u32) -> Result<u32> {
        (**self).getsize(ino)
    }

    fn setsize(&self, ino: u32, nblocks: u32) -> Result<()> {
        (**self).setsize(ino, nblocks)
    }
}
