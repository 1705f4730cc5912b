use log::{info, warn};

use crate::{
    disk::{block_device::BlockStore, types::BLOCK_SIZE},
    fs::{
        chain_table::ChainBlock,
        config::{INODES_PER_BLOCK, SUPER_BLOCK_BLOCK_ID},
        error::Result,
        inode_table::InodeTable,
        layout::Layout,
        super_block::SuperBlock,
    },
};

/// 在 `disk` 的第 `ino` 号资源上建立文件系统。
///
/// 超级块记录的 inode 表块数不为 0 时视为已格式化，直接返回，
/// 因此重复调用是安全的。超级块最后写入：中途失败的格式化下次会重来。
pub fn create<S: BlockStore + ?Sized>(disk: &S, ino: u32, inode_count: u32) -> Result<()> {
    if SuperBlock::load(disk, ino)?.is_formatted() {
        warn!("resource {} is already formatted, leaving it untouched", ino);
        return Ok(());
    }

    let device_blocks = disk.getsize(ino)?;
    let layout = Layout::plan(device_blocks, inode_count)?;
    let data_blocks = layout.data_block_count(device_blocks);
    info!(
        "formatting {} blocks: {} inode blocks ({} inodes), {} chain blocks, {} data blocks",
        device_blocks,
        layout.inode_table_blocks(),
        layout.inode_capacity(),
        layout.chain_table_blocks(),
        data_blocks
    );

    for index in 0..layout.inode_table_blocks() {
        InodeTable::formatted(layout.inode_block(index * INODES_PER_BLOCK))?.sync(disk, ino)?;
    }
    for index in 0..layout.chain_table_blocks() {
        ChainBlock::formatted(&layout, index, data_blocks)?.sync(disk, ino)?;
    }

    SuperBlock::new(&layout).sync(disk, ino)
}

/// 清空超级块，让下一次 [`create`] 重新格式化
pub fn erase<S: BlockStore + ?Sized>(disk: &S, ino: u32) -> Result<()> {
    warn!("erasing superblock of resource {}", ino);
    disk.write(ino, SUPER_BLOCK_BLOCK_ID, &[0u8; BLOCK_SIZE])
}
