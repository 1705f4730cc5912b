//! 磁盘布局：
//! 超级块 | inode 表 | 链表（chain table） | 数据块区域
//!
//! 所有“下标 -> 块号”的换算都集中在这里。

use crate::fs::{
    config::{ENTRIES_PER_BLOCK, INODES_PER_BLOCK, SUPER_BLOCK_BLOCK_ID},
    error::{FileSystemError, Result},
    super_block::SuperBlock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    inode_table_blocks: u32,
    chain_table_blocks: u32,
}

impl Layout {
    pub fn new(inode_table_blocks: u32, chain_table_blocks: u32) -> Self {
        Self {
            inode_table_blocks,
            chain_table_blocks,
        }
    }

    pub fn of(sb: &SuperBlock) -> Self {
        Self::new(
            sb.inode_table_block_count as u32,
            sb.chain_table_block_count as u32,
        )
    }

    /// 根据设备块数和期望的 inode 数划分区域。
    ///
    /// inode 表向上取整；链表取能与剩余数据块一一对应的最小块数，
    /// 即 `ceil(剩余块数 / (M + 1))`。
    ///
    /// 剩余块数恰好是 `M + 1` 的整数倍时，这里比 `floor(剩余块数 / (M + 1)) + 1`
    /// 少一个链表块、多一个数据块，所以镜像和按后一种公式建的镜像并不逐字节相同。
    pub fn plan(device_blocks: u32, inode_count: u32) -> Result<Self> {
        if inode_count == 0 || inode_count > i32::MAX as u32 {
            return Err(FileSystemError::InvalidGeometry(format!(
                "inode count {} is out of range",
                inode_count
            )));
        }

        let inode_table_blocks = inode_count.div_ceil(INODES_PER_BLOCK);
        // 至少要放下一个链表块和一个数据块
        let remaining = device_blocks
            .checked_sub(1 + inode_table_blocks)
            .filter(|&r| r >= 2)
            .ok_or_else(|| {
                FileSystemError::InvalidGeometry(format!(
                    "{} blocks cannot hold {} inodes plus a chain table and data",
                    device_blocks, inode_count
                ))
            })?;
        let chain_table_blocks = remaining.div_ceil(ENTRIES_PER_BLOCK + 1);

        let layout = Self::new(inode_table_blocks, chain_table_blocks);
        if layout.data_block_count(device_blocks) > i32::MAX as u32 {
            return Err(FileSystemError::InvalidGeometry(format!(
                "{} blocks exceed the addressable range",
                device_blocks
            )));
        }
        Ok(layout)
    }

    pub fn inode_table_blocks(&self) -> u32 {
        self.inode_table_blocks
    }

    pub fn chain_table_blocks(&self) -> u32 {
        self.chain_table_blocks
    }

    /// inode `ino` 所在的 inode 块
    pub fn inode_block(&self, ino: u32) -> u32 {
        ino / INODES_PER_BLOCK + SUPER_BLOCK_BLOCK_ID + 1
    }

    /// inode `ino` 在块内的槽位
    pub fn inode_slot(ino: u32) -> usize {
        (ino % INODES_PER_BLOCK) as usize
    }

    /// 链表项 `entry` 所在的链表块
    pub fn chain_block(&self, entry: u32) -> u32 {
        self.inode_table_blocks + 1 + entry / ENTRIES_PER_BLOCK
    }

    pub fn chain_slot(entry: u32) -> usize {
        (entry % ENTRIES_PER_BLOCK) as usize
    }

    /// 链表项 `entry` 对应的数据块
    pub fn data_block(&self, entry: u32) -> u32 {
        entry + self.inode_table_blocks + self.chain_table_blocks + 1
    }

    pub fn inode_capacity(&self) -> u32 {
        self.inode_table_blocks * INODES_PER_BLOCK
    }

    pub fn entry_capacity(&self) -> u32 {
        self.chain_table_blocks * ENTRIES_PER_BLOCK
    }

    /// 除最后一个链表块外的表项数。格式化时这些表项一定都有数据块。
    pub fn full_chain_entries(&self) -> u32 {
        self.chain_table_blocks.saturating_sub(1) * ENTRIES_PER_BLOCK
    }

    /// 设备上真正存在数据块的链表项数
    pub fn data_block_count(&self, device_blocks: u32) -> u32 {
        device_blocks
            .saturating_sub(1 + self.inode_table_blocks + self.chain_table_blocks)
            .min(self.entry_capacity())
    }
}
