use serde::{Deserialize, Serialize};

use crate::{
    disk::{
        block_device::BlockStore,
        types::{Block, BLOCK_SIZE},
    },
    fs::{
        config::{
            from_link, to_link, ENTRIES_PER_BLOCK, INODES_PER_BLOCK, SUPER_BLOCK_BLOCK_ID,
            SUPER_BLOCK_SIZE,
        },
        error::{FileSystemError, Result},
        layout::Layout,
    },
};

/// 超级块：位于 0 号块，固定 512 字节。
///
/// 前 12 字节依次是三个小端 i32，其余全部填零。每次操作都重新从磁盘读取，
/// 不在调用之间缓存。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperBlock {
    pub inode_table_block_count: i32, // inode 表占用块数，0 表示未格式化
    pub chain_table_block_count: i32, // 链表占用块数
    pub free_list_head: i32,          // 空闲链表头，NIL 表示空
}

/// 三个字段编码后的长度
pub const SUPER_BLOCK_FIELDS_SIZE: usize = 3 * 4;

const _: () = assert!(SUPER_BLOCK_FIELDS_SIZE <= SUPER_BLOCK_SIZE);

impl SuperBlock {
    pub fn new(layout: &Layout) -> Self {
        Self {
            inode_table_block_count: layout.inode_table_blocks() as i32,
            chain_table_block_count: layout.chain_table_blocks() as i32,
            free_list_head: 0,
        }
    }

    pub fn is_formatted(&self) -> bool {
        self.inode_table_block_count != 0
    }

    pub fn free_head(&self) -> Option<u32> {
        from_link(self.free_list_head)
    }

    pub fn set_free_head(&mut self, entry: Option<u32>) {
        self.free_list_head = to_link(entry);
    }

    pub fn decode(block: &Block) -> Result<Self> {
        Ok(bincode::deserialize(&block[..SUPER_BLOCK_SIZE])?)
    }

    /// 编码为完整的块，记录之后的字节全部为零
    pub fn encode(&self) -> Result<Block> {
        let mut block = [0u8; BLOCK_SIZE];
        bincode::serialize_into(&mut block[..SUPER_BLOCK_SIZE], self)?;
        Ok(block)
    }

    /// 原样读取超级块，不做任何校验
    pub fn load<S: BlockStore + ?Sized>(disk: &S, ino: u32) -> Result<Self> {
        let mut block = [0u8; BLOCK_SIZE];
        disk.read(ino, SUPER_BLOCK_BLOCK_ID, &mut block)?;
        Self::decode(&block)
    }

    /// 读取超级块，确认设备已经格式化且记录的区域放得进设备
    pub fn load_formatted<S: BlockStore + ?Sized>(disk: &S, ino: u32) -> Result<Self> {
        let sb = Self::load(disk, ino)?;
        if !sb.is_formatted() {
            return Err(FileSystemError::NotFormatted);
        }
        sb.validate(disk.getsize(ino)?)?;
        Ok(sb)
    }

    /// 区域块数必须为正、放得进 `device_blocks`，且所有下标换算都不溢出 u32
    fn validate(&self, device_blocks: u32) -> Result<()> {
        let corrupted = || {
            FileSystemError::Corrupted(format!(
                "superblock region counts {} / {} do not fit a {}-block device",
                self.inode_table_block_count, self.chain_table_block_count, device_blocks
            ))
        };

        let inode_blocks = u32::try_from(self.inode_table_block_count).map_err(|_| corrupted())?;
        let chain_blocks = u32::try_from(self.chain_table_block_count)
            .ok()
            .filter(|&blocks| blocks > 0)
            .ok_or_else(corrupted)?;

        let metadata_blocks = inode_blocks
            .checked_add(chain_blocks)
            .and_then(|blocks| blocks.checked_add(1))
            .filter(|&blocks| blocks <= device_blocks)
            .ok_or_else(corrupted)?;
        inode_blocks
            .checked_mul(INODES_PER_BLOCK)
            .ok_or_else(corrupted)?;
        // 最后一个链表项对应的数据块号
        chain_blocks
            .checked_mul(ENTRIES_PER_BLOCK)
            .and_then(|entries| entries.checked_add(metadata_blocks))
            .ok_or_else(corrupted)?;
        Ok(())
    }

    pub fn sync<S: BlockStore + ?Sized>(&self, disk: &S, ino: u32) -> Result<()> {
        log::trace!("writing superblock {:?}", self);
        disk.write(ino, SUPER_BLOCK_BLOCK_ID, &self.encode()?)
    }
}
