use serde::{Deserialize, Serialize};

use crate::{
    disk::{
        block_device::BlockStore,
        types::{Block, BLOCK_SIZE},
    },
    fs::{
        config::{from_link, to_link, INODES_PER_BLOCK, INODE_RECORD_SIZE, NIL},
        error::Result,
    },
};

/// inode 记录：只有长度和链表头，紧密排列在 inode 块中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    pub size: i32, // 已分配的块数，合法偏移为 [0, size)
    pub head: i32, // 第一个链表项，NIL 表示空链
}

impl Inode {
    pub fn empty() -> Self {
        Self { size: 0, head: NIL }
    }

    pub fn block_count(&self) -> u32 {
        self.size.max(0) as u32
    }

    pub fn head_entry(&self) -> Option<u32> {
        from_link(self.head)
    }

    pub fn set_head(&mut self, entry: Option<u32>) {
        self.head = to_link(entry);
    }

    /// `head` 为空当且仅当 `size` 为 0
    pub fn is_consistent(&self) -> bool {
        self.size >= 0 && (self.size == 0) == self.head_entry().is_none()
    }
}

/// 已载入内存的一个 inode 块
#[derive(Debug)]
pub struct InodeTable {
    block_no: u32,
    block: Block,
}

impl InodeTable {
    /// 格式化用：所有槽位都是空 inode
    pub fn formatted(block_no: u32) -> Result<Self> {
        let mut table = Self {
            block_no,
            block: [0u8; BLOCK_SIZE],
        };
        for slot in 0..INODES_PER_BLOCK as usize {
            table.set_inode(slot, &Inode::empty())?;
        }
        Ok(table)
    }

    pub fn load<S: BlockStore + ?Sized>(disk: &S, ino: u32, block_no: u32) -> Result<Self> {
        let mut block = [0u8; BLOCK_SIZE];
        disk.read(ino, block_no, &mut block)?;
        Ok(Self { block_no, block })
    }

    pub fn block_no(&self) -> u32 {
        self.block_no
    }

    pub fn get_inode(&self, slot: usize) -> Result<Inode> {
        let start = slot * INODE_RECORD_SIZE;
        Ok(bincode::deserialize(
            &self.block[start..start + INODE_RECORD_SIZE],
        )?)
    }

    pub fn set_inode(&mut self, slot: usize, inode: &Inode) -> Result<()> {
        let start = slot * INODE_RECORD_SIZE;
        bincode::serialize_into(&mut self.block[start..start + INODE_RECORD_SIZE], inode)?;
        Ok(())
    }

    pub fn sync<S: BlockStore + ?Sized>(&self, disk: &S, ino: u32) -> Result<()> {
        disk.write(ino, self.block_no, &self.block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_packed() {
        let mut table = InodeTable::formatted(1).unwrap();
        assert_eq!(table.get_inode(3).unwrap(), Inode::empty());

        let inode = Inode { size: 2, head: 7 };
        table.set_inode(1, &inode).unwrap();
        assert_eq!(&table.block[8..16], &[2, 0, 0, 0, 7, 0, 0, 0]);
        assert_eq!(table.get_inode(1).unwrap(), inode);
        // 相邻槽位不受影响
        assert_eq!(table.get_inode(0).unwrap(), Inode::empty());
        assert_eq!(table.get_inode(2).unwrap(), Inode::empty());
    }

    #[test]
    fn consistency() {
        assert!(Inode::empty().is_consistent());
        assert!(Inode { size: 1, head: 0 }.is_consistent());
        assert!(!Inode { size: 0, head: 3 }.is_consistent());
        assert!(!Inode { size: 2, head: NIL }.is_consistent());
        assert!(!Inode { size: -1, head: NIL }.is_consistent());
    }
}
