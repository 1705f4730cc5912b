//! 链表（chain table）：类似 FAT 的单向链表。
//!
//! 第 `i` 项永远对应第 `i` 个数据块。同一张表既承载每个文件的块链，
//! 也承载全局空闲链表，两者只靠各自的根（inode 的 `head` 与超级块的
//! `free_list_head`）区分；这里的遍历逻辑不关心自己走在哪条链上。

use serde::{Deserialize, Serialize};

use crate::{
    disk::{
        block_device::BlockStore,
        types::{Block, BLOCK_SIZE},
    },
    fs::{
        config::{from_link, to_link, CHAIN_ENTRY_SIZE, ENTRIES_PER_BLOCK},
        error::{FileSystemError, Result},
        layout::Layout,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub next: i32,
}

/// 已载入内存的一个链表块
#[derive(Debug)]
pub struct ChainBlock {
    block_no: u32,
    block: Block,
}

impl ChainBlock {
    /// 格式化用：把 `[0, data_blocks)` 串成一条升序空闲链表，
    /// 没有对应数据块的表项一律为链尾。
    pub fn formatted(layout: &Layout, index: u32, data_blocks: u32) -> Result<Self> {
        let first = index * ENTRIES_PER_BLOCK;
        let mut chain_block = Self {
            block_no: layout.chain_block(first),
            block: [0u8; BLOCK_SIZE],
        };
        for entry in first..first + ENTRIES_PER_BLOCK {
            let next = Some(entry + 1).filter(|&n| n < data_blocks);
            chain_block.set(Layout::chain_slot(entry), next)?;
        }
        Ok(chain_block)
    }

    pub fn load<S: BlockStore + ?Sized>(disk: &S, ino: u32, block_no: u32) -> Result<Self> {
        let mut block = [0u8; BLOCK_SIZE];
        disk.read(ino, block_no, &mut block)?;
        Ok(Self { block_no, block })
    }

    pub fn get(&self, slot: usize) -> Result<Option<u32>> {
        let start = slot * CHAIN_ENTRY_SIZE;
        let entry: ChainEntry =
            bincode::deserialize(&self.block[start..start + CHAIN_ENTRY_SIZE])?;
        Ok(from_link(entry.next))
    }

    pub fn set(&mut self, slot: usize, next: Option<u32>) -> Result<()> {
        let start = slot * CHAIN_ENTRY_SIZE;
        let entry = ChainEntry {
            next: to_link(next),
        };
        bincode::serialize_into(&mut self.block[start..start + CHAIN_ENTRY_SIZE], &entry)?;
        Ok(())
    }

    pub fn sync<S: BlockStore + ?Sized>(&self, disk: &S, ino: u32) -> Result<()> {
        disk.write(ino, self.block_no, &self.block)
    }
}

/// 链表遍历器。
///
/// 同一时刻只在内存中保留一个链表块；跨块访问时先把脏块写回，
/// 再载入目标表项所在的块。修改完成后调用者必须 [`ChainTable::flush`]。
pub struct ChainTable<'a, S: BlockStore + ?Sized> {
    disk: &'a S,
    ino: u32,
    layout: Layout,
    cached: Option<ChainBlock>,
    dirty: bool,
}

impl<'a, S: BlockStore + ?Sized> ChainTable<'a, S> {
    pub fn new(disk: &'a S, ino: u32, layout: Layout) -> Self {
        Self {
            disk,
            ino,
            layout,
            cached: None,
            dirty: false,
        }
    }

    fn locate(&mut self, entry: u32) -> Result<&mut ChainBlock> {
        if entry >= self.layout.entry_capacity() {
            return Err(FileSystemError::ChainBroken(format!(
                "entry {} lies outside the chain table ({} entries)",
                entry,
                self.layout.entry_capacity()
            )));
        }

        let block_no = self.layout.chain_block(entry);
        let chain_block = match self.cached.take() {
            Some(cached) if cached.block_no == block_no => cached,
            previous => {
                if let Some(previous) = previous.filter(|_| self.dirty) {
                    previous.sync(self.disk, self.ino)?;
                }
                self.dirty = false;
                log::trace!("loading chain block {}", block_no);
                ChainBlock::load(self.disk, self.ino, block_no)?
            }
        };
        Ok(self.cached.insert(chain_block))
    }

    /// 表项 `entry` 的后继，`None` 表示链尾
    pub fn next(&mut self, entry: u32) -> Result<Option<u32>> {
        self.locate(entry)?.get(Layout::chain_slot(entry))
    }

    pub fn set_next(&mut self, entry: u32, next: Option<u32>) -> Result<()> {
        self.locate(entry)?.set(Layout::chain_slot(entry), next)?;
        self.dirty = true;
        Ok(())
    }

    /// 从 `from` 出发前进 `hops` 步；中途遇到链尾返回 `None`
    pub fn try_walk(&mut self, from: u32, hops: u32) -> Result<Option<u32>> {
        let mut current = from;
        for _ in 0..hops {
            match self.next(current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// 从 `from` 出发前进 `hops` 步，链不够长视为元数据损坏
    pub fn walk(&mut self, from: u32, hops: u32) -> Result<u32> {
        log::trace!("walking {} hops from entry {}", hops, from);
        self.try_walk(from, hops)?.ok_or_else(|| {
            FileSystemError::ChainBroken(format!(
                "chain from entry {} ends before {} hops",
                from, hops
            ))
        })
    }

    /// 把内存中被修改过的链表块写回磁盘
    pub fn flush(&mut self) -> Result<()> {
        if self.dirty {
            if let Some(cached) = &self.cached {
                cached.sync(self.disk, self.ino)?;
            }
            self.dirty = false;
        }
        Ok(())
    }
}
