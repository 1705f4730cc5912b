use crate::{
    disk::block_device::BlockStore,
    fs::{
        chain_table::ChainTable,
        config::INODES_PER_BLOCK,
        error::{FileSystemError, Result},
        inode_table::InodeTable,
        layout::Layout,
        ChainFs,
    },
};

/// 一致性检查的结果，单位都是链表项（即数据块）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub total: u32,  // 格式化时有数据块对应的表项数
    pub free: u32,   // 空闲链表上的表项
    pub used: u32,   // 挂在某个 inode 上的表项
    pub leaked: u32, // 哪条链都到不了的表项
}

/// 记录每个表项是否已经被某条链访问过
struct Marks<'a, 'b, S: BlockStore> {
    chain: ChainTable<'a, S>,
    seen: &'b mut [bool],
}

impl<S: BlockStore> Marks<'_, '_, S> {
    /// 沿 `head` 走到链尾，返回经过的表项数
    fn mark(&mut self, head: Option<u32>, owner: &str) -> Result<u32> {
        let mut count = 0;
        let mut current = head;
        while let Some(entry) = current {
            let seen = self.seen.get_mut(entry as usize).ok_or_else(|| {
                FileSystemError::ChainBroken(format!(
                    "{} links to entry {} past the data region",
                    owner, entry
                ))
            })?;
            if *seen {
                return Err(FileSystemError::Corrupted(format!(
                    "entry {} reached twice (again from {})",
                    entry, owner
                )));
            }
            *seen = true;
            count += 1;
            current = self.chain.next(entry)?;
        }
        Ok(count)
    }

    /// 格式化时挂进空闲链表的表项数。
    ///
    /// 超级块不记录格式化时的设备大小，下层之后可能被扩大，所以只在最后一个
    /// 链表块里推断：有链经过或与其他表项相连的表项一定有数据块。
    /// 最后一块里孤立的 NIL 表项无法与从未分配过的槽位区分。
    fn formatted_extent(&mut self, full: u32, backed: u32) -> Result<u32> {
        let mut extent = full.min(backed);
        for entry in extent..backed {
            if self.seen[entry as usize] {
                extent = extent.max(entry + 1);
            } else if let Some(next) = self.chain.next(entry)? {
                extent = extent.max(entry + 1).max(next + 1);
            }
        }
        Ok(extent.min(backed))
    }
}

impl<S: BlockStore> ChainFs<S> {
    /// 检查空闲链表与所有文件链是否恰好划分了格式化时的全部数据块。只读。
    pub fn check(&self) -> Result<Usage> {
        let sb = self.super_block()?;
        let layout = Layout::of(&sb);
        let backed = layout.data_block_count(self.below().getsize(self.below_ino())?);

        let mut seen = vec![false; backed as usize];
        let mut marks = Marks {
            chain: ChainTable::new(self.below(), self.below_ino(), layout),
            seen: &mut seen,
        };

        let free = marks.mark(sb.free_head(), "free list")?;

        let mut used = 0;
        for index in 0..layout.inode_table_blocks() {
            let first = index * INODES_PER_BLOCK;
            let table =
                InodeTable::load(self.below(), self.below_ino(), layout.inode_block(first))?;
            for ino in first..first + INODES_PER_BLOCK {
                let inode = table.get_inode(Layout::inode_slot(ino))?;
                if !inode.is_consistent() {
                    return Err(FileSystemError::ChainBroken(format!(
                        "inode {} has size {} and head {}",
                        ino, inode.size, inode.head
                    )));
                }

                let length = marks.mark(inode.head_entry(), &format!("inode {}", ino))?;
                if length != inode.block_count() {
                    return Err(FileSystemError::ChainBroken(format!(
                        "inode {} has size {} but its chain holds {} blocks",
                        ino,
                        inode.block_count(),
                        length
                    )));
                }
                used += length;
            }
        }

        let total = marks.formatted_extent(layout.full_chain_entries(), backed)?;
        let usage = Usage {
            total,
            free,
            used,
            leaked: total - free - used,
        };
        log::debug!("check: {:?}", usage);
        Ok(usage)
    }
}
