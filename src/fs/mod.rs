use log::debug;

use crate::{
    disk::{block_device::BlockStore, types::Block},
    fs::{
        chain_table::ChainTable,
        error::{FileSystemError, Result},
        inode_table::{Inode, InodeTable},
        layout::Layout,
        super_block::SuperBlock,
    },
};

pub mod chain_table;
pub mod check;
pub mod config;
pub mod error;
pub mod format;
pub mod inode_table;
pub mod layout;
pub mod super_block;

/// 基于链表分配的文件系统。
///
/// 以 `below` 的第 `below_ino` 号资源为磁盘，把每个 inode 重新暴露为一个
/// 块存储资源，所以本身也实现了 [`BlockStore`]，可以继续叠加。
/// 不缓存任何元数据：每次调用都重新读取超级块。
#[derive(Debug)]
pub struct ChainFs<S: BlockStore> {
    below: S,
    below_ino: u32,
}

/// 一次调用中载入的超级块与目标 inode
struct InodeContext {
    sb: SuperBlock,
    layout: Layout,
    table: InodeTable,
    ino: u32,
    inode: Inode,
}

impl<S: BlockStore> ChainFs<S> {
    pub fn new(below: S, below_ino: u32) -> Self {
        Self { below, below_ino }
    }

    /// 格式化（已格式化则什么都不做）并挂载
    pub fn format(below: S, below_ino: u32, inode_count: u32) -> Result<Self> {
        format::create(&below, below_ino, inode_count)?;
        Ok(Self::new(below, below_ino))
    }

    pub fn below(&self) -> &S {
        &self.below
    }

    pub fn below_ino(&self) -> u32 {
        self.below_ino
    }

    pub fn into_inner(self) -> S {
        self.below
    }

    pub fn super_block(&self) -> Result<SuperBlock> {
        SuperBlock::load_formatted(&self.below, self.below_ino)
    }

    pub fn inode_count(&self) -> Result<u32> {
        Ok(Layout::of(&self.super_block()?).inode_capacity())
    }

    fn load_inode(&self, ino: u32) -> Result<InodeContext> {
        let sb = self.super_block()?;
        let layout = Layout::of(&sb);
        if ino >= layout.inode_capacity() {
            return Err(FileSystemError::InvalidInode(ino));
        }

        let table = InodeTable::load(&self.below, self.below_ino, layout.inode_block(ino))?;
        let inode = table.get_inode(Layout::inode_slot(ino))?;
        if !inode.is_consistent() {
            return Err(FileSystemError::ChainBroken(format!(
                "inode {} has size {} and head {}",
                ino, inode.size, inode.head
            )));
        }

        Ok(InodeContext {
            sb,
            layout,
            table,
            ino,
            inode,
        })
    }

    fn sync_inode(&self, ctx: &mut InodeContext) -> Result<()> {
        ctx.table.set_inode(Layout::inode_slot(ctx.ino), &ctx.inode)?;
        ctx.table.sync(&self.below, self.below_ino)
    }

    fn chain(&self, layout: Layout) -> ChainTable<'_, S> {
        ChainTable::new(&self.below, self.below_ino, layout)
    }

    /// 第 `offset` 个块对应的链表项
    fn entry_at(
        &self,
        ctx: &InodeContext,
        chain: &mut ChainTable<'_, S>,
        offset: u32,
    ) -> Result<u32> {
        let head = ctx.inode.head_entry().ok_or_else(|| {
            FileSystemError::ChainBroken(format!("inode {} has no blocks", ctx.ino))
        })?;
        chain.walk(head, offset)
    }

    /// 读取 inode `ino` 的第 `offset` 块
    pub fn read(&self, ino: u32, offset: u32, buf: &mut Block) -> Result<()> {
        let ctx = self.load_inode(ino)?;
        let size = ctx.inode.block_count();
        if offset >= size {
            return Err(FileSystemError::OffsetOutOfRange { ino, offset, size });
        }

        let mut chain = self.chain(ctx.layout);
        let entry = self.entry_at(&ctx, &mut chain, offset)?;
        debug!("read inode {} offset {} -> entry {}", ino, offset, entry);
        self.below
            .read(self.below_ino, ctx.layout.data_block(entry), buf)
    }

    /// 写入 inode `ino` 的第 `offset` 块；超出当前长度时先扩展块链
    pub fn write(&self, ino: u32, offset: u32, buf: &Block) -> Result<()> {
        let mut ctx = self.load_inode(ino)?;
        let size = ctx.inode.block_count();
        let mut chain = self.chain(ctx.layout);

        let entry = if offset < size {
            self.entry_at(&ctx, &mut chain, offset)?
        } else {
            self.grow(&mut ctx, &mut chain, (offset - size).saturating_add(1))?
        };
        debug!("write inode {} offset {} -> entry {}", ino, offset, entry);
        self.below
            .write(self.below_ino, ctx.layout.data_block(entry), buf)
    }

    /// inode `ino` 当前占用的块数
    pub fn getsize(&self, ino: u32) -> Result<u32> {
        Ok(self.load_inode(ino)?.inode.block_count())
    }

    /// 把 inode `ino` 调整为 `nblocks` 块。
    ///
    /// 释放的块不清零，之后重新扩展时可能读到旧数据。
    pub fn setsize(&self, ino: u32, nblocks: u32) -> Result<()> {
        let mut ctx = self.load_inode(ino)?;
        let size = ctx.inode.block_count();
        if nblocks == size {
            return Ok(());
        }

        let mut chain = self.chain(ctx.layout);
        if nblocks < size {
            self.shrink(&mut ctx, &mut chain, nblocks)
        } else {
            self.grow(&mut ctx, &mut chain, nblocks - size).map(|_| ())
        }
    }

    /// 从空闲链表头摘下 `count` 项接到文件链尾，返回新的链尾。
    ///
    /// 空闲项不足时返回 `DiskFull`，此时磁盘未做任何修改。
    fn grow(
        &self,
        ctx: &mut InodeContext,
        chain: &mut ChainTable<'_, S>,
        count: u32,
    ) -> Result<u32> {
        let size = ctx.inode.block_count();
        let new_size = size
            .checked_add(count)
            .and_then(|n| i32::try_from(n).ok())
            .ok_or(FileSystemError::DiskFull)?;

        // 先只读地找齐所有位置
        let tail = match ctx.inode.head_entry() {
            Some(head) => {
                let tail = chain.walk(head, size - 1)?;
                if chain.next(tail)?.is_some() {
                    return Err(FileSystemError::ChainBroken(format!(
                        "inode {} chain is longer than {} blocks",
                        ctx.ino, size
                    )));
                }
                Some(tail)
            }
            None => None,
        };
        let first = ctx.sb.free_head().ok_or(FileSystemError::DiskFull)?;
        let last = chain
            .try_walk(first, count - 1)?
            .ok_or(FileSystemError::DiskFull)?;
        let rest = chain.next(last)?;

        debug!(
            "inode {}: allocating {} entries {}..={} after {:?}",
            ctx.ino, count, first, last, tail
        );

        ctx.sb.set_free_head(rest);
        ctx.sb.sync(&self.below, self.below_ino)?;

        chain.set_next(last, None)?;
        match tail {
            Some(tail) => chain.set_next(tail, Some(first))?,
            None => ctx.inode.set_head(Some(first)),
        }
        chain.flush()?;

        ctx.inode.size = new_size;
        self.sync_inode(ctx)?;
        Ok(last)
    }

    /// 截断到 `nblocks` 块，把多出来的一段整体挂到空闲链表头
    fn shrink(
        &self,
        ctx: &mut InodeContext,
        chain: &mut ChainTable<'_, S>,
        nblocks: u32,
    ) -> Result<()> {
        let size = ctx.inode.block_count();
        let head = ctx.inode.head_entry().ok_or_else(|| {
            FileSystemError::ChainBroken(format!("inode {} has no blocks", ctx.ino))
        })?;

        let (keep_tail, detached_head) = if nblocks == 0 {
            (None, head)
        } else {
            let keep_tail = chain.walk(head, nblocks - 1)?;
            let detached_head = chain.next(keep_tail)?.ok_or_else(|| {
                FileSystemError::ChainBroken(format!(
                    "inode {} chain ends after {} blocks",
                    ctx.ino, nblocks
                ))
            })?;
            (Some(keep_tail), detached_head)
        };
        let detached_tail = chain.walk(detached_head, size - nblocks - 1)?;
        if chain.next(detached_tail)?.is_some() {
            return Err(FileSystemError::ChainBroken(format!(
                "inode {} chain is longer than {} blocks",
                ctx.ino, size
            )));
        }

        debug!(
            "inode {}: releasing {} entries {}..={}",
            ctx.ino,
            size - nblocks,
            detached_head,
            detached_tail
        );

        chain.set_next(detached_tail, ctx.sb.free_head())?;
        match keep_tail {
            Some(keep_tail) => chain.set_next(keep_tail, None)?,
            None => ctx.inode.set_head(None),
        }
        ctx.sb.set_free_head(Some(detached_head));

        ctx.sb.sync(&self.below, self.below_ino)?;
        chain.flush()?;
        ctx.inode.size = nblocks as i32;
        self.sync_inode(ctx)
    }
}

impl<S: BlockStore> BlockStore for ChainFs<S> {
    fn read(&self, ino: u32, block_no: u32, buf: &mut Block) -> Result<()> {
        ChainFs::read(self, ino, block_no, buf)
    }

    fn write(&self, ino: u32, block_no: u32, buf: &Block) -> Result<()> {
        ChainFs::write(self, ino, block_no, buf)
    }

    fn getsize(&self, ino: u32) -> Result<u32> {
        ChainFs::getsize(self, ino)
    }

    fn setsize(&self, ino: u32, nblocks: u32) -> Result<()> {
        ChainFs::setsize(self, ino, nblocks)
    }
}
