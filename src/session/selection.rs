// ==========================================
// FatturaAnalyzer 导入核心 - 选择状态
// ==========================================
// 职责: 记录有效记录中哪些被勾选提交
// 红线: 新预览生成后默认全选；移除文件后清空
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: BTreeSet<usize>, // 有效记录列表中的下标
    len: usize,                // 有效记录总数
}

impl SelectionSet {
    /// 按有效记录数重新播种，默认全选
    pub fn seed_all(len: usize) -> Self {
        Self {
            selected: (0..len).collect(),
            len,
        }
    }

    pub fn select_all(&mut self) {
        self.selected = (0..self.len).collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// 切换单条记录的勾选状态
    ///
    /// # 返回
    /// - Ok(true): 切换后为选中
    /// - Ok(false): 切换后为未选中
    /// - Err(SelectionOutOfRange): 下标越界，集合不变
    pub fn toggle(&mut self, index: usize) -> ImportResult<bool> {
        if index >= self.len {
            return Err(ImportError::SelectionOutOfRange {
                index,
                len: self.len,
            });
        }
        if self.selected.remove(&index) {
            Ok(false)
        } else {
            self.selected.insert(index);
            Ok(true)
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// 已选下标（升序，即文件顺序）
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// 可选记录总数
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// 移除文件时调用
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
