use std::ops::Range;

/// 可选的每页条数
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

/// 客户端分页（后端不支持分页），页码从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PAGE_SIZES[0],
        }
    }
}

impl Pager {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// 当前页在完整列表中的下标区间
    pub fn range(&self, total: usize) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }

    /// 修改每页条数并回到第一页；不在可选列表中的值忽略
    pub fn set_page_size(&mut self, size: usize) -> bool {
        if !PAGE_SIZES.contains(&size) {
            return false;
        }
        self.page_size = size;
        self.page = 1;
        true
    }

    /// 切换到下一个可选条数（循环）
    pub fn cycle_page_size(&mut self) {
        let idx = PAGE_SIZES.iter().position(|s| *s == self.page_size).unwrap_or(0);
        self.set_page_size(PAGE_SIZES[(idx + 1) % PAGE_SIZES.len()]);
    }

    pub fn first(&mut self) {
        self.page = 1;
    }

    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn next(&mut self, total: usize) {
        self.page = (self.page + 1).min(self.total_pages(total));
    }

    pub fn last(&mut self, total: usize) {
        self.page = self.total_pages(total);
    }

    pub fn is_first(&self) -> bool {
        self.page == 1
    }

    pub fn is_last(&self, total: usize) -> bool {
        self.page >= self.total_pages(total)
    }
}
