use indexmap::{IndexMap, IndexSet};

use crate::models::{ConfigRow, ConfigUpdate, RowKey};

/// 单行的编辑状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowEdit {
    /// 查询时捕获的原值
    pub original: Option<String>,
    /// 用户输入的新值
    pub edited: Option<String>,
}

impl RowEdit {
    /// 当前值：有编辑取编辑值，否则取原值
    pub fn current(&self) -> Option<&str> {
        self.edited.as_deref().or(self.original.as_deref())
    }

    /// 是否为需要保存的变更
    pub fn is_changed(&self) -> bool {
        match self.current() {
            Some(current) => Some(current) != self.original.as_deref(),
            None => false,
        }
    }
}

/// 编辑/选择跟踪器。每个行键一条记录；选中集合按勾选顺序保存
#[derive(Debug, Default)]
pub struct EditTracker {
    records: IndexMap<RowKey, RowEdit>,
    selection: IndexSet<RowKey>,
}

impl EditTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.selection.clear();
    }

    /// 清空后记录每行原值
    pub fn record_originals(&mut self, rows: &[ConfigRow]) {
        self.clear();
        for row in rows {
            let entry = self.records.entry(row.key()).or_default();
            entry.original = row.config_value.clone();
        }
    }

    /// 取消后再勾选会排到末尾
    pub fn toggle_select(&mut self, key: &RowKey) {
        if !self.selection.shift_remove(key) {
            self.selection.insert(key.clone());
        }
    }

    pub fn set_edited(&mut self, key: &RowKey, value: impl Into<String>) {
        self.records.entry(key.clone()).or_default().edited = Some(value.into());
    }

    pub fn is_selected(&self, key: &RowKey) -> bool {
        self.selection.contains(key)
    }

    pub fn is_dirty(&self, key: &RowKey) -> bool {
        self.records.get(key).map(RowEdit::is_changed).unwrap_or(false)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn record(&self, key: &RowKey) -> Option<&RowEdit> {
        self.records.get(key)
    }

    pub fn display_value(&self, row: &ConfigRow) -> String {
        self.records
            .get(&row.key())
            .and_then(|r| r.edited.clone())
            .or_else(|| row.config_value.clone())
            .unwrap_or_default()
    }

    /// 按勾选顺序输出值确实变化的行。与原值相同的编辑即使仍被选中也跳过。
    pub fn build_diff(&self) -> Vec<ConfigUpdate> {
        self.selection
            .iter()
            .filter_map(|key| {
                let record = self.records.get(key).filter(|r| r.is_changed())?;
                record.current().map(|value| ConfigUpdate {
                    category: key.category.clone(),
                    config_name: key.config_name.clone(),
                    config_value: value.to_string(),
                })
            })
            .collect()
    }
}
