pub mod envelope;
pub mod pager;
pub mod tracker;

#[cfg(test)]
pub(crate) mod fake;

use std::path::{Path, PathBuf};

use crate::api::{ConfigBackend, EXCEL_FILE_NAME};
use crate::error::{AdminError, Result};
use crate::models::{ConfigRow, CreateRequest, HistoryRow, RowKey, SearchFilter};
use pager::Pager;
use tracker::EditTracker;

/// 创建表单
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateForm {
    pub category: String,
    pub config_name: String,
    pub config_value: String,
}

/// 历史弹窗状态，与主表格的加载/错误状态互不影响
#[derive(Debug, Clone, Default)]
pub struct HistoryView {
    pub open: bool,
    pub loading: bool,
    pub title: String,
    pub rows: Vec<HistoryRow>,
}

/// 页面控制器：串联后台调用、编辑跟踪与分页，所有结果都落到状态栏消息上
pub struct PageController<B> {
    backend: B,
    userid: String,
    download_dir: PathBuf,
    filter: SearchFilter,
    rows: Vec<ConfigRow>,
    tracker: EditTracker,
    pager: Pager,
    loading: bool,
    message: String,
    create_form: CreateForm,
    history: HistoryView,
}

impl<B: ConfigBackend> PageController<B> {
    pub fn new(backend: B, userid: impl Into<String>, download_dir: &Path) -> Self {
        Self {
            backend,
            userid: userid.into(),
            download_dir: download_dir.to_path_buf(),
            filter: SearchFilter::default(),
            rows: Vec::new(),
            tracker: EditTracker::new(),
            pager: Pager::default(),
            loading: false,
            message: String::new(),
            create_form: CreateForm::default(),
            history: HistoryView::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn userid(&self) -> &str {
        &self.userid
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut SearchFilter {
        &mut self.filter
    }

    pub fn rows(&self) -> &[ConfigRow] {
        &self.rows
    }

    pub fn tracker(&self) -> &EditTracker {
        &self.tracker
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
    }

    pub fn create_form(&self) -> &CreateForm {
        &self.create_form
    }

    pub fn create_form_mut(&mut self) -> &mut CreateForm {
        &mut self.create_form
    }

    pub fn history(&self) -> &HistoryView {
        &self.history
    }

    pub fn close_history(&mut self) {
        self.history.open = false;
    }

    // ---- 编辑与选择 ----

    pub fn toggle_select(&mut self, key: &RowKey) {
        self.tracker.toggle_select(key);
    }

    pub fn set_edited(&mut self, key: &RowKey, value: impl Into<String>) {
        self.tracker.set_edited(key, value);
    }

    pub fn display_value(&self, row: &ConfigRow) -> String {
        self.tracker.display_value(row)
    }

    // ---- 分页 ----

    /// 当前页的行
    pub fn page_rows(&self) -> &[ConfigRow] {
        &self.rows[self.pager.range(self.rows.len())]
    }

    pub fn total_pages(&self) -> usize {
        self.pager.total_pages(self.rows.len())
    }

    pub fn first_page(&mut self) {
        self.pager.first();
    }

    pub fn prev_page(&mut self) {
        self.pager.prev();
    }

    pub fn next_page(&mut self) {
        self.pager.next(self.rows.len());
    }

    pub fn last_page(&mut self) {
        self.pager.last(self.rows.len());
    }

    pub fn cycle_page_size(&mut self) {
        self.pager.cycle_page_size();
    }

    // ---- 后台操作 ----

    /// 查询。开始前清空编辑状态；失败时清空行。
    pub async fn search(&mut self) -> Result<()> {
        self.loading = true;
        self.message.clear();
        self.tracker.clear();

        let outcome = self.backend.search(&self.filter, &self.userid).await;
        self.loading = false;

        match outcome {
            Ok(payload) => {
                let rows = envelope::parse_config_rows(&payload);
                tracing::info!(
                    category = %self.filter.category,
                    config_name = %self.filter.config_name,
                    count = rows.len(),
                    "search completed"
                );
                self.tracker.record_originals(&rows);
                self.rows = rows;
                self.pager.first();
                Ok(())
            }
            Err(e) => {
                self.rows.clear();
                self.fail("search", e)
            }
        }
    }

    /// 保存选中且已修改的行，返回提交的条数。没有变更时不访问后台，返回 0。
    pub async fn save(&mut self) -> Result<usize> {
        self.message.clear();

        let updates = self.tracker.build_diff();
        if updates.is_empty() {
            self.message = "No changes to save".to_string();
            return Ok(0);
        }

        tracing::info!(count = updates.len(), "saving config changes");
        if let Err(e) = self.backend.save(&updates, &self.userid).await {
            return self.fail("save", e);
        }

        // 以后台为准刷新
        self.search().await?;
        self.message = "Saved successfully".to_string();
        Ok(updates.len())
    }

    /// 提交创建表单，成功后清空表单并刷新
    pub async fn create(&mut self) -> Result<()> {
        self.message.clear();

        // 原样提交，只要求非空
        let form = &self.create_form;
        let request = CreateRequest {
            category: form.category.clone(),
            config_name: form.config_name.clone(),
            config_value: form.config_value.clone(),
            userid: self.userid.clone(),
        };
        if request.category.is_empty()
            || request.config_name.is_empty()
            || request.config_value.is_empty()
        {
            let e = AdminError::validation("Please fill Category, Key Name, and Key Value");
            return self.fail("create", e);
        }

        tracing::info!(category = %request.category, config_name = %request.config_name, "creating config entry");
        if let Err(e) = self.backend.create(&request).await {
            return self.fail("create", e);
        }

        self.create_form = CreateForm::default();
        self.search().await?;
        self.message = "Created successfully".to_string();
        Ok(())
    }

    /// 打开某一行的历史记录
    pub async fn open_history(&mut self, key: RowKey) -> Result<()> {
        self.history = HistoryView {
            open: true,
            loading: true,
            title: format!("{} / {}", key.category, key.config_name),
            rows: Vec::new(),
        };

        let outcome = self
            .backend
            .history(&key.category, &key.config_name, &self.userid)
            .await;
        self.history.loading = false;

        match outcome {
            Ok(payload) => {
                self.history.rows = envelope::parse_history_rows(&payload);
                tracing::info!(key = %key, count = self.history.rows.len(), "history loaded");
                Ok(())
            }
            Err(e) => {
                self.history.rows.clear();
                self.fail("history", e)
            }
        }
    }

    /// 按当前查询条件导出 Excel 到下载目录
    pub async fn download_excel(&mut self) -> Result<PathBuf> {
        self.message.clear();
        match self.write_excel().await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "excel exported");
                self.message = format!("Excel saved to {}", path.display());
                Ok(path)
            }
            Err(e) => self.fail("excel", e),
        }
    }

    async fn write_excel(&self) -> Result<PathBuf> {
        let bytes = self.backend.download_excel(&self.filter, &self.userid).await?;
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let path = self.download_dir.join(EXCEL_FILE_NAME);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    fn fail<T>(&mut self, op: &str, e: AdminError) -> Result<T> {
        tracing::warn!(op, error = %e, "operation failed");
        self.message = e.to_string();
        Err(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::FakeBackend;
    use serde_json::json;
    use tempfile::TempDir;

    fn seeded() -> FakeBackend {
        FakeBackend::with_rows(vec![
            ConfigRow::new("MAIL", "smtp.host", "mx.example.com"),
            ConfigRow::new("MAIL", "smtp.port", "25"),
            ConfigRow::new("JOB", "batch.size", "100"),
        ])
    }

    fn controller(backend: FakeBackend, dir: &Path) -> PageController<FakeBackend> {
        PageController::new(backend, "admin", dir)
    }

    #[tokio::test]
    async fn test_search_populates_rows_and_originals() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(seeded(), tmp.path());
        page.search().await.unwrap();

        assert_eq!(page.rows().len(), 3);
        assert_eq!(page.message(), "");
        assert!(!page.is_loading());
        let key = RowKey::new("MAIL", "smtp.port");
        assert_eq!(page.tracker().record(&key).unwrap().original.as_deref(), Some("25"));
    }

    #[tokio::test]
    async fn test_search_uses_filter() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(seeded(), tmp.path());
        page.filter_mut().category = "MAIL".to_string();
        page.filter_mut().config_name = "port".to_string();
        page.search().await.unwrap();
        assert_eq!(page.rows().len(), 1);
        assert_eq!(page.rows()[0].config_name(), "smtp.port");
    }

    #[tokio::test]
    async fn test_search_failure_clears_rows() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(seeded(), tmp.path());
        page.search().await.unwrap();
        page.backend().fail_next("search", "backend exploded");

        assert!(page.search().await.is_err());
        assert!(page.rows().is_empty());
        assert_eq!(page.message(), "backend exploded");
    }

    #[tokio::test]
    async fn test_search_resets_edits_and_page() {
        let tmp = TempDir::new().unwrap();
        let backend = FakeBackend::with_rows(
            (0..30)
                .map(|i| ConfigRow::new("BULK", &format!("k{i:02}"), "v"))
                .collect(),
        );
        let mut page = controller(backend, tmp.path());
        page.search().await.unwrap();
        page.next_page();
        let key = RowKey::new("BULK", "k00");
        page.toggle_select(&key);
        page.set_edited(&key, "changed");

        page.search().await.unwrap();
        assert_eq!(page.pager().page(), 1);
        assert!(!page.tracker().is_selected(&key));
        assert!(page.tracker().build_diff().is_empty());
    }

    #[tokio::test]
    async fn test_save_with_empty_diff_skips_backend() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(seeded(), tmp.path());
        page.search().await.unwrap();
        // 选中但未修改
        page.toggle_select(&RowKey::new("MAIL", "smtp.host"));

        assert_eq!(page.save().await.unwrap(), 0);
        assert_eq!(page.message(), "No changes to save");
        assert_eq!(page.backend().calls_to("save"), 0);
    }

    #[tokio::test]
    async fn test_save_sends_diff_and_refreshes() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(seeded(), tmp.path());
        page.search().await.unwrap();
        let key = RowKey::new("MAIL", "smtp.port");
        page.toggle_select(&key);
        page.set_edited(&key, "587");
        // 未选中的编辑不提交
        page.set_edited(&RowKey::new("JOB", "batch.size"), "999");

        assert_eq!(page.save().await.unwrap(), 1);
        assert_eq!(page.message(), "Saved successfully");
        assert_eq!(page.backend().calls_to("search"), 2);

        let saved = page.backend().last_saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].config_value, "587");

        // 刷新后原值已是新值，编辑状态清空
        assert_eq!(page.tracker().record(&key).unwrap().original.as_deref(), Some("587"));
        assert!(!page.tracker().is_selected(&key));
        let batch = page.rows().iter().find(|r| r.config_name() == "batch.size").unwrap();
        assert_eq!(page.display_value(batch), "100");
    }

    #[tokio::test]
    async fn test_save_failure_keeps_edits() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(seeded(), tmp.path());
        page.search().await.unwrap();
        let key = RowKey::new("MAIL", "smtp.port");
        page.toggle_select(&key);
        page.set_edited(&key, "587");
        page.backend().fail_next("save", "permission denied");

        assert!(page.save().await.is_err());
        assert_eq!(page.message(), "permission denied");
        assert_eq!(page.tracker().build_diff().len(), 1);
        assert_eq!(page.backend().calls_to("search"), 1);
    }

    #[tokio::test]
    async fn test_create_validation_is_local() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(seeded(), tmp.path());
        page.create_form_mut().category = "JOB".to_string();
        page.create_form_mut().config_value = "1".to_string();

        let err = page.create().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(page.message(), "Please fill Category, Key Name, and Key Value");
        assert_eq!(page.backend().calls_to("create"), 0);
        // 表单保留
        assert_eq!(page.create_form().category, "JOB");
    }

    #[tokio::test]
    async fn test_create_resets_form_and_refreshes() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(seeded(), tmp.path());
        *page.create_form_mut() = CreateForm {
            category: "JOB".to_string(),
            config_name: "retry.max".to_string(),
            config_value: "3".to_string(),
        };

        page.create().await.unwrap();
        assert_eq!(page.message(), "Created successfully");
        assert_eq!(page.create_form(), &CreateForm::default());
        assert_eq!(page.rows().len(), 4);
        assert_eq!(page.backend().calls_to("search"), 1);
    }

    #[tokio::test]
    async fn test_create_submits_fields_unchanged() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(FakeBackend::default(), tmp.path());
        *page.create_form_mut() = CreateForm {
            category: "JOB".to_string(),
            config_name: "sep".to_string(),
            config_value: " , ".to_string(),
        };

        page.create().await.unwrap();
        assert_eq!(page.backend().calls_to("create"), 1);
        assert_eq!(page.rows().len(), 1);
        assert_eq!(page.rows()[0].config_value.as_deref(), Some(" , "));
    }

    #[tokio::test]
    async fn test_create_accepts_whitespace_value() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(FakeBackend::default(), tmp.path());
        *page.create_form_mut() = CreateForm {
            category: "JOB".to_string(),
            config_name: "pad".to_string(),
            config_value: "  ".to_string(),
        };

        page.create().await.unwrap();
        assert_eq!(page.message(), "Created successfully");
        assert_eq!(page.rows()[0].config_value.as_deref(), Some("  "));
    }

    #[tokio::test]
    async fn test_open_history() {
        let tmp = TempDir::new().unwrap();
        let backend = seeded();
        backend.set_history(json!({"result": {"retData": {"historyList": [
            {"keyCategory": "MAIL", "keyName": "smtp.port", "keyValue": "25", "action": "CREATE"},
            {"category": "MAIL", "configName": "smtp.port", "configValue": "587", "action": "UPDATE"}
        ]}}}));
        let mut page = controller(backend, tmp.path());

        page.open_history(RowKey::new("MAIL", "smtp.port")).await.unwrap();
        let history = page.history();
        assert!(history.open);
        assert!(!history.loading);
        assert_eq!(history.title, "MAIL / smtp.port");
        assert_eq!(history.rows.len(), 2);
        assert_eq!(history.rows[1].config_value(), "587");

        page.close_history();
        assert!(!page.history().open);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_touch_table() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(seeded(), tmp.path());
        page.search().await.unwrap();
        page.backend().fail_next("history", "no audit table");

        assert!(page.open_history(RowKey::new("JOB", "batch.size")).await.is_err());
        assert!(page.history().open);
        assert!(page.history().rows.is_empty());
        assert_eq!(page.message(), "no audit table");
        assert_eq!(page.rows().len(), 3);
    }

    #[tokio::test]
    async fn test_download_excel_writes_file() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("exports");
        let mut page = controller(seeded(), &out);

        let path = page.download_excel().await.unwrap();
        assert_eq!(path, out.join(EXCEL_FILE_NAME));
        assert_eq!(std::fs::read(&path).unwrap(), fake::EXCEL_BYTES);
        assert!(page.message().starts_with("Excel saved to"));
    }

    #[tokio::test]
    async fn test_download_excel_failure() {
        let tmp = TempDir::new().unwrap();
        let mut page = controller(seeded(), tmp.path());
        page.backend().fail_next("excel", "Excel download failed: 500");
        assert!(page.download_excel().await.is_err());
        assert_eq!(page.message(), "Excel download failed: 500");
        assert!(!tmp.path().join(EXCEL_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_page_rows_follow_pager() {
        let tmp = TempDir::new().unwrap();
        let backend = FakeBackend::with_rows(
            (0..23)
                .map(|i| ConfigRow::new("BULK", &format!("k{i:02}"), "v"))
                .collect(),
        );
        let mut page = controller(backend, tmp.path());
        page.search().await.unwrap();

        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.page_rows().len(), 10);
        page.last_page();
        assert_eq!(page.page_rows().len(), 3);
        assert_eq!(page.page_rows()[0].config_name(), "k20");
        page.cycle_page_size();
        assert_eq!(page.pager().page(), 1);
        assert_eq!(page.page_rows().len(), 23);
    }
}
