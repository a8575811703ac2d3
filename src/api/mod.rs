pub mod client;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{ConfigUpdate, CreateRequest, SearchFilter};

pub use client::HttpBackend;

/// Excel 导出的默认文件名
pub const EXCEL_FILE_NAME: &str = "admin-system-config.xlsx";

/// 配置后台接口。所有调用都要求非空 userid。
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// POST /Configurations?excelDown=false，返回原始 JSON 信封
    async fn search(&self, filter: &SearchFilter, userid: &str) -> Result<Value>;

    /// POST /Configurations?excelDown=true，返回文件内容
    async fn download_excel(&self, filter: &SearchFilter, userid: &str) -> Result<Vec<u8>>;

    /// POST /Configurations/create
    async fn create(&self, request: &CreateRequest) -> Result<Value>;

    /// POST /Configurations/save?type=edit
    async fn save(&self, updates: &[ConfigUpdate], userid: &str) -> Result<Value>;

    /// POST /Configurations/history，返回原始 JSON 信封
    async fn history(&self, category: &str, config_name: &str, userid: &str) -> Result<Value>;
}
