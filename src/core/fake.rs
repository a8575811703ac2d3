//! 内存版后台，供控制器和 TUI 测试使用

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::ConfigBackend;
use crate::error::{AdminError, Result};
use crate::models::{ConfigRow, ConfigUpdate, CreateRequest, SearchFilter};

pub const EXCEL_BYTES: &[u8] = b"PK\x03\x04fake-xlsx";

#[derive(Default)]
pub struct FakeBackend {
    rows: Mutex<Vec<ConfigRow>>,
    history: Mutex<Value>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, String>>,
    saved: Mutex<Vec<ConfigUpdate>>,
}

impl FakeBackend {
    pub fn with_rows(rows: Vec<ConfigRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            history: Mutex::new(json!({"historyList": []})),
            ..Default::default()
        }
    }

    /// 下一次调用 op 时返回远端错误
    pub fn fail_next(&self, op: &'static str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, message.to_string());
    }

    pub fn set_history(&self, payload: Value) {
        *self.history.lock().unwrap() = payload;
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_saved(&self) -> Vec<ConfigUpdate> {
        self.saved.lock().unwrap().clone()
    }

    fn enter(&self, op: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        match self.failures.lock().unwrap().remove(op) {
            Some(message) => Err(AdminError::Remote {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ConfigBackend for FakeBackend {
    async fn search(&self, filter: &SearchFilter, _userid: &str) -> Result<Value> {
        self.enter("search")?;
        let rows: Vec<ConfigRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.category().contains(filter.category.as_str()))
            .filter(|r| r.config_name().contains(filter.config_name.as_str()))
            .cloned()
            .collect();
        Ok(json!({ "result": { "retData": { "configList": rows } } }))
    }

    async fn download_excel(&self, _filter: &SearchFilter, _userid: &str) -> Result<Vec<u8>> {
        self.enter("excel")?;
        Ok(EXCEL_BYTES.to_vec())
    }

    async fn create(&self, request: &CreateRequest) -> Result<Value> {
        self.enter("create")?;
        self.rows.lock().unwrap().push(ConfigRow::new(
            &request.category,
            &request.config_name,
            &request.config_value,
        ));
        Ok(json!({ "message": "created" }))
    }

    async fn save(&self, updates: &[ConfigUpdate], _userid: &str) -> Result<Value> {
        self.enter("save")?;
        let mut rows = self.rows.lock().unwrap();
        for update in updates {
            if let Some(row) = rows.iter_mut().find(|r| {
                r.category() == update.category && r.config_name() == update.config_name
            }) {
                row.config_value = Some(update.config_value.clone());
            }
        }
        *self.saved.lock().unwrap() = updates.to_vec();
        Ok(json!({ "message": "saved" }))
    }

    async fn history(&self, _category: &str, _config_name: &str, _userid: &str) -> Result<Value> {
        self.enter("history")?;
        Ok(self.history.lock().unwrap().clone())
    }
}
