//! 后端响应的列表提取。
//!
//! 后端历史上返回过多种包装结构，这里按固定顺序逐个尝试，第一个命中即返回：
//! 1. 响应本身是数组
//! 2. `result.retData.<list>`
//! 3. `retData.<list>`
//! 4. `<list>`
//!
//! 旧接口还会把整个信封编码成 JSON 字符串返回，这种情况先解码一次再按同样顺序匹配。

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{ConfigRow, HistoryRow};

/// 列表字段的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Config,
    History,
}

impl ListKind {
    pub fn field(self) -> &'static str {
        match self {
            ListKind::Config => "configList",
            ListKind::History => "historyList",
        }
    }
}

/// 提取列表；无法识别的结构返回空列表，不报错
pub fn extract_list(payload: &Value, kind: ListKind) -> Vec<Value> {
    match payload {
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            // 只解码一层
            Ok(decoded) if !decoded.is_string() => match_shapes(&decoded, kind),
            _ => Vec::new(),
        },
        other => match_shapes(other, kind),
    }
}

fn match_shapes(payload: &Value, kind: ListKind) -> Vec<Value> {
    if let Value::Array(items) = payload {
        return items.clone();
    }

    let field = kind.field();
    let candidates = [
        payload.get("result").and_then(|r| r.get("retData")).and_then(|d| d.get(field)),
        payload.get("retData").and_then(|d| d.get(field)),
        payload.get(field),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_array().cloned())
        .unwrap_or_default()
}

pub fn parse_config_rows(payload: &Value) -> Vec<ConfigRow> {
    parse_rows(extract_list(payload, ListKind::Config))
}

pub fn parse_history_rows(payload: &Value) -> Vec<HistoryRow> {
    parse_rows(extract_list(payload, ListKind::History))
}

fn parse_rows<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            if !item.is_object() {
                tracing::warn!(index = idx, "skipping non-object list entry");
                return None;
            }
            match serde_json::from_value::<T>(item) {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::warn!(index = idx, error = %e, "skipping malformed list entry");
                    None
                }
            }
        })
        .collect()
}
