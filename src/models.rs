use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// 行键字符串形式的分隔符
pub const KEY_SEPARATOR: &str = "|||";

/// 配置行（后端返回的其他字段原样保留在 extra 中）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRow {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub config_value: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ConfigRow {
    pub fn new(category: &str, config_name: &str, config_value: &str) -> Self {
        Self {
            category: Some(category.to_string()),
            config_name: Some(config_name.to_string()),
            config_value: Some(config_value.to_string()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }

    pub fn config_name(&self) -> &str {
        self.config_name.as_deref().unwrap_or("")
    }

    pub fn key(&self) -> RowKey {
        RowKey::of(self)
    }
}

/// 配置行的身份：(category, configName)，缺失字段视为空串
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub category: String,
    pub config_name: String,
}

impl RowKey {
    pub fn new(category: impl Into<String>, config_name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            config_name: config_name.into(),
        }
    }

    pub fn of(row: &ConfigRow) -> Self {
        Self::new(row.category(), row.config_name())
    }

    /// 从字符串形式还原，按第一个分隔符切分
    pub fn parse(s: &str) -> Self {
        match s.split_once(KEY_SEPARATOR) {
            Some((category, name)) => Self::new(category, name),
            None => Self::new(s, ""),
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.category, KEY_SEPARATOR, self.config_name)
    }
}

/// 保存 diff 中的一条
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub category: String,
    pub config_name: String,
    pub config_value: String,
}

/// POST /Configurations/save 的请求体
#[derive(Debug, Serialize)]
pub struct SaveRequest<'a> {
    #[serde(rename = "configInfoArr")]
    pub config_info_arr: &'a [ConfigUpdate],
}

/// POST /Configurations/create 的请求体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub category: String,
    pub config_name: String,
    pub config_value: String,
    pub userid: String,
}

/// 查询条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub category: String,
    pub config_name: String,
}

/// 历史记录行。新旧两套字段名都可能出现，访问器取第一个非空值。
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub key_category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub config_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub key_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub config_value: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub key_value: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_by: Option<String>,
}

impl HistoryRow {
    pub fn category(&self) -> &str {
        first_non_empty(&self.category, &self.key_category)
    }

    pub fn config_name(&self) -> &str {
        first_non_empty(&self.config_name, &self.key_name)
    }

    pub fn config_value(&self) -> &str {
        first_non_empty(&self.config_value, &self.key_value)
    }

    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or("")
    }

    pub fn updated_date(&self) -> &str {
        self.updated_date.as_deref().unwrap_or("")
    }

    pub fn updated_by(&self) -> &str {
        self.updated_by.as_deref().unwrap_or("")
    }
}

fn first_non_empty<'a>(primary: &'a Option<String>, fallback: &'a Option<String>) -> &'a str {
    match primary.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => fallback.as_deref().unwrap_or(""),
    }
}

/// 标量值统一转成字符串（后端偶尔把数值、布尔直接放进 JSON）
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_text))
}

pub(crate) fn scalar_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
