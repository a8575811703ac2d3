use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::ConfigBackend;
use crate::error::{AdminError, Result};
use crate::models::{scalar_text, ConfigUpdate, CreateRequest, SaveRequest, SearchFilter};

/// 基于 reqwest 的后台实现。启用 cookie 存储，会话凭据随请求携带。
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_configurations(
        &self,
        filter: &SearchFilter,
        userid: &str,
        excel_down: bool,
    ) -> Result<reqwest::Response> {
        let excel_down = if excel_down { "true" } else { "false" };
        let resp = self
            .client
            .post(self.url("/Configurations"))
            .query(&[
                ("category", filter.category.as_str()),
                ("configName", filter.config_name.as_str()),
                ("userid", userid),
                ("excelDown", excel_down),
            ])
            .send()
            .await?;
        Ok(resp)
    }
}

#[async_trait]
impl ConfigBackend for HttpBackend {
    async fn search(&self, filter: &SearchFilter, userid: &str) -> Result<Value> {
        require_userid(userid)?;
        tracing::debug!(category = %filter.category, config_name = %filter.config_name, "POST /Configurations");
        let resp = self.post_configurations(filter, userid, false).await?;
        read_json(resp).await
    }

    async fn download_excel(&self, filter: &SearchFilter, userid: &str) -> Result<Vec<u8>> {
        require_userid(userid)?;
        tracing::debug!(category = %filter.category, config_name = %filter.config_name, "POST /Configurations (excel)");
        let resp = self.post_configurations(filter, userid, true).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AdminError::Remote {
                status: status.as_u16(),
                message: format!("Excel download failed: {}", status.as_u16()),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn create(&self, request: &CreateRequest) -> Result<Value> {
        require_userid(&request.userid)?;
        if request.category.is_empty()
            || request.config_name.is_empty()
            || request.config_value.is_empty()
        {
            return Err(AdminError::validation(
                "category, configName, configValue required",
            ));
        }
        tracing::debug!(category = %request.category, config_name = %request.config_name, "POST /Configurations/create");
        let resp = self
            .client
            .post(self.url("/Configurations/create"))
            .json(request)
            .send()
            .await?;
        read_json(resp).await
    }

    async fn save(&self, updates: &[ConfigUpdate], userid: &str) -> Result<Value> {
        require_userid(userid)?;
        if updates.is_empty() {
            return Err(AdminError::validation("No changes to save"));
        }
        tracing::debug!(count = updates.len(), "POST /Configurations/save");
        let resp = self
            .client
            .post(self.url("/Configurations/save"))
            .query(&[("userid", userid), ("type", "edit")])
            .json(&SaveRequest {
                config_info_arr: updates,
            })
            .send()
            .await?;
        read_json(resp).await
    }

    async fn history(&self, category: &str, config_name: &str, userid: &str) -> Result<Value> {
        require_userid(userid)?;
        tracing::debug!(%category, %config_name, "POST /Configurations/history");
        let resp = self
            .client
            .post(self.url("/Configurations/history"))
            .query(&[
                ("category", category),
                ("configName", config_name),
                ("userid", userid),
            ])
            .send()
            .await?;
        read_json(resp).await
    }
}

fn require_userid(userid: &str) -> Result<()> {
    if userid.is_empty() {
        return Err(AdminError::validation("userid is required"));
    }
    Ok(())
}

/// 读取响应体并按状态码决定成功或失败
async fn read_json(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let text = resp.text().await?;
    let data = parse_body(&text);
    if !status.is_success() {
        return Err(remote_error(status, &data));
    }
    Ok(data)
}

/// 空响应体为 null；非 JSON 文本包成 {"raw": text}
fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "raw": text }))
}

/// 错误信息优先取响应体的 message，其次 error
fn remote_error(status: StatusCode, data: &Value) -> AdminError {
    let message = ["message", "error"]
        .iter()
        .find_map(|field| {
            data.get(*field)
                .cloned()
                .and_then(scalar_text)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| format!("Request failed: {}", status.as_u16()));
    AdminError::Remote {
        status: status.as_u16(),
        message,
    }
}
