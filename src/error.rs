#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// 本地校验失败，未发出任何请求
    #[error("{0}")]
    Validation(String),

    /// 服务端返回非成功状态码
    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AdminError::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AdminError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
