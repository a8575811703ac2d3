use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::models::RowKey;

/// 命令行参数，未指定时回落到环境变量
#[derive(Debug, Parser)]
#[command(
    name = "config-admin",
    version,
    about = "Search, edit and audit system configuration entries"
)]
pub struct Cli {
    /// 后台地址，例如 https://example.com/api
    #[arg(long, env = "CONFIG_ADMIN_BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// 操作人 ID，所有请求都需要
    #[arg(long, env = "CONFIG_ADMIN_USERID", default_value = "")]
    pub userid: String,

    /// Excel 导出目录
    #[arg(long, env = "CONFIG_ADMIN_DOWNLOAD_DIR", default_value = ".")]
    pub download_dir: PathBuf,

    /// 日志过滤表达式，优先于 RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,

    /// 日志写入文件（TUI 运行时建议指定）
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// 不带子命令时进入交互界面
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print matching entries
    Search(FilterArgs),
    /// Download matching entries as an Excel file
    Export(FilterArgs),
    /// Print the change history of one entry
    History(EntryArgs),
    /// Create a new entry
    Create(ValueArgs),
    /// Change the value of an existing entry
    Set(ValueArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct FilterArgs {
    #[arg(long, default_value = "")]
    pub category: String,
    #[arg(long = "name", default_value = "")]
    pub config_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct EntryArgs {
    /// 行键字符串 "<category>|||<name>"，与 --category/--name 二选一
    #[arg(long, conflicts_with_all = ["category", "config_name"])]
    pub key: Option<String>,
    #[arg(long, required_unless_present = "key")]
    pub category: Option<String>,
    #[arg(long = "name", required_unless_present = "key")]
    pub config_name: Option<String>,
}

impl EntryArgs {
    pub fn row_key(&self) -> RowKey {
        match &self.key {
            Some(key) => RowKey::parse(key),
            None => RowKey::new(
                self.category.clone().unwrap_or_default(),
                self.config_name.clone().unwrap_or_default(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ValueArgs {
    #[arg(long)]
    pub category: String,
    #[arg(long = "name")]
    pub config_name: String,
    #[arg(long)]
    pub value: String,
}

/// 运行时配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub base_url: String,
    pub userid: String,
    pub download_dir: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl AdminConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            base_url: cli.base_url.clone(),
            userid: cli.userid.trim().to_string(),
            download_dir: cli.download_dir.clone(),
            log_level: resolve_log_filter(cli.log_level.as_deref(), std::env::var("RUST_LOG").ok()),
            log_file: cli.log_file.clone(),
        }
    }
}

/// --log-level > RUST_LOG > "warn"
pub fn resolve_log_filter(explicit: Option<&str>, env: Option<String>) -> String {
    explicit
        .map(str::to_string)
        .or(env)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "warn".to_string())
}
