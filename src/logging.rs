use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::AdminConfig;
use crate::error::Result;

/// 初始化 tracing。指定日志文件时写文件，否则写 stderr。
pub fn init(config: &AdminConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|e| {
        eprintln!("invalid log filter {:?}: {}, falling back to warn", config.log_level, e);
        EnvFilter::new("warn")
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    // 已有全局 subscriber 时（测试中常见）沿用原来的
    if let Err(e) = installed {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
    Ok(())
}
