use std::path::PathBuf;
use thiserror::Error;

/// 请求解析中无法降级处理的错误，都属于配置错误，应以 500 响应
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("主题不存在: {theme} (找不到清单文件 {path:?})")]
    ThemeNotFound { theme: String, path: PathBuf },

    #[error("主题清单无效: {theme} - {message}")]
    InvalidManifest { theme: String, message: String },
}

impl RouterError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        500
    }
}
