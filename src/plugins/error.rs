use serde::Serialize;
use thiserror::Error;

/// 插件错误类型
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("提供者执行失败: {provider} - {message}")]
    ProviderError {
        provider: String,
        message: String,
    },

    #[error("路由处理失败: 插件 {plugin_name} 在处理 {path} 时出错: {message}")]
    RouteError {
        plugin_name: String,
        path: String,
        message: String,
    },

    #[error("路由段 /{segment} 已由插件 {owner} 注册，忽略插件 {rejected} 的注册")]
    DuplicateRoute {
        segment: String,
        owner: String,
        rejected: String,
    },

    #[error("未知插件: {0}")]
    UnknownPlugin(String),
}

/// 单个提供者失败的诊断记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFault {
    /// 提供者名称
    pub provider: String,
    /// 失败原因
    pub message: String,
}

impl From<&ProviderFault> for PluginError {
    fn from(fault: &ProviderFault) -> Self {
        PluginError::ProviderError {
            provider: fault.provider.clone(),
            message: fault.message.clone(),
        }
    }
}
