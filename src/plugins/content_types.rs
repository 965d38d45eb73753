use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::core::lookup::ContentLookup;
use crate::models::ContentRecord;

/// 自定义内容类型的组装策略
pub trait ContentTypeStrategy: Send + Sync {
    /// 生成契约中的 `post` 片段
    fn assemble(&self, record: &ContentRecord, lookup: &dyn ContentLookup) -> Value;

    /// 是否作为页面呈现（设置 `is_page`）
    fn is_page(&self) -> bool {
        false
    }
}

/// 内容类型名到组装策略的映射
#[derive(Clone, Default)]
pub struct ContentTypeRegistry {
    strategies: HashMap<String, Arc<dyn ContentTypeStrategy>>,
}

impl fmt::Debug for ContentTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentTypeRegistry")
            .field("types", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ContentTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S>(&mut self, type_name: &str, strategy: S)
    where
        S: ContentTypeStrategy + 'static,
    {
        debug!("注册内容类型: {}", type_name);
        self.strategies.insert(type_name.to_string(), Arc::new(strategy));
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn ContentTypeStrategy>> {
        self.strategies.get(type_name)
    }
}
