use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::lookup::ContentLookup;
use crate::models::Settings;

mod builtin;
mod content_types;
mod error;
mod providers;
mod routes;
pub mod search;
pub mod word_count;

pub use builtin::register_core_providers;
pub use content_types::{ContentTypeRegistry, ContentTypeStrategy};
pub use error::{PluginError, ProviderFault};
pub use providers::{ProviderBatch, ProviderContext, ProviderRegistry, Resolver};
pub use routes::{PluginRouteTable, RequestContext, RouteBundle, RouteEntry, RouteHandler};

/// 插件上下文，提供给插件使用的环境信息
#[derive(Clone)]
pub struct PluginContext {
    /// 内容查询
    pub lookup: Arc<dyn ContentLookup>,
    /// 本次请求的站点设置
    pub settings: Settings,
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext").field("settings", &self.settings).finish()
    }
}

/// 插件特征，所有插件必须实现此特征
///
/// 插件在每个请求开始时向新建的注册表登记自己的提供者、路由和内容类型，
/// 因此登记过程不能依赖之前请求留下的状态。
pub trait Plugin: Send + Sync {
    /// 获取插件名称
    fn name(&self) -> &str;

    /// 获取插件版本
    fn version(&self) -> &str;

    /// 获取插件描述
    fn description(&self) -> &str;

    /// 注册数据提供者
    fn register_providers(&self, _registry: &mut ProviderRegistry, _context: &PluginContext) {}

    /// 注册顶级路由段
    fn register_routes(&self, _routes: &mut PluginRouteTable, _context: &PluginContext) {}

    /// 注册自定义内容类型
    fn register_content_types(&self, _types: &mut ContentTypeRegistry, _context: &PluginContext) {}
}

/// 单个请求使用的注册表，解析期间只读
#[derive(Debug, Clone, Default)]
pub struct RequestTables {
    pub providers: ProviderRegistry,
    pub routes: PluginRouteTable,
    pub content_types: ContentTypeRegistry,
}

/// 插件管理器，按注册顺序保存插件
#[derive(Clone, Default)]
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager").field("plugins", &self.names()).finish()
    }
}

impl PluginManager {
    /// 创建新的插件管理器
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据配置中的名称启用内置插件，未知名称只记录警告
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut manager = Self::new();
        for name in names {
            match bundled(name.as_ref()) {
                Ok(plugin) => manager.register(plugin),
                Err(e) => warn!("{}", e),
            }
        }
        manager
    }

    /// 注册插件，注册顺序决定路由认领的优先级
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        info!("启用插件: {} v{}", plugin.name(), plugin.version());
        self.plugins.push(plugin);
    }

    /// 已注册插件名称
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// 为一个请求重建注册表：先注册核心提供者，再按顺序注册插件
    pub fn bootstrap(&self, context: &PluginContext) -> RequestTables {
        let mut tables = RequestTables::default();
        register_core_providers(&mut tables.providers, context);

        for plugin in &self.plugins {
            debug!("插件 {} 注册中", plugin.name());
            plugin.register_providers(&mut tables.providers, context);
            plugin.register_routes(&mut tables.routes, context);
            plugin.register_content_types(&mut tables.content_types, context);
        }

        tables
    }
}

/// 按名称获取内置插件
pub fn bundled(name: &str) -> Result<Arc<dyn Plugin>, PluginError> {
    match name {
        "word-count" | "word_count" => Ok(Arc::new(word_count::WordCountPlugin::new())),
        "search" => Ok(Arc::new(search::SearchPlugin::new())),
        other => Err(PluginError::UnknownPlugin(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lookup::MemoryStore;
    use crate::models::Config;
    use crate::models::SettingsProvider;

    struct ClaimingPlugin {
        name: String,
    }

    impl Plugin for ClaimingPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn version(&self) -> &str {
            "0.1.0"
        }

        fn description(&self) -> &str {
            "claims /shop"
        }

        fn register_routes(&self, routes: &mut PluginRouteTable, _context: &PluginContext) {
            let _ = routes.register("shop", &self.name, |_: &str, _: &RequestContext| -> anyhow::Result<Option<RouteBundle>> {
                Ok(None)
            });
        }
    }

    fn context() -> PluginContext {
        PluginContext {
            lookup: Arc::new(MemoryStore::new()),
            settings: Config::default().autoload_settings(),
        }
    }

    #[test]
    fn test_bootstrap_includes_core_providers() {
        let tables = PluginManager::new().bootstrap(&context());
        assert!(tables.providers.contains("recent_posts"));
        assert!(tables.providers.contains("categories"));
        assert!(tables.routes.is_empty());
    }

    #[test]
    fn test_registration_order_decides_route_owner() {
        let mut manager = PluginManager::new();
        manager.register(Arc::new(ClaimingPlugin { name: "alpha".to_string() }));
        manager.register(Arc::new(ClaimingPlugin { name: "beta".to_string() }));

        let tables = manager.bootstrap(&context());
        assert_eq!(tables.routes.match_segment("shop").map(|e| e.owner.as_str()), Some("alpha"));
    }

    #[test]
    fn test_unknown_plugin_names_are_skipped() {
        let manager = PluginManager::from_names(&["word-count", "does-not-exist"]);
        assert_eq!(manager.names(), vec!["word-count"]);
    }
}
