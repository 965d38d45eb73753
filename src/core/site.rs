use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::dispatcher::Dispatcher;
use crate::core::error::RouterError;
use crate::core::loader::load_site_content;
use crate::core::lookup::ContentLookup;
use crate::models::{Config, DataContract, Settings, SettingsProvider};
use crate::plugins::{PluginContext, PluginManager};
use crate::theme::ManifestLoader;

/// 站点：进程内共享，每个请求都从这里开始
///
/// 设置、主题清单和插件注册表在每个请求开始时重新加载，
/// 因此请求之间不共享可变状态。
#[derive(Clone)]
pub struct Site {
    base_dir: PathBuf,
    lookup: Arc<dyn ContentLookup>,
    settings: Arc<dyn SettingsProvider>,
    manifests: ManifestLoader,
    plugins: PluginManager,
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("base_dir", &self.base_dir)
            .field("plugins", &self.plugins)
            .finish()
    }
}

impl Site {
    pub fn new(
        base_dir: &Path,
        lookup: Arc<dyn ContentLookup>,
        settings: Arc<dyn SettingsProvider>,
        plugins: PluginManager,
    ) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            lookup,
            settings,
            manifests: ManifestLoader::new(base_dir),
            plugins,
        }
    }

    /// 打开站点目录：读取 `_config.yml`、加载内容并启用配置中的插件
    pub fn open(base_dir: &Path) -> Result<Self> {
        info!("打开站点: {}", base_dir.display());
        let config = Config::load_or_default(base_dir)?;
        let store = load_site_content(base_dir)?;
        let plugins = PluginManager::from_names(&config.plugins.clone().unwrap_or_default());
        Ok(Self::new(base_dir, Arc::new(store), Arc::new(config), plugins))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 当前的站点设置
    pub fn settings(&self) -> Settings {
        self.settings.autoload_settings()
    }

    pub fn lookup(&self) -> &Arc<dyn ContentLookup> {
        &self.lookup
    }

    pub fn plugins(&self) -> &PluginManager {
        &self.plugins
    }

    pub fn manifests(&self) -> &ManifestLoader {
        &self.manifests
    }

    /// 为一个请求加载设置和主题清单，并重建注册表
    pub fn begin_request(&self) -> Result<Dispatcher, RouterError> {
        let settings = self.settings.autoload_settings();
        let manifest = self.manifests.load(&settings.theme)?;
        let context = PluginContext {
            lookup: self.lookup.clone(),
            settings: settings.clone(),
        };
        let tables = self.plugins.bootstrap(&context);
        debug!("请求注册表: {:?}", tables.routes);
        Ok(Dispatcher::new(self.lookup.clone(), settings, manifest, tables))
    }

    /// 解析路径；只有配置错误会以 `Err` 返回
    pub fn resolve(&self, path: &str) -> Result<DataContract, RouterError> {
        self.resolve_page(path, 1)
    }

    pub fn resolve_page(&self, path: &str, page: usize) -> Result<DataContract, RouterError> {
        Ok(self.begin_request()?.resolve_page(path, page))
    }
}
