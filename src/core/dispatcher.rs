//! 请求路由：把 URL 解析为交给主题的标准数据契约

use serde_json::{Map, Value};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::archive::ArchiveBuilder;
use crate::core::assembly::{page_value, post_value};
use crate::core::lookup::ContentLookup;
use crate::models::{
    ContentRecord, ContentType, DataContract, HomepageMode, Settings, SiteFragment, TaxonomyKind,
};
use crate::plugins::{PluginError, ProviderContext, RequestContext, RequestTables, RouteBundle, RouteEntry};
use crate::theme::ThemeManifest;
use crate::utils::split_path;

/// 路由状态
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route<'p> {
    Home,
    Archive { kind: TaxonomyKind, slug: &'p str, page: Option<usize> },
    Plugin(&'p str),
    Content(String),
}

/// 单个请求的调度器
///
/// 持有本次请求的设置、主题清单和注册表，解析过程中全部只读。
pub struct Dispatcher {
    lookup: Arc<dyn ContentLookup>,
    settings: Settings,
    manifest: ThemeManifest,
    tables: RequestTables,
    site: SiteFragment,
}

impl Dispatcher {
    pub fn new(
        lookup: Arc<dyn ContentLookup>,
        settings: Settings,
        manifest: ThemeManifest,
        tables: RequestTables,
    ) -> Self {
        let site = SiteFragment::from(&settings);
        Self {
            lookup,
            settings,
            manifest,
            tables,
            site,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn manifest(&self) -> &ThemeManifest {
        &self.manifest
    }

    pub fn tables(&self) -> &RequestTables {
        &self.tables
    }

    /// 解析路径（第 1 页）
    pub fn resolve(&self, path: &str) -> DataContract {
        self.resolve_page(path, 1)
    }

    /// 解析路径，`page` 用于首页和归档的分页
    pub fn resolve_page(&self, path: &str, page: usize) -> DataContract {
        let segments = split_path(path);
        let route = self.route(&segments);
        debug!("路由 /{} -> {:?}", segments.join("/"), route);

        let contract = match route {
            Route::Home => self.resolve_home(page),
            Route::Archive { kind, slug, page: path_page } => {
                let page = path_page.unwrap_or(page);
                match kind {
                    TaxonomyKind::Category => self.archive(Some(slug), None, page, false),
                    TaxonomyKind::Tag => self.archive(None, Some(slug), page, false),
                }
            }
            Route::Plugin(segment) => self.plugin_route(segment, &segments, page),
            Route::Content(slug) => match self.lookup.find_live(&slug) {
                Some(record) => self.single(record, false),
                None => self.not_found(),
            },
        };

        debug!(
            "契约: template={} home={} single={} archive={} page={} 404={} faults={}",
            contract.template,
            contract.is_home,
            contract.is_single,
            contract.is_archive,
            contract.is_page,
            contract.is_404,
            contract.faults.len()
        );
        contract
    }

    /// 选择路由：分类/标签归档优先于插件和内容
    fn route<'p>(&self, segments: &'p [String]) -> Route<'p> {
        let Some(top) = segments.first() else {
            return Route::Home;
        };

        if let (Some(kind), Some(slug)) = (TaxonomyKind::from_segment(top), segments.get(1)) {
            return Route::Archive {
                kind,
                slug: slug.as_str(),
                page: page_suffix(&segments[2..]),
            };
        }

        if self.tables.routes.match_segment(top).is_some() {
            return Route::Plugin(top.as_str());
        }

        Route::Content(segments.join("/"))
    }

    /// 首页策略
    pub fn resolve_home(&self, page: usize) -> DataContract {
        if self.settings.homepage_mode == HomepageMode::Page {
            let record = self
                .settings
                .homepage_page_id
                .and_then(|id| self.lookup.find_live_by_id(id, &ContentType::Page));
            match record {
                Some(record) => return self.single(record, true),
                None => warn!(
                    "首页页面 {:?} 不存在或未发布，回退到文章列表",
                    self.settings.homepage_page_id
                ),
            }
        }

        self.archive(None, None, page, true)
    }

    fn archive(&self, category: Option<&str>, tag: Option<&str>, page: usize, is_home: bool) -> DataContract {
        let builder = ArchiveBuilder::new(self.lookup.as_ref(), &self.site);
        let mut contract = builder.build_archive(category, tag, page, self.settings.per_page);
        contract.is_home = is_home;

        let key = if is_home { self.type_key("home", "archive") } else { "archive" };
        contract.template = self.template_for(key);

        let mut context = Map::new();
        if let Some(category) = category {
            context.insert("category".to_string(), Value::String(category.to_string()));
        }
        if let Some(tag) = tag {
            context.insert("tag".to_string(), Value::String(tag.to_string()));
        }
        if let Some(pagination) = &contract.pagination {
            context.insert("page".to_string(), Value::from(pagination.current_page));
        }

        self.apply_providers(&mut contract, key, &context);
        contract
    }

    /// 单篇内容：按记录类型组装
    fn single(&self, record: ContentRecord, is_home: bool) -> DataContract {
        let url = &self.settings.url;
        let (post, key, is_page) = match &record.kind {
            ContentType::Post => (post_value(&record, self.lookup.as_ref(), url), "post", false),
            ContentType::Page if is_home => (page_value(&record, url), self.type_key("home_page", "page"), true),
            ContentType::Page => (page_value(&record, url), "page", true),
            ContentType::Custom(name) => match self.tables.content_types.get(name) {
                Some(strategy) => (
                    strategy.assemble(&record, self.lookup.as_ref()),
                    self.type_key(name, "page"),
                    strategy.is_page(),
                ),
                None => (page_value(&record, url), self.type_key(name, "page"), true),
            },
        };

        let mut contract = DataContract::new(self.site.clone(), self.template_for(key));
        contract.is_single = true;
        contract.is_page = is_page;
        contract.is_home = is_home;

        let mut context = Map::new();
        context.insert("post".to_string(), post.clone());
        contract.post = Some(post);

        self.apply_providers(&mut contract, key, &context);
        contract
    }

    /// 插件路由：直接使用插件返回的数据，不经过标准组装
    fn plugin_route(&self, segment: &str, segments: &[String], page: usize) -> DataContract {
        let Some(entry) = self.tables.routes.match_segment(segment) else {
            return self.not_found();
        };

        let request = RequestContext {
            path: segments.join("/"),
            segments: segments.to_vec(),
            page: page.max(1),
            per_page: self.settings.per_page,
        };

        match invoke(entry, &request) {
            Ok(Some(bundle)) => {
                let template = bundle
                    .template
                    .clone()
                    .unwrap_or_else(|| self.template_for(&bundle.kind));
                debug!("插件 {} 认领 /{} ({})", entry.owner, request.path, bundle.kind);
                let mut contract = DataContract::new(self.site.clone(), template);
                contract.merge(bundle.data);
                contract
            }
            Ok(None) => self.not_found(),
            Err(e) => {
                warn!("{}", e);
                self.not_found()
            }
        }
    }

    fn not_found(&self) -> DataContract {
        let mut contract = DataContract::not_found(self.site.clone(), self.template_for("404"));
        self.apply_providers(&mut contract, "404", &Map::new());
        contract
    }

    fn apply_providers(&self, contract: &mut DataContract, key: &str, context: &ProviderContext) {
        let names = self.manifest.providers_for(key).unwrap_or(&[]);
        if names.is_empty() {
            return;
        }

        let batch = self.tables.providers.resolve_batch(names, context);
        contract.merge(batch.fragment);
        contract.faults.extend(batch.faults);
    }

    /// 主题声明了 `preferred` 时使用它，否则使用 `fallback`
    fn type_key<'k>(&self, preferred: &'k str, fallback: &'k str) -> &'k str {
        if self.manifest.declares(preferred) {
            preferred
        } else {
            fallback
        }
    }

    /// 清单中的模板，未声明时为 `<key>.html`
    fn template_for(&self, key: &str) -> String {
        self.manifest
            .template_for(key)
            .map(String::from)
            .unwrap_or_else(|| format!("{}.html", key))
    }
}

/// 调用插件处理器，错误和 panic 都视为插件故障
fn invoke(entry: &RouteEntry, request: &RequestContext) -> Result<Option<RouteBundle>, PluginError> {
    let route_error = |message: String| PluginError::RouteError {
        plugin_name: entry.owner.clone(),
        path: request.path.clone(),
        message,
    };

    match panic::catch_unwind(AssertUnwindSafe(|| entry.handler.handle(&request.path, request))) {
        Ok(result) => result.map_err(|e| route_error(e.to_string())),
        Err(_) => Err(route_error("处理器 panic".to_string())),
    }
}

/// 解析 `page/<n>` 后缀
fn page_suffix(rest: &[String]) -> Option<usize> {
    match rest {
        [marker, number, ..] if marker == "page" => number.parse::<usize>().ok().map(|n| n.max(1)),
        _ => None,
    }
}
