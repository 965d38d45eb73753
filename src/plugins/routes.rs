use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::PluginError;
use crate::models::Fragment;

/// 传给插件路由处理器的请求上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// 规范化后的完整路径（不含首尾斜杠）
    pub path: String,
    /// 路径段
    pub segments: Vec<String>,
    /// 请求的页码
    pub page: usize,
    /// 每页数量
    pub per_page: usize,
}

impl RequestContext {
    /// 顶级路径段之后的剩余路径
    pub fn rest(&self) -> &[String] {
        self.segments.get(1..).unwrap_or(&[])
    }
}

/// 插件路由返回的结果
#[derive(Debug, Clone, PartialEq)]
pub struct RouteBundle {
    /// 声明的内容类型，用于在主题清单中选择模板
    pub kind: String,
    /// 直接合并进契约的数据
    pub data: Fragment,
    /// 显式指定的模板
    pub template: Option<String>,
}

impl RouteBundle {
    pub fn new(kind: impl Into<String>, data: Fragment) -> Self {
        Self {
            kind: kind.into(),
            data,
            template: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

/// 插件路由处理器，返回 `Ok(None)` 表示不匹配
pub trait RouteHandler: Send + Sync {
    fn handle(&self, path: &str, context: &RequestContext) -> Result<Option<RouteBundle>>;
}

impl<F> RouteHandler for F
where
    F: Fn(&str, &RequestContext) -> Result<Option<RouteBundle>> + Send + Sync,
{
    fn handle(&self, path: &str, context: &RequestContext) -> Result<Option<RouteBundle>> {
        self(path, context)
    }
}

/// 已注册的路由
#[derive(Clone)]
pub struct RouteEntry {
    pub segment: String,
    /// 注册该路由的插件
    pub owner: String,
    pub handler: Arc<dyn RouteHandler>,
}

/// 插件路由表：顶级路径段到处理器的有序映射，先注册者优先
#[derive(Clone, Default)]
pub struct PluginRouteTable {
    entries: Vec<RouteEntry>,
}

impl fmt::Debug for PluginRouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let claims: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|entry| (entry.segment.as_str(), entry.owner.as_str()))
            .collect();
        f.debug_struct("PluginRouteTable").field("entries", &claims).finish()
    }
}

impl PluginRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册路由段；已被占用时保留先注册的处理器并返回 `DuplicateRoute`
    pub fn register<H>(&mut self, segment: &str, owner: &str, handler: H) -> Result<(), PluginError>
    where
        H: RouteHandler + 'static,
    {
        let segment = segment.trim_matches('/').to_string();
        if let Some(existing) = self.entries.iter().find(|entry| entry.segment == segment) {
            let err = PluginError::DuplicateRoute {
                segment,
                owner: existing.owner.clone(),
                rejected: owner.to_string(),
            };
            warn!("{}", err);
            return Err(err);
        }

        debug!("插件 {} 注册路由段 /{}", owner, segment);
        self.entries.push(RouteEntry {
            segment,
            owner: owner.to_string(),
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// 查找认领该路由段的处理器
    pub fn match_segment(&self, segment: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.segment == segment)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.segment.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context(path: &str) -> RequestContext {
        RequestContext {
            path: path.to_string(),
            segments: path.split('/').map(String::from).collect(),
            page: 1,
            per_page: 10,
        }
    }

    #[test]
    fn test_first_registrant_wins() {
        let second_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&second_calls);

        let mut table = PluginRouteTable::new();
        table
            .register("shop", "first", |_: &str, _: &RequestContext| -> Result<Option<RouteBundle>> {
                let mut data = Map::new();
                data.insert("owner".to_string(), json!("first"));
                Ok(Some(RouteBundle::new("shop", data)))
            })
            .unwrap();
        let duplicate = table.register("shop", "second", move |_: &str, _: &RequestContext| -> Result<Option<RouteBundle>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        });

        assert!(matches!(duplicate, Err(PluginError::DuplicateRoute { .. })));

        let entry = table.match_segment("shop").unwrap();
        assert_eq!(entry.owner, "first");
        let bundle = entry.handler.handle("shop/cart", &context("shop/cart")).unwrap().unwrap();
        assert_eq!(bundle.data["owner"], json!("first"));
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unclaimed_segment() {
        let table = PluginRouteTable::new();
        assert!(table.match_segment("shop").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_rest_of_path() {
        let ctx = context("shop/cart/items");
        assert_eq!(ctx.rest(), &["cart".to_string(), "items".to_string()]);
    }
}
