use anyhow::Result;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use super::{Plugin, PluginContext, PluginRouteTable, RequestContext, RouteBundle};
use crate::core::assembly::summary_value;
use crate::core::lookup::ContentLookup;
use crate::models::{ListFilter, Pagination, SortOrder};

/// 搜索插件：认领 `/search/<关键词>`
#[derive(Debug, Clone)]
pub struct SearchPlugin {
    name: String,
    version: String,
    description: String,
}

impl Default for SearchPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchPlugin {
    pub fn new() -> Self {
        Self {
            name: "search".to_string(),
            version: "0.1.0".to_string(),
            description: "站内文章搜索插件".to_string(),
        }
    }
}

/// 关键词：剩余路径段，`+` 与 `-` 视为空格
fn query_from(request: &RequestContext) -> String {
    request
        .rest()
        .iter()
        .map(|segment| segment.replace(['+', '-'], " "))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_lowercase()
}

fn search(lookup: &dyn ContentLookup, site_url: &str, request: &RequestContext) -> Result<Option<RouteBundle>> {
    let query = query_from(request);
    if query.is_empty() {
        return Ok(None);
    }
    debug!("搜索: {}", query);

    let (all, _) = lookup.list_live(&ListFilter::posts(), SortOrder::Newest, 1, usize::MAX);
    let matched: Vec<Value> = all
        .iter()
        .filter(|record| {
            query.split_whitespace().all(|word| {
                record.title.to_lowercase().contains(word) || record.content.to_lowercase().contains(word)
            })
        })
        .map(|record| summary_value(record, site_url))
        .collect();

    let page = request.page.max(1);
    let per_page = request.per_page.max(1);
    let total = matched.len();
    let results: Vec<Value> = matched
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    let mut data = Map::new();
    data.insert(
        "pagination".to_string(),
        serde_json::to_value(Pagination::new(page, per_page, total, results.len()))?,
    );
    data.insert("query".to_string(), Value::String(query));
    data.insert("results".to_string(), Value::Array(results));
    data.insert("is_search".to_string(), Value::Bool(true));
    Ok(Some(RouteBundle::new("search", data)))
}

impl Plugin for SearchPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn register_routes(&self, routes: &mut PluginRouteTable, context: &PluginContext) {
        let lookup: Arc<dyn ContentLookup> = context.lookup.clone();
        let site_url = context.settings.url.clone();
        let _ = routes.register("search", &self.name, move |_: &str, request: &RequestContext| {
            search(lookup.as_ref(), &site_url, request)
        });
    }
}
