use anyhow::{anyhow, Result};
use serde_json::{Map, Value};

use super::{PluginContext, ProviderContext, ProviderRegistry};
use crate::core::assembly::summary_value;
use crate::models::{Fragment, ListFilter, SortOrder, TaxonomyKind};

/// 最新文章数量
const RECENT_POSTS_LIMIT: usize = 5;
/// 相关文章数量
const RELATED_POSTS_LIMIT: usize = 5;

fn single(key: &str, value: Value) -> Fragment {
    let mut fragment = Map::new();
    fragment.insert(key.to_string(), value);
    fragment
}

/// 注册核心提供者：`recent_posts`、`categories`、`tags`、`related_posts` 和 `adjacent_posts`
pub fn register_core_providers(registry: &mut ProviderRegistry, context: &PluginContext) {
    let lookup = context.lookup.clone();
    let site_url = context.settings.url.clone();
    registry.register("recent_posts", move |_: &ProviderContext| {
        let (items, _) = lookup.list_live(&ListFilter::posts(), SortOrder::Newest, 1, RECENT_POSTS_LIMIT);
        let posts = items.iter().map(|record| summary_value(record, &site_url)).collect();
        Ok(single("recent_posts", Value::Array(posts)))
    });

    let lookup = context.lookup.clone();
    registry.register("categories", move |_: &ProviderContext| {
        let terms = lookup.list_terms(TaxonomyKind::Category);
        Ok(single("categories", serde_json::to_value(terms)?))
    });

    let lookup = context.lookup.clone();
    registry.register("tags", move |_: &ProviderContext| {
        let terms = lookup.list_terms(TaxonomyKind::Tag);
        Ok(single("tags", serde_json::to_value(terms)?))
    });

    let lookup = context.lookup.clone();
    let site_url = context.settings.url.clone();
    registry.register("related_posts", move |ctx: &ProviderContext| {
        let Some(post) = ctx.get("post") else {
            return Ok(single("related_posts", Value::Array(Vec::new())));
        };
        let (id, category) = related_key(post)?;
        let Some(category) = category else {
            return Ok(single("related_posts", Value::Array(Vec::new())));
        };

        let filter = ListFilter::posts().with_category(category);
        let (items, _) = lookup.list_live(&filter, SortOrder::Newest, 1, RELATED_POSTS_LIMIT + 1);
        let posts = items
            .iter()
            .filter(|record| record.id != id)
            .take(RELATED_POSTS_LIMIT)
            .map(|record| summary_value(record, &site_url))
            .collect();
        Ok(single("related_posts", Value::Array(posts)))
    });

    // 按时间正序排列，前一篇是更早的文章
    let lookup = context.lookup.clone();
    let site_url = context.settings.url.clone();
    registry.register("adjacent_posts", move |ctx: &ProviderContext| {
        let mut fragment = Map::new();
        fragment.insert("prev_post".to_string(), Value::Null);
        fragment.insert("next_post".to_string(), Value::Null);
        let Some(post) = ctx.get("post") else {
            return Ok(fragment);
        };
        let (id, _) = related_key(post)?;

        let (items, _) = lookup.list_live(&ListFilter::posts(), SortOrder::Oldest, 1, usize::MAX);
        if let Some(index) = items.iter().position(|record| record.id == id) {
            if let Some(prev) = index.checked_sub(1).and_then(|i| items.get(i)) {
                fragment.insert("prev_post".to_string(), summary_value(prev, &site_url));
            }
            if let Some(next) = items.get(index + 1) {
                fragment.insert("next_post".to_string(), summary_value(next, &site_url));
            }
        }
        Ok(fragment)
    });
}

/// 从上下文中的文章取出 ID 和第一个分类
fn related_key(post: &Value) -> Result<(u64, Option<String>)> {
    let id = post
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("context post has no numeric id"))?;
    let category = post
        .get("categories")
        .and_then(Value::as_array)
        .and_then(|categories| categories.first())
        .and_then(|term| term.get("slug"))
        .and_then(Value::as_str)
        .map(String::from);
    Ok((id, category))
}
