//! 文章列表：首页、分类与标签归档

use serde_json::{json, Value};
use tracing::debug;

use crate::core::assembly::summary_value;
use crate::core::lookup::ContentLookup;
use crate::models::{DataContract, Fragment, ListFilter, Pagination, SiteFragment, SortOrder};

/// 归档页构建器
pub struct ArchiveBuilder<'a> {
    lookup: &'a dyn ContentLookup,
    site: &'a SiteFragment,
}

impl<'a> ArchiveBuilder<'a> {
    pub fn new(lookup: &'a dyn ContentLookup, site: &'a SiteFragment) -> Self {
        Self { lookup, site }
    }

    /// 构建一页归档
    ///
    /// 页码和每页数量小于 1 时按 1 处理。超出最后一页时列表为空，
    /// 但分页信息仍给出真实的总数和末页。同时给出分类和标签时
    /// 两个条件都要满足，`taxonomy` 片段描述分类。
    pub fn build_archive(
        &self,
        category: Option<&str>,
        tag: Option<&str>,
        page: usize,
        per_page: usize,
    ) -> DataContract {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let mut filter = ListFilter::posts();
        if let Some(category) = category {
            filter = filter.with_category(category);
        }
        if let Some(tag) = tag {
            filter = filter.with_tag(tag);
        }

        let (items, total) = self.lookup.list_live(&filter, SortOrder::Newest, page, per_page);
        debug!("归档 {:?} 第 {} 页: {} / {}", filter.taxonomy(), page, items.len(), total);

        let mut contract = DataContract::new(self.site.clone(), String::new());
        contract.is_archive = true;
        contract.pagination = Some(Pagination::new(page, per_page, total, items.len()));

        if let Some((kind, slug)) = filter.taxonomy() {
            let name = items
                .first()
                .and_then(|record| record.terms(kind).iter().find(|term| term.slug == slug))
                .map(|term| term.name.clone());
            let mut fragment = Fragment::new();
            fragment.insert(
                "taxonomy".to_string(),
                json!({ "kind": kind.segment(), "slug": slug, "name": name }),
            );
            contract.merge(fragment);
        }

        contract.posts = Some(
            items
                .iter()
                .map(|record| summary_value(record, &self.site.url))
                .collect::<Vec<Value>>(),
        );
        contract
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lookup::MemoryStore;
    use crate::models::{ContentRecord, ContentStatus, ContentType, Term};
    use chrono::{Duration, TimeZone, Utc};

    fn site() -> SiteFragment {
        SiteFragment {
            name: "Field Notes".to_string(),
            tagline: None,
            logo: None,
            favicon: None,
            url: "https://example.com".to_string(),
        }
    }

    fn post(id: u64, hours: i64, category: &str) -> ContentRecord {
        ContentRecord {
            id,
            title: format!("Post {}", id),
            slug: format!("post-{}", id),
            content: String::new(),
            excerpt: None,
            kind: ContentType::Post,
            status: ContentStatus::Published,
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours),
            deleted_at: None,
            author_id: None,
            featured_image_id: None,
            categories: vec![Term::from_name(category)],
            tags: Vec::new(),
        }
    }

    fn store_of(count: u64) -> MemoryStore {
        MemoryStore::new().with_records((1..=count).map(|id| post(id, id as i64, "General")))
    }

    #[test]
    fn test_last_page_of_twenty_three() {
        let store = store_of(23);
        let site = site();
        let contract = ArchiveBuilder::new(&store, &site).build_archive(None, None, 3, 10);

        let pagination = contract.pagination.clone().unwrap();
        assert_eq!(pagination.last_page, 3);
        assert_eq!(pagination.total, 23);
        assert_eq!(pagination.from, Some(21));
        assert_eq!(pagination.to, Some(23));
        assert_eq!(contract.posts.as_ref().unwrap().len(), 3);
        assert!(contract.is_archive);
        assert!(!contract.is_404);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let store = store_of(23);
        let site = site();
        let contract = ArchiveBuilder::new(&store, &site).build_archive(None, None, 99, 10);

        let pagination = contract.pagination.clone().unwrap();
        assert!(contract.posts.as_ref().unwrap().is_empty());
        assert_eq!(pagination.last_page, 3);
        assert_eq!(pagination.total, 23);
        assert_eq!(pagination.from, None);
    }

    #[test]
    fn test_zero_page_clamps_to_first() {
        let store = store_of(5);
        let site = site();
        let contract = ArchiveBuilder::new(&store, &site).build_archive(None, None, 0, 0);

        let pagination = contract.pagination.clone().unwrap();
        assert_eq!(pagination.current_page, 1);
        assert_eq!(pagination.per_page, 1);
        assert_eq!(pagination.last_page, 5);
    }

    #[test]
    fn test_category_filter_orders_and_names() {
        let store = MemoryStore::new().with_records([
            post(1, 1, "Design"),
            post(2, 2, "Travel"),
            post(3, 3, "Design"),
            post(4, 3, "Design"),
        ]);
        let site = site();
        let contract = ArchiveBuilder::new(&store, &site).build_archive(Some("design"), None, 1, 10);

        let ids: Vec<u64> = contract
            .posts
            .as_ref()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![4, 3, 1]);
        assert_eq!(contract.fragments["taxonomy"]["name"], "Design");
        assert_eq!(contract.fragments["taxonomy"]["kind"], "category");
    }

    #[test]
    fn test_category_and_tag_both_filter() {
        let mut tagged = post(3, 3, "Design");
        tagged.tags = vec![Term::from_name("Rust")];
        let mut other = post(2, 2, "Travel");
        other.tags = vec![Term::from_name("Rust")];
        let store = MemoryStore::new().with_records([post(1, 1, "Design"), other, tagged]);
        let site = site();
        let contract = ArchiveBuilder::new(&store, &site).build_archive(Some("design"), Some("rust"), 1, 10);

        let posts = contract.posts.as_ref().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["id"], 3);
        assert_eq!(contract.pagination.as_ref().unwrap().total, 1);
        assert_eq!(contract.fragments["taxonomy"]["kind"], "category");
    }

    #[test]
    fn test_empty_category_is_not_a_404() {
        let store = store_of(3);
        let site = site();
        let contract = ArchiveBuilder::new(&store, &site).build_archive(Some("empty"), None, 1, 10);

        assert!(contract.posts.as_ref().unwrap().is_empty());
        assert!(!contract.is_404);
        assert!(contract.is_archive);
        assert_eq!(contract.fragments["taxonomy"]["name"], Value::Null);
    }
}
