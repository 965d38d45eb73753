//! 内容记录到契约片段的转换

use serde_json::{json, Value};

use crate::core::lookup::ContentLookup;
use crate::models::ContentRecord;
use crate::utils::permalink;

/// 列表项使用的精简表示
pub fn summary_value(record: &ContentRecord, site_url: &str) -> Value {
    json!({
        "id": record.id,
        "title": record.title,
        "slug": record.slug,
        "type": record.kind,
        "url": permalink(site_url, &record.slug),
        "excerpt": record.excerpt,
        "published_at": record.published_at,
        "categories": record.categories,
        "tags": record.tags,
    })
}

/// 完整记录，附带永久链接
pub fn record_value(record: &ContentRecord, site_url: &str) -> Value {
    let mut value = serde_json::to_value(record).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert("url".to_string(), Value::String(permalink(site_url, &record.slug)));
        map.remove("deleted_at");
    }
    value
}

/// 文章：附带作者和特色图片
pub fn post_value(record: &ContentRecord, lookup: &dyn ContentLookup, site_url: &str) -> Value {
    let mut value = record_value(record, site_url);
    let author = record.author_id.and_then(|id| lookup.find_author(id));
    let featured_image = record.featured_image_id.and_then(|id| lookup.find_media(id));
    if let Value::Object(map) = &mut value {
        map.insert("author".to_string(), serde_json::to_value(author).unwrap_or(Value::Null));
        map.insert(
            "featured_image".to_string(),
            serde_json::to_value(featured_image).unwrap_or(Value::Null),
        );
    }
    value
}

/// 页面：不做额外的关联查询
pub fn page_value(record: &ContentRecord, site_url: &str) -> Value {
    record_value(record, site_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lookup::MemoryStore;
    use crate::models::{Author, ContentStatus, ContentType};
    use chrono::Utc;

    fn record() -> ContentRecord {
        ContentRecord {
            id: 4,
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            content: "body".to_string(),
            excerpt: None,
            kind: ContentType::Post,
            status: ContentStatus::Published,
            published_at: Utc::now(),
            deleted_at: None,
            author_id: Some(1),
            featured_image_id: Some(9),
            categories: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_post_value_resolves_author_and_missing_media() {
        let mut store = MemoryStore::new();
        store.insert_author(Author {
            id: 1,
            name: "Ada".to_string(),
            avatar: None,
            bio: None,
        });

        let value = post_value(&record(), &store, "https://example.com");
        assert_eq!(value["author"]["name"], "Ada");
        assert_eq!(value["featured_image"], Value::Null);
        assert_eq!(value["url"], "https://example.com/hello");
        assert_eq!(value["type"], "post");
        assert!(value.get("deleted_at").is_none());
    }

    #[test]
    fn test_page_value_has_no_author() {
        let value = page_value(&record(), "https://example.com");
        assert!(value.get("author").is_none());
        assert_eq!(value["slug"], "hello");
    }
}
