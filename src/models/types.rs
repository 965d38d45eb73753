use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 内容类型，`post` 与 `page` 之外的名称都视为插件定义的自定义类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    /// 博客文章
    Post,
    /// 独立页面
    Page,
    /// 自定义类型
    Custom(String),
}

impl ContentType {
    /// 类型键，同时也是主题清单中的键
    pub fn key(&self) -> &str {
        match self {
            ContentType::Post => "post",
            ContentType::Page => "page",
            ContentType::Custom(name) => name,
        }
    }
}

impl From<String> for ContentType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "post" => ContentType::Post,
            "page" => ContentType::Page,
            _ => ContentType::Custom(value),
        }
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        ContentType::from(value.to_string())
    }
}

impl From<ContentType> for String {
    fn from(value: ContentType) -> Self {
        value.key().to_string()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 内容状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    #[default]
    Published,
    Scheduled,
    Trashed,
}

/// 分类或标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// 显示名称
    pub name: String,
    /// 别名（用于URL）
    pub slug: String,
}

impl Term {
    /// 由名称生成别名
    pub fn from_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: crate::utils::slugify(name),
        }
    }
}

/// 分类法种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyKind {
    Category,
    Tag,
}

impl TaxonomyKind {
    /// URL 中的顶级路径段
    pub fn segment(&self) -> &'static str {
        match self {
            TaxonomyKind::Category => "category",
            TaxonomyKind::Tag => "tag",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "category" => Some(TaxonomyKind::Category),
            "tag" => Some(TaxonomyKind::Tag),
            _ => None,
        }
    }
}

/// 带文章数量的分类项，供分类/标签列表使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub name: String,
    pub slug: String,
    /// 该项下的在线文章数量
    pub count: usize,
}

/// 内容记录：文章、页面或插件定义类型的统一表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    /// 唯一 ID
    pub id: u64,
    /// 标题
    pub title: String,
    /// 别名，在线记录之间唯一
    pub slug: String,
    /// 正文（原始Markdown）
    pub content: String,
    /// 摘要
    pub excerpt: Option<String>,
    /// 内容类型
    #[serde(rename = "type")]
    pub kind: ContentType,
    /// 状态
    pub status: ContentStatus,
    /// 发布时间
    pub published_at: DateTime<Utc>,
    /// 软删除时间，为空表示未删除
    pub deleted_at: Option<DateTime<Utc>>,
    /// 作者 ID（弱引用）
    pub author_id: Option<u64>,
    /// 特色图片 ID（弱引用）
    pub featured_image_id: Option<u64>,
    /// 分类
    #[serde(default)]
    pub categories: Vec<Term>,
    /// 标签
    #[serde(default)]
    pub tags: Vec<Term>,
}

impl ContentRecord {
    /// 已发布且未被软删除的记录才对外可见
    pub fn is_live(&self) -> bool {
        self.status == ContentStatus::Published && self.deleted_at.is_none()
    }

    /// 指定分类法下的所有项
    pub fn terms(&self, kind: TaxonomyKind) -> &[Term] {
        match kind {
            TaxonomyKind::Category => &self.categories,
            TaxonomyKind::Tag => &self.tags,
        }
    }

    pub fn has_term(&self, kind: TaxonomyKind, slug: &str) -> bool {
        self.terms(kind).iter().any(|term| term.slug == slug)
    }
}

/// 作者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// 媒体资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: u64,
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// 列表查询条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    /// 内容类型
    pub kind: ContentType,
    /// 分类别名
    pub category: Option<String>,
    /// 标签别名
    pub tag: Option<String>,
}

impl ListFilter {
    /// 所有文章
    pub fn posts() -> Self {
        Self {
            kind: ContentType::Post,
            category: None,
            tag: None,
        }
    }

    pub fn with_category(mut self, slug: impl Into<String>) -> Self {
        self.category = Some(slug.into());
        self
    }

    pub fn with_tag(mut self, slug: impl Into<String>) -> Self {
        self.tag = Some(slug.into());
        self
    }

    /// 当前生效的分类法过滤条件（分类优先）
    pub fn taxonomy(&self) -> Option<(TaxonomyKind, &str)> {
        match (&self.category, &self.tag) {
            (Some(slug), _) => Some((TaxonomyKind::Category, slug.as_str())),
            (None, Some(slug)) => Some((TaxonomyKind::Tag, slug.as_str())),
            (None, None) => None,
        }
    }

    pub fn matches(&self, record: &ContentRecord) -> bool {
        if record.kind != self.kind {
            return false;
        }
        if let Some(slug) = &self.category {
            if !record.has_term(TaxonomyKind::Category, slug) {
                return false;
            }
        }
        if let Some(slug) = &self.tag {
            if !record.has_term(TaxonomyKind::Tag, slug) {
                return false;
            }
        }
        true
    }
}

/// 列表排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// 按发布时间倒序，时间相同按 ID 倒序
    #[default]
    Newest,
    /// 按发布时间正序，时间相同按 ID 正序
    Oldest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_round_trips_custom_names() {
        assert_eq!(ContentType::from("post"), ContentType::Post);
        assert_eq!(ContentType::from("page"), ContentType::Page);
        assert_eq!(ContentType::from("product"), ContentType::Custom("product".to_string()));
        assert_eq!(ContentType::Custom("product".to_string()).key(), "product");

        let json = serde_json::to_string(&ContentType::Page).unwrap();
        assert_eq!(json, "\"page\"");
    }

    #[test]
    fn test_filter_taxonomy_prefers_category() {
        let filter = ListFilter::posts().with_category("design").with_tag("rust");
        assert_eq!(filter.taxonomy(), Some((TaxonomyKind::Category, "design")));
        assert_eq!(ListFilter::posts().taxonomy(), None);
    }
}
