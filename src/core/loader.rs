//! 从站点 `source/` 目录加载内容

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use gray_matter::engine::YAML;
use gray_matter::Matter;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::lookup::MemoryStore;
use crate::models::{Author, ContentRecord, ContentStatus, ContentType, Media, Term};
use crate::utils::{is_markdown_file, markdown, slugify};

/// 文章目录
const POSTS_DIR: &str = "_posts";
/// 数据目录
const DATA_DIR: &str = "_data";

/// 单个或多个字符串
#[derive(Debug, Deserialize, Default)]
#[serde(untagged)]
enum OneOrMany {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_terms(self) -> Vec<Term> {
        match self {
            OneOrMany::None => Vec::new(),
            OneOrMany::One(name) => vec![Term::from_name(&name)],
            OneOrMany::Many(names) => names.iter().map(|name| Term::from_name(name)).collect(),
        }
    }
}

/// Front Matter 中识别的字段
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FrontMatter {
    id: Option<u64>,
    title: Option<String>,
    slug: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<ContentStatus>,
    date: Option<String>,
    deleted_at: Option<String>,
    author: Option<u64>,
    featured_image: Option<u64>,
    excerpt: Option<String>,
    categories: OneOrMany,
    tags: OneOrMany,
}

/// 解析后尚未分配 ID 的记录
struct Draft {
    source: PathBuf,
    id: Option<u64>,
    record: ContentRecord,
}

/// 加载 `source/` 下的全部内容，以及 `source/_data` 中的作者和媒体
pub fn load_site_content(base_dir: &Path) -> Result<MemoryStore> {
    let source_dir = base_dir.join("source");
    let mut store = MemoryStore::new();
    if !source_dir.exists() {
        warn!("内容目录不存在: {}", source_dir.display());
        return Ok(store);
    }

    let paths = content_files(&source_dir);
    info!("从 {} 加载 {} 个内容文件", source_dir.display(), paths.len());

    let drafts: Vec<Draft> = paths
        .par_iter()
        .filter_map(|path| match parse_file(&source_dir, path) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!("跳过内容文件 {}: {:#}", path.display(), e);
                None
            }
        })
        .collect();

    for record in assign_ids(drafts) {
        store.insert(record);
    }

    let data_dir = source_dir.join(DATA_DIR);
    for author in load_data::<Author>(&data_dir.join("authors.yml"))? {
        store.insert_author(author);
    }
    for media in load_data::<Media>(&data_dir.join("media.yml"))? {
        store.insert_media(media);
    }

    info!(
        "加载完成: {} 条记录 ({} 条在线), {} 位作者, {} 个媒体",
        store.len(),
        store.live_count(),
        store.authors_len(),
        store.media_len()
    );
    Ok(store)
}

/// 收集 Markdown 文件，跳过 `_posts` 以外以下划线开头的目录
fn content_files(source_dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(source_dir)
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            entry.depth() == 0 || !entry.file_type().is_dir() || !name.starts_with('_') || name == POSTS_DIR
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_markdown_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();
    paths
}

fn parse_file(source_dir: &Path, path: &Path) -> Result<Draft> {
    let raw = fs::read_to_string(path).with_context(|| format!("无法读取 {}", path.display()))?;
    let parsed = Matter::<YAML>::new().parse(&raw);
    let front: FrontMatter = if parsed.matter.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(&parsed.matter).with_context(|| format!("Front Matter 无效: {}", path.display()))?
    };

    let relative = path.strip_prefix(source_dir).unwrap_or(path);
    let in_posts = relative.starts_with(POSTS_DIR);
    let kind = match front.kind {
        Some(kind) => ContentType::from(kind),
        None if in_posts => ContentType::Post,
        None => ContentType::Page,
    };

    let title = front.title.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string()
    });
    let slug = match front.slug {
        Some(slug) => slug.trim_matches('/').to_string(),
        None if in_posts => slugify(&title),
        None => path_slug(relative),
    };

    let published_at = match front.date.as_deref() {
        Some(date) => parse_date(date).with_context(|| format!("无法解析日期: {}", date))?,
        None => {
            let modified = fs::metadata(path)?.modified()?;
            modified.into()
        }
    };
    let deleted_at = match front.deleted_at.as_deref() {
        Some(date) => Some(parse_date(date).with_context(|| format!("无法解析删除时间: {}", date))?),
        None => None,
    };

    let content = parsed.content.trim().to_string();
    let excerpt = front.excerpt.or_else(|| Some(markdown::excerpt(&content)).filter(|e| !e.is_empty()));
    debug!("解析 {} -> {} ({})", relative.display(), slug, kind);

    Ok(Draft {
        source: relative.to_path_buf(),
        id: front.id,
        record: ContentRecord {
            id: 0,
            title,
            slug,
            content,
            excerpt,
            kind,
            status: front.status.unwrap_or_default(),
            published_at,
            deleted_at,
            author_id: front.author,
            featured_image_id: front.featured_image,
            categories: front.categories.into_terms(),
            tags: front.tags.into_terms(),
        },
    })
}

/// 页面别名取相对路径，`index.md` 取所在目录
fn path_slug(relative: &Path) -> String {
    let without_ext = relative.with_extension("");
    let mut parts: Vec<String> = without_ext
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if parts.len() > 1 && parts.last().map(String::as_str) == Some("index") {
        parts.pop();
    }
    parts.join("/")
}

/// 保留显式 ID；缺失或重复的 ID 按文件路径顺序接在最大 ID 之后
fn assign_ids(drafts: Vec<Draft>) -> Vec<ContentRecord> {
    let mut used = HashSet::new();
    let mut next = drafts.iter().filter_map(|draft| draft.id).max().unwrap_or(0) + 1;
    let mut records = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let mut record = draft.record;
        record.id = match draft.id {
            Some(id) if used.insert(id) => id,
            other => {
                if let Some(id) = other {
                    warn!("ID {} 重复 ({})，重新分配", id, draft.source.display());
                }
                let id = next;
                next += 1;
                used.insert(id);
                id
            }
        };
        records.push(record);
    }
    records
}

/// 解析常见日期格式
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// 读取 `_data` 下的 YAML 列表，文件不存在时为空
fn load_data<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).with_context(|| format!("无法读取 {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("数据文件无效: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lookup::ContentLookup;
    use crate::models::{ListFilter, SortOrder, TaxonomyKind};
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "source/_posts/hello.md",
            "---\nid: 7\ntitle: Hello World\ndate: 2024-01-02 10:00:00\ncategories: Design\ntags: [rust, web]\nauthor: 1\n---\nIntro.\n\n<!-- more -->\n\nRest.\n",
        );
        write(
            root,
            "source/_posts/second.md",
            "---\ntitle: Second Post\ndate: 2024-02-01\nstatus: draft\n---\nNot yet.\n",
        );
        write(root, "source/about.md", "---\ntitle: About\ndate: 2023-12-01\n---\nWho we are.\n");
        write(root, "source/docs/index.md", "---\ntitle: Docs\ndate: 2023-12-01\n---\nStart here.\n");
        write(root, "source/_drafts/idea.md", "---\ntitle: Idea\n---\nSkipped.\n");
        write(root, "source/_data/authors.yml", "- id: 1\n  name: Ada\n");
        dir
    }

    #[test]
    fn test_load_site_content() -> Result<()> {
        let dir = site();
        let store = load_site_content(dir.path())?;

        assert_eq!(store.len(), 4);
        assert_eq!(store.live_count(), 3);
        assert_eq!(store.authors_len(), 1);

        let hello = store.find_live("hello-world").unwrap();
        assert_eq!(hello.id, 7);
        assert_eq!(hello.kind, ContentType::Post);
        assert_eq!(hello.excerpt.as_deref(), Some("Intro."));
        assert!(hello.has_term(TaxonomyKind::Category, "design"));
        assert_eq!(hello.tags.len(), 2);

        assert_eq!(store.find_live("about").unwrap().kind, ContentType::Page);
        assert!(store.find_live("docs").is_some());
        assert!(store.find_live("second-post").is_none());
        Ok(())
    }

    #[test]
    fn test_missing_ids_follow_explicit_ones() -> Result<()> {
        let dir = site();
        let store = load_site_content(dir.path())?;
        let (posts, _) = store.list_live(&ListFilter::posts(), SortOrder::Newest, 1, 10);
        assert_eq!(posts.len(), 1);

        let about = store.find_live("about").unwrap();
        let docs = store.find_live("docs").unwrap();
        assert!(about.id > 7 && docs.id > 7);
        assert_ne!(about.id, docs.id);
        Ok(())
    }

    #[test]
    fn test_missing_source_dir_is_empty() -> Result<()> {
        let dir = TempDir::new()?;
        assert!(load_site_content(dir.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2024-01-02T10:00:00Z").is_some());
        assert!(parse_date("2024-01-02 10:00:00 +0800").is_some());
        assert!(parse_date("2024-01-02 10:00:00").is_some());
        assert!(parse_date("2024-01-02").is_some());
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn test_path_slug() {
        assert_eq!(path_slug(Path::new("about.md")), "about");
        assert_eq!(path_slug(Path::new("docs/index.md")), "docs");
        assert_eq!(path_slug(Path::new("docs/intro.md")), "docs/intro");
    }
}
