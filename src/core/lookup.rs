use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::models::{
    Author, ContentRecord, ContentType, ListFilter, Media, SortOrder, TaxonomyKind, TermCount,
};

/// 内容查询接口，只读；所有方法只返回在线记录（已发布且未软删除）
pub trait ContentLookup: Send + Sync {
    /// 按完整别名查找在线记录
    fn find_live(&self, slug: &str) -> Option<ContentRecord>;

    /// 按 ID 和类型查找在线记录，忽略别名
    fn find_live_by_id(&self, id: u64, kind: &ContentType) -> Option<ContentRecord>;

    /// 分页列出在线记录，返回当前页的记录和总数
    fn list_live(
        &self,
        filter: &ListFilter,
        order: SortOrder,
        page: usize,
        per_page: usize,
    ) -> (Vec<ContentRecord>, usize);

    fn find_author(&self, id: u64) -> Option<Author>;

    fn find_media(&self, id: u64) -> Option<Media>;

    /// 统计在线文章中的分类或标签
    fn list_terms(&self, kind: TaxonomyKind) -> Vec<TermCount>;
}

/// 内存中的内容仓库
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<ContentRecord>,
    authors: HashMap<u64, Author>,
    media: HashMap<u64, Media>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加记录；与在线记录别名冲突的在线记录会被拒绝
    pub fn insert(&mut self, record: ContentRecord) -> bool {
        if record.is_live() && self.find_live(&record.slug).is_some() {
            warn!("别名冲突，忽略记录 {} ({})", record.id, record.slug);
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn with_records(mut self, records: impl IntoIterator<Item = ContentRecord>) -> Self {
        for record in records {
            self.insert(record);
        }
        self
    }

    pub fn insert_author(&mut self, author: Author) {
        self.authors.insert(author.id, author);
    }

    pub fn insert_media(&mut self, media: Media) {
        self.media.insert(media.id, media);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 在线记录数量
    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    pub fn authors_len(&self) -> usize {
        self.authors.len()
    }

    pub fn media_len(&self) -> usize {
        self.media.len()
    }

    fn live(&self) -> impl Iterator<Item = &ContentRecord> {
        self.records.iter().filter(|record| record.is_live())
    }
}

impl ContentLookup for MemoryStore {
    fn find_live(&self, slug: &str) -> Option<ContentRecord> {
        self.live().find(|record| record.slug == slug).cloned()
    }

    fn find_live_by_id(&self, id: u64, kind: &ContentType) -> Option<ContentRecord> {
        self.live()
            .find(|record| record.id == id && &record.kind == kind)
            .cloned()
    }

    fn list_live(
        &self,
        filter: &ListFilter,
        order: SortOrder,
        page: usize,
        per_page: usize,
    ) -> (Vec<ContentRecord>, usize) {
        let mut matched: Vec<&ContentRecord> = self.live().filter(|record| filter.matches(record)).collect();
        matched.sort_by(|a, b| match order {
            SortOrder::Newest => b.published_at.cmp(&a.published_at).then(b.id.cmp(&a.id)),
            SortOrder::Oldest => a.published_at.cmp(&b.published_at).then(a.id.cmp(&b.id)),
        });

        let total = matched.len();
        let page = page.max(1);
        let per_page = per_page.max(1);
        let items = matched
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .cloned()
            .collect();

        (items, total)
    }

    fn find_author(&self, id: u64) -> Option<Author> {
        self.authors.get(&id).cloned()
    }

    fn find_media(&self, id: u64) -> Option<Media> {
        self.media.get(&id).cloned()
    }

    fn list_terms(&self, kind: TaxonomyKind) -> Vec<TermCount> {
        let mut counts: BTreeMap<String, TermCount> = BTreeMap::new();
        for record in self.live().filter(|record| record.kind == ContentType::Post) {
            for term in record.terms(kind) {
                counts
                    .entry(term.slug.clone())
                    .or_insert_with(|| TermCount {
                        name: term.name.clone(),
                        slug: term.slug.clone(),
                        count: 0,
                    })
                    .count += 1;
            }
        }
        counts.into_values().collect()
    }
}
