use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::models::config::Settings;
use crate::plugins::ProviderFault;

/// 数据片段：输出键到值的映射
pub type Fragment = Map<String, Value>;

/// 站点信息片段
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteFragment {
    pub name: String,
    pub tagline: Option<String>,
    pub logo: Option<String>,
    pub favicon: Option<String>,
    pub url: String,
}

impl From<&Settings> for SiteFragment {
    fn from(settings: &Settings) -> Self {
        Self {
            name: settings.site_title.clone(),
            tagline: settings.tagline.clone(),
            logo: settings.logo.clone(),
            favicon: settings.favicon.clone(),
            url: settings.url.clone(),
        }
    }
}

/// 分页信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub last_page: usize,
    pub per_page: usize,
    pub total: usize,
    /// 当前页第一项的序号（从 1 开始），空页为 None
    pub from: Option<usize>,
    /// 当前页最后一项的序号，空页为 None
    pub to: Option<usize>,
    pub prev_page: Option<usize>,
    pub next_page: Option<usize>,
}

impl Pagination {
    /// 根据总数计算分页；`page` 与 `per_page` 已被钳制为至少 1
    pub fn new(page: usize, per_page: usize, total: usize, shown: usize) -> Self {
        let last_page = total.div_ceil(per_page).max(1);
        let (from, to) = if shown == 0 {
            (None, None)
        } else {
            let from = (page - 1) * per_page + 1;
            (Some(from), Some(from + shown - 1))
        };

        Self {
            current_page: page,
            last_page,
            per_page,
            total,
            from,
            to,
            prev_page: (page > 1).then(|| (page - 1).min(last_page)),
            next_page: (page < last_page).then_some(page + 1),
        }
    }
}

/// 交给渲染器的标准数据契约
#[derive(Debug, Clone)]
pub struct DataContract {
    /// 渲染使用的模板路径
    pub template: String,
    pub site: SiteFragment,
    pub pagination: Option<Pagination>,
    pub is_home: bool,
    pub is_single: bool,
    pub is_archive: bool,
    pub is_page: bool,
    pub is_404: bool,
    /// 单篇内容
    pub post: Option<Value>,
    /// 列表内容
    pub posts: Option<Vec<Value>>,
    /// 提供者与插件合并进来的片段，与标准键冲突时覆盖标准键
    pub fragments: Fragment,
    /// 本次请求中失败的提供者，仅用于诊断，不进入模板
    pub faults: Vec<ProviderFault>,
}

impl DataContract {
    pub fn new(site: SiteFragment, template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            site,
            pagination: None,
            is_home: false,
            is_single: false,
            is_archive: false,
            is_page: false,
            is_404: false,
            post: None,
            posts: None,
            fragments: Map::new(),
            faults: Vec::new(),
        }
    }

    /// 404 契约
    pub fn not_found(site: SiteFragment, template: impl Into<String>) -> Self {
        let mut contract = Self::new(site, template);
        contract.is_404 = true;
        contract
    }

    /// 合并片段，后合并的值覆盖先前的值
    pub fn merge(&mut self, fragment: Fragment) {
        self.fragments.extend(fragment);
    }

    /// 合并后的完整映射
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("site".to_string(), serde_json::to_value(&self.site).unwrap_or(Value::Null));
        map.insert(
            "pagination".to_string(),
            serde_json::to_value(&self.pagination).unwrap_or(Value::Null),
        );
        map.insert("is_home".to_string(), Value::Bool(self.is_home));
        map.insert("is_single".to_string(), Value::Bool(self.is_single));
        map.insert("is_archive".to_string(), Value::Bool(self.is_archive));
        map.insert("is_page".to_string(), Value::Bool(self.is_page));
        map.insert("is_404".to_string(), Value::Bool(self.is_404));
        if let Some(post) = &self.post {
            map.insert("post".to_string(), post.clone());
        }
        if let Some(posts) = &self.posts {
            map.insert("posts".to_string(), Value::Array(posts.clone()));
        }
        for (key, value) in &self.fragments {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    /// 按键读取合并后的值
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.to_value() {
            Value::Object(mut map) => map.remove(key),
            _ => None,
        }
    }
}

impl Serialize for DataContract {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
