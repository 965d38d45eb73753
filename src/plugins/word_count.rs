use serde_json::{Map, Value};

use super::{Plugin, PluginContext, ProviderContext, ProviderRegistry};
use crate::utils::count_words;

/// 字数统计插件：为上下文中的文章提供 `word_count` 和 `reading_time`
#[derive(Debug, Clone)]
pub struct WordCountPlugin {
    name: String,
    version: String,
    description: String,
    /// 每分钟阅读字数
    words_per_minute: usize,
}

impl Default for WordCountPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl WordCountPlugin {
    pub fn new() -> Self {
        Self {
            name: "word-count".to_string(),
            version: "0.1.0".to_string(),
            description: "文章字数统计插件".to_string(),
            words_per_minute: 200,
        }
    }

    /// 计算阅读时间（分钟），至少为 1 分钟
    fn estimate_read_time(words: usize, words_per_minute: usize) -> usize {
        words.div_ceil(words_per_minute.max(1)).max(1)
    }
}

impl Plugin for WordCountPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn register_providers(&self, registry: &mut ProviderRegistry, _context: &PluginContext) {
        let words_per_minute = self.words_per_minute;
        registry.register("word_count", move |ctx: &ProviderContext| {
            let mut fragment = Map::new();
            let Some(content) = ctx
                .get("post")
                .and_then(|post| post.get("content"))
                .and_then(Value::as_str)
            else {
                return Ok(fragment);
            };

            let words = count_words(content);
            fragment.insert("word_count".to_string(), Value::from(words));
            fragment.insert(
                "reading_time".to_string(),
                Value::from(Self::estimate_read_time(words, words_per_minute)),
            );
            Ok(fragment)
        });
    }
}
