use percent_encoding::percent_decode_str;
use std::path::Path;

/// 从文本生成 URL 友好的别名
pub fn slugify(text: &str) -> String {
    slug::slugify(text)
}

/// 将请求路径拆分为非空路径段
pub fn split_path(path: &str) -> Vec<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect()
}

/// 逐段解码请求路径中的百分号编码，`%2F` 不会变成新的路径段
pub fn decode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().replace('/', "%2F"))
        .collect::<Vec<_>>()
        .join("/")
}

/// 由站点 URL 和别名生成永久链接
pub fn permalink(site_url: &str, slug: &str) -> String {
    format!("{}{}", site_url.trim_end_matches('/'), ensure_leading_slash(slug))
}

/// 检查文件是否为 Markdown 文件
pub fn is_markdown_file<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    if let Some(ext) = path.extension() {
        ext == "md" || ext == "markdown"
    } else {
        false
    }
}

/// 确保路径以斜杠开头
pub fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// 截取前 `limit` 个字符作为摘要
pub fn truncate_chars(content: &str, limit: usize) -> String {
    match content.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", content[..idx].trim_end()),
        None => content.to_string(),
    }
}

/// 统计字数：英文按单词，中文按字
pub fn count_words(content: &str) -> usize {
    let english_words = content
        .split_whitespace()
        .filter(|word| word.chars().any(|c| c.is_alphanumeric() && !is_cjk(c)))
        .count();
    let chinese_chars = content.chars().filter(|c| is_cjk(*c)).count();
    english_words + chinese_chars
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' | // CJK统一汉字
        '\u{3400}'..='\u{4DBF}' | // CJK扩展A
        '\u{F900}'..='\u{FAFF}'   // CJK兼容汉字
    )
}

pub mod markdown;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_drops_empty_segments_and_query() {
        assert_eq!(split_path("/category/design/"), vec!["category", "design"]);
        assert_eq!(split_path("//about?ref=nav"), vec!["about"]);
        assert!(split_path("/").is_empty());
        assert!(split_path("").is_empty());
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/%E5%85%B3%E4%BA%8E"), "/关于");
        assert_eq!(decode_path("/search/rust%20web"), "/search/rust web");
        assert_eq!(decode_path("/a%2Fb/c"), "/a%2Fb/c");
        assert_eq!(decode_path("/plain/"), "/plain/");
    }

    #[test]
    fn test_permalink() {
        assert_eq!(permalink("https://example.com/", "hello-world"), "https://example.com/hello-world");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("你好世界", 2), "你好...");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_count_words_mixed() {
        assert_eq!(count_words("hello world"), 2);
        assert_eq!(count_words("你好 world"), 3);
    }
}
