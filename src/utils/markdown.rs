use pulldown_cmark::{html, Options, Parser};

/// 摘要分隔符
pub const MORE_MARKER: &str = "<!-- more -->";

/// 将Markdown渲染为HTML
pub fn render(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// 提取摘要：优先使用 `<!-- more -->` 之前的内容，否则截取前 200 个字符
pub fn excerpt(markdown: &str) -> String {
    match markdown.split_once(MORE_MARKER) {
        Some((head, _)) => head.trim().to_string(),
        None => super::truncate_chars(markdown.trim(), 200),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_uses_more_marker() {
        let body = "Intro paragraph.\n\n<!-- more -->\n\nThe rest.";
        assert_eq!(excerpt(body), "Intro paragraph.");
    }

    #[test]
    fn test_render_table() {
        let html = render("| a |\n|---|\n| 1 |");
        assert!(html.contains("<table>"));
    }
}
