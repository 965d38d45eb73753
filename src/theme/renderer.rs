use anyhow::{anyhow, Result};
use chrono::DateTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};
use tracing::{debug, error, warn};

use super::Renderer;
use crate::models::DataContract;
use crate::utils::markdown;

/// 没有 404 模板时的兜底输出
const FALLBACK_NOT_FOUND: &str = "<!DOCTYPE html><html><body><h1>404 Not Found</h1></body></html>";

/// 基于 Tera 的主题渲染器
#[derive(Clone)]
pub struct ThemeRenderer {
    /// 主题目录
    pub theme_dir: PathBuf,
    /// 模板引擎
    pub tera: Tera,
}

impl ThemeRenderer {
    /// 加载 `themes/<name>/layout` 下的全部模板
    pub fn new(base_dir: &Path, theme: &str) -> Result<Self> {
        let theme_dir = base_dir.join("themes").join(theme);

        if !theme_dir.exists() {
            return Err(anyhow!("主题目录不存在: {}", theme_dir.display()));
        }

        let mut tera = Tera::new(&format!("{}/**/*.html", theme_dir.join("layout").display()))?;
        Self::register_filters(&mut tera);
        debug!("主题 {} 加载了 {} 个模板", theme, tera.get_template_names().count());

        Ok(ThemeRenderer { theme_dir, tera })
    }

    /// 注册模板过滤器
    fn register_filters(tera: &mut Tera) {
        tera.register_filter("date_format", Self::date_format_filter);
        tera.register_filter("markdown", Self::markdown_filter);
    }

    /// 检查布局是否存在
    pub fn has_layout(&self, layout: &str) -> bool {
        self.tera.get_template_names().any(|name| name == layout)
    }

    /// 获取主题资源目录
    pub fn source_dir(&self) -> PathBuf {
        self.theme_dir.join("source")
    }

    fn context(contract: &DataContract) -> Result<TeraContext> {
        Ok(TeraContext::from_serialize(contract)?)
    }

    fn date_format_filter(value: &tera::Value, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        if let Some(date) = value.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok()) {
            let format = args.get("format").and_then(|f| f.as_str()).unwrap_or("%Y-%m-%d");
            Ok(tera::Value::String(date.format(format).to_string()))
        } else {
            Ok(value.clone())
        }
    }

    fn markdown_filter(value: &tera::Value, _args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        match value.as_str() {
            Some(text) => Ok(tera::Value::String(markdown::render(text))),
            None => Ok(value.clone()),
        }
    }
}

impl Renderer for ThemeRenderer {
    fn render(&self, template: &str, contract: &DataContract) -> Result<String> {
        let context = Self::context(contract)?;
        self.tera.render(template, &context).map_err(|e| {
            error!("模板渲染失败: {} - {:?}", template, e);
            anyhow!("模板渲染失败: {}: {}", template, e)
        })
    }

    fn render_not_found(&self, contract: &DataContract) -> Result<String> {
        if self.has_layout(&contract.template) {
            return self.render(&contract.template, contract);
        }
        warn!("主题缺少 404 模板 {}，使用默认页面", contract.template);
        Ok(FALLBACK_NOT_FOUND.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SiteFragment;
    use serde_json::{json, Map};
    use std::fs;
    use tempfile::TempDir;

    fn theme() -> TempDir {
        let dir = TempDir::new().unwrap();
        let layout = dir.path().join("themes/aurora/layout");
        fs::create_dir_all(&layout).unwrap();
        fs::write(
            layout.join("post.html"),
            "<h1>{{ post.title }}</h1>{{ post.content | markdown | safe }}<time>{{ post.published_at | date_format(format=\"%Y/%m/%d\") | safe }}</time>{{ site.name }}",
        )
        .unwrap();
        dir
    }

    fn contract(template: &str) -> DataContract {
        let site = SiteFragment {
            name: "Field Notes".to_string(),
            tagline: None,
            logo: None,
            favicon: None,
            url: "https://example.com".to_string(),
        };
        DataContract::new(site, template)
    }

    #[test]
    fn test_render_post() -> Result<()> {
        let dir = theme();
        let renderer = ThemeRenderer::new(dir.path(), "aurora")?;

        let mut contract = contract("post.html");
        contract.is_single = true;
        contract.post = Some(json!({
            "title": "Hello",
            "content": "*hi*",
            "published_at": "2024-03-05T10:00:00Z",
        }));

        let html = renderer.render("post.html", &contract)?;
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<em>hi</em>"));
        assert!(html.contains("2024/03/05"));
        assert!(html.contains("Field Notes"));
        Ok(())
    }

    #[test]
    fn test_not_found_without_template_uses_fallback() -> Result<()> {
        let dir = theme();
        let renderer = ThemeRenderer::new(dir.path(), "aurora")?;
        let mut contract = contract("404.html");
        contract.is_404 = true;
        contract.merge(Map::new());

        assert!(renderer.render_not_found(&contract)?.contains("404"));
        Ok(())
    }

    #[test]
    fn test_missing_theme_dir() {
        let dir = TempDir::new().unwrap();
        assert!(ThemeRenderer::new(dir.path(), "absent").is_err());
    }
}
