use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// 首页模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HomepageMode {
    /// 显示最新文章列表
    #[default]
    Posts,
    /// 显示指定页面
    Page,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HomepageConfig {
    #[serde(default)]
    pub mode: HomepageMode,
    pub page_id: Option<u64>,
}

/// 站点配置（`_config.yml`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub url: Option<String>,
    pub root: Option<String>,
    pub logo: Option<String>,
    pub favicon: Option<String>,
    pub per_page: Option<usize>,
    pub theme: Option<String>,
    pub homepage: Option<HomepageConfig>,
    pub plugins: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            subtitle: None,
            description: None,
            author: None,
            language: Some("en".to_string()),
            url: None,
            root: Some("/".to_string()),
            logo: None,
            favicon: None,
            per_page: None,
            theme: Some("default".to_string()),
            homepage: None,
            plugins: None,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// 加载配置的别名
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_file(path)
    }

    /// 加载站点目录下的 `_config.yml`，不存在时使用默认配置
    pub fn load_or_default(base_dir: &Path) -> Result<Self> {
        let config_path = base_dir.join("_config.yml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// 规范化后的站点 URL（去掉末尾斜杠）
    fn site_url(&self) -> String {
        let raw = self.url.clone().unwrap_or_else(|| "http://localhost:4000".to_string());
        if let Err(e) = url::Url::parse(&raw) {
            warn!("站点 URL 无效: {} ({})", raw, e);
        }
        raw.trim_end_matches('/').to_string()
    }
}

/// 每次请求自动加载的站点设置
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub site_title: String,
    pub tagline: Option<String>,
    pub logo: Option<String>,
    pub favicon: Option<String>,
    pub url: String,
    pub homepage_mode: HomepageMode,
    pub homepage_page_id: Option<u64>,
    pub per_page: usize,
    pub theme: String,
    pub plugins: Vec<String>,
}

/// 设置来源
pub trait SettingsProvider: Send + Sync {
    fn autoload_settings(&self) -> Settings;
}

impl SettingsProvider for Config {
    fn autoload_settings(&self) -> Settings {
        let homepage = self.homepage.clone().unwrap_or_default();
        Settings {
            site_title: self.title.clone(),
            tagline: self.subtitle.clone(),
            logo: self.logo.clone(),
            favicon: self.favicon.clone(),
            url: self.site_url(),
            homepage_mode: homepage.mode,
            homepage_page_id: homepage.page_id,
            per_page: self.per_page.unwrap_or(10).max(1),
            theme: self.theme.clone().unwrap_or_else(|| "default".to_string()),
            plugins: self.plugins.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_homepage_settings() {
        let yaml = r#"
title: Field Notes
subtitle: Slow writing
url: https://notes.example.com/
per_page: 5
theme: aurora
homepage:
  mode: page
  page_id: 7
plugins:
  - word-count
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let settings = config.autoload_settings();

        assert_eq!(settings.site_title, "Field Notes");
        assert_eq!(settings.tagline.as_deref(), Some("Slow writing"));
        assert_eq!(settings.url, "https://notes.example.com");
        assert_eq!(settings.homepage_mode, HomepageMode::Page);
        assert_eq!(settings.homepage_page_id, Some(7));
        assert_eq!(settings.per_page, 5);
        assert_eq!(settings.theme, "aurora");
        assert_eq!(settings.plugins, vec!["word-count".to_string()]);
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let config: Config = serde_yaml::from_str("title: Bare\n").unwrap();
        let settings = config.autoload_settings();

        assert_eq!(settings.homepage_mode, HomepageMode::Posts);
        assert_eq!(settings.per_page, 10);
        assert_eq!(settings.theme, "default");
        assert!(settings.plugins.is_empty());
    }
}
