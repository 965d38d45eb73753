use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::core::error::RouterError;

/// 清单文件名
pub const MANIFEST_FILE: &str = "manifest.yml";

/// 主题清单：每种内容类型使用的模板以及需要运行的提供者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeManifest {
    pub name: String,
    templates: HashMap<String, String>,
    providers: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    name: Option<String>,
    #[serde(default)]
    templates: HashMap<serde_yaml::Value, String>,
    #[serde(default)]
    providers: HashMap<serde_yaml::Value, Vec<String>>,
}

/// 清单键可以写成字符串或数字（例如未加引号的 `404`）
fn key_to_string(theme: &str, key: serde_yaml::Value) -> Result<String, RouterError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(RouterError::InvalidManifest {
            theme: theme.to_string(),
            message: format!("无效的类型键: {:?}", other),
        }),
    }
}

impl ThemeManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            templates: HashMap::new(),
            providers: HashMap::new(),
        }
    }

    pub fn with_template(mut self, key: &str, template: &str) -> Self {
        self.templates.insert(key.to_string(), template.to_string());
        self
    }

    pub fn with_providers<S: AsRef<str>>(mut self, key: &str, providers: &[S]) -> Self {
        self.providers.insert(key.to_string(), dedupe(providers.iter().map(|p| p.as_ref().to_string())));
        self
    }

    /// 从 YAML 文本解析清单
    pub fn parse(theme: &str, yaml: &str) -> Result<Self, RouterError> {
        let raw: RawManifest = serde_yaml::from_str(yaml).map_err(|e| RouterError::InvalidManifest {
            theme: theme.to_string(),
            message: e.to_string(),
        })?;

        let templates = raw
            .templates
            .into_iter()
            .map(|(key, template)| Ok((key_to_string(theme, key)?, template)))
            .collect::<Result<HashMap<_, _>, RouterError>>()?;
        let providers = raw
            .providers
            .into_iter()
            .map(|(key, names)| Ok((key_to_string(theme, key)?, dedupe(names))))
            .collect::<Result<HashMap<_, _>, RouterError>>()?;

        Ok(Self {
            name: raw.name.unwrap_or_else(|| theme.to_string()),
            templates,
            providers,
        })
    }

    /// 类型键对应的模板
    pub fn template_for(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// 类型键对应的提供者列表，未声明时返回 None
    pub fn providers_for(&self, key: &str) -> Option<&[String]> {
        self.providers.get(key).map(Vec::as_slice)
    }

    pub fn declares(&self, key: &str) -> bool {
        self.templates.contains_key(key) || self.providers.contains_key(key)
    }
}

/// 保序去重
fn dedupe(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

/// 主题清单加载器
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    themes_dir: PathBuf,
}

impl ManifestLoader {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            themes_dir: base_dir.join("themes"),
        }
    }

    /// 主题目录
    pub fn theme_dir(&self, theme: &str) -> PathBuf {
        self.themes_dir.join(theme)
    }

    /// 加载主题清单；清单缺失或无法解析都是致命的配置错误
    pub fn load(&self, theme: &str) -> Result<ThemeManifest, RouterError> {
        let path = self.theme_dir(theme).join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| {
            error!("读取主题清单失败: {} - {}", path.display(), e);
            RouterError::ThemeNotFound {
                theme: theme.to_string(),
                path: path.clone(),
            }
        })?;

        let manifest = ThemeManifest::parse(theme, &content).map_err(|e| {
            error!("{}", e);
            e
        })?;
        debug!("已加载主题清单: {}", manifest.name);
        Ok(manifest)
    }
}
