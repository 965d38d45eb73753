pub mod manifest;
pub mod renderer;

pub use manifest::{ManifestLoader, ThemeManifest, MANIFEST_FILE};
pub use renderer::ThemeRenderer;

use anyhow::Result;

use crate::models::DataContract;

/// 模板渲染器
pub trait Renderer {
    /// 使用契约中的模板渲染
    fn render(&self, template: &str, contract: &DataContract) -> Result<String>;

    /// 渲染 404 页面
    fn render_not_found(&self, contract: &DataContract) -> Result<String>;
}
