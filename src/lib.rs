pub mod core;
pub mod models;
pub mod plugins;
pub mod theme;
pub mod utils;

// Re-export commonly used types and traits
pub use crate::core::{ContentLookup, Dispatcher, MemoryStore, RouterError, Site};
pub use crate::models::{Config, ContentRecord, ContentType, DataContract, Settings, SettingsProvider};
pub use crate::plugins::{Plugin, PluginContext, PluginManager};
pub use crate::theme::{Renderer, ThemeManifest, ThemeRenderer};
