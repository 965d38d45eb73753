use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{PluginError, ProviderFault};
use crate::models::Fragment;

/// 提供者上下文，例如 `{"post": ...}`，无上下文的提供者收到空映射
pub type ProviderContext = Map<String, Value>;

/// 提供者解析函数
pub type Resolver = Arc<dyn Fn(&ProviderContext) -> Result<Fragment> + Send + Sync>;

/// 一批提供者的解析结果
#[derive(Debug, Clone, Default)]
pub struct ProviderBatch {
    /// 合并后的片段
    pub fragment: Fragment,
    /// 失败的提供者
    pub faults: Vec<ProviderFault>,
}

/// 提供者注册表：名称到解析函数的映射，每个请求开始时重建
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Resolver>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names();
        names.sort_unstable();
        f.debug_struct("ProviderRegistry").field("providers", &names).finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册提供者，同名提供者会被替换
    pub fn register<F>(&mut self, name: impl Into<String>, resolver: F)
    where
        F: Fn(&ProviderContext) -> Result<Fragment> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.providers.insert(name.clone(), Arc::new(resolver)).is_some() {
            warn!("提供者 {} 被重复注册，使用最后一次注册", name);
        } else {
            debug!("注册提供者: {}", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// 按顺序解析一批提供者
    ///
    /// 每个提供者只能看到共享的 `context`，看不到同批次其他提供者的输出。
    /// 未知名称被跳过；返回错误或 panic 的提供者不影响其余提供者，只记录故障。
    pub fn resolve_batch<S: AsRef<str>>(&self, names: &[S], context: &ProviderContext) -> ProviderBatch {
        let mut batch = ProviderBatch::default();

        for name in names {
            let name = name.as_ref();
            let Some(resolver) = self.providers.get(name) else {
                debug!("跳过未知提供者: {}", name);
                continue;
            };

            let outcome = catch_unwind(AssertUnwindSafe(|| resolver(context)));
            let message = match outcome {
                Ok(Ok(fragment)) => {
                    batch.fragment.extend(fragment);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(panic) => match panic.downcast_ref::<&str>() {
                    Some(s) => s.to_string(),
                    None => match panic.downcast_ref::<String>() {
                        Some(s) => s.clone(),
                        None => "provider panicked".to_string(),
                    },
                },
            };

            let fault = ProviderFault {
                provider: name.to_string(),
                message,
            };
            warn!("{}", PluginError::from(&fault));
            batch.faults.push(fault);
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;

    fn fragment(key: &str, value: Value) -> Fragment {
        let mut map = Map::new();
        map.insert(key.to_string(), value);
        map
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register("A", |_: &ProviderContext| Ok(fragment("x", json!(1))));
        registry.register("B", |_: &ProviderContext| Ok(fragment("y", json!(2))));
        registry
    }

    #[test]
    fn test_merges_fragments_in_order() {
        let batch = registry().resolve_batch(&["A", "B"], &Map::new());
        assert_eq!(Value::Object(batch.fragment), json!({"x": 1, "y": 2}));
        assert!(batch.faults.is_empty());
    }

    #[test]
    fn test_unknown_names_are_skipped() {
        let batch = registry().resolve_batch(&["A", "unknown", "B"], &Map::new());
        assert_eq!(Value::Object(batch.fragment), json!({"x": 1, "y": 2}));
        assert!(batch.faults.is_empty());
    }

    #[test]
    fn test_failing_provider_is_isolated() {
        let mut registry = registry();
        registry.register("broken", |_: &ProviderContext| Err(anyhow!("database went away")));
        registry.register("panicky", |_: &ProviderContext| -> Result<Fragment> { panic!("boom") });

        let batch = registry.resolve_batch(&["A", "broken", "panicky", "B"], &Map::new());

        assert_eq!(Value::Object(batch.fragment), json!({"x": 1, "y": 2}));
        assert_eq!(batch.faults.len(), 2);
        assert_eq!(batch.faults[0].provider, "broken");
        assert_eq!(batch.faults[0].message, "database went away");
        assert_eq!(batch.faults[1].provider, "panicky");
        assert_eq!(batch.faults[1].message, "boom");
    }

    #[test]
    fn test_providers_only_see_shared_context() {
        let mut registry = ProviderRegistry::new();
        registry.register("first", |_: &ProviderContext| Ok(fragment("first", json!(true))));
        registry.register("second", |ctx: &ProviderContext| {
            Ok(fragment("saw_first", json!(ctx.contains_key("first"))))
        });

        let batch = registry.resolve_batch(&["first", "second"], &Map::new());
        assert_eq!(batch.fragment["saw_first"], json!(false));
    }

    #[test]
    fn test_later_provider_wins_on_key_collision() {
        let mut registry = ProviderRegistry::new();
        registry.register("one", |_: &ProviderContext| Ok(fragment("k", json!("one"))));
        registry.register("two", |_: &ProviderContext| Ok(fragment("k", json!("two"))));

        let batch = registry.resolve_batch(&["one", "two"], &Map::new());
        assert_eq!(batch.fragment["k"], json!("two"));
    }
}
