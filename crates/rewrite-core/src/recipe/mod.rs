//! Recipes: named, configurable source transformations
//!
//! A recipe hands out a fresh [`SourceVisitor`] (its editor) for every file
//! it visits, so editors can keep per-file state without synchronization.
//! Recipes are looked up by name in a [`RecipeRegistry`], which binds
//! options from JSON.

mod context;
mod scheduler;

pub use context::{ExecutionContext, RecipeFailure};
pub use scheduler::{RecipeRun, RecipeScheduler, SourceResult};

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::RewriteError;
use crate::result::Result;
use crate::source::{SourceFile, SourceVisitor};

pub trait Recipe: Send + Sync {
    /// Registry name, e.g. `json.DeleteKey`
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// A new editor instance for one source file
    fn editor(&self) -> Box<dyn SourceVisitor<ExecutionContext>>;

    /// Source files to add before the first cycle edits anything
    fn generate(&self, _ctx: &mut ExecutionContext) -> Result<Vec<SourceFile>> {
        Ok(Vec::new())
    }
}

type RecipeFactory = Box<dyn Fn(&serde_json::Value) -> Result<Arc<dyn Recipe>> + Send + Sync>;

/// Recipe factories keyed by name
#[derive(Default)]
pub struct RecipeRegistry {
    factories: BTreeMap<String, RecipeFactory>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in recipe
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_options::<crate::json::recipes::DeleteKey>(
            crate::json::recipes::DeleteKey::NAME,
        );
        registry.register_options::<crate::json::recipes::FindKey>(
            crate::json::recipes::FindKey::NAME,
        );
        registry.register_options::<crate::java::recipes::TernaryToOptionalChain>(
            crate::java::recipes::TernaryToOptionalChain::NAME,
        );
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&serde_json::Value) -> Result<Arc<dyn Recipe>> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(recipe = %name, "registering recipe");
        self.factories.insert(name, Box::new(factory));
    }

    /// Register a recipe whose options deserialize straight into it
    pub fn register_options<R>(&mut self, name: &'static str)
    where
        R: Recipe + DeserializeOwned + 'static,
    {
        self.register(name, move |options| {
            let options = match options {
                serde_json::Value::Null => serde_json::Value::Object(Default::default()),
                other => other.clone(),
            };
            let recipe: R = serde_json::from_value(options)
                .map_err(|e| RewriteError::recipe_error(name, format!("invalid options: {e}")))?;
            Ok(Arc::new(recipe) as Arc<dyn Recipe>)
        });
    }

    /// Instantiate `name` with `options`
    pub fn prepare(&self, name: &str, options: &serde_json::Value) -> Result<Arc<dyn Recipe>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RewriteError::recipe_error(name, "no recipe registered under this name"))?;
        factory(options)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_builtins_are_registered() {
        let registry = RecipeRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(
            names,
            vec![
                "java.TernaryToOptionalChain",
                "json.DeleteKey",
                "json.FindKey"
            ]
        );
    }

    #[test]
    fn test_prepare_binds_options() {
        let registry = RecipeRegistry::with_builtins();
        let recipe = registry
            .prepare("json.DeleteKey", &serde_json::json!({"keyPath": "$.a.b"}))
            .unwrap();
        assert_eq!(recipe.name(), "json.DeleteKey");
        assert!(recipe.description().contains("Delete"));
    }

    #[test]
    fn test_prepare_without_options() {
        let registry = RecipeRegistry::with_builtins();
        let recipe = registry
            .prepare("java.TernaryToOptionalChain", &serde_json::Value::Null)
            .unwrap();
        assert_eq!(recipe.display_name(), "Use optional chaining");
    }

    #[test]
    fn test_prepare_unknown_recipe() {
        let registry = RecipeRegistry::new();
        let err = registry
            .prepare("nope", &serde_json::Value::Null)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Recipe);
    }

    #[test]
    fn test_prepare_invalid_options() {
        let registry = RecipeRegistry::with_builtins();
        let err = registry
            .prepare("json.DeleteKey", &serde_json::json!({"keyPath": 3}))
            .err()
            .unwrap();
        assert!(err.to_string().contains("invalid options"));
    }
}
