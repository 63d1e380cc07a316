//! Fixpoint recipe scheduler
//!
//! Each cycle runs every recipe over every live source file. Files are
//! visited concurrently (bounded by `concurrency`) on the caller's task;
//! a single file's visit stays sequential. A file is replaced only when
//! the editor hands back a different reference. Cycles stop once a full
//! cycle changes nothing or `max_cycles` is reached.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use similar::TextDiff;
use tracing::Instrument;

use crate::config::SchedulerConfig;
use crate::cursor::Cursor;
use crate::result::{Result, ResultExt};
use crate::source::SourceFile;
use crate::tree::Tree;

use super::{ExecutionContext, Recipe, RecipeFailure};

/// One file's outcome
#[derive(Debug, Clone)]
pub struct SourceResult {
    /// `None` for generated files
    pub before: Option<SourceFile>,
    /// `None` for deleted files
    pub after: Option<SourceFile>,
    /// Recipes that changed this file, in the order they first did
    pub recipes: Vec<String>,
}

impl SourceResult {
    pub fn source_path(&self) -> &str {
        self.after
            .as_ref()
            .or(self.before.as_ref())
            .map(SourceFile::source_path)
            .unwrap_or_default()
    }

    /// Unified diff of the printed before and after
    pub fn diff(&self) -> String {
        let before = self.before.as_ref().map(SourceFile::print).unwrap_or_default();
        let after = self.after.as_ref().map(SourceFile::print).unwrap_or_default();
        let path = self.source_path();
        TextDiff::from_lines(&before, &after)
            .unified_diff()
            .header(&format!("a/{path}"), &format!("b/{path}"))
            .to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipeRun {
    /// Changed, generated, or deleted files, in input order
    pub results: Vec<SourceResult>,
    /// Cycles actually run
    pub cycles: usize,
}

impl RecipeRun {
    pub fn diff(&self) -> String {
        self.results.iter().map(SourceResult::diff).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RecipeScheduler {
    max_cycles: usize,
    concurrency: usize,
}

impl Default for RecipeScheduler {
    fn default() -> Self {
        Self::new(&SchedulerConfig::default())
    }
}

struct Slot {
    before: Option<SourceFile>,
    current: Option<SourceFile>,
    recipes: Vec<String>,
}

impl RecipeScheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            max_cycles: config.max_cycles.max(1),
            concurrency: config.concurrency.max(1),
        }
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(
        &self,
        recipes: &[Arc<dyn Recipe>],
        sources: Vec<SourceFile>,
        ctx: &mut ExecutionContext,
    ) -> Result<RecipeRun> {
        let mut slots: Vec<Slot> = sources
            .into_iter()
            .map(|source| Slot {
                before: Some(source.clone()),
                current: Some(source),
                recipes: Vec::new(),
            })
            .collect();

        for recipe in recipes {
            // A recipe that rejects its options generates nothing
            let generated = recipe.generate(ctx).recoverable()?.unwrap_or_default();
            for generated in generated {
                tracing::debug!(
                    recipe = recipe.name(),
                    source_path = generated.source_path(),
                    "generated source file"
                );
                slots.push(Slot {
                    before: None,
                    current: Some(generated),
                    recipes: vec![recipe.name().to_string()],
                });
            }
        }

        let mut cycles = 0;
        for cycle in 1..=self.max_cycles {
            cycles = cycle;
            ctx.set_cycle(cycle);

            let mut changed = false;
            for recipe in recipes {
                let span = tracing::debug_span!("recipe", cycle, recipe = recipe.name());
                changed |= self
                    .run_recipe(recipe, &mut slots, ctx)
                    .instrument(span)
                    .await;
            }
            if !changed {
                break;
            }
        }

        let results: Vec<SourceResult> = slots
            .into_iter()
            .filter(|slot| match (&slot.before, &slot.current) {
                (Some(before), Some(after)) => !before.is_same(after),
                // Generated, then deleted by a later cycle
                (None, None) => false,
                _ => true,
            })
            .map(|slot| SourceResult {
                before: slot.before,
                after: slot.current,
                recipes: slot.recipes,
            })
            .collect();

        tracing::info!(cycles, changed = results.len(), "recipe run complete");
        Ok(RecipeRun { results, cycles })
    }

    /// Run one recipe over every live file; true if any file changed
    async fn run_recipe(
        &self,
        recipe: &Arc<dyn Recipe>,
        slots: &mut [Slot],
        ctx: &mut ExecutionContext,
    ) -> bool {
        let visits: Vec<_> = stream::iter(slots.iter().map(|slot| slot.current.clone()))
            .map(|source| {
                let mut child = ctx.fork();
                let recipe = Arc::clone(recipe);
                async move {
                    let after = match source {
                        Some(source) => visit_one(recipe.as_ref(), source, &mut child).await,
                        None => None,
                    };
                    (after, child)
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut changed = false;
        for (slot, (after, child)) in slots.iter_mut().zip(visits) {
            ctx.merge(child);
            let same = match (&slot.current, &after) {
                (Some(current), Some(after)) => current.is_same(after),
                (None, None) => true,
                _ => false,
            };
            if same {
                continue;
            }
            changed = true;
            if !slot.recipes.iter().any(|name| name == recipe.name()) {
                slot.recipes.push(recipe.name().to_string());
            }
            slot.current = after;
        }
        changed
    }
}

/// Visit one file; a failing editor leaves the file as it was
async fn visit_one(
    recipe: &dyn Recipe,
    source: SourceFile,
    ctx: &mut ExecutionContext,
) -> Option<SourceFile> {
    let mut editor = recipe.editor();
    if !editor.is_acceptable(&source) {
        return Some(source);
    }
    match editor.visit_source(&source, ctx, &Cursor::root()).await {
        Ok(after) => after,
        Err(err) => {
            ctx.record_failure(RecipeFailure {
                recipe: recipe.name().to_string(),
                source_path: source.source_path().to_string(),
                message: err.to_string(),
            });
            Some(source)
        }
    }
}
