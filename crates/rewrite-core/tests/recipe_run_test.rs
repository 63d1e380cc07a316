//! Scheduler behavior across multiple files and recipes

use std::sync::Arc;

use async_trait::async_trait;
use rewrite_core::java::{CompilationUnit, FieldAccess, J, Ternary};
use rewrite_core::json::JsonParser;
use rewrite_core::json::recipes::FindKey;
use rewrite_core::{
    Cursor, ExecutionContext, LeftPadded, Marker, Markers, Recipe, RecipeRegistry,
    RecipeScheduler, Result, RewriteError, RightPadded, SearchResultPrinter, SourceFile,
    SourceVisitor, Space, Tree,
};
use serde_json::json;

/// `a ? a.b : undefined;`
fn guarded_access_unit() -> SourceFile {
    let ternary = J::Ternary(Arc::new(Ternary::new(
        Space::EMPTY,
        J::identifier(Space::EMPTY, "a"),
        LeftPadded::new(
            Space::whitespace(" "),
            J::FieldAccess(Arc::new(FieldAccess::new(
                Space::whitespace(" "),
                J::identifier(Space::EMPTY, "a"),
                LeftPadded::build(J::identifier(Space::EMPTY, "b")),
            ))),
        ),
        LeftPadded::new(
            Space::whitespace(" "),
            J::identifier(Space::whitespace(" "), "undefined"),
        ),
    )));
    let statement =
        RightPadded::build(ternary).with_markers(Markers::new().add(Arc::new(Marker::semicolon())));
    SourceFile::Java(Arc::new(CompilationUnit::new(
        "guard.js",
        vec![statement],
        Space::whitespace("\n"),
    )))
}

fn builtins(registry: &RecipeRegistry) -> Vec<Arc<dyn Recipe>> {
    vec![
        registry
            .prepare("json.DeleteKey", &json!({"keyPath": "$.a.b"}))
            .unwrap(),
        registry
            .prepare("json.FindKey", &json!({"keyPath": "$.a.c"}))
            .unwrap(),
        registry
            .prepare("java.TernaryToOptionalChain", &serde_json::Value::Null)
            .unwrap(),
    ]
}

#[tokio::test]
async fn test_builtin_recipes_over_mixed_sources() {
    let registry = RecipeRegistry::with_builtins();
    let recipes = builtins(&registry);

    let changed = JsonParser.parse("a.json", "{\"a\": {\"b\": 1, \"c\": 2}}\n");
    let untouched = JsonParser.parse("b.json", "{\"x\": 1}\n");
    let broken = JsonParser.parse("broken.json", "{");
    let unit = guarded_access_unit();
    assert_eq!(unit.print(), "a ? a.b : undefined;\n");

    let mut ctx = ExecutionContext::new();
    let run = RecipeScheduler::default()
        .run(
            &recipes,
            vec![changed, untouched, broken, unit],
            &mut ctx,
        )
        .await
        .unwrap();

    // Second cycle confirms the fixpoint
    assert_eq!(run.cycles, 2);
    assert_eq!(run.results.len(), 2);

    let json_result = &run.results[0];
    assert_eq!(json_result.source_path(), "a.json");
    assert_eq!(json_result.recipes, vec!["json.DeleteKey", "json.FindKey"]);
    let after = json_result.after.as_ref().unwrap();
    assert_eq!(after.print(), "{\"a\": { \"c\": 2}}\n");
    assert_eq!(
        after.print_with(&SearchResultPrinter),
        "{\"a\": { ~~>\"c\": 2}}\n"
    );

    let java_result = &run.results[1];
    assert_eq!(java_result.recipes, vec!["java.TernaryToOptionalChain"]);
    assert_eq!(java_result.after.as_ref().unwrap().print(), "a?.b;\n");

    insta::assert_snapshot!(java_result.diff(), @r"
    --- a/guard.js
    +++ b/guard.js
    @@ -1 +1 @@
    -a ? a.b : undefined;
    +a?.b;
    ");

    assert_eq!(
        ctx.rows(FindKey::DATA_TABLE),
        &[json!({"sourcePath": "a.json", "key": "a.c"})]
    );
    assert!(ctx.failures().is_empty());
}

#[tokio::test]
async fn test_unchanged_files_keep_their_reference() {
    let registry = RecipeRegistry::with_builtins();
    let recipes = builtins(&registry);
    let source = JsonParser.parse("b.json", "{\"x\": {\"b\": 1}}");

    let mut ctx = ExecutionContext::new();
    let run = RecipeScheduler::default()
        .run(&recipes, vec![source], &mut ctx)
        .await
        .unwrap();

    assert!(run.is_empty());
    assert_eq!(run.cycles, 1);
    assert!(run.diff().is_empty());
}

/// Fails on every file and generates one new file
struct Faulty;

struct FailingEditor;

#[async_trait]
impl SourceVisitor<ExecutionContext> for FailingEditor {
    async fn visit_source(
        &mut self,
        source: &SourceFile,
        _ctx: &mut ExecutionContext,
        _parent: &Cursor,
    ) -> Result<Option<SourceFile>> {
        Err(RewriteError::recipe_error(
            "test.Faulty",
            format!("cannot edit {}", source.source_path()),
        ))
    }
}

impl Recipe for Faulty {
    fn name(&self) -> &str {
        "test.Faulty"
    }

    fn display_name(&self) -> &str {
        "Faulty"
    }

    fn editor(&self) -> Box<dyn SourceVisitor<ExecutionContext>> {
        Box::new(FailingEditor)
    }

    fn generate(&self, _ctx: &mut ExecutionContext) -> Result<Vec<SourceFile>> {
        Ok(vec![JsonParser.parse("new.json", "{}\n")])
    }
}

#[tokio::test]
async fn test_failures_are_recorded_and_files_survive() {
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(Faulty)];
    let source = JsonParser.parse("a.json", "[1]");

    let mut ctx = ExecutionContext::new();
    let run = RecipeScheduler::default()
        .with_max_cycles(1)
        .run(&recipes, vec![source.clone()], &mut ctx)
        .await
        .unwrap();

    // Only the generated file is reported
    assert_eq!(run.results.len(), 1);
    assert!(run.results[0].before.is_none());
    assert_eq!(run.results[0].source_path(), "new.json");
    assert!(run.diff().contains("+{}"));

    let failures = ctx.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].source_path, "a.json");
    assert_eq!(failures[1].source_path, "new.json");
    assert!(failures[0].message.contains("cannot edit a.json"));
}

#[tokio::test]
async fn test_concurrency_does_not_change_results() {
    let registry = RecipeRegistry::with_builtins();
    let recipes = builtins(&registry);
    let sources: Vec<SourceFile> = (0..20)
        .map(|i| {
            JsonParser.parse(
                &format!("{i}.json"),
                &format!("{{\"a\": {{\"b\": {i}, \"c\": {i}}}}}"),
            )
        })
        .collect();

    let mut serial_ctx = ExecutionContext::new();
    let serial = RecipeScheduler::default()
        .with_concurrency(1)
        .run(&recipes, sources.clone(), &mut serial_ctx)
        .await
        .unwrap();

    let mut parallel_ctx = ExecutionContext::new();
    let parallel = RecipeScheduler::default()
        .with_concurrency(16)
        .run(&recipes, sources, &mut parallel_ctx)
        .await
        .unwrap();

    assert_eq!(serial.diff(), parallel.diff());
    assert_eq!(
        serial_ctx.rows(FindKey::DATA_TABLE),
        parallel_ctx.rows(FindKey::DATA_TABLE)
    );
    assert_eq!(serial_ctx.rows(FindKey::DATA_TABLE).len(), 20);
    assert_eq!(
        serial_ctx.rows(FindKey::DATA_TABLE)[3],
        json!({"sourcePath": "3.json", "key": "a.c"})
    );
}

/// Generates `scratch.json` and deletes it again on the next visit
struct Scratch;

struct DeleteScratch;

#[async_trait]
impl SourceVisitor<ExecutionContext> for DeleteScratch {
    async fn visit_source(
        &mut self,
        source: &SourceFile,
        _ctx: &mut ExecutionContext,
        _parent: &Cursor,
    ) -> Result<Option<SourceFile>> {
        if source.source_path() == "scratch.json" {
            return Ok(None);
        }
        Ok(Some(source.clone()))
    }
}

impl Recipe for Scratch {
    fn name(&self) -> &str {
        "test.Scratch"
    }

    fn display_name(&self) -> &str {
        "Scratch"
    }

    fn editor(&self) -> Box<dyn SourceVisitor<ExecutionContext>> {
        Box::new(DeleteScratch)
    }

    fn generate(&self, _ctx: &mut ExecutionContext) -> Result<Vec<SourceFile>> {
        Ok(vec![JsonParser.parse("scratch.json", "[]\n")])
    }
}

#[tokio::test]
async fn test_generated_then_deleted_file_is_not_reported() {
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(Scratch)];
    let source = JsonParser.parse("a.json", "{}");

    let mut ctx = ExecutionContext::new();
    let run = RecipeScheduler::default()
        .run(&recipes, vec![source], &mut ctx)
        .await
        .unwrap();

    assert!(run.is_empty());
    assert!(run.diff().is_empty());
}

/// Rejects its options when asked to generate
struct MisconfiguredGenerator;

impl Recipe for MisconfiguredGenerator {
    fn name(&self) -> &str {
        "test.MisconfiguredGenerator"
    }

    fn display_name(&self) -> &str {
        "Misconfigured generator"
    }

    fn editor(&self) -> Box<dyn SourceVisitor<ExecutionContext>> {
        Box::new(DeleteScratch)
    }

    fn generate(&self, _ctx: &mut ExecutionContext) -> Result<Vec<SourceFile>> {
        Err(RewriteError::recipe_error(
            "test.MisconfiguredGenerator",
            "missing 'template' option",
        ))
    }
}

#[tokio::test]
async fn test_recoverable_generate_failure_generates_nothing() {
    let recipes: Vec<Arc<dyn Recipe>> = vec![Arc::new(MisconfiguredGenerator)];
    let source = JsonParser.parse("a.json", "{}");

    let mut ctx = ExecutionContext::new();
    let run = RecipeScheduler::default()
        .run(&recipes, vec![source], &mut ctx)
        .await
        .unwrap();

    assert!(run.is_empty());
    assert_eq!(run.cycles, 1);
}
