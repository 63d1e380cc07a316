//! Rewrite Core
//!
//! Lossless semantic trees for automated source refactoring. Trees keep
//! every byte of whitespace and every comment, so printing an unmodified
//! tree reproduces its input exactly, and a visitor that changes one node
//! rebuilds only the path from that node to the root.
//!
//! Languages:
//!
//! - [`json`]: parser, printer, visitor and recipes for JSON with comments
//! - [`java`]: the expression tree shared by Java and JavaScript front-ends
//!
//! Recipes are run over many source files by the [`recipe::RecipeScheduler`].

pub mod config;
pub mod cursor;
pub mod error;
pub mod java;
pub mod json;
pub mod printer;
pub mod recipe;
pub mod result;
pub mod round_trip;
pub mod source;
pub mod tree;
pub mod visitor;

// Re-export commonly used types
pub use config::{ConfigLoader, RewriteConfig, RpcConfig, SchedulerConfig};
pub use cursor::Cursor;
pub use error::{ErrorKind, RewriteError};
pub use printer::{DefaultMarkerPrinter, MarkerPrinter, PrintOutput, SearchResultPrinter};
pub use recipe::{
    ExecutionContext, Recipe, RecipeFailure, RecipeRegistry, RecipeRun, RecipeScheduler,
    SourceResult,
};
pub use result::{Result, ResultExt};
pub use round_trip::{RoundTripResult, RoundTripValidator};
pub use source::{JavaEditor, JsonEditor, ParseError, SourceFile, SourceVisitor};
pub use tree::{
    Comment, Container, Identical, LeftPadded, Marker, MarkerKind, Markers, RightPadded, Space,
    Tree, TreeId,
};
pub use visitor::{ListDraft, PreVisit, produce, required};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rewrite_core=info,rewrite_rpc=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
