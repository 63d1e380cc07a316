//! Configuration
//!
//! Looked up by walking upward from the working directory, first match wins:
//!
//! - `.rewriterc.json` / `.rewriterc` (JSON)
//! - `rewrite.toml`
//! - `rewrite.yaml` / `rewrite.yml`
//! - `rewrite.json`
//!
//! ```yaml
//! rpc:
//!   batchSize: 1000
//!   traceMessages: false
//! scheduler:
//!   maxCycles: 3
//!   concurrency: 8
//! ```

mod loader;
mod rewrite_config;

pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
pub use rewrite_config::{RewriteConfig, RpcConfig, SchedulerConfig};
