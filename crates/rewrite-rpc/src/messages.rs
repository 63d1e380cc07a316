//! Request and response bodies of the rewrite RPC methods

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod methods {
    pub const GET_OBJECT: &str = "GetObject";
    pub const VISIT: &str = "Visit";
    pub const GENERATE: &str = "Generate";
    pub const PREPARE_RECIPE: &str = "PrepareRecipe";
    pub const PRINT: &str = "Print";
}

/// Pull the next batch of records for an object the peer holds
///
/// Answered with a `Vec<RpcObjectData>`; the requester keeps asking until
/// it has read the closing `END_OF_OBJECT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetObject {
    pub id: String,
    pub source_file_type: String,
    /// Numbers each transfer the requester starts; every request of one
    /// transfer repeats it, and a higher number starts a new transfer
    pub transfer: u64,
    /// Set on the first request of a transfer when earlier transfers never
    /// completed. Both sides drop their ref tables and the named objects'
    /// last synced state before this transfer starts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abandoned: Vec<String>,
}

/// Run a prepared recipe's editor over a tree the requester holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    /// Id returned by `PrepareRecipe`
    pub visitor: String,
    pub tree_id: String,
    pub source_file_type: String,
    /// Execution context to reuse across visits; a fresh one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitResponse {
    pub modified: bool,
    /// The recipe deleted the file
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
}

/// Ids of generated files, each fetchable with `GetObject`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub ids: Vec<String>,
    pub source_file_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRecipe {
    /// Registered recipe name
    pub id: String,
    #[serde(default)]
    pub options: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRecipeResponse {
    /// Handle for `Visit` and `Generate`
    pub id: String,
    pub display_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Print {
    pub tree_id: String,
    pub source_file_type: String,
}
