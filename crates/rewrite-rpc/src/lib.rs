//! Rewrite RPC
//!
//! Keeps rewrite-core trees in sync between two processes by sending only
//! what changed. A transfer is a stream of [`RpcObjectData`] records, one
//! per field, each saying whether the field is unchanged, added, deleted or
//! changed relative to the state the receiver already holds.
//!
//! - [`SendQueue`] / [`ReceiveQueue`]: the two halves of a transfer
//! - [`RpcCodec`]: the field order of every composite type
//! - [`RewriteRpc`]: a JSON-RPC 2.0 peer that visits, prints and generates
//!   trees on the other side of a connection

pub mod codec;
pub mod data;
pub mod error;
pub mod jsonrpc;
pub mod messages;
pub mod peer;
pub mod receive;
pub mod refs;
pub mod send;

pub use codec::{RpcCodec, RpcRef};
pub use data::{RpcObjectData, State};
pub use error::{Result, RpcError};
pub use peer::RewriteRpc;
pub use receive::{BatchSource, ReceiveQueue};
pub use refs::{ReceivedRefs, RefTable, RpcSession};
pub use send::SendQueue;
