//! Codecs: how each composite type is streamed field by field
//!
//! A codec sends its fields in a fixed order and receives them in the
//! same order. Field order matches print order for tree nodes, starting
//! with `id`, `prefix` and `markers`.
//!
//! Value types are stable strings (`"Json.Member"`, `"J.Ternary"`,
//! `"Space"`); a record naming one no codec knows is an
//! [`RpcError::UnknownValueType`](crate::error::RpcError::UnknownValueType).

mod java;
mod json;
mod source;
mod tree;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use rewrite_core::{Identical, Markers, Space, Tree, TreeId};

use crate::error::Result;
use crate::receive::ReceiveQueue;
use crate::send::SendQueue;

/// A composite value streamed as a sequence of field records
#[async_trait]
pub trait RpcCodec: Identical + Clone + Send + Sync + Sized + 'static {
    fn value_type(&self) -> &'static str;

    /// Send every field of `self` against the matching field of `before`
    ///
    /// `before` is `None` for an `ADD`, otherwise a value of the same value type.
    fn rpc_send(&self, before: Option<&Self>, q: &mut SendQueue<'_>) -> Result<()>;

    /// Read the fields [`RpcCodec::rpc_send`] wrote, applying them to `before`
    async fn rpc_receive(
        before: Option<&Self>,
        value_type: &str,
        q: &mut ReceiveQueue<'_>,
    ) -> Result<Self>;
}

/// A value shared by reference: sent in full once per session, then by ref number
pub trait RpcRef: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn value_type(&self) -> &'static str;
}

/// Send the `id`, `prefix` and `markers` every tree node starts with
pub(crate) fn send_header<T: Tree>(
    after: &T,
    before: Option<&T>,
    q: &mut SendQueue<'_>,
) -> Result<()> {
    q.send_value(Some(&after.id()), before.map(|b| b.id()).as_ref())?;
    q.send(Some(after.prefix()), before.map(|b| b.prefix()))?;
    q.send(Some(after.markers()), before.map(|b| b.markers()))
}

pub(crate) async fn receive_header<T: Tree>(
    before: Option<&T>,
    q: &mut ReceiveQueue<'_>,
) -> Result<(TreeId, Space, Markers)> {
    let id = q
        .receive_value_required(before.map(|b| b.id()).as_ref(), "id")
        .await?;
    let prefix = q
        .receive_required(before.map(|b| b.prefix()), "prefix")
        .await?;
    let markers = q
        .receive_required(before.map(|b| b.markers()), "markers")
        .await?;
    Ok((id, prefix, markers))
}

/// The `before` node when it is the same variant as the node being sent
macro_rules! same_kind {
    ($before:expr, $enum:ident :: $variant:ident) => {
        match $before {
            Some($enum::$variant(node)) => Some(node),
            _ => None,
        }
    };
}

pub(crate) use same_kind;

#[cfg(test)]
pub(crate) mod testing {
    //! Send-then-receive through an in-memory batch source

    use std::collections::VecDeque;

    use super::RpcCodec;
    use crate::data::RpcObjectData;
    use crate::receive::ReceiveQueue;
    use crate::refs::RpcSession;
    use crate::send::SendQueue;

    /// Records of one top-level transfer
    pub fn send<T: RpcCodec>(
        session: &mut RpcSession,
        after: Option<&T>,
        before: Option<&T>,
    ) -> Vec<RpcObjectData> {
        let mut q = SendQueue::new(1000, &mut session.sent);
        q.send_object(after, before).unwrap();
        q.finish().into_iter().flatten().collect()
    }

    pub async fn receive<T: RpcCodec>(
        session: &mut RpcSession,
        records: Vec<RpcObjectData>,
        before: Option<&T>,
    ) -> Option<T> {
        let mut batches: VecDeque<Vec<RpcObjectData>> = VecDeque::from([records]);
        let mut q = ReceiveQueue::new(&mut batches, &mut session.received);
        q.receive_object(before).await.unwrap()
    }
}
