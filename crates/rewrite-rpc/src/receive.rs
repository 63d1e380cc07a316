//! Receiver half of the differential sync protocol
//!
//! Mirrors [`crate::send::SendQueue`]: each `receive_*` call consumes exactly
//! the records the matching `send_*` call produced. `CHANGE` applies the
//! field diff on top of `before`, so unchanged children come back as the
//! receiver's own existing references.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::{RpcCodec, RpcRef};
use crate::data::{RpcObjectData, State};
use crate::error::{Result, RpcError};
use crate::refs::ReceivedRefs;

/// Where the receive queue pulls its next batch of records from
#[async_trait]
pub trait BatchSource: Send {
    async fn next_batch(&mut self) -> Result<Vec<RpcObjectData>>;
}

/// Pre-fetched batches, for in-process use
#[async_trait]
impl BatchSource for VecDeque<Vec<RpcObjectData>> {
    async fn next_batch(&mut self) -> Result<Vec<RpcObjectData>> {
        self.pop_front()
            .ok_or_else(|| RpcError::desync("another batch of records", "end of stream"))
    }
}

pub struct ReceiveQueue<'a> {
    buffer: VecDeque<RpcObjectData>,
    source: &'a mut dyn BatchSource,
    refs: &'a mut ReceivedRefs,
    trace: bool,
}

/// Unwrap a received field that cannot be absent
pub fn required<T>(field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| RpcError::missing(format!("required field '{field}'")))
}

impl<'a> ReceiveQueue<'a> {
    pub fn new(source: &'a mut dyn BatchSource, refs: &'a mut ReceivedRefs) -> Self {
        Self {
            buffer: VecDeque::new(),
            source,
            refs,
            trace: false,
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Next record, pulling a batch when the buffer is empty
    pub async fn take(&mut self) -> Result<RpcObjectData> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                if self.trace {
                    tracing::trace!(?record, "receive");
                }
                return Ok(record);
            }
            let batch = self.source.next_batch().await?;
            if batch.is_empty() {
                return Err(RpcError::desync("a batch of records", "an empty batch"));
            }
            tracing::trace!(records = batch.len(), "received batch");
            self.buffer.extend(batch);
        }
    }

    pub async fn receive_value<T>(&mut self, before: Option<&T>) -> Result<Option<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync,
    {
        let record = self.take().await?;
        match record.state {
            State::NoChange => Ok(before.cloned()),
            State::Delete => Ok(None),
            State::Add | State::Change => {
                let value = record.value.unwrap_or(Value::Null);
                Ok(Some(serde_json::from_value(value)?))
            }
            State::EndOfObject => Err(RpcError::unexpected_state("a value", record.state)),
        }
    }

    pub async fn receive_value_required<T>(&mut self, before: Option<&T>, field: &str) -> Result<T>
    where
        T: DeserializeOwned + Clone + Send + Sync,
    {
        required(field, self.receive_value(before).await?)
    }

    pub async fn receive<T: RpcCodec>(&mut self, before: Option<&T>) -> Result<Option<T>> {
        let record = self.take().await?;
        match record.state {
            State::NoChange => Ok(before.cloned()),
            State::Delete => Ok(None),
            State::Add => {
                let value_type = record
                    .value_type
                    .ok_or_else(|| RpcError::missing("valueType on ADD"))?;
                T::rpc_receive(None, &value_type, self).await.map(Some)
            }
            State::Change => {
                let before = before.ok_or_else(|| {
                    RpcError::unexpected_state("ADD for a value the receiver lacks", State::Change)
                })?;
                let value_type = record
                    .value_type
                    .unwrap_or_else(|| before.value_type().to_string());
                T::rpc_receive(Some(before), &value_type, self)
                    .await
                    .map(Some)
            }
            State::EndOfObject => Err(RpcError::unexpected_state("a field", record.state)),
        }
    }

    pub async fn receive_required<T: RpcCodec>(
        &mut self,
        before: Option<&T>,
        field: &str,
    ) -> Result<T> {
        required(field, self.receive(before).await?)
    }

    pub async fn receive_list<T: RpcCodec>(
        &mut self,
        before: Option<&[T]>,
    ) -> Result<Option<Vec<T>>> {
        let (positions, before) = match self.receive_list_header(before).await? {
            ListHeader::Unchanged => return Ok(before.map(<[T]>::to_vec)),
            ListHeader::Deleted => return Ok(None),
            ListHeader::Elements(positions, before) => (positions, before),
        };
        let mut after = Vec::with_capacity(positions.len());
        for position in positions {
            let matched = matched(before, position)?;
            after.push(required("list element", self.receive(matched).await?)?);
        }
        Ok(Some(after))
    }

    pub async fn receive_ref_list<T: RpcRef>(
        &mut self,
        before: Option<&[Arc<T>]>,
    ) -> Result<Option<Vec<Arc<T>>>> {
        let (positions, before) = match self.receive_list_header(before).await? {
            ListHeader::Unchanged => return Ok(before.map(<[Arc<T>]>::to_vec)),
            ListHeader::Deleted => return Ok(None),
            ListHeader::Elements(positions, before) => (positions, before),
        };
        let mut after = Vec::with_capacity(positions.len());
        for position in positions {
            let matched = matched(before, position)?;
            after.push(required("list element", self.receive_ref(matched).await?)?);
        }
        Ok(Some(after))
    }

    async fn receive_list_header<'b, T: Sync>(
        &mut self,
        before: Option<&'b [T]>,
    ) -> Result<ListHeader<'b, T>> {
        let record = self.take().await?;
        let before = match record.state {
            State::NoChange => return Ok(ListHeader::Unchanged),
            State::Delete => return Ok(ListHeader::Deleted),
            State::Add => &[][..],
            State::Change => before.ok_or_else(|| {
                RpcError::unexpected_state("ADD for a list the receiver lacks", State::Change)
            })?,
            State::EndOfObject => {
                return Err(RpcError::unexpected_state("a list", record.state));
            }
        };

        let record = self.take().await?;
        if record.state != State::Change {
            return Err(RpcError::unexpected_state("list positions", record.state));
        }
        let value = record
            .value
            .ok_or_else(|| RpcError::missing("list positions"))?;
        let positions: Vec<i64> = serde_json::from_value(value)?;
        Ok(ListHeader::Elements(positions, before))
    }

    pub async fn receive_ref<T: RpcRef>(
        &mut self,
        before: Option<&Arc<T>>,
    ) -> Result<Option<Arc<T>>> {
        let record = self.take().await?;
        match record.state {
            State::NoChange => Ok(before.cloned()),
            State::Delete => Ok(None),
            State::Add => match (record.value, record.reference) {
                (Some(value), reference) => {
                    let received = Arc::new(serde_json::from_value::<T>(value)?);
                    if let Some(reference) = reference {
                        self.refs.insert(reference, Arc::clone(&received));
                    }
                    Ok(Some(received))
                }
                (None, Some(reference)) => self.refs.get(reference).map(Some),
                (None, None) => Err(RpcError::missing("value or ref on ADD")),
            },
            State::Change | State::EndOfObject => {
                Err(RpcError::unexpected_state("a shared value", record.state))
            }
        }
    }

    pub async fn expect_end_of_object(&mut self) -> Result<()> {
        let record = self.take().await?;
        if record.state == State::EndOfObject {
            Ok(())
        } else {
            Err(RpcError::unexpected_state("END_OF_OBJECT", record.state))
        }
    }

    /// One top-level object and its closing `END_OF_OBJECT`
    pub async fn receive_object<T: RpcCodec>(&mut self, before: Option<&T>) -> Result<Option<T>> {
        let after = self.receive(before).await?;
        self.expect_end_of_object().await?;
        Ok(after)
    }
}

enum ListHeader<'b, T> {
    Unchanged,
    Deleted,
    /// Index into `before` per element, `-1` for new elements
    Elements(Vec<i64>, &'b [T]),
}

fn matched<T>(before: &[T], position: i64) -> Result<Option<&T>> {
    if position < 0 {
        return Ok(None);
    }
    before
        .get(position as usize)
        .map(Some)
        .ok_or_else(|| {
            RpcError::desync(
                format!("a position below {}", before.len()),
                format!("position {position}"),
            )
        })
}
