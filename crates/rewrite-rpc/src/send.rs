//! Sender half of the differential sync protocol
//!
//! Every value is compared with the `before` the receiver is known to hold:
//!
//! | before | after | record |
//! |--------|-------|--------|
//! | same as after | | `NO_CHANGE` |
//! | none | some | `ADD`, then the value's fields against nothing |
//! | some | none | `DELETE` |
//! | some | some | `CHANGE`, then the value's fields against `before` |
//!
//! A composite whose value type differs from `before` is sent as `ADD`.
//! Lists are matched by an identity key, never by position.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::codec::{RpcCodec, RpcRef};
use crate::data::{RpcObjectData, State};
use crate::error::Result;
use crate::refs::RefTable;

pub struct SendQueue<'a> {
    batch_size: usize,
    batch: Vec<RpcObjectData>,
    batches: Vec<Vec<RpcObjectData>>,
    refs: &'a mut RefTable,
    trace: bool,
}

impl<'a> SendQueue<'a> {
    pub fn new(batch_size: usize, refs: &'a mut RefTable) -> Self {
        Self {
            batch_size: batch_size.max(1),
            batch: Vec::new(),
            batches: Vec::new(),
            refs,
            trace: false,
        }
    }

    /// Log every record at trace level
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn put(&mut self, record: RpcObjectData) {
        if self.trace {
            tracing::trace!(?record, "send");
        }
        self.batch.push(record);
        if self.batch.len() >= self.batch_size {
            self.batches.push(std::mem::take(&mut self.batch));
        }
    }

    /// Plain value compared by equality, sent inline
    pub fn send_value<T>(&mut self, after: Option<&T>, before: Option<&T>) -> Result<()>
    where
        T: Serialize + PartialEq,
    {
        match (after, before) {
            (None, None) => self.put(RpcObjectData::no_change()),
            (Some(after), Some(before)) if after == before => {
                self.put(RpcObjectData::no_change())
            }
            (None, Some(_)) => self.put(RpcObjectData::delete()),
            (Some(after), before) => {
                let state = if before.is_some() {
                    State::Change
                } else {
                    State::Add
                };
                self.put(RpcObjectData::new(state).with_value(serde_json::to_value(after)?));
            }
        }
        Ok(())
    }

    /// Composite value, sent field by field through its codec
    pub fn send<T: RpcCodec>(&mut self, after: Option<&T>, before: Option<&T>) -> Result<()> {
        match (after, before) {
            (None, None) => self.put(RpcObjectData::no_change()),
            (Some(after), Some(before)) if after.identical(before) => {
                self.put(RpcObjectData::no_change())
            }
            (None, Some(_)) => self.put(RpcObjectData::delete()),
            (Some(after), Some(before)) if after.value_type() == before.value_type() => {
                self.put(RpcObjectData::new(State::Change).with_value_type(after.value_type()));
                after.rpc_send(Some(before), self)?;
            }
            (Some(after), _) => {
                self.put(RpcObjectData::new(State::Add).with_value_type(after.value_type()));
                after.rpc_send(None, self)?;
            }
        }
        Ok(())
    }

    pub fn get_and_send<P, T: RpcCodec>(
        &mut self,
        after: &P,
        before: Option<&P>,
        get: impl Fn(&P) -> &T,
    ) -> Result<()> {
        self.send(Some(get(after)), before.map(get))
    }

    pub fn get_and_send_value<P, T>(
        &mut self,
        after: &P,
        before: Option<&P>,
        get: impl Fn(&P) -> &T,
    ) -> Result<()>
    where
        T: Serialize + PartialEq,
    {
        self.send_value(Some(get(after)), before.map(get))
    }

    /// List reconciled by `id`
    ///
    /// After the list's own record comes a positions record: for each
    /// `after` element, the index of its match in `before` or `-1`. Each
    /// element is then sent against its match.
    pub fn send_list<T, K>(
        &mut self,
        after: Option<&[T]>,
        before: Option<&[T]>,
        id: impl Fn(&T) -> K,
    ) -> Result<()>
    where
        T: RpcCodec,
        K: Hash + Eq,
    {
        let Some(matches) = self.send_list_header(after, before, &id, T::identical)? else {
            return Ok(());
        };
        for (element, matched) in matches {
            self.send(Some(element), matched)?;
        }
        Ok(())
    }

    /// List of shared values, matched by pointer identity
    pub fn send_ref_list<T: RpcRef>(
        &mut self,
        after: Option<&[Arc<T>]>,
        before: Option<&[Arc<T>]>,
    ) -> Result<()> {
        let id = |value: &Arc<T>| Arc::as_ptr(value) as *const () as usize;
        let Some(matches) = self.send_list_header(after, before, &id, Arc::ptr_eq)? else {
            return Ok(());
        };
        for (element, matched) in matches {
            self.send_ref(Some(element), matched)?;
        }
        Ok(())
    }

    /// List record and positions; `None` when no element records follow
    #[allow(clippy::type_complexity)]
    fn send_list_header<'v, T, K>(
        &mut self,
        after: Option<&'v [T]>,
        before: Option<&'v [T]>,
        id: &impl Fn(&T) -> K,
        unchanged: impl Fn(&T, &T) -> bool,
    ) -> Result<Option<Vec<(&'v T, Option<&'v T>)>>>
    where
        K: Hash + Eq,
    {
        let after = match (after, before) {
            (None, None) => {
                self.put(RpcObjectData::no_change());
                return Ok(None);
            }
            (None, Some(_)) => {
                self.put(RpcObjectData::delete());
                return Ok(None);
            }
            (Some(after), Some(before))
                if after.len() == before.len()
                    && after.iter().zip(before).all(|(a, b)| unchanged(a, b)) =>
            {
                self.put(RpcObjectData::no_change());
                return Ok(None);
            }
            (Some(after), Some(_)) => {
                self.put(RpcObjectData::new(State::Change));
                after
            }
            (Some(after), None) => {
                self.put(RpcObjectData::new(State::Add).with_value_type("List"));
                after
            }
        };

        let before = before.unwrap_or_default();
        let mut index: HashMap<K, usize> = HashMap::with_capacity(before.len());
        for (i, element) in before.iter().enumerate() {
            index.entry(id(element)).or_insert(i);
        }

        let mut positions = Vec::with_capacity(after.len());
        let mut matches = Vec::with_capacity(after.len());
        for element in after {
            match index.get(&id(element)) {
                Some(&i) => {
                    positions.push(i as i64);
                    matches.push((element, Some(&before[i])));
                }
                None => {
                    positions.push(-1);
                    matches.push((element, None));
                }
            }
        }
        self.put(RpcObjectData::new(State::Change).with_value(Value::from(positions)));
        Ok(Some(matches))
    }

    /// Shared value: full payload the first time, ref number afterwards
    pub fn send_ref<T: RpcRef>(
        &mut self,
        after: Option<&Arc<T>>,
        before: Option<&Arc<T>>,
    ) -> Result<()> {
        match (after, before) {
            (None, None) => self.put(RpcObjectData::no_change()),
            (Some(after), Some(before)) if Arc::ptr_eq(after, before) => {
                self.put(RpcObjectData::no_change())
            }
            (None, Some(_)) => self.put(RpcObjectData::delete()),
            (Some(after), _) => match self.refs.get(after) {
                Some(reference) => self.put(RpcObjectData::new(State::Add).with_ref(reference)),
                None => {
                    let reference = self.refs.insert(after);
                    let record = RpcObjectData::new(State::Add)
                        .with_value_type(after.value_type())
                        .with_value(serde_json::to_value(after.as_ref())?)
                        .with_ref(reference);
                    self.put(record);
                }
            },
        }
        Ok(())
    }

    /// One top-level object followed by `END_OF_OBJECT`
    pub fn send_object<T: RpcCodec>(&mut self, after: Option<&T>, before: Option<&T>) -> Result<()> {
        self.send(after, before)?;
        self.put(RpcObjectData::end_of_object());
        Ok(())
    }

    /// Close the current batch even if it is not full
    pub fn flush(&mut self) {
        if !self.batch.is_empty() {
            self.batches.push(std::mem::take(&mut self.batch));
        }
    }

    /// Everything put so far, in batches of at most `batch_size`
    pub fn finish(mut self) -> Vec<Vec<RpcObjectData>> {
        self.flush();
        self.batches
    }
}
