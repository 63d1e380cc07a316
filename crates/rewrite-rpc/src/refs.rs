//! Per-session reference tables
//!
//! Shared values (markers, attributed types) are sent in full the first
//! time and by ref number afterwards. The sender keys its table by pointer
//! identity and holds a strong reference to every entry so an address is
//! never reused while the session lives. Both tables are dropped or
//! [`RpcSession::reset`] when the connection ends.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, RpcError};

type Shared = Arc<dyn Any + Send + Sync>;

fn address<T>(value: &Arc<T>) -> usize {
    Arc::as_ptr(value) as *const () as usize
}

/// Refs this side has already sent
#[derive(Default)]
pub struct RefTable {
    ids: HashMap<usize, u32>,
    held: Vec<Shared>,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: Send + Sync + 'static>(&self, value: &Arc<T>) -> Option<u32> {
        self.ids.get(&address(value)).copied()
    }

    /// Assign the next ref number; refs start at 1
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: &Arc<T>) -> u32 {
        if let Some(existing) = self.get(value) {
            return existing;
        }
        let reference = self.held.len() as u32 + 1;
        self.ids.insert(address(value), reference);
        self.held.push(Arc::clone(value) as Shared);
        reference
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.held.clear();
    }
}

/// Refs this side has received, by number
#[derive(Default)]
pub struct ReceivedRefs {
    refs: HashMap<u32, Shared>,
}

impl ReceivedRefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, reference: u32, value: Arc<T>) {
        self.refs.insert(reference, value as Shared);
    }

    pub fn get<T: Send + Sync + 'static>(&self, reference: u32) -> Result<Arc<T>> {
        let shared = self
            .refs
            .get(&reference)
            .ok_or(RpcError::UnknownRef { reference })?;
        Arc::clone(shared).downcast::<T>().map_err(|_| {
            RpcError::desync(
                format!("ref {reference} of type {}", std::any::type_name::<T>()),
                "a ref of another type",
            )
        })
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn clear(&mut self) {
        self.refs.clear();
    }
}

/// Both directions' tables for one connection
#[derive(Default)]
pub struct RpcSession {
    pub sent: RefTable,
    pub received: ReceivedRefs,
}

impl RpcSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every ref in both directions
    pub fn reset(&mut self) {
        tracing::debug!(
            sent = self.sent.len(),
            received = self.received.len(),
            "resetting RPC session refs"
        );
        self.sent.clear();
        self.received.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewrite_core::Marker;

    #[test]
    fn test_ref_numbers_are_sequential_and_stable() {
        let mut table = RefTable::new();
        let a = Arc::new(Marker::optional());
        let b = Arc::new(Marker::optional());

        assert_eq!(table.get(&a), None);
        assert_eq!(table.insert(&a), 1);
        assert_eq!(table.insert(&b), 2);
        assert_eq!(table.insert(&a.clone()), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_equal_values_are_distinct_refs() {
        let mut table = RefTable::new();
        let a = Arc::new(Marker::semicolon());
        let copy = Arc::new((*a).clone());
        table.insert(&a);
        assert_eq!(table.get(&copy), None);
    }

    #[test]
    fn test_received_lookup() {
        let mut refs = ReceivedRefs::new();
        let marker = Arc::new(Marker::optional());
        refs.insert(7, marker.clone());

        let found: Arc<Marker> = refs.get(7).unwrap();
        assert!(Arc::ptr_eq(&found, &marker));
        assert!(matches!(
            refs.get::<Marker>(8),
            Err(RpcError::UnknownRef { reference: 8 })
        ));
        assert!(matches!(
            refs.get::<String>(7),
            Err(RpcError::ProtocolDesync { .. })
        ));
    }

    #[test]
    fn test_reset_clears_both_directions() {
        let mut session = RpcSession::new();
        let marker = Arc::new(Marker::optional());
        session.sent.insert(&marker);
        session.received.insert(1, marker);
        session.reset();
        assert!(session.sent.is_empty());
        assert!(session.received.is_empty());
    }
}
