//! Language-independent pieces of the visit-and-produce engine
//!
//! Every language visitor (see [`crate::json::JsonVisitor`] and
//! [`crate::java::JavaVisitor`]) is built from the same parts:
//!
//! - [`PreVisit`]: the result of the hook that runs before kind dispatch,
//!   which can stop descent into the current subtree
//! - [`produce`]: derive a new node from a draft, handing back the original
//!   `Arc` when nothing changed
//! - [`ListDraft`]: collect visited list elements, allocating a new list
//!   only when an element changed or was removed
//!
//! Together these make "nothing changed" propagate to the root as pointer
//! equality between the tree passed in and the tree returned.

use std::sync::Arc;

use crate::error::RewriteError;
use crate::result::Result;
use crate::tree::Identical;

/// Outcome of a visitor's `pre_visit` hook
#[derive(Debug, Clone)]
pub enum PreVisit<T> {
    /// Dispatch to the kind handler with this (possibly replaced) node
    Descend(T),
    /// Skip the kind handler and children; this is the visit result
    Stop(Option<T>),
}

/// Apply `mutate` to a draft copy of `before`
///
/// Returns `before` itself when the draft is [`Identical`] to it, so callers
/// can detect change with `Arc::ptr_eq`.
pub fn produce<N>(before: &Arc<N>, mutate: impl FnOnce(&mut N)) -> Arc<N>
where
    N: Clone + Identical,
{
    let mut draft = N::clone(before);
    mutate(&mut draft);
    if draft.identical(before) {
        Arc::clone(before)
    } else {
        Arc::new(draft)
    }
}

/// Accumulates the visited elements of a list
pub struct ListDraft<'a, T> {
    before: &'a [T],
    after: Vec<T>,
    changed: bool,
}

impl<'a, T: Identical> ListDraft<'a, T> {
    pub fn new(before: &'a [T]) -> Self {
        Self {
            before,
            after: Vec::with_capacity(before.len()),
            changed: false,
        }
    }

    /// Record the visit result for `before[index]`; `None` removes the element
    pub fn push(&mut self, index: usize, visited: Option<T>) {
        match visited {
            Some(element) => {
                if !self
                    .before
                    .get(index)
                    .is_some_and(|original| original.identical(&element))
                {
                    self.changed = true;
                }
                self.after.push(element);
            }
            None => self.changed = true,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// The new list, or `None` if the original can be kept as is
    pub fn finish(self) -> Option<Vec<T>> {
        self.changed.then_some(self.after)
    }
}

/// Unwrap the visit result for a slot that cannot be empty
pub fn required<T>(kind: &'static str, field: &'static str, visited: Option<T>) -> Result<T> {
    visited.ok_or(RewriteError::RequiredChildRemoved { kind, field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identical_fields;

    #[derive(Debug, Clone)]
    struct Pair {
        left: Arc<u32>,
        right: Arc<u32>,
    }

    identical_fields!(Pair { left, right });

    #[test]
    fn test_produce_unchanged_returns_same_arc() {
        let pair = Arc::new(Pair {
            left: Arc::new(1),
            right: Arc::new(2),
        });
        let left = pair.left.clone();
        let after = produce(&pair, |draft| draft.left = left);
        assert!(Arc::ptr_eq(&pair, &after));
    }

    #[test]
    fn test_produce_changed_returns_new_arc_sharing_children() {
        let pair = Arc::new(Pair {
            left: Arc::new(1),
            right: Arc::new(2),
        });
        let after = produce(&pair, |draft| draft.left = Arc::new(1));
        assert!(!Arc::ptr_eq(&pair, &after));
        assert!(Arc::ptr_eq(&pair.right, &after.right));
    }

    #[test]
    fn test_list_draft_unchanged() {
        let items = vec![Arc::new(1u32), Arc::new(2u32)];
        let mut draft = ListDraft::new(&items);
        for (i, item) in items.iter().enumerate() {
            draft.push(i, Some(item.clone()));
        }
        assert!(!draft.is_changed());
        assert!(draft.finish().is_none());
    }

    #[test]
    fn test_list_draft_removal() {
        let items = vec![Arc::new(1u32), Arc::new(2u32), Arc::new(3u32)];
        let mut draft = ListDraft::new(&items);
        draft.push(0, None);
        draft.push(1, Some(items[1].clone()));
        draft.push(2, Some(items[2].clone()));
        let after = draft.finish().unwrap();
        assert_eq!(after.len(), 2);
        assert!(Arc::ptr_eq(&after[0], &items[1]));
    }

    #[test]
    fn test_list_draft_replacement() {
        let items = vec![Arc::new(1u32)];
        let mut draft = ListDraft::new(&items);
        draft.push(0, Some(Arc::new(1u32)));
        assert!(draft.finish().is_some());
    }

    #[test]
    fn test_required() {
        assert_eq!(required("Member", "value", Some(3)).unwrap(), 3);
        let err = required::<u32>("Member", "value", None).unwrap_err();
        assert!(matches!(
            err,
            RewriteError::RequiredChildRemoved {
                kind: "Member",
                field: "value"
            }
        ));
    }
}
