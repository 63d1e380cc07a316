//! Persistent ancestor path for the node currently being visited
//!
//! A [`Cursor`] is an immutable singly-linked list from the current value
//! back to the root. Pushing allocates one link and shares the rest, so a
//! visitor can hold on to a cursor while descending without another
//! traversal (or another visitor) disturbing it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

type CursorValue = Arc<dyn Any + Send + Sync>;

struct Link {
    value: CursorValue,
    parent: Cursor,
}

/// Path from the current value to the root
#[derive(Clone, Default)]
pub struct Cursor {
    head: Option<Arc<Link>>,
}

impl Cursor {
    /// The empty path above every tree root
    pub fn root() -> Self {
        Self { head: None }
    }

    /// Extend the path with a tree node or any auxiliary context value
    pub fn push<T: Any + Send + Sync>(&self, value: T) -> Cursor {
        Cursor {
            head: Some(Arc::new(Link {
                value: Arc::new(value),
                parent: self.clone(),
            })),
        }
    }

    pub fn is_root(&self) -> bool {
        self.head.is_none()
    }

    /// Cursor one level up, or `None` at the root
    pub fn parent(&self) -> Option<&Cursor> {
        self.head.as_ref().map(|link| &link.parent)
    }

    /// The current value if it has type `T`
    pub fn value<T: Any>(&self) -> Option<&T> {
        self.head.as_ref().and_then(|link| link.value.downcast_ref())
    }

    /// Number of values on the path
    pub fn depth(&self) -> usize {
        self.links().count()
    }

    /// Values from the current one up to the root
    pub fn path(&self) -> impl Iterator<Item = &(dyn Any + Send + Sync)> {
        self.links().map(|link| link.value.as_ref())
    }

    /// Values of type `T` from the current one up to the root
    pub fn path_of<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.path().filter_map(|value| value.downcast_ref::<T>())
    }

    /// Nearest value of type `T`, starting with the current one
    pub fn first_enclosing<T: Any>(&self) -> Option<&T> {
        self.path_of::<T>().next()
    }

    /// Nearest value of type `T` satisfying `predicate`, starting with the current one
    pub fn first_enclosing_where<T: Any>(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.path_of::<T>().find(|value| predicate(value))
    }

    /// Nearest strict ancestor of type `T`
    pub fn parent_of<T: Any>(&self) -> Option<&T> {
        self.parent().and_then(|parent| parent.first_enclosing::<T>())
    }

    /// Values from the root down to the current one
    pub fn as_vec(&self) -> Vec<CursorValue> {
        let mut values: Vec<CursorValue> = self.links().map(|link| link.value.clone()).collect();
        values.reverse();
        values
    }

    fn links(&self) -> Links<'_> {
        Links {
            next: self.head.as_deref(),
        }
    }
}

struct Links<'a> {
    next: Option<&'a Link>,
}

impl<'a> Iterator for Links<'a> {
    type Item = &'a Link;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.next?;
        self.next = link.parent.head.as_deref();
        Some(link)
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Frame(&'static str);

    #[test]
    fn test_root() {
        let root = Cursor::root();
        assert!(root.is_root());
        assert!(root.parent().is_none());
        assert_eq!(root.depth(), 0);
        assert!(root.value::<Frame>().is_none());
    }

    #[test]
    fn test_push_does_not_disturb_parent() {
        let root = Cursor::root();
        let a = root.push(Frame("a"));
        let b = a.push(Frame("b"));
        let c = a.push(Frame("c"));

        assert_eq!(a.depth(), 1);
        assert_eq!(b.value::<Frame>(), Some(&Frame("b")));
        assert_eq!(c.value::<Frame>(), Some(&Frame("c")));
        assert_eq!(b.parent().unwrap().value::<Frame>(), Some(&Frame("a")));
        assert!(b.parent().unwrap().parent().unwrap().is_root());
    }

    #[test]
    fn test_first_enclosing_skips_other_types() {
        let cursor = Cursor::root()
            .push(Frame("outer"))
            .push(42u32)
            .push(Frame("inner"))
            .push("leaf");

        assert_eq!(cursor.first_enclosing::<Frame>(), Some(&Frame("inner")));
        assert_eq!(cursor.first_enclosing::<u32>(), Some(&42));
        assert_eq!(
            cursor.first_enclosing_where::<Frame>(|f| f.0 == "outer"),
            Some(&Frame("outer"))
        );
        assert!(cursor.first_enclosing::<i64>().is_none());
    }

    #[test]
    fn test_parent_of_excludes_current() {
        let cursor = Cursor::root().push(Frame("outer")).push(Frame("inner"));
        assert_eq!(cursor.parent_of::<Frame>(), Some(&Frame("outer")));
    }

    #[test]
    fn test_as_vec_is_root_to_leaf() {
        let cursor = Cursor::root().push(Frame("a")).push(Frame("b"));
        let names: Vec<&str> = cursor
            .as_vec()
            .iter()
            .filter_map(|v| v.downcast_ref::<Frame>())
            .map(|f| f.0)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let leaf_first: Vec<&str> = cursor.path_of::<Frame>().map(|f| f.0).collect();
        assert_eq!(leaf_first, vec!["b", "a"]);
    }
}
