//! Formatting-preserving primitives shared by every language tree
//!
//! Every node carries three things besides its kind-specific fields:
//!
//! - an **id** ([`TreeId`]) that is assigned once and never derived from content
//! - a **prefix** ([`Space`]) holding the whitespace and comments in front of it
//! - **markers** ([`Markers`]) carrying out-of-band metadata
//!
//! Children that are followed or preceded by significant whitespace (the
//! space before a comma, the space around `=`) are wrapped in
//! [`RightPadded`], [`LeftPadded`] or [`Container`]. Concatenating prefixes,
//! syntax, and padding in print order reproduces the source byte for byte.

mod markers;
mod padding;
mod space;

pub use markers::{Marker, MarkerKind, Markers};
pub use padding::{Container, LeftPadded, RightPadded};
pub use space::{Comment, Space};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Process-unique identity of a tree node or marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(Uuid);

impl TreeId {
    /// Allocate a fresh identity
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an identity received from elsewhere (e.g. over RPC)
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Common surface of every language's node enum
pub trait Tree: Clone + Send + Sync + 'static {
    fn id(&self) -> TreeId;

    fn prefix(&self) -> &Space;

    fn markers(&self) -> &Markers;

    fn with_prefix(&self, prefix: Space) -> Self;

    fn with_markers(&self, markers: Markers) -> Self;

    /// Name of the node kind, used in diagnostics
    fn kind_name(&self) -> &'static str;

    /// Reference identity: true only when both handles point at the same node
    fn is_same(&self, other: &Self) -> bool;
}

/// Shallow identity comparison
///
/// Child nodes compare by pointer, plain values compare by equality. Two
/// values are identical when a parent built from either would print and
/// serialize the same without looking below the first level of nodes.
pub trait Identical {
    fn identical(&self, other: &Self) -> bool;
}

macro_rules! identical_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identical for $ty {
                fn identical(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

identical_by_eq!(
    String,
    bool,
    usize,
    i64,
    u32,
    TreeId,
    Space,
    Comment,
    serde_json::Value
);

impl<T: ?Sized> Identical for Arc<T> {
    fn identical(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: Identical> Identical for Option<T> {
    fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.identical(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Identical> Identical for Vec<T> {
    fn identical(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.identical(b))
    }
}

/// Implement [`Identical`] for a node struct by comparing the listed fields
#[macro_export]
macro_rules! identical_fields {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::tree::Identical for $ty {
            fn identical(&self, other: &Self) -> bool {
                true $(&& $crate::tree::Identical::identical(&self.$field, &other.$field))*
            }
        }
    };
}

/// Declare a language's node enum, one `Arc`-held struct per kind
///
/// Every node struct must have `id`, `prefix` and `markers` fields and
/// implement [`Identical`]. Generates the [`Tree`] and [`Identical`] impls;
/// the kind name is the variant name.
#[macro_export]
macro_rules! tree_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident($node:ty)),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis enum $name {
            $($variant(::std::sync::Arc<$node>)),+
        }

        impl $crate::tree::Tree for $name {
            fn id(&self) -> $crate::tree::TreeId {
                match self {
                    $($name::$variant(node) => node.id),+
                }
            }

            fn prefix(&self) -> &$crate::tree::Space {
                match self {
                    $($name::$variant(node) => &node.prefix),+
                }
            }

            fn markers(&self) -> &$crate::tree::Markers {
                match self {
                    $($name::$variant(node) => &node.markers),+
                }
            }

            fn with_prefix(&self, prefix: $crate::tree::Space) -> Self {
                match self {
                    $($name::$variant(node) => {
                        $name::$variant($crate::visitor::produce(node, |draft| draft.prefix = prefix))
                    }),+
                }
            }

            fn with_markers(&self, markers: $crate::tree::Markers) -> Self {
                match self {
                    $($name::$variant(node) => {
                        $name::$variant($crate::visitor::produce(node, |draft| draft.markers = markers))
                    }),+
                }
            }

            fn kind_name(&self) -> &'static str {
                match self {
                    $($name::$variant(_) => stringify!($variant)),+
                }
            }

            fn is_same(&self, other: &Self) -> bool {
                match (self, other) {
                    $(($name::$variant(a), $name::$variant(b)) => ::std::sync::Arc::ptr_eq(a, b),)+
                    _ => false,
                }
            }
        }

        impl $crate::tree::Identical for $name {
            fn identical(&self, other: &Self) -> bool {
                $crate::tree::Tree::is_same(self, other)
            }
        }
    };
}
