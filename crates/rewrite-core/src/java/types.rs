//! Resolved type attribution
//!
//! Types are recorded opportunistically by whatever front-end built the
//! tree. They are shared by reference: every identifier resolving to
//! `java.lang.String` can point at the same `Arc<JavaType>`, which is what
//! lets the RPC layer send each type once per session.

use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Int,
    Long,
    Double,
    String,
    Null,
    /// JavaScript `undefined`
    None,
}

impl PrimitiveKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Double => "double",
            PrimitiveKind::String => "String",
            PrimitiveKind::Null => "null",
            PrimitiveKind::None => "undefined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum JavaType {
    Primitive { keyword: PrimitiveKind },
    Class { fully_qualified_name: String },
    Unknown,
}

static UNKNOWN: LazyLock<Arc<JavaType>> = LazyLock::new(|| Arc::new(JavaType::Unknown));

impl JavaType {
    /// The shared `Unknown` instance
    pub fn unknown() -> Arc<JavaType> {
        Arc::clone(&UNKNOWN)
    }

    pub fn primitive(keyword: PrimitiveKind) -> Arc<JavaType> {
        Arc::new(JavaType::Primitive { keyword })
    }

    pub fn class(fully_qualified_name: impl Into<String>) -> Arc<JavaType> {
        Arc::new(JavaType::Class {
            fully_qualified_name: fully_qualified_name.into(),
        })
    }

    /// Simple class name, keyword for primitives
    pub fn name(&self) -> &str {
        match self {
            JavaType::Primitive { keyword } => keyword.keyword(),
            JavaType::Class {
                fully_qualified_name,
            } => fully_qualified_name
                .rsplit('.')
                .next()
                .unwrap_or(fully_qualified_name),
            JavaType::Unknown => "<unknown>",
        }
    }

    pub fn is_assignable_from(&self, other: &JavaType) -> bool {
        match (self, other) {
            (JavaType::Unknown, _) | (_, JavaType::Unknown) => false,
            (
                JavaType::Class {
                    fully_qualified_name,
                },
                _,
            ) if fully_qualified_name == "java.lang.Object" => true,
            _ => self == other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_shared() {
        assert!(Arc::ptr_eq(&JavaType::unknown(), &JavaType::unknown()));
    }

    #[test]
    fn test_names() {
        assert_eq!(JavaType::class("java.lang.String").name(), "String");
        assert_eq!(JavaType::class("Foo").name(), "Foo");
        assert_eq!(JavaType::primitive(PrimitiveKind::Int).name(), "int");
    }

    #[test]
    fn test_assignability() {
        let object = JavaType::class("java.lang.Object");
        let string = JavaType::class("java.lang.String");
        assert!(object.is_assignable_from(&string));
        assert!(string.is_assignable_from(&JavaType::class("java.lang.String")));
        assert!(!string.is_assignable_from(&object));
        assert!(!JavaType::Unknown.is_assignable_from(&JavaType::Unknown));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(JavaType::class("a.B").as_ref()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "Class", "fullyQualifiedName": "a.B"})
        );
        let primitive = serde_json::to_value(JavaType::Primitive {
            keyword: PrimitiveKind::Boolean,
        })
        .unwrap();
        assert_eq!(
            primitive,
            serde_json::json!({"kind": "Primitive", "keyword": "boolean"})
        );
    }
}
