//! Log Arguments
//!
//! Arguments are stored as a JSON list of single-key objects. The key is a
//! type tag and the value the object id or literal:
//!
//! ```text
//! [{"addons.addon": 3615}, {"str": "developer"}, {"int": 3}, {"null": null}]
//! ```

use serde_json::{Map, Value};
use std::fmt;

/// Kinds of domain objects an activity entry can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Addon,
    Version,
    File,
    User,
    Review,
    Collection,
    Tag,
    Group,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 8] = [
        ObjectKind::Addon,
        ObjectKind::Version,
        ObjectKind::File,
        ObjectKind::User,
        ObjectKind::Review,
        ObjectKind::Collection,
        ObjectKind::Tag,
        ObjectKind::Group,
    ];

    /// Type tag used in the stored argument list (`app_label.model`)
    pub fn tag(self) -> &'static str {
        match self {
            ObjectKind::Addon => "addons.addon",
            ObjectKind::Version => "versions.version",
            ObjectKind::File => "files.file",
            ObjectKind::User => "users.userprofile",
            ObjectKind::Review => "reviews.review",
            ObjectKind::Collection => "bandwagon.collection",
            ObjectKind::Tag => "tags.tag",
            ObjectKind::Group => "access.group",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Human-readable entity name for errors and traces
    pub fn entity_name(self) -> &'static str {
        match self {
            ObjectKind::Addon => "Addon",
            ObjectKind::Version => "Version",
            ObjectKind::File => "File",
            ObjectKind::User => "User",
            ObjectKind::Review => "Review",
            ObjectKind::Collection => "Collection",
            ObjectKind::Tag => "Tag",
            ObjectKind::Group => "Group",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Lazy reference to a domain object: the `(Type, id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub id: u64,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, id: u64) -> Self {
        Self { kind, id }
    }
}

/// Anything that can be referenced from an activity entry.
pub trait Loggable {
    fn object_ref(&self) -> ObjectRef;
}

/// One stored argument of an activity entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogArgument {
    Object(ObjectRef),
    Text(String),
    Int(i64),
    Null,
}

const TEXT_TAG: &str = "str";
const LEGACY_TEXT_TAG: &str = "unicode";
const INT_TAG: &str = "int";
const NULL_TAG: &str = "null";

impl LogArgument {
    pub fn object(kind: ObjectKind, id: u64) -> Self {
        LogArgument::Object(ObjectRef::new(kind, id))
    }

    pub fn text(text: impl Into<String>) -> Self {
        LogArgument::Text(text.into())
    }

    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            LogArgument::Object(reference) => Some(*reference),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        let (tag, value) = match self {
            LogArgument::Object(reference) => (reference.kind.tag(), Value::from(reference.id)),
            LogArgument::Text(text) => (TEXT_TAG, Value::from(text.as_str())),
            LogArgument::Int(value) => (INT_TAG, Value::from(*value)),
            LogArgument::Null => (NULL_TAG, Value::Null),
        };
        let mut map = Map::with_capacity(1);
        map.insert(tag.to_string(), value);
        Value::Object(map)
    }

    fn from_json(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 1 {
            return None;
        }
        let (tag, value) = map.iter().next()?;
        match tag.as_str() {
            TEXT_TAG | LEGACY_TEXT_TAG => value.as_str().map(LogArgument::text),
            INT_TAG => value.as_i64().map(LogArgument::Int),
            NULL_TAG => value.is_null().then_some(LogArgument::Null),
            tag => {
                let kind = ObjectKind::from_tag(tag)?;
                value.as_u64().map(|id| LogArgument::object(kind, id))
            }
        }
    }
}

impl<T: Loggable> From<&T> for LogArgument {
    fn from(object: &T) -> Self {
        LogArgument::Object(object.object_ref())
    }
}

impl From<ObjectRef> for LogArgument {
    fn from(reference: ObjectRef) -> Self {
        LogArgument::Object(reference)
    }
}

impl From<(ObjectKind, u64)> for LogArgument {
    fn from((kind, id): (ObjectKind, u64)) -> Self {
        LogArgument::object(kind, id)
    }
}

impl From<&str> for LogArgument {
    fn from(text: &str) -> Self {
        LogArgument::Text(text.to_string())
    }
}

impl From<String> for LogArgument {
    fn from(text: String) -> Self {
        LogArgument::Text(text)
    }
}

impl From<i64> for LogArgument {
    fn from(value: i64) -> Self {
        LogArgument::Int(value)
    }
}

impl<T: Into<LogArgument>> From<Option<T>> for LogArgument {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(LogArgument::Null)
    }
}

/// Serialize arguments for storage.
pub fn encode_arguments(arguments: &[LogArgument]) -> String {
    Value::Array(arguments.iter().map(LogArgument::to_json).collect()).to_string()
}

/// Parse stored arguments. Any malformed element makes the whole list `None`.
pub fn decode_arguments(raw: &str) -> Option<Vec<LogArgument>> {
    let value: Value = serde_json::from_str(raw).ok()?;
    value
        .as_array()?
        .iter()
        .map(LogArgument::from_json)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_tags() {
        let encoded = encode_arguments(&[
            LogArgument::object(ObjectKind::Addon, 3615),
            LogArgument::text("developer"),
            LogArgument::Int(3),
            LogArgument::Null,
        ]);
        assert_eq!(
            encoded,
            r#"[{"addons.addon":3615},{"str":"developer"},{"int":3},{"null":null}]"#
        );
    }

    #[test]
    fn test_decode_pseudo_object() {
        let decoded = decode_arguments(r#"[{"addons.addon": 3615}]"#).unwrap();
        assert_eq!(decoded, vec![LogArgument::object(ObjectKind::Addon, 3615)]);
    }

    #[test]
    fn test_decode_legacy_text_tag() {
        let decoded = decode_arguments(r#"[{"unicode": "hi there"}]"#).unwrap();
        assert_eq!(decoded, vec![LogArgument::text("hi there")]);
    }

    #[test]
    fn test_decode_empty_list() {
        assert_eq!(decode_arguments("[]"), Some(vec![]));
    }

    #[test]
    fn test_decode_malformed_is_none() {
        assert_eq!(decode_arguments("failboat?"), None);
        assert_eq!(decode_arguments(r#"{"addons.addon": 1}"#), None);
        assert_eq!(decode_arguments(r#"[{"unknown.model": 1}]"#), None);
        assert_eq!(decode_arguments(r#"[{"addons.addon": "abc"}]"#), None);
        assert_eq!(decode_arguments(r#"[{"str": "a", "int": 1}]"#), None);
        assert_eq!(decode_arguments(r#"[{"addons.addon": -4}]"#), None);
    }

    #[test]
    fn test_kind_tags_are_unique() {
        for kind in ObjectKind::ALL {
            assert_eq!(ObjectKind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn test_conversions() {
        assert_eq!(
            LogArgument::from((ObjectKind::Version, 81551)),
            LogArgument::object(ObjectKind::Version, 81551)
        );
        assert_eq!(LogArgument::from("hi"), LogArgument::text("hi"));
        assert_eq!(LogArgument::from(None::<String>), LogArgument::Null);
        assert_eq!(LogArgument::from(Some(7i64)), LogArgument::Int(7));
    }
}
