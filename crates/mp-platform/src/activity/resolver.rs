//! Argument Resolution
//!
//! Turns stored `(kind, id)` references back into live catalog objects.

use async_trait::async_trait;

use super::argument::{LogArgument, ObjectKind, ObjectRef};
use crate::catalog::{Addon, Collection, File, Group, Review, Tag, User, Version};
use crate::shared::error::Result;

/// A catalog object an activity argument pointed at
#[derive(Debug, Clone, PartialEq)]
pub enum LogObject {
    Addon(Addon),
    Version(Version),
    File(File),
    User(User),
    Review(Review),
    Collection(Collection),
    Tag(Tag),
    Group(Group),
}

impl LogObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            LogObject::Addon(_) => ObjectKind::Addon,
            LogObject::Version(_) => ObjectKind::Version,
            LogObject::File(_) => ObjectKind::File,
            LogObject::User(_) => ObjectKind::User,
            LogObject::Review(_) => ObjectKind::Review,
            LogObject::Collection(_) => ObjectKind::Collection,
            LogObject::Tag(_) => ObjectKind::Tag,
            LogObject::Group(_) => ObjectKind::Group,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            LogObject::Addon(o) => o.id,
            LogObject::Version(o) => o.id,
            LogObject::File(o) => o.id,
            LogObject::User(o) => o.id,
            LogObject::Review(o) => o.id,
            LogObject::Collection(o) => o.id,
            LogObject::Tag(o) => o.id,
            LogObject::Group(o) => o.id,
        }
    }

    /// Plain text used when the object fills a positional slot.
    pub fn display_text(&self) -> String {
        match self {
            LogObject::Addon(addon) => addon.name.clone(),
            LogObject::Version(version) => version.version.clone(),
            LogObject::File(file) => file.filename.clone(),
            LogObject::User(user) => user.name().to_string(),
            LogObject::Review(review) => review
                .title
                .clone()
                .unwrap_or_else(|| "Review".to_string()),
            LogObject::Collection(collection) => collection.name.clone(),
            LogObject::Tag(tag) => tag.tag_text.clone(),
            LogObject::Group(group) => group.name.clone(),
        }
    }

    /// Field lookup for `{N.attr}` slots.
    pub fn attribute(&self, name: &str) -> Option<String> {
        let value = match (self, name) {
            (_, "id") => self.id().to_string(),
            (LogObject::Addon(addon), "name") => addon.name.clone(),
            (LogObject::Addon(addon), "slug") => addon.slug.clone(),
            (LogObject::Version(version), "version") => version.version.clone(),
            (LogObject::File(file), "name" | "filename") => file.filename.clone(),
            (LogObject::User(user), "name") => user.name().to_string(),
            (LogObject::User(user), "username") => user.username.clone(),
            (LogObject::Review(review), "title") => review.title.clone()?,
            (LogObject::Collection(collection), "name") => collection.name.clone(),
            (LogObject::Collection(collection), "slug") => collection.slug.clone(),
            (LogObject::Tag(tag), "tag_text") => tag.tag_text.clone(),
            (LogObject::Group(group), "name") => group.name.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// An argument after its reference has been looked up
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedArgument {
    Object(LogObject),
    Text(String),
    Int(i64),
    Null,
}

impl ResolvedArgument {
    /// Plain text used in positional slots.
    pub fn display_text(&self) -> String {
        match self {
            ResolvedArgument::Object(object) => object.display_text(),
            ResolvedArgument::Text(text) => text.clone(),
            ResolvedArgument::Int(value) => value.to_string(),
            ResolvedArgument::Null => "None".to_string(),
        }
    }

    pub fn as_object(&self) -> Option<&LogObject> {
        match self {
            ResolvedArgument::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// Looks up the object behind a stored reference.
#[async_trait]
pub trait ObjectResolver: Send + Sync {
    /// `Ok(None)` when the object no longer exists.
    async fn resolve(&self, reference: ObjectRef) -> Result<Option<LogObject>>;

    /// Resolve a whole argument list. References to missing objects are dropped.
    async fn resolve_all(&self, arguments: &[LogArgument]) -> Result<Vec<ResolvedArgument>> {
        let mut resolved = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match argument {
                LogArgument::Object(reference) => {
                    if let Some(object) = self.resolve(*reference).await? {
                        resolved.push(ResolvedArgument::Object(object));
                    }
                }
                LogArgument::Text(text) => resolved.push(ResolvedArgument::Text(text.clone())),
                LogArgument::Int(value) => resolved.push(ResolvedArgument::Int(*value)),
                LogArgument::Null => resolved.push(ResolvedArgument::Null),
            }
        }
        Ok(resolved)
    }
}
