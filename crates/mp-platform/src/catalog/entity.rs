//! Catalog Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::argument::{Loggable, ObjectKind, ObjectRef};
use crate::shared::acl;

/// Review status shared by add-ons and files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddonStatus {
    Null,
    Unreviewed,
    Pending,
    Nominated,
    Public,
    Disabled,
    Beta,
    Lite,
    LiteAndNominated,
    Deleted,
}

impl AddonStatus {
    /// Numeric code as stored by the legacy schema
    pub fn code(self) -> u8 {
        match self {
            AddonStatus::Null => 0,
            AddonStatus::Unreviewed => 1,
            AddonStatus::Pending => 2,
            AddonStatus::Nominated => 3,
            AddonStatus::Public => 4,
            AddonStatus::Disabled => 5,
            AddonStatus::Beta => 7,
            AddonStatus::Lite => 8,
            AddonStatus::LiteAndNominated => 9,
            AddonStatus::Deleted => 11,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => AddonStatus::Null,
            1 => AddonStatus::Unreviewed,
            2 => AddonStatus::Pending,
            3 => AddonStatus::Nominated,
            4 => AddonStatus::Public,
            5 => AddonStatus::Disabled,
            7 => AddonStatus::Beta,
            8 => AddonStatus::Lite,
            9 => AddonStatus::LiteAndNominated,
            11 => AddonStatus::Deleted,
            _ => return None,
        })
    }

    /// Label shown in activity entries
    pub fn display_name(self) -> &'static str {
        match self {
            AddonStatus::Null => "Incomplete",
            AddonStatus::Unreviewed => "Awaiting Preliminary Review",
            AddonStatus::Pending => "Pending approval",
            AddonStatus::Nominated => "Awaiting Full Review",
            AddonStatus::Public => "Fully Reviewed",
            AddonStatus::Disabled => "Disabled by an administrator",
            AddonStatus::Beta => "Beta",
            AddonStatus::Lite => "Preliminarily Reviewed",
            AddonStatus::LiteAndNominated => {
                "Preliminarily Reviewed and Awaiting Full Review"
            }
            AddonStatus::Deleted => "Deleted",
        }
    }
}

/// Marketplace user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// `App:Action` rules from the user's groups
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            display_name: None,
            permissions: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_permission(mut self, rule: impl Into<String>) -> Self {
        self.permissions.push(rule.into());
        self
    }

    /// Display name, falling back to the username
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    pub fn action_allowed(&self, app: &str, action: &str) -> bool {
        acl::action_allowed(&self.permissions, app, action)
    }
}

/// Add-on or app listed in the marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    pub id: u64,
    pub name: String,
    /// Slug used in add-on detail URLs
    pub slug: String,
    /// Slug used in app URLs (purchase, receipt verification)
    pub app_slug: String,
    /// Origin of an installable web app
    pub origin: String,
    pub status: AddonStatus,
    #[serde(default = "default_true")]
    pub is_listed: bool,
    #[serde(default)]
    pub disabled_by_user: bool,
    /// User ids of the listed authors
    #[serde(default)]
    pub authors: Vec<u64>,
}

fn default_true() -> bool {
    true
}

impl Addon {
    pub fn new(id: u64, name: impl Into<String>, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id,
            name: name.into(),
            app_slug: slug.clone(),
            slug,
            origin: String::new(),
            status: AddonStatus::Public,
            is_listed: true,
            disabled_by_user: false,
            authors: Vec::new(),
        }
    }

    pub fn with_app_slug(mut self, app_slug: impl Into<String>) -> Self {
        self.app_slug = app_slug.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_status(mut self, status: AddonStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_author(mut self, user_id: u64) -> Self {
        if !self.authors.contains(&user_id) {
            self.authors.push(user_id);
        }
        self
    }

    pub fn unlisted(mut self) -> Self {
        self.is_listed = false;
        self
    }

    pub fn has_author(&self, user_id: u64) -> bool {
        self.authors.contains(&user_id)
    }

    pub fn is_disabled(&self) -> bool {
        self.status == AddonStatus::Disabled || self.disabled_by_user
    }
}

/// A released version of an add-on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: u64,
    pub addon_id: u64,
    pub version: String,
    pub created: DateTime<Utc>,
}

impl Version {
    pub fn new(id: u64, addon_id: u64, version: impl Into<String>) -> Self {
        Self {
            id,
            addon_id,
            version: version.into(),
            created: Utc::now(),
        }
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }
}

/// An uploaded file belonging to a version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: u64,
    pub version_id: u64,
    pub filename: String,
    pub status: AddonStatus,
}

impl File {
    pub fn new(id: u64, version_id: u64, filename: impl Into<String>, status: AddonStatus) -> Self {
        Self {
            id,
            version_id,
            filename: filename.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: u64,
    pub addon_id: u64,
    pub user_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Review {
    pub fn new(id: u64, addon_id: u64, user_id: u64) -> Self {
        Self {
            id,
            addon_id,
            user_id,
            title: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub author_username: String,
}

impl Collection {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        slug: impl Into<String>,
        author_username: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
            author_username: author_username.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: u64,
    pub tag_text: String,
}

impl Tag {
    pub fn new(id: u64, tag_text: impl Into<String>) -> Self {
        Self {
            id,
            tag_text: tag_text.into(),
        }
    }

    /// Whether the text fits in a single `/tag/{text}` path segment.
    pub fn can_link(&self) -> bool {
        !self.tag_text.is_empty() && !self.tag_text.contains('/')
    }
}

/// Permission group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: u64,
    pub name: String,
}

impl Group {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A user's installation of an app. The uuid is the receipt's opaque user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installed {
    pub id: u64,
    pub addon_id: u64,
    pub user_id: u64,
    pub uuid: String,
}

impl Installed {
    pub fn new(id: u64, addon_id: u64, user_id: u64) -> Self {
        Self {
            id,
            addon_id,
            user_id,
            uuid: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }
}

macro_rules! impl_loggable {
    ($($entity:ty => $kind:expr),+ $(,)?) => {
        $(
            impl Loggable for $entity {
                fn object_ref(&self) -> ObjectRef {
                    ObjectRef::new($kind, self.id)
                }
            }
        )+
    };
}

impl_loggable! {
    Addon => ObjectKind::Addon,
    Version => ObjectKind::Version,
    File => ObjectKind::File,
    User => ObjectKind::User,
    Review => ObjectKind::Review,
    Collection => ObjectKind::Collection,
    Tag => ObjectKind::Tag,
    Group => ObjectKind::Group,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for code in 0..=12u8 {
            if let Some(status) = AddonStatus::from_code(code) {
                assert_eq!(status.code(), code);
            }
        }
        assert_eq!(AddonStatus::from_code(6), None);
    }

    #[test]
    fn test_user_name_falls_back_to_username() {
        let user = User::new(1, "yolo");
        assert_eq!(user.name(), "yolo");
        let user = user.with_display_name("Yolo Swaggins");
        assert_eq!(user.name(), "Yolo Swaggins");
        let blank = User::new(2, "blank").with_display_name("");
        assert_eq!(blank.name(), "blank");
    }

    #[test]
    fn test_user_permissions() {
        let user = User::new(1, "reviewer").with_permission("Apps:Review");
        assert!(user.action_allowed("Apps", "Review"));
        assert!(!user.action_allowed("Addons", "Edit"));
    }

    #[test]
    fn test_addon_authors_and_disabled() {
        let addon = Addon::new(3615, "Delicious Bookmarks", "a3615")
            .with_author(5)
            .with_author(5);
        assert_eq!(addon.authors, vec![5]);
        assert!(addon.has_author(5));
        assert!(!addon.is_disabled());
        assert!(addon.clone().with_status(AddonStatus::Disabled).is_disabled());
        assert_eq!(addon.app_slug, "a3615");
    }

    #[test]
    fn test_tag_link() {
        assert!(Tag::new(1, "bookmarks").can_link());
        assert!(!Tag::new(2, "http://foo.com").can_link());
        assert!(!Tag::new(3, "").can_link());
    }

    #[test]
    fn test_object_refs() {
        let addon = Addon::new(3615, "Delicious Bookmarks", "a3615");
        assert_eq!(addon.object_ref(), ObjectRef::new(ObjectKind::Addon, 3615));
        let group = Group::new(9, "Reviewers");
        assert_eq!(group.object_ref().kind, ObjectKind::Group);
    }
}
