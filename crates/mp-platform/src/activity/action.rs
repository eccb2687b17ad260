//! Activity Actions
//!
//! Every tracked action with its stored id, message template and flags.
//! The table is generated from one list so the enum, [`ActivityAction::ALL`]
//! and [`ActivityAction::spec`] cannot drift apart.

use std::collections::HashMap;
use std::fmt;

use super::template::{self, TemplateError};

/// Behaviour flags attached to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionFlags(u8);

impl ActionFlags {
    pub const NONE: Self = Self(0);
    /// Shown on the add-on's public history
    pub const KEEP: Self = Self(1);
    /// Only visible to administrators
    pub const ADMIN_EVENT: Self = Self(1 << 1);
    /// Counts as a review-queue decision in reviewer statistics
    pub const REVIEW_QUEUE: Self = Self(1 << 2);
    /// Triggers an email to the add-on's developers
    pub const REVIEW_EMAIL_USER: Self = Self(1 << 3);
    /// Hidden from developers
    pub const HIDE_DEVELOPER: Self = Self(1 << 4);
    /// Shown in the editor tools log
    pub const EDITOR_EVENT: Self = Self(1 << 5);
    /// Positional literals are trusted HTML
    pub const RAW_HTML: Self = Self(1 << 6);

    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Static description of one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub id: u16,
    pub name: &'static str,
    pub format: &'static str,
    pub flags: ActionFlags,
}

macro_rules! activity_actions {
    ($( $variant:ident = $id:literal, $name:literal, $format:literal $(, $flag:ident)* ; )+) => {
        /// Tracked activity
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ActivityAction {
            $( $variant, )+
        }

        impl ActivityAction {
            pub const ALL: &'static [ActivityAction] = &[ $( ActivityAction::$variant, )+ ];

            pub fn spec(self) -> ActionSpec {
                match self {
                    $(
                        ActivityAction::$variant => ActionSpec {
                            id: $id,
                            name: $name,
                            format: $format,
                            flags: ActionFlags::NONE $( .with(ActionFlags::$flag) )*,
                        },
                    )+
                }
            }
        }
    };
}

activity_actions! {
    CreateAddon = 1, "CREATE_ADDON", "{addon} was created.", KEEP;
    EditProperties = 2, "EDIT_PROPERTIES", "{addon} properties edited.";
    EditDescriptions = 3, "EDIT_DESCRIPTIONS", "{addon} description edited.";
    EditCategories = 4, "EDIT_CATEGORIES", "Categories edited for {addon}.";
    AddUserWithRole = 5, "ADD_USER_WITH_ROLE", "{0.name} ({1}) added to {addon}.", KEEP;
    RemoveUserWithRole = 6, "REMOVE_USER_WITH_ROLE", "{0.name} ({1}) removed from {addon}.", KEEP;
    EditContributions = 7, "EDIT_CONTRIBUTIONS", "Contributions for {addon}.";
    UserDisable = 8, "USER_DISABLE", "{addon} disabled.", KEEP;
    UserEnable = 9, "USER_ENABLE", "{addon} enabled.", KEEP;
    SetPublicStats = 10, "SET_PUBLIC_STATS", "Stats set public for {addon}.", KEEP;
    UnsetPublicStats = 11, "UNSET_PUBLIC_STATS", "{addon} stats set to private.", KEEP;
    ChangeStatus = 12, "CHANGE_STATUS", "{addon} status changed to {0}.", KEEP;
    AddPreview = 13, "ADD_PREVIEW", "Preview added to {addon}.";
    EditPreview = 14, "EDIT_PREVIEW", "Preview edited for {addon}.";
    DeletePreview = 15, "DELETE_PREVIEW", "Preview deleted from {addon}.";
    AddVersion = 16, "ADD_VERSION", "{version} added to {addon}.", KEEP;
    EditVersion = 17, "EDIT_VERSION", "{version} edited for {addon}.";
    DeleteVersion = 18, "DELETE_VERSION", "Version {0} deleted from {addon}.", KEEP;
    AddFileToVersion = 19, "ADD_FILE_TO_VERSION", "File {0.name} added to {version} of {addon}.";
    DeleteFileFromVersion = 20, "DELETE_FILE_FROM_VERSION", "File {0} deleted from {version} of {addon}.";
    ApproveVersion = 21, "APPROVE_VERSION", "{addon} {version} approved.",
        KEEP, REVIEW_EMAIL_USER, REVIEW_QUEUE, EDITOR_EVENT;
    RetainVersion = 22, "RETAIN_VERSION", "{addon} {version} retained.",
        KEEP, REVIEW_EMAIL_USER, REVIEW_QUEUE, EDITOR_EVENT;
    EscalateVersion = 23, "ESCALATE_VERSION", "{addon} {version} escalated.",
        KEEP, REVIEW_EMAIL_USER, REVIEW_QUEUE, HIDE_DEVELOPER, EDITOR_EVENT;
    RequestVersion = 24, "REQUEST_VERSION", "{addon} {version} review requested.",
        KEEP, REVIEW_EMAIL_USER, REVIEW_QUEUE, EDITOR_EVENT;
    AddTag = 25, "ADD_TAG", "{tag} added to {addon}.";
    RemoveTag = 26, "REMOVE_TAG", "{tag} removed from {addon}.";
    AddToCollection = 27, "ADD_TO_COLLECTION", "{addon} added to {collection}.";
    RemoveFromCollection = 28, "REMOVE_FROM_COLLECTION", "{addon} removed from {collection}.";
    AddReview = 29, "ADD_REVIEW", "{review} for {addon} written.";
    AddRecommendedCategory = 31, "ADD_RECOMMENDED_CATEGORY", "{addon} featured in {0}.";
    RemoveRecommendedCategory = 32, "REMOVE_RECOMMENDED_CATEGORY", "{addon} no longer featured in {0}.";
    AddRecommended = 33, "ADD_RECOMMENDED", "{addon} is now featured.", KEEP;
    RemoveRecommended = 34, "REMOVE_RECOMMENDED", "{addon} is no longer featured.", KEEP;
    ChangeUserWithRole = 36, "CHANGE_USER_WITH_ROLE", "{0.name} role changed to {1} for {addon}.", KEEP;
    ChangePolicy = 38, "CHANGE_POLICY", "{addon} policy changed.";
    ChangeIcon = 39, "CHANGE_ICON", "{addon} icon changed.";
    ApproveReview = 40, "APPROVE_REVIEW", "{review} for {addon} approved.", EDITOR_EVENT;
    DeleteReview = 41, "DELETE_REVIEW", "Review {0} for {addon} deleted.", EDITOR_EVENT;
    PreliminaryVersion = 42, "PRELIMINARY_VERSION", "{addon} {version} given preliminary review.",
        KEEP, REVIEW_EMAIL_USER, REVIEW_QUEUE, EDITOR_EVENT;
    RejectVersion = 43, "REJECT_VERSION", "{addon} {version} rejected.",
        KEEP, REVIEW_EMAIL_USER, REVIEW_QUEUE, EDITOR_EVENT;
    RequestInformation = 44, "REQUEST_INFORMATION", "{addon} {version} more information requested.",
        KEEP, REVIEW_EMAIL_USER, REVIEW_QUEUE, EDITOR_EVENT;
    RequestSuperReview = 45, "REQUEST_SUPER_REVIEW", "{addon} {version} super review requested.",
        KEEP, REVIEW_EMAIL_USER, REVIEW_QUEUE, HIDE_DEVELOPER, EDITOR_EVENT;
    ChangePassword = 48, "CHANGE_PASSWORD", "Password changed.";
    CommentVersion = 49, "COMMENT_VERSION", "Comment on {addon} {version}.",
        REVIEW_EMAIL_USER, REVIEW_QUEUE, HIDE_DEVELOPER, EDITOR_EVENT;
    MakePremium = 50, "MAKE_PREMIUM", "{addon} changed to premium.";
    ManifestUpdated = 52, "MANIFEST_UPDATED", "{addon} manifest updated.";
    ApproveVersionWaiting = 53, "APPROVE_VERSION_WAITING", "{addon} {version} approved but waiting to be made public.",
        KEEP, REVIEW_EMAIL_USER, REVIEW_QUEUE, EDITOR_EVENT;
    PurchaseAddon = 54, "PURCHASE_ADDON", "{addon} purchased.";
    InstallAddon = 55, "INSTALL_ADDON", "{addon} installed.";
    UserEdited = 60, "USER_EDITED", "Account updated.";
    CustomText = 98, "CUSTOM_TEXT", "{0}";
    CustomHtml = 99, "CUSTOM_HTML", "{0}", RAW_HTML;
    ObjectAdded = 100, "OBJECT_ADDED", "Created: {0}.", ADMIN_EVENT;
    ObjectEdited = 101, "OBJECT_EDITED", "Edited field: {2} set to: {0}.", ADMIN_EVENT;
    ObjectDeleted = 102, "OBJECT_DELETED", "Deleted: {1}.", ADMIN_EVENT;
    AdminUserEdited = 103, "ADMIN_USER_EDITED", "User {user} edited, reason: {1}", ADMIN_EVENT;
    AdminUserAnonymized = 104, "ADMIN_USER_ANONYMIZED", "User {user} anonymized.", ADMIN_EVENT;
    AdminUserRestricted = 105, "ADMIN_USER_RESTRICTED", "User {user} restricted.", ADMIN_EVENT;
    AdminViewedLog = 106, "ADMIN_VIEWED_LOG", "Admin {0} viewed activity log for {user}.", ADMIN_EVENT;
    EditReview = 107, "EDIT_REVIEW", "{review} for {addon} updated.";
    GroupUserAdded = 120, "GROUP_USER_ADDED", "User {0.name} added to {group}.", ADMIN_EVENT;
    GroupUserRemoved = 121, "GROUP_USER_REMOVED", "User {0.name} removed from {group}.", ADMIN_EVENT;
}

impl ActivityAction {
    pub fn id(self) -> u16 {
        self.spec().id
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn format(self) -> &'static str {
        self.spec().format
    }

    pub fn has_flag(self, flag: ActionFlags) -> bool {
        self.spec().flags.contains(flag)
    }

    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|action| action.id() == id)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|action| action.name() == name)
    }

    /// Ids of all actions carrying `flag`.
    pub fn ids_with(flag: ActionFlags) -> Vec<u16> {
        Self::ALL
            .iter()
            .filter(|action| action.has_flag(flag))
            .map(|action| action.id())
            .collect()
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Problem found while checking the action table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateId { id: u16, first: &'static str, second: &'static str },
    DuplicateName { name: &'static str },
    BadTemplate { action: &'static str, error: TemplateError },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateId { id, first, second } => {
                write!(f, "action id {} used by both {} and {}", id, first, second)
            }
            RegistryError::DuplicateName { name } => write!(f, "action name {} used twice", name),
            RegistryError::BadTemplate { action, error } => {
                write!(f, "template of {} is invalid: {}", action, error)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Check the whole table. Run once at startup.
pub fn validate_registry() -> Result<(), Vec<RegistryError>> {
    let mut errors = Vec::new();
    let mut ids: HashMap<u16, &'static str> = HashMap::new();
    let mut names: HashMap<&'static str, u16> = HashMap::new();

    for action in ActivityAction::ALL {
        let spec = action.spec();

        if let Some(first) = ids.insert(spec.id, spec.name) {
            errors.push(RegistryError::DuplicateId {
                id: spec.id,
                first,
                second: spec.name,
            });
        }
        if names.insert(spec.name, spec.id).is_some() {
            errors.push(RegistryError::DuplicateName { name: spec.name });
        }
        if let Err(error) = template::parse(spec.format) {
            errors.push(RegistryError::BadTemplate {
                action: spec.name,
                error,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
