//! Activity Rendering
//!
//! Substitutes resolved arguments into an action's template and produces an
//! HTML fragment. Template text is trusted, everything taken from arguments
//! is escaped.

use mp_common::Markup;
use mp_config::SiteConfig;
use tracing::warn;

use super::action::{ActionFlags, ActivityAction};
use super::entity::ActivityLog;
use super::resolver::{LogObject, ResolvedArgument};
use super::template::{self, NamedSlot, Segment};
use crate::catalog::{Addon, Collection, Review, Tag, User};

/// Shown when an entry cannot be rendered.
pub const FALLBACK_MESSAGE: &str = "Something magical happened.";

/// Rendered for a named slot with no matching argument.
const MISSING_SLOT: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderFailure {
    UnknownAction,
    UndecodableArguments,
    BadTemplate,
    MissingPositional(usize),
    UnknownAttribute(usize),
}

/// Named slot values picked from an argument list.
#[derive(Debug, Default)]
struct NamedValues {
    addon: Option<Markup>,
    review: Option<Markup>,
    version: Option<Markup>,
    collection: Option<Markup>,
    tag: Option<Markup>,
    group: Option<Markup>,
}

/// Renders activity entries for one locale and application.
#[derive(Debug, Clone)]
pub struct ActivityRenderer {
    locale: String,
    app: String,
}

impl ActivityRenderer {
    pub fn new(site: &SiteConfig) -> Self {
        Self {
            locale: site.locale.clone(),
            app: site.app.clone(),
        }
    }

    fn prefix(&self) -> String {
        format!("/{}/{}", self.locale, self.app)
    }

    pub fn addon_url(&self, addon: &Addon) -> String {
        format!("{}/addon/{}/", self.prefix(), addon.slug)
    }

    pub fn user_url(&self, user: &User) -> String {
        format!("{}/user/{}/", self.prefix(), user.id)
    }

    pub fn review_url(&self, review: &Review) -> String {
        format!("{}/addon/{}/reviews/{}/", self.prefix(), review.addon_id, review.id)
    }

    pub fn collection_url(&self, collection: &Collection) -> String {
        format!(
            "{}/collections/{}/{}/",
            self.prefix(),
            collection.author_username,
            collection.slug
        )
    }

    /// `None` when the tag text cannot be used as a path segment.
    pub fn tag_url(&self, tag: &Tag) -> Option<String> {
        tag.can_link().then(|| {
            format!("{}/tag/{}", self.prefix(), urlencoding::encode(&tag.tag_text))
        })
    }

    /// Render an entry. `arguments` is `None` when the stored list could not
    /// be decoded. `actor` fills the `{user}` slot.
    pub fn render(
        &self,
        log: &ActivityLog,
        arguments: Option<&[ResolvedArgument]>,
        actor: Option<&User>,
    ) -> Markup {
        match self.try_render(log, arguments, actor) {
            Ok(markup) => markup,
            Err(failure) => {
                warn!(
                    activity_id = log.id,
                    action = log.action,
                    failure = ?failure,
                    "Could not render activity entry"
                );
                Markup::text(FALLBACK_MESSAGE)
            }
        }
    }

    fn try_render(
        &self,
        log: &ActivityLog,
        arguments: Option<&[ResolvedArgument]>,
        actor: Option<&User>,
    ) -> Result<Markup, RenderFailure> {
        let action = log.action().ok_or(RenderFailure::UnknownAction)?;
        let arguments = arguments.ok_or(RenderFailure::UndecodableArguments)?;
        let segments =
            template::parse(action.format()).map_err(|_| RenderFailure::BadTemplate)?;

        let (named, positional) = self.pick_named(arguments);
        let raw_html = action.has_flag(ActionFlags::RAW_HTML);

        let mut out = Markup::default();
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_trusted(text),
                Segment::Brace(brace) => out.push_trusted(brace.encode_utf8(&mut [0; 4])),
                Segment::Named(slot) => out.push(&self.named_slot(slot, &named, actor)),
                Segment::Positional { index, attribute } => {
                    let argument = positional
                        .get(index)
                        .ok_or(RenderFailure::MissingPositional(index))?;
                    let text = match attribute {
                        Some(name) => argument
                            .as_object()
                            .and_then(|object| object.attribute(name))
                            .ok_or(RenderFailure::UnknownAttribute(index))?,
                        None => argument.display_text(),
                    };
                    if raw_html {
                        out.push_trusted(&text);
                    } else {
                        out.push(&Markup::text(&text));
                    }
                }
            }
        }
        Ok(out)
    }

    /// Take the first add-on, review, version, collection, tag and group
    /// out of the list. The rest stay positional.
    fn pick_named<'a>(
        &self,
        arguments: &'a [ResolvedArgument],
    ) -> (NamedValues, Vec<&'a ResolvedArgument>) {
        let mut named = NamedValues::default();
        let mut positional = Vec::with_capacity(arguments.len());

        for argument in arguments {
            let slot = match argument.as_object() {
                Some(LogObject::Addon(_)) => &mut named.addon,
                Some(LogObject::Review(_)) => &mut named.review,
                Some(LogObject::Version(_)) => &mut named.version,
                Some(LogObject::Collection(_)) => &mut named.collection,
                Some(LogObject::Tag(_)) => &mut named.tag,
                Some(LogObject::Group(_)) => &mut named.group,
                _ => {
                    positional.push(argument);
                    continue;
                }
            };
            match (slot.is_none(), argument.as_object()) {
                (true, Some(object)) => *slot = Some(self.object_markup(object)),
                _ => positional.push(argument),
            }
        }

        (named, positional)
    }

    fn object_markup(&self, object: &LogObject) -> Markup {
        match object {
            LogObject::Addon(addon) if addon.is_listed => {
                Markup::link(&self.addon_url(addon), &addon.name)
            }
            LogObject::Addon(addon) => Markup::text(&addon.name),
            LogObject::Review(review) => Markup::link(&self.review_url(review), "Review"),
            LogObject::Version(version) => Markup::text(&format!("Version {}", version.version)),
            LogObject::Collection(collection) => {
                Markup::link(&self.collection_url(collection), &collection.name)
            }
            LogObject::Tag(tag) => match self.tag_url(tag) {
                Some(url) => Markup::link(&url, &tag.tag_text),
                None => Markup::text(&tag.tag_text),
            },
            LogObject::Group(group) => Markup::text(&group.name),
            LogObject::User(user) => Markup::link(&self.user_url(user), user.name()),
            LogObject::File(file) => Markup::text(&file.filename),
        }
    }

    fn named_slot(&self, slot: NamedSlot, named: &NamedValues, actor: Option<&User>) -> Markup {
        let value = match slot {
            NamedSlot::Addon => named.addon.clone(),
            NamedSlot::Review => named.review.clone(),
            NamedSlot::Version => named.version.clone(),
            NamedSlot::Collection => named.collection.clone(),
            NamedSlot::Tag => named.tag.clone(),
            NamedSlot::Group => named.group.clone(),
            NamedSlot::User => actor.map(|user| Markup::link(&self.user_url(user), user.name())),
        };
        value.unwrap_or_else(|| Markup::trusted(MISSING_SLOT))
    }
}

/// Convenience for callers that only have the action and arguments.
pub fn render_action(
    renderer: &ActivityRenderer,
    action: ActivityAction,
    arguments: &[ResolvedArgument],
    actor: Option<&User>,
) -> Markup {
    renderer.render(&ActivityLog::new(action, actor.map(|user| user.id)), Some(arguments), actor)
}
