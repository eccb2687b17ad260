//! Access Control Rules
//!
//! Users carry permission rules of the form `App:Action`. Either side may
//! be `*`, so `Apps:*` grants every action on apps and `*:*` grants everything.

/// Well-known permission rules
pub mod permissions {
    /// Superuser
    pub const ADMIN_ALL: &str = "*:*";
    /// Review apps in the review queue
    pub const APPS_REVIEW: &str = "Apps:Review";
}

/// Check a single `App:Action` rule.
fn rule_matches(rule: &str, app: &str, action: &str) -> bool {
    match rule.trim().split_once(':') {
        Some((rule_app, rule_action)) => {
            (rule_app == "*" || rule_app == app) && (rule_action == "*" || rule_action == action)
        }
        None => false,
    }
}

/// True when any of `rules` grants `app:action`.
///
/// Each rule string may hold several comma separated rules.
pub fn action_allowed<S: AsRef<str>>(rules: &[S], app: &str, action: &str) -> bool {
    rules
        .iter()
        .flat_map(|rules| rules.as_ref().split(','))
        .any(|rule| rule_matches(rule, app, action))
}

/// Same as [`action_allowed`] with the permission written as `App:Action`.
pub fn permission_allowed<S: AsRef<str>>(rules: &[S], permission: &str) -> bool {
    match permission.split_once(':') {
        Some((app, action)) => action_allowed(rules, app, action),
        None => false,
    }
}
