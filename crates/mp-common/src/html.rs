//! HTML Markup
//!
//! A string that is already safe to embed in a page. Untrusted text goes
//! through [`escape`] (or [`Markup::text`]) before it is concatenated.

use std::fmt;

/// Escape `&`, `<`, `>`, `"` and `'` for HTML text and attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Safe HTML fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    /// Wrap trusted HTML without escaping.
    pub fn trusted(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// Escape untrusted text.
    pub fn text(text: &str) -> Self {
        Self(escape(text))
    }

    /// `<a href="{href}">{text}</a>` with both parts escaped.
    pub fn link(href: &str, text: &str) -> Self {
        Self(format!("<a href=\"{}\">{}</a>", escape(href), escape(text)))
    }

    pub fn push(&mut self, other: &Markup) {
        self.0.push_str(&other.0);
    }

    /// Append template text that is trusted as-is.
    pub fn push_trusted(&mut self, html: &str) {
        self.0.push_str(html);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Markup> for String {
    fn from(markup: Markup) -> Self {
        markup.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_script_tag() {
        assert_eq!(
            escape("Delicious <script src=\"x.js\">Bookmarks"),
            "Delicious &lt;script src=&#34;x.js&#34;&gt;Bookmarks"
        );
        assert_eq!(escape("Tom & Jerry's"), "Tom &amp; Jerry&#39;s");
    }

    #[test]
    fn test_link_escapes_both_parts() {
        let link = Markup::link("/tag/a\"b", "<b>");
        assert_eq!(link.as_str(), "<a href=\"/tag/a&#34;b\">&lt;b&gt;</a>");
    }

    #[test]
    fn test_trusted_is_untouched() {
        let mut markup = Markup::trusted("<em>");
        markup.push(&Markup::text("<x>"));
        markup.push_trusted("</em>");
        assert_eq!(markup.to_string(), "<em>&lt;x&gt;</em>");
    }
}
