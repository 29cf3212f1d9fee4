//! HTML sanitization of the persisted value.
//!
//! The editor passes markup through a [`Sanitizer`] when its `sanitize_value`
//! flag is set: on every external value set and on every flush of the live
//! document. The default [`AllowListSanitizer`] parses the markup, removes
//! script-like elements with their content, unwraps elements that are not on
//! the [`AllowList`] and strips attributes that are not allowed for their
//! element.
//!
//! # Example
//!
//! ```
//! use horizon_rte::sanitize::{AllowList, AllowListSanitizer, Sanitizer};
//!
//! let clean = AllowListSanitizer.sanitize(
//!     r#"<p onclick="steal()">Hi<script>steal()</script> <blink>there</blink></p>"#,
//!     &AllowList::default(),
//! );
//! assert_eq!(clean, "<p>Hi there</p>");
//! ```

use std::collections::{HashMap, HashSet};

use horizon_rte_core::logging::targets;

use crate::dom::{DomTree, NodeId};

/// Turns untrusted markup into markup that is safe to persist.
pub trait Sanitizer: Send + Sync {
    /// Sanitize `markup` against `allow_list`.
    fn sanitize(&self, markup: &str, allow_list: &AllowList) -> String;
}

impl<F> Sanitizer for F
where
    F: Fn(&str, &AllowList) -> String + Send + Sync,
{
    fn sanitize(&self, markup: &str, allow_list: &AllowList) -> String {
        self(markup, allow_list)
    }
}

const DEFAULT_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "del", "div", "em", "font", "h1", "h2", "h3", "h4", "h5",
    "h6", "hr", "i", "img", "ins", "li", "ol", "p", "pre", "s", "span", "strike", "strong", "sub",
    "sup", "u", "ul",
];

const DEFAULT_DROPPED: &[&str] = &[
    "embed", "frame", "frameset", "iframe", "noscript", "object", "script", "style", "template",
];

const DEFAULT_GLOBAL_ATTRIBUTES: &[&str] = &["class", "dir", "style", "title"];

const DEFAULT_TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "name", "target", "rel"]),
    ("font", &["color", "face", "size"]),
    ("img", &["src", "alt", "width", "height"]),
    ("ol", &["start", "type"]),
];

const URL_ATTRIBUTES: &[&str] = &["href", "src"];

const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:"];

/// Elements and attributes that survive sanitization.
#[derive(Debug, Clone)]
pub struct AllowList {
    tags: HashSet<String>,
    dropped: HashSet<String>,
    global_attributes: HashSet<String>,
    tag_attributes: HashMap<String, HashSet<String>>,
}

impl Default for AllowList {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|name| name.to_string()).collect();
        Self {
            tags: owned(DEFAULT_TAGS),
            dropped: owned(DEFAULT_DROPPED),
            global_attributes: owned(DEFAULT_GLOBAL_ATTRIBUTES),
            tag_attributes: DEFAULT_TAG_ATTRIBUTES
                .iter()
                .map(|(tag, attributes)| (tag.to_string(), owned(attributes)))
                .collect(),
        }
    }
}

impl AllowList {
    /// An allow list that admits nothing but text.
    pub fn empty() -> Self {
        Self {
            tags: HashSet::new(),
            dropped: DEFAULT_DROPPED.iter().map(|name| name.to_string()).collect(),
            global_attributes: HashSet::new(),
            tag_attributes: HashMap::new(),
        }
    }

    /// Allow an element.
    pub fn allow_tag(mut self, tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        self.dropped.remove(&tag);
        self.tags.insert(tag);
        self
    }

    /// Allow an attribute on one element.
    pub fn allow_attribute(mut self, tag: &str, attribute: &str) -> Self {
        self.tag_attributes
            .entry(tag.to_ascii_lowercase())
            .or_default()
            .insert(attribute.to_ascii_lowercase());
        self
    }

    /// Whether the element is kept.
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether the element is removed together with its content.
    pub fn drops_tag(&self, tag: &str) -> bool {
        self.dropped.contains(tag)
    }

    /// Whether the attribute, with this value, is kept on the element.
    pub fn allows_attribute(&self, tag: &str, name: &str, value: &str) -> bool {
        if name.starts_with("on") {
            return false;
        }
        let listed = self.global_attributes.contains(name)
            || self
                .tag_attributes
                .get(tag)
                .is_some_and(|attributes| attributes.contains(name));
        if !listed {
            return false;
        }
        if URL_ATTRIBUTES.contains(&name) {
            return is_safe_url(tag, value);
        }
        if name == "style" {
            return is_safe_style(value);
        }
        true
    }
}

fn is_safe_url(tag: &str, value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|scheme| normalized.starts_with(scheme)) {
        return false;
    }
    !normalized.starts_with("data:") || (tag == "img" && normalized.starts_with("data:image/"))
}

fn is_safe_style(value: &str) -> bool {
    let normalized = value.to_ascii_lowercase();
    !normalized.contains("expression(") && !normalized.contains("javascript:")
}

/// The default sanitizer, driven entirely by the [`AllowList`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowListSanitizer;

impl Sanitizer for AllowListSanitizer {
    fn sanitize(&self, markup: &str, allow_list: &AllowList) -> String {
        let mut tree = DomTree::new();
        let body = tree.body();
        if let Err(err) = tree.set_inner_html(body, markup) {
            tracing::warn!(target: targets::DOM, error = %err, "markup could not be parsed, discarding");
            return String::new();
        }
        clean_children(&mut tree, body, allow_list);
        tree.inner_html(body)
    }
}

fn clean_children(tree: &mut DomTree, parent: NodeId, allow_list: &AllowList) {
    for child in tree.children(parent).to_vec() {
        clean_node(tree, child, allow_list);
    }
}

fn clean_node(tree: &mut DomTree, node: NodeId, allow_list: &AllowList) {
    let Some(tag) = tree.tag(node).map(str::to_string) else {
        return;
    };
    if allow_list.drops_tag(&tag) {
        tracing::trace!(target: targets::DOM, %tag, "dropping element with content");
        tree.remove_subtree(node);
        return;
    }

    clean_children(tree, node, allow_list);

    if !allow_list.allows_tag(&tag) {
        tracing::trace!(target: targets::DOM, %tag, "unwrapping element");
        if let Err(err) = tree.unwrap_element(node) {
            tracing::warn!(target: targets::DOM, error = %err, "failed to unwrap element, removing it");
            tree.remove_subtree(node);
        }
        return;
    }

    let rejected: Vec<String> = tree
        .attributes(node)
        .iter()
        .filter(|(name, value)| !allow_list.allows_attribute(&tag, name, value))
        .map(|(name, _)| name.clone())
        .collect();
    for name in rejected {
        if let Err(err) = tree.remove_attribute(node, &name) {
            tracing::warn!(target: targets::DOM, error = %err, "failed to remove attribute");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(markup: &str) -> String {
        AllowListSanitizer.sanitize(markup, &AllowList::default())
    }

    #[test]
    fn test_script_and_style_removed_with_content() {
        assert_eq!(
            clean("<p>a<script>alert(1)</script>b<style>p{}</style></p>"),
            "<p>ab</p>"
        );
    }

    #[test]
    fn test_unknown_elements_unwrapped() {
        assert_eq!(clean("<custom><b>bold</b> text</custom>"), "<b>bold</b> text");
    }

    #[test]
    fn test_event_handlers_and_unknown_attributes_stripped() {
        assert_eq!(
            clean(r#"<b onmouseover="x()" data-id="1" class="c">t</b>"#),
            r#"<b class="c">t</b>"#
        );
    }

    #[test]
    fn test_dangerous_urls_stripped() {
        assert_eq!(
            clean(r#"<a href=" JavaScript:alert(1)">x</a><a href="https://ok.example">y</a>"#),
            r#"<a>x</a><a href="https://ok.example">y</a>"#
        );
        assert_eq!(
            clean(r#"<img src="data:image/png;base64,AAAA"><a href="data:text/html,x">z</a>"#),
            r#"<img src="data:image/png;base64,AAAA"><a>z</a>"#
        );
    }

    #[test]
    fn test_editor_output_is_preserved() {
        let markup = r#"<p style="text-align: center;"><span style="font-weight: bold;">x</span></p><ul><li>y</li></ul>"#;
        assert_eq!(clean(markup), markup);
    }

    #[test]
    fn test_custom_allow_list() {
        let allow_list = AllowList::empty().allow_tag("p").allow_attribute("p", "lang");
        let clean = AllowListSanitizer.sanitize(r#"<p lang="en" class="x"><b>t</b></p>"#, &allow_list);
        assert_eq!(clean, r#"<p lang="en">t</p>"#);
    }

    #[test]
    fn test_closures_are_sanitizers() {
        let upper = |markup: &str, _: &AllowList| markup.to_uppercase();
        assert_eq!(upper.sanitize("<p>x</p>", &AllowList::default()), "<P>X</P>");
    }
}
