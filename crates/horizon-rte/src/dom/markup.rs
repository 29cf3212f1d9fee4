//! Markup parsing and serialization.
//!
//! A forgiving tokenizer for the HTML fragments an editor body holds. Comments
//! and doctypes are dropped, void elements never take children, stray end tags
//! are ignored and unclosed elements are closed at the end of input.

use super::tree::{DomTree, NodeId, NodeKind};
use crate::error::DomResult;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Whether the tag never has children.
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Debug, PartialEq)]
enum Token {
    Text(String),
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
}

// =============================================================================
// Tokenizer
// =============================================================================

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while let Some(lt) = rest.find('<') {
        text.push_str(&rest[..lt]);
        let after = &rest[lt + 1..];

        if let Some(comment) = after.strip_prefix("!--") {
            rest = match comment.find("-->") {
                Some(end) => &comment[end + 3..],
                None => "",
            };
            continue;
        }
        if after.starts_with('!') || after.starts_with('?') {
            rest = match after.find('>') {
                Some(end) => &after[end + 1..],
                None => "",
            };
            continue;
        }

        let is_end = after.starts_with('/');
        let tag_body = if is_end { &after[1..] } else { after };
        if !tag_body.starts_with(|c: char| c.is_ascii_alphabetic()) {
            text.push('<');
            rest = after;
            continue;
        }

        let Some(close) = find_tag_end(tag_body) else {
            text.push('<');
            rest = after;
            continue;
        };
        flush_text(&mut text, &mut tokens);

        let inner = &tag_body[..close];
        rest = &tag_body[close + 1..];
        if is_end {
            let name = inner
                .split(|c: char| c.is_whitespace() || c == '/')
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            tokens.push(Token::EndTag(name));
            continue;
        }

        let (name, attributes, self_closing) = parse_tag(inner);
        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) && !self_closing {
            let closing = format!("</{name}");
            let lower = rest.to_ascii_lowercase();
            let end = lower.find(&closing).unwrap_or(rest.len());
            let raw = rest[..end].to_string();
            rest = match rest[end..].find('>') {
                Some(gt) => &rest[end + gt + 1..],
                None => "",
            };
            tokens.push(Token::StartTag {
                name: name.clone(),
                attributes,
                self_closing: false,
            });
            if !raw.is_empty() {
                tokens.push(Token::Text(raw));
            }
            tokens.push(Token::EndTag(name));
            continue;
        }

        tokens.push(Token::StartTag {
            name,
            attributes,
            self_closing,
        });
    }

    text.push_str(rest);
    flush_text(&mut text, &mut tokens);
    tokens
}

fn flush_text(text: &mut String, tokens: &mut Vec<Token>) {
    if !text.is_empty() {
        tokens.push(Token::Text(decode_entities(text)));
        text.clear();
    }
}

/// Byte index of the `>` closing a tag, skipping quoted attribute values.
fn find_tag_end(input: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (index, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(index),
            None => {}
        }
    }
    None
}

fn parse_tag(inner: &str) -> (String, Vec<(String, String)>, bool) {
    let trimmed = inner.trim_end();
    let (body, self_closing) = match trimmed.strip_suffix('/') {
        Some(body) => (body, true),
        None => (trimmed, false),
    };

    let name_end = body
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(body.len());
    let name = body[..name_end].to_ascii_lowercase();
    let mut attributes: Vec<(String, String)> = Vec::new();

    let mut chars = body[name_end..].chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == '/').is_some() {}
        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=' && *c != '/') {
            key.push(c.to_ascii_lowercase());
        }
        if key.is_empty() {
            break;
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'=').is_some() {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            match chars.next_if(|c| *c == '"' || *c == '\'') {
                Some(quote) => {
                    for c in chars.by_ref() {
                        if c == quote {
                            break;
                        }
                        value.push(c);
                    }
                }
                None => {
                    while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                        value.push(c);
                    }
                }
            }
        }

        if !attributes.iter().any(|(existing, _)| *existing == key) {
            attributes.push((key, decode_entities(&value)));
        }
    }

    (name, attributes, self_closing)
}

/// Decode the character references an editor body commonly contains.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp + 1..];
        let decoded = candidate.find(';').filter(|&end| end <= 10).and_then(|end| {
            let name = &candidate[..end];
            let c = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => name.strip_prefix('#').and_then(|number| {
                    let code = match number.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => number.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            }?;
            Some((c, end))
        });

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = candidate;
            }
        }
    }
    out.push_str(rest);
    out
}

// =============================================================================
// Tree construction
// =============================================================================

/// Parse `html` and append the resulting nodes to `parent`.
pub fn parse_into(tree: &mut DomTree, parent: NodeId, html: &str) -> DomResult<()> {
    let mut open: Vec<(String, NodeId)> = Vec::new();

    for token in tokenize(html) {
        let current = open.last().map(|(_, id)| *id).unwrap_or(parent);
        match token {
            Token::Text(text) => {
                let node = tree.create_text(text);
                tree.append_child(current, node)?;
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let node = tree.create_element(&name);
                for (key, value) in attributes {
                    tree.set_attribute(node, &key, value)?;
                }
                tree.append_child(current, node)?;
                if !self_closing && !is_void(&name) {
                    open.push((name, node));
                }
            }
            Token::EndTag(name) => {
                if let Some(position) = open.iter().rposition(|(tag, _)| *tag == name) {
                    open.truncate(position);
                }
            }
        }
    }
    Ok(())
}

// =============================================================================
// Serialization
// =============================================================================

/// Serialize the children of `id`.
pub fn serialize_children(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    for &child in tree.children(id) {
        serialize_node(tree, child, &mut out);
    }
    out
}

/// Serialize a node including its own tag.
pub fn outer_html(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    serialize_node(tree, id, &mut out);
    out
}

fn serialize_node(tree: &DomTree, id: NodeId, out: &mut String) {
    match tree.kind(id) {
        Some(NodeKind::Text(text)) => {
            let raw = tree
                .parent(id)
                .and_then(|parent| tree.tag(parent))
                .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
            if raw {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        Some(NodeKind::Element { tag, attributes }) => {
            out.push('<');
            out.push_str(tag);
            for (key, value) in attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            if is_void(tag) {
                return;
            }
            for &child in tree.children(id) {
                serialize_node(tree, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        None => {}
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
