//! The font family picker.
//!
//! A drop-down custom element. Picking a family wraps the selection in a
//! `span` (or, when the selection cannot be wrapped, styles its common
//! ancestor) and sets `font-family` on it and every element below it.

use std::any::Any;
use std::sync::Arc;

use horizon_rte_core::logging::targets;
use parking_lot::Mutex;

use crate::dom::{DomTree, NodeId};
use crate::facade::{EditorFacade, EditorHandle};
use crate::item::{ElementFactory, ItemCheck, ItemElement, ToolbarItem};
use crate::selection_tools::SelectionTools;
use crate::toolbar::{CustomElement, ToolbarElement};

/// The option that clears any explicit family.
pub const DEFAULT_FONT: &str = "default";

/// Generic families listed before the divider.
pub const GENERIC_FAMILIES: [&str; 4] = [DEFAULT_FONT, "serif", "sans-serif", "monospace"];

/// Label of the divider entry.
pub const DIVIDER_LABEL: &str = "-----";

/// Named families offered after the divider.
pub const CANDIDATE_FONTS: &[&str] = &[
    "Andale Mono",
    "Arial",
    "Arial Black",
    "Book Antiqua",
    "Century Gothic",
    "Comic Sans MS",
    "Courier",
    "Courier New",
    "DejaVu Sans",
    "DejaVu Serif",
    "Droid Sans",
    "Droid Serif",
    "Geneva",
    "Georgia",
    "Helvetica",
    "Impact",
    "Charcoal",
    "Liberation Mono",
    "Liberation Sans",
    "Liberation Serif",
    "Lucida",
    "Lucida Console",
    "Lucida Grande",
    "Lucida Sans",
    "Monaco",
    "MS Serif",
    "Nimbus Mono",
    "Nimbus Roman",
    "Nimbus Sans",
    "Tahoma",
    "Times",
    "Times New Roman",
    "Trebuchet MS",
    "New York",
    "Palatino",
    "Palatino Linotype",
    "Ubuntu",
    "Verdana",
    "Webdings",
];

/// One entry of the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontOption {
    /// The family name; `None` for the divider.
    pub value: Option<String>,
    /// Displayed text.
    pub label: String,
}

/// The drop-down control behind the `font` toolbar item.
pub struct FontPicker {
    options: Vec<FontOption>,
    selected: Mutex<usize>,
    editor: EditorHandle,
    tools: SelectionTools,
}

impl FontPicker {
    /// Create a picker acting on `editor`.
    pub fn new(editor: EditorHandle, tools: SelectionTools) -> Self {
        let generic = GENERIC_FAMILIES.iter().map(|family| FontOption {
            value: Some(family.to_string()),
            label: family.to_string(),
        });
        let divider = FontOption {
            value: None,
            label: DIVIDER_LABEL.to_string(),
        };
        let candidates = CANDIDATE_FONTS.iter().map(|family| FontOption {
            value: Some(family.to_string()),
            label: family.to_string(),
        });
        Self {
            options: generic.chain(std::iter::once(divider)).chain(candidates).collect(),
            selected: Mutex::new(0),
            editor,
            tools,
        }
    }

    /// All entries, in display order.
    pub fn options(&self) -> &[FontOption] {
        &self.options
    }

    /// The family of the selected entry.
    pub fn selected_value(&self) -> Option<&str> {
        let index = *self.selected.lock();
        self.options.get(index)?.value.as_deref()
    }

    /// Select the entry for `family`, falling back to the default entry.
    ///
    /// Returns whether `family` was found.
    pub fn select_value(&self, family: &str) -> bool {
        let found = self
            .options
            .iter()
            .position(|option| option.value.as_deref() == Some(family));
        *self.selected.lock() = found.unwrap_or(0);
        found.is_some()
    }

    fn apply(&self, family: &str) {
        let editor = &self.editor;
        let Some(range) = editor.current_range() else {
            tracing::debug!(target: targets::COMMAND, "font picked without a selection");
            return;
        };
        let selection = editor.selection();
        let range = self.tools.select_or_expand(range, &selection);
        let document = editor.document();

        let wrapper = document.with_tree_mut(|tree| tree.create_element("span"));
        let target = match document.surround_contents(range, wrapper) {
            Ok(()) => Some(wrapper),
            Err(err) => {
                tracing::debug!(target: targets::COMMAND, error = %err, "cannot wrap selection, styling common ancestor");
                document.with_tree_mut(|tree| {
                    tree.remove_subtree(wrapper);
                    range.common_ancestor(tree).map(|node| {
                        if tree.is_text(node) {
                            tree.parent(node).unwrap_or(node)
                        } else {
                            node
                        }
                    })
                })
            }
        };
        let Some(target) = target else {
            return;
        };

        document.with_tree_mut(|tree| set_font_family(tree, target, family));
        self.tools.select_node_contents(&selection, Some(range), target);
        editor.normalize();
        editor.request_focus();
    }
}

impl CustomElement for FontPicker {
    fn input(&self, value: &str) {
        self.select_value(value);
        self.apply(value);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Set (or, for the default entry, clear) `font-family` on `node` and every
/// element below it.
fn set_font_family(tree: &mut DomTree, node: NodeId, family: &str) {
    let css_value = if family.contains(char::is_whitespace) {
        format!("\"{family}\"")
    } else {
        family.to_string()
    };

    let mut elements = vec![node];
    elements.extend(tree.descendants(node));
    elements.retain(|&id| tree.is_element(id));
    for element in elements {
        let result = if family == DEFAULT_FONT {
            tree.remove_style(element, "font-family")
        } else {
            tree.set_style(element, "font-family", &css_value)
        };
        if let Err(err) = result {
            tracing::warn!(target: targets::COMMAND, error = %err, "failed to set font family");
        }
    }
}

/// The family in effect at `node`: the nearest `font-family` up to the body,
/// without surrounding quotes.
fn effective_family(tree: &DomTree, node: NodeId) -> Option<String> {
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .find_map(|id| tree.style(id, "font-family"))
        .map(|family| family.trim_matches(['"', '\'']).to_string())
}

pub(crate) fn font_item() -> ToolbarItem {
    let factory: ElementFactory = Arc::new(|editor: &EditorHandle, tools: &SelectionTools| {
        ToolbarElement::custom(Arc::new(FontPicker::new(editor.clone(), *tools)))
    });
    ToolbarItem::new("font", ItemElement::Custom(factory))
        .with_title("Choose a font")
        .with_check(ItemCheck::custom(sync_picker))
}

/// Show the family at the end of the current range in the picker.
///
/// The picker is never highlighted, so this always returns `false`.
fn sync_picker(editor: &dyn EditorFacade, element: &ToolbarElement) -> bool {
    let Some(picker) = element.custom_control::<FontPicker>() else {
        return false;
    };
    let Some(range) = editor.current_range() else {
        return false;
    };
    let family = editor
        .document()
        .with_tree(|tree| effective_family(tree, range.end.node));
    picker.select_value(family.as_deref().unwrap_or(DEFAULT_FONT));
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Boundary, ContentDocument, Range};
    use crate::facade::CommandTarget;

    struct Editor {
        document: ContentDocument,
    }

    impl EditorFacade for Editor {
        fn document(&self) -> ContentDocument {
            self.document.clone()
        }

        fn request_focus(&self) {}
    }

    impl CommandTarget for Editor {
        fn execute_command(&self, _name: &str) {}
    }

    fn editor(html: &str) -> Arc<Editor> {
        let document = ContentDocument::new();
        document.set_content_editable(true);
        document.set_body_inner_html(html).unwrap();
        Arc::new(Editor { document })
    }

    fn text_nodes(document: &ContentDocument) -> Vec<NodeId> {
        document.with_tree(|tree| {
            tree.descendants(tree.body())
                .into_iter()
                .filter(|&id| tree.is_text(id))
                .collect()
        })
    }

    fn picker_element(editor: &Arc<Editor>) -> ToolbarElement {
        match font_item().element() {
            ItemElement::Custom(factory) => factory(&EditorHandle::new(editor), &SelectionTools::new()),
            _ => panic!("font item must use a factory"),
        }
    }

    #[test]
    fn test_option_list() {
        let picker = FontPicker::new(EditorHandle::detached(), SelectionTools::new());
        let options = picker.options();

        assert_eq!(options.len(), GENERIC_FAMILIES.len() + 1 + CANDIDATE_FONTS.len());
        assert_eq!(options[0].value.as_deref(), Some("default"));
        assert_eq!(options[4], FontOption { value: None, label: "-----".into() });
        assert_eq!(options[5].label, "Andale Mono");
        assert_eq!(picker.selected_value(), Some("default"));
    }

    #[test]
    fn test_pick_wraps_selection_in_span() {
        let editor = editor("<p>hello world</p>");
        let text = text_nodes(&editor.document)[0];
        editor
            .document
            .selection()
            .add_range(Range::new(Boundary::new(text, 6), Boundary::new(text, 11)));

        let element = picker_element(&editor);
        element.input("Georgia");

        assert_eq!(
            editor.document.body_inner_html(),
            r#"<p>hello <span style="font-family: Georgia;">world</span></p>"#
        );
        let picker = element.custom_control::<FontPicker>().unwrap();
        assert_eq!(picker.selected_value(), Some("Georgia"));

        let span = editor.document.with_tree(|tree| tree.children(tree.children(tree.body())[0])[1]);
        assert_eq!(
            editor.document.selection().range_at(0),
            Some(Range::new(Boundary::new(span, 0), Boundary::new(span, 1)))
        );
    }

    #[test]
    fn test_pick_falls_back_to_common_ancestor() {
        let editor = editor("<p>one<b>two</b></p>");
        let [one, two] = text_nodes(&editor.document)[..] else {
            panic!("expected two text nodes");
        };
        editor
            .document
            .selection()
            .add_range(Range::new(Boundary::new(one, 1), Boundary::new(two, 2)));

        picker_element(&editor).input("Times New Roman");
        assert_eq!(
            editor.document.body_inner_html(),
            r#"<p style="font-family: &quot;Times New Roman&quot;;">one<b style="font-family: &quot;Times New Roman&quot;;">two</b></p>"#
        );
    }

    #[test]
    fn test_check_syncs_picker_without_activating() {
        let editor = editor(r#"<p><span style="font-family: 'Courier New';">x</span>y</p>"#);
        let [x, y] = text_nodes(&editor.document)[..] else {
            panic!("expected two text nodes");
        };
        let element = picker_element(&editor);
        let selection = editor.document.selection();

        selection.add_range(Range::caret(Boundary::new(x, 1)));
        assert!(!sync_picker(editor.as_ref(), &element));
        let picker = element.custom_control::<FontPicker>().unwrap();
        assert_eq!(picker.selected_value(), Some("Courier New"));

        selection.remove_all_ranges();
        selection.add_range(Range::caret(Boundary::new(y, 0)));
        sync_picker(editor.as_ref(), &element);
        assert_eq!(picker.selected_value(), Some("default"));
    }
}
