//! Link, unlink and image items. These need a value from the user or extra
//! selection handling, so they run custom commands instead of plain native ones.

use std::sync::Arc;

use horizon_rte_core::logging::targets;

use crate::facade::{EditorFacade, Prompt};
use crate::item::{GlyphId, ItemCheck, ItemCommand, ItemElement, ToolbarItem};
use crate::selection_tools::SelectionTools;

/// Message shown when asking for a link target.
pub const LINK_PROMPT: &str = "Link target:";
/// Message shown when asking for an image URL.
pub const IMAGE_PROMPT: &str = "Image URL:";

pub(crate) fn link_item(prompt: Arc<dyn Prompt>) -> ToolbarItem {
    ToolbarItem::new("link", ItemElement::Glyph(GlyphId(0xf0c1)))
        .with_title("Add link to current selection")
        .with_command(ItemCommand::custom(move |editor, tools| {
            create_link(editor, tools, prompt.as_ref())
        }))
        .with_check(ItemCheck::Disabled)
}

pub(crate) fn unlink_item() -> ToolbarItem {
    ToolbarItem::new("unlink", ItemElement::Glyph(GlyphId(0xf127)))
        .with_title("Unlink current selection")
        .with_command(ItemCommand::custom(unlink))
        .with_check(ItemCheck::Disabled)
}

pub(crate) fn image_item(prompt: Arc<dyn Prompt>) -> ToolbarItem {
    ToolbarItem::new("image", ItemElement::Glyph(GlyphId(0xf03e)))
        .with_title("Add an image by URL")
        .with_command(ItemCommand::custom(move |editor, _| {
            insert_image(editor, prompt.as_ref())
        }))
        .with_check(ItemCheck::Disabled)
}

fn create_link(editor: &dyn EditorFacade, tools: &SelectionTools, prompt: &dyn Prompt) {
    let Some(range) = editor.current_range() else {
        return;
    };
    tools.select_or_expand(range, &editor.selection());
    match prompt.prompt(LINK_PROMPT) {
        Some(href) => {
            editor.document().exec_command("createLink", Some(&href));
        }
        None => tracing::debug!(target: targets::COMMAND, "link prompt cancelled"),
    }
}

fn unlink(editor: &dyn EditorFacade, tools: &SelectionTools) {
    let Some(range) = editor.current_range() else {
        return;
    };
    tools.select_or_expand(range, &editor.selection());
    let document = editor.document();
    document.exec_command("unlink", None);
    document.normalize();
}

fn insert_image(editor: &dyn EditorFacade, prompt: &dyn Prompt) {
    match prompt.prompt(IMAGE_PROMPT) {
        Some(src) => {
            editor.document().exec_command("insertImage", Some(&src));
        }
        None => tracing::debug!(target: targets::COMMAND, "image prompt cancelled"),
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::dom::{Boundary, ContentDocument, Range};

    struct Editor(ContentDocument);

    impl EditorFacade for Editor {
        fn document(&self) -> ContentDocument {
            self.0.clone()
        }

        fn request_focus(&self) {}
    }

    fn editor_with_caret(html: &str) -> Editor {
        let document = ContentDocument::new();
        document.set_content_editable(true);
        document.set_body_inner_html(html).unwrap();
        let text = document.with_tree(|tree| {
            tree.descendants(tree.body())
                .into_iter()
                .find(|&id| tree.is_text(id))
                .unwrap()
        });
        document.selection().add_range(Range::caret(Boundary::new(text, 1)));
        Editor(document)
    }

    fn run(item: &ToolbarItem, editor: &Editor) {
        match item.command() {
            Some(ItemCommand::Custom(command)) => command(editor, &SelectionTools::new()),
            _ => panic!("expected a custom command"),
        }
    }

    #[test]
    fn test_link_expands_caret_and_uses_prompt_answer() {
        let asked = Arc::new(Mutex::new(Vec::new()));
        let asked_clone = asked.clone();
        let prompt: Arc<dyn Prompt> = Arc::new(move |message: &str| {
            asked_clone.lock().push(message.to_string());
            Some("https://example.org".to_string())
        });
        let editor = editor_with_caret("<p>site</p>");

        run(&link_item(prompt), &editor);
        assert_eq!(*asked.lock(), vec![LINK_PROMPT.to_string()]);
        assert_eq!(
            editor.0.body_inner_html(),
            r#"<p><a href="https://example.org">site</a></p>"#
        );
    }

    #[test]
    fn test_cancelled_prompt_is_noop() {
        let prompt: Arc<dyn Prompt> = Arc::new(|_: &str| -> Option<String> { None });
        let editor = editor_with_caret("<p>site</p>");

        run(&link_item(prompt.clone()), &editor);
        run(&image_item(prompt), &editor);
        assert_eq!(editor.0.body_inner_html(), "<p>site</p>");
    }

    #[test]
    fn test_unlink_removes_anchor() {
        let editor = editor_with_caret(r#"<p><a href="x">site</a></p>"#);
        run(&unlink_item(), &editor);
        assert_eq!(editor.0.body_inner_html(), "<p>site</p>");
    }

    #[test]
    fn test_image_inserted_at_selection() {
        let prompt: Arc<dyn Prompt> = Arc::new(|_: &str| Some("cat.png".to_string()));
        let editor = editor_with_caret("<p>ab</p>");

        run(&image_item(prompt), &editor);
        assert_eq!(editor.0.body_inner_html(), r#"<p>a<img src="cat.png">b</p>"#);
    }

    #[test]
    fn test_link_items_have_no_checks() {
        let prompt: Arc<dyn Prompt> = Arc::new(|_: &str| -> Option<String> { None });
        for item in [link_item(prompt.clone()), unlink_item(), image_item(prompt)] {
            assert!(matches!(item.check(), ItemCheck::Disabled), "{}", item.name());
        }
    }
}
