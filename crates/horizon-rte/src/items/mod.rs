//! Built-in toolbar items.
//!
//! Most built-ins are glyph buttons that run one native command. The font
//! picker and the link items need custom code and live in submodules.

mod font;
mod link;

pub use font::{CANDIDATE_FONTS, DEFAULT_FONT, FontOption, FontPicker};
pub use link::{IMAGE_PROMPT, LINK_PROMPT};

use crate::item::{GlyphId, ItemCheck, ItemCommand, ItemElement, ToolbarItem};
use crate::registry::RegistryOptions;

/// Name of the item that forces a structural re-render.
pub const DEBUG_RERENDER: &str = "debug-rerender";

/// Name of the command that forces a structural re-render.
pub const RERENDER_COMMAND: &str = "rerender";

fn glyph_item(name: &str, glyph: u32, command: &str) -> ToolbarItem {
    ToolbarItem::new(name, ItemElement::Glyph(GlyphId(glyph))).with_command(ItemCommand::native(command))
}

/// The built-in item set, in registration order.
pub(crate) fn default_items(options: &RegistryOptions) -> Vec<ToolbarItem> {
    let mut items = vec![
        glyph_item("bold", 0xf032, "bold").with_title("Make selection bold"),
        glyph_item("italic", 0xf033, "italic").with_title("Make selection italic"),
        glyph_item("underline", 0xf0cd, "underline").with_title("Underline selection"),
        glyph_item("strikethrough", 0xf0cc, "strikeThrough").with_title("Strike through selection"),
        glyph_item("alignLeft", 0xf036, "justifyLeft").with_title("Align left"),
        glyph_item("alignCenter", 0xf037, "justifyCenter").with_title("Align center"),
        glyph_item("alignRight", 0xf038, "justifyRight").with_title("Align right"),
        glyph_item("alignJustify", 0xf039, "justifyFull").with_title("Justify content"),
        font::font_item(),
        link::link_item(options.prompt.clone()),
        link::unlink_item(),
        link::image_item(options.prompt.clone()),
        glyph_item("indent", 0xf03c, "indent")
            .with_title("Indent current selection")
            .with_check(ItemCheck::Disabled),
        glyph_item("outdent", 0xf03b, "outdent")
            .with_title("Outdent current selection")
            .with_check(ItemCheck::Disabled),
        glyph_item("undo", 0xf0e2, "undo")
            .with_title("Undo last action")
            .with_check(ItemCheck::Disabled),
        glyph_item("redo", 0xf01e, "redo")
            .with_title("Redo last action")
            .with_check(ItemCheck::Disabled),
        glyph_item("orderedlist", 0xf0cb, "insertOrderedList"),
        glyph_item("unorderedlist", 0xf0ca, "insertUnorderedList"),
    ];

    if options.debug {
        items.push(
            glyph_item(DEBUG_RERENDER, 0xf021, RERENDER_COMMAND)
                .with_title("Rerender control (FOR DEBUGGING)")
                .with_check(ItemCheck::Disabled),
        );
    }
    items
}
