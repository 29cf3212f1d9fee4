//! Tests for the editor control driven through the render lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_rte::dom::{Boundary, ContentDocument, NodeId, Range};
use horizon_rte::items::FontPicker;
use horizon_rte::prelude::*;
use horizon_rte::toolbar::{ACTIVE_CLASS, ICON_CLASS, SEPARATOR_CLASS};
use horizon_rte::{SurfaceState, ToolbarBuilder};
use horizon_rte_core::ControlId;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    editor: SimpleEditor,
    manager: RenderManager,
    id: ControlId,
}

impl Harness {
    fn new(settings: EditorSettings) -> Self {
        init_tracing();
        let editor = SimpleEditor::new(settings);
        let manager = RenderManager::new();
        let id = manager.add(&editor.control());
        Self { editor, manager, id }
    }

    fn loaded(settings: EditorSettings) -> Self {
        let harness = Self::new(settings);
        harness.render_and_load();
        harness
    }

    fn render_and_load(&self) {
        self.manager.render(self.id).unwrap();
        assert!(self.editor.surface().complete_load());
    }
}

fn settings(value: &str, menu_items: &str) -> EditorSettings {
    EditorSettings {
        value: value.into(),
        menu_items: menu_items.into(),
        ..EditorSettings::default()
    }
}

fn text_nodes(document: &ContentDocument) -> Vec<NodeId> {
    document.with_tree(|tree| {
        tree.descendants(tree.body())
            .into_iter()
            .filter(|&id| tree.is_text(id))
            .collect()
    })
}

fn select_body(document: &ContentDocument) {
    let body = document.body();
    let range = document.with_tree(|tree| Range::selecting_contents(tree, body));
    document.selection().remove_all_ranges();
    document.selection().add_range(range);
}

#[test]
fn test_set_value_is_idempotent() {
    let harness = Harness::new(EditorSettings::default());
    let editor = &harness.editor;
    let changes = Arc::new(AtomicUsize::new(0));
    let changes_clone = changes.clone();
    editor.value_changed().connect(move |_| {
        changes_clone.fetch_add(1, Ordering::SeqCst);
    });

    assert!(editor.set_value("<p>a</p>"));
    assert!(!editor.set_value("<p>a</p>"));
    assert_eq!(editor.value(), "<p>a</p>");
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    harness.render_and_load();
    assert!(!editor.set_value("<p>a</p>"));
    assert_eq!(changes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_rerender_round_trip_preserves_content_and_selection() {
    let harness = Harness::loaded(settings("<p>hello <b>world</b></p>", "bold"));
    let editor = &harness.editor;

    let before = editor.document();
    let world = text_nodes(&before)[1];
    let selected = Range::new(Boundary::new(world, 1), Boundary::new(world, 3));
    before.selection().add_range(selected);

    editor.execute_command("rerender");
    assert_eq!(harness.manager.flush(), 1);
    assert_eq!(editor.surface().state(), SurfaceState::Loading);
    assert!(editor.document().is_stub());
    assert!(editor.has_pending_snapshot());
    assert_eq!(editor.value(), "<p>hello <b>world</b></p>");

    assert!(editor.surface().complete_load());
    let after = editor.document();
    assert!(!after.ptr_eq(&before));
    assert_eq!(after.body_inner_html(), "<p>hello <b>world</b></p>");
    assert_eq!(after.selection().ranges(), vec![selected]);
    assert!(after.is_content_editable());
    assert!(editor.toolbar().element_named("bold").unwrap().is_active());
}

#[test]
fn test_typed_text_survives_rerender() {
    let harness = Harness::loaded(settings("<p>ab</p>", "bold"));
    let editor = &harness.editor;
    let document = editor.document();
    let text = text_nodes(&document)[0];
    document.selection().add_range(Range::caret(Boundary::new(text, 1)));

    document.type_text("X");
    assert_eq!(editor.value(), "<p>aXb</p>");

    harness.render_and_load();
    let document = editor.document();
    assert_eq!(document.body_inner_html(), "<p>aXb</p>");
    assert_eq!(
        document.selection().ranges(),
        vec![Range::caret(Boundary::new(text, 2))]
    );
}

#[test]
fn test_external_set_discards_pending_snapshot() {
    let harness = Harness::loaded(settings("<p>old</p>", "bold"));
    let editor = &harness.editor;

    harness.manager.render(harness.id).unwrap();
    assert!(editor.has_pending_snapshot());

    assert!(editor.set_value("<p>new</p>"));
    assert!(!editor.has_pending_snapshot());

    editor.surface().complete_load();
    assert_eq!(editor.document().body_inner_html(), "<p>new</p>");
}

#[test]
fn test_registry_overwrite_reaches_toolbar() {
    let harness = Harness::loaded(settings("", "bold italic"));
    let editor = &harness.editor;
    assert_eq!(
        editor.toolbar().element_named("bold").unwrap().tooltip(),
        Some("Make selection bold")
    );

    editor
        .add_toolbar_element(
            ToolbarItem::new("bold", ItemElement::Glyph(GlyphId(0xf032)))
                .with_title("Heavier")
                .with_command(ItemCommand::native("bold")),
        )
        .unwrap();
    assert_eq!(harness.manager.flush(), 1);

    let toolbar = editor.toolbar();
    assert_eq!(toolbar.len(), 2);
    assert_eq!(toolbar.element_named("bold").unwrap().tooltip(), Some("Heavier"));
}

#[test]
fn test_unknown_items_are_skipped() {
    let harness = Harness::loaded(settings("", "bold italic nonexistent underline undo"));
    let toolbar = harness.editor.toolbar();

    assert_eq!(toolbar.len(), 4);
    assert_eq!(toolbar.skipped(), ["nonexistent"]);
    assert!(toolbar.element_named("nonexistent").is_none());
}

#[test]
fn test_separators_pass_through() {
    let harness = Harness::loaded(settings("", "bold | | italic"));
    let toolbar = harness.editor.toolbar();

    assert_eq!(toolbar.len(), 4);
    assert_eq!(toolbar.check_count(), 2);
    for index in [1, 2] {
        let separator = toolbar.element(index).unwrap();
        assert_eq!(separator.class_names(), vec![ICON_CLASS, SEPARATOR_CLASS]);
        assert_eq!(separator.click(), 0);
    }
}

#[test]
fn test_bold_then_undo_scenario() {
    let harness = Harness::loaded(settings("<p>text</p>", "bold | undo"));
    let editor = &harness.editor;
    let toolbar = editor.toolbar();
    assert_eq!(toolbar.len(), 3);
    assert_eq!(toolbar.check_count(), 1);

    let bold = toolbar.element_named("bold").unwrap();
    let undo = toolbar.element_named("undo").unwrap();

    select_body(&editor.document());
    bold.click();
    assert_eq!(
        editor.value(),
        r#"<p><span style="font-weight: bold;">text</span></p>"#
    );
    assert!(bold.is_active());
    assert!(bold.class_names().contains(&ACTIVE_CLASS));

    undo.click();
    assert_eq!(editor.value(), "<p>text</p>");
    assert_eq!(editor.document().body_inner_html(), "<p>text</p>");
    assert!(!bold.is_active());
    assert!(!undo.is_active());
}

#[test]
fn test_stub_safety_before_load() {
    let harness = Harness::new(settings("<p>x</p>", "bold font link unlink image undo"));
    let editor = &harness.editor;
    let handle = editor.handle();

    assert!(handle.document().is_stub());
    assert!(handle.current_range().is_none());
    let stub = handle.document();
    stub.selection().add_range(Range::caret(Boundary::new(stub.body(), 0)));
    assert_eq!(handle.selection().range_count(), 0);
    handle.normalize();
    handle.request_focus();

    let toolbar = ToolbarBuilder::new(editor.registry())
        .build(&ToolbarSpec::parse(&editor.menu_items()), &handle);
    for element in toolbar.elements() {
        element.click();
        element.input("serif");
    }
    toolbar.refresh_active_states(&handle);

    assert_eq!(editor.value(), "<p>x</p>");
    assert!(!editor.surface().has_focus());

    // Rendered but still loading: commands are dropped.
    harness.manager.render(harness.id).unwrap();
    editor.execute_command("bold");
    assert_eq!(editor.value(), "<p>x</p>");
}

#[test]
fn test_custom_command_edits_are_persisted() {
    let harness = Harness::loaded(settings("<p>x</p>", "bold"));
    let editor = &harness.editor;
    editor
        .add_toolbar_element(
            ToolbarItem::new("underlineAll", ItemElement::Glyph(GlyphId(0xf0cd))).with_command(
                ItemCommand::custom(|editor, _| {
                    let Some(range) = editor.current_range() else {
                        return;
                    };
                    let document = editor.document();
                    let wrapper = document.with_tree_mut(|tree| tree.create_element("u"));
                    document.surround_contents(range, wrapper).unwrap();
                }),
            ),
        )
        .unwrap();
    editor.set_menu_items("bold underlineAll");
    harness.manager.flush();
    editor.surface().complete_load();

    select_body(&editor.document());
    editor.toolbar().element_named("underlineAll").unwrap().click();

    assert_eq!(editor.value(), "<u><p>x</p></u>");
    assert!(editor.surface().has_focus());
}

#[test]
fn test_font_picker_through_toolbar() {
    let harness = Harness::loaded(settings("<p>hello world</p>", "font"));
    let editor = &harness.editor;
    let document = editor.document();
    let text = text_nodes(&document)[0];
    document
        .selection()
        .add_range(Range::new(Boundary::new(text, 6), Boundary::new(text, 11)));

    let element = editor.toolbar().element_named("font").unwrap().clone();
    assert_eq!(element.tooltip(), Some("Choose a font"));
    element.input("Georgia");

    assert_eq!(
        editor.value(),
        r#"<p>hello <span style="font-family: Georgia;">world</span></p>"#
    );
    let picker = element.custom_control::<FontPicker>().unwrap();
    assert_eq!(picker.selected_value(), Some("Georgia"));
    assert!(!element.is_active());

    document.selection().collapse(Boundary::new(text, 0));
    assert_eq!(picker.selected_value(), Some("default"));
}

#[test]
fn test_sanitize_flag() {
    let harness = Harness::new(EditorSettings::default());
    let editor = &harness.editor;

    editor.set_value(r#"<p onclick="x()">a<script>b</script></p>"#);
    assert_eq!(editor.value(), "<p>a</p>");

    editor.set_sanitize_value(false);
    editor.set_value("<p>a<script>b</script></p>");
    assert_eq!(editor.value(), "<p>a<script>b</script></p>");
}

#[test]
fn test_link_item_uses_prompt() {
    init_tracing();
    let prompt: Arc<dyn Prompt> = Arc::new(|_: &str| Some("https://example.org".to_string()));
    let editor = SimpleEditor::builder(settings("<p>site</p>", "link unlink"))
        .prompt(prompt)
        .build();
    let manager = RenderManager::new();
    let id = manager.add(&editor.control());
    manager.render(id).unwrap();
    editor.surface().complete_load();

    let document = editor.document();
    let text = text_nodes(&document)[0];
    document.selection().add_range(Range::caret(Boundary::new(text, 2)));
    editor.toolbar().element_named("link").unwrap().click();
    assert_eq!(editor.value(), r#"<p><a href="https://example.org">site</a></p>"#);

    editor.toolbar().element_named("unlink").unwrap().click();
    assert_eq!(editor.value(), "<p>site</p>");
}

#[test]
fn test_dropping_editor_leaves_handles_inert() {
    let handle = {
        let harness = Harness::loaded(settings("<p>x</p>", "bold"));
        harness.editor.handle()
    };
    assert!(!handle.is_alive());
    assert!(handle.document().is_stub());
    handle.execute_command("bold");
}
