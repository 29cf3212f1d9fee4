//! Tests for loading editor settings from disk.

use std::io::Write;

use horizon_rte::settings::DEFAULT_MENU_ITEMS;
use horizon_rte::{EditorSettings, RteError, SimpleEditor};

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
value = "<p>from disk</p>"
menu_items = "bold | undo"
debug = true
toolbar_row_height = 40.0
"#
    )
    .unwrap();

    let settings = EditorSettings::load(file.path()).unwrap();
    assert_eq!(settings.value, "<p>from disk</p>");
    assert_eq!(settings.menu_items, "bold | undo");
    assert!(settings.debug);
    assert_eq!(settings.toolbar_row_height, 40.0);
    assert!(settings.sanitize_value);

    let editor = SimpleEditor::new(settings);
    assert_eq!(editor.value(), "<p>from disk</p>");
    assert!(editor.registry().contains("debug-rerender"));
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    match EditorSettings::load(&path) {
        Err(RteError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[test]
fn test_malformed_file_reports_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "menu_items = [1, 2").unwrap();

    let result = EditorSettings::load(file.path());
    assert!(matches!(result, Err(RteError::Settings(_))));
}

#[test]
fn test_default_menu_items_resolve_completely() {
    let editor = SimpleEditor::new(EditorSettings::default());
    assert_eq!(editor.menu_items(), DEFAULT_MENU_ITEMS);

    let toolbar = horizon_rte::ToolbarBuilder::new(editor.registry()).build(
        &horizon_rte::ToolbarSpec::parse(DEFAULT_MENU_ITEMS),
        &editor.handle(),
    );
    assert!(toolbar.skipped().is_empty());
    assert_eq!(toolbar.len(), 23);
}
