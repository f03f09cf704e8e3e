use crate::fixtures;
use obscura_mapping::{parse, NameMapping};
use obscura_rename::{presets, Obfuscator};
use obscura_utils::errors::MappingError;

#[test]
fn test_printed_mapping_parses_back() {
    fixtures::init_tracing();
    let mut pool = fixtures::pool();
    let result = Obfuscator::new(presets::unique(fixtures::keep_main()))
        .run(&mut pool)
        .unwrap();

    let text = result.mapping.to_string();
    let parsed = parse(&text).unwrap();
    assert_eq!(parsed, result.mapping);
    assert_eq!(parsed.to_string(), text);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.txt");
    result.mapping.write_file(&path).unwrap();
    assert_eq!(NameMapping::read_file(&path).unwrap(), result.mapping);
}

#[test]
fn test_mapping_covers_renamed_symbols_only() {
    fixtures::init_tracing();
    let mut pool = fixtures::pool();
    let result = Obfuscator::new(presets::standard(fixtures::keep_main()))
        .run(&mut pool)
        .unwrap();

    // Program classes only, library classes never appear.
    assert_eq!(result.mapping.len(), pool.program_ids().count());
    assert!(result.mapping.class("java.lang.Object").is_none());

    let main = result.mapping.class("com.acme.app.Main").unwrap();
    assert_eq!(main.obfuscated, "com.acme.app.Main");
    let members: Vec<&str> = main.members().map(|m| m.original()).collect();
    assert!(members.contains(&"main"));
    assert!(!members.contains(&"<init>"));
}

#[test]
fn test_parse_errors_report_line_numbers() {
    let err = parse("# header\n    int x -> a\n").unwrap_err();
    assert!(matches!(err, MappingError::Parse { line: 2, .. }), "{err}");

    let err = parse("com.acme.A -> a:\n    not a record\n").unwrap_err();
    assert!(matches!(err, MappingError::Parse { line: 2, .. }), "{err}");

    let err = parse("com.acme.A -> a\n").unwrap_err();
    assert!(matches!(err, MappingError::Parse { line: 1, .. }), "{err}");

    let missing = NameMapping::read_file("/nonexistent/mapping.txt").unwrap_err();
    assert!(matches!(missing, MappingError::FileRead { .. }));
}
