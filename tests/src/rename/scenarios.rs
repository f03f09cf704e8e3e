use crate::fixtures::{self, member};
use obscura_core::{ClassNode, ClassPool, KeepRule, Member, MemberKind};
use obscura_rename::{presets, ObfuscationConfig, Obfuscator};
use obscura_utils::WarningKind;
use std::io;
use std::sync::{Arc, Mutex};

#[test]
fn test_override_of_kept_method_stays_unrenamed() {
    fixtures::init_tracing();
    let program = vec![
        ClassNode::new("a/A").with_member(Member::method("foo", "()V").public()),
        ClassNode::new("a/B")
            .extends("a/A")
            .with_member(Member::method("foo", "()V").public())
            .with_member(Member::method("bar", "()V").public()),
    ];
    let mut pool = ClassPool::new(program, vec![]);
    let keep = KeepRule::class("a.A")
        .and_then(|rule| rule.with_member(Some(MemberKind::Method), "foo", Some("()V")))
        .unwrap()
        .members_only();
    Obfuscator::new(presets::standard(vec![keep]))
        .run(&mut pool)
        .unwrap();

    assert_eq!(member(&pool, "a/A", "foo", "()V").final_name(), "foo");
    assert_eq!(member(&pool, "a/B", "foo", "()V").final_name(), "foo");
    assert_ne!(member(&pool, "a/B", "bar", "()V").final_name(), "bar");
    // Only the member was kept.
    assert_ne!(fixtures::final_class_name(&pool, "a/A"), "a/A");
}

#[test]
fn test_private_fields_of_unrelated_classes_share_a_name() {
    fixtures::init_tracing();
    let program = vec![
        ClassNode::new("a/X").with_member(Member::field("secret", "I").private()),
        ClassNode::new("a/Y").with_member(Member::field("secret", "I").private()),
    ];
    let mut pool = ClassPool::new(program, vec![]);
    let keep = KeepRule::class("a.Main").unwrap();
    Obfuscator::new(presets::standard(vec![keep]))
        .run(&mut pool)
        .unwrap();

    assert_eq!(member(&pool, "a/X", "secret", "I").final_name(), "a");
    assert_eq!(member(&pool, "a/Y", "secret", "I").final_name(), "a");
}

#[test]
fn test_forced_collision_is_resolved_with_fallback_name() {
    fixtures::init_tracing();
    let program = vec![
        ClassNode::new("a/P").with_member(Member::method("get", "()V").public()),
        ClassNode::new("a/P$Sub")
            .extends("a/P")
            .inner_of("a/P")
            .with_member(Member::method("fresh", "()V").public()),
    ];
    let mut pool = ClassPool::new(program, vec![]);
    let prior = obscura_mapping::parse(
        "a.P -> a.P:\n    void get() -> a\na.P$Sub -> a.P$Sub:\n    void fresh() -> a\n",
    )
    .unwrap();
    let result = Obfuscator::new(ObfuscationConfig::default())
        .with_mapping(prior)
        .run(&mut pool)
        .unwrap();

    let get = member(&pool, "a/P", "get", "()V").final_name();
    let fresh = member(&pool, "a/P$Sub", "fresh", "()V").final_name();
    assert_ne!(get, fresh);
    assert_eq!(fresh, "a");
    assert_eq!(get, "a_");
    assert_eq!(result.conflicts, 1);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, WarningKind::NameConflict);
    assert_eq!(result.warnings[0].class, "a.P");
}

#[test]
fn test_forced_collision_is_fatal_when_configured() {
    let program = vec![
        ClassNode::new("a/P").with_member(Member::method("get", "()V").public()),
        ClassNode::new("a/Q")
            .extends("a/P")
            .with_member(Member::method("put", "()V").public()),
    ];
    let mut pool = ClassPool::new(program, vec![]);
    let prior =
        obscura_mapping::parse("a.P -> a.P:\n    void get() -> x\na.Q -> a.Q:\n    void put() -> x\n")
            .unwrap();
    let config = ObfuscationConfig {
        warnings_fatal: true,
        ..Default::default()
    };
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, || {
        Obfuscator::new(config).with_mapping(prior).run(&mut pool)
    });
    assert!(matches!(
        result,
        Err(obscura_utils::errors::ObfuscateError::FatalWarnings { count: 1, .. })
    ));
    // The summary is still logged.
    let logs = captured.text();
    assert!(logs.contains("Stopped after naming"), "{logs}");
    assert!(logs.contains("0 fields, 2 methods (1 warnings)"), "{logs}");
}

#[derive(Debug, Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_mapping_for_missing_class_is_skipped() {
    fixtures::init_tracing();
    let mut pool = fixtures::pool();
    let prior = obscura_mapping::parse("gone.Thing -> a.a:\n    int x -> a\n").unwrap();
    let result = Obfuscator::new(presets::standard(fixtures::keep_main()))
        .with_mapping(prior)
        .run(&mut pool)
        .unwrap();
    assert!(result.warnings.is_empty());
    assert!(result.mapping.class("gone.Thing").is_none());
}

#[test]
fn test_printed_method_record_with_lines() {
    fixtures::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapping.txt");
    let program = vec![ClassNode::new("com/acme/Calc").with_member(
        Member::method("compute", "(Ljava/lang/String;)I")
            .public()
            .with_lines(10, 25),
    )];
    let mut pool = ClassPool::new(program, vec![]);
    let config = ObfuscationConfig {
        print_mapping: Some(path.clone()),
        ..Default::default()
    };
    Obfuscator::new(config).run(&mut pool).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "com.acme.Calc -> a.a.a:\n    10:25:int compute(java.lang.String) -> a\n"
    );
}
