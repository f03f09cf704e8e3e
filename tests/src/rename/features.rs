use crate::fixtures::{self, final_class_name, member};
use obscura_core::{
    ClassId, ClassNode, ClassPool, Constant, Hierarchy, KeepRule, Linkage, Member, SymbolFilter,
};
use obscura_rename::{presets, ObfuscationConfig, Obfuscator};
use std::fs;

fn absent_keep() -> Vec<KeepRule> {
    vec![KeepRule::class("a.Main").unwrap()]
}

#[test]
fn test_unique_member_names_across_classes() {
    fixtures::init_tracing();
    let program = vec![
        ClassNode::new("a/One").with_member(Member::method("value", "()I").public()),
        ClassNode::new("a/Two")
            .with_member(Member::method("other", "()I").public())
            .with_member(Member::method("value", "()I").public()),
    ];
    let mut pool = ClassPool::new(program, vec![]);
    Obfuscator::new(presets::unique(absent_keep()))
        .run(&mut pool)
        .unwrap();

    let one = member(&pool, "a/One", "value", "()I").final_name();
    let two = member(&pool, "a/Two", "value", "()I").final_name();
    let other = member(&pool, "a/Two", "other", "()I").final_name();
    assert_ne!(one, "value");
    assert_eq!(one, two);
    assert_ne!(other, two);
}

#[test]
fn test_repackaged_classes_move_to_target() {
    fixtures::init_tracing();
    let mut pool = fixtures::pool();
    Obfuscator::new(presets::repackaged(fixtures::keep_main(), "o"))
        .run(&mut pool)
        .unwrap();

    assert_eq!(final_class_name(&pool, "com/acme/app/Main"), "com/acme/app/Main");
    for class in pool.classes().filter(|c| !c.library && !c.kept) {
        assert!(class.final_name().starts_with("o/"), "{}", class.final_name());
    }
}

#[test]
fn test_methods_under_unknown_supertype_are_kept() {
    fixtures::init_tracing();
    let program = vec![ClassNode::new("a/Widget")
        .extends("android/view/View")
        .with_member(Member::method("onDraw", "(Landroid/graphics/Canvas;)V").public())
        .with_member(Member::method("helper", "()V").private())];
    let mut pool = ClassPool::new(program, vec![]);
    Obfuscator::new(presets::standard(absent_keep()))
        .run(&mut pool)
        .unwrap();

    assert_eq!(
        member(&pool, "a/Widget", "onDraw", "(Landroid/graphics/Canvas;)V").final_name(),
        "onDraw"
    );
    assert_eq!(member(&pool, "a/Widget", "helper", "()V").final_name(), "a");
}

#[test]
fn test_package_private_methods_link_within_package_only() {
    let program = vec![
        ClassNode::new("p/A").with_member(Member::method("run", "()V")),
        ClassNode::new("p/B")
            .extends("p/A")
            .with_member(Member::method("run", "()V")),
        ClassNode::new("q/C")
            .extends("p/A")
            .with_member(Member::method("run", "()V")),
    ];
    let pool = ClassPool::new(program, vec![]);
    let hierarchy = Hierarchy::build(&pool);
    let linkage = Linkage::link(&pool, &hierarchy, false);
    let run = |class: &str| {
        let id = pool.lookup(class).unwrap();
        let index = pool.get(id).find_member("run", "()V").unwrap();
        linkage.group_of(obscura_core::MemberId {
            class: id,
            index: index as u32,
        })
    };
    assert_eq!(run("p/A"), run("p/B"));
    assert_ne!(run("p/A"), run("q/C"));
}

#[test]
fn test_dictionaries_supply_names() {
    fixtures::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let members = dir.path().join("members.txt");
    let classes = dir.path().join("classes.txt");
    fs::write(&members, "# member names\nalpha beta\n").unwrap();
    fs::write(&classes, "Zed yak\n").unwrap();

    let program = vec![ClassNode::new("p/Holder")
        .with_member(Member::field("first", "I").private())
        .with_member(Member::field("second", "I").private())];
    let mut pool = ClassPool::new(program, vec![]);
    let config = ObfuscationConfig {
        member_dictionary: Some(members),
        class_dictionary: Some(classes),
        mixed_case_class_names: false,
        ..presets::standard(absent_keep())
    };
    Obfuscator::new(config).run(&mut pool).unwrap();

    let mut names = vec![
        member(&pool, "p/Holder", "first", "I").final_name(),
        member(&pool, "p/Holder", "second", "I").final_name(),
    ];
    names.sort_unstable();
    assert_eq!(names, ["alpha", "beta"]);
    // Mixed-case words are dropped from lowercase dictionaries.
    assert_eq!(final_class_name(&pool, "p/Holder"), "a/yak");
}

#[test]
fn test_class_strings_follow_renamed_classes() {
    fixtures::init_tracing();
    let mut pool = fixtures::pool();
    let config = ObfuscationConfig {
        adapt_class_strings: true,
        ..presets::standard(fixtures::keep_main())
    };
    let result = Obfuscator::new(config).run(&mut pool).unwrap();

    let square = final_class_name(&pool, "com/acme/geo/Square").replace('/', ".");
    let main = pool.get(pool.lookup("com/acme/app/Main").unwrap());
    let strings: Vec<&str> = main
        .constants
        .iter()
        .filter_map(|c| match c {
            Constant::String { value } => Some(value.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(strings, [square.as_str()]);
    assert_eq!(result.rewrite.strings, 1);
}

#[test]
fn test_references_and_inner_classes_use_final_names() {
    fixtures::init_tracing();
    let mut pool = fixtures::pool();
    Obfuscator::new(presets::standard(fixtures::keep_main()))
        .run(&mut pool)
        .unwrap();

    let circle = final_class_name(&pool, "com/acme/geo/Circle").to_string();
    let area = member(&pool, "com/acme/geo/Circle", "area", "()D").final_name().to_string();
    let label = member(&pool, "com/acme/geo/AbstractShape", "label", "Ljava/lang/String;")
        .final_name()
        .to_string();
    let main = pool.get(pool.lookup("com/acme/app/Main").unwrap());
    assert!(main.constants.contains(&Constant::Class {
        name: circle.clone()
    }));
    assert!(main.constants.contains(&Constant::MethodRef {
        owner: circle.clone(),
        name: area,
        descriptor: "()D".into(),
        interface: false,
    }));
    // Resolved through the superclass.
    assert!(main.constants.contains(&Constant::FieldRef {
        owner: circle,
        name: label,
        descriptor: "Ljava/lang/String;".into(),
    }));

    let square = final_class_name(&pool, "com/acme/geo/Square");
    let builder = final_class_name(&pool, "com/acme/geo/Square$Builder");
    assert!(builder.starts_with(&format!("{square}$")), "{builder}");
}

#[test]
fn test_parameter_names_are_replaced() {
    fixtures::init_tracing();
    let mut pool = fixtures::pool();
    let result = Obfuscator::new(presets::standard(fixtures::keep_main()))
        .run(&mut pool)
        .unwrap();

    let scale = member(&pool, "com/acme/geo/Circle", "scale", "(D)Lcom/acme/geo/Circle;");
    assert_eq!(scale.parameter_names, ["p0"]);
    assert_eq!(result.rewrite.parameters, 2);
}

#[derive(Debug)]
struct KeepNamedGetters;

impl SymbolFilter for KeepNamedGetters {
    fn keeps_class(&self, _pool: &ClassPool, _hierarchy: &Hierarchy, _class: ClassId) -> bool {
        false
    }

    fn keeps_member(
        &self,
        _pool: &ClassPool,
        _hierarchy: &Hierarchy,
        _class: ClassId,
        member: &Member,
    ) -> bool {
        member.name.starts_with("get")
    }
}

#[test]
fn test_custom_filter_keeps_members() {
    fixtures::init_tracing();
    let program = vec![ClassNode::new("a/Bean")
        .with_member(Member::method("getSize", "()I").public())
        .with_member(Member::method("resize", "(I)V").public())];
    let mut pool = ClassPool::new(program, vec![]);
    let result = Obfuscator::new(ObfuscationConfig::default())
        .with_filter(Box::new(KeepNamedGetters))
        .run(&mut pool)
        .unwrap();

    assert_eq!(member(&pool, "a/Bean", "getSize", "()I").final_name(), "getSize");
    assert_ne!(member(&pool, "a/Bean", "resize", "(I)V").final_name(), "resize");
    assert_eq!(result.seeds.members, 1);
}
