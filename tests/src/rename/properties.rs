use crate::fixtures::{self, assert_no_collisions, final_class_name, member};
use obscura_core::{Hierarchy, Linkage};
use obscura_rename::{presets, ObfuscationConfig, Obfuscator};

fn run(config: ObfuscationConfig) -> (obscura_core::ClassPool, obscura_rename::ObfuscationResult) {
    fixtures::init_tracing();
    let mut pool = fixtures::pool();
    let result = Obfuscator::new(config).run(&mut pool).unwrap();
    (pool, result)
}

#[test]
fn test_overriding_methods_share_final_names() {
    let (pool, _) = run(presets::standard(fixtures::keep_main()));

    let area = member(&pool, "com/acme/geo/Shape", "area", "()D").final_name();
    assert_ne!(area, "area");
    assert_eq!(member(&pool, "com/acme/geo/Circle", "area", "()D").final_name(), area);
    assert_eq!(member(&pool, "com/acme/geo/Square", "area", "()D").final_name(), area);
    assert_eq!(
        member(&pool, "com/acme/geo/AbstractShape", "name", "()Ljava/lang/String;").final_name(),
        member(&pool, "com/acme/geo/Shape", "name", "()Ljava/lang/String;").final_name()
    );

    // Every link group ends up with one name.
    let hierarchy = Hierarchy::build(&pool);
    let linkage = Linkage::link(&pool, &hierarchy, false);
    for (_, group) in linkage.groups() {
        let mut names = group.members.iter().map(|&id| pool.member(id).final_name());
        let first = names.next().unwrap();
        assert!(names.all(|name| name == first));
    }
}

#[test]
fn test_no_collisions_in_any_mode() {
    let configs = [
        presets::standard(fixtures::keep_main()),
        presets::unique(fixtures::keep_main()),
        presets::repackaged(fixtures::keep_main(), "o"),
        ObfuscationConfig {
            overload_aggressively: true,
            ..presets::standard(fixtures::keep_main())
        },
    ];
    for config in configs {
        let aggressive = config.overload_aggressively;
        let (pool, _) = run(config);
        assert_no_collisions(&pool, aggressive);

        let mut classes: Vec<&str> = pool.classes().map(|c| c.final_name()).collect();
        let total = classes.len();
        classes.sort_unstable();
        classes.dedup();
        assert_eq!(classes.len(), total);
    }
}

#[test]
fn test_kept_symbols_keep_their_names() {
    let (pool, result) = run(presets::standard(fixtures::keep_main()));

    assert_eq!(final_class_name(&pool, "com/acme/app/Main"), "com/acme/app/Main");
    assert_eq!(
        member(&pool, "com/acme/app/Main", "main", "([Ljava/lang/String;)V").final_name(),
        "main"
    );
    assert_eq!(member(&pool, "com/acme/geo/Circle", "<init>", "(D)V").final_name(), "<init>");
    // Overrides a library method.
    assert_eq!(
        member(&pool, "com/acme/geo/AbstractShape", "toString", "()Ljava/lang/String;")
            .final_name(),
        "toString"
    );
    assert_eq!(member(&pool, "com/acme/task/Job", "run", "()V").final_name(), "run");
    // Bound by name from an invokedynamic call site.
    assert_eq!(member(&pool, "com/acme/task/Callback", "done", "(I)V").final_name(), "done");
    assert_eq!(result.seeds.call_site_targets, 1);

    for class in pool.classes().filter(|c| c.library) {
        assert!(!class.is_renamed());
        assert!(class.members.iter().all(|m| !m.is_renamed()));
    }
    assert_ne!(final_class_name(&pool, "com/acme/geo/Circle"), "com/acme/geo/Circle");
    assert!(result.warnings.is_empty());
}

#[test]
fn test_runs_are_deterministic() {
    let (_, first) = run(presets::standard(fixtures::keep_main()));
    let (_, second) = run(presets::standard(fixtures::keep_main()));
    assert_eq!(first.mapping.to_string(), second.mapping.to_string());

    let (_, first) = run(presets::unique(fixtures::keep_main()));
    let (_, second) = run(presets::unique(fixtures::keep_main()));
    assert_eq!(first.mapping.to_string(), second.mapping.to_string());
}

#[test]
fn test_applying_a_mapping_reproduces_it() {
    let (_, first) = run(presets::standard(fixtures::keep_main()));

    fixtures::init_tracing();
    let mut pool = fixtures::pool();
    let second = Obfuscator::new(presets::standard(fixtures::keep_main()))
        .with_mapping(first.mapping.clone())
        .run(&mut pool)
        .unwrap();

    assert_eq!(second.mapping.to_string(), first.mapping.to_string());
    assert!(second.warnings.is_empty());
    // Everything was named by the mapping.
    assert_eq!(second.allocation.non_private + second.allocation.private, 0);
}

#[test]
#[should_panic(expected = "p/C sees")]
fn test_collision_check_covers_sibling_interfaces() {
    let program = vec![
        obscura_core::ClassNode::new("p/I1")
            .interface()
            .with_member(obscura_core::Member::method("alpha", "()V").public().abstract_()),
        obscura_core::ClassNode::new("p/I2")
            .interface()
            .with_member(obscura_core::Member::method("beta", "()V").public().abstract_()),
        obscura_core::ClassNode::new("p/C")
            .abstract_()
            .implements("p/I1")
            .implements("p/I2"),
    ];
    let mut pool = obscura_core::ClassPool::new(program, vec![]);
    for class in ["p/I1", "p/I2"] {
        let id = pool.lookup(class).unwrap();
        pool.get_mut(id).members[0].new_name = Some("a".to_string());
    }
    assert_no_collisions(&pool, false);
}
