use obscura_core::descriptor::overload_key;
use obscura_core::{ClassNode, ClassPool, Constant, Hierarchy, KeepRule, Member, MemberKind};
use std::collections::HashMap;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn library() -> Vec<ClassNode> {
    vec![
        ClassNode::new("java/lang/Object")
            .with_member(Member::method("<init>", "()V").public())
            .with_member(Member::method("toString", "()Ljava/lang/String;").public())
            .with_member(Member::method("hashCode", "()I").public()),
        ClassNode::new("java/lang/Runnable")
            .interface()
            .with_member(Member::method("run", "()V").public().abstract_()),
    ]
}

/// A small geometry program with an interface, an abstract base, two subclasses,
/// an inner class, a library override and a lambda target.
pub fn program() -> Vec<ClassNode> {
    vec![
        ClassNode::new("com/acme/app/Main")
            .extends("java/lang/Object")
            .with_member(Member::method("<init>", "()V").public())
            .with_member(Member::method("main", "([Ljava/lang/String;)V").public().static_())
            .with_member(
                Member::method("report", "(Lcom/acme/geo/Shape;)Ljava/lang/String;")
                    .private()
                    .static_()
                    .with_parameters(&["shape"]),
            )
            .with_constant(Constant::Class {
                name: "com/acme/geo/Circle".into(),
            })
            .with_constant(Constant::MethodRef {
                owner: "com/acme/geo/Circle".into(),
                name: "area".into(),
                descriptor: "()D".into(),
                interface: false,
            })
            .with_constant(Constant::MethodRef {
                owner: "com/acme/geo/Circle".into(),
                name: "name".into(),
                descriptor: "()Ljava/lang/String;".into(),
                interface: false,
            })
            .with_constant(Constant::FieldRef {
                owner: "com/acme/geo/Circle".into(),
                name: "label".into(),
                descriptor: "Ljava/lang/String;".into(),
            })
            .with_constant(Constant::InvokeDynamic {
                name: "done".into(),
                descriptor: "()Lcom/acme/task/Callback;".into(),
            })
            .with_constant(Constant::String {
                value: "com.acme.geo.Square".into(),
            }),
        ClassNode::new("com/acme/geo/Shape")
            .interface()
            .with_member(Member::method("area", "()D").public().abstract_())
            .with_member(Member::method("name", "()Ljava/lang/String;").public().abstract_()),
        ClassNode::new("com/acme/geo/AbstractShape")
            .abstract_()
            .extends("java/lang/Object")
            .implements("com/acme/geo/Shape")
            .with_member(Member::field("id", "I").private())
            .with_member(Member::field("label", "Ljava/lang/String;").protected())
            .with_member(Member::method("<init>", "()V").protected())
            .with_member(
                Member::method("name", "()Ljava/lang/String;")
                    .public()
                    .with_lines(12, 14),
            )
            .with_member(Member::method("describe", "()V").public().with_lines(16, 20))
            .with_member(
                Member::method("toString", "()Ljava/lang/String;")
                    .public()
                    .with_lines(22, 24),
            ),
        ClassNode::new("com/acme/geo/Circle")
            .extends("com/acme/geo/AbstractShape")
            .with_member(Member::field("radius", "D").private())
            .with_member(Member::method("<init>", "(D)V").public())
            .with_member(Member::method("area", "()D").public().with_lines(8, 9))
            .with_member(
                Member::method("scale", "(D)Lcom/acme/geo/Circle;")
                    .public()
                    .with_lines(11, 13)
                    .with_parameters(&["factor"]),
            ),
        ClassNode::new("com/acme/geo/Square")
            .extends("com/acme/geo/AbstractShape")
            .with_member(Member::field("side", "D").private())
            .with_member(Member::method("area", "()D").public().with_lines(7, 7))
            .with_member(Member::method("grow", "(I)V").with_lines(9, 10)),
        ClassNode::new("com/acme/geo/Square$Builder")
            .inner_of("com/acme/geo/Square")
            .extends("java/lang/Object")
            .with_member(Member::field("side", "D").private())
            .with_member(Member::method("build", "()Lcom/acme/geo/Square;").public()),
        ClassNode::new("com/acme/task/Callback")
            .interface()
            .with_member(Member::method("done", "(I)V").public().abstract_()),
        ClassNode::new("com/acme/task/Job")
            .extends("java/lang/Object")
            .implements("java/lang/Runnable")
            .with_member(Member::method("run", "()V").public())
            .with_member(Member::method("execute", "()V").public()),
    ]
}

pub fn pool() -> ClassPool {
    ClassPool::new(program(), library())
}

pub fn keep_main() -> Vec<KeepRule> {
    vec![KeepRule::class("com.acme.app.Main")
        .and_then(|rule| rule.with_member(Some(MemberKind::Method), "main", None))
        .unwrap()]
}

/// The member `name` + `descriptor` declared by `class`.
pub fn member<'p>(pool: &'p ClassPool, class: &str, name: &str, descriptor: &str) -> &'p Member {
    let node = pool.get(pool.lookup(class).unwrap());
    let index = node.find_member(name, descriptor).unwrap();
    &node.members[index]
}

pub fn final_class_name<'p>(pool: &'p ClassPool, class: &str) -> &'p str {
    pool.get(pool.lookup(class).unwrap()).final_name()
}

/// Checks that no class sees two different original members under one
/// `(overload key, final name)`: its own members plus the non-private members of
/// its ancestors.
pub fn assert_no_collisions(pool: &ClassPool, aggressive: bool) {
    let hierarchy = Hierarchy::build(pool);
    for class in pool.program_ids() {
        let mut seen: HashMap<(String, String), String> = HashMap::new();
        let own = pool.member_ids(class);
        let inherited = hierarchy
            .ancestors(class)
            .into_iter()
            .flat_map(|ancestor| pool.member_ids(ancestor))
            .filter(|&id| !pool.member(id).is_private());
        for id in own.chain(inherited) {
            let member = pool.member(id);
            let key = (
                overload_key(&member.descriptor, aggressive).to_string(),
                member.final_name().to_string(),
            );
            if let Some(previous) = seen.insert(key.clone(), member.name.clone()) {
                assert_eq!(
                    previous, member.name,
                    "{} sees `{}` and `{}` as {:?}",
                    pool.get(class).name, previous, member.name, key
                );
            }
        }
    }
}
