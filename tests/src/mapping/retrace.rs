use crate::fixtures;
use obscura_mapping::{parse, Retracer, StackFrame};
use obscura_rename::{presets, Obfuscator};

#[test]
fn test_retrace_frames_of_an_obfuscated_run() {
    fixtures::init_tracing();
    let mut pool = fixtures::pool();
    let result = Obfuscator::new(presets::standard(fixtures::keep_main()))
        .run(&mut pool)
        .unwrap();

    let circle = result.mapping.class("com.acme.geo.Circle").unwrap();
    let area = circle
        .methods()
        .find(|m| m.original == "area")
        .unwrap()
        .obfuscated
        .clone();
    let scale = circle.methods().find(|m| m.original == "scale").unwrap();
    // Distinct descriptors may share one obfuscated name; lines tell them apart.
    assert_eq!(scale.obfuscated, area);

    let trace = format!(
        "java.lang.ArithmeticException: / by zero\n\tat {0}.{1}(SourceFile:8)\n\tat {0}.{1}(SourceFile:12)\n\tat com.acme.app.Main.main(SourceFile:3)\n",
        circle.obfuscated, area
    );
    let retracer = Retracer::new(&result.mapping);
    let output = retracer.remap_stacktrace(&trace).unwrap();
    assert_eq!(
        output,
        "java.lang.ArithmeticException: / by zero\n\
         \tat com.acme.geo.Circle.area(SourceFile:8)\n\
         \tat com.acme.geo.Circle.scale(SourceFile:12)\n\
         \tat com.acme.app.Main.main(SourceFile:3)\n"
    );
}

#[test]
fn test_retrace_inlined_frames_and_headers() {
    let mapping = parse(
        "com.acme.Main -> a:\n\
         \x20   1:3:void helper():40:42 -> a\n\
         \x20   1:3:void com.acme.Util.inner():7:7 -> a\n\
         \x20   4:9:void run() -> a\n\
         com.acme.Failure -> b:\n",
    )
    .unwrap();
    let retracer = Retracer::new(&mapping);

    let frames = retracer.remap_frame(&StackFrame::new("a", "a", 2));
    let names: Vec<(&str, &str, u32)> = frames
        .iter()
        .map(|f| (f.class.as_str(), f.method.as_str(), f.line))
        .collect();
    assert_eq!(
        names,
        [("com.acme.Main", "helper", 41), ("com.acme.Util", "inner", 7)]
    );

    let output = retracer
        .remap_stacktrace("Caused by: b: broken\n\tat a.a(SourceFile:5)\n\tat x.y(Other.java:1)\n")
        .unwrap();
    assert_eq!(
        output,
        "Caused by: com.acme.Failure: broken\n\tat com.acme.Main.run(SourceFile:5)\n\tat x.y(Other.java:1)\n"
    );
}

#[test]
fn test_retrace_fields_by_declared_type() {
    let mapping = parse(
        "com.acme.Node -> a:\n\
         \x20   int count -> a\n\
         \x20   com.acme.Node next -> a\n",
    )
    .unwrap();
    let retracer = Retracer::new(&mapping);

    assert_eq!(
        retracer.remap_field("a", "a", Some("a")),
        Some(("com.acme.Node", "next"))
    );
    assert_eq!(
        retracer.remap_field("a", "a", Some("int")),
        Some(("com.acme.Node", "count"))
    );
    // Without a type the first record wins.
    assert_eq!(
        retracer.remap_field("a", "a", None),
        Some(("com.acme.Node", "count"))
    );
    assert_eq!(retracer.remap_field("a", "b", None), None);
    assert_eq!(retracer.remap_type("a[][]"), "com.acme.Node[][]");
}

#[test]
fn test_overloads_sharing_a_name_retrace_to_one_frame() {
    let mapping = parse(
        "com.example.Main -> a.a:\n\
         \x20   0:0:void foo() -> a\n\
         \x20   0:0:void foo(int) -> a\n\
         \x20   0:0:void bar(long) -> a\n",
    )
    .unwrap();
    let retracer = Retracer::new(&mapping);

    let frames = retracer.remap_frame(&StackFrame::new("a.a", "a", 5));
    assert_eq!(frames.len(), 1);
    assert_eq!((frames[0].class.as_str(), frames[0].method.as_str()), ("com.example.Main", "foo"));

    let output = retracer
        .remap_stacktrace("java.lang.Error\n\tat a.a.a(SourceFile:5)\n")
        .unwrap();
    assert_eq!(output, "java.lang.Error\n\tat com.example.Main.foo(SourceFile:5)\n");
}

#[test]
fn test_engine_overloads_without_lines_retrace_to_one_frame() {
    fixtures::init_tracing();
    let program = vec![obscura_core::ClassNode::new("com/acme/Calc")
        .with_member(obscura_core::Member::method("add", "(I)V").public())
        .with_member(obscura_core::Member::method("add", "(J)V").public())];
    let mut pool = obscura_core::ClassPool::new(program, vec![]);
    let config = presets::standard(vec![obscura_core::KeepRule::class("com.acme.Main").unwrap()]);
    let result = Obfuscator::new(config).run(&mut pool).unwrap();

    let calc = result.mapping.class("com.acme.Calc").unwrap();
    let names: Vec<&str> = calc.methods().map(|m| m.obfuscated.as_str()).collect();
    // Different argument lists may share one name.
    assert_eq!(names[0], names[1]);
    let frame = StackFrame::new(&calc.obfuscated, names[0], 7);
    let frames = Retracer::new(&result.mapping).remap_frame(&frame);
    assert_eq!(frames, vec![StackFrame::new("com.acme.Calc", "add", 7)]);
}
