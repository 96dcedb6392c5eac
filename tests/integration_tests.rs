//! Integration tests for the pullup-gen crate.

use pretty_assertions::assert_eq;
use pullup_gen::generify::can_generify;
use pullup_gen::model::outline::class_outline;
use pullup_gen::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_sources(dir: &Path, files: &[(&str, &str)]) {
    fs::create_dir_all(dir.join("zoo")).unwrap();
    for (name, source) in files {
        fs::write(dir.join("zoo").join(name), source).unwrap();
    }
}

fn create_zoo(dir: &Path) {
    write_sources(
        dir,
        &[
            ("Animal.java", "abstract class Animal {\n}\n"),
            (
                "Dog.java",
                "class Dog extends Animal {\n    public void bark() {}\n    public void feed(Bone food) {}\n}\n",
            ),
            (
                "Cat.java",
                "class Cat extends Animal {\n    public void bark() {}\n    public void feed(Fish food) {}\n}\n",
            ),
            ("Bone.java", "class Bone {}\n"),
            ("Fish.java", "class Fish {}\n"),
        ],
    );
}

fn outline_of(ws: &Workspace, name: &str) -> String {
    class_outline(ws, ws.require_class(name).unwrap())
}

fn names(ws: &Workspace, classes: impl IntoIterator<Item = ClassId>) -> Vec<String> {
    let mut names: Vec<_> = classes
        .into_iter()
        .map(|c| ws.class_name(c).to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_identical_signatures_need_no_type_parameter() {
    let dir = TempDir::new().unwrap();
    create_zoo(dir.path());

    let result = Refactor::in_dir(dir.path())
        .run("Dog", &PullUpGeneric::new("Animal").method("bark"))
        .unwrap();
    assert!(result.result.success);

    let ws = &result.workspace;
    assert_eq!(
        outline_of(ws, "Animal"),
        "abstract class Animal {\n    public abstract void bark();\n}\n"
    );
    assert!(outline_of(ws, "Dog").starts_with("class Dog extends Animal {\n"));
    assert!(outline_of(ws, "Cat").contains("    @Override\n    public void bark() { ... }\n"));
}

#[test]
fn test_divergent_parameter_types_introduce_type_parameter() {
    let dir = TempDir::new().unwrap();
    create_zoo(dir.path());

    let result = Refactor::in_dir(dir.path())
        .run("Dog", &PullUpGeneric::new("Animal").method("feed"))
        .unwrap();
    assert!(result.result.success);

    let ws = &result.workspace;
    assert_eq!(
        outline_of(ws, "Animal"),
        "abstract class Animal<TFeed0> {\n    public abstract void feed(TFeed0 food);\n}\n"
    );
    assert!(outline_of(ws, "Dog").starts_with("class Dog extends Animal<Bone> {\n"));
    assert!(outline_of(ws, "Cat").starts_with("class Cat extends Animal<Fish> {\n"));
    assert_eq!(result.classes_modified(), 3);
}

#[test]
fn test_dry_run_keeps_workspace_and_reports_diff() {
    let dir = TempDir::new().unwrap();
    create_zoo(dir.path());

    let result = Refactor::in_dir(dir.path())
        .dry_run()
        .run("Dog", &PullUpGeneric::new("Animal").method("feed"))
        .unwrap();

    assert_eq!(
        outline_of(&result.workspace, "Animal"),
        "abstract class Animal {\n}\n"
    );
    let diff = result.diff();
    assert!(diff.contains("-abstract class Animal {"));
    assert!(diff.contains("+abstract class Animal<TFeed0> {"));
    assert!(diff.contains("+class Dog extends Animal<Bone> {"));
    assert_eq!(result.summary.classes_changed, 3);

    let source = fs::read_to_string(dir.path().join("zoo/Animal.java")).unwrap();
    assert_eq!(source, "abstract class Animal {\n}\n");
}

#[test]
fn test_member_table_reports_eligibility() {
    let dir = TempDir::new().unwrap();
    create_zoo(dir.path());
    fs::write(
        dir.path().join("zoo/Dog.java"),
        "class Dog extends Animal {\n    public void bark() {}\n    public void feed(Bone food) {}\n    public void weigh(int grams) {}\n    public void dig() {}\n}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("zoo/Cat.java"),
        "class Cat extends Animal {\n    public void bark() {}\n    public void feed(Fish food) {}\n    public void weigh(long grams) {}\n}\n",
    )
    .unwrap();

    let ws = JavaLoader::new().load_dir(dir.path()).unwrap();
    let dog = ws.require_class("Dog").unwrap();
    let animal = ws.require_class("Animal").unwrap();
    let scope = ws.class(dog).directory.clone();

    let mut table = MemberTable::for_class(&ws, dog);
    table.refresh(&ws, animal, Some(&scope)).unwrap();

    let verdicts: Vec<_> = table
        .rows()
        .iter()
        .map(|row| (row.display.as_str(), row.can_make_abstract))
        .collect();
    assert_eq!(
        verdicts,
        vec![
            ("bark(): void", CanMakeAbstract::YesPlain),
            ("feed(Bone): void", CanMakeAbstract::YesGenerics),
            ("weigh(int): void", CanMakeAbstract::No),
            ("dig(): void", CanMakeAbstract::No),
        ]
    );
    let dig = &table.rows()[3];
    assert_eq!(
        dig.failure,
        Some(MemberFailure::MemberNotImplemented {
            member: "dig".to_string(),
            class: "Cat".to_string(),
        })
    );
}

#[test]
fn test_batch_continues_past_failed_members() {
    let dir = TempDir::new().unwrap();
    create_zoo(dir.path());
    fs::write(
        dir.path().join("zoo/Dog.java"),
        "class Dog extends Animal {\n    public void feed(Bone food) {}\n    public void dig() {}\n}\n",
    )
    .unwrap();

    let result = Refactor::in_dir(dir.path())
        .run(
            "Dog",
            &PullUpGeneric::new("Animal").method("feed").method("dig"),
        )
        .unwrap();

    assert!(!result.result.success);
    let failures: Vec<_> = result.result.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].display, "dig(): void");
    assert!(outline_of(&result.workspace, "Animal").contains("public abstract void feed(TFeed0 food);"));
}

fn create_branching_hierarchy(dir: &Path, b2_body: &str) {
    write_sources(
        dir,
        &[
            ("S.java", "abstract class S {}\n"),
            ("A.java", "class A extends S {\n    public int foo(Foo f) { return 0; }\n}\n"),
            ("B.java", "abstract class B extends S {}\n"),
            ("B1.java", "class B1 extends B {\n    public int foo(Bar b) { return 1; }\n}\n"),
            ("B2.java", &format!("class B2 extends B {{\n{b2_body}}}\n")),
        ],
    );
}

#[test]
fn test_coverage_spans_every_branch() {
    let dir = TempDir::new().unwrap();
    create_branching_hierarchy(dir.path(), "    public int foo(Baz z) { return 2; }\n");

    let ws = JavaLoader::new().load_dir(dir.path()).unwrap();
    let a = ws.require_class("A").unwrap();
    let s = ws.require_class("S").unwrap();
    let scope = ws.class(a).directory.clone();
    let foo = MemberRef::Method {
        id: ws.require_method(a, "foo").unwrap(),
    };

    let coverage = compute_can_generify(&ws, &foo, s, Some(&scope)).unwrap();
    assert_eq!(names(&ws, coverage.sisters()), vec!["A", "B1", "B2"]);
    assert_eq!(names(&ws, coverage.intermediates.iter().copied()), vec!["B"]);
}

#[test]
fn test_intermediate_class_forwards_new_parameter() {
    let dir = TempDir::new().unwrap();
    create_branching_hierarchy(dir.path(), "    public int foo(Baz z) { return 2; }\n");

    let result = Refactor::in_dir(dir.path())
        .run("A", &PullUpGeneric::new("S").method("foo"))
        .unwrap();
    assert!(result.result.success);

    let ws = &result.workspace;
    assert!(outline_of(ws, "S").starts_with("abstract class S<TFoo0> {\n"));
    assert!(outline_of(ws, "A").starts_with("class A extends S<Foo> {\n"));
    let b = ws.class(ws.require_class("B").unwrap());
    assert_eq!(b.type_params.len(), 1);
    assert!(outline_of(ws, "B1").starts_with("class B1 extends B<Bar> {\n"));
    assert!(outline_of(ws, "B2").starts_with("class B2 extends B<Baz> {\n"));
}

#[test]
fn test_missing_branch_is_not_generifiable() {
    let dir = TempDir::new().unwrap();
    create_branching_hierarchy(dir.path(), "");

    let ws = JavaLoader::new().load_dir(dir.path()).unwrap();
    let a = ws.require_class("A").unwrap();
    let s = ws.require_class("S").unwrap();
    let scope = ws.class(a).directory.clone();
    let foo = MemberRef::Method {
        id: ws.require_method(a, "foo").unwrap(),
    };

    let err = compute_can_generify(&ws, &foo, s, Some(&scope)).unwrap_err();
    assert_eq!(
        err.as_member_failure(),
        Some(&MemberFailure::MemberNotImplemented {
            member: "foo".to_string(),
            class: "B2".to_string(),
        })
    );
    assert!(can_generify(&ws, &foo, s, Some(&scope)).is_none());
}

#[test]
fn test_ambiguous_overloads_are_rejected() {
    let dir = TempDir::new().unwrap();
    write_sources(
        dir.path(),
        &[
            ("S.java", "abstract class S {}\n"),
            ("A.java", "class A extends S {\n    public void foo(Foo f) {}\n    public void foo(Bar b) {}\n}\n"),
            ("C.java", "class C extends S {\n    public void foo(Baz z) {}\n}\n"),
        ],
    );

    let ws = JavaLoader::new().load_dir(dir.path()).unwrap();
    let c = ws.require_class("C").unwrap();
    let s = ws.require_class("S").unwrap();
    let scope = ws.class(c).directory.clone();
    let foo = MemberRef::Method {
        id: ws.require_method(c, "foo").unwrap(),
    };

    let err = compute_can_generify(&ws, &foo, s, Some(&scope)).unwrap_err();
    assert_eq!(
        err.as_member_failure(),
        Some(&MemberFailure::AmbiguousOverloading {
            member: "foo".to_string(),
            class: "A".to_string(),
        })
    );
}

#[test]
fn test_same_raw_type_recurses_into_arguments() {
    let dir = TempDir::new().unwrap();
    write_sources(
        dir.path(),
        &[
            ("S.java", "abstract class S {}\n"),
            ("A.java", "class A extends S {\n    public void foo(List<Foo> items) {}\n}\n"),
            ("B.java", "class B extends S {\n    public void foo(List<Bar> items) {}\n}\n"),
        ],
    );

    let ws = JavaLoader::new().load_dir(dir.path()).unwrap();
    let a = ws.require_class("A").unwrap();
    let s = ws.require_class("S").unwrap();
    let scope = ws.class(a).directory.clone();
    let method = ws.require_method(a, "foo").unwrap();

    let coverage =
        compute_can_generify(&ws, &MemberRef::Method { id: method }, s, Some(&scope)).unwrap();
    let plan = plan_generification(&ws, method, &coverage, s, &GenerifyConfig::default()).unwrap();

    assert_eq!(
        plan.skeleton.params[0].ty,
        JavaType::generic("List", vec![TypeParam::new("TFoo0").as_type_in("S")])
    );
    let group = plan.new_parameters.get(&TypeParam::new("TFoo0")).unwrap();
    let b = ws.require_class("B").unwrap();
    assert_eq!(group.get(a), Some(&JavaType::class("Foo")));
    assert_eq!(group.get(b), Some(&JavaType::class("Bar")));
    assert_eq!(plan.new_parameters.len(), 1);
}

#[test]
fn test_extract_superclass_from_sisters() {
    let dir = TempDir::new().unwrap();
    write_sources(
        dir.path(),
        &[
            ("Dog.java", "public class Dog {\n    public void feed(Bone food) {}\n}\n"),
            ("Cat.java", "public class Cat {\n    public void feed(Fish food) {}\n}\n"),
            ("Rock.java", "public class Rock {\n    public void roll() {}\n}\n"),
        ],
    );

    let result = Refactor::in_dir(dir.path())
        .run("Dog", &ExtractSuperclass::new("Animal").method("feed"))
        .unwrap();
    assert!(result.result.success);

    let ws = &result.workspace;
    assert_eq!(
        outline_of(ws, "Animal"),
        "public abstract class Animal<TFeed0> {\n    public abstract void feed(TFeed0 food);\n}\n"
    );
    assert!(outline_of(ws, "Dog").starts_with("public class Dog extends Animal<Bone> {\n"));
    assert!(outline_of(ws, "Cat").starts_with("public class Cat extends Animal<Fish> {\n"));
    assert!(outline_of(ws, "Rock").starts_with("public class Rock {\n"));
    assert!(
        result
            .changes
            .iter()
            .any(|c| c.path == dir.path().join("zoo").join("Animal.java"))
    );
}

#[test]
fn test_config_file_controls_names_and_exclusions() {
    let dir = TempDir::new().unwrap();
    create_zoo(dir.path());
    fs::create_dir_all(dir.path().join("generated")).unwrap();
    fs::write(
        dir.path().join("generated/Cow.java"),
        "class Cow extends Animal {\n}\n",
    )
    .unwrap();
    let config_path = dir.path().join("pullup-gen.yaml");
    fs::write(
        &config_path,
        "type_parameter_prefix: G\nadd_override_annotations: false\nrestrict_to_directory: false\nexclude_patterns:\n  - \"generated/**\"\n",
    )
    .unwrap();

    let config = GenerifyConfig::from_file(&config_path).unwrap();
    let result = Refactor::in_dir(dir.path())
        .with_config(config)
        .run("Dog", &PullUpGeneric::new("Animal").method("feed"))
        .unwrap();
    assert!(result.result.success);

    let ws = &result.workspace;
    assert!(ws.find_class("Cow").is_none());
    assert!(outline_of(ws, "Animal").starts_with("abstract class Animal<GFeed0> {\n"));
    assert!(!outline_of(ws, "Cat").contains("@Override"));
}

#[test]
fn test_same_named_class_type_variables_get_fresh_parameter() {
    let dir = TempDir::new().unwrap();
    write_sources(
        dir.path(),
        &[
            ("Animal.java", "abstract class Animal {\n}\n"),
            ("Dog.java", "class Dog<X> extends Animal {\n    public void feed(X food) {}\n}\n"),
            ("Cat.java", "class Cat<X> extends Animal {\n    public void feed(X food) {}\n}\n"),
        ],
    );

    let result = Refactor::in_dir(dir.path())
        .run("Dog", &PullUpGeneric::new("Animal").method("feed"))
        .unwrap();
    assert!(result.result.success);

    let ws = &result.workspace;
    assert_eq!(
        outline_of(ws, "Animal"),
        "abstract class Animal<TFeed0> {\n    public abstract void feed(TFeed0 food);\n}\n"
    );
    assert!(outline_of(ws, "Dog").starts_with("class Dog<X> extends Animal<X> {\n"));
    assert!(outline_of(ws, "Cat").starts_with("class Cat<X> extends Animal<X> {\n"));
}

#[test]
fn test_generic_methods_pull_up_up_to_renaming() {
    let dir = TempDir::new().unwrap();
    write_sources(
        dir.path(),
        &[
            ("Animal.java", "abstract class Animal {\n}\n"),
            ("Dog.java", "class Dog extends Animal {\n    public <U> void feed(U food) {}\n}\n"),
            ("Cat.java", "class Cat extends Animal {\n    public <V> void feed(V food) {}\n}\n"),
        ],
    );

    let result = Refactor::in_dir(dir.path())
        .run("Dog", &PullUpGeneric::new("Animal").method("feed"))
        .unwrap();
    assert!(result.result.success);
    assert_eq!(
        outline_of(&result.workspace, "Animal"),
        "abstract class Animal {\n    public abstract <U> void feed(U food);\n}\n"
    );
    assert!(outline_of(&result.workspace, "Cat").starts_with("class Cat extends Animal {\n"));
}

#[test]
fn test_method_type_variable_stays_out_of_class_headers() {
    let dir = TempDir::new().unwrap();
    write_sources(
        dir.path(),
        &[
            ("Animal.java", "abstract class Animal {\n}\n"),
            ("Dog.java", "class Dog extends Animal {\n    public <U> void feed(U food) {}\n}\n"),
            ("Cat.java", "class Cat extends Animal {\n    public void feed(Fish food) {}\n}\n"),
        ],
    );

    let result = Refactor::in_dir(dir.path())
        .run("Dog", &PullUpGeneric::new("Animal").method("feed"))
        .unwrap();
    assert!(!result.result.success);
    let failures: Vec<_> = result.result.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0].failure(),
        Some(MemberFailure::MethodTypeVariable { .. })
    ));

    let ws = &result.workspace;
    assert_eq!(outline_of(ws, "Animal"), "abstract class Animal {\n}\n");
    assert!(outline_of(ws, "Dog").starts_with("class Dog extends Animal {\n"));
}

fn create_pets(dir: &Path, robo_body: &str) {
    write_sources(
        dir,
        &[
            ("Pet.java", "interface Pet {\n}\n"),
            ("Dog.java", "class Dog implements Pet {\n    public void feed(Bone food) {}\n}\n"),
            ("Cat.java", "class Cat implements Pet {\n    public void feed(Fish food) {}\n}\n"),
            ("Robo.java", &format!("enum Robo implements Pet {{\n    A;\n{robo_body}}}\n")),
        ],
    );
}

#[test]
fn test_enum_implementor_counts_as_a_branch() {
    let dir = TempDir::new().unwrap();
    create_pets(dir.path(), "");

    let ws = JavaLoader::new().load_dir(dir.path()).unwrap();
    let dog = ws.require_class("Dog").unwrap();
    let pet = ws.require_class("Pet").unwrap();
    let scope = ws.class(dog).directory.clone();
    let feed = MemberRef::Method {
        id: ws.require_method(dog, "feed").unwrap(),
    };

    let err = compute_can_generify(&ws, &feed, pet, Some(&scope)).unwrap_err();
    assert_eq!(
        err.as_member_failure(),
        Some(&MemberFailure::MemberNotImplemented {
            member: "feed".to_string(),
            class: "Robo".to_string(),
        })
    );

    let err = Refactor::in_dir(dir.path())
        .run("Dog", &PullUpGeneric::new("Pet").method("feed"))
        .unwrap_err();
    assert!(matches!(err, GenerifyError::InvalidConfig(_)));
}

#[test]
fn test_enum_implementor_is_instantiated() {
    let dir = TempDir::new().unwrap();
    create_pets(dir.path(), "    public void feed(Battery cell) {}\n");

    let result = Refactor::in_dir(dir.path())
        .run("Dog", &PullUpGeneric::new("Pet").method("feed"))
        .unwrap();
    assert!(result.result.success);

    let ws = &result.workspace;
    assert!(outline_of(ws, "Pet").starts_with("interface Pet<TFeed0> {\n"));
    assert!(outline_of(ws, "Robo").starts_with("enum Robo implements Pet<Battery> {\n"));
    assert!(outline_of(ws, "Dog").starts_with("class Dog implements Pet<Bone> {\n"));
}
