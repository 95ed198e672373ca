use materialize::{Context, Error, Factory, Materializer};
use std::sync::{Arc, OnceLock};

trait Fooer: Send + Sync {
    fn foo(&self) -> &'static str;
}

struct Foo;
impl Fooer for Foo {
    fn foo(&self) -> &'static str {
        "Foo"
    }
}

struct FooBar;
impl Fooer for FooBar {
    fn foo(&self) -> &'static str {
        "FooBar"
    }
}

fn foo_materializer() -> Materializer {
    let m = Materializer::new();
    m.add(Factory::new(|| Arc::new(Foo)).provides::<dyn Fooer>(|f| f as Arc<dyn Fooer>))
        .unwrap();
    m.add(
        Factory::new(|| Arc::new(Foo))
            .tags(["foo"])
            .provides::<dyn Fooer>(|f| f as Arc<dyn Fooer>),
    )
    .unwrap();
    m.add(
        Factory::new(|| Arc::new(FooBar))
            .tags(["foo", "bar"])
            .provides::<dyn Fooer>(|f| f as Arc<dyn Fooer>),
    )
    .unwrap();
    m
}

#[test]
fn test_best_match_across_types() {
    let m = foo_materializer();
    assert_eq!(m.materialize_dyn::<dyn Fooer>(&["foo", "bar"]).unwrap().foo(), "FooBar");
    assert_eq!(m.materialize_dyn::<dyn Fooer>(&["foo"]).unwrap().foo(), "Foo");
    assert_eq!(m.materialize_dyn::<dyn Fooer>(&[]).unwrap().foo(), "Foo");
}

#[test]
fn test_capability_shares_the_concrete_instance() {
    let m = foo_materializer();
    let concrete = m.materialize::<FooBar>(&["foo", "bar"]).unwrap();
    let capability = m.materialize_dyn::<dyn Fooer>(&["foo", "bar"]).unwrap();

    let concrete_ptr = Arc::as_ptr(&concrete) as *const u8;
    let capability_ptr = Arc::as_ptr(&capability) as *const u8;
    assert_eq!(concrete_ptr, capability_ptr);
}

#[test]
fn test_concrete_request_does_not_scan() {
    let m = Materializer::new();
    m.add(Factory::new(|| Arc::new(Foo)).provides::<dyn Fooer>(|f| f as Arc<dyn Fooer>))
        .unwrap();

    assert!(m.materialize::<FooBar>(&[]).is_err());
    assert!(m.materialize_dyn::<dyn Fooer>(&[]).is_ok());
}

#[test]
fn test_undeclared_capability_is_not_found() {
    let m = Materializer::new();
    m.add(Factory::new(|| Arc::new(Foo))).unwrap();

    let err = m.materialize_dyn::<dyn Fooer>(&[]).err().unwrap();
    assert!(matches!(err, Error::NotFound { type_name, .. } if type_name.contains("Fooer")));
}

#[test]
fn test_declaration_covers_every_factory_of_the_type() {
    let m = Materializer::new();
    m.add(Factory::new(|| Arc::new(FooBar)).tags(["x"])).unwrap();
    m.add(
        Factory::new(|| Arc::new(FooBar))
            .tags(["y"])
            .provides::<dyn Fooer>(|f| f as Arc<dyn Fooer>),
    )
    .unwrap();

    // The "x" factory never declared the capability itself.
    let picked = m.materialize_dyn::<dyn Fooer>(&["x"]).unwrap();
    let direct = m.materialize::<FooBar>(&["x"]).unwrap();
    assert_eq!(Arc::as_ptr(&picked) as *const u8, Arc::as_ptr(&direct) as *const u8);
}

#[test]
fn test_direct_capability_factory_competes() {
    struct Direct;
    impl Fooer for Direct {
        fn foo(&self) -> &'static str {
            "Direct"
        }
    }

    let m = foo_materializer();
    m.add(Factory::new(|| Arc::new(Direct) as Arc<dyn Fooer>).tags(["direct"]))
        .unwrap();

    assert_eq!(m.materialize_dyn::<dyn Fooer>(&["direct"]).unwrap().foo(), "Direct");
    assert_eq!(m.materialize_dyn::<dyn Fooer>(&["bar"]).unwrap().foo(), "FooBar");
}

#[test]
fn test_capability_dependencies_and_receivers() {
    struct Consumer {
        fooer: OnceLock<Arc<dyn Fooer>>,
    }

    let m = foo_materializer();
    m.add(Factory::with_context(|cx: &mut Context<'_>| {
        let consumer = Arc::new(Consumer { fooer: OnceLock::new() });
        cx.materialize_dyn_into(&consumer.fooer, &["foo", "bar"]);
        consumer
    }))
    .unwrap();

    let consumer = m.materialize::<Consumer>(&[]).unwrap();
    assert_eq!(consumer.fooer.get().unwrap().foo(), "FooBar");

    let mut slot: Option<Arc<dyn Fooer>> = None;
    m.materialize_dyn_into(&mut slot, &["foo"]).unwrap();
    assert_eq!(slot.unwrap().foo(), "Foo");
}
