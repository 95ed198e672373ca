use materialize::{BoxError, Context, Error, Factory, Materializer, TagSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Bar;

#[derive(Debug, thiserror::Error)]
#[error("no bars found")]
struct NoBars;

#[test]
fn test_factory_failure_names_type_and_cause() {
    let m = Materializer::new();
    m.add(Factory::new(|| -> Result<Arc<Bar>, NoBars> { Err(NoBars) }))
        .unwrap();

    let err = m.materialize::<Bar>(&[]).unwrap_err();
    assert!(matches!(err, Error::FactoryFailed { .. }));
    let message = err.to_string();
    assert!(message.contains("Bar"), "{message}");
    assert!(message.contains("no bars found"), "{message}");
}

#[test]
fn test_boxed_and_string_errors() {
    let m = Materializer::new();
    m.add(Factory::new(|| -> Result<Arc<u8>, BoxError> {
        Err("plain text".into())
    }))
    .unwrap();
    m.add(Factory::new(|| -> Result<Arc<u16>, String> {
        Err(String::from("owned text"))
    }))
    .unwrap();

    assert!(m.materialize::<u8>(&[]).unwrap_err().to_string().ends_with("failed: plain text"));
    assert!(m.materialize::<u16>(&[]).unwrap_err().to_string().ends_with("failed: owned text"));
}

#[test]
fn test_nil_product() {
    let m = Materializer::new();
    m.add(Factory::new(|| None::<Arc<Bar>>)).unwrap();
    m.add(Factory::new(|| -> Result<Option<Arc<u32>>, NoBars> { Ok(None) }))
        .unwrap();

    assert!(matches!(
        m.materialize::<Bar>(&[]).unwrap_err(),
        Error::NilProduct { .. }
    ));
    assert!(matches!(
        m.materialize::<u32>(&[]).unwrap_err(),
        Error::NilProduct { type_name: "u32" }
    ));
}

#[test]
fn test_failures_are_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let m = Materializer::new();
    m.add(Factory::new(move || -> Result<Arc<Bar>, NoBars> {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(NoBars)
        } else {
            Ok(Arc::new(Bar))
        }
    }))
    .unwrap();

    assert!(m.materialize::<Bar>(&[]).is_err());
    assert!(m.materialize::<Bar>(&[]).is_ok());
    assert!(m.materialize::<Bar>(&[]).is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_dependency_chain_is_recorded() {
    #[derive(Debug)]
    struct Top;
    #[derive(Debug)]
    struct Middle;

    let m = Materializer::new();
    m.add(Factory::new(|| -> Result<Arc<Bar>, NoBars> { Err(NoBars) }))
        .unwrap();
    m.add(Factory::with_context(|cx: &mut Context<'_>| -> materialize::Result<Arc<Middle>> {
        cx.materialize::<Bar>(&[])?;
        Ok(Arc::new(Middle))
    }))
    .unwrap();
    m.add(Factory::with_context(|cx: &mut Context<'_>| -> materialize::Result<Arc<Top>> {
        cx.materialize::<Middle>(&[])?;
        Ok(Arc::new(Top))
    }))
    .unwrap();

    let err = m.materialize::<Top>(&[]).unwrap_err();
    let trail = err.trail();
    assert_eq!(trail.len(), 2);
    assert!(trail[0].ends_with("Top"));
    assert!(trail[1].ends_with("Middle"));
    assert!(matches!(err.root_cause(), Error::FactoryFailed { .. }));
    assert!(err.to_string().contains("no bars found"));
}

#[test]
fn test_recorded_error_supersedes_the_return() {
    #[derive(Debug)]
    struct Stubborn;

    let m = Materializer::new();
    m.add(Factory::with_context(|cx: &mut Context<'_>| {
        // The error is ignored, but it stays recorded on the context.
        let _ = cx.materialize::<Bar>(&[]);
        assert!(cx.error().is_some());
        Arc::new(Stubborn)
    }))
    .unwrap();

    let err = m.materialize::<Stubborn>(&[]).unwrap_err();
    assert!(matches!(err.root_cause(), Error::NotFound { .. }));
}

#[test]
fn test_context_short_circuits_after_first_error() {
    struct Greedy;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let m = Materializer::new();
    m.add(Factory::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(5u64)
    }))
    .unwrap();
    m.add(Factory::with_context(|cx: &mut Context<'_>| -> materialize::Result<Arc<Greedy>> {
        let missing = cx.materialize::<Bar>(&[]);
        let available = cx.materialize::<u64>(&[]);
        assert!(missing.is_err());
        // Same recorded error, and the u64 factory never ran.
        assert_eq!(
            available.unwrap_err().to_string(),
            missing.unwrap_err().to_string()
        );
        Ok(Arc::new(Greedy))
    }))
    .unwrap();

    assert!(m.materialize::<Greedy>(&[]).is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_duplicate_registration_has_no_effect() {
    let m = Materializer::new();
    m.add(Factory::new(|| Arc::new(String::from("first"))).tags(["a", "b"]))
        .unwrap();
    let err = m
        .add(Factory::new(|| Arc::new(String::from("second"))).tags(["b", "a"]))
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateFactory { .. }));
    assert!(err.to_string().contains("[a, b]"));
    assert_eq!(m.descriptors().len(), 1);
    assert_eq!(*m.materialize::<String>(&["a", "b"]).unwrap(), "first");
}

#[test]
fn test_dependency_error_carries_query_tags() {
    #[derive(Debug)]
    struct Report;

    let m = Materializer::new();
    m.add(
        Factory::with_context(|cx: &mut Context<'_>| -> materialize::Result<Arc<Report>> {
            cx.materialize::<Bar>(&["archive"])?;
            Ok(Arc::new(Report))
        })
        .tags(["monthly"]),
    )
    .unwrap();

    let err = m.materialize::<Report>(&["monthly", "pdf"]).unwrap_err();
    match &err {
        Error::Dependency { tags, source, .. } => {
            assert_eq!(*tags, TagSet::new(["monthly", "pdf"]));
            assert!(matches!(**source, Error::NotFound { .. }));
        }
        other => panic!("expected a dependency error, got {other:?}"),
    }
    assert!(err.to_string().contains("(tags: [monthly, pdf])"));
}
