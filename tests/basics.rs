use materialize::{Context, Error, Factory, Materializer, Repository};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

#[derive(Debug)]
struct Config {
    url: String,
}

struct Database {
    config: Arc<Config>,
}

fn counting<T: Send + Sync + 'static>(
    calls: &Arc<AtomicUsize>,
    make: fn() -> T,
) -> Factory<T> {
    let calls = calls.clone();
    Factory::new(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Arc::new(make())
    })
}

#[test]
fn test_same_instance_on_every_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let m = Materializer::new();
    m.add(counting(&calls, || Config { url: "db://x".into() })).unwrap();

    let first = m.materialize::<Config>(&[]).unwrap();
    for _ in 0..10 {
        assert!(Arc::ptr_eq(&first, &m.materialize::<Config>(&[]).unwrap()));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dependencies_are_shared() {
    let m = Materializer::new();
    m.add(Factory::new(|| Arc::new(Config { url: "db://shared".into() })))
        .unwrap();
    m.add(Factory::with_context(|cx: &mut Context<'_>| -> materialize::Result<_> {
        Ok(Arc::new(Database {
            config: cx.materialize::<Config>(&[])?,
        }))
    }))
    .unwrap();

    let db = m.materialize::<Database>(&[]).unwrap();
    let config = m.materialize::<Config>(&[]).unwrap();
    assert!(Arc::ptr_eq(&db.config, &config));
}

#[test]
fn test_not_found_names_the_type() {
    let m = Materializer::new();
    let err = m.materialize::<Config>(&["primary"]).unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
    let message = err.to_string();
    assert!(message.contains("Config"), "{message}");
    assert!(message.contains("[primary]"), "{message}");
}

#[test]
fn test_with_repository() {
    let mut repo = Repository::new();
    repo.add(Factory::new(|| Arc::new(Config { url: "db://repo".into() })))
        .unwrap();
    assert_eq!(repo.len(), 1);

    let m = Materializer::with_repository(repo);
    assert_eq!(m.materialize::<Config>(&[]).unwrap().url, "db://repo");

    // Registration keeps working on the owned repository.
    m.add(Factory::new(|| Arc::new(7u8))).unwrap();
    assert_eq!(*m.materialize::<u8>(&[]).unwrap(), 7);
}

#[test]
fn test_optional_and_once_lock_receivers() {
    let m = Materializer::new();
    m.add(Factory::new(|| Arc::new(Config { url: "db://slot".into() })))
        .unwrap();

    let mut slot: Option<Arc<Config>> = None;
    m.materialize_into(&mut slot, &[]).unwrap();
    assert_eq!(slot.as_ref().map(|c| c.url.as_str()), Some("db://slot"));

    let cell: OnceLock<Arc<Config>> = OnceLock::new();
    m.materialize_into(&cell, &[]).unwrap();
    assert!(Arc::ptr_eq(cell.get().unwrap(), slot.as_ref().unwrap()));
}

#[test]
fn test_filled_receiver_is_rejected_before_resolving() {
    let calls = Arc::new(AtomicUsize::new(0));
    let m = Materializer::new();
    m.add(counting(&calls, || Config { url: "db://late".into() })).unwrap();

    let cell = OnceLock::new();
    cell.set(Arc::new(Config { url: "db://early".into() })).unwrap();

    let err = m.materialize_into(&cell, &[]).unwrap_err();
    assert!(matches!(err, Error::InvalidReceiver { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(cell.get().unwrap().url, "db://early");
}

#[test]
fn test_optional_dependency() {
    struct Service {
        cache: Option<Arc<String>>,
    }

    let m = Materializer::new();
    m.add(Factory::with_context(|cx: &mut Context<'_>| -> materialize::Result<_> {
        Ok(Arc::new(Service {
            cache: cx.materialize_optional::<String>(&[])?,
        }))
    }))
    .unwrap();

    let service = m.materialize::<Service>(&[]).unwrap();
    assert!(service.cache.is_none());
}

#[test]
fn test_context_knows_its_type() {
    struct Named(&'static str);

    let m = Materializer::new();
    m.add(Factory::with_context(|cx: &mut Context<'_>| {
        Arc::new(Named(cx.type_name()))
    }))
    .unwrap();

    assert!(m.materialize::<Named>(&[]).unwrap().0.ends_with("Named"));
}

#[test]
#[should_panic(expected = "duplicated factory")]
fn test_must_add_panics_on_duplicate() {
    let m = Materializer::new();
    m.must_add(Factory::new(|| Arc::new(1u32)))
        .must_add(Factory::new(|| Arc::new(2u32)));
}
