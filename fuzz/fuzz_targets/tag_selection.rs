#![no_main]

use libfuzzer_sys::fuzz_target;
use materialize::{Error, Factory, Materializer, TagSet};
use std::sync::Arc;

const TAGS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

struct Probe(usize);

fn tags_of(bits: u8) -> Vec<&'static str> {
    TAGS.iter()
        .enumerate()
        .filter(|(i, _)| bits & (1 << i) != 0)
        .map(|(_, tag)| *tag)
        .collect()
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let (query_bits, registrations) = data.split_first().unwrap_or((&0, &[]));

    let m = Materializer::new();
    let mut registered: Vec<TagSet> = Vec::new();
    for &bits in registrations.iter().take(32) {
        let tags = tags_of(bits);
        let set = TagSet::new(tags.iter().copied());
        let index = registered.len();
        match m.add(Factory::new(move || Arc::new(Probe(index))).tags(tags)) {
            Ok(()) => registered.push(set),
            Err(Error::DuplicateFactory { .. }) => assert!(registered.contains(&set)),
            Err(err) => panic!("unexpected registration error: {err}"),
        }
    }

    let query = tags_of(*query_bits);
    let query_set = TagSet::new(query.iter().copied());
    let picked = match m.materialize::<Probe>(&query) {
        Ok(probe) => probe,
        Err(err) => panic!("unexpected resolution error: {err}"),
    };

    // First factory with the maximum score.
    let scores: Vec<i32> = registered.iter().map(|t| t.score(&query_set)).collect();
    let best = scores.iter().copied().max().unwrap_or(i32::MIN);
    let expected = scores.iter().position(|&s| s == best).unwrap_or(usize::MAX);
    assert_eq!(picked.0, expected);

    // Cached: the same Arc again.
    let again = m.materialize::<Probe>(&query).ok();
    assert!(again.map_or(false, |a| Arc::ptr_eq(&a, &picked)));
});
