// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream replay specs
//!
//! Verify ordering, gap-free delivery and deterministic rebuilds.

use crate::prelude::*;
use std::sync::Mutex;
use vista_core::from_fn;

#[test]
fn concurrent_publishers_get_contiguous_indices() {
    let stream: Stream<Number> = fake_stream();
    let writers: Vec<_> = (0..4)
        .map(|w| {
            let stream = stream.clone();
            thread::spawn(move || {
                (0..250)
                    .map(|i| stream.publish(number(&format!("{w}-{i}"), i)).unwrap().index)
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut indices: Vec<u64> = writers
        .into_iter()
        .flat_map(|w| {
            let own = w.join().unwrap();
            // Increasing within each publisher
            assert!(own.windows(2).all(|p| p[0] < p[1]));
            own
        })
        .collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..1000).collect::<Vec<u64>>());
}

#[test]
fn listener_sees_every_index_in_order() {
    let stream: Stream<Number> = fake_stream();
    for i in 0..100 {
        stream.publish(number(&format!("k{}", i % 7), i)).unwrap();
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = stream
        .subscribe(from_fn(move |_: &Number, at: Position| {
            sink.lock().unwrap().push(at.index);
            Flow::Continue
        }))
        .unwrap();
    for i in 100..150 {
        stream.publish(number("late", i)).unwrap();
    }
    wait_until("150 deliveries", || seen.lock().unwrap().len() == 150);
    subscription.join().unwrap();

    assert_eq!(*seen.lock().unwrap(), (0..150).collect::<Vec<u64>>());
}

#[test]
fn two_replays_build_identical_dictionaries() {
    let stream: Stream<Number> = fake_stream();
    for i in 0..200 {
        stream.publish(number(&format!("k{}", (i * 31) % 17), i)).unwrap();
    }

    let rebuild = || {
        let dict = Arc::new(Mutex::new(Dictionary::<Number>::new()));
        let target = Arc::clone(&dict);
        let subscription = stream
            .subscribe(from_fn(move |n: &Number, at: Position| {
                target.lock().unwrap().apply(n.clone(), at.index);
                if at.index == 199 {
                    Flow::Stop
                } else {
                    Flow::Continue
                }
            }))
            .unwrap();
        wait_until("replay to finish", || subscription.is_finished());
        subscription.join().unwrap();
        let dict = dict.lock().unwrap();
        let mut entries: Vec<Number> = dict.iter().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    };

    let first = rebuild();
    assert_eq!(first.len(), 17);
    assert_eq!(first, rebuild());
}
