// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine specs
//!
//! Verify transactions against dictionary and matrix views.

use crate::prelude::*;
use vista_engine::{ContainerError, EngineError};

fn engine() -> Engine<Views> {
    Engine::new(Views::default()).unwrap()
}

fn numbers(views: &Views) -> &Dictionary<Number> {
    &views.numbers
}

fn scores(views: &Views) -> &Matrix<Score> {
    &views.scores
}

#[test]
fn primes_scenario() {
    let engine = engine();
    for (name, value) in [("two", 2), ("three", 3), ("five", 5), ("seven", 7)] {
        engine.add(number(name, value).into()).wait().unwrap();
    }

    let get = |key: &str| engine.get_in(numbers, key.to_string()).wait().unwrap();
    assert_eq!(get("three"), Some(number("three", 3)));
    assert_eq!(get("five"), Some(number("five", 5)));
    assert_eq!(get("nine"), None);
}

#[test]
fn add_overwrites_but_must_add_refuses() {
    let engine = engine();
    engine.add(number("x", 1).into()).wait().unwrap();
    engine.add(number("x", 2).into()).wait().unwrap();
    assert_eq!(
        engine.get_in(numbers, "x".to_string()).wait().unwrap(),
        Some(number("x", 2))
    );

    let must_add = |value| {
        engine
            .try_transaction(move |txn| {
                txn.views
                    .numbers
                    .mutator(txn.publisher)
                    .must_add(number("y", value))
            })
            .wait()
    };
    must_add(1).unwrap();
    let err = must_add(2).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Container(ContainerError::KeyAlreadyExists { .. })
    ));
    assert_eq!(
        engine.get_in(numbers, "y".to_string()).wait().unwrap(),
        Some(number("y", 1))
    );
}

#[test]
fn matrix_cell_is_the_same_from_every_side() {
    let engine = engine();
    engine.add(score("ann", 3, 42).into()).wait().unwrap();
    engine.add(score("bob", 3, 7).into()).wait().unwrap();

    let (direct, by_row, by_col) = engine
        .try_transaction(|txn| {
            let scores = txn.views.scores.accessor();
            let ann = "ann".to_string();
            let direct = scores.at(&ann, &3)?.clone();
            let by_row = scores.rows().at(&ann)?.at(&3)?.clone();
            let by_col = scores.cols().at(&3)?.at(&ann)?.clone();
            Ok((direct, by_row, by_col))
        })
        .wait()
        .unwrap();

    assert_eq!(direct, score("ann", 3, 42));
    assert_eq!(by_row, direct);
    assert_eq!(by_col, direct);
    assert_eq!(
        engine.get_in(scores, ("bob".to_string(), 3)).wait().unwrap(),
        Some(score("bob", 3, 7))
    );
}

#[test]
fn transaction_observes_every_earlier_add() {
    let engine = engine();
    let pending: Vec<_> = (0..100)
        .map(|i| engine.add(number(&format!("k{i}"), i).into()))
        .collect();
    let count = engine
        .transaction(|txn| txn.views.numbers.len())
        .wait()
        .unwrap();
    assert_eq!(count, 100);
    for add in pending {
        add.wait().unwrap();
    }
}

#[test]
fn entries_published_to_the_stream_are_applied() {
    let engine = engine();
    let stream = engine.stream().clone();
    stream.publish(score("cat", 1, 5).into()).unwrap();
    stream.publish(number("n", 9).into()).unwrap();

    wait_until("both entries applied", || engine.entries_seen() == 2);
    assert!(engine.has_in(scores, ("cat".to_string(), 1)).wait().unwrap());
    assert!(engine.has_in(numbers, "n".to_string()).wait().unwrap());
}

#[test]
fn a_failing_transaction_does_not_stop_the_engine() {
    let engine = engine();
    let err = engine
        .transaction(|txn| {
            if txn.views.numbers.is_empty() {
                panic!("nothing to read");
            }
        })
        .wait()
        .unwrap_err();
    assert!(matches!(err, EngineError::Panicked(_)));

    engine.add(number("ok", 1).into()).wait().unwrap();
    let views = engine.shutdown().unwrap();
    assert_eq!(views.numbers.len(), 1);
}

#[tokio::test]
async fn transactions_are_futures() {
    let engine = engine();
    engine.add(number("a", 1).into()).await.unwrap();
    let total = engine
        .transaction(|txn| txn.views.numbers.iter().map(|n| n.value).sum::<i64>())
        .await
        .unwrap();
    assert_eq!(total, 1);
}
