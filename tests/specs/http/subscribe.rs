// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP boundary specs
//!
//! Verify chunked subscriptions and single-entry requests against a
//! running engine.

use crate::prelude::*;
use vista_core::Stamp;
use vista_engine::{EngineError, Txn};
use vista_http::{get_entry, post_entry, serve_subscription, ChannelSink, Response, Served, TERMINATED};

async fn drain(mut rx: tokio::sync::mpsc::Receiver<String>) -> Vec<serde_json::Value> {
    let mut chunks = Vec::new();
    while let Some(chunk) = rx.recv().await {
        chunks.push(serde_json::from_str(&chunk).unwrap());
    }
    chunks
}

#[tokio::test]
async fn engine_stream_served_as_json_lines() {
    let engine = Engine::new(Views::default()).unwrap();
    engine.add(number("a", 1).into()).await.unwrap();
    engine.add(score("ann", 1, 10).into()).await.unwrap();
    engine.add(number("b", 2).into()).await.unwrap();

    let (sink, rx) = ChannelSink::channel(4);
    let served = serve_subscription(engine.stream(), "entry", "n=2", sink).unwrap();
    assert!(matches!(served, Served::Chunked { .. }));

    let chunks = drain(rx).await;
    assert_eq!(
        chunks,
        vec![
            serde_json::json!({"entry": {"score": {"player": "ann", "round": 1, "points": 10}}}),
            serde_json::json!({"entry": {"number": {"name": "b", "value": 2}}}),
        ]
    );
}

#[tokio::test]
async fn closing_the_stream_terminates_http_subscribers() {
    let stream: Stream<Number> = fake_stream();
    let (sink, mut rx) = ChannelSink::channel(4);
    serve_subscription(&stream, "number", "", sink).unwrap();

    stream.publish(number("a", 1)).unwrap();
    assert_eq!(
        rx.recv().await.as_deref(),
        Some("{\"number\":{\"name\":\"a\",\"value\":1}}\n")
    );
    stream.close();
    assert_eq!(rx.recv().await.as_deref(), Some(TERMINATED));
    assert_eq!(rx.recv().await, None);
}

fn insert(txn: &mut Txn<'_, Views>, n: Number) -> Result<Stamp, EngineError> {
    txn.views.numbers.mutator(txn.publisher).must_add(n)
}

#[test]
fn post_and_get_round_trip() {
    let engine = Engine::new(Views::default()).unwrap();
    let (tx, rx) = std::sync::mpsc::channel::<Response>();

    let reply = tx.clone();
    post_entry(&engine, r#"{"name":"x","value":5}"#, insert, move |r| {
        let _ = reply.send(r);
    })
    .unwrap()
    .go()
    .unwrap();
    assert_eq!(rx.recv().unwrap().status, 201);

    let reply = tx.clone();
    post_entry(&engine, r#"{"name":"x","value":6}"#, insert, move |r| {
        let _ = reply.send(r);
    })
    .unwrap()
    .go()
    .unwrap();
    assert_eq!(rx.recv().unwrap().status, 409);

    let reply = tx.clone();
    get_entry(
        &engine,
        |v: &Views| &v.numbers,
        "x".to_string(),
        move |r| {
            let _ = reply.send(r);
        },
    )
    .go()
    .unwrap();
    let found = rx.recv().unwrap();
    assert_eq!(found.status, 200);
    assert_eq!(found.body, "{\"entry\":{\"name\":\"x\",\"value\":5}}\n");

    get_entry(&engine, |v: &Views| &v.numbers, "y".to_string(), move |r| {
        let _ = tx.send(r);
    })
    .go()
    .unwrap();
    assert_eq!(rx.recv().unwrap().status, 404);
}
