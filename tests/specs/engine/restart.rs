// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart specs
//!
//! Verify views are rebuilt from the durable log, damaged lines included.

use crate::prelude::*;
use std::io::Write;
use vista_storage::FileLog;

fn open(path: &std::path::Path) -> Engine<Views> {
    let engine =
        Engine::with_persister(EngineConfig::default(), Views::default(), FileLog::open(path).unwrap())
            .unwrap();
    assert!(engine.wait_caught_up(Duration::from_secs(10)));
    engine
}

#[test]
fn views_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("views.jsonl");
    {
        let engine = open(&path);
        engine.add(number("a", 1).into()).wait().unwrap();
        engine.add(score("ann", 1, 10).into()).wait().unwrap();
        engine.add(number("a", 2).into()).wait().unwrap();
    }

    let engine = open(&path);
    assert_eq!(engine.entries_seen(), 3);
    let views = engine.shutdown().unwrap();
    assert_eq!(views.numbers.get("a"), Some(&number("a", 2)));
    assert_eq!(views.scores.len(), 1);
}

#[test]
fn damaged_line_is_skipped_and_the_log_keeps_growing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("views.jsonl");
    {
        let engine = open(&path);
        engine.add(number("a", 1).into()).wait().unwrap();
        engine.add(number("b", 2).into()).wait().unwrap();
    }
    {
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{\"index\":2,\"us\":").unwrap();
    }
    {
        let engine = open(&path);
        assert_eq!(engine.stream().size(), 3);
        assert_eq!(engine.entries_seen(), 2);
        engine.add(number("c", 3).into()).wait().unwrap();
        assert_eq!(engine.stream().last().map(|s| s.index), Some(3));
    }

    let engine = open(&path);
    let names = engine
        .transaction(|txn| {
            let mut names: Vec<String> = txn.views.numbers.keys().cloned().collect();
            names.sort();
            names
        })
        .wait()
        .unwrap();
    assert_eq!(names, ["a", "b", "c"]);
    assert_eq!(engine.stream().size(), 4);
}
