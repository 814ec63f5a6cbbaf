// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Integration tests for a stream feeding a bounded queue
//!
//! Replay and live entries from a subscription go through one queue to a
//! single consumer, the way an engine wires them.

use std::time::{Duration, Instant};
use vista_core::{
    BoundedQueue, Consumer, FakeClock, Flow, Listener, MemoryLog, Overflow, Position, Producer,
    QueueConfig, Stream, StreamConfig, Unparsable,
};

struct Forward {
    queue: Producer<(u64, String)>,
}

impl Listener<String> for Forward {
    fn on_entry(&mut self, entry: &String, at: Position) -> Flow {
        match self.queue.push((at.index, entry.clone())) {
            Ok(_) => Flow::Continue,
            Err(_) => Flow::Stop,
        }
    }

    fn on_unparsable(&mut self, record: &Unparsable, at: Position) -> Flow {
        let marker = format!("unparsable: {}", record.reason);
        self.on_entry(&marker, at)
    }
}

#[derive(Default)]
struct Collect {
    seen: Vec<(u64, String)>,
    dropped: u64,
}

impl Consumer<(u64, String)> for Collect {
    fn on_message(&mut self, message: (u64, String), dropped: u64) {
        self.dropped += dropped;
        self.seen.push(message);
    }
}

fn wait_for(queue: &BoundedQueue<(u64, String), Collect>, delivered: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while queue.stats().delivered < delivered {
        assert!(Instant::now() < deadline, "queue did not deliver in time");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn replayed_history_then_live_entries_arrive_in_index_order() {
    let log = MemoryLog::new();
    {
        let stream: Stream<String> = Stream::builder().persister(log.clone()).open().unwrap();
        for word in ["alpha", "beta", "gamma"] {
            stream.publish(word.to_string()).unwrap();
        }
    }
    log.push_unparsable(u64::MAX, "\u{0}", "binary garbage");

    let stream: Stream<String> = Stream::builder()
        .clock(FakeClock::new())
        .persister(log)
        .open()
        .unwrap();
    let queue = BoundedQueue::spawn(QueueConfig::new(4, Overflow::Block), Collect::default()).unwrap();
    let subscription = stream
        .subscribe(Forward {
            queue: queue.producer(),
        })
        .unwrap();

    wait_for(&queue, 4);
    stream.publish("delta".to_string()).unwrap();
    wait_for(&queue, 5);
    subscription.join().unwrap();

    let collect = queue.shutdown().unwrap();
    let indices: Vec<u64> = collect.seen.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, [0, 1, 2, 3, 4]);
    assert_eq!(collect.seen[3].1, "unparsable: binary garbage");
    assert_eq!(collect.seen[4].1, "delta");
    assert_eq!(collect.dropped, 0);
}

#[test]
fn scoped_listener_can_borrow_local_state() {
    let stream: Stream<String> = Stream::in_memory(StreamConfig::default(), FakeClock::new());
    for word in ["one", "two", "three"] {
        stream.publish(word.to_string()).unwrap();
    }

    let mut longest = String::new();
    let mut listener = vista_core::from_fn(|word: &String, at: Position| {
        if word.len() > longest.len() {
            longest = word.clone();
        }
        if at.is_last() {
            Flow::Stop
        } else {
            Flow::Continue
        }
    });
    std::thread::scope(|scope| {
        let subscription = stream.subscribe_scoped(scope, &mut listener).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !subscription.is_finished() {
            assert!(Instant::now() < deadline, "listener did not stop");
            std::thread::sleep(Duration::from_millis(1));
        }
        subscription.join().unwrap();
    });
    drop(listener);

    assert_eq!(longest, "three");
    assert_eq!(stream.subscriber_count(), 0);
}
