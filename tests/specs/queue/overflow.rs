// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded queue specs
//!
//! Verify drop accounting and the block policy's no-loss guarantee.

use crate::prelude::*;

#[derive(Default)]
struct Tally {
    processed: Vec<String>,
    reported_drops: u64,
    delay: Duration,
}

impl Consumer<String> for Tally {
    fn on_message(&mut self, message: String, dropped: u64) {
        thread::sleep(self.delay);
        self.reported_drops += dropped;
        self.processed.push(message);
    }

    fn on_shutdown(&mut self, undelivered_drops: u64) {
        self.reported_drops += undelivered_drops;
    }
}

#[test]
fn capacity_ten_keeps_the_last_ten_of_twenty() {
    let queue =
        BoundedQueue::spawn_paused(QueueConfig::new(10, Overflow::DropOldest), Tally::default())
            .unwrap();
    for i in 0..20 {
        queue.push(format!("M{i:02}")).unwrap();
    }
    queue.resume();

    let stats = queue.stats();
    let tally = queue.shutdown().unwrap();
    let expected: Vec<String> = (10..20).map(|i| format!("M{i:02}")).collect();
    assert_eq!(tally.processed, expected);
    assert_eq!(stats.dropped, 10);
    assert_eq!(tally.reported_drops, 10);
}

#[test]
fn slow_consumer_accounts_for_every_message() {
    let tally = Tally {
        delay: Duration::from_millis(2),
        ..Tally::default()
    };
    let queue = BoundedQueue::spawn(QueueConfig::new(8, Overflow::DropIncoming), tally).unwrap();
    for i in 0..200 {
        queue.push(format!("M{i:03}")).unwrap();
        let stats = queue.stats();
        assert_eq!(stats.accepted + stats.dropped, stats.pushed);
    }

    let stats = queue.stats();
    let tally = queue.shutdown().unwrap();
    assert_eq!(tally.processed.len() as u64 + stats.dropped, 200);
    assert!(tally.processed.len() >= 8);
    assert_eq!(tally.reported_drops, stats.dropped);
}

#[test]
fn block_policy_never_drops() {
    let tally = Tally {
        delay: Duration::from_micros(200),
        ..Tally::default()
    };
    let queue = BoundedQueue::spawn(QueueConfig::new(3, Overflow::Block), tally).unwrap();
    let producers: Vec<_> = (0..8)
        .map(|p| {
            let producer = queue.producer();
            thread::spawn(move || {
                for i in 0..50 {
                    producer.push(format!("{p}/{i}")).unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let tally = queue.shutdown().unwrap();
    assert_eq!(tally.processed.len(), 400);
    assert_eq!(tally.reported_drops, 0);
}
