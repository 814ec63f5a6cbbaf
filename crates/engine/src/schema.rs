// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What entries must expose, and how a set of views routes them

use std::fmt::Debug;
use std::hash::Hash;

/// An entry indexed by a single key
pub trait Keyed {
    type Key: Eq + Hash + Clone + Debug + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

/// An entry indexed by a row and a column
pub trait Cell {
    type Row: Ord + Clone + Debug + Send + Sync + 'static;
    type Col: Ord + Clone + Debug + Send + Sync + 'static;

    fn row(&self) -> Self::Row;
    fn col(&self) -> Self::Col;
}

/// A keyed entry with a sentinel value standing in for "absent"
pub trait Nullable: Keyed {
    fn null(key: Self::Key) -> Self;

    fn exists(&self) -> bool;
}

/// A cell entry with a sentinel value standing in for "absent"
pub trait NullableCell: Cell {
    fn null(row: Self::Row, col: Self::Col) -> Self;

    fn exists(&self) -> bool;
}

/// The views an engine maintains, and how a stream entry reaches them.
///
/// With several entry types, `Entry` is an enum with one variant per type
/// and `apply` matches on it:
///
/// ```ignore
/// enum Record { User(User), Score(Score) }
///
/// struct Views { users: Dictionary<User>, scores: Matrix<Score> }
///
/// impl Schema for Views {
///     type Entry = Record;
///     fn apply(&mut self, entry: &Record, index: u64) {
///         match entry {
///             Record::User(u) => { self.users.apply(u.clone(), index); }
///             Record::Score(s) => { self.scores.apply(s.clone(), index); }
///         }
///     }
/// }
/// ```
pub trait Schema: Send + 'static {
    type Entry: Clone + Send + Sync + 'static;

    /// Apply an entry that sits at `index` in the stream.
    fn apply(&mut self, entry: &Self::Entry, index: u64);
}

/// Single-lookup read access, used by `Engine::get` and `Engine::has`
pub trait Lookup {
    type Key: Send + 'static;
    type Item;

    fn lookup(&self, key: &Self::Key) -> Option<&Self::Item>;
}
