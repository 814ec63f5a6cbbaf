// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two-dimensional view indexed by row and by column

use crate::error::{ContainerError, EngineError};
use crate::schema::{Cell, Lookup, NullableCell, Schema};
use crate::view::{Accessor, Mutator, Publisher};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use vista_core::Stamp;

/// Latest entry per (row, col), reachable from either coordinate first
#[derive(Debug, Clone)]
pub struct Matrix<T: Cell> {
    forward: BTreeMap<T::Row, BTreeMap<T::Col, Arc<T>>>,
    transposed: BTreeMap<T::Col, BTreeMap<T::Row, Arc<T>>>,
    indices: BTreeMap<(T::Row, T::Col), u64>,
}

impl<T: Cell> Matrix<T> {
    pub fn new() -> Self {
        Self {
            forward: BTreeMap::new(),
            transposed: BTreeMap::new(),
            indices: BTreeMap::new(),
        }
    }

    /// Store `entry` as it appeared at stream `index`, under both its row
    /// and its column. Older entries for an occupied cell are ignored.
    pub fn apply(&mut self, entry: T, index: u64) -> bool {
        let (row, col) = (entry.row(), entry.col());
        let cell = (row.clone(), col.clone());
        if let Some(current) = self.indices.get(&cell) {
            if *current > index {
                return false;
            }
        }
        let entry = Arc::new(entry);
        self.forward
            .entry(row.clone())
            .or_default()
            .insert(col.clone(), Arc::clone(&entry));
        self.transposed.entry(col).or_default().insert(row, entry);
        self.indices.insert(cell, index);
        true
    }

    pub fn has(&self, row: &T::Row, col: &T::Col) -> bool {
        self.get(row, col).is_some()
    }

    pub fn get(&self, row: &T::Row, col: &T::Col) -> Option<&T> {
        self.forward.get(row)?.get(col).map(|e| e.as_ref())
    }

    pub fn at(&self, row: &T::Row, col: &T::Col) -> Result<&T, ContainerError> {
        self.get(row, col).ok_or_else(|| ContainerError::CellNotFound {
            row: format!("{row:?}"),
            col: format!("{col:?}"),
        })
    }

    pub fn get_or_null(&self, row: &T::Row, col: &T::Col) -> T
    where
        T: NullableCell + Clone,
    {
        self.get(row, col)
            .cloned()
            .unwrap_or_else(|| T::null(row.clone(), col.clone()))
    }

    pub fn index_of(&self, row: &T::Row, col: &T::Col) -> Option<u64> {
        self.indices.get(&(row.clone(), col.clone())).copied()
    }

    /// Every cell, row by row
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.forward
            .values()
            .flat_map(|cols| cols.values().map(|e| e.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Cells grouped by row
    pub fn rows(&self) -> Axis<'_, T::Row, T::Col, T> {
        Axis {
            lines: &self.forward,
            kind: AxisKind::Rows,
        }
    }

    /// Cells grouped by column
    pub fn cols(&self) -> Axis<'_, T::Col, T::Row, T> {
        Axis {
            lines: &self.transposed,
            kind: AxisKind::Cols,
        }
    }

    pub fn row(&self, row: &T::Row) -> Option<Line<'_, T::Row, T::Col, T>> {
        self.rows().get(row)
    }

    pub fn col(&self, col: &T::Col) -> Option<Line<'_, T::Col, T::Row, T>> {
        self.cols().get(col)
    }

    pub fn accessor(&self) -> Accessor<'_, Self> {
        Accessor::new(self)
    }

    pub fn mutator<'a, E>(&'a mut self, publisher: Publisher<'a, E>) -> Mutator<'a, Self, E> {
        Mutator::new(self, publisher)
    }
}

impl<T: Cell> Default for Matrix<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisKind {
    Rows,
    Cols,
}

impl AxisKind {
    fn missing_line(self, key: String) -> ContainerError {
        match self {
            AxisKind::Rows => ContainerError::RowNotFound { row: key },
            AxisKind::Cols => ContainerError::ColNotFound { col: key },
        }
    }

    fn missing_cell(self, outer: String, inner: String) -> ContainerError {
        match self {
            AxisKind::Rows => ContainerError::CellNotFound {
                row: outer,
                col: inner,
            },
            AxisKind::Cols => ContainerError::CellNotFound {
                row: inner,
                col: outer,
            },
        }
    }
}

/// Outer view: one [`Line`] per row (or per column)
pub struct Axis<'a, K, J, T> {
    lines: &'a BTreeMap<K, BTreeMap<J, Arc<T>>>,
    kind: AxisKind,
}

impl<'a, K: Ord + Debug, J: Ord + Debug, T> Axis<'a, K, J, T> {
    pub fn has(&self, key: &K) -> bool {
        self.lines.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<Line<'a, K, J, T>> {
        let lines: &'a BTreeMap<K, BTreeMap<J, Arc<T>>> = self.lines;
        let (key, cells) = lines.get_key_value(key)?;
        Some(Line {
            key,
            cells,
            kind: self.kind,
        })
    }

    pub fn at(&self, key: &K) -> Result<Line<'a, K, J, T>, ContainerError> {
        self.get(key)
            .ok_or_else(|| self.kind.missing_line(format!("{key:?}")))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a K> {
        let lines: &'a BTreeMap<K, BTreeMap<J, Arc<T>>> = self.lines;
        lines.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = Line<'a, K, J, T>> {
        let (lines, kind): (&'a BTreeMap<K, BTreeMap<J, Arc<T>>>, _) = (self.lines, self.kind);
        lines.iter().map(move |(key, cells)| Line { key, cells, kind })
    }
}

/// One row (or column) of a matrix, indexed by the other coordinate
pub struct Line<'a, K, J, T> {
    key: &'a K,
    cells: &'a BTreeMap<J, Arc<T>>,
    kind: AxisKind,
}

impl<'a, K: Debug, J: Ord + Debug, T> Line<'a, K, J, T> {
    /// The row (or column) this line belongs to
    pub fn key(&self) -> &'a K {
        self.key
    }

    pub fn has(&self, key: &J) -> bool {
        self.cells.contains_key(key)
    }

    pub fn get(&self, key: &J) -> Option<&'a T> {
        let cells: &'a BTreeMap<J, Arc<T>> = self.cells;
        cells.get(key).map(|e| e.as_ref())
    }

    pub fn at(&self, key: &J) -> Result<&'a T, ContainerError> {
        self.get(key).ok_or_else(|| {
            self.kind
                .missing_cell(format!("{:?}", self.key), format!("{key:?}"))
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a J, &'a T)> {
        let cells: &'a BTreeMap<J, Arc<T>> = self.cells;
        cells.iter().map(|(k, e)| (k, e.as_ref()))
    }
}

impl<T, E> Mutator<'_, Matrix<T>, E>
where
    T: Cell + Clone,
    E: From<T> + Send + Sync + 'static,
{
    /// Store and publish `entry`, replacing whatever occupies its cell.
    pub fn add(&mut self, entry: T) -> Result<Stamp, EngineError> {
        let stamp = self.publisher.publish(E::from(entry.clone()))?;
        self.container.apply(entry, stamp.index);
        Ok(stamp)
    }

    /// Like [`add`](Self::add), but fails if the cell is occupied.
    pub fn must_add(&mut self, entry: T) -> Result<Stamp, EngineError>
    where
        T: Debug,
    {
        if self.container.has(&entry.row(), &entry.col()) {
            return Err(ContainerError::CellAlreadyExists {
                entry: format!("{entry:?}"),
            }
            .into());
        }
        self.add(entry)
    }
}

impl<T: Cell> Lookup for Matrix<T> {
    type Key = (T::Row, T::Col);
    type Item = T;

    fn lookup(&self, key: &Self::Key) -> Option<&T> {
        self.get(&key.0, &key.1)
    }
}

impl<T> Schema for Matrix<T>
where
    T: Cell + Clone + Send + Sync + 'static,
{
    type Entry = T;

    fn apply(&mut self, entry: &T, index: u64) {
        Matrix::apply(self, entry.clone(), index);
    }
}

#[cfg(test)]
#[path = "matrix_tests.rs"]
mod tests;
