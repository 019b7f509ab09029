//! Result-set lifecycle: buffered and streaming variants.

use std::cell::OnceCell;
use std::sync::Arc;

use log::trace;

use crate::column::Column;
use crate::driver::{ResultHandle, RowOffset};
use crate::handle::Handle;
use crate::row::Row;

/// Shared state machine behind both result variants.
///
/// `{before first row}` → (`next` success) → `{on row k}` → … → (`next`
/// exhausted) → `{exhausted}`. The row index starts at −1 ("before first
/// row") and each successful `next` increments it by exactly one;
/// exhaustion clears the current row and leaves the index unchanged.
#[derive(Debug)]
pub struct ResultCore {
    handle: Handle<Box<dyn ResultHandle>>,
    row: Option<Row>,
    columns: OnceCell<Arc<Vec<Column>>>,
    row_index: i64,
    field_count: u32,
}

impl ResultCore {
    fn new(handle: Box<dyn ResultHandle>) -> Self {
        let field_count = handle.field_count();
        Self {
            handle: Handle::new(handle),
            row: None,
            columns: OnceCell::new(),
            row_index: -1,
            field_count,
        }
    }

    /// Pull the next row from the driver.
    pub fn next(&mut self) -> Option<&Row> {
        let columns = self.shared_columns();
        let fetched = self.handle.get_mut().and_then(|h| h.fetch_row());
        match fetched {
            Some(raw) => {
                self.row_index += 1;
                trace!("fetched row {}", self.row_index);
                self.row = Some(Row::new(raw, columns));
            }
            None => {
                self.row = None;
            }
        }
        self.row.as_ref()
    }

    /// The last row produced by [`Self::next`], without advancing.
    pub fn current(&self) -> Option<&Row> {
        self.row.as_ref()
    }

    /// Column descriptors, computed on first access and memoized.
    pub fn columns(&self) -> &[Column] {
        self.columns_cell().as_slice()
    }

    /// Column count of this result.
    pub fn column_count(&self) -> u32 {
        self.field_count
    }

    /// 0-based index of the current row; −1 before the first `next`.
    pub fn row_index(&self) -> i64 {
        self.row_index
    }

    /// Release the driver handle. Idempotent.
    pub fn free(&mut self) {
        self.row = None;
        self.handle.take();
    }

    fn columns_cell(&self) -> &Arc<Vec<Column>> {
        self.columns.get_or_init(|| {
            Arc::new(
                self.handle
                    .get()
                    .map(|h| h.columns())
                    .unwrap_or_default(),
            )
        })
    }

    fn shared_columns(&self) -> Arc<Vec<Column>> {
        Arc::clone(self.columns_cell())
    }
}

/// A result set fully materialized driver-side at acquisition.
///
/// Supports random repositioning and a known total row count, which is what
/// distinguishes it from [`UsedResult`].
#[derive(Debug)]
pub struct StoredResult {
    core: ResultCore,
}

impl StoredResult {
    pub(crate) fn new(handle: Box<dyn ResultHandle>) -> Self {
        Self {
            core: ResultCore::new(handle),
        }
    }

    /// See [`ResultCore::next`].
    pub fn next(&mut self) -> Option<&Row> {
        self.core.next()
    }

    /// See [`ResultCore::current`].
    pub fn current(&self) -> Option<&Row> {
        self.core.current()
    }

    pub fn columns(&self) -> &[Column] {
        self.core.columns()
    }

    pub fn column_count(&self) -> u32 {
        self.core.column_count()
    }

    pub fn row_index(&self) -> i64 {
        self.core.row_index()
    }

    /// Total buffered row count.
    pub fn row_count(&self) -> u64 {
        self.core.handle.get().map_or(0, |h| h.row_count())
    }

    /// Seek directly to logical row `index`.
    ///
    /// Afterwards the current row is row `index`, exactly as if it had been
    /// reached by repeated `next` calls from the start.
    pub fn set_row_index(&mut self, index: u64) -> Option<&Row> {
        if let Some(handle) = self.core.handle.get_mut() {
            handle.seek(index);
        }
        self.core.row_index = index as i64 - 1;
        self.core.next()
    }

    /// Opaque cursor position token for save/restore.
    pub fn row_offset(&self) -> Option<RowOffset> {
        self.core.handle.get().map(|h| h.tell())
    }

    /// Restore a cursor position. The logical row index is not recomputed;
    /// the token is an opaque save/restore handle.
    pub fn set_row_offset(&mut self, offset: RowOffset) {
        if let Some(handle) = self.core.handle.get_mut() {
            handle.seek_offset(offset);
        }
    }

    /// Release the driver handle. Idempotent.
    pub fn free(&mut self) {
        self.core.free();
    }
}

/// A result set fetched from the driver one row at a time on demand.
///
/// No random access and no row count known in advance. On release, unread
/// rows are drained from the driver before the handle goes, because the
/// session cannot issue a new query while a streaming fetch is outstanding.
#[derive(Debug)]
pub struct UsedResult {
    core: ResultCore,
}

impl UsedResult {
    pub(crate) fn new(handle: Box<dyn ResultHandle>) -> Self {
        Self {
            core: ResultCore::new(handle),
        }
    }

    /// See [`ResultCore::next`].
    pub fn next(&mut self) -> Option<&Row> {
        self.core.next()
    }

    /// See [`ResultCore::current`].
    pub fn current(&self) -> Option<&Row> {
        self.core.current()
    }

    pub fn columns(&self) -> &[Column] {
        self.core.columns()
    }

    pub fn column_count(&self) -> u32 {
        self.core.column_count()
    }

    pub fn row_index(&self) -> i64 {
        self.core.row_index()
    }

    /// Drain remaining rows, then release the driver handle. Idempotent.
    pub fn free(&mut self) {
        self.drain();
        self.core.free();
    }

    // Never raises: the caller has already moved on.
    fn drain(&mut self) {
        if let Some(handle) = self.core.handle.get_mut() {
            let mut drained = 0u64;
            while handle.fetch_row().is_some() {
                drained += 1;
            }
            if drained > 0 {
                trace!("drained {drained} unread rows from streaming result");
            }
        }
    }
}

impl Drop for UsedResult {
    fn drop(&mut self) {
        self.drain();
    }
}

/// The result a connection currently owns: buffered or streaming.
#[derive(Debug)]
pub enum ResultSet {
    Stored(StoredResult),
    Used(UsedResult),
}

impl ResultSet {
    /// Pull the next row from the driver.
    pub fn next(&mut self) -> Option<&Row> {
        match self {
            ResultSet::Stored(r) => r.next(),
            ResultSet::Used(r) => r.next(),
        }
    }

    /// The last row produced, without advancing.
    pub fn current(&self) -> Option<&Row> {
        match self {
            ResultSet::Stored(r) => r.current(),
            ResultSet::Used(r) => r.current(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        match self {
            ResultSet::Stored(r) => r.columns(),
            ResultSet::Used(r) => r.columns(),
        }
    }

    pub fn column_count(&self) -> u32 {
        match self {
            ResultSet::Stored(r) => r.column_count(),
            ResultSet::Used(r) => r.column_count(),
        }
    }

    pub fn row_index(&self) -> i64 {
        match self {
            ResultSet::Stored(r) => r.row_index(),
            ResultSet::Used(r) => r.row_index(),
        }
    }

    /// Release the driver handle (draining first for a streaming result).
    pub fn free(&mut self) {
        match self {
            ResultSet::Stored(r) => r.free(),
            ResultSet::Used(r) => r.free(),
        }
    }

    pub fn as_stored(&mut self) -> Option<&mut StoredResult> {
        match self {
            ResultSet::Stored(r) => Some(r),
            ResultSet::Used(_) => None,
        }
    }

    pub fn as_used(&mut self) -> Option<&mut UsedResult> {
        match self {
            ResultSet::Used(r) => Some(r),
            ResultSet::Stored(_) => None,
        }
    }
}
