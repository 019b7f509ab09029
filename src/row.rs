//! Row access and field iteration.

use std::cell::RefCell;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use log::trace;

use crate::column::Column;
use crate::driver::RowHandle;
use crate::error::{Error, Result};
use crate::field::Field;

/// A single row of a result set.
///
/// Owns the driver's raw row handle and a shared reference to the result's
/// column list. A row is replaced when the owning result advances, so field
/// views must not be held across a `next()` call; the borrow checker
/// enforces this.
pub struct Row {
    raw: Box<dyn RowHandle>,
    columns: Arc<Vec<Column>>,
    // per-field byte lengths, fetched from the driver once per row
    lengths: RefCell<Option<Vec<usize>>>,
}

impl Row {
    pub(crate) fn new(raw: Box<dyn RowHandle>, columns: Arc<Vec<Column>>) -> Self {
        Self {
            raw,
            columns,
            lengths: RefCell::new(None),
        }
    }

    /// Column descriptors of the owning result.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of fields; mirrors the result's column count.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Find a column index by name: first pass matches the current (possibly
    /// aliased) name, second pass the original pre-alias name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| self.columns.iter().position(|c| c.original_name == name))
    }

    /// Field view at the given index, bounds-checked.
    pub fn at(&self, index: usize) -> Result<Field<'_>> {
        if index >= self.len() {
            return Err(Error::FieldIndexOutOfBounds {
                index,
                count: self.len(),
            });
        }
        self.length_at(index)?;
        Ok(self.field_at(index))
    }

    /// Field view for the given column name.
    pub fn at_name(&self, name: &str) -> Result<Field<'_>> {
        let index = self.find(name).ok_or_else(|| Error::UnknownField {
            name: name.to_owned(),
        })?;
        self.at(index)
    }

    /// Iterator over all fields of this row.
    ///
    /// Fails if the driver cannot supply the per-field byte lengths.
    pub fn fields(&self) -> Result<Fields<'_>> {
        if !self.is_empty() {
            self.length_at(0)?;
        }
        Ok(Fields {
            row: self,
            front: 0,
            back: self.len(),
        })
    }

    fn length_at(&self, index: usize) -> Result<usize> {
        let mut lengths = self.lengths.borrow_mut();
        if lengths.is_none() {
            let fetched = self.raw.lengths().ok_or(Error::FetchLengths)?;
            trace!("fetched {} field lengths", fetched.len());
            *lengths = Some(fetched);
        }
        Ok(lengths
            .as_ref()
            .and_then(|l| l.get(index))
            .copied()
            .unwrap_or(0))
    }

    fn cached_length(&self, index: usize) -> usize {
        self.lengths
            .borrow()
            .as_ref()
            .and_then(|l| l.get(index))
            .copied()
            .unwrap_or(0)
    }

    // Pre: lengths fetched and index < len().
    fn field_at(&self, index: usize) -> Field<'_> {
        let size = self.cached_length(index);
        let data = self
            .raw
            .field(index)
            .map(|d| if size < d.len() { &d[..size] } else { d });
        Field::new(self, index, data)
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row").field("fields", &self.len()).finish()
    }
}

/// Double-ended, exact-size iterator over a row's fields.
///
/// One position pair drives both directions, so forward and reverse
/// traversal share the same field lookup.
pub struct Fields<'a> {
    row: &'a Row,
    front: usize,
    back: usize,
}

impl<'a> Iterator for Fields<'a> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Field<'a>> {
        if self.front >= self.back {
            return None;
        }
        let index = self.front;
        self.front += 1;
        Some(self.row.field_at(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Field<'a>> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl DoubleEndedIterator for Fields<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.row.field_at(self.back))
    }
}

impl ExactSizeIterator for Fields<'_> {}
impl FusedIterator for Fields<'_> {}
