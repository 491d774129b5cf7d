//! Streamed result sets and borrowed row views.
//!
//! A ResultSet owns:
//! - The driver's streamed-result handle (released on drop)
//! - The field count, cached at creation
//! - The most recently fetched row buffer
//!
//! Rows are pulled from the server one at a time; the sequence is
//! forward-only and a drained set never replays. A [`Row`] borrows the
//! current buffer, so the borrow checker rules out reading a row after the
//! next fetch has replaced it.

use std::collections::BTreeMap;

use crate::driver::ResultHandle;
use crate::error::ClientError;

/// A forward-only, single-pass streamed result.
pub struct ResultSet {
    handle: Box<dyn ResultHandle>,
    field_count: usize,
    names: Option<Vec<String>>,
    current: Option<Vec<Option<Vec<u8>>>>,
    done: bool,
}

impl std::fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("field_count", &self.field_count)
            .field("names", &self.names)
            .field("current", &self.current)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl ResultSet {
    pub(crate) fn new(handle: Box<dyn ResultHandle>) -> Self {
        let field_count = handle.field_count();
        Self {
            handle,
            field_count,
            names: None,
            current: None,
            done: false,
        }
    }

    /// Number of columns, fixed at creation.
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Pull the next row; `Ok(None)` once exhausted, on every later call.
    pub fn fetch_row(&mut self) -> Result<Option<Row<'_>>, ClientError> {
        if self.done {
            return Ok(None);
        }
        match self.handle.fetch()? {
            Some(values) => self.current = Some(values),
            None => {
                self.done = true;
                self.current = None;
            }
        }
        Ok(self.current.as_deref().map(|values| Row { values }))
    }

    /// Alias for [`ResultSet::fetch_row`].
    pub fn next(&mut self) -> Result<Option<Row<'_>>, ClientError> {
        self.fetch_row()
    }

    /// Pull the next row as a name-keyed mapping; field metadata is read
    /// from the handle once, on first use.
    #[allow(clippy::type_complexity)]
    pub fn fetch_array(
        &mut self,
    ) -> Result<Option<BTreeMap<String, Option<Vec<u8>>>>, ClientError> {
        if self.done {
            return Ok(None);
        }
        if self.names.is_none() {
            let names = self
                .handle
                .fields()
                .into_iter()
                .map(|field| field.name)
                .collect();
            self.names = Some(names);
        }
        let values = match self.handle.fetch()? {
            Some(values) => values,
            None => {
                self.done = true;
                self.current = None;
                return Ok(None);
            }
        };
        self.current = None;
        let mut data = BTreeMap::new();
        if let Some(names) = &self.names {
            for (name, value) in names.iter().zip(values) {
                data.insert(name.clone(), value);
            }
        }
        Ok(Some(data))
    }

    /// Alias for [`ResultSet::fetch_array`].
    #[allow(clippy::type_complexity)]
    pub fn next_array(
        &mut self,
    ) -> Result<Option<BTreeMap<String, Option<Vec<u8>>>>, ClientError> {
        self.fetch_array()
    }
}

/// A non-owning view over the row most recently fetched by a [`ResultSet`].
/// Invalidated by the next fetch; values are exact-length byte strings.
#[derive(Debug)]
pub struct Row<'a> {
    values: &'a [Option<Vec<u8>>],
}

impl<'a> Row<'a> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw bytes of one column; `None` is SQL NULL or an out-of-range index.
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        self.values.get(index).and_then(|value| value.as_deref())
    }

    /// Column as UTF-8 text; `None` when NULL, out of range, or not UTF-8.
    pub fn get_str(&self, index: usize) -> Option<&'a str> {
        self.get(index).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}
