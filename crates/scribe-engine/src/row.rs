use uuid::Uuid;

use scribe_helpers::IndexMap;

use crate::value::Value;

/// Opaque identity for a stored row, independent of any column value.
pub type RowId = Uuid;

/// A single row: column name to stored value, in schema-declared order.
pub type Row = IndexMap<String, Value>;

/// The physical storage backing a table: rows keyed by [`RowId`] in
/// insertion order. Indexes in [`crate::table::Table`] point into this.
#[derive(Debug, Default, Clone)]
pub struct RowStore {
    rows: IndexMap<RowId, Row>,
}

impl RowStore {
    pub fn new() -> Self {
        Self {
            rows: IndexMap::default(),
        }
    }

    pub fn insert(&mut self, id: RowId, row: Row) {
        self.rows.insert(id, row);
    }

    pub fn get(&self, id: &RowId) -> Option<&Row> {
        self.rows.get(id)
    }

    pub fn get_mut(&mut self, id: &RowId) -> Option<&mut Row> {
        self.rows.get_mut(id)
    }

    pub fn remove(&mut self, id: &RowId) -> Option<Row> {
        self.rows.shift_remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowId, &Row)> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
