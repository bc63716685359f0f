use scribe_core::ast::ForeignKeyDef;
use scribe_helpers::IndexMap;

use crate::errors::ExecutionError;
use crate::row::{Row, RowId, RowStore};
use crate::value::{check_type, ColumnType, Value};

/// Per-column value -> posting list. Only columns that were explicitly
/// indexed (via `CREATE INDEX` or primary-key membership) get an entry
/// here; a lookup miss never creates one.
type SecondaryIndex = IndexMap<Value, Vec<RowId>>;

#[derive(Debug, Clone)]
struct UniqueIndex {
    columns: Vec<String>,
    index: IndexMap<Vec<Value>, RowId>,
}

/// A table's schema, constraints, row storage and every derived index.
/// Cross-table checks (foreign keys, drop protection) live on
/// [`crate::catalog::Catalog`], which alone has visibility into other
/// tables; a `Table` never holds a reference back to its catalog.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub schema: IndexMap<String, ColumnType>,
    pub primary_key: Vec<String>,
    pub unique: Vec<Vec<String>>,
    pub foreign_keys: Vec<ForeignKeyDef>,
    rows: RowStore,
    pk_index: IndexMap<Vec<Value>, RowId>,
    unique_indexes: Vec<UniqueIndex>,
    secondary_indexes: IndexMap<String, SecondaryIndex>,
}

impl Table {
    pub fn new(
        name: String,
        schema: IndexMap<String, ColumnType>,
        primary_key: Vec<String>,
        unique: Vec<Vec<String>>,
        foreign_keys: Vec<ForeignKeyDef>,
    ) -> Self {
        let unique_indexes = unique
            .iter()
            .map(|columns| UniqueIndex {
                columns: columns.clone(),
                index: IndexMap::default(),
            })
            .collect();
        let mut table = Self {
            name,
            schema,
            primary_key,
            unique,
            foreign_keys,
            rows: RowStore::new(),
            pk_index: IndexMap::default(),
            unique_indexes,
            secondary_indexes: IndexMap::default(),
        };
        for column in table.primary_key.clone() {
            table
                .create_index(&column)
                .expect("primary-key columns are drawn from this table's own schema");
        }
        table
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn get_row(&self, id: &RowId) -> Option<&Row> {
        self.rows.get(id)
    }

    fn tuple_for(columns: &[String], row: &Row) -> Vec<Value> {
        columns
            .iter()
            .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// True if some row in this table carries `value` at `column`,
    /// using the secondary index when one exists and falling back to a
    /// full scan otherwise.
    pub fn contains_value(&self, column: &str, value: &Value) -> bool {
        if let Some(index) = self.secondary_indexes.get(column) {
            index.get(value).is_some_and(|ids| !ids.is_empty())
        } else {
            self.rows.iter().any(|(_, row)| row.get(column) == Some(value))
        }
    }

    /// Row ids carrying `value` at `column`, via index when available.
    pub fn lookup(&self, column: &str, value: &Value) -> Vec<RowId> {
        if let Some(index) = self.secondary_indexes.get(column) {
            index.get(value).cloned().unwrap_or_default()
        } else {
            self.rows
                .iter()
                .filter(|(_, row)| row.get(column) == Some(value))
                .map(|(id, _)| *id)
                .collect()
        }
    }

    pub fn has_secondary_index(&self, column: &str) -> bool {
        self.secondary_indexes.contains_key(column)
    }

    /// Completeness/type check, plus PK and unique-constraint checks.
    /// Does not check foreign keys; that requires catalog-wide
    /// visibility and is performed by the caller before mutating.
    pub fn validate_insert(&self, fields: &Row) -> Result<(), ExecutionError> {
        for (column, ty) in &self.schema {
            let value = fields
                .get(column)
                .ok_or_else(|| ExecutionError::UnknownColumn {
                    column: column.clone(),
                })?;
            check_type(column, value, *ty)?;
        }

        if !self.primary_key.is_empty() {
            let tuple = Self::tuple_for(&self.primary_key, fields);
            if self.pk_index.contains_key(&tuple) {
                return Err(ExecutionError::DuplicatePrimaryKey);
            }
        }
        for unique in &self.unique_indexes {
            let tuple = Self::tuple_for(&unique.columns, fields);
            if unique.index.contains_key(&tuple) {
                return Err(ExecutionError::DuplicateUniqueKey);
            }
        }
        Ok(())
    }

    /// Commits a row already passed [`Table::validate_insert`] (and any
    /// foreign-key check the caller ran). Allocates a fresh row id.
    pub fn insert_unchecked(&mut self, fields: Row) -> RowId {
        let id = RowId::new_v4();
        if !self.primary_key.is_empty() {
            let tuple = Self::tuple_for(&self.primary_key, &fields);
            self.pk_index.insert(tuple, id);
        }
        for unique in &mut self.unique_indexes {
            let tuple = Self::tuple_for(&unique.columns, &fields);
            unique.index.insert(tuple, id);
        }
        for (column, index) in &mut self.secondary_indexes {
            let value = fields.get(column).cloned().unwrap_or(Value::Null);
            index.entry(value).or_default().push(id);
        }
        self.rows.insert(id, fields);
        id
    }

    /// Overlays `partial` onto the stored row for `id`, returning the
    /// candidate without mutating anything yet.
    pub fn candidate_for_update(&self, id: &RowId, partial: &Row) -> Result<Row, ExecutionError> {
        let mut candidate = self
            .rows
            .get(id)
            .cloned()
            .ok_or(ExecutionError::UnknownColumn {
                column: "<row>".to_string(),
            })?;
        for (column, value) in partial {
            candidate.insert(column.clone(), value.clone());
        }
        Ok(candidate)
    }

    /// PK/unique recheck for an update: a tuple unchanged by the update
    /// is never rechecked, matching invariant I3 without porting the
    /// source's conditional branching bug.
    pub fn validate_update(&self, id: &RowId, candidate: &Row) -> Result<(), ExecutionError> {
        let old = self.rows.get(id).expect("row id validated by caller");
        for (column, ty) in &self.schema {
            let value = candidate
                .get(column)
                .ok_or_else(|| ExecutionError::UnknownColumn {
                    column: column.clone(),
                })?;
            check_type(column, value, *ty)?;
        }

        if !self.primary_key.is_empty() {
            let old_tuple = Self::tuple_for(&self.primary_key, old);
            let new_tuple = Self::tuple_for(&self.primary_key, candidate);
            if old_tuple != new_tuple && self.pk_index.contains_key(&new_tuple) {
                return Err(ExecutionError::DuplicatePrimaryKey);
            }
        }
        for unique in &self.unique_indexes {
            let old_tuple = Self::tuple_for(&unique.columns, old);
            let new_tuple = Self::tuple_for(&unique.columns, candidate);
            if old_tuple != new_tuple && unique.index.contains_key(&new_tuple) {
                return Err(ExecutionError::DuplicateUniqueKey);
            }
        }
        Ok(())
    }

    pub fn update_unchecked(&mut self, id: RowId, candidate: Row) {
        let old = self.rows.get(&id).cloned().expect("row id validated by caller");

        if !self.primary_key.is_empty() {
            let old_tuple = Self::tuple_for(&self.primary_key, &old);
            let new_tuple = Self::tuple_for(&self.primary_key, &candidate);
            if old_tuple != new_tuple {
                self.pk_index.shift_remove(&old_tuple);
                self.pk_index.insert(new_tuple, id);
            }
        }
        for unique in &mut self.unique_indexes {
            let old_tuple = Self::tuple_for(&unique.columns, &old);
            let new_tuple = Self::tuple_for(&unique.columns, &candidate);
            if old_tuple != new_tuple {
                unique.index.shift_remove(&old_tuple);
                unique.index.insert(new_tuple, id);
            }
        }
        for (column, index) in &mut self.secondary_indexes {
            let old_value = old.get(column).cloned().unwrap_or(Value::Null);
            let new_value = candidate.get(column).cloned().unwrap_or(Value::Null);
            if old_value != new_value {
                if let Some(postings) = index.get_mut(&old_value) {
                    postings.retain(|posted| *posted != id);
                    if postings.is_empty() {
                        index.shift_remove(&old_value);
                    }
                }
                index.entry(new_value).or_default().push(id);
            }
        }
        self.rows.insert(id, candidate);
    }

    pub fn remove_unchecked(&mut self, id: &RowId) -> Option<Row> {
        let row = self.rows.remove(id)?;
        if !self.primary_key.is_empty() {
            let tuple = Self::tuple_for(&self.primary_key, &row);
            self.pk_index.shift_remove(&tuple);
        }
        for unique in &mut self.unique_indexes {
            let tuple = Self::tuple_for(&unique.columns, &row);
            unique.index.shift_remove(&tuple);
        }
        for (column, index) in &mut self.secondary_indexes {
            let value = row.get(column).cloned().unwrap_or(Value::Null);
            if let Some(postings) = index.get_mut(&value) {
                postings.retain(|posted| *posted != *id);
                if postings.is_empty() {
                    index.shift_remove(&value);
                }
            }
        }
        Some(row)
    }

    /// Finds the row id for a row by primary key (if declared) or a
    /// linear scan for structural equality otherwise. Used by the
    /// executor to turn a selected row back into an id for update/delete.
    pub fn id_for_row(&self, row: &Row) -> Option<RowId> {
        if !self.primary_key.is_empty() {
            let tuple = Self::tuple_for(&self.primary_key, row);
            return self.pk_index.get(&tuple).copied();
        }
        self.rows.iter().find(|(_, r)| *r == row).map(|(id, _)| *id)
    }

    /// Builds a secondary index over `column` by scanning all rows,
    /// replacing any prior index on that column.
    pub fn create_index(&mut self, column: &str) -> Result<(), ExecutionError> {
        if !self.schema.contains_key(column) {
            return Err(ExecutionError::UnknownColumn {
                column: column.to_string(),
            });
        }
        let mut index: SecondaryIndex = IndexMap::default();
        for (id, row) in self.rows.iter() {
            let value = row.get(column).cloned().unwrap_or(Value::Null);
            index.entry(value).or_default().push(*id);
        }
        self.secondary_indexes.insert(column.to_string(), index);
        Ok(())
    }
}
