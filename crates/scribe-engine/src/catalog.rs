use scribe_core::ast::{ColumnDef, ForeignKeyDef};
use scribe_helpers::IndexMap;

use crate::errors::ExecutionError;
use crate::row::{Row, RowId};
use crate::table::Table;
use crate::value::{ColumnType, Value};

fn unknown_table(name: &str) -> ExecutionError {
    ExecutionError::UnknownTable {
        name: name.to_string(),
    }
}

/// The name -> table map. Foreign-key validation and drop protection
/// live here, not on `Table`, because they require visibility into
/// every other table; a table never holds a reference back to its
/// catalog.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    tables: IndexMap<String, Table>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Result<&Table, ExecutionError> {
        self.tables.get(name).ok_or_else(|| unknown_table(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Table, ExecutionError> {
        self.tables.get_mut(name).ok_or_else(|| unknown_table(name))
    }

    pub fn create_table(
        &mut self,
        name: String,
        columns: &[ColumnDef],
        primary_key: Vec<String>,
        unique: Vec<Vec<String>>,
        foreign_keys: Vec<ForeignKeyDef>,
    ) -> Result<(), ExecutionError> {
        if self.tables.contains_key(&name) {
            return Err(ExecutionError::TableAlreadyExists { name });
        }
        let mut schema = IndexMap::default();
        for column in columns {
            schema.insert(column.name.clone(), ColumnType::from(column.type_name));
        }
        let table = Table::new(name.clone(), schema, primary_key, unique, foreign_keys);
        self.tables.insert(name, table);
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<(), ExecutionError> {
        if !self.tables.contains_key(name) {
            return Err(unknown_table(name));
        }
        if let Some(referencing) = self.referencing_table(name) {
            return Err(ExecutionError::CannotDropReferencedTable {
                name: name.to_string(),
                referencing_table: referencing,
            });
        }
        self.tables.shift_remove(name);
        Ok(())
    }

    fn referencing_table(&self, target: &str) -> Option<String> {
        self.tables
            .iter()
            .find(|(name, table)| {
                name.as_str() != target && table.foreign_keys.iter().any(|fk| fk.ref_table == target)
            })
            .map(|(name, _)| name.to_string())
    }

    fn validate_foreign_keys(&self, table_name: &str, row: &Row, only_changed: Option<&Row>) -> Result<(), ExecutionError> {
        let table = self.get(table_name)?;
        for fk in &table.foreign_keys {
            if let Some(old) = only_changed {
                if old.get(&fk.column) == row.get(&fk.column) {
                    continue;
                }
            }
            let Some(value) = row.get(&fk.column) else {
                continue;
            };
            if matches!(value, Value::Null) {
                continue;
            }
            let ref_table = self.get(&fk.ref_table)?;
            if !ref_table.contains_value(&fk.ref_column, value) {
                return Err(ExecutionError::ForeignKeyViolation);
            }
        }
        Ok(())
    }

    /// Validates completeness/type/PK/unique (via the table) and
    /// foreign keys (here, across tables), then commits. Validation
    /// fully precedes mutation: no index is touched on a failed check.
    pub fn insert_row(&mut self, table_name: &str, fields: Row) -> Result<RowId, ExecutionError> {
        let table = self.get(table_name)?;
        table.validate_insert(&fields)?;
        self.validate_foreign_keys(table_name, &fields, None)?;
        let table = self.get_mut(table_name)?;
        Ok(table.insert_unchecked(fields))
    }

    pub fn update_row(&mut self, table_name: &str, id: RowId, partial: &Row) -> Result<(), ExecutionError> {
        let table = self.get(table_name)?;
        let old = table
            .get_row(&id)
            .cloned()
            .ok_or_else(|| unknown_table(table_name))?;
        let candidate = table.candidate_for_update(&id, partial)?;
        table.validate_update(&id, &candidate)?;
        self.validate_foreign_keys(table_name, &candidate, Some(&old))?;
        let table = self.get_mut(table_name)?;
        table.update_unchecked(id, candidate);
        Ok(())
    }

    /// Referential integrity check for delete: no other table may hold
    /// a non-null foreign key pointing at this row via the declared
    /// `(local column, referenced column)` pair.
    fn validate_delete(&self, table_name: &str, row: &Row) -> Result<(), ExecutionError> {
        for (other_name, other) in self.tables.iter() {
            for fk in &other.foreign_keys {
                if fk.ref_table != table_name {
                    continue;
                }
                let Some(value) = row.get(&fk.ref_column) else {
                    continue;
                };
                if matches!(value, Value::Null) {
                    continue;
                }
                if other.contains_value(&fk.column, value) {
                    return Err(ExecutionError::ReferencedByForeignKey {
                        referencing_table: other_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn delete_row(&mut self, table_name: &str, id: RowId) -> Result<(), ExecutionError> {
        let table = self.get(table_name)?;
        let row = table.get_row(&id).cloned().ok_or_else(|| unknown_table(table_name))?;
        self.validate_delete(table_name, &row)?;
        let table = self.get_mut(table_name)?;
        table.remove_unchecked(&id);
        Ok(())
    }

    pub fn create_index(&mut self, table_name: &str, column: &str) -> Result<(), ExecutionError> {
        let table = self.get_mut(table_name)?;
        table.create_index(column)?;
        Ok(())
    }
}
