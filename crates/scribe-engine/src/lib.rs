//! In-memory table engine, catalog and query executor.
//!
//! `scribe-core` turns source text into a [`scribe_core::ast::Statement`];
//! this crate runs one against a [`Catalog`] and returns an [`Outcome`].

mod catalog;
mod errors;
mod executor;
mod row;
mod table;
mod value;

pub use catalog::Catalog;
pub use errors::ExecutionError;
pub use executor::{execute, Outcome};
pub use row::{Row, RowId};
pub use table::Table;
pub use value::{ColumnType, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::parse;

    #[test]
    fn round_trip_insert_then_select_by_primary_key() {
        let mut catalog = Catalog::new();
        let create = parse("CREATE TABLE users(id INT, name TEXT, PRIMARY KEY(id));").unwrap();
        execute(&mut catalog, &create).unwrap();
        let insert = parse("INSERT INTO users(id,name) VALUES (1,'Alice');").unwrap();
        execute(&mut catalog, &insert).unwrap();

        let select = parse("SELECT id, name FROM users WHERE id = 1;").unwrap();
        let Outcome::Rows(rows) = execute(&mut catalog, &select).unwrap() else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
        assert_eq!(rows[0].get("name"), Some(&Value::Text("Alice".to_string())));
    }
}
