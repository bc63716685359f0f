use thiserror::Error;

use crate::value::ColumnType;

/// Failures raised while executing a parsed statement against the
/// catalog. Message text is part of the external contract: callers
/// match on these strings, so wording here is not cosmetic.
#[derive(Debug, Error, PartialEq)]
pub enum ExecutionError {
    #[error("Table '{name}' does not exist.")]
    UnknownTable { name: String },

    #[error("Table '{name}' already exists.")]
    TableAlreadyExists { name: String },

    #[error("Column '{column}' does not exist")]
    UnknownColumn { column: String },

    #[error("Ambiguous column '{column}'")]
    AmbiguousColumn { column: String },

    #[error("Duplicate primary key")]
    DuplicatePrimaryKey,

    #[error("Duplicate unique key")]
    DuplicateUniqueKey,

    #[error("Foreign key constraint failed")]
    ForeignKeyViolation,

    #[error("Cannot delete row: referenced by '{referencing_table}'")]
    ReferencedByForeignKey { referencing_table: String },

    #[error("Cannot drop table '{name}': referenced by '{referencing_table}'")]
    CannotDropReferencedTable {
        name: String,
        referencing_table: String,
    },

    #[error("column '{column}' expects {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        found: String,
    },

    #[error("column count does not match value count")]
    ColumnValueCountMismatch,
}
