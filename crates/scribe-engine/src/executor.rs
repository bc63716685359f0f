use std::cmp::Ordering;

use scribe_core::ast::{
    ComparisonOp, CreateIndexStatement, CreateTableStatement, DeleteStatement, DropTableStatement,
    InsertStatement, JoinClause, SelectStatement, SortDirection, Statement, UpdateStatement, WhereClause,
};
use scribe_helpers::IndexMap;

use crate::catalog::Catalog;
use crate::errors::ExecutionError;
use crate::row::{Row, RowId};
use crate::table::Table;
use crate::value::{coerce, ColumnType, Value};

/// Bit-exact status strings, built in one place so no two call sites
/// can drift apart.
mod status {
    use crate::row::RowId;

    pub fn table_created(name: &str) -> String {
        format!("Table '{name}' created successfully.")
    }
    pub fn table_dropped(name: &str) -> String {
        format!("Table '{name}' dropped successfully.")
    }
    pub fn index_created(column: &str, table: &str) -> String {
        format!("Index on '{column}' created successfully for table '{table}'.")
    }
    pub fn row_inserted(id: RowId) -> String {
        format!("Row inserted with ID {id}.")
    }
    pub fn rows_updated(count: usize) -> String {
        format!("{count} row(s) updated.")
    }
    pub fn rows_deleted(count: usize) -> String {
        format!("{count} row(s) deleted.")
    }
}

/// What running a statement against the catalog produced: either a
/// human-readable status line, or the rows a `SELECT` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Status(String),
    Rows(Vec<Row>),
}

pub fn execute(catalog: &mut Catalog, statement: &Statement) -> Result<Outcome, ExecutionError> {
    log::trace!("executing statement: {statement:?}");
    match statement {
        Statement::CreateTable(stmt) => execute_create_table(catalog, stmt),
        Statement::CreateIndex(stmt) => execute_create_index(catalog, stmt),
        Statement::DropTable(stmt) => execute_drop_table(catalog, stmt),
        Statement::Insert(stmt) => execute_insert(catalog, stmt),
        Statement::Select(stmt) => execute_select(catalog, stmt),
        Statement::Update(stmt) => execute_update(catalog, stmt),
        Statement::Delete(stmt) => execute_delete(catalog, stmt),
    }
}

fn execute_create_table(catalog: &mut Catalog, stmt: &CreateTableStatement) -> Result<Outcome, ExecutionError> {
    catalog.create_table(
        stmt.table.clone(),
        &stmt.columns,
        stmt.primary_key.clone(),
        stmt.unique.clone(),
        stmt.foreign_keys.clone(),
    )?;
    Ok(Outcome::Status(status::table_created(&stmt.table)))
}

fn execute_create_index(catalog: &mut Catalog, stmt: &CreateIndexStatement) -> Result<Outcome, ExecutionError> {
    catalog.create_index(&stmt.table, &stmt.column)?;
    Ok(Outcome::Status(status::index_created(&stmt.column, &stmt.table)))
}

fn execute_drop_table(catalog: &mut Catalog, stmt: &DropTableStatement) -> Result<Outcome, ExecutionError> {
    catalog.drop_table(&stmt.table)?;
    Ok(Outcome::Status(status::table_dropped(&stmt.table)))
}

fn execute_insert(catalog: &mut Catalog, stmt: &InsertStatement) -> Result<Outcome, ExecutionError> {
    if stmt.columns.len() != stmt.values.len() {
        return Err(ExecutionError::ColumnValueCountMismatch);
    }
    let fields = {
        let table = catalog.get(&stmt.table)?;
        let mut fields = Row::default();
        for column in table.schema.keys() {
            fields.insert(column.clone(), Value::Null);
        }
        for (column, literal) in stmt.columns.iter().zip(&stmt.values) {
            let ty = table
                .schema
                .get(column)
                .copied()
                .ok_or_else(|| ExecutionError::UnknownColumn { column: column.clone() })?;
            fields.insert(column.clone(), coerce(literal, column, ty)?);
        }
        fields
    };
    let id = catalog.insert_row(&stmt.table, fields)?;
    Ok(Outcome::Status(status::row_inserted(id)))
}

fn coerce_where_literal(clause: &WhereClause, schema: &IndexMap<String, ColumnType>) -> Result<Value, ExecutionError> {
    let ty = schema.get(&clause.column).copied().unwrap_or(ColumnType::Text);
    coerce(&clause.value, &clause.column, ty)
}

fn evaluate(row_value: Option<&Value>, op: ComparisonOp, value: &Value) -> bool {
    let Some(row_value) = row_value else {
        return false;
    };
    match op {
        ComparisonOp::Eq => row_value == value,
        ComparisonOp::Ne => row_value != value,
        ComparisonOp::Lt => row_value.partial_cmp(value) == Some(Ordering::Less),
        ComparisonOp::Le => matches!(row_value.partial_cmp(value), Some(Ordering::Less) | Some(Ordering::Equal)),
        ComparisonOp::Gt => row_value.partial_cmp(value) == Some(Ordering::Greater),
        ComparisonOp::Ge => matches!(row_value.partial_cmp(value), Some(Ordering::Greater) | Some(Ordering::Equal)),
    }
}

/// Selects this table's own rows for a `WHERE` clause (or all rows if
/// absent), routing equality lookups through a secondary index when one
/// exists and falling back to a full scan otherwise.
fn base_rows(table: &Table, where_clause: Option<&WhereClause>) -> Result<Vec<Row>, ExecutionError> {
    let Some(clause) = where_clause else {
        return Ok(table.rows().iter().map(|(_, row)| row.clone()).collect());
    };
    let value = coerce_where_literal(clause, &table.schema)?;
    if clause.op == ComparisonOp::Eq && table.has_secondary_index(&clause.column) {
        Ok(table
            .lookup(&clause.column, &value)
            .into_iter()
            .filter_map(|id| table.get_row(&id).cloned())
            .collect())
    } else {
        Ok(table
            .rows()
            .iter()
            .filter(|(_, row)| evaluate(row.get(&clause.column), clause.op, &value))
            .map(|(_, row)| row.clone())
            .collect())
    }
}

fn requalify(prefix: &str, row: &Row) -> Row {
    let mut out = Row::default();
    for (column, value) in row {
        out.insert(format!("{prefix}.{column}"), value.clone());
    }
    out
}

/// Looks a join operand up in the accumulated row: an exact key match
/// first, else the bare column name (dropping any `table.` prefix the
/// caller wrote but the row doesn't carry yet).
fn resolve<'a>(row: &'a Row, key: &str) -> Option<&'a Value> {
    row.get(key).or_else(|| {
        let bare = key.rsplit('.').next().unwrap_or(key);
        row.get(bare)
    })
}

/// Applies each join clause in order. The left side is re-keyed to
/// `base_table.col` only on the first join, since every later join's
/// accumulated row is already fully table-qualified; the right side is
/// always fresh and always gets `join_table.col` keys.
fn apply_joins(
    catalog: &Catalog,
    base_table: &str,
    joins: &[JoinClause],
    rows: Vec<Row>,
) -> Result<Vec<Row>, ExecutionError> {
    let mut rows = rows;
    for (i, join) in joins.iter().enumerate() {
        let target = catalog.get(&join.table)?;
        let mut merged = Vec::new();
        for left_row in &rows {
            let Some(left_value) = resolve(left_row, &join.on_left).cloned() else {
                continue;
            };
            for (_, right_row) in target.rows().iter() {
                if resolve(right_row, &join.on_right) != Some(&left_value) {
                    continue;
                }
                let mut merged_row = if i == 0 {
                    requalify(base_table, left_row)
                } else {
                    left_row.clone()
                };
                for (column, value) in requalify(&join.table, right_row) {
                    merged_row.insert(column, value);
                }
                merged.push(merged_row);
            }
        }
        rows = merged;
    }
    Ok(rows)
}

/// Exact match first, then a single `*.col` match; ambiguous or absent
/// bare names are an error rather than a silent pick.
fn project(row: &Row, columns: &[String]) -> Result<Row, ExecutionError> {
    if columns.len() == 1 && columns[0] == "*" {
        return Ok(row.clone());
    }
    let mut out = Row::default();
    for column in columns {
        if column.contains('.') {
            let value = row
                .get(column)
                .cloned()
                .ok_or_else(|| ExecutionError::UnknownColumn { column: column.clone() })?;
            out.insert(column.clone(), value);
            continue;
        }
        let suffix = format!(".{column}");
        let matches: Vec<&Value> = row
            .iter()
            .filter(|(key, _)| key.as_str() == column.as_str() || key.ends_with(&suffix))
            .map(|(_, value)| value)
            .collect();
        match matches.len() {
            0 => return Err(ExecutionError::UnknownColumn { column: column.clone() }),
            1 => {
                out.insert(column.clone(), matches[0].clone());
            }
            _ => return Err(ExecutionError::AmbiguousColumn { column: column.clone() }),
        }
    }
    Ok(out)
}

fn execute_select(catalog: &Catalog, stmt: &SelectStatement) -> Result<Outcome, ExecutionError> {
    let table = catalog.get(&stmt.table)?;
    let rows = base_rows(table, stmt.r#where.as_ref())?;
    let mut rows = apply_joins(catalog, &stmt.table, &stmt.joins, rows)?;

    if let Some(order) = &stmt.order_by {
        rows.sort_by(|a, b| {
            let cmp = match (a.get(&order.column), b.get(&order.column)) {
                (Some(x), Some(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            if order.direction == SortDirection::Desc {
                cmp.reverse()
            } else {
                cmp
            }
        });
    }

    let projected = rows
        .iter()
        .map(|row| project(row, &stmt.columns))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Outcome::Rows(projected))
}

fn execute_update(catalog: &mut Catalog, stmt: &UpdateStatement) -> Result<Outcome, ExecutionError> {
    let (ids, partial) = {
        let table = catalog.get(&stmt.table)?;
        let targets = base_rows(table, stmt.r#where.as_ref())?;
        let ids: Vec<RowId> = targets.iter().filter_map(|row| table.id_for_row(row)).collect();
        let mut partial = Row::default();
        for (column, literal) in &stmt.assignments {
            let ty = table
                .schema
                .get(column)
                .copied()
                .ok_or_else(|| ExecutionError::UnknownColumn { column: column.clone() })?;
            partial.insert(column.clone(), coerce(literal, column, ty)?);
        }
        (ids, partial)
    };
    let mut count = 0usize;
    for id in ids {
        catalog.update_row(&stmt.table, id, &partial)?;
        count += 1;
    }
    Ok(Outcome::Status(status::rows_updated(count)))
}

fn execute_delete(catalog: &mut Catalog, stmt: &DeleteStatement) -> Result<Outcome, ExecutionError> {
    let ids = {
        let table = catalog.get(&stmt.table)?;
        let targets = base_rows(table, stmt.r#where.as_ref())?;
        targets
            .iter()
            .filter_map(|row| table.id_for_row(row))
            .collect::<Vec<_>>()
    };
    let mut count = 0usize;
    for id in ids {
        catalog.delete_row(&stmt.table, id)?;
        count += 1;
    }
    Ok(Outcome::Status(status::rows_deleted(count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::parse;
    use pretty_assertions::assert_eq;

    fn run(catalog: &mut Catalog, sql: &str) -> Outcome {
        let statement = parse(sql).unwrap();
        execute(catalog, &statement).unwrap()
    }

    #[test]
    fn create_table_without_constraints() {
        let mut catalog = Catalog::new();
        let outcome = run(
            &mut catalog,
            "CREATE TABLE products (product_id INT, product_name TEXT, price FLOAT);",
        );
        assert_eq!(
            outcome,
            Outcome::Status("Table 'products' created successfully.".to_string())
        );
        let table = catalog.get("products").unwrap();
        assert!(table.primary_key.is_empty());
    }

    #[test]
    fn duplicate_primary_key_is_rejected() {
        let mut catalog = Catalog::new();
        run(
            &mut catalog,
            "CREATE TABLE users(id INT, name TEXT, PRIMARY KEY(id));",
        );
        run(&mut catalog, "INSERT INTO users(id,name) VALUES (1,'Alice');");
        let statement = parse("INSERT INTO users(id,name) VALUES (1,'Bob');").unwrap();
        let err = execute(&mut catalog, &statement).unwrap_err();
        assert!(err.to_string().contains("Duplicate primary key"));
    }

    #[test]
    fn foreign_key_rejection() {
        let mut catalog = Catalog::new();
        run(&mut catalog, "CREATE TABLE departments(dept_id INT, PRIMARY KEY(dept_id));");
        run(
            &mut catalog,
            "CREATE TABLE employees(emp_id INT, emp_name TEXT, dept_id INT, PRIMARY KEY(emp_id), FOREIGN KEY(dept_id) REFERENCES departments(dept_id));",
        );
        run(&mut catalog, "INSERT INTO departments(dept_id) VALUES (1);");
        let statement = parse("INSERT INTO employees(emp_id,emp_name,dept_id) VALUES(102,'Bob',2);").unwrap();
        let err = execute(&mut catalog, &statement).unwrap_err();
        assert_eq!(err, ExecutionError::ForeignKeyViolation);
    }

    #[test]
    fn inner_join_with_table_qualified_projection() {
        let mut catalog = Catalog::new();
        run(&mut catalog, "CREATE TABLE departments(dept_id INT, dept_name TEXT, PRIMARY KEY(dept_id));");
        run(
            &mut catalog,
            "CREATE TABLE employees(emp_id INT, emp_name TEXT, dept_id INT, salary FLOAT, PRIMARY KEY(emp_id));",
        );
        run(&mut catalog, "INSERT INTO departments(dept_id,dept_name) VALUES (1,'Engineering');");
        run(&mut catalog, "INSERT INTO departments(dept_id,dept_name) VALUES (2,'HR');");
        run(&mut catalog, "INSERT INTO employees(emp_id,emp_name,dept_id,salary) VALUES(101,'Alice',1,70000);");
        run(&mut catalog, "INSERT INTO employees(emp_id,emp_name,dept_id,salary) VALUES(102,'Bob',2,50000);");
        run(&mut catalog, "INSERT INTO employees(emp_id,emp_name,dept_id,salary) VALUES(103,'Charlie',1,80000);");

        let statement = parse(
            "SELECT employees.emp_name, departments.dept_name FROM employees INNER JOIN departments ON employees.dept_id = departments.dept_id;",
        )
        .unwrap();
        let Outcome::Rows(rows) = execute(&mut catalog, &statement).unwrap() else {
            panic!("expected rows");
        };
        let names: Vec<(Value, Value)> = rows
            .iter()
            .map(|r| {
                (
                    r.get("employees.emp_name").cloned().unwrap(),
                    r.get("departments.dept_name").cloned().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            names,
            vec![
                (Value::Text("Alice".into()), Value::Text("Engineering".into())),
                (Value::Text("Bob".into()), Value::Text("HR".into())),
                (Value::Text("Charlie".into()), Value::Text("Engineering".into())),
            ]
        );
    }

    #[test]
    fn order_by_asc_and_desc() {
        let mut catalog = Catalog::new();
        run(&mut catalog, "CREATE TABLE users(name TEXT, age INT);");
        run(&mut catalog, "INSERT INTO users(name,age) VALUES ('a',30);");
        run(&mut catalog, "INSERT INTO users(name,age) VALUES ('b',10);");
        run(&mut catalog, "INSERT INTO users(name,age) VALUES ('c',20);");

        let statement = parse("SELECT name, age FROM users ORDER BY age ASC;").unwrap();
        let Outcome::Rows(rows) = execute(&mut catalog, &statement).unwrap() else {
            panic!("expected rows");
        };
        let ages: Vec<Value> = rows.iter().map(|r| r.get("age").cloned().unwrap()).collect();
        assert_eq!(ages, vec![Value::Integer(10), Value::Integer(20), Value::Integer(30)]);
    }

    #[test]
    fn referential_drop_then_success() {
        let mut catalog = Catalog::new();
        run(&mut catalog, "CREATE TABLE parent(id INT, PRIMARY KEY(id));");
        run(
            &mut catalog,
            "CREATE TABLE child(id INT, parent_id INT, PRIMARY KEY(id), FOREIGN KEY(parent_id) REFERENCES parent(id));",
        );
        let statement = parse("DROP TABLE parent;").unwrap();
        let err = execute(&mut catalog, &statement).unwrap_err();
        assert!(err.to_string().contains("Cannot drop table 'parent'"));
        run(&mut catalog, "DROP TABLE child;");
        let outcome = run(&mut catalog, "DROP TABLE parent;");
        assert_eq!(outcome, Outcome::Status("Table 'parent' dropped successfully.".to_string()));
    }

    #[test]
    fn composite_unique_constraint() {
        let mut catalog = Catalog::new();
        run(
            &mut catalog,
            "CREATE TABLE events(user_id INT, event_id INT, registration_date TEXT, PRIMARY KEY(user_id,event_id), UNIQUE(user_id,registration_date));",
        );
        run(&mut catalog, "INSERT INTO events(user_id,event_id,registration_date) VALUES (1,100,'2023-01-01');");
        let statement = parse(
            "INSERT INTO events(user_id,event_id,registration_date) VALUES (1,101,'2023-01-01');",
        )
        .unwrap();
        let err = execute(&mut catalog, &statement).unwrap_err();
        assert_eq!(err, ExecutionError::DuplicateUniqueKey);
        run(&mut catalog, "INSERT INTO events(user_id,event_id,registration_date) VALUES (1,101,'2023-01-02');");
    }
}
