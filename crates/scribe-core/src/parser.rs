use crate::ast::*;
use crate::errors::ParseError;
use crate::token::{Token, TokenKind};

/// Single-lookahead recursive-descent parser over a finished token stream.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect_keyword(&mut self, word: &str) -> Result<Token, ParseError> {
        if self.current().is_keyword(word) {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("keyword '{word}'"),
                found: self.current().clone(),
            })
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<Token, ParseError> {
        if self.current().is_symbol(symbol) {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("'{symbol}'"),
                found: self.current().clone(),
            })
        }
    }

    fn expect_operator(&mut self, op: &str) -> Result<Token, ParseError> {
        if self.current().is_operator(op) {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("operator '{op}'"),
                found: self.current().clone(),
            })
        }
    }

    fn consume_optional_semicolon(&mut self) {
        if self.current().is_symbol(';') {
            self.advance();
        }
    }

    /// An identifier in this grammar is any non-keyword identifier, or any
    /// keyword token used positionally where an identifier is required.
    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        match self.current().kind {
            TokenKind::Identifier | TokenKind::Keyword => Ok(self.advance().text.to_string()),
            _ => Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: self.current().clone(),
            }),
        }
    }

    /// A dotted `table.column` reference, used where the grammar allows a
    /// projection or join operand to be table-qualified.
    fn parse_qualified_identifier(&mut self) -> Result<String, ParseError> {
        let mut name = self.parse_identifier()?;
        if self.current().is_symbol('.') {
            self.advance();
            let part = self.parse_identifier()?;
            name = format!("{name}.{part}");
        }
        Ok(name)
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut idents = vec![self.parse_identifier()?];
        while self.current().is_symbol(',') {
            self.advance();
            idents.push(self.parse_identifier()?);
        }
        Ok(idents)
    }

    fn parse_value(&mut self) -> Result<Literal, ParseError> {
        match self.current().kind {
            TokenKind::String => Ok(Literal::Text(self.advance().text.to_string())),
            TokenKind::Number => {
                let text = self.advance().text;
                if text.contains('.') {
                    Ok(Literal::Float(text.parse().unwrap_or(0.0)))
                } else {
                    Ok(Literal::Integer(text.parse().unwrap_or(0)))
                }
            }
            TokenKind::Null => {
                self.advance();
                Ok(Literal::Null)
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "a value".to_string(),
                found: self.current().clone(),
            }),
        }
    }

    fn parse_value_list(&mut self) -> Result<Vec<Literal>, ParseError> {
        let mut values = vec![self.parse_value()?];
        while self.current().is_symbol(',') {
            self.advance();
            values.push(self.parse_value()?);
        }
        Ok(values)
    }

    fn parse_comparison_op(&mut self) -> Result<ComparisonOp, ParseError> {
        if self.current().kind != TokenKind::Operator {
            return Err(ParseError::UnexpectedToken {
                expected: "a comparison operator".to_string(),
                found: self.current().clone(),
            });
        }
        let token = self.advance();
        ComparisonOp::from_token_text(&token.text).ok_or(ParseError::UnexpectedToken {
            expected: "a comparison operator".to_string(),
            found: token,
        })
    }

    fn parse_where(&mut self) -> Result<WhereClause, ParseError> {
        self.expect_keyword("WHERE")?;
        let column = self.parse_identifier()?;
        let op = self.parse_comparison_op()?;
        let value = self.parse_value()?;
        Ok(WhereClause { column, op, value })
    }

    fn parse_order_by(&mut self) -> Result<OrderBy, ParseError> {
        self.expect_keyword("ORDER")?;
        self.expect_keyword("BY")?;
        let column = self.parse_identifier()?;
        let direction = if self.current().is_keyword("ASC") {
            self.advance();
            SortDirection::Asc
        } else if self.current().is_keyword("DESC") {
            self.advance();
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Ok(OrderBy { column, direction })
    }

    fn parse_join(&mut self) -> Result<JoinClause, ParseError> {
        let kind = match self.advance().text.as_str() {
            "INNER" => JoinKind::Inner,
            "LEFT" => JoinKind::Left,
            "RIGHT" => JoinKind::Right,
            "OUTER" => JoinKind::Outer,
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "a join keyword".to_string(),
                    found: Token::new(TokenKind::Keyword, other, 0..0),
                });
            }
        };
        self.expect_keyword("JOIN")?;
        let table = self.parse_identifier()?;
        self.expect_keyword("ON")?;
        let on_left = self.parse_qualified_identifier()?;
        self.expect_operator("=")?;
        let on_right = self.parse_qualified_identifier()?;
        Ok(JoinClause {
            kind,
            table,
            on_left,
            on_right,
        })
    }

    fn parse_columns(&mut self) -> Result<Vec<String>, ParseError> {
        if self.current().is_symbol('*') {
            self.advance();
            return Ok(vec!["*".to_string()]);
        }
        let mut columns = vec![self.parse_qualified_identifier()?];
        while self.current().is_symbol(',') {
            self.advance();
            columns.push(self.parse_qualified_identifier()?);
        }
        Ok(columns)
    }

    fn parse_select(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect_keyword("SELECT")?;
        let columns = self.parse_columns()?;
        self.expect_keyword("FROM")?;
        let table = self.parse_identifier()?;
        let mut joins = Vec::new();
        while matches!(self.current().text.as_str(), "INNER" | "LEFT" | "RIGHT" | "OUTER")
            && self.current().kind == TokenKind::Keyword
        {
            joins.push(self.parse_join()?);
        }
        let r#where = if self.current().is_keyword("WHERE") {
            Some(self.parse_where()?)
        } else {
            None
        };
        let order_by = if self.current().is_keyword("ORDER") {
            Some(self.parse_order_by()?)
        } else {
            None
        };
        self.consume_optional_semicolon();
        Ok(SelectStatement {
            columns,
            table,
            joins,
            r#where,
            order_by,
        })
    }

    fn parse_insert(&mut self) -> Result<InsertStatement, ParseError> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table = self.parse_identifier()?;
        self.expect_symbol('(')?;
        let columns = self.parse_identifier_list()?;
        self.expect_symbol(')')?;
        self.expect_keyword("VALUES")?;
        self.expect_symbol('(')?;
        let values = self.parse_value_list()?;
        self.expect_symbol(')')?;
        self.consume_optional_semicolon();
        Ok(InsertStatement {
            table,
            columns,
            values,
        })
    }

    fn parse_set_clauses(&mut self) -> Result<Vec<(String, Literal)>, ParseError> {
        let mut assignments = Vec::new();
        loop {
            let column = self.parse_identifier()?;
            self.expect_operator("=")?;
            let value = self.parse_value()?;
            assignments.push((column, value));
            if self.current().is_symbol(',') {
                self.advance();
                continue;
            }
            break;
        }
        Ok(assignments)
    }

    fn parse_update(&mut self) -> Result<UpdateStatement, ParseError> {
        self.expect_keyword("UPDATE")?;
        let table = self.parse_identifier()?;
        self.expect_keyword("SET")?;
        let assignments = self.parse_set_clauses()?;
        let r#where = if self.current().is_keyword("WHERE") {
            Some(self.parse_where()?)
        } else {
            None
        };
        self.consume_optional_semicolon();
        Ok(UpdateStatement {
            table,
            assignments,
            r#where,
        })
    }

    fn parse_delete(&mut self) -> Result<DeleteStatement, ParseError> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let table = self.parse_identifier()?;
        let r#where = if self.current().is_keyword("WHERE") {
            Some(self.parse_where()?)
        } else {
            None
        };
        self.consume_optional_semicolon();
        Ok(DeleteStatement { table, r#where })
    }

    fn parse_column_type(&mut self) -> Result<ColumnTypeName, ParseError> {
        match self.current().kind {
            TokenKind::Identifier | TokenKind::Keyword => {
                let word = self.advance().text.to_ascii_uppercase();
                Ok(match word.as_str() {
                    "INT" | "INTEGER" => ColumnTypeName::Integer,
                    "FLOAT" => ColumnTypeName::Float,
                    _ => ColumnTypeName::Text,
                })
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "a column type".to_string(),
                found: self.current().clone(),
            }),
        }
    }

    #[allow(clippy::type_complexity)]
    fn parse_table_constraints(
        &mut self,
    ) -> Result<(Vec<ColumnDef>, Vec<String>, Vec<Vec<String>>, Vec<ForeignKeyDef>), ParseError>
    {
        let mut columns = Vec::new();
        let mut primary_key = Vec::new();
        let mut unique = Vec::new();
        let mut foreign_keys = Vec::new();
        loop {
            if self.current().is_keyword("PRIMARY") {
                self.advance();
                self.expect_keyword("KEY")?;
                self.expect_symbol('(')?;
                primary_key.extend(self.parse_identifier_list()?);
                self.expect_symbol(')')?;
            } else if self.current().is_keyword("UNIQUE") {
                self.advance();
                self.expect_symbol('(')?;
                unique.push(self.parse_identifier_list()?);
                self.expect_symbol(')')?;
            } else if self.current().is_keyword("FOREIGN") {
                self.advance();
                self.expect_keyword("KEY")?;
                self.expect_symbol('(')?;
                let column = self.parse_identifier()?;
                self.expect_symbol(')')?;
                self.expect_keyword("REFERENCES")?;
                let ref_table = self.parse_identifier()?;
                self.expect_symbol('(')?;
                let ref_column = self.parse_identifier()?;
                self.expect_symbol(')')?;
                foreign_keys.push(ForeignKeyDef {
                    column,
                    ref_table,
                    ref_column,
                });
            } else {
                let name = self.parse_identifier()?;
                let type_name = self.parse_column_type()?;
                columns.push(ColumnDef { name, type_name });
            }
            if self.current().is_symbol(',') {
                self.advance();
                continue;
            }
            break;
        }
        Ok((columns, primary_key, unique, foreign_keys))
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStatement, ParseError> {
        self.expect_keyword("TABLE")?;
        let table = self.parse_identifier()?;
        self.expect_symbol('(')?;
        let (columns, primary_key, unique, foreign_keys) = self.parse_table_constraints()?;
        self.expect_symbol(')')?;
        self.consume_optional_semicolon();
        Ok(CreateTableStatement {
            table,
            columns,
            primary_key,
            unique,
            foreign_keys,
        })
    }

    fn parse_create_index(&mut self) -> Result<CreateIndexStatement, ParseError> {
        self.expect_keyword("INDEX")?;
        self.expect_keyword("ON")?;
        let table = self.parse_identifier()?;
        self.expect_symbol('(')?;
        let column = self.parse_identifier()?;
        self.expect_symbol(')')?;
        self.consume_optional_semicolon();
        Ok(CreateIndexStatement { table, column })
    }

    fn parse_create(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword("CREATE")?;
        if self.current().is_keyword("TABLE") {
            Ok(Statement::CreateTable(self.parse_create_table()?))
        } else if self.current().is_keyword("INDEX") {
            Ok(Statement::CreateIndex(self.parse_create_index()?))
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "TABLE or INDEX".to_string(),
                found: self.current().clone(),
            })
        }
    }

    fn parse_drop(&mut self) -> Result<DropTableStatement, ParseError> {
        self.expect_keyword("DROP")?;
        self.expect_keyword("TABLE")?;
        let table = self.parse_identifier()?;
        self.consume_optional_semicolon();
        Ok(DropTableStatement { table })
    }

    /// Parse exactly one statement from the token stream.
    pub fn parse_statement(mut self) -> Result<Statement, ParseError> {
        log::debug!("parsing statement starting at {:?}", self.current());
        if self.current().kind != TokenKind::Keyword {
            return Err(ParseError::UnsupportedStatement {
                found: self.current().clone(),
            });
        }
        match self.current().text.as_str() {
            "SELECT" => Ok(Statement::Select(self.parse_select()?)),
            "INSERT" => Ok(Statement::Insert(self.parse_insert()?)),
            "UPDATE" => Ok(Statement::Update(self.parse_update()?)),
            "DELETE" => Ok(Statement::Delete(self.parse_delete()?)),
            "CREATE" => self.parse_create(),
            "DROP" => Ok(Statement::DropTable(self.parse_drop()?)),
            _ => Err(ParseError::UnsupportedStatement {
                found: self.current().clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse(sql: &str) -> Result<Statement, ParseError> {
        Parser::new(lex(sql).unwrap()).parse_statement()
    }

    #[test]
    fn parses_select_star_with_where() {
        let stmt = parse("SELECT * FROM users WHERE id = 1").unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.columns, vec!["*"]);
                assert_eq!(s.table, "users");
                assert_eq!(s.r#where.unwrap().column, "id");
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn parses_insert() {
        let stmt = parse("INSERT INTO users (id, name) VALUES (1, 'Alice')").unwrap();
        match stmt {
            Statement::Insert(s) => {
                assert_eq!(s.columns, vec!["id", "name"]);
                assert_eq!(s.values, vec![Literal::Integer(1), Literal::Text("Alice".into())]);
            }
            _ => panic!("expected insert"),
        }
    }

    #[test]
    fn parses_create_table_with_constraints() {
        let stmt = parse(
            "CREATE TABLE users (id INT, name TEXT, PRIMARY KEY (id), UNIQUE (name))",
        )
        .unwrap();
        match stmt {
            Statement::CreateTable(s) => {
                assert_eq!(s.primary_key, vec!["id"]);
                assert_eq!(s.unique, vec![vec!["name".to_string()]]);
                assert_eq!(s.columns.len(), 2);
            }
            _ => panic!("expected create table"),
        }
    }

    #[test]
    fn parses_foreign_key_clause() {
        let stmt = parse(
            "CREATE TABLE employees (emp_id INT, dept_id INT, PRIMARY KEY (emp_id), FOREIGN KEY (dept_id) REFERENCES departments(dept_id))",
        )
        .unwrap();
        match stmt {
            Statement::CreateTable(s) => {
                assert_eq!(s.foreign_keys.len(), 1);
                assert_eq!(s.foreign_keys[0].ref_table, "departments");
            }
            _ => panic!("expected create table"),
        }
    }

    #[test]
    fn unknown_type_word_defaults_to_text() {
        let stmt = parse("CREATE TABLE t (a WIDGET)").unwrap();
        match stmt {
            Statement::CreateTable(s) => assert_eq!(s.columns[0].type_name, ColumnTypeName::Text),
            _ => panic!("expected create table"),
        }
    }

    #[test]
    fn parses_inner_join_with_table_qualified_projection() {
        let stmt = parse(
            "SELECT employees.emp_name, departments.dept_name FROM employees INNER JOIN departments ON employees.dept_id = departments.dept_id",
        )
        .unwrap();
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.columns, vec!["employees.emp_name", "departments.dept_name"]);
                assert_eq!(s.joins.len(), 1);
                assert_eq!(s.joins[0].on_left, "employees.dept_id");
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn parses_order_by_desc() {
        let stmt = parse("SELECT name FROM users ORDER BY salary DESC").unwrap();
        match stmt {
            Statement::Select(s) => {
                let order = s.order_by.unwrap();
                assert_eq!(order.direction, SortDirection::Desc);
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn keyword_usable_positionally_as_identifier() {
        // `key` is not a reserved column-name keyword in this dialect's
        // grammar position, but KEY is a keyword token; it must still be
        // usable as an identifier anywhere one is required.
        let stmt = parse("SELECT key FROM t").unwrap();
        match stmt {
            Statement::Select(s) => assert_eq!(s.columns, vec!["KEY"]),
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn unexpected_token_names_the_offender() {
        let err = parse("SELECT * users").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
