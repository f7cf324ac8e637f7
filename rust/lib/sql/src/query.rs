//! Composable `WHERE` predicates and a small `SELECT` builder.
//!
//! Predicates render to SQL with numbered placeholders (`?1`, `?2`, ...)
//! and push their bound values onto a shared parameter list, so several
//! predicates can be combined into one statement without the caller
//! tracking placeholder indexes.
//!
//! ```ignore
//! let select = Select::new("expenses")
//!     .filter(Predicate::eq("company_id", 1).and(Predicate::eq("created_by", 7)))
//!     .limit(50);
//! let rows = store.select(&select)?;
//! ```

use crate::error::SQLError;
use crate::traits::Value;

/// A boolean condition over the columns of a single table.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every row.
    True,
    /// Matches no row.
    False,
    Eq(String, Value),
    /// Column value is one of the listed values. An empty list matches nothing.
    In(String, Vec<Value>),
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq(column.into(), value.into())
    }

    pub fn is_in<V: Into<Value>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Predicate::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    /// Conjunction, flattening nested `And`s and dropping `True` operands.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::True, p) | (p, Predicate::True) => p,
            (Predicate::False, _) | (_, Predicate::False) => Predicate::False,
            (Predicate::And(mut a), Predicate::And(b)) => {
                a.extend(b);
                Predicate::And(a)
            }
            (Predicate::And(mut a), p) => {
                a.push(p);
                Predicate::And(a)
            }
            (p, Predicate::And(mut b)) => {
                b.insert(0, p);
                Predicate::And(b)
            }
            (a, b) => Predicate::And(vec![a, b]),
        }
    }

    /// Render as a SQL boolean expression, appending bound values to `params`.
    pub fn render(&self, params: &mut Vec<Value>) -> Result<String, SQLError> {
        match self {
            Predicate::True => Ok("1 = 1".to_string()),
            Predicate::False => Ok("1 = 0".to_string()),
            Predicate::Eq(column, value) => {
                let column = ident(column)?;
                if *value == Value::Null {
                    return Ok(format!("{} IS NULL", column));
                }
                params.push(value.clone());
                Ok(format!("{} = ?{}", column, params.len()))
            }
            Predicate::In(column, values) => {
                let column = ident(column)?;
                if values.is_empty() {
                    return Ok("1 = 0".to_string());
                }
                let mut placeholders = Vec::with_capacity(values.len());
                for value in values {
                    params.push(value.clone());
                    placeholders.push(format!("?{}", params.len()));
                }
                Ok(format!("{} IN ({})", column, placeholders.join(", ")))
            }
            Predicate::And(parts) => {
                if parts.is_empty() {
                    return Ok("1 = 1".to_string());
                }
                let mut rendered = Vec::with_capacity(parts.len());
                for part in parts {
                    rendered.push(part.render(params)?);
                }
                Ok(format!("({})", rendered.join(" AND ")))
            }
        }
    }
}

/// Validate a table or column name. Only `[A-Za-z_][A-Za-z0-9_]*` is accepted,
/// so names can be spliced into SQL text.
pub fn ident(name: &str) -> Result<&str, SQLError> {
    if is_identifier(name) {
        Ok(name)
    } else {
        Err(SQLError::InvalidIdentifier(name.to_string()))
    }
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Sort direction for [`Select::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// A single-table `SELECT` with a predicate, ordering and pagination.
#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    filter: Predicate,
    order_by: Option<(String, Order)>,
    limit: Option<usize>,
    offset: usize,
}

impl Select {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: Predicate::True,
            order_by: None,
            limit: None,
            offset: 0,
        }
    }

    /// AND a predicate onto the current filter.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        let current = std::mem::replace(&mut self.filter, Predicate::True);
        self.filter = current.and(predicate);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order_by = Some((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Render the full statement and its parameters.
    pub fn to_sql(&self) -> Result<(String, Vec<Value>), SQLError> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT * FROM {}", ident(&self.table)?);
        self.push_where(&mut sql, &mut params)?;

        if let Some((column, order)) = &self.order_by {
            let dir = match order {
                Order::Asc => "ASC",
                Order::Desc => "DESC",
            };
            sql.push_str(&format!(" ORDER BY {} {}", ident(column)?, dir));
        }
        if let Some(limit) = self.limit {
            params.push(Value::Integer(limit as i64));
            sql.push_str(&format!(" LIMIT ?{}", params.len()));
            params.push(Value::Integer(self.offset as i64));
            sql.push_str(&format!(" OFFSET ?{}", params.len()));
        }
        Ok((sql, params))
    }

    /// Render `SELECT COUNT(*) AS cnt` over the same table and filter.
    pub fn count_sql(&self) -> Result<(String, Vec<Value>), SQLError> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) AS cnt FROM {}", ident(&self.table)?);
        self.push_where(&mut sql, &mut params)?;
        Ok((sql, params))
    }

    fn push_where(&self, sql: &mut String, params: &mut Vec<Value>) -> Result<(), SQLError> {
        if self.filter != Predicate::True {
            let clause = self.filter.render(params)?;
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        Ok(())
    }
}
