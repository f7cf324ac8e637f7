use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path).map_err(|e| SQLError::Connection(e.to_string()))?;

        // WAL lets request handlers read while the hierarchy tables are written.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        tracing::debug!("opened sqlite store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn to_sql_value(v: &Value) -> rusqlite::types::Value {
    match v {
        Value::Null => rusqlite::types::Value::Null,
        Value::Integer(i) => rusqlite::types::Value::Integer(*i),
        Value::Real(f) => rusqlite::types::Value::Real(*f),
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Blob(b) => rusqlite::types::Value::Blob(b.clone()),
    }
}

fn from_value_ref(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SQLError::Query(format!("{}: {}", e, sql)))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let bound: Vec<rusqlite::types::Value> = params.iter().map(to_sql_value).collect();
        let mut rows = stmt
            .query(rusqlite::params_from_iter(bound))
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(|e| SQLError::Query(e.to_string()))? {
            let mut columns = Vec::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                let value = row
                    .get_ref(i)
                    .map_err(|e| SQLError::Query(e.to_string()))?;
                columns.push((name.clone(), from_value_ref(value)));
            }
            result.push(Row { columns });
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        let bound: Vec<rusqlite::types::Value> = params.iter().map(to_sql_value).collect();
        let affected = conn
            .execute(sql, rusqlite::params_from_iter(bound))
            .map_err(|e| SQLError::Execution(format!("{}: {}", e, sql)))?;

        Ok(affected as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Order, Predicate, Select};

    fn seeded() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .exec(
                "CREATE TABLE expenses (
                    id INTEGER PRIMARY KEY,
                    company_id INTEGER NOT NULL,
                    created_by INTEGER,
                    amount REAL NOT NULL
                )",
                &[],
            )
            .unwrap();
        let rows: [(i64, i64, Option<i64>, f64); 4] = [
            (1, 1, Some(7), 10.0),
            (2, 1, Some(9), 20.0),
            (3, 2, Some(7), 30.0),
            (4, 1, None, 40.0),
        ];
        for (id, company, created_by, amount) in rows {
            store
                .exec(
                    "INSERT INTO expenses (id, company_id, created_by, amount) VALUES (?1, ?2, ?3, ?4)",
                    &[
                        Value::Integer(id),
                        Value::Integer(company),
                        Value::from(created_by),
                        Value::Real(amount),
                    ],
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn query_maps_column_types() {
        let store = seeded();
        let rows = store
            .query("SELECT id, created_by, amount FROM expenses WHERE id = ?1", &[Value::Integer(4)])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_i64("id"), Some(4));
        assert_eq!(rows[0].get("created_by"), Some(&Value::Null));
        assert_eq!(rows[0].get_i64("created_by"), None);
        assert_eq!(rows[0].get("amount"), Some(&Value::Real(40.0)));
    }

    #[test]
    fn select_and_count_apply_predicate() {
        let store = seeded();
        let select = Select::new("expenses")
            .filter(Predicate::eq("company_id", 1i64))
            .filter(Predicate::is_in("created_by", [7i64, 9]))
            .order_by("id", Order::Asc);

        let rows = store.select(&select).unwrap();
        let ids: Vec<i64> = rows.iter().filter_map(|r| r.get_i64("id")).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(store.count(&select).unwrap(), 2);

        let page = store.select(&select.clone().limit(1).offset(1)).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].get_i64("id"), Some(2));
        assert_eq!(store.count(&select.limit(1)).unwrap(), 2);
    }

    #[test]
    fn false_predicate_returns_nothing() {
        let store = seeded();
        let select = Select::new("expenses").filter(Predicate::False);
        assert!(store.select(&select).unwrap().is_empty());
        assert_eq!(store.count(&select).unwrap(), 0);
    }

    #[test]
    fn exec_reports_affected_rows() {
        let store = seeded();
        let n = store
            .exec("DELETE FROM expenses WHERE company_id = ?1", &[Value::Integer(1)])
            .unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn open_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("scope.sqlite")).unwrap();
        store.exec("CREATE TABLE t (id INTEGER)", &[]).unwrap();
        store.exec("INSERT INTO t (id) VALUES (?1)", &[Value::Integer(5)]).unwrap();
        let rows = store.query("SELECT id FROM t", &[]).unwrap();
        assert_eq!(rows[0].get_i64("id"), Some(5));
    }
}
