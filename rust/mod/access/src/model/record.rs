use bizscope_sql::Row;
use serde::{Deserialize, Serialize};

use crate::model::resource::{COMPANY_ID, CREATED_BY};
use crate::model::{CompanyId, UserId};

/// Anything a scope can be checked against: a SQL row, a loaded record, a
/// request body describing the target of a mutation.
pub trait ScopedRow {
    /// Integer value of a column, `None` for NULL or absent.
    fn column_i64(&self, column: &str) -> Option<i64>;

    fn company_id(&self) -> Option<CompanyId> {
        self.column_i64(COMPANY_ID)
    }

    fn created_by(&self) -> Option<UserId> {
        self.column_i64(CREATED_BY)
    }
}

impl ScopedRow for Row {
    fn column_i64(&self, column: &str) -> Option<i64> {
        self.get_i64(column)
    }
}

/// The ownership attributes of a single record being authorized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub company_id: Option<CompanyId>,
    /// `None` for system-generated rows.
    #[serde(default)]
    pub created_by: Option<UserId>,
    /// Extra owner columns (e.g. `user_id`) by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<(String, UserId)>,
}

impl RecordRef {
    pub fn new(company_id: CompanyId, created_by: Option<UserId>) -> Self {
        Self {
            company_id: Some(company_id),
            created_by,
            owners: Vec::new(),
        }
    }

    pub fn with_owner(mut self, column: impl Into<String>, user: UserId) -> Self {
        self.owners.push((column.into(), user));
        self
    }
}

impl ScopedRow for RecordRef {
    fn column_i64(&self, column: &str) -> Option<i64> {
        match column {
            COMPANY_ID => self.company_id,
            CREATED_BY => self.created_by,
            other => self
                .owners
                .iter()
                .find(|(name, _)| name == other)
                .map(|(_, id)| *id),
        }
    }
}
