use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type CompanyId = i64;

/// The authenticated actor a scope is resolved for.
///
/// Permission keys are already resolved (roles expanded, company applied);
/// this type never looks anything up on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    /// Current company. Company-scoped results are empty without one.
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Principal {
    pub fn new(id: UserId, company_id: Option<CompanyId>) -> Self {
        Self {
            id,
            company_id,
            permissions: BTreeSet::new(),
        }
    }

    /// Add a permission key (builder style).
    pub fn grant(mut self, key: impl Into<String>) -> Self {
        self.permissions.insert(key.into());
        self
    }

    pub fn with_permissions<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.permissions.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn holds(&self, key: &str) -> bool {
        self.permissions.contains(key)
    }
}
