use serde::{Deserialize, Serialize};

use crate::model::Scope;

/// Column holding the creator of a row.
pub const CREATED_BY: &str = "created_by";

/// Column holding the tenant that owns a row.
pub const COMPANY_ID: &str = "company_id";

/// Per-resource-type access configuration.
///
/// `prefix` names the permission key family (`expenses` → `expenses.view_all`, ...).
/// The defaults apply when none of the resource's keys nor the admin overrides
/// are held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePolicy {
    pub prefix: String,

    /// Scope for viewing when no key matches.
    pub view_default: Scope,

    /// Column compared to the acting user when `view_default` is reached.
    /// `None` means `created_by`. Invoices and installment plans use `user_id`,
    /// the customer the record belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_column: Option<String>,

    /// Scope for update/delete when no key matches.
    #[serde(default = "forbidden")]
    pub mutation_default: Scope,
}

fn forbidden() -> Scope {
    Scope::Forbidden
}

impl ResourcePolicy {
    pub fn new(prefix: impl Into<String>, view_default: Scope) -> Self {
        Self {
            prefix: prefix.into(),
            view_default,
            owner_column: None,
            mutation_default: Scope::Forbidden,
        }
    }

    pub fn owned_by(mut self, column: impl Into<String>) -> Self {
        self.owner_column = Some(column.into());
        self
    }

    /// Column used for the owner comparison when the view default applies.
    pub fn default_owner_column(&self) -> &str {
        self.owner_column.as_deref().unwrap_or(CREATED_BY)
    }
}
