use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Action, CompanyId, Scope, UserId};

/// Which step of the precedence ladder produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// `admin.super`.
    SuperAdmin,
    /// `<prefix>.<action>_all` or `admin.company`.
    AllInCompany,
    /// `<prefix>.<action>_children`.
    Subordinates,
    /// `<prefix>.<action>_self`.
    OwnRecords,
    /// Nothing matched (or the match was narrower than the resource default).
    ResourceDefault,
}

/// The outcome of resolving a scope, with enough context to build
/// predicates and to log why access was granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub resource: String,
    pub action: Action,
    pub scope: Scope,
    pub rule: Rule,
    /// Column compared to the principal for `CreatedByUserOnly`.
    pub owner_column: String,
}

// ── HTTP payloads ───────────────────────────────────────────────────

/// Query for `GET /access/scope/{resource}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeQuery {
    #[serde(default)]
    pub action: Action,
}

/// Body for `POST /access/authorize/{resource}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeRequest {
    #[serde(default = "default_mutation")]
    pub action: Action,
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub created_by: Option<UserId>,
    /// Other owner columns of the record, such as `{"user_id": 7}` for an
    /// invoice's customer.
    #[serde(default)]
    pub owners: BTreeMap<String, UserId>,
}

fn default_mutation() -> Action {
    Action::Update
}

/// Response of `POST /access/authorize/{resource}` when allowed.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeResult {
    pub allowed: bool,
    pub scope: Scope,
    pub rule: Rule,
}

/// Response of `GET /access/subordinates`.
#[derive(Debug, Clone, Serialize)]
pub struct SubordinatesView {
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub subordinates: Vec<UserId>,
}
