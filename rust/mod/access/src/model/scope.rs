use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::service::AccessError;

/// Which rows a principal may see or act on for one resource type.
///
/// Scopes are totally ordered by breadth:
/// `Unrestricted ⊇ CompanyWide ⊇ CreatedByUserOrSubordinates ⊇ CreatedByUserOnly ⊇ Forbidden`.
/// Every scope except `Unrestricted` is confined to the principal's current company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Unrestricted,
    CompanyWide,
    CreatedByUserOrSubordinates,
    CreatedByUserOnly,
    Forbidden,
}

impl Scope {
    /// All scopes, broadest first.
    pub const ALL: [Scope; 5] = [
        Scope::Unrestricted,
        Scope::CompanyWide,
        Scope::CreatedByUserOrSubordinates,
        Scope::CreatedByUserOnly,
        Scope::Forbidden,
    ];

    /// Rank by breadth; larger sees more.
    pub fn breadth(self) -> u8 {
        match self {
            Scope::Forbidden => 0,
            Scope::CreatedByUserOnly => 1,
            Scope::CreatedByUserOrSubordinates => 2,
            Scope::CompanyWide => 3,
            Scope::Unrestricted => 4,
        }
    }

    pub fn is_forbidden(self) -> bool {
        self == Scope::Forbidden
    }

    /// Turn `Forbidden` into an error so callers can bail before querying.
    pub fn require_visible(self, resource: &str) -> Result<Scope, AccessError> {
        if self.is_forbidden() {
            return Err(AccessError::Forbidden(format!("no access to {}", resource)));
        }
        Ok(self)
    }

    /// Whether rows are confined to the principal's current company.
    pub fn is_company_bound(self) -> bool {
        !matches!(self, Scope::Unrestricted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Unrestricted => "unrestricted",
            Scope::CompanyWide => "company_wide",
            Scope::CreatedByUserOrSubordinates => "created_by_user_or_subordinates",
            Scope::CreatedByUserOnly => "created_by_user_only",
            Scope::Forbidden => "forbidden",
        }
    }
}

impl PartialOrd for Scope {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scope {
    fn cmp(&self, other: &Self) -> Ordering {
        self.breadth().cmp(&other.breadth())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation a scope is resolved for. Each action has its own key family
/// (`<prefix>.view_all`, `<prefix>.update_self`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    View,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::View, Action::Update, Action::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    pub fn is_mutation(self) -> bool {
        !matches!(self, Action::View)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Action::View),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}
