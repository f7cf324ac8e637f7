use std::collections::BTreeSet;

use bizscope_sql::Predicate;

use crate::model::{CompanyId, Decision, Principal, Scope, ScopedRow, UserId, COMPANY_ID, CREATED_BY};
use crate::service::hierarchy::HierarchyLookup;
use crate::service::AccessError;

/// A resolved scope bound to one principal, ready to be applied to rows.
///
/// Applies either as a SQL [`Predicate`] pushed into a query, or row by row
/// through [`matches`](ScopeFilter::matches). Both give the same answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
    scope: Scope,
    company: Option<CompanyId>,
    user: UserId,
    owner_column: String,
    /// The principal plus subordinates; only filled for
    /// `CreatedByUserOrSubordinates`.
    creators: BTreeSet<UserId>,
}

impl ScopeFilter {
    /// Bind a decision to its principal.
    ///
    /// `Forbidden` is an error here so no query is ever built for it.
    /// Subordinates are looked up once, and only when the scope needs them.
    pub fn build(
        principal: &Principal,
        decision: &Decision,
        hierarchy: &dyn HierarchyLookup,
    ) -> Result<Self, AccessError> {
        decision.scope.require_visible(&decision.resource)?;

        let mut creators = BTreeSet::new();
        if decision.scope == Scope::CreatedByUserOrSubordinates {
            if let Some(company) = principal.company_id {
                creators = hierarchy.subordinate_ids(principal.id, company)?;
                creators.insert(principal.id);
            }
        }

        Ok(Self {
            scope: decision.scope,
            company: principal.company_id,
            user: principal.id,
            owner_column: decision.owner_column.clone(),
            creators,
        })
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Users whose rows are visible under `CreatedByUserOrSubordinates`.
    pub fn creators(&self) -> &BTreeSet<UserId> {
        &self.creators
    }

    /// The `WHERE` condition for this scope.
    pub fn predicate(&self) -> Predicate {
        if self.scope == Scope::Unrestricted {
            return Predicate::True;
        }
        let Some(company) = self.company else {
            return Predicate::False;
        };
        let tenant = Predicate::eq(COMPANY_ID, company);
        match self.scope {
            Scope::Unrestricted => Predicate::True,
            Scope::CompanyWide => tenant,
            Scope::CreatedByUserOrSubordinates => {
                tenant.and(Predicate::is_in(CREATED_BY, self.creators.iter().copied()))
            }
            Scope::CreatedByUserOnly => {
                tenant.and(Predicate::eq(self.owner_column.as_str(), self.user))
            }
            Scope::Forbidden => Predicate::False,
        }
    }

    /// Whether a single row is inside the scope.
    pub fn matches(&self, row: &impl ScopedRow) -> bool {
        if self.scope == Scope::Unrestricted {
            return true;
        }
        let Some(company) = self.company else {
            return false;
        };
        if row.company_id() != Some(company) {
            return false;
        }
        match self.scope {
            Scope::Unrestricted | Scope::CompanyWide => true,
            Scope::CreatedByUserOrSubordinates => row
                .created_by()
                .is_some_and(|creator| self.creators.contains(&creator)),
            Scope::CreatedByUserOnly => row.column_i64(&self.owner_column) == Some(self.user),
            Scope::Forbidden => false,
        }
    }

    /// Keep only the rows inside the scope.
    pub fn apply<R: ScopedRow>(&self, rows: Vec<R>) -> Vec<R> {
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }
}
