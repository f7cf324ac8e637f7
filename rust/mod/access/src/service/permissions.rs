use bizscope_core::Identity;
use bizscope_sql::Value;
use tracing::{debug, warn};

use crate::model::{CompanyId, Principal, UserId};
use crate::service::keys::ADMIN_SUPER;
use crate::service::{AccessError, AccessService};

impl AccessService {
    /// Build the principal for an authenticated identity.
    ///
    /// The requested company only counts when the user is a member of it;
    /// otherwise the principal has no current company. Keys granted in the
    /// current company or with no company apply. `admin.super` applies
    /// wherever it was granted.
    pub fn load_principal(&self, identity: &Identity) -> Result<Principal, AccessError> {
        let company = match identity.company_id {
            Some(company) if self.hierarchy.is_member(identity.user_id, company)? => Some(company),
            Some(company) => {
                warn!(user = identity.user_id, company, "not a member of requested company");
                None
            }
            None => None,
        };
        let rows = self.sql.query(
            "SELECT DISTINCT permission FROM permission_grants
             WHERE user_id = ?1
               AND (company_id IS NULL OR company_id = ?2 OR permission = ?3)",
            &[
                Value::Integer(identity.user_id),
                company.into(),
                Value::Text(ADMIN_SUPER.to_string()),
            ],
        )?;
        let principal = Principal::new(identity.user_id, company)
            .with_permissions(rows.iter().filter_map(|r| r.get_str("permission")));
        debug!(
            user = principal.id,
            company = ?principal.company_id,
            keys = principal.permissions.len(),
            "principal loaded"
        );
        Ok(principal)
    }

    /// Grant a key. `company = None` grants it in every company.
    pub fn grant_permission(
        &self,
        user: UserId,
        company: Option<CompanyId>,
        permission: &str,
    ) -> Result<(), AccessError> {
        if permission.trim().is_empty() {
            return Err(AccessError::Invalid("permission key must not be empty".into()));
        }
        self.sql.exec(
            "INSERT INTO permission_grants (user_id, company_id, permission)
             SELECT ?1, ?2, ?3
             WHERE NOT EXISTS (
                 SELECT 1 FROM permission_grants
                 WHERE user_id = ?1 AND company_id IS ?2 AND permission = ?3
             )",
            &[
                Value::Integer(user),
                company.into(),
                Value::Text(permission.to_string()),
            ],
        )?;
        Ok(())
    }

    /// Revoke a key. Returns whether a grant was removed.
    pub fn revoke_permission(
        &self,
        user: UserId,
        company: Option<CompanyId>,
        permission: &str,
    ) -> Result<bool, AccessError> {
        let n = self.sql.exec(
            "DELETE FROM permission_grants
             WHERE user_id = ?1 AND company_id IS ?2 AND permission = ?3",
            &[
                Value::Integer(user),
                company.into(),
                Value::Text(permission.to_string()),
            ],
        )?;
        Ok(n > 0)
    }
}
