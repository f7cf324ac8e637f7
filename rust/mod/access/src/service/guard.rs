use tracing::warn;

use crate::model::{Action, Decision, Principal, ResourcePolicy, ScopedRow};
use crate::service::filter::ScopeFilter;
use crate::service::hierarchy::HierarchyLookup;
use crate::service::policy;
use crate::service::{AccessError, AccessService};

/// Check that `principal` may perform `action` on one specific record.
///
/// The scope is resolved with the action's key family and the record must
/// fall inside it. A record outside the scope is an error, never skipped.
pub fn authorize_record(
    principal: &Principal,
    resource: &ResourcePolicy,
    action: Action,
    record: &impl ScopedRow,
    hierarchy: &dyn HierarchyLookup,
) -> Result<Decision, AccessError> {
    let decision = policy::resolve(principal, resource, action);
    check(principal, decision, record, hierarchy)
}

fn check(
    principal: &Principal,
    decision: Decision,
    record: &impl ScopedRow,
    hierarchy: &dyn HierarchyLookup,
) -> Result<Decision, AccessError> {
    let filter = ScopeFilter::build(principal, &decision, hierarchy).inspect_err(|e| {
        if matches!(e, AccessError::Forbidden(_)) {
            warn!(
                user = principal.id,
                resource = %decision.resource,
                action = %decision.action,
                "no {} access", decision.action
            );
        }
    })?;

    if !filter.matches(record) {
        warn!(
            user = principal.id,
            company = ?principal.company_id,
            resource = %decision.resource,
            action = %decision.action,
            scope = %decision.scope,
            record_company = ?record.company_id(),
            record_creator = ?record.created_by(),
            "record outside scope"
        );
        return Err(AccessError::Forbidden(format!(
            "cannot {} this {} record",
            decision.action, decision.resource
        )));
    }
    Ok(decision)
}

impl AccessService {
    /// [`authorize_record`] against the service's hierarchy.
    pub fn authorize_record(
        &self,
        principal: &Principal,
        resource: &ResourcePolicy,
        action: Action,
        record: &impl ScopedRow,
    ) -> Result<Decision, AccessError> {
        let decision = self.decide(principal, resource, action);
        check(principal, decision, record, &self.hierarchy)
    }
}
