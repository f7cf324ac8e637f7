//! The precedence ladder.
//!
//! One table drives every resource type and action:
//!
//! 1. `admin.super` → `Unrestricted`
//! 2. `<prefix>.<action>_all` or `admin.company` → `CompanyWide`
//! 3. `<prefix>.<action>_children` → `CreatedByUserOrSubordinates`
//! 4. `<prefix>.<action>_self` → `CreatedByUserOnly`
//! 5. the resource's configured default
//!
//! The first rung whose keys are held wins. A configured default broader than
//! the winning rung is kept instead, so granting a key never narrows what a
//! principal could already see.

use crate::model::{Action, Decision, Principal, ResourcePolicy, Rule, Scope, CREATED_BY};
use crate::service::keys::{resource_key, Reach, ADMIN_COMPANY, ADMIN_SUPER};

/// Source of truth for "does this principal hold any of these keys".
pub trait PermissionLookup {
    fn has_any(&self, principal: &Principal, keys: &[&str]) -> bool;
}

/// Checks the keys already resolved onto the principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantedPermissions;

impl PermissionLookup for GrantedPermissions {
    fn has_any(&self, principal: &Principal, keys: &[&str]) -> bool {
        keys.iter().any(|k| principal.holds(k))
    }
}

/// Which keys a rung consults.
enum Keys {
    Global(&'static str),
    Resource(Reach, Option<&'static str>),
}

const LADDER: [(Rule, Keys, Scope); 4] = [
    (Rule::SuperAdmin, Keys::Global(ADMIN_SUPER), Scope::Unrestricted),
    (
        Rule::AllInCompany,
        Keys::Resource(Reach::All, Some(ADMIN_COMPANY)),
        Scope::CompanyWide,
    ),
    (
        Rule::Subordinates,
        Keys::Resource(Reach::Children, None),
        Scope::CreatedByUserOrSubordinates,
    ),
    (
        Rule::OwnRecords,
        Keys::Resource(Reach::OwnOnly, None),
        Scope::CreatedByUserOnly,
    ),
];

/// Scope for viewing `resource`.
pub fn resolve_scope(principal: &Principal, resource: &ResourcePolicy) -> Scope {
    resolve(principal, resource, Action::View).scope
}

/// Resolve against the keys carried by the principal.
pub fn resolve(principal: &Principal, resource: &ResourcePolicy, action: Action) -> Decision {
    resolve_with(&GrantedPermissions, principal, resource, action)
}

/// Resolve with an explicit permission source.
pub fn resolve_with(
    lookup: &dyn PermissionLookup,
    principal: &Principal,
    resource: &ResourcePolicy,
    action: Action,
) -> Decision {
    let default = if action.is_mutation() {
        resource.mutation_default
    } else {
        resource.view_default
    };

    let matched = LADDER.iter().find_map(|(rule, keys, scope)| {
        let held = match keys {
            Keys::Global(key) => lookup.has_any(principal, &[*key]),
            Keys::Resource(reach, extra) => {
                let own = resource_key(&resource.prefix, action, *reach);
                match extra {
                    Some(extra) => lookup.has_any(principal, &[own.as_str(), *extra]),
                    None => lookup.has_any(principal, &[own.as_str()]),
                }
            }
        };
        held.then_some((*rule, *scope))
    });

    let (rule, scope) = match matched {
        Some((rule, scope)) if scope >= default => (rule, scope),
        _ => (Rule::ResourceDefault, default),
    };

    // The owner column override belongs to the view default only.
    let owner_column = if rule == Rule::ResourceDefault && !action.is_mutation() {
        resource.default_owner_column().to_string()
    } else {
        CREATED_BY.to_string()
    };

    Decision {
        resource: resource.prefix.clone(),
        action,
        scope,
        rule,
        owner_column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::keys::relevant_keys;
    use crate::service::registry::ResourceRegistry;

    fn expenses() -> ResourcePolicy {
        ResourcePolicy::new("expenses", Scope::CreatedByUserOnly)
    }

    fn user(keys: &[&str]) -> Principal {
        Principal::new(7, Some(1)).with_permissions(keys.iter().copied())
    }

    #[test]
    fn super_admin_dominates() {
        let registry = ResourceRegistry::builtin();
        for resource in registry.iter() {
            for action in Action::ALL {
                let p = user(&["admin.super", "expenses.view_self", "admin.company"]);
                let d = resolve(&p, resource, action);
                assert_eq!(d.scope, Scope::Unrestricted, "{} {}", resource.prefix, action);
                assert_eq!(d.rule, Rule::SuperAdmin);
            }
        }
    }

    #[test]
    fn super_admin_without_company_is_still_unrestricted() {
        let p = Principal::new(1, None).grant("admin.super");
        assert_eq!(resolve_scope(&p, &expenses()), Scope::Unrestricted);
    }

    #[test]
    fn builtin_defaults_apply_without_keys() {
        let expected = [
            ("expense_categories", Scope::CompanyWide, "created_by"),
            ("expenses", Scope::CreatedByUserOnly, "created_by"),
            ("financial_ledger", Scope::CreatedByUserOnly, "created_by"),
            ("search", Scope::CreatedByUserOnly, "created_by"),
            ("invoices", Scope::CreatedByUserOnly, "user_id"),
            ("installment_plans", Scope::CreatedByUserOnly, "user_id"),
            ("cash_boxes", Scope::CreatedByUserOnly, "user_id"),
        ];
        let registry = ResourceRegistry::builtin();
        assert_eq!(registry.len(), expected.len());
        for (prefix, scope, column) in expected {
            let d = resolve(&user(&[]), registry.expect(prefix), Action::View);
            assert_eq!(d.scope, scope, "{}", prefix);
            assert_eq!(d.rule, Rule::ResourceDefault);
            assert_eq!(d.owner_column, column, "{}", prefix);
        }
    }

    #[test]
    fn mutation_defaults_are_forbidden() {
        let registry = ResourceRegistry::builtin();
        for resource in registry.iter() {
            for action in [Action::Update, Action::Delete] {
                let d = resolve(&user(&[]), resource, action);
                assert_eq!(d.scope, Scope::Forbidden, "{} {}", resource.prefix, action);
            }
        }
    }

    #[test]
    fn forbidden_view_default_opens_only_with_a_key() {
        let payroll = ResourcePolicy::new("payroll", Scope::Forbidden);
        let d = resolve(&user(&[]), &payroll, Action::View);
        assert_eq!((d.scope, d.rule), (Scope::Forbidden, Rule::ResourceDefault));

        let d = resolve(&user(&["payroll.view_self"]), &payroll, Action::View);
        assert_eq!((d.scope, d.rule), (Scope::CreatedByUserOnly, Rule::OwnRecords));
    }

    #[test]
    fn ladder_order() {
        let r = expenses();
        assert_eq!(resolve_scope(&user(&["expenses.view_all"]), &r), Scope::CompanyWide);
        assert_eq!(resolve_scope(&user(&["admin.company"]), &r), Scope::CompanyWide);
        assert_eq!(
            resolve_scope(&user(&["expenses.view_children"]), &r),
            Scope::CreatedByUserOrSubordinates
        );
        assert_eq!(
            resolve_scope(&user(&["expenses.view_children", "expenses.view_self"]), &r),
            Scope::CreatedByUserOrSubordinates
        );
        assert_eq!(
            resolve_scope(&user(&["expenses.view_all", "expenses.view_children"]), &r),
            Scope::CompanyWide
        );
    }

    #[test]
    fn keys_of_other_resources_and_actions_are_ignored() {
        let r = expenses();
        let p = user(&["invoices.view_all", "expenses.update_all", "expenses.delete_children"]);
        let d = resolve(&p, &r, Action::View);
        assert_eq!(d.scope, Scope::CreatedByUserOnly);
        assert_eq!(d.rule, Rule::ResourceDefault);

        assert_eq!(resolve(&p, &r, Action::Update).scope, Scope::CompanyWide);
        assert_eq!(
            resolve(&p, &r, Action::Delete).scope,
            Scope::CreatedByUserOrSubordinates
        );
    }

    #[test]
    fn admin_company_covers_mutations() {
        let d = resolve(&user(&["admin.company"]), &expenses(), Action::Delete);
        assert_eq!(d.scope, Scope::CompanyWide);
        assert_eq!(d.rule, Rule::AllInCompany);
    }

    #[test]
    fn owner_column_only_for_the_default() {
        let invoices = ResourcePolicy::new("invoices", Scope::CreatedByUserOnly).owned_by("user_id");
        let d = resolve(&user(&[]), &invoices, Action::View);
        assert_eq!((d.scope, d.owner_column.as_str()), (Scope::CreatedByUserOnly, "user_id"));

        let d = resolve(&user(&["invoices.view_self"]), &invoices, Action::View);
        assert_eq!(d.rule, Rule::OwnRecords);
        assert_eq!(d.owner_column, "created_by");
    }

    #[test]
    fn broad_default_is_a_floor() {
        let categories = ResourcePolicy::new("expense_categories", Scope::CompanyWide);
        let d = resolve(&user(&["expense_categories.view_self"]), &categories, Action::View);
        assert_eq!(d.scope, Scope::CompanyWide);
        assert_eq!(d.rule, Rule::ResourceDefault);
    }

    #[test]
    fn adding_a_key_never_narrows() {
        let registry = ResourceRegistry::builtin();
        for resource in registry.iter() {
            for action in Action::ALL {
                let keys = relevant_keys(&resource.prefix, action);
                let n = keys.len();
                for mask in 0u32..(1 << n) {
                    let held: Vec<&str> = (0..n)
                        .filter(|i| mask & (1 << i) != 0)
                        .map(|i| keys[i].as_str())
                        .collect();
                    let base = resolve(&user(&held), resource, action).scope;
                    for extra in 0..n {
                        if mask & (1 << extra) != 0 {
                            continue;
                        }
                        let p = user(&held).grant(keys[extra].clone());
                        let widened = resolve(&p, resource, action).scope;
                        assert!(
                            widened >= base,
                            "{} {}: {:?} + {} narrowed {} to {}",
                            resource.prefix,
                            action,
                            held,
                            keys[extra],
                            base,
                            widened
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn resolution_is_idempotent() {
        let r = expenses();
        let p = user(&["expenses.view_children"]);
        assert_eq!(resolve(&p, &r, Action::View), resolve(&p, &r, Action::View));
    }

    struct DenyAll;

    impl PermissionLookup for DenyAll {
        fn has_any(&self, _: &Principal, _: &[&str]) -> bool {
            false
        }
    }

    #[test]
    fn custom_lookup_is_consulted() {
        let p = user(&["admin.super"]);
        let d = resolve_with(&DenyAll, &p, &expenses(), Action::View);
        assert_eq!(d.scope, Scope::CreatedByUserOnly);
    }
}
