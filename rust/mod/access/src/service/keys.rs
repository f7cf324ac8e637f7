//! Permission key names.
//!
//! Keys are opaque dot-namespaced strings. Their names imply nothing about
//! precedence; that lives in [`crate::service::policy`].

use crate::model::Action;

/// Global override: every row of every company.
pub const ADMIN_SUPER: &str = "admin.super";

/// Company override: every row of the current company, for every resource type.
pub const ADMIN_COMPANY: &str = "admin.company";

/// Breadth suffix of a per-resource key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    All,
    Children,
    OwnOnly,
}

impl Reach {
    fn suffix(self) -> &'static str {
        match self {
            Reach::All => "all",
            Reach::Children => "children",
            Reach::OwnOnly => "self",
        }
    }
}

/// `<prefix>.<action>_<reach>`, e.g. `expenses.view_children`.
pub fn resource_key(prefix: &str, action: Action, reach: Reach) -> String {
    format!("{}.{}_{}", prefix, action.as_str(), reach.suffix())
}

/// Every key that can influence a decision for `prefix` and `action`.
pub fn relevant_keys(prefix: &str, action: Action) -> Vec<String> {
    vec![
        ADMIN_SUPER.to_string(),
        ADMIN_COMPANY.to_string(),
        resource_key(prefix, action, Reach::All),
        resource_key(prefix, action, Reach::Children),
        resource_key(prefix, action, Reach::OwnOnly),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format() {
        assert_eq!(resource_key("expenses", Action::View, Reach::All), "expenses.view_all");
        assert_eq!(
            resource_key("installment_plans", Action::Delete, Reach::Children),
            "installment_plans.delete_children"
        );
        assert_eq!(resource_key("invoices", Action::Update, Reach::OwnOnly), "invoices.update_self");
    }

    #[test]
    fn relevant_keys_include_overrides() {
        let keys = relevant_keys("financial_ledger", Action::View);
        assert_eq!(keys.len(), 5);
        assert!(keys.contains(&"admin.super".to_string()));
        assert!(keys.contains(&"admin.company".to_string()));
        assert!(keys.contains(&"financial_ledger.view_self".to_string()));
    }
}
