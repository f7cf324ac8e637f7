use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use bizscope_sql::query::is_identifier;

use crate::model::{ResourcePolicy, Scope};
use crate::service::AccessError;

pub const EXPENSES: &str = "expenses";
pub const EXPENSE_CATEGORIES: &str = "expense_categories";
pub const FINANCIAL_LEDGER: &str = "financial_ledger";
pub const INVOICES: &str = "invoices";
pub const INSTALLMENT_PLANS: &str = "installment_plans";
pub const SEARCH: &str = "search";
pub const CASH_BOXES: &str = "cash_boxes";

/// Column naming the customer an invoice or installment plan belongs to.
const CUSTOMER_COLUMN: &str = "user_id";

/// Registry file layout.
#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    resources: Vec<ResourcePolicy>,
}

/// Validated resource policies, keyed by permission prefix.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    policies: BTreeMap<String, ResourcePolicy>,
}

impl ResourceRegistry {
    /// The resource types the business application ships with.
    pub fn builtin() -> Self {
        let mut policies = BTreeMap::new();
        for policy in [
            ResourcePolicy::new(EXPENSE_CATEGORIES, Scope::CompanyWide),
            ResourcePolicy::new(EXPENSES, Scope::CreatedByUserOnly),
            ResourcePolicy::new(FINANCIAL_LEDGER, Scope::CreatedByUserOnly),
            ResourcePolicy::new(SEARCH, Scope::CreatedByUserOnly),
            ResourcePolicy::new(INVOICES, Scope::CreatedByUserOnly).owned_by(CUSTOMER_COLUMN),
            ResourcePolicy::new(INSTALLMENT_PLANS, Scope::CreatedByUserOnly)
                .owned_by(CUSTOMER_COLUMN),
            ResourcePolicy::new(CASH_BOXES, Scope::CreatedByUserOnly).owned_by(CUSTOMER_COLUMN),
        ] {
            policies.insert(policy.prefix.clone(), policy);
        }
        Self { policies }
    }

    /// Parse a registry file and merge its entries over the built-in table.
    /// An entry with a built-in prefix replaces it.
    pub fn from_toml_str(content: &str) -> Result<Self, AccessError> {
        let file: RegistryFile =
            toml::from_str(content).map_err(|e| AccessError::Config(e.to_string()))?;

        let mut seen = Vec::with_capacity(file.resources.len());
        for policy in &file.resources {
            if seen.contains(&policy.prefix.as_str()) {
                return Err(AccessError::Config(format!(
                    "resource '{}' is declared twice",
                    policy.prefix
                )));
            }
            seen.push(policy.prefix.as_str());
        }

        let mut registry = Self::builtin();
        for policy in file.resources {
            registry.insert(policy);
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Load from a TOML file. A missing file yields the built-in table.
    pub fn load(path: &Path) -> Result<Self, AccessError> {
        if !path.exists() {
            warn!("policy file {} not found, using built-in resources", path.display());
            return Ok(Self::builtin());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| AccessError::Config(format!("read {}: {}", path.display(), e)))?;
        let registry = Self::from_toml_str(&content)?;
        info!(
            "loaded {} resource policies from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Add or replace a policy. Call [`validate`](Self::validate) afterwards.
    pub fn insert(&mut self, policy: ResourcePolicy) {
        self.policies.insert(policy.prefix.clone(), policy);
    }

    /// Check every entry. Run once at startup; errors are fatal.
    pub fn validate(&self) -> Result<(), AccessError> {
        for (prefix, policy) in &self.policies {
            if prefix.is_empty()
                || !prefix
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            {
                return Err(AccessError::Config(format!(
                    "invalid resource prefix '{}': use [a-z0-9_]",
                    prefix
                )));
            }
            for (what, scope) in [
                ("view_default", policy.view_default),
                ("mutation_default", policy.mutation_default),
            ] {
                if scope == Scope::Unrestricted {
                    return Err(AccessError::Config(format!(
                        "{}: {} cannot be unrestricted",
                        prefix, what
                    )));
                }
            }
            if let Some(column) = &policy.owner_column {
                if !is_identifier(column) {
                    return Err(AccessError::Config(format!(
                        "{}: invalid owner column '{}'",
                        prefix, column
                    )));
                }
                if policy.view_default != Scope::CreatedByUserOnly {
                    return Err(AccessError::Config(format!(
                        "{}: owner_column requires view_default = \"created_by_user_only\"",
                        prefix
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, prefix: &str) -> Result<&ResourcePolicy, AccessError> {
        self.policies
            .get(prefix)
            .ok_or_else(|| AccessError::UnknownResourceType(prefix.to_string()))
    }

    /// Look up a prefix that is known at compile time.
    ///
    /// # Panics
    ///
    /// If the prefix is not registered. That is a programming error, not a
    /// request error.
    pub fn expect(&self, prefix: &str) -> &ResourcePolicy {
        match self.policies.get(prefix) {
            Some(policy) => policy,
            None => panic!("resource type '{}' is not registered", prefix),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourcePolicy> {
        self.policies.values()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
