pub mod filter;
pub mod guard;
pub mod hierarchy;
pub mod keys;
pub mod list;
pub mod permissions;
pub mod policy;
pub mod registry;
pub mod schema;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use bizscope_sql::{SQLError, SQLStore};

use crate::model::{Action, Decision, Principal, ResourcePolicy};

use self::filter::ScopeFilter;
use self::hierarchy::SqlHierarchy;
use self::registry::ResourceRegistry;

/// Access service error type.
#[derive(Debug, Error)]
pub enum AccessError {
    /// No policy is registered for the permission prefix.
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The principal has no current company but the operation is company-scoped.
    #[error("no current company selected")]
    NoCompany,

    /// Malformed request input (table or sort column names).
    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("invalid policy configuration: {0}")]
    Config(String),

    #[error("storage: {0}")]
    Storage(String),
}

impl From<SQLError> for AccessError {
    fn from(e: SQLError) -> Self {
        match e {
            SQLError::InvalidIdentifier(name) => {
                AccessError::Invalid(format!("invalid identifier '{}'", name))
            }
            other => AccessError::Storage(other.to_string()),
        }
    }
}

impl From<AccessError> for bizscope_core::ServiceError {
    fn from(e: AccessError) -> Self {
        use bizscope_core::ServiceError;
        match e {
            AccessError::UnknownResourceType(prefix) => {
                tracing::error!("request for unregistered resource type '{}'", prefix);
                ServiceError::NotFound(format!("unknown resource type '{}'", prefix))
            }
            AccessError::Forbidden(m) => ServiceError::PermissionDenied(m),
            AccessError::NoCompany => {
                ServiceError::PermissionDenied("no current company selected".into())
            }
            AccessError::Invalid(m) => ServiceError::Validation(m),
            AccessError::Config(m) => ServiceError::Misconfigured(m),
            AccessError::Storage(m) => ServiceError::Storage(m),
        }
    }
}

/// Configuration for the access service.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Subordinate cache TTL in seconds (default: 120).
    pub hierarchy_cache_ttl: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            hierarchy_cache_ttl: 120, // 2 min
        }
    }
}

/// The access service: the validated resource table plus the SQL-backed
/// permission and hierarchy lookups.
pub struct AccessService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) registry: ResourceRegistry,
    pub(crate) hierarchy: SqlHierarchy,
}

impl AccessService {
    /// Create a new AccessService, initializing the DB schema.
    ///
    /// The registry must already be validated; see [`ResourceRegistry::load`].
    pub fn new(
        sql: Arc<dyn SQLStore>,
        registry: ResourceRegistry,
        config: AccessConfig,
    ) -> Result<Arc<Self>, AccessError> {
        schema::init_schema(sql.as_ref())?;
        let hierarchy = SqlHierarchy::new(Arc::clone(&sql), config.hierarchy_cache_ttl);
        Ok(Arc::new(Self {
            sql,
            registry,
            hierarchy,
        }))
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn hierarchy(&self) -> &SqlHierarchy {
        &self.hierarchy
    }

    /// Resolve the decision for a principal, resource and action.
    pub fn decide(&self, principal: &Principal, resource: &ResourcePolicy, action: Action) -> Decision {
        let decision = policy::resolve(principal, resource, action);
        debug!(
            user = principal.id,
            company = ?principal.company_id,
            resource = %resource.prefix,
            action = %action,
            rule = ?decision.rule,
            scope = %decision.scope,
            "access scope resolved"
        );
        decision
    }

    /// Resolve the scope and turn it into a row filter.
    ///
    /// Fails with `Forbidden` when the resolved scope is `Forbidden`, so the
    /// caller never issues the query.
    pub fn scope_filter(
        &self,
        principal: &Principal,
        resource: &ResourcePolicy,
        action: Action,
    ) -> Result<ScopeFilter, AccessError> {
        let decision = self.decide(principal, resource, action);
        ScopeFilter::build(principal, &decision, &self.hierarchy)
    }
}
