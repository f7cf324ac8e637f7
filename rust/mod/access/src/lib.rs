//! Access module: row-level visibility scopes for tenant records.
//!
//! Given who is asking and which resource type they want, decides which rows
//! they may see or change:
//!
//! - **Scope**: `Unrestricted`, `CompanyWide`, `CreatedByUserOrSubordinates`,
//!   `CreatedByUserOnly` or `Forbidden`
//! - **ResourcePolicy**: per resource type defaults, loaded into a
//!   [`ResourceRegistry`](service::registry::ResourceRegistry)
//! - **ScopeFilter**: a resolved scope as a SQL predicate or row check
//! - **Hierarchy**: subordinates from `company_users`, cached with a TTL
//!
//! # Usage
//!
//! ```ignore
//! use access::{AccessModule, service::{AccessConfig, registry::ResourceRegistry}};
//!
//! let registry = ResourceRegistry::load(&policy_path)?;
//! let module = AccessModule::new(sql, registry, AccessConfig::default(), authenticator)?;
//! let router = module.routes(); // Mount under /access
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use bizscope_core::{Authenticator, Module, ServiceError};
use bizscope_sql::SQLStore;

use crate::service::registry::ResourceRegistry;
use crate::service::{AccessConfig, AccessService};

pub use crate::model::{Action, Decision, Principal, ResourcePolicy, Rule, Scope};
pub use crate::service::policy::{resolve, resolve_scope};
pub use crate::service::AccessError;

/// Access module implementing the Module trait.
pub struct AccessModule {
    service: Arc<AccessService>,
    authenticator: Arc<dyn Authenticator>,
}

impl AccessModule {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        registry: ResourceRegistry,
        config: AccessConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self, ServiceError> {
        let service = AccessService::new(sql, registry, config).map_err(ServiceError::from)?;
        Ok(Self {
            service,
            authenticator,
        })
    }

    /// Get a reference to the underlying AccessService.
    pub fn service(&self) -> &Arc<AccessService> {
        &self.service
    }
}

impl Module for AccessModule {
    fn name(&self) -> &str {
        "access"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone(), self.authenticator.clone())
    }
}
