pub mod decision;
pub mod principal;
pub mod record;
pub mod resource;
pub mod scope;

pub use decision::{AuthorizeRequest, AuthorizeResult, Decision, Rule, ScopeQuery, SubordinatesView};
pub use principal::{CompanyId, Principal, UserId};
pub use record::{RecordRef, ScopedRow};
pub use resource::{ResourcePolicy, COMPANY_ID, CREATED_BY};
pub use scope::{Action, Scope};
