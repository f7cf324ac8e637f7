use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};

use bizscope_core::ServiceError;

use crate::api::AppState;
use crate::model::{Decision, Principal, ScopeQuery};

pub fn routes() -> Router<AppState> {
    Router::new().route("/scope/{resource}", get(get_scope))
}

/// GET /access/scope/{resource}?action=view
///
/// The caller's scope on a resource type, with the rule that produced it.
async fn get_scope(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(resource): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<Decision>, ServiceError> {
    let policy = state.svc.registry().get(&resource)?;
    Ok(Json(state.svc.decide(&principal, policy, query.action)))
}
