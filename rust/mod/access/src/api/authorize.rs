use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Extension, Json, Router};

use bizscope_core::ServiceError;

use crate::api::AppState;
use crate::model::{AuthorizeRequest, AuthorizeResult, Principal, RecordRef};

pub fn routes() -> Router<AppState> {
    Router::new().route("/authorize/{resource}", post(authorize))
}

/// POST /access/authorize/{resource}
///
/// Body: `{"action": "update", "company_id": 1, "created_by": 7}`, plus
/// `"owners": {"user_id": 7}` for resources whose default compares another
/// column. Returns `{"allowed": true, ...}` or 403.
async fn authorize(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(resource): Path<String>,
    Json(req): Json<AuthorizeRequest>,
) -> Result<Json<AuthorizeResult>, ServiceError> {
    let policy = state.svc.registry().get(&resource)?;
    let record = RecordRef {
        company_id: req.company_id,
        created_by: req.created_by,
        owners: req.owners.into_iter().collect(),
    };
    let decision = state
        .svc
        .authorize_record(&principal, policy, req.action, &record)?;
    Ok(Json(AuthorizeResult {
        allowed: true,
        scope: decision.scope,
        rule: decision.rule,
    }))
}
