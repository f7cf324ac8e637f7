use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};

use bizscope_core::ServiceError;

use crate::api::AppState;
use crate::model::{Principal, SubordinatesView};
use crate::service::hierarchy::HierarchyLookup;
use crate::service::AccessError;

pub fn routes() -> Router<AppState> {
    Router::new().route("/subordinates", get(list_subordinates))
}

/// GET /access/subordinates: users reporting to the caller in the current company.
async fn list_subordinates(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<SubordinatesView>, ServiceError> {
    let company = principal.company_id.ok_or(AccessError::NoCompany)?;
    let ids = state.svc.hierarchy().subordinate_ids(principal.id, company)?;
    Ok(Json(SubordinatesView {
        user_id: principal.id,
        company_id: company,
        subordinates: ids.into_iter().collect(),
    }))
}
