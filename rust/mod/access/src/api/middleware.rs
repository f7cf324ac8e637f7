use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use bizscope_core::ServiceError;

use crate::api::AppState;

/// Resolve the caller and attach their [`Principal`](crate::model::Principal).
///
/// Every access route needs a principal, so there are no public paths.
pub async fn principal_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match state.authenticator.authenticate(req.headers()) {
        Ok(identity) => identity,
        Err(e) => return e.into_response(),
    };

    match state.svc.load_principal(&identity) {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(e) => ServiceError::from(e).into_response(),
    }
}
