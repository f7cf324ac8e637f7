mod authorize;
mod middleware;
mod scope;
mod subordinates;

use std::sync::Arc;

use axum::Router;

use bizscope_core::Authenticator;

use crate::service::AccessService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub svc: Arc<AccessService>,
    pub authenticator: Arc<dyn Authenticator>,
}

/// Build the access API router.
///
/// All routes are relative; the caller nests them under `/access`.
pub fn build_router(svc: Arc<AccessService>, authenticator: Arc<dyn Authenticator>) -> Router {
    let state = AppState { svc, authenticator };

    Router::new()
        .merge(scope::routes())
        .merge(authorize::routes())
        .merge(subordinates::routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::principal_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use bizscope_core::TrustedHeaders;
    use bizscope_sql::SqliteStore;
    use tower::ServiceExt;

    use super::*;
    use crate::model::{ResourcePolicy, Scope};
    use crate::service::registry::ResourceRegistry;
    use crate::service::AccessConfig;

    fn make_service(registry: ResourceRegistry) -> Arc<AccessService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let svc = AccessService::new(sql, registry, AccessConfig::default()).unwrap();
        svc.hierarchy().add_membership(7, 1, None).unwrap();
        svc.hierarchy().add_membership(9, 1, Some(7)).unwrap();
        svc.hierarchy().add_membership(12, 1, Some(9)).unwrap();
        svc.grant_permission(7, Some(1), "expenses.view_children").unwrap();
        svc.grant_permission(7, Some(1), "expenses.update_self").unwrap();
        svc.grant_permission(1, None, "admin.super").unwrap();
        svc
    }

    fn router_for(svc: Arc<AccessService>) -> Router {
        Router::new().nest("/access", build_router(svc, Arc::new(TrustedHeaders)))
    }

    fn make_router() -> Router {
        router_for(make_service(ResourceRegistry::builtin()))
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        user: Option<(i64, Option<i64>)>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((user_id, company_id)) = user {
            builder = builder.header("x-user-id", user_id.to_string());
            if let Some(company_id) = company_id {
                builder = builder.header("x-company-id", company_id.to_string());
            }
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };
        let resp = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::json!(null)
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::json!(null))
        };
        (status, json)
    }

    #[tokio::test]
    async fn scope_reports_rule_and_column() {
        let router = make_router();

        let (s, body) = call(&router, "GET", "/access/scope/expenses", Some((7, Some(1))), None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["scope"], "created_by_user_or_subordinates");
        assert_eq!(body["rule"], "subordinates");
        assert_eq!(body["action"], "view");

        let (s, body) = call(&router, "GET", "/access/scope/invoices", Some((7, Some(1))), None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["scope"], "created_by_user_only");
        assert_eq!(body["owner_column"], "user_id");

        let (_, body) = call(
            &router,
            "GET",
            "/access/scope/expenses?action=delete",
            Some((7, Some(1))),
            None,
        )
        .await;
        assert_eq!(body["scope"], "forbidden");
    }

    #[tokio::test]
    async fn grants_follow_the_current_company() {
        let router = make_router();
        let (_, body) = call(&router, "GET", "/access/scope/expenses", Some((7, Some(2))), None).await;
        assert_eq!(body["scope"], "created_by_user_only");
        assert_eq!(body["rule"], "resource_default");
    }

    #[tokio::test]
    async fn super_admin_needs_no_company() {
        let router = make_router();
        let (s, body) = call(&router, "GET", "/access/scope/cash_boxes", Some((1, None)), None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["scope"], "unrestricted");
    }

    #[tokio::test]
    async fn unknown_resource_is_not_found() {
        let router = make_router();
        let (s, body) = call(&router, "GET", "/access/scope/payroll", Some((7, Some(1))), None).await;
        assert_eq!(s, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        let router = make_router();
        let (s, _) = call(&router, "GET", "/access/scope/expenses", None, None).await;
        assert_eq!(s, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authorize_own_record_only() {
        let router = make_router();
        let mine = serde_json::json!({"action": "update", "company_id": 1, "created_by": 7});
        let (s, body) = call(&router, "POST", "/access/authorize/expenses", Some((7, Some(1))), Some(mine)).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["allowed"], true);
        assert_eq!(body["rule"], "own_records");

        let theirs = serde_json::json!({"action": "update", "company_id": 1, "created_by": 9});
        let (s, body) = call(&router, "POST", "/access/authorize/expenses", Some((7, Some(1))), Some(theirs)).await;
        assert_eq!(s, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PERMISSION_DENIED");

        let delete = serde_json::json!({"action": "delete", "company_id": 1, "created_by": 7});
        let (s, _) = call(&router, "POST", "/access/authorize/expenses", Some((7, Some(1))), Some(delete)).await;
        assert_eq!(s, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn authorize_view_compares_customer_column() {
        let router = make_router();
        let own = serde_json::json!({
            "action": "view", "company_id": 1, "created_by": 3, "owners": {"user_id": 7}
        });
        let (s, body) = call(&router, "POST", "/access/authorize/invoices", Some((7, Some(1))), Some(own)).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["scope"], "created_by_user_only");
        assert_eq!(body["rule"], "resource_default");

        let created = serde_json::json!({
            "action": "view", "company_id": 1, "created_by": 7, "owners": {"user_id": 4}
        });
        let (s, _) = call(&router, "POST", "/access/authorize/invoices", Some((7, Some(1))), Some(created)).await;
        assert_eq!(s, StatusCode::FORBIDDEN);

        let missing = serde_json::json!({"action": "view", "company_id": 1, "created_by": 7});
        let (s, _) = call(&router, "POST", "/access/authorize/invoices", Some((7, Some(1))), Some(missing)).await;
        assert_eq!(s, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn view_self_key_switches_back_to_created_by() {
        let svc = make_service(ResourceRegistry::builtin());
        svc.grant_permission(7, Some(1), "invoices.view_self").unwrap();
        let router = router_for(svc);

        let (s, body) = call(&router, "GET", "/access/scope/invoices", Some((7, Some(1))), None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["scope"], "created_by_user_only");
        assert_eq!(body["rule"], "own_records");
        assert_eq!(body["owner_column"], "created_by");

        let created = serde_json::json!({
            "action": "view", "company_id": 1, "created_by": 7, "owners": {"user_id": 4}
        });
        let (s, body) = call(&router, "POST", "/access/authorize/invoices", Some((7, Some(1))), Some(created)).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["rule"], "own_records");

        let billed = serde_json::json!({
            "action": "view", "company_id": 1, "created_by": 3, "owners": {"user_id": 7}
        });
        let (s, _) = call(&router, "POST", "/access/authorize/invoices", Some((7, Some(1))), Some(billed)).await;
        assert_eq!(s, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn forbidden_default_resource_is_denied() {
        let mut registry = ResourceRegistry::builtin();
        registry.insert(ResourcePolicy::new("payroll", Scope::Forbidden));
        let svc = make_service(registry);
        svc.grant_permission(9, Some(1), "payroll.view_self").unwrap();
        let router = router_for(svc);

        let (s, body) = call(&router, "GET", "/access/scope/payroll", Some((7, Some(1))), None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["scope"], "forbidden");
        assert_eq!(body["rule"], "resource_default");

        let mine = serde_json::json!({"action": "view", "company_id": 1, "created_by": 7});
        let (s, body) = call(&router, "POST", "/access/authorize/payroll", Some((7, Some(1))), Some(mine)).await;
        assert_eq!(s, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "PERMISSION_DENIED");

        let theirs = serde_json::json!({"action": "view", "company_id": 1, "created_by": 9});
        let (s, body) = call(&router, "POST", "/access/authorize/payroll", Some((9, Some(1))), Some(theirs)).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["rule"], "own_records");
    }

    #[tokio::test]
    async fn company_header_requires_membership() {
        let svc = make_service(ResourceRegistry::builtin());
        svc.grant_permission(7, None, "expenses.view_all").unwrap();
        let router = router_for(svc);

        let foreign = serde_json::json!({"action": "view", "company_id": 2, "created_by": 3});
        let (s, _) = call(&router, "POST", "/access/authorize/expenses", Some((7, Some(2))), Some(foreign)).await;
        assert_eq!(s, StatusCode::FORBIDDEN);

        let (s, _) = call(&router, "GET", "/access/subordinates", Some((7, Some(2))), None).await;
        assert_eq!(s, StatusCode::FORBIDDEN);

        let home = serde_json::json!({"action": "view", "company_id": 1, "created_by": 3});
        let (s, body) = call(&router, "POST", "/access/authorize/expenses", Some((7, Some(1))), Some(home)).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["scope"], "company_wide");
    }

    #[tokio::test]
    async fn subordinates_of_caller() {
        let router = make_router();
        let (s, body) = call(&router, "GET", "/access/subordinates", Some((7, Some(1))), None).await;
        assert_eq!(s, StatusCode::OK);
        assert_eq!(body["subordinates"], serde_json::json!([9, 12]));

        let (s, _) = call(&router, "GET", "/access/subordinates", Some((7, None)), None).await;
        assert_eq!(s, StatusCode::FORBIDDEN);
    }
}
