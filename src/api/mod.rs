// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth::authenticate, state::AppState};

pub mod health;
pub mod users;

/// Build the application router.
///
/// Every route, including the API docs and static files, sits behind the
/// authentication gate; the gate itself lets the health path through.
pub fn router(state: AppState) -> Router {
    let gate = state.gate.clone();

    let v1_routes = Router::new().route("/users/me", get(users::current_user));

    let mut app = Router::new()
        .route(gate.health_path(), get(health::health))
        .route("/access-denied", get(users::access_denied))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));

    if let Some(dir) = &state.static_dir {
        let prefix = gate.static_prefix().trim_end_matches('/');
        if prefix.is_empty() {
            tracing::warn!("Static prefix is the root path, not serving STATIC_DIR");
        } else {
            app = app.nest_service(prefix, ServeDir::new(dir));
        }
    }

    app.layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(health::health, users::current_user, users::access_denied),
    components(schemas(
        health::HealthResponse,
        health::HealthChecks,
        users::UserMeResponse
    )),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Users", description = "Authenticated user information")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::certificate::tests::ED_PUBLIC_PEM;
    use crate::auth::validator::tests::{sign, valid_claims_at, AUDIENCE};
    use crate::auth::{AuthGate, CertificateLoader, RoleManagementScope, TokenValidator};
    use crate::directory::InMemoryDirectory;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use chrono::Utc;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app() -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let key_path = dir.path().join("signing.pem");
        std::fs::write(&key_path, ED_PUBLIC_PEM).unwrap();
        let static_dir = dir.path().join("static");
        std::fs::create_dir(&static_dir).unwrap();
        std::fs::write(static_dir.join("app.js"), "console.log(1);").unwrap();

        let gate = AuthGate::new(
            CertificateLoader::from_path(&key_path).unwrap(),
            TokenValidator::new(AUDIENCE, 60),
            RoleManagementScope::All,
            Box::new(InMemoryDirectory::new()),
        );
        let state = AppState::new(Arc::new(gate)).with_static_dir(static_dir);
        (router(state), dir)
    }

    async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        app.clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn token() -> String {
        sign(&valid_claims_at(Utc::now().timestamp()))
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _dir) = test_app();
        let response = get(&app, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["checks"]["signing_key"], "ok");
    }

    #[tokio::test]
    async fn anonymous_requests_get_generic_forbidden() {
        let (app, _dir) = test_app();
        for uri in ["/v1/users/me", "/docs/", "/static/app.js", "/access-denied"] {
            let response = get(&app, uri, None).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
            let body = json(response).await;
            assert_eq!(body["error"], "Forbidden");
            assert_eq!(body["error_code"], "forbidden");
        }
    }

    #[tokio::test]
    async fn current_user_with_token() {
        let (app, _dir) = test_app();
        let response = get(&app, "/v1/users/me", Some(&token())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["username"], "user_123");
        assert_eq!(body["email"], "airflow@example.com");
        assert_eq!(body["roles"], serde_json::json!(["Op"]));
    }

    #[tokio::test]
    async fn access_denied_is_always_forbidden() {
        let (app, _dir) = test_app();
        let response = get(&app, "/access-denied", Some(&token())).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json(response).await["error"], "Access denied");
    }

    #[tokio::test]
    async fn static_files_served_behind_gate() {
        let (app, _dir) = test_app();
        let response = get(&app, "/static/app.js", Some(&token())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"console.log(1);");
    }

    #[tokio::test]
    async fn openapi_document_lists_routes() {
        let (app, _dir) = test_app();
        let response = get(&app, "/api-doc/openapi.json", Some(&token())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert!(body["paths"]["/v1/users/me"].is_object());
        assert!(body["paths"]["/health"].is_object());
    }
}
