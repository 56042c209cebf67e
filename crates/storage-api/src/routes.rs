//! HTTP route definitions

use crate::{AppState, handlers, middleware};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// CORS policy for the configured origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        // Service endpoints
        .route("/v1", get(handlers::home))
        .route("/v1/", get(handlers::home))

        // Listing endpoints
        .route("/v1/files", get(handlers::list_root))
        .route("/v1/files/", get(handlers::list_root))
        .route("/v1/files/{*path}", get(handlers::list_files))

        // File endpoints
        .route(
            "/v1/file",
            post(handlers::upload_files)
                .get(handlers::missing_filename)
                .delete(handlers::missing_filename),
        )
        .route(
            "/v1/file/",
            get(handlers::missing_filename).delete(handlers::missing_filename),
        )
        .route(
            "/v1/file/{*path}",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        .route("/v1/link/{*path}", get(handlers::share_link))
        .fallback(middleware::not_found_fallback)
        .method_not_allowed_fallback(middleware::method_not_allowed_fallback)

        // Apply middleware, innermost first
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::ip_gate_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayConfig;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use storage_api_store::MemoryObjectStore;
    use tower::ServiceExt;

    fn router() -> Router {
        let config = GatewayConfig {
            token: "secret".to_string(),
            trust_proxy: true,
            cors_origins: vec!["https://app.example.com".to_string()],
            ..Default::default()
        };
        let state = AppState::with_store(config, Arc::new(MemoryObjectStore::default())).unwrap();
        create_router(Arc::new(state))
    }

    #[tokio::test]
    async fn test_preflight_skips_access_control() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/v1/files")
                    .header(header::ORIGIN, "https://app.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn test_unknown_client_address_is_forbidden() {
        // No ConnectInfo and no forwarding headers
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/v1")
                    .header(header::AUTHORIZATION, "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_forwarded_loopback_reaches_handler() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/v1/")
                    .header("x-forwarded-for", "127.0.0.1")
                    .header(header::AUTHORIZATION, "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "API is up and running!");
    }
}
