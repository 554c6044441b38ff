pub mod rest;
pub mod state;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use tower_http::cors::CorsLayer;

// Re-export the handlers to make them easily accessible to the binary that
// builds the web server router.
pub use rest::{get_dashboard_handler, get_recommendations_handler};

/// The header the session collaborator identifies the caller through.
pub const USER_ID_HEADER: &str = "x-user-id";

/// CORS policy for the presentation collaborator's origin. The user-id
/// header must be allowed or browser preflights reject every endpoint.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(USER_ID_HEADER),
        ])
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn preflight_allows_the_user_id_header() {
        let app = Router::new()
            .route("/dashboard", get(|| async { "ok" }))
            .layer(cors_layer("http://localhost:3000".parse().unwrap()));

        let preflight = Request::builder()
            .method(Method::OPTIONS)
            .uri("/dashboard")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "GET")
            .header("access-control-request-headers", USER_ID_HEADER)
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(preflight).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let allowed = response
            .headers()
            .get("access-control-allow-headers")
            .expect("preflight response must list allowed headers")
            .to_str()
            .unwrap()
            .to_lowercase();
        assert!(allowed.contains(USER_ID_HEADER));
    }
}
