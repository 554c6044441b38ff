//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification. The authenticated user id is
//! supplied by the upstream session collaborator through the `x-user-id`
//! header; this service never authenticates on its own.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;
use utoipa::OpenApi;
use uuid::Uuid;

use booktrack_core::ports::{CandidateFilter, PortError, UserBookFilter};
use booktrack_core::recommend;

use crate::web::state::AppState;
use crate::web::USER_ID_HEADER;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_dashboard_handler,
        get_recommendations_handler,
    ),
    tags(
        (name = "Booktrack API", description = "Reading goal progress and recommendation endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Request Payloads
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    /// Maximum number of books to return; falls back to the configured default.
    pub limit: Option<usize>,
}

/// Extracts and parses the `x-user-id` header the session collaborator sets.
fn user_id_from_headers(headers: &HeaderMap) -> Result<Uuid, (StatusCode, String)> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "x-user-id header is required".to_string(),
            )
        })?;

    Uuid::parse_str(raw)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid x-user-id format".to_string()))
}

fn port_error_response(context: &str, e: &PortError) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        PortError::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "A backing service is temporarily unavailable".to_string(),
        ),
        PortError::Unexpected(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to {}", context),
        ),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Build the dashboard payload for one user.
///
/// Always returns 200 with a partial-failure payload: each section is
/// independently marked ok or failed, so the presentation layer can render
/// whatever succeeded.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard payload, possibly with failed sections"),
        (status = 400, description = "Missing or malformed x-user-id header")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The authenticated user's ID.")
    )
)]
pub async fn get_dashboard_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;

    let payload = app_state.dashboard.build(user_id, Utc::now()).await;
    Ok(Json(payload))
}

/// Rank book recommendations for one user.
///
/// Consumes the precomputed Reading DNA; a new user with no taste signal
/// gets a popularity-only ranking rather than an empty response.
#[utoipa::path(
    get,
    path = "/recommendations",
    responses(
        (status = 200, description = "Ranked, deduplicated recommendation list"),
        (status = 400, description = "Missing or malformed x-user-id header"),
        (status = 503, description = "Catalog or library fetch temporarily unavailable")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The authenticated user's ID."),
        ("limit" = Option<usize>, Query, description = "Maximum number of books to return.")
    )
)]
pub async fn get_recommendations_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<RecommendationParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user_id = user_id_from_headers(&headers)?;
    let limit = params.limit.unwrap_or(app_state.config.recommendation_limit);

    // The three reads are independent; issue them together.
    let (dna, candidates, owned_books) = tokio::join!(
        app_state.dna.get_reading_dna(user_id),
        app_state.storage.get_candidate_books(CandidateFilter::default()),
        app_state
            .storage
            .get_user_books(user_id, UserBookFilter::default()),
    );

    // An absent or partial DNA is a degraded input, not a failure.
    let dna = dna.unwrap_or_else(|e| {
        error!("Reading DNA fetch failed, degrading to popularity: {:?}", e);
        Default::default()
    });

    let candidates =
        candidates.map_err(|e| port_error_response("fetch candidate books", &e))?;
    let owned_books =
        owned_books.map_err(|e| port_error_response("fetch the user's library", &e))?;

    let owned: HashSet<Uuid> = owned_books.iter().map(|b| b.book_id).collect();
    let ranked = recommend::recommend(
        &dna,
        &candidates,
        &owned,
        limit,
        app_state.config.scoring_weights,
    );

    Ok(Json(ranked))
}
