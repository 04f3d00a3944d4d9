//! REST endpoints the host UI drives the wizard through.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::error::WizardError;
use crate::wizard::forms::{DayImagesForm, PricesForm, ServicesForm};
use crate::wizard::state::DestinationEntry;
use crate::wizard::{DraftStatus, WizardSession, WizardStep};

/// Shared state for wizard routes.
#[derive(Clone)]
pub struct WizardRouteState {
    pub session: Arc<WizardSession>,
}

/// Build the wizard REST routes.
pub fn wizard_routes(session: Arc<WizardSession>) -> Router {
    let state = WizardRouteState { session };

    Router::new()
        .route("/health", get(health))
        .route("/api/wizard", get(get_snapshot))
        .route("/api/wizard/draft/reload", post(reload_draft))
        .route("/api/wizard/steps/{step}", get(check_step))
        .route("/api/wizard/steps/{step}/submit", post(submit_step))
        .route("/api/wizard/destinations/count", put(set_destination_count))
        .route("/api/wizard/destinations/{index}", put(edit_destination))
        .route("/api/wizard/reset", post(reset))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tour-wizard"
    }))
}

// ── State ───────────────────────────────────────────────────────────────

/// GET /api/wizard
async fn get_snapshot(State(state): State<WizardRouteState>) -> impl IntoResponse {
    Json(state.session.snapshot().await)
}

/// POST /api/wizard/draft/reload
///
/// Re-fetches the draft tour. Answers 503 when it is still unavailable.
async fn reload_draft(State(state): State<WizardRouteState>) -> Response {
    let status = state.session.load_draft().await;
    let code = match status {
        DraftStatus::Loaded => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(serde_json::json!(status))).into_response()
}

/// GET /api/wizard/steps/{step}
async fn check_step(
    State(state): State<WizardRouteState>,
    Path(step): Path<String>,
) -> Response {
    let step = match step.parse::<WizardStep>() {
        Ok(step) => step,
        Err(e) => return error_response(e),
    };
    match state.session.guard(step).await {
        Ok(decision) => Json(decision).into_response(),
        Err(e) => error_response(e),
    }
}

// ── Destination draft ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CountBody {
    count: usize,
}

/// PUT /api/wizard/destinations/count
async fn set_destination_count(
    State(state): State<WizardRouteState>,
    Json(body): Json<CountBody>,
) -> Response {
    match state.session.set_destination_count(body.count).await {
        Ok(entries) => Json(serde_json::json!({ "destination_draft": entries })).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct EditBody {
    city: Option<String>,
    nights: Option<i64>,
}

/// PUT /api/wizard/destinations/{index}
///
/// Nights outside `0..=max` are clamped, not rejected.
async fn edit_destination(
    State(state): State<WizardRouteState>,
    Path(index): Path<usize>,
    Json(body): Json<EditBody>,
) -> Response {
    match state
        .session
        .edit_destination(index, body.city, body.nights)
        .await
    {
        Ok(edit) => Json(edit).into_response(),
        Err(e) => error_response(e),
    }
}

// ── Submit / reset ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct DestinationBody {
    #[serde(default)]
    entries: Option<Vec<DestinationEntry>>,
}

/// POST /api/wizard/steps/{step}/submit
///
/// The body is the step's form. For `destination` it may carry `entries`,
/// which replace the session draft once the step is known to be open.
async fn submit_step(
    State(state): State<WizardRouteState>,
    Path(step): Path<String>,
    body: Option<Json<Value>>,
) -> Response {
    let step = match step.parse::<WizardStep>() {
        Ok(step) => step,
        Err(e) => return error_response(e),
    };
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let session = &state.session;

    let result = match step {
        WizardStep::DayImages => match parse_body::<DayImagesForm>(body) {
            Ok(form) => session.submit_day_images(&form).await,
            Err(resp) => return resp,
        },
        WizardStep::Destination => {
            let parsed = if body.is_null() {
                Ok(DestinationBody::default())
            } else {
                parse_body::<DestinationBody>(body)
            };
            match parsed {
                Ok(body) => session.submit_destinations(body.entries).await,
                Err(resp) => return resp,
            }
        }
        WizardStep::Prices => match parse_body::<PricesForm>(body) {
            Ok(form) => session.submit_prices(&form).await,
            Err(resp) => return resp,
        },
        WizardStep::Services => match parse_body::<ServicesForm>(body) {
            Ok(form) => session.submit_services(&form).await,
            Err(resp) => return resp,
        },
    };

    match result {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/wizard/reset
async fn reset(State(state): State<WizardRouteState>) -> Response {
    match state.session.reset().await {
        Ok(()) => Json(state.session.snapshot().await).into_response(),
        Err(e) => error_response(e),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, Response> {
    serde_json::from_value(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": format!("Invalid request body: {e}")})),
        )
            .into_response()
    })
}

fn error_response(err: WizardError) -> Response {
    let message = err.to_string();
    match err {
        WizardError::UnknownStep(_) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": message})),
        )
            .into_response(),
        WizardError::StepLocked { redirect_to, .. } => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": message, "redirect_to": redirect_to})),
        )
            .into_response(),
        WizardError::DraftNotLoaded => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": message})),
        )
            .into_response(),
        WizardError::DestinationOutOfRange { .. } => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": message})),
        )
            .into_response(),
        WizardError::Validation { errors, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": message, "errors": errors})),
        )
            .into_response(),
        WizardError::Submission { .. } => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({"error": message})),
        )
            .into_response(),
        WizardError::Storage(_) => {
            warn!(error = %message, "Flag store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": message})),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::api::{DraftTour, RetryConfig, TourApi};
    use crate::error::ApiError;
    use crate::store::MemoryFlagStore;
    use crate::wizard::WizardController;
    use crate::wizard::controller::DEFAULT_FLAG_TTL;

    struct FixedDraft;

    #[async_trait]
    impl TourApi for FixedDraft {
        async fn last_tour(&self) -> Result<DraftTour, ApiError> {
            Ok(DraftTour {
                id: 7,
                title: "Nile Cruise".to_string(),
                days: 10,
            })
        }
        async fn store_day_images(&self, _: u64, _: &DayImagesForm) -> Result<(), ApiError> {
            Ok(())
        }
        async fn store_destinations(&self, _: u64, _: &[DestinationEntry]) -> Result<(), ApiError> {
            Ok(())
        }
        async fn store_prices(&self, _: u64, _: &PricesForm) -> Result<(), ApiError> {
            Ok(())
        }
        async fn store_services(&self, _: u64, _: &ServicesForm) -> Result<(), ApiError> {
            Ok(())
        }
    }

    async fn app() -> Router {
        let controller =
            WizardController::new(Arc::new(MemoryFlagStore::new()), DEFAULT_FLAG_TTL);
        let session = WizardSession::open(controller, Arc::new(FixedDraft), RetryConfig::none())
            .await
            .unwrap();
        session.load_draft().await;
        wizard_routes(Arc::new(session))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn unknown_step_is_bad_request() {
        let app = app().await;
        let (status, _) = call(&app, "GET", "/api/wizard/steps/payment", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn locked_step_reports_redirect() {
        let app = app().await;
        let (status, json) = call(&app, "GET", "/api/wizard/steps/prices", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["allowed"], false);
        assert_eq!(json["redirect_to"], "day_images");

        let (status, json) = call(
            &app,
            "POST",
            "/api/wizard/steps/prices/submit",
            Some(serde_json::json!({"prices": []})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["redirect_to"], "day_images");
    }

    async fn open_destination(app: &Router) {
        let (status, _) = call(
            app,
            "POST",
            "/api/wizard/steps/day_images/submit",
            Some(serde_json::json!({"images": [{"day": 1, "url": "https://cdn.example.com/1.jpg"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn nights_edit_is_clamped() {
        let app = app().await;
        open_destination(&app).await;
        call(
            &app,
            "PUT",
            "/api/wizard/destinations/count",
            Some(serde_json::json!({"count": 2})),
        )
        .await;
        call(
            &app,
            "PUT",
            "/api/wizard/destinations/0",
            Some(serde_json::json!({"city": "Cairo", "nights": 4})),
        )
        .await;
        let (status, json) = call(
            &app,
            "PUT",
            "/api/wizard/destinations/1",
            Some(serde_json::json!({"nights": 20})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["entry"]["nights"], 6);
        assert_eq!(json["remaining_nights"], 0);

        let (status, _) = call(
            &app,
            "PUT",
            "/api/wizard/destinations/5",
            Some(serde_json::json!({"nights": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn locked_destination_submit_keeps_draft() {
        let app = app().await;
        let (status, json) = call(
            &app,
            "POST",
            "/api/wizard/steps/destination/submit",
            Some(serde_json::json!({"entries": [{"city": "Cairo", "nights": 3}]})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["redirect_to"], "day_images");

        let (_, snap) = call(&app, "GET", "/api/wizard", None).await;
        assert_eq!(snap["destination_draft"], serde_json::json!([]));

        let (status, _) = call(
            &app,
            "PUT",
            "/api/wizard/destinations/count",
            Some(serde_json::json!({"count": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_form_is_unprocessable() {
        let app = app().await;
        let (status, json) = call(
            &app,
            "POST",
            "/api/wizard/steps/day_images/submit",
            Some(serde_json::json!({"images": []})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!json["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let app = app().await;
        let (status, _) = call(
            &app,
            "POST",
            "/api/wizard/steps/day_images/submit",
            Some(serde_json::json!({"images": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = app().await;
        let (status, json) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }
}
