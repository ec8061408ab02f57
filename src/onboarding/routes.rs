//! REST endpoints driving the wizard for the single-page front end.
//!
//! Every request opens a wizard scoped to the session id in the path, so
//! concurrent tabs on the same session follow last-writer-wins.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use super::handoff::AccountProvisioner;
use super::model::{BillingCycle, FacilityDraft};
use super::state::{OnboardingPatch, OnboardingState, WizardStep};
use super::wizard::{BillingOutcome, OnboardingWizard};
use crate::config::WizardConfig;
use crate::error::{ConfigError, OnboardingError};
use crate::store::OnboardingStore;

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub store: Arc<dyn OnboardingStore>,
    pub config: WizardConfig,
    /// Backend receiving completed drafts. `None` disables `/complete`.
    pub provisioner: Option<Arc<dyn AccountProvisioner>>,
}

impl OnboardingRouteState {
    async fn wizard(&self, session: Uuid) -> OnboardingWizard {
        OnboardingWizard::open(Arc::clone(&self.store), &session.to_string(), self.config).await
    }
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/onboarding/sessions", post(create_session))
        .route(
            "/api/onboarding/{session}",
            get(get_state).patch(patch_state).delete(clear_state),
        )
        .route("/api/onboarding/{session}/plan", post(set_plan))
        .route("/api/onboarding/{session}/step", post(set_step))
        .route("/api/onboarding/{session}/limits", get(get_limits))
        .route("/api/onboarding/{session}/facilities", post(add_facility))
        .route(
            "/api/onboarding/{session}/facilities/{index}",
            delete(remove_facility),
        )
        .route(
            "/api/onboarding/{session}/billing/{outcome}",
            post(billing_return),
        )
        .route("/api/onboarding/{session}/complete", post(complete))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// CORS for the front end. Without an origin every origin is allowed.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ConfigError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);
    match origin {
        Some(origin) => {
            let value = HeaderValue::from_str(origin).map_err(|e| ConfigError::InvalidValue {
                key: "EMERTRIX_CORS_ORIGIN".to_string(),
                message: e.to_string(),
            })?;
            Ok(layer.allow_origin(value))
        }
        None => Ok(layer.allow_origin(Any)),
    }
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Error body returned by every endpoint.
#[derive(Debug)]
pub enum ApiError {
    Onboarding(OnboardingError),
    HandoffDisabled,
}

impl From<OnboardingError> for ApiError {
    fn from(err: OnboardingError) -> Self {
        Self::Onboarding(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::HandoffDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Account provisioning is not configured".to_string(),
            ),
            Self::Onboarding(err) => {
                let status = match &err {
                    OnboardingError::InvalidTransition { .. } => StatusCode::CONFLICT,
                    OnboardingError::PlanRequired
                    | OnboardingError::FacilityLimitReached { .. }
                    | OnboardingError::Incomplete { .. }
                    | OnboardingError::NotComplete { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    OnboardingError::FacilityNotFound { .. } => StatusCode::NOT_FOUND,
                    OnboardingError::Provisioning(_) => StatusCode::BAD_GATEWAY,
                    OnboardingError::Store(_) | OnboardingError::Serialization(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                if status.is_server_error() {
                    error!(status = status.as_u16(), "Onboarding request failed: {}", err);
                }
                (status, err.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "emertrix-onboarding"
    }))
}

// ── Sessions ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionCreated {
    session_id: Uuid,
    state: OnboardingState,
}

/// POST /api/onboarding/sessions
///
/// Hands out a fresh session id. Nothing is persisted until the first write.
async fn create_session(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    let session_id = Uuid::new_v4();
    info!(%session_id, "Onboarding session created");
    let wizard = state.wizard(session_id).await;
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            state: wizard.state().clone(),
        }),
    )
}

/// GET /api/onboarding/{session}
async fn get_state(
    State(state): State<OnboardingRouteState>,
    Path(session): Path<Uuid>,
) -> Json<OnboardingState> {
    let wizard = state.wizard(session).await;
    Json(wizard.state().clone())
}

/// PATCH /api/onboarding/{session}
async fn patch_state(
    State(state): State<OnboardingRouteState>,
    Path(session): Path<Uuid>,
    Json(patch): Json<OnboardingPatch>,
) -> Result<Json<OnboardingState>, ApiError> {
    let mut wizard = state.wizard(session).await;
    Ok(Json(wizard.update(patch).await?))
}

/// DELETE /api/onboarding/{session}
async fn clear_state(
    State(state): State<OnboardingRouteState>,
    Path(session): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut wizard = state.wizard(session).await;
    wizard.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Steps ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PlanRequest {
    tier: String,
    #[serde(default)]
    billing: BillingCycle,
}

/// POST /api/onboarding/{session}/plan
async fn set_plan(
    State(state): State<OnboardingRouteState>,
    Path(session): Path<Uuid>,
    Json(req): Json<PlanRequest>,
) -> Result<Json<OnboardingState>, ApiError> {
    let mut wizard = state.wizard(session).await;
    wizard.set_plan_with_billing(req.tier, req.billing).await?;
    Ok(Json(wizard.state().clone()))
}

#[derive(Debug, Deserialize)]
struct StepRequest {
    step: WizardStep,
}

/// POST /api/onboarding/{session}/step
async fn set_step(
    State(state): State<OnboardingRouteState>,
    Path(session): Path<Uuid>,
    Json(req): Json<StepRequest>,
) -> Result<Json<OnboardingState>, ApiError> {
    let mut wizard = state.wizard(session).await;
    wizard.set_current_step(req.step).await?;
    Ok(Json(wizard.state().clone()))
}

/// GET /api/onboarding/{session}/limits
async fn get_limits(
    State(state): State<OnboardingRouteState>,
    Path(session): Path<Uuid>,
) -> impl IntoResponse {
    let wizard = state.wizard(session).await;
    Json(wizard.selected_plan_limits())
}

// ── Facilities ──────────────────────────────────────────────────────────

/// POST /api/onboarding/{session}/facilities
async fn add_facility(
    State(state): State<OnboardingRouteState>,
    Path(session): Path<Uuid>,
    Json(facility): Json<FacilityDraft>,
) -> Result<(StatusCode, Json<OnboardingState>), ApiError> {
    let mut wizard = state.wizard(session).await;
    let updated = wizard.add_facility(facility).await?;
    Ok((StatusCode::CREATED, Json(updated)))
}

/// DELETE /api/onboarding/{session}/facilities/{index}
async fn remove_facility(
    State(state): State<OnboardingRouteState>,
    Path((session, index)): Path<(Uuid, usize)>,
) -> Result<Json<FacilityDraft>, ApiError> {
    let mut wizard = state.wizard(session).await;
    Ok(Json(wizard.remove_facility(index).await?))
}

// ── Billing & completion ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BillingResumed {
    redirect_to: &'static str,
    state: OnboardingState,
}

/// POST /api/onboarding/{session}/billing/{outcome}
///
/// Called by the billing success/failure pages; tells the front end where
/// to resume.
async fn billing_return(
    State(state): State<OnboardingRouteState>,
    Path((session, outcome)): Path<(Uuid, BillingOutcome)>,
) -> Result<Json<BillingResumed>, ApiError> {
    let mut wizard = state.wizard(session).await;
    let redirect_to = wizard.resume_after_billing(outcome).await?;
    Ok(Json(BillingResumed {
        redirect_to,
        state: wizard.state().clone(),
    }))
}

/// POST /api/onboarding/{session}/complete
async fn complete(
    State(state): State<OnboardingRouteState>,
    Path(session): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let provisioner = state.provisioner.clone().ok_or(ApiError::HandoffDisabled)?;
    let mut wizard = state.wizard(session).await;
    let receipt = wizard.hand_off(provisioner.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: OnboardingError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn error_statuses() {
        assert_eq!(
            status_of(OnboardingError::InvalidTransition {
                from: WizardStep::PlanSelection,
                to: WizardStep::Complete,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(OnboardingError::FacilityLimitReached { limit: 1 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(OnboardingError::FacilityNotFound { index: 3 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::HandoffDisabled.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn cors_rejects_invalid_origin() {
        assert!(cors_layer(Some("https://app.emertrix.com")).is_ok());
        assert!(cors_layer(None).is_ok());
        assert!(cors_layer(Some("bad\norigin")).is_err());
    }
}
