use crate::AppState;
use serde_json::json;
use service_core::axum::{extract::State, http::StatusCode};
use service_core::error::AppError;
use service_core::json_api::{error_object, JsonApi};
use service_core::readiness::GateState;

/// Re-runs the functional checks against the live dependencies.
pub async fn health_check(State(state): State<AppState>) -> Result<JsonApi<bool>, AppError> {
    state
        .checks
        .run(state.config.readiness.probe.check_timeout)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Health check failed");
            AppError::from(e)
        })?;

    let app = &state.config.app;
    Ok(JsonApi::success(
        true,
        "App is healthy.",
        json!({
            "app": {
                "name": app.name,
                "version": app.version,
                "tag": app.tag,
            }
        }),
    ))
}

/// Reports whether the startup gate has let the application through.
pub async fn readiness_check(State(state): State<AppState>) -> JsonApi<bool> {
    let gate_state = *state.readiness.borrow();
    let metadata = json!({ "state": gate_state.as_str() });

    if gate_state == GateState::Ready {
        JsonApi::success(true, "App is ready.", metadata)
    } else {
        JsonApi(
            StatusCode::SERVICE_UNAVAILABLE,
            error_object(Some("App is not ready."), metadata),
        )
    }
}
