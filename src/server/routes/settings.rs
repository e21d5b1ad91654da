//! Settings persistence and toolchain probe endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::ConvertSettings;
use crate::error::Result;
use crate::server::state::AppState;

/// GET /api/settings - Load persisted conversion settings
pub async fn get_settings(State(state): State<AppState>) -> Json<ConvertSettings> {
    Json(state.settings().load())
}

#[derive(Debug, Serialize)]
pub struct SaveSettingsResponse {
    pub saved: bool,
}

/// PUT /api/settings - Save conversion settings
pub async fn save_settings(
    State(state): State<AppState>,
    Json(settings): Json<ConvertSettings>,
) -> Result<Json<SaveSettingsResponse>> {
    state.settings().save(&settings)?;
    tracing::info!("Settings saved");
    Ok(Json(SaveSettingsResponse { saved: true }))
}

#[derive(Debug, Serialize)]
pub struct ToolStatusResponse {
    /// Whether the conversion tool answered a version probe
    pub available: bool,
    pub executable: String,
    pub conda_env: Option<String>,
}

/// GET /api/tool - Conversion tool availability
pub async fn tool_status(State(state): State<AppState>) -> Json<ToolStatusResponse> {
    let resolver = state.resolver();
    Json(ToolStatusResponse {
        available: resolver.probe().await,
        executable: resolver.executable().to_string(),
        conda_env: resolver.conda_env().map(String::from),
    })
}
