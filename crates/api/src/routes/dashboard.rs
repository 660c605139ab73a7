use axum::{Json, extract::State};
use taskflow_services::dashboard::DashboardSummary;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

pub async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DashboardSummary>, ApiError> {
    Ok(Json(state.dashboard.summary(&auth.principal).await?))
}
