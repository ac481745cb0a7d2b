use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::{AppError, AppJson};
use crate::models::job::{JobRow, NewJob};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
}

impl CreateJobRequest {
    fn validate(self) -> Result<NewJob, AppError> {
        let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let title = non_blank(self.title)
            .ok_or_else(|| AppError::Validation("title is required".to_string()))?;
        let company = non_blank(self.company)
            .ok_or_else(|| AppError::Validation("company is required".to_string()))?;
        Ok(NewJob {
            title,
            company,
            description: non_blank(self.description),
            location: non_blank(self.location),
            salary: non_blank(self.salary),
        })
    }
}

/// GET /api/jobs
///
/// All jobs, newest first.
pub async fn handle_list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobRow>>, AppError> {
    Ok(Json(state.store.list_jobs().await?))
}

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let job = request.validate()?;
    let row = state.store.create_job(job, user.user_id).await?;
    info!("{} ({}) posted job {}", user.email, user.user_id, row.id);
    Ok((StatusCode::CREATED, Json(row)))
}
