use axum::{
    extract::{Extension, State},
    response::Json,
};

use crate::{
    middleware::auth::AuthUser,
    models::user::UserRole,
    services::dashboard::{InterviewerDashboard, JobSeekerDashboard},
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

pub async fn job_seeker_dashboard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<JobSeekerDashboard>, AppError> {
    auth_user.require(&[UserRole::JobSeeker])?;

    let dashboard = state.dashboards().job_seeker(auth_user.user_id).await?;
    LOGGER.log_request("GET", "/dashboard/job-seeker", Some(auth_user.user_id), 200);
    Ok(Json(dashboard))
}

pub async fn interviewer_dashboard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<InterviewerDashboard>, AppError> {
    auth_user.require(&[UserRole::Interviewer])?;

    let dashboard = state.dashboards().interviewer(auth_user.user_id).await?;
    LOGGER.log_request("GET", "/dashboard/interviewer", Some(auth_user.user_id), 200);
    Ok(Json(dashboard))
}
