use axum::{
    extract::{Extension, State},
    response::Json,
};

use crate::{
    middleware::auth::AuthUser,
    models::{
        profile::{
            InterviewerProfile, JobSeekerProfile, UpsertInterviewerProfileRequest,
            UpsertJobSeekerProfileRequest,
        },
        user::UserRole,
    },
    utils::{errors::AppError, extract::ValidatedJson},
    AppState,
};

pub async fn get_job_seeker_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<JobSeekerProfile>, AppError> {
    auth_user.require(&[UserRole::JobSeeker])?;

    let profile = state
        .repos
        .profiles
        .find_job_seeker(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job seeker profile not found".to_string()))?;

    Ok(Json(profile))
}

pub async fn upsert_job_seeker_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpsertJobSeekerProfileRequest>,
) -> Result<Json<JobSeekerProfile>, AppError> {
    auth_user.require(&[UserRole::JobSeeker])?;

    let profile = state
        .repos
        .profiles
        .upsert_job_seeker(payload.into_profile(auth_user.user_id))
        .await?;

    Ok(Json(profile))
}

pub async fn get_interviewer_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<InterviewerProfile>, AppError> {
    auth_user.require(&[UserRole::Interviewer])?;

    let profile = state
        .repos
        .profiles
        .find_interviewer(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Interviewer profile not found".to_string()))?;

    Ok(Json(profile))
}

pub async fn upsert_interviewer_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpsertInterviewerProfileRequest>,
) -> Result<Json<InterviewerProfile>, AppError> {
    auth_user.require(&[UserRole::Interviewer])?;

    let profile = state
        .repos
        .profiles
        .upsert_interviewer(payload.into_profile(auth_user.user_id))
        .await?;

    Ok(Json(profile))
}
