use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    middleware::auth::AuthUser,
    models::{
        interview_request::{
            AcceptInterviewRequest, CreateInterviewRequest, InterviewRequest,
            InterviewRequestView, ListQuery, RescheduleRequest,
        },
        user::UserRole,
    },
    utils::{
        errors::AppError,
        extract::{OptionalJson, ValidatedJson},
        logger::LOGGER,
    },
    AppState,
};

const STAFF: &[UserRole] = &[UserRole::Interviewer, UserRole::Admin];

pub async fn create_request(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreateInterviewRequest>,
) -> Result<(StatusCode, Json<InterviewRequest>), AppError> {
    auth_user.require(&[UserRole::JobSeeker])?;

    let created = state
        .interviews()
        .create(auth_user.user_id, payload)
        .await
        .map_err(|err| match err {
            AppError::Conflict(message) => AppError::BadRequest(message),
            other => other,
        })?;

    LOGGER.log_request("POST", "/interview-requests", Some(auth_user.user_id), 201);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_requests(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InterviewRequestView>>, AppError> {
    auth_user.require(STAFF)?;

    let service = state.interviews();
    let views = match query.status.as_deref().unwrap_or("unclaimed") {
        "unclaimed" => service.list_unclaimed().await?,
        "accepted" => service.list_accepted(auth_user.user_id).await?,
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown status '{}', expected unclaimed or accepted",
                other
            )))
        }
    };

    LOGGER.log_request("GET", "/interview-requests", Some(auth_user.user_id), 200);
    Ok(Json(views))
}

pub async fn accept_request(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    OptionalJson(body): OptionalJson<AcceptInterviewRequest>,
) -> Result<Json<InterviewRequestView>, AppError> {
    auth_user.require(STAFF)?;

    let named = body.and_then(|b| b.interviewer_id);
    let interviewer_id = if auth_user.is_admin() {
        named.ok_or_else(|| {
            AppError::validation("interviewerId", "Admins must name the interviewer to assign")
        })?
    } else {
        match named {
            Some(other) if other != auth_user.user_id => {
                return Err(AppError::Forbidden(
                    "Interviewers can only accept requests for themselves".to_string(),
                ))
            }
            _ => auth_user.user_id,
        }
    };

    let view = state.interviews().claim(id, interviewer_id).await?;

    LOGGER.log_request(
        "POST",
        "/interview-requests/:id/accept",
        Some(auth_user.user_id),
        200,
    );
    Ok(Json(view))
}

pub async fn complete_request(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewRequest>, AppError> {
    auth_user.require(STAFF)?;

    let actor = (!auth_user.is_admin()).then_some(auth_user.user_id);
    let done = state.interviews().complete(id, actor).await?;
    Ok(Json(done))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<InterviewRequest>, AppError> {
    auth_user.require(&[UserRole::JobSeeker])?;
    Ok(Json(state.interviews().current_for(auth_user.user_id).await?))
}

pub async fn get_user_schedule(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<InterviewRequest>, AppError> {
    auth_user.require(STAFF)?;
    Ok(Json(state.interviews().current_for(user_id).await?))
}

pub async fn reschedule(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<RescheduleRequest>,
) -> Result<Json<InterviewRequest>, AppError> {
    auth_user.require(&[UserRole::JobSeeker])?;

    let updated = state
        .interviews()
        .reschedule(auth_user.user_id, payload)
        .await?;

    LOGGER.log_request("PUT", "/interview-schedule", Some(auth_user.user_id), 200);
    Ok(Json(updated))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    auth_user.require(&[UserRole::JobSeeker])?;

    let deleted = state.interviews().cancel(auth_user.user_id).await?;

    LOGGER.log_request("DELETE", "/interview-schedule", Some(auth_user.user_id), 200);
    Ok(Json(json!({
        "message": "Interview cancelled successfully",
        "id": deleted.id,
    })))
}
