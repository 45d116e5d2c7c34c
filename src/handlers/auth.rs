use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::{hash, verify};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    models::{
        profile::{normalize_tags, InterviewerProfile, JobSeekerProfile, StarterProfile},
        user::{
            split_name, CreateUserRequest, LoginRequest, LoginResponse, NewUser, UserResponse,
            UserRole,
        },
    },
    utils::{
        errors::AppError,
        extract::ValidatedJson,
        jwt::create_jwt,
        logger::{fields, LOGGER},
    },
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    if payload.role == UserRole::Admin {
        let supplied = payload.admin_code.as_deref().unwrap_or_default();
        match state.config.admin_signup_code.as_deref() {
            Some(code) if code == supplied => {}
            _ => return Err(AppError::BadRequest("Invalid admin code".to_string())),
        }
    }

    let password_hash = hash(&payload.password, state.config.bcrypt_cost)?;
    let email = payload.email.trim().to_lowercase();
    let role = payload.role;

    let name = payload.name.trim().to_string();
    let phone = payload.phone.clone().filter(|p| !p.is_empty());
    let starter = starter_profile(&name, phone.as_deref(), payload);

    let user = state
        .repos
        .users
        .create_account(
            NewUser {
                email,
                password_hash,
                name,
                phone,
                role,
            },
            starter,
        )
        .await?;

    LOGGER.log_business_event(
        "user_registered",
        Some(user.id),
        fields([("role", user.role.as_str().into())]),
    );
    LOGGER.log_request("POST", "/auth/register", Some(user.id), 201);

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Job seekers start with an empty profile, interviewers with the extras
/// given at signup. The store assigns `user_id`.
fn starter_profile(name: &str, phone: Option<&str>, payload: CreateUserRequest) -> Option<StarterProfile> {
    let (first_name, last_name) = split_name(name);
    let phone = phone.unwrap_or_default().to_string();

    match payload.role {
        UserRole::JobSeeker => {
            let mut profile = JobSeekerProfile::blank(Uuid::nil(), first_name, last_name);
            profile.phone = phone;
            Some(StarterProfile::JobSeeker(profile))
        }
        UserRole::Interviewer => {
            let now = Utc::now();
            Some(StarterProfile::Interviewer(InterviewerProfile {
                user_id: Uuid::nil(),
                first_name,
                last_name,
                phone,
                expertise: normalize_tags(payload.expertise),
                experience_years: payload.experience.unwrap_or(0).clamp(0, 70),
                company: payload.company.unwrap_or_default(),
                position: payload.position.unwrap_or_default(),
                availability: Vec::new(),
                created_at: now,
                updated_at: now,
            }))
        }
        UserRole::Admin => None,
    }
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .repos
        .users
        .find_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = create_jwt(
        user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )
    .map_err(|_| AppError::InternalServerError("Failed to create token".to_string()))?;

    LOGGER.log_request("POST", "/auth/login", Some(user.id), 200);

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}
