use axum::{
    extract::{Extension, State},
    response::Json,
};
use bcrypt::{hash, verify};

use crate::{
    middleware::auth::AuthUser,
    models::user::{AccountUpdate, UpdateAccountRequest, UserResponse},
    utils::{
        errors::AppError,
        extract::ValidatedJson,
        logger::{fields, LOGGER},
    },
    AppState,
};

pub async fn get_account(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .repos
        .users
        .find_user(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpdateAccountRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .repos
        .users
        .find_user(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut update = AccountUpdate {
        name: payload.name.map(|n| n.trim().to_string()),
        phone: payload.phone,
        password_hash: None,
    };

    if let Some(new_password) = payload.new_password {
        let current = payload.current_password.unwrap_or_default();
        if !verify(&current, &user.password_hash)? {
            return Err(AppError::validation(
                "currentPassword",
                "Current password is incorrect",
            ));
        }
        if payload.confirm_password.as_deref() != Some(new_password.as_str()) {
            return Err(AppError::validation(
                "confirmPassword",
                "Passwords do not match",
            ));
        }
        update.password_hash = Some(hash(&new_password, state.config.bcrypt_cost)?);
    }

    let password_changed = update.password_hash.is_some();
    let updated = state
        .repos
        .users
        .update_user(auth_user.user_id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    LOGGER.log_business_event(
        "account_updated",
        Some(updated.id),
        fields([("password_changed", password_changed.into())]),
    );

    Ok(Json(UserResponse::from(updated)))
}
