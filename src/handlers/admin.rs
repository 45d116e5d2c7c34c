use axum::{
    extract::{Extension, State},
    response::Json,
};
use std::collections::HashMap;

use crate::{
    middleware::auth::AuthUser,
    models::user::UserResponse,
    services::dashboard::AdminDashboard,
    utils::{
        errors::AppError,
        logger::{fields, LOGGER},
    },
    AppState,
};

fn require_admin(auth_user: &AuthUser, resource: &str) -> Result<(), AppError> {
    if auth_user.is_admin() {
        return Ok(());
    }
    LOGGER.log_business_event(
        "unauthorized_admin_access",
        Some(auth_user.user_id),
        fields([
            ("role", auth_user.role.as_str().into()),
            ("resource", resource.into()),
        ]),
    );
    Err(AppError::Forbidden("Admin access required".to_string()))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<AdminDashboard>, AppError> {
    require_admin(&auth_user, "/admin/dashboard")?;

    match state.dashboards().admin().await {
        Ok(dashboard) => {
            LOGGER.log_request("GET", "/admin/dashboard", Some(auth_user.user_id), 200);
            Ok(Json(dashboard))
        }
        Err(err) => {
            let mut context = HashMap::new();
            context.insert("user_id".to_string(), auth_user.user_id.to_string().into());
            context.insert("error_type".to_string(), "dashboard".into());
            LOGGER.log_error(&err.to_string(), context);
            LOGGER.log_request(
                "GET",
                "/admin/dashboard",
                Some(auth_user.user_id),
                err.status_code().as_u16(),
            );
            Err(err)
        }
    }
}

pub async fn get_users(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    require_admin(&auth_user, "/admin/users")?;

    let users = state.dashboards().users().await?;
    LOGGER.log_request("GET", "/admin/users", Some(auth_user.user_id), 200);
    Ok(Json(users))
}
