use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    JobSeeker,
    Interviewer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::JobSeeker => "job-seeker",
            UserRole::Interviewer => "interviewer",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job-seeker" => Ok(UserRole::JobSeeker),
            "interviewer" => Ok(UserRole::Interviewer),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("Invalid role '{}'", other)),
        }
    }
}

/// Insert payload for the user store; the store assigns the id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    static PHONE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = PHONE.get_or_init(|| {
        regex::Regex::new(r"^\+?[0-9][0-9 ()-]{5,19}$").expect("phone pattern is valid")
    });

    if phone.is_empty() || re.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("Phone number must contain 6-20 digits".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub role: UserRole,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    pub admin_code: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    #[serde(default)]
    pub expertise: Vec<String>,
    pub experience: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    pub current_password: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Splits a display name into first name and the remainder.
pub fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_use_kebab_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&UserRole::JobSeeker).unwrap(),
            "\"job-seeker\""
        );
        assert_eq!("interviewer".parse::<UserRole>(), Ok(UserRole::Interviewer));
        assert!("company".parse::<UserRole>().is_err());
    }

    #[test]
    fn split_name_keeps_multi_part_last_names() {
        assert_eq!(
            split_name("Asha  Devi Rao"),
            ("Asha".to_string(), "Devi Rao".to_string())
        );
        assert_eq!(split_name("Ravi"), ("Ravi".to_string(), String::new()));
    }

    #[test]
    fn phone_format() {
        assert!(validate_phone("+91 98765-43210").is_ok());
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("call me").is_err());
    }
}
