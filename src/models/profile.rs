use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::validate_phone;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub company: String,
    pub position: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSeekerProfile {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub resume: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobSeekerProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Starter profile created at signup.
    pub fn blank(user_id: Uuid, first_name: String, last_name: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            first_name,
            last_name,
            phone: String::new(),
            skills: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            resume: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewerProfile {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub expertise: Vec<String>,
    pub experience_years: i32,
    pub company: String,
    pub position: String,
    pub availability: Vec<Availability>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertJobSeekerProfileRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(custom = "validate_phone")]
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    pub resume: Option<String>,
}

impl UpsertJobSeekerProfileRequest {
    pub fn into_profile(self, user_id: Uuid) -> JobSeekerProfile {
        let now = Utc::now();
        JobSeekerProfile {
            user_id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone,
            skills: normalize_tags(self.skills),
            experience: self.experience,
            education: self.education,
            resume: self.resume.filter(|r| !r.trim().is_empty()),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertInterviewerProfileRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(custom = "validate_phone")]
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[validate(range(min = 0, max = 70, message = "Experience must be between 0 and 70 years"))]
    #[serde(default)]
    pub experience_years: i32,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub availability: Vec<Availability>,
}

impl UpsertInterviewerProfileRequest {
    pub fn into_profile(self, user_id: Uuid) -> InterviewerProfile {
        let now = Utc::now();
        InterviewerProfile {
            user_id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: self.phone,
            expertise: normalize_tags(self.expertise),
            experience_years: self.experience_years,
            company: self.company,
            position: self.position,
            availability: self.availability,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Profile written in the same store operation as a new account.
#[derive(Debug, Clone)]
pub enum StarterProfile {
    JobSeeker(JobSeekerProfile),
    Interviewer(InterviewerProfile),
}

impl StarterProfile {
    pub fn with_user_id(self, user_id: Uuid) -> Self {
        match self {
            StarterProfile::JobSeeker(profile) => {
                StarterProfile::JobSeeker(JobSeekerProfile { user_id, ..profile })
            }
            StarterProfile::Interviewer(profile) => {
                StarterProfile::Interviewer(InterviewerProfile { user_id, ..profile })
            }
        }
    }
}

/// Trims tags and drops the empty ones, keeping order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_blank_entries_dropped() {
        let tags = vec![" Rust ".to_string(), "".to_string(), "  ".to_string(), "SQL".to_string()];
        assert_eq!(normalize_tags(tags), vec!["Rust", "SQL"]);
    }

    #[test]
    fn full_name_without_last_name_has_no_trailing_space() {
        let profile = JobSeekerProfile::blank(Uuid::new_v4(), "Ravi".into(), String::new());
        assert_eq!(profile.full_name(), "Ravi");
    }
}
