use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use uuid::Uuid;
use validator::Validate;

use crate::models::profile::Experience;

/// The four bookable slots. Labels use U+2013 EN DASH and must match
/// byte-for-byte what clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "time_slot")]
pub enum TimeSlot {
    #[sqlx(rename = "1:00 PM – 3:00 PM")]
    #[serde(rename = "1:00 PM – 3:00 PM")]
    Afternoon,
    #[sqlx(rename = "3:00 PM – 6:00 PM")]
    #[serde(rename = "3:00 PM – 6:00 PM")]
    LateAfternoon,
    #[sqlx(rename = "6:00 PM – 9:00 PM")]
    #[serde(rename = "6:00 PM – 9:00 PM")]
    Evening,
    #[sqlx(rename = "9:00 PM – 12:00 AM")]
    #[serde(rename = "9:00 PM – 12:00 AM")]
    Night,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 4] = [
        TimeSlot::Afternoon,
        TimeSlot::LateAfternoon,
        TimeSlot::Evening,
        TimeSlot::Night,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Afternoon => "1:00 PM – 3:00 PM",
            TimeSlot::LateAfternoon => "3:00 PM – 6:00 PM",
            TimeSlot::Evening => "6:00 PM – 9:00 PM",
            TimeSlot::Night => "9:00 PM – 12:00 AM",
        }
    }

    pub fn valid_labels() -> String {
        Self::ALL
            .iter()
            .map(TimeSlot::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.label() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid timeSlot format. Please use one of: {}",
                    Self::valid_labels()
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub interviewer_id: Option<Uuid>,
    pub skills: Vec<String>,
    pub job_role: String,
    pub time_slot: TimeSlot,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl InterviewRequest {
    pub fn is_claimed(&self) -> bool {
        self.interviewer_id.is_some()
    }

    pub fn is_open(&self) -> bool {
        !self.is_claimed() && !self.completed
    }
}

/// Insert payload; the store assigns `id` and `created_at` and starts the
/// record unclaimed and not completed.
#[derive(Debug, Clone)]
pub struct NewInterviewRequest {
    pub requester_id: Uuid,
    pub skills: Vec<String>,
    pub job_role: String,
    pub time_slot: TimeSlot,
}

/// Conjunctive filter over interview requests. `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub claimed: Option<bool>,
    pub interviewer_id: Option<Uuid>,
    pub requester_id: Option<Uuid>,
    pub completed: Option<bool>,
}

impl RequestFilter {
    pub fn unclaimed() -> Self {
        Self {
            claimed: Some(false),
            completed: Some(false),
            ..Self::default()
        }
    }

    pub fn accepted_by(interviewer_id: Uuid) -> Self {
        Self {
            interviewer_id: Some(interviewer_id),
            completed: Some(false),
            ..Self::default()
        }
    }

    pub fn matches(&self, request: &InterviewRequest) -> bool {
        self.claimed.map_or(true, |c| request.is_claimed() == c)
            && self
                .interviewer_id
                .map_or(true, |id| request.interviewer_id == Some(id))
            && self.requester_id.map_or(true, |id| request.requester_id == id)
            && self.completed.map_or(true, |c| request.completed == c)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewRequest {
    #[validate(length(min = 1, message = "At least one skill is required"))]
    pub skills: Vec<String>,
    #[validate(length(min = 1, max = 120, message = "Job role is required"))]
    pub job_role: String,
    pub time_slot: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    #[validate(length(min = 1, max = 120, message = "Job role is required"))]
    pub job_role: String,
    pub time_slot: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInterviewRequest {
    pub interviewer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// Display data for the job seeker behind a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
}

pub const UNKNOWN_USER_NAME: &str = "Unknown User";
pub const UNKNOWN_USER_EMAIL: &str = "No email provided";

impl RequesterSummary {
    pub fn placeholder(id: Uuid, email: Option<String>) -> Self {
        Self {
            id,
            name: UNKNOWN_USER_NAME.to_string(),
            email: email.unwrap_or_else(|| UNKNOWN_USER_EMAIL.to_string()),
            skills: Vec::new(),
            experience: Vec::new(),
        }
    }
}

/// An interview request joined with its requester for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRequestView {
    pub id: Uuid,
    pub requester: RequesterSummary,
    pub interviewer_id: Option<Uuid>,
    pub skills: Vec<String>,
    pub job_role: String,
    pub time_slot: TimeSlot,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl InterviewRequestView {
    pub fn new(request: InterviewRequest, requester: RequesterSummary) -> Self {
        Self {
            id: request.id,
            requester,
            interviewer_id: request.interviewer_id,
            skills: request.skills,
            job_role: request.job_role,
            time_slot: request.time_slot,
            completed: request.completed,
            created_at: request.created_at,
        }
    }
}
