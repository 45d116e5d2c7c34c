//! Storage seams. Handlers and services only see these traits; `main` picks
//! the Postgres or in-memory implementation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    models::{
        interview_request::{InterviewRequest, NewInterviewRequest, RequestFilter, TimeSlot},
        profile::{InterviewerProfile, JobSeekerProfile, StarterProfile},
        user::{AccountUpdate, NewUser, User},
    },
    utils::errors::AppError,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken (case-insensitive).
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    /// Creates the user and its starter profile as one unit: either both are
    /// stored or neither is. The profile's `user_id` is replaced with the new
    /// user's id.
    async fn create_account(
        &self,
        user: NewUser,
        starter: Option<StarterProfile>,
    ) -> Result<User, AppError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError>;
    /// Newest first.
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn update_user(&self, id: Uuid, update: AccountUpdate) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_job_seeker(&self, user_id: Uuid) -> Result<Option<JobSeekerProfile>, AppError>;
    async fn find_job_seekers(&self, user_ids: &[Uuid]) -> Result<Vec<JobSeekerProfile>, AppError>;
    /// Insert or replace; `created_at` of an existing profile is preserved.
    async fn upsert_job_seeker(&self, profile: JobSeekerProfile) -> Result<JobSeekerProfile, AppError>;
    async fn find_interviewer(&self, user_id: Uuid) -> Result<Option<InterviewerProfile>, AppError>;
    async fn upsert_interviewer(
        &self,
        profile: InterviewerProfile,
    ) -> Result<InterviewerProfile, AppError>;
}

#[async_trait]
pub trait InterviewRequestRepository: Send + Sync {
    /// Fails with `Conflict` when the requester already has an outstanding
    /// (not completed) request. The check is atomic with the insert.
    async fn create_request(&self, request: NewInterviewRequest) -> Result<InterviewRequest, AppError>;
    async fn find_request(&self, id: Uuid) -> Result<Option<InterviewRequest>, AppError>;
    async fn find_outstanding(&self, requester_id: Uuid) -> Result<Option<InterviewRequest>, AppError>;
    /// Most recently created request of the requester, completed or not.
    async fn find_latest(&self, requester_id: Uuid) -> Result<Option<InterviewRequest>, AppError>;
    /// Oldest first.
    async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<InterviewRequest>, AppError>;
    /// Sets the interviewer only if the record exists, is unclaimed and is not
    /// completed. `None` means nothing matched.
    async fn claim(&self, id: Uuid, interviewer_id: Uuid) -> Result<Option<InterviewRequest>, AppError>;
    /// Updates slot and role of the requester's outstanding request only while
    /// it is unclaimed.
    async fn reschedule_unclaimed(
        &self,
        requester_id: Uuid,
        time_slot: TimeSlot,
        job_role: String,
    ) -> Result<Option<InterviewRequest>, AppError>;
    /// Deletes the requester's outstanding request only while it is unclaimed.
    async fn delete_unclaimed(&self, requester_id: Uuid) -> Result<Option<InterviewRequest>, AppError>;
    /// Marks a claimed, not yet completed request as completed. With
    /// `interviewer_id` set, only that interviewer's claim matches.
    async fn mark_completed(
        &self,
        id: Uuid,
        interviewer_id: Option<Uuid>,
    ) -> Result<Option<InterviewRequest>, AppError>;
}

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub interviews: Arc<dyn InterviewRequestRepository>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool));
        Self {
            users: store.clone(),
            profiles: store.clone(),
            interviews: store,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            users: store.clone(),
            profiles: store.clone(),
            interviews: store,
        }
    }
}
