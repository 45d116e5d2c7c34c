use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{InterviewRequestRepository, ProfileRepository, UserRepository};
use crate::{
    models::{
        interview_request::{InterviewRequest, NewInterviewRequest, RequestFilter, TimeSlot},
        profile::{InterviewerProfile, JobSeekerProfile, StarterProfile},
        user::{AccountUpdate, NewUser, User},
    },
    utils::errors::AppError,
};

/// Process-local store used for tests and for running without Postgres.
/// Every compound check-and-write happens under a single write lock, which
/// gives the same atomicity the Postgres store gets from conditional updates
/// and the partial unique index.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    job_seekers: RwLock<HashMap<Uuid, JobSeekerProfile>>,
    interviewers: RwLock<HashMap<Uuid, InterviewerProfile>>,
    requests: RwLock<HashMap<Uuid, InterviewRequest>>,
}

/// Same bounds as the `experience_years` CHECK constraint.
fn check_interviewer(profile: &InterviewerProfile) -> Result<(), AppError> {
    if (0..=70).contains(&profile.experience_years) {
        Ok(())
    } else {
        Err(AppError::InternalServerError(
            "experience_years violates its check constraint".to_string(),
        ))
    }
}

impl MemoryStore {
    fn insert_user(users: &mut HashMap<Uuid, User>, user: NewUser) -> Result<User, AppError> {
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            phone: user.phone,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    fn outstanding_of<'a>(
        requests: &'a mut HashMap<Uuid, InterviewRequest>,
        requester_id: Uuid,
    ) -> Option<&'a mut InterviewRequest> {
        requests
            .values_mut()
            .find(|r| r.requester_id == requester_id && !r.completed)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        Self::insert_user(&mut users, user)
    }

    async fn create_account(
        &self,
        user: NewUser,
        starter: Option<StarterProfile>,
    ) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let mut job_seekers = self.job_seekers.write().await;
        let mut interviewers = self.interviewers.write().await;

        // Every check runs before the first write.
        if let Some(StarterProfile::Interviewer(profile)) = &starter {
            check_interviewer(profile)?;
        }
        let created = Self::insert_user(&mut users, user)?;

        match starter.map(|profile| profile.with_user_id(created.id)) {
            Some(StarterProfile::JobSeeker(profile)) => {
                job_seekers.insert(profile.user_id, profile);
            }
            Some(StarterProfile::Interviewer(profile)) => {
                interviewers.insert(profile.user_id, profile);
            }
            None => {}
        }
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut all: Vec<User> = self.users.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update_user(&self, id: Uuid, update: AccountUpdate) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find_job_seeker(&self, user_id: Uuid) -> Result<Option<JobSeekerProfile>, AppError> {
        Ok(self.job_seekers.read().await.get(&user_id).cloned())
    }

    async fn find_job_seekers(&self, user_ids: &[Uuid]) -> Result<Vec<JobSeekerProfile>, AppError> {
        let profiles = self.job_seekers.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| profiles.get(id).cloned())
            .collect())
    }

    async fn upsert_job_seeker(
        &self,
        mut profile: JobSeekerProfile,
    ) -> Result<JobSeekerProfile, AppError> {
        let mut profiles = self.job_seekers.write().await;
        let now = Utc::now();
        if let Some(existing) = profiles.get(&profile.user_id) {
            profile.created_at = existing.created_at;
        }
        profile.updated_at = now;
        profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn find_interviewer(&self, user_id: Uuid) -> Result<Option<InterviewerProfile>, AppError> {
        Ok(self.interviewers.read().await.get(&user_id).cloned())
    }

    async fn upsert_interviewer(
        &self,
        mut profile: InterviewerProfile,
    ) -> Result<InterviewerProfile, AppError> {
        check_interviewer(&profile)?;
        let mut profiles = self.interviewers.write().await;
        if let Some(existing) = profiles.get(&profile.user_id) {
            profile.created_at = existing.created_at;
        }
        profile.updated_at = Utc::now();
        profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }
}

#[async_trait]
impl InterviewRequestRepository for MemoryStore {
    async fn create_request(&self, request: NewInterviewRequest) -> Result<InterviewRequest, AppError> {
        let mut requests = self.requests.write().await;
        if Self::outstanding_of(&mut requests, request.requester_id).is_some() {
            return Err(AppError::Conflict(
                "User already has a pending interview request".to_string(),
            ));
        }

        let created = InterviewRequest {
            id: Uuid::new_v4(),
            requester_id: request.requester_id,
            interviewer_id: None,
            skills: request.skills,
            job_role: request.job_role,
            time_slot: request.time_slot,
            completed: false,
            created_at: Utc::now(),
        };
        requests.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<InterviewRequest>, AppError> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn find_outstanding(&self, requester_id: Uuid) -> Result<Option<InterviewRequest>, AppError> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .find(|r| r.requester_id == requester_id && !r.completed)
            .cloned())
    }

    async fn find_latest(&self, requester_id: Uuid) -> Result<Option<InterviewRequest>, AppError> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|r| r.requester_id == requester_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<InterviewRequest>, AppError> {
        let mut matching: Vec<InterviewRequest> = self
            .requests
            .read()
            .await
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching)
    }

    async fn claim(&self, id: Uuid, interviewer_id: Uuid) -> Result<Option<InterviewRequest>, AppError> {
        let mut requests = self.requests.write().await;
        match requests.get_mut(&id) {
            Some(request) if request.is_open() => {
                request.interviewer_id = Some(interviewer_id);
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn reschedule_unclaimed(
        &self,
        requester_id: Uuid,
        time_slot: TimeSlot,
        job_role: String,
    ) -> Result<Option<InterviewRequest>, AppError> {
        let mut requests = self.requests.write().await;
        match Self::outstanding_of(&mut requests, requester_id) {
            Some(request) if !request.is_claimed() => {
                request.time_slot = time_slot;
                request.job_role = job_role;
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_unclaimed(&self, requester_id: Uuid) -> Result<Option<InterviewRequest>, AppError> {
        let mut requests = self.requests.write().await;
        let target = requests
            .values()
            .find(|r| r.requester_id == requester_id && r.is_open())
            .map(|r| r.id);
        Ok(target.and_then(|id| requests.remove(&id)))
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        interviewer_id: Option<Uuid>,
    ) -> Result<Option<InterviewRequest>, AppError> {
        let mut requests = self.requests.write().await;
        match requests.get_mut(&id) {
            Some(request)
                if request.is_claimed()
                    && !request.completed
                    && interviewer_id.map_or(true, |i| request.interviewer_id == Some(i)) =>
            {
                request.completed = true;
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;
    use std::sync::Arc;

    fn new_request(requester_id: Uuid) -> NewInterviewRequest {
        NewInterviewRequest {
            requester_id,
            skills: vec!["Testing".into()],
            job_role: "QA Tester".into(),
            time_slot: TimeSlot::Afternoon,
        }
    }

    #[tokio::test]
    async fn second_outstanding_request_is_a_conflict() {
        let store = MemoryStore::default();
        let requester = Uuid::new_v4();
        store.create_request(new_request(requester)).await.unwrap();

        let err = store.create_request(new_request(requester)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn completed_request_frees_the_requester() {
        let store = MemoryStore::default();
        let requester = Uuid::new_v4();
        let first = store.create_request(new_request(requester)).await.unwrap();
        store.claim(first.id, Uuid::new_v4()).await.unwrap();
        store.mark_completed(first.id, None).await.unwrap();

        assert!(store.create_request(new_request(requester)).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        let store = Arc::new(MemoryStore::default());
        let request = store.create_request(new_request(Uuid::new_v4())).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.claim(request.id, Uuid::new_v4()).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn concurrent_creates_leave_one_outstanding_request() {
        let store = Arc::new(MemoryStore::default());
        let requester = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create_request(new_request(requester)).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn delete_and_reschedule_skip_claimed_requests() {
        let store = MemoryStore::default();
        let requester = Uuid::new_v4();
        let request = store.create_request(new_request(requester)).await.unwrap();
        store.claim(request.id, Uuid::new_v4()).await.unwrap();

        assert!(store
            .reschedule_unclaimed(requester, TimeSlot::Night, "SRE".into())
            .await
            .unwrap()
            .is_none());
        assert!(store.delete_unclaimed(requester).await.unwrap().is_none());

        let stored = store.find_request(request.id).await.unwrap().unwrap();
        assert_eq!(stored.time_slot, TimeSlot::Afternoon);
    }

    #[tokio::test]
    async fn emails_are_unique_ignoring_case() {
        let store = MemoryStore::default();
        let user = NewUser {
            email: "asha@example.com".into(),
            password_hash: "x".into(),
            name: "Asha".into(),
            phone: None,
            role: UserRole::JobSeeker,
        };
        store.create_user(user.clone()).await.unwrap();

        let err = store
            .create_user(NewUser {
                email: "ASHA@example.com".into(),
                ..user
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    fn seeker(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "x".into(),
            name: "Asha Rao".into(),
            phone: None,
            role: UserRole::JobSeeker,
        }
    }

    fn interviewer_profile(experience_years: i32) -> InterviewerProfile {
        let now = Utc::now();
        InterviewerProfile {
            user_id: Uuid::nil(),
            first_name: "Kiran".into(),
            last_name: "Das".into(),
            phone: String::new(),
            expertise: vec!["Testing".into()],
            experience_years,
            company: String::new(),
            position: String::new(),
            availability: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_account_stores_user_and_profile_together() {
        let store = MemoryStore::default();
        let starter = StarterProfile::JobSeeker(JobSeekerProfile::blank(
            Uuid::nil(),
            "Asha".into(),
            "Rao".into(),
        ));

        let user = store
            .create_account(seeker("asha@example.com"), Some(starter))
            .await
            .unwrap();
        let profile = store.find_job_seeker(user.id).await.unwrap().unwrap();
        assert_eq!(profile.user_id, user.id);
        assert_eq!(profile.full_name(), "Asha Rao");
    }

    #[tokio::test]
    async fn failed_profile_write_leaves_no_user_behind() {
        let store = MemoryStore::default();
        let user = NewUser {
            role: UserRole::Interviewer,
            ..seeker("kiran@example.com")
        };

        let err = store
            .create_account(
                user.clone(),
                Some(StarterProfile::Interviewer(interviewer_profile(500))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
        assert!(store
            .find_user_by_email("kiran@example.com")
            .await
            .unwrap()
            .is_none());

        // The email stays free for a corrected retry.
        let created = store
            .create_account(user, Some(StarterProfile::Interviewer(interviewer_profile(5))))
            .await
            .unwrap();
        assert!(store.find_interviewer(created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_account_does_not_touch_existing_profile() {
        let store = MemoryStore::default();
        let first = store
            .create_account(
                seeker("asha@example.com"),
                Some(StarterProfile::JobSeeker(JobSeekerProfile::blank(
                    Uuid::nil(),
                    "Asha".into(),
                    "Rao".into(),
                ))),
            )
            .await
            .unwrap();

        let err = store
            .create_account(
                seeker("ASHA@example.com"),
                Some(StarterProfile::JobSeeker(JobSeekerProfile::blank(
                    Uuid::nil(),
                    "Other".into(),
                    "Person".into(),
                ))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let profile = store.find_job_seeker(first.id).await.unwrap().unwrap();
        assert_eq!(profile.first_name, "Asha");
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }
}
