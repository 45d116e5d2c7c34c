use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    config::JoinMissPolicy,
    models::interview_request::{InterviewRequest, InterviewRequestView, RequesterSummary},
    repositories::Repositories,
    utils::{
        errors::AppError,
        logger::{fields, LOGGER},
    },
};

/// Read-side join of interview requests with their requesters' user and
/// job-seeker profile records. Nothing is cached; every call hits the store.
pub struct ProfileLookup {
    repos: Repositories,
    policy: JoinMissPolicy,
}

impl ProfileLookup {
    pub fn new(repos: Repositories, policy: JoinMissPolicy) -> Self {
        Self { repos, policy }
    }

    pub async fn join_one(&self, request: InterviewRequest) -> Result<Option<InterviewRequestView>, AppError> {
        Ok(self.join(vec![request]).await?.into_iter().next())
    }

    pub async fn join(&self, requests: Vec<InterviewRequest>) -> Result<Vec<InterviewRequestView>, AppError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<Uuid> = requests.iter().map(|r| r.requester_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let (users, profiles) = tokio::try_join!(
            self.repos.users.find_users(&ids),
            self.repos.profiles.find_job_seekers(&ids),
        )?;

        let users: HashMap<Uuid, _> = users.into_iter().map(|u| (u.id, u)).collect();
        let profiles: HashMap<Uuid, _> = profiles.into_iter().map(|p| (p.user_id, p)).collect();

        let total = requests.len();
        let mut joined = Vec::with_capacity(total);

        for request in requests {
            let user = users.get(&request.requester_id);
            let profile = profiles.get(&request.requester_id);

            let summary = match (user, profile) {
                (Some(user), Some(profile)) => RequesterSummary {
                    id: user.id,
                    name: profile.full_name(),
                    email: user.email.clone(),
                    skills: profile.skills.clone(),
                    experience: profile.experience.clone(),
                },
                _ => {
                    LOGGER.log_business_event(
                        "interview_request_join_miss",
                        None,
                        fields([
                            ("request_id", request.id.to_string().into()),
                            ("requester_id", request.requester_id.to_string().into()),
                            ("has_user", user.is_some().into()),
                            ("has_profile", profile.is_some().into()),
                        ]),
                    );

                    match self.policy {
                        JoinMissPolicy::Drop => continue,
                        JoinMissPolicy::Placeholder => RequesterSummary::placeholder(
                            request.requester_id,
                            user.map(|u| u.email.clone()),
                        ),
                        JoinMissPolicy::Error => {
                            return Err(AppError::InternalServerError(
                                "Interview request references a missing requester".to_string(),
                            ))
                        }
                    }
                }
            };

            joined.push(InterviewRequestView::new(request, summary));
        }

        if joined.len() < total {
            tracing::warn!(
                total,
                returned = joined.len(),
                "dropped interview requests with unresolved requesters"
            );
        }

        Ok(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        interview_request::{NewInterviewRequest, TimeSlot, UNKNOWN_USER_EMAIL, UNKNOWN_USER_NAME},
        profile::JobSeekerProfile,
        user::{NewUser, UserRole},
    };

    async fn seed() -> (Repositories, Uuid) {
        let repos = Repositories::in_memory();
        let user = repos
            .users
            .create_user(NewUser {
                email: "meera@example.com".into(),
                password_hash: "x".into(),
                name: "Meera Nair".into(),
                phone: None,
                role: UserRole::JobSeeker,
            })
            .await
            .unwrap();
        let mut profile = JobSeekerProfile::blank(user.id, "Meera".into(), "Nair".into());
        profile.skills = vec!["Selenium".into()];
        repos.profiles.upsert_job_seeker(profile).await.unwrap();

        for requester in [user.id, Uuid::new_v4()] {
            repos
                .interviews
                .create_request(NewInterviewRequest {
                    requester_id: requester,
                    skills: vec!["Testing".into()],
                    job_role: "QA Tester".into(),
                    time_slot: TimeSlot::Evening,
                })
                .await
                .unwrap();
        }
        (repos, user.id)
    }

    async fn all_requests(repos: &Repositories) -> Vec<InterviewRequest> {
        repos.interviews.list_requests(Default::default()).await.unwrap()
    }

    #[tokio::test]
    async fn drop_policy_omits_unresolved_requesters() {
        let (repos, known) = seed().await;
        let lookup = ProfileLookup::new(repos.clone(), JoinMissPolicy::Drop);

        let views = lookup.join(all_requests(&repos).await).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].requester.id, known);
        assert_eq!(views[0].requester.name, "Meera Nair");
        assert_eq!(views[0].requester.email, "meera@example.com");
        assert_eq!(views[0].requester.skills, vec!["Selenium"]);
    }

    #[tokio::test]
    async fn placeholder_policy_keeps_unresolved_requesters() {
        let (repos, _) = seed().await;
        let lookup = ProfileLookup::new(repos.clone(), JoinMissPolicy::Placeholder);

        let views = lookup.join(all_requests(&repos).await).await.unwrap();
        assert_eq!(views.len(), 2);
        let unknown = views
            .iter()
            .find(|v| v.requester.name == UNKNOWN_USER_NAME)
            .unwrap();
        assert_eq!(unknown.requester.email, UNKNOWN_USER_EMAIL);
    }

    #[tokio::test]
    async fn error_policy_fails_the_read() {
        let (repos, _) = seed().await;
        let lookup = ProfileLookup::new(repos.clone(), JoinMissPolicy::Error);

        let err = lookup.join(all_requests(&repos).await).await.unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }
}
