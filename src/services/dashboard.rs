use serde::Serialize;
use std::{collections::HashMap, time::Instant};
use uuid::Uuid;

use crate::{
    config::JoinMissPolicy,
    models::{
        interview_request::{InterviewRequest, InterviewRequestView, RequestFilter},
        user::{UserResponse, UserRole},
    },
    repositories::Repositories,
    services::lookup::ProfileLookup,
    utils::{errors::AppError, logger::LOGGER},
};

const RECENT_USERS: usize = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_users: usize,
    pub job_seekers: usize,
    pub interviewers: usize,
    pub admins: usize,
    pub total_interviews: usize,
    pub pending_interviews: usize,
    pub scheduled_interviews: usize,
    pub completed_interviews: usize,
    pub recent_users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewerDashboard {
    pub open_requests: usize,
    pub upcoming_interviews: Vec<InterviewRequestView>,
    pub completed_interviews: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSeekerDashboard {
    pub has_profile: bool,
    pub current_request: Option<InterviewRequest>,
    pub completed_interviews: usize,
}

/// Read models behind the dashboard pages. Everything is recomputed from
/// the full record sets on each call.
pub struct DashboardService {
    repos: Repositories,
    lookup: ProfileLookup,
}

impl DashboardService {
    pub fn new(repos: Repositories, policy: JoinMissPolicy) -> Self {
        Self {
            lookup: ProfileLookup::new(repos.clone(), policy),
            repos,
        }
    }

    pub async fn admin(&self) -> Result<AdminDashboard, AppError> {
        let start_time = Instant::now();

        let (users, requests) = tokio::try_join!(
            self.repos.users.list_users(),
            self.repos.interviews.list_requests(RequestFilter::default()),
        )?;

        let count_role = |role: UserRole| users.iter().filter(|u| u.role == role).count();
        let pending = requests.iter().filter(|r| r.is_open()).count();
        let completed = requests.iter().filter(|r| r.completed).count();

        let dashboard = AdminDashboard {
            total_users: users.len(),
            job_seekers: count_role(UserRole::JobSeeker),
            interviewers: count_role(UserRole::Interviewer),
            admins: count_role(UserRole::Admin),
            total_interviews: requests.len(),
            pending_interviews: pending,
            scheduled_interviews: requests.len() - pending - completed,
            completed_interviews: completed,
            recent_users: users
                .into_iter()
                .take(RECENT_USERS)
                .map(UserResponse::from)
                .collect(),
        };

        LOGGER.log_performance_metric(
            "admin_dashboard_duration",
            start_time.elapsed().as_millis() as f64,
            HashMap::new(),
        );
        Ok(dashboard)
    }

    pub async fn interviewer(&self, interviewer_id: Uuid) -> Result<InterviewerDashboard, AppError> {
        let start_time = Instant::now();

        let (open, upcoming, completed) = tokio::try_join!(
            self.repos.interviews.list_requests(RequestFilter::unclaimed()),
            self.repos
                .interviews
                .list_requests(RequestFilter::accepted_by(interviewer_id)),
            self.repos.interviews.list_requests(RequestFilter {
                interviewer_id: Some(interviewer_id),
                completed: Some(true),
                ..RequestFilter::default()
            }),
        )?;

        let dashboard = InterviewerDashboard {
            open_requests: open.len(),
            upcoming_interviews: self.lookup.join(upcoming).await?,
            completed_interviews: completed.len(),
        };

        let mut tags = HashMap::new();
        tags.insert("role".to_string(), UserRole::Interviewer.to_string());
        LOGGER.log_performance_metric(
            "interviewer_dashboard_duration",
            start_time.elapsed().as_millis() as f64,
            tags,
        );
        Ok(dashboard)
    }

    pub async fn job_seeker(&self, user_id: Uuid) -> Result<JobSeekerDashboard, AppError> {
        let (profile, current, history) = tokio::try_join!(
            self.repos.profiles.find_job_seeker(user_id),
            self.repos.interviews.find_latest(user_id),
            self.repos.interviews.list_requests(RequestFilter {
                requester_id: Some(user_id),
                completed: Some(true),
                ..RequestFilter::default()
            }),
        )?;

        Ok(JobSeekerDashboard {
            has_profile: profile.is_some(),
            current_request: current,
            completed_interviews: history.len(),
        })
    }

    /// All users, newest first.
    pub async fn users(&self) -> Result<Vec<UserResponse>, AppError> {
        Ok(self
            .repos
            .users
            .list_users()
            .await?
            .into_iter()
            .map(UserResponse::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        interview_request::{NewInterviewRequest, TimeSlot},
        profile::JobSeekerProfile,
        user::NewUser,
    };

    async fn add_user(repos: &Repositories, email: &str, role: UserRole) -> Uuid {
        repos
            .users
            .create_user(NewUser {
                email: email.into(),
                password_hash: "x".into(),
                name: "Someone".into(),
                phone: None,
                role,
            })
            .await
            .unwrap()
            .id
    }

    async fn add_request(repos: &Repositories, requester_id: Uuid) -> Uuid {
        repos
            .interviews
            .create_request(NewInterviewRequest {
                requester_id,
                skills: vec!["Testing".into()],
                job_role: "QA Tester".into(),
                time_slot: TimeSlot::LateAfternoon,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn counts_reflect_request_states() {
        let repos = Repositories::in_memory();
        let interviewer = add_user(&repos, "int@example.com", UserRole::Interviewer).await;
        add_user(&repos, "admin@example.com", UserRole::Admin).await;

        let mut seekers = Vec::new();
        for i in 0..3 {
            let id = add_user(&repos, &format!("seeker{}@example.com", i), UserRole::JobSeeker).await;
            repos
                .profiles
                .upsert_job_seeker(JobSeekerProfile::blank(id, "Seeker".into(), i.to_string()))
                .await
                .unwrap();
            seekers.push(id);
        }

        let _pending = add_request(&repos, seekers[0]).await;
        let scheduled = add_request(&repos, seekers[1]).await;
        let done = add_request(&repos, seekers[2]).await;
        repos.interviews.claim(scheduled, interviewer).await.unwrap();
        repos.interviews.claim(done, interviewer).await.unwrap();
        repos.interviews.mark_completed(done, Some(interviewer)).await.unwrap();

        let service = DashboardService::new(repos.clone(), JoinMissPolicy::Drop);

        let admin = service.admin().await.unwrap();
        assert_eq!(admin.total_users, 5);
        assert_eq!(admin.job_seekers, 3);
        assert_eq!(admin.interviewers, 1);
        assert_eq!(admin.admins, 1);
        assert_eq!(admin.total_interviews, 3);
        assert_eq!(admin.pending_interviews, 1);
        assert_eq!(admin.scheduled_interviews, 1);
        assert_eq!(admin.completed_interviews, 1);
        assert_eq!(admin.recent_users.len(), 5);

        let board = service.interviewer(interviewer).await.unwrap();
        assert_eq!(board.open_requests, 1);
        assert_eq!(board.upcoming_interviews.len(), 1);
        assert_eq!(board.upcoming_interviews[0].id, scheduled);
        assert_eq!(board.completed_interviews, 1);

        let seeker = service.job_seeker(seekers[2]).await.unwrap();
        assert!(seeker.has_profile);
        assert_eq!(seeker.completed_interviews, 1);
        assert_eq!(seeker.current_request.map(|r| r.id), Some(done));
    }

    #[tokio::test]
    async fn job_seeker_without_profile_or_requests() {
        let repos = Repositories::in_memory();
        let id = add_user(&repos, "new@example.com", UserRole::JobSeeker).await;

        let board = DashboardService::new(repos, JoinMissPolicy::Drop)
            .job_seeker(id)
            .await
            .unwrap();
        assert!(!board.has_profile);
        assert!(board.current_request.is_none());
        assert_eq!(board.completed_interviews, 0);
    }
}
