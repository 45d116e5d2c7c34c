use uuid::Uuid;

use crate::{
    config::JoinMissPolicy,
    models::{
        interview_request::{
            CreateInterviewRequest, InterviewRequest, InterviewRequestView, NewInterviewRequest,
            RequestFilter, RequesterSummary, RescheduleRequest, TimeSlot,
        },
        profile::normalize_tags,
        user::UserRole,
    },
    repositories::Repositories,
    services::lookup::ProfileLookup,
    utils::{
        errors::AppError,
        logger::{fields, LOGGER},
    },
};

/// Interview request lifecycle: create, list, claim, reschedule, cancel and
/// complete. Every state change is a single conditional write in the store;
/// when one matches nothing, the record is re-read to report why.
pub struct InterviewService {
    repos: Repositories,
    lookup: ProfileLookup,
}

fn parse_slot(raw: &str) -> Result<TimeSlot, AppError> {
    raw.parse::<TimeSlot>()
        .map_err(|msg| AppError::validation("timeSlot", msg))
}

impl InterviewService {
    pub fn new(repos: Repositories, policy: JoinMissPolicy) -> Self {
        Self {
            lookup: ProfileLookup::new(repos.clone(), policy),
            repos,
        }
    }

    pub async fn create(
        &self,
        requester_id: Uuid,
        payload: CreateInterviewRequest,
    ) -> Result<InterviewRequest, AppError> {
        let time_slot = parse_slot(&payload.time_slot)?;
        let skills = normalize_tags(payload.skills);
        if skills.is_empty() {
            return Err(AppError::validation("skills", "At least one skill is required"));
        }
        let job_role = payload.job_role.trim().to_string();
        if job_role.is_empty() {
            return Err(AppError::validation("jobRole", "Job role is required"));
        }

        if self.repos.interviews.find_outstanding(requester_id).await?.is_some() {
            return Err(AppError::Conflict(
                "User already has a pending interview request".to_string(),
            ));
        }

        // The store re-checks atomically; a concurrent create surfaces as Conflict here.
        let created = self
            .repos
            .interviews
            .create_request(NewInterviewRequest {
                requester_id,
                skills,
                job_role,
                time_slot,
            })
            .await?;

        LOGGER.log_business_event(
            "interview_request_created",
            Some(requester_id),
            fields([
                ("request_id", created.id.to_string().into()),
                ("time_slot", created.time_slot.label().into()),
            ]),
        );
        Ok(created)
    }

    pub async fn list_unclaimed(&self) -> Result<Vec<InterviewRequestView>, AppError> {
        let requests = self
            .repos
            .interviews
            .list_requests(RequestFilter::unclaimed())
            .await?;
        self.lookup.join(requests).await
    }

    pub async fn list_accepted(&self, interviewer_id: Uuid) -> Result<Vec<InterviewRequestView>, AppError> {
        let requests = self
            .repos
            .interviews
            .list_requests(RequestFilter::accepted_by(interviewer_id))
            .await?;
        self.lookup.join(requests).await
    }

    pub async fn claim(&self, id: Uuid, interviewer_id: Uuid) -> Result<InterviewRequestView, AppError> {
        match self.repos.users.find_user(interviewer_id).await? {
            Some(user) if user.role == UserRole::Interviewer => {}
            Some(_) => {
                return Err(AppError::validation(
                    "interviewerId",
                    "Only interviewers can accept interview requests",
                ))
            }
            None => return Err(AppError::NotFound("Interviewer not found".to_string())),
        }

        let Some(claimed) = self.repos.interviews.claim(id, interviewer_id).await? else {
            return Err(self.explain_failed_claim(id).await?);
        };

        LOGGER.log_business_event(
            "interview_request_claimed",
            Some(interviewer_id),
            fields([("request_id", id.to_string().into())]),
        );

        // The claim is committed; a requester that cannot be resolved only
        // changes what the response shows, whatever the configured policy.
        let requester_id = claimed.requester_id;
        let lookup = ProfileLookup::new(self.repos.clone(), JoinMissPolicy::Placeholder);
        match lookup.join_one(claimed.clone()).await {
            Ok(Some(view)) => Ok(view),
            Ok(None) => Ok(InterviewRequestView::new(
                claimed,
                RequesterSummary::placeholder(requester_id, None),
            )),
            Err(err) => {
                tracing::warn!(request_id = %id, error = %err, "requester lookup failed after claim");
                Ok(InterviewRequestView::new(
                    claimed,
                    RequesterSummary::placeholder(requester_id, None),
                ))
            }
        }
    }

    async fn explain_failed_claim(&self, id: Uuid) -> Result<AppError, AppError> {
        Ok(match self.repos.interviews.find_request(id).await? {
            None => AppError::NotFound("Interview request not found".to_string()),
            Some(current) if current.is_claimed() => AppError::AlreadyClaimed {
                interviewer_id: current.interviewer_id,
            },
            Some(_) => AppError::Conflict("Interview request is already completed".to_string()),
        })
    }

    /// The requester's most recent request, whatever its state.
    pub async fn current_for(&self, requester_id: Uuid) -> Result<InterviewRequest, AppError> {
        self.repos
            .interviews
            .find_latest(requester_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No interview schedule found".to_string()))
    }

    pub async fn reschedule(
        &self,
        requester_id: Uuid,
        payload: RescheduleRequest,
    ) -> Result<InterviewRequest, AppError> {
        let time_slot = parse_slot(&payload.time_slot)?;
        let job_role = payload.job_role.trim().to_string();
        if job_role.is_empty() {
            return Err(AppError::validation("jobRole", "Job role is required"));
        }

        let updated = self
            .repos
            .interviews
            .reschedule_unclaimed(requester_id, time_slot, job_role)
            .await?;

        match updated {
            Some(request) => {
                LOGGER.log_business_event(
                    "interview_request_rescheduled",
                    Some(requester_id),
                    fields([
                        ("request_id", request.id.to_string().into()),
                        ("time_slot", request.time_slot.label().into()),
                    ]),
                );
                Ok(request)
            }
            None => Err(self.explain_missing_unclaimed(requester_id, "reschedule").await?),
        }
    }

    pub async fn cancel(&self, requester_id: Uuid) -> Result<InterviewRequest, AppError> {
        match self.repos.interviews.delete_unclaimed(requester_id).await? {
            Some(deleted) => {
                LOGGER.log_business_event(
                    "interview_request_cancelled",
                    Some(requester_id),
                    fields([("request_id", deleted.id.to_string().into())]),
                );
                Ok(deleted)
            }
            None => Err(self.explain_missing_unclaimed(requester_id, "cancel").await?),
        }
    }

    async fn explain_missing_unclaimed(&self, requester_id: Uuid, action: &str) -> Result<AppError, AppError> {
        let message = match self.repos.interviews.find_outstanding(requester_id).await? {
            Some(_) => format!(
                "No unclaimed interview request to {}; it has already been accepted by an interviewer",
                action
            ),
            None => format!("No scheduled interview to {}", action),
        };
        Ok(AppError::NotFound(message))
    }

    /// `interviewer_id` restricts completion to that interviewer's claim;
    /// `None` is the admin override.
    pub async fn complete(&self, id: Uuid, interviewer_id: Option<Uuid>) -> Result<InterviewRequest, AppError> {
        if let Some(done) = self.repos.interviews.mark_completed(id, interviewer_id).await? {
            LOGGER.log_business_event(
                "interview_completed",
                interviewer_id,
                fields([("request_id", id.to_string().into())]),
            );
            return Ok(done);
        }

        Err(match self.repos.interviews.find_request(id).await? {
            None => AppError::NotFound("Interview request not found".to_string()),
            Some(current) if current.completed => {
                AppError::Conflict("Interview is already completed".to_string())
            }
            Some(current) if !current.is_claimed() => AppError::Conflict(
                "Interview request must be accepted before it can be completed".to_string(),
            ),
            Some(_) => AppError::Forbidden(
                "Only the interviewer who accepted this request can complete it".to_string(),
            ),
        })
    }
}
