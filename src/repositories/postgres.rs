use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgExecutor, PgPool};
use std::time::Instant;
use uuid::Uuid;

use super::{InterviewRequestRepository, ProfileRepository, UserRepository};
use crate::{
    models::{
        interview_request::{InterviewRequest, NewInterviewRequest, RequestFilter, TimeSlot},
        profile::{
            Availability, Education, Experience, InterviewerProfile, JobSeekerProfile,
            StarterProfile,
        },
        user::{AccountUpdate, NewUser, User},
    },
    utils::{errors::AppError, logger::LOGGER},
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations become `Conflict` with `message`; everything else goes
/// through the generic conversion.
fn conflict_or(err: sqlx::Error, message: &str) -> AppError {
    if matches!(&err, sqlx::Error::Database(db_err) if db_err.is_unique_violation()) {
        AppError::Conflict(message.to_string())
    } else {
        AppError::from(err)
    }
}

fn log_query(query: &str, started: Instant, rows: Option<usize>) {
    LOGGER.log_database_query(query, started.elapsed().as_millis(), rows);
}

#[derive(FromRow)]
struct JobSeekerRow {
    user_id: Uuid,
    first_name: String,
    last_name: String,
    phone: String,
    skills: Vec<String>,
    experience: Json<Vec<Experience>>,
    education: Json<Vec<Education>>,
    resume: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<JobSeekerRow> for JobSeekerProfile {
    fn from(row: JobSeekerRow) -> Self {
        Self {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            skills: row.skills,
            experience: row.experience.0,
            education: row.education.0,
            resume: row.resume,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct InterviewerRow {
    user_id: Uuid,
    first_name: String,
    last_name: String,
    phone: String,
    expertise: Vec<String>,
    experience_years: i32,
    company: String,
    position: String,
    availability: Json<Vec<Availability>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InterviewerRow> for InterviewerProfile {
    fn from(row: InterviewerRow) -> Self {
        Self {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            expertise: row.expertise,
            experience_years: row.experience_years,
            company: row.company,
            position: row.position,
            availability: row.availability.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

async fn insert_user<'e, E: PgExecutor<'e>>(executor: E, user: &NewUser) -> Result<User, AppError> {
    let query = r#"
        INSERT INTO users (id, email, password_hash, name, phone, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
    "#;
    let started = Instant::now();
    let created = sqlx::query_as::<_, User>(query)
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.role)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_or(e, "User already exists"))?;
    log_query(query, started, Some(1));
    Ok(created)
}

async fn upsert_job_seeker_row<'e, E: PgExecutor<'e>>(
    executor: E,
    profile: &JobSeekerProfile,
) -> Result<JobSeekerProfile, AppError> {
    let row = sqlx::query_as::<_, JobSeekerRow>(
        r#"
        INSERT INTO job_seeker_profiles
            (user_id, first_name, last_name, phone, skills, experience, education, resume)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (user_id)
        DO UPDATE SET
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            phone = EXCLUDED.phone,
            skills = EXCLUDED.skills,
            experience = EXCLUDED.experience,
            education = EXCLUDED.education,
            resume = EXCLUDED.resume,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(profile.user_id)
    .bind(&profile.first_name)
    .bind(&profile.last_name)
    .bind(&profile.phone)
    .bind(&profile.skills)
    .bind(Json(&profile.experience))
    .bind(Json(&profile.education))
    .bind(&profile.resume)
    .fetch_one(executor)
    .await?;
    Ok(row.into())
}

async fn upsert_interviewer_row<'e, E: PgExecutor<'e>>(
    executor: E,
    profile: &InterviewerProfile,
) -> Result<InterviewerProfile, AppError> {
    let row = sqlx::query_as::<_, InterviewerRow>(
        r#"
        INSERT INTO interviewer_profiles
            (user_id, first_name, last_name, phone, expertise, experience_years,
             company, position, availability)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (user_id)
        DO UPDATE SET
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            phone = EXCLUDED.phone,
            expertise = EXCLUDED.expertise,
            experience_years = EXCLUDED.experience_years,
            company = EXCLUDED.company,
            position = EXCLUDED.position,
            availability = EXCLUDED.availability,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(profile.user_id)
    .bind(&profile.first_name)
    .bind(&profile.last_name)
    .bind(&profile.phone)
    .bind(&profile.expertise)
    .bind(profile.experience_years)
    .bind(&profile.company)
    .bind(&profile.position)
    .bind(Json(&profile.availability))
    .fetch_one(executor)
    .await?;
    Ok(row.into())
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        insert_user(&self.pool, &user).await
    }

    async fn create_account(
        &self,
        user: NewUser,
        starter: Option<StarterProfile>,
    ) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = insert_user(&mut *tx, &user).await?;
        match starter.map(|profile| profile.with_user_id(created.id)) {
            Some(StarterProfile::JobSeeker(profile)) => {
                upsert_job_seeker_row(&mut *tx, &profile).await?;
            }
            Some(StarterProfile::Interviewer(profile)) => {
                upsert_interviewer_row(&mut *tx, &profile).await?;
            }
            None => {}
        }

        // Dropping `tx` on an early return rolls the user insert back.
        tx.commit().await?;
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let query = "SELECT * FROM users WHERE id = ANY($1)";
        let started = Instant::now();
        let users = sqlx::query_as::<_, User>(query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        log_query(query, started, Some(users.len()));
        Ok(users)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let query = "SELECT * FROM users ORDER BY created_at DESC";
        let started = Instant::now();
        let users = sqlx::query_as::<_, User>(query)
            .fetch_all(&self.pool)
            .await?;
        log_query(query, started, Some(users.len()));
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, update: AccountUpdate) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn find_job_seeker(&self, user_id: Uuid) -> Result<Option<JobSeekerProfile>, AppError> {
        let row = sqlx::query_as::<_, JobSeekerRow>(
            "SELECT * FROM job_seeker_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JobSeekerProfile::from))
    }

    async fn find_job_seekers(&self, user_ids: &[Uuid]) -> Result<Vec<JobSeekerProfile>, AppError> {
        let query = "SELECT * FROM job_seeker_profiles WHERE user_id = ANY($1)";
        let started = Instant::now();
        let rows = sqlx::query_as::<_, JobSeekerRow>(query)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;
        log_query(query, started, Some(rows.len()));
        Ok(rows.into_iter().map(JobSeekerProfile::from).collect())
    }

    async fn upsert_job_seeker(&self, profile: JobSeekerProfile) -> Result<JobSeekerProfile, AppError> {
        upsert_job_seeker_row(&self.pool, &profile).await
    }

    async fn find_interviewer(&self, user_id: Uuid) -> Result<Option<InterviewerProfile>, AppError> {
        let row = sqlx::query_as::<_, InterviewerRow>(
            "SELECT * FROM interviewer_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(InterviewerProfile::from))
    }

    async fn upsert_interviewer(
        &self,
        profile: InterviewerProfile,
    ) -> Result<InterviewerProfile, AppError> {
        upsert_interviewer_row(&self.pool, &profile).await
    }
}

#[async_trait]
impl InterviewRequestRepository for PgStore {
    async fn create_request(&self, request: NewInterviewRequest) -> Result<InterviewRequest, AppError> {
        let query = r#"
            INSERT INTO interview_requests (id, requester_id, skills, job_role, time_slot)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        "#;
        let started = Instant::now();
        let created = sqlx::query_as::<_, InterviewRequest>(query)
            .bind(Uuid::new_v4())
            .bind(request.requester_id)
            .bind(&request.skills)
            .bind(&request.job_role)
            .bind(request.time_slot)
            .fetch_one(&self.pool)
            .await
            // interview_requests_one_outstanding
            .map_err(|e| conflict_or(e, "User already has a pending interview request"))?;
        log_query(query, started, Some(1));
        Ok(created)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<InterviewRequest>, AppError> {
        let request = sqlx::query_as::<_, InterviewRequest>(
            "SELECT * FROM interview_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn find_outstanding(&self, requester_id: Uuid) -> Result<Option<InterviewRequest>, AppError> {
        let request = sqlx::query_as::<_, InterviewRequest>(
            "SELECT * FROM interview_requests WHERE requester_id = $1 AND NOT completed",
        )
        .bind(requester_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn find_latest(&self, requester_id: Uuid) -> Result<Option<InterviewRequest>, AppError> {
        let request = sqlx::query_as::<_, InterviewRequest>(
            r#"
            SELECT * FROM interview_requests
            WHERE requester_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(requester_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<InterviewRequest>, AppError> {
        let query = r#"
            SELECT * FROM interview_requests
            WHERE ($1::BOOLEAN IS NULL OR (interviewer_id IS NOT NULL) = $1)
              AND ($2::UUID IS NULL OR interviewer_id = $2)
              AND ($3::UUID IS NULL OR requester_id = $3)
              AND ($4::BOOLEAN IS NULL OR completed = $4)
            ORDER BY created_at ASC
        "#;
        let started = Instant::now();
        let requests = sqlx::query_as::<_, InterviewRequest>(query)
            .bind(filter.claimed)
            .bind(filter.interviewer_id)
            .bind(filter.requester_id)
            .bind(filter.completed)
            .fetch_all(&self.pool)
            .await?;
        log_query(query, started, Some(requests.len()));
        Ok(requests)
    }

    async fn claim(&self, id: Uuid, interviewer_id: Uuid) -> Result<Option<InterviewRequest>, AppError> {
        let query = r#"
            UPDATE interview_requests
            SET interviewer_id = $2
            WHERE id = $1 AND interviewer_id IS NULL AND NOT completed
            RETURNING *
        "#;
        let started = Instant::now();
        let claimed = sqlx::query_as::<_, InterviewRequest>(query)
            .bind(id)
            .bind(interviewer_id)
            .fetch_optional(&self.pool)
            .await?;
        log_query(query, started, Some(usize::from(claimed.is_some())));
        Ok(claimed)
    }

    async fn reschedule_unclaimed(
        &self,
        requester_id: Uuid,
        time_slot: TimeSlot,
        job_role: String,
    ) -> Result<Option<InterviewRequest>, AppError> {
        let request = sqlx::query_as::<_, InterviewRequest>(
            r#"
            UPDATE interview_requests
            SET time_slot = $2, job_role = $3
            WHERE requester_id = $1 AND interviewer_id IS NULL AND NOT completed
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .bind(time_slot)
        .bind(job_role)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn delete_unclaimed(&self, requester_id: Uuid) -> Result<Option<InterviewRequest>, AppError> {
        let request = sqlx::query_as::<_, InterviewRequest>(
            r#"
            DELETE FROM interview_requests
            WHERE requester_id = $1 AND interviewer_id IS NULL AND NOT completed
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        interviewer_id: Option<Uuid>,
    ) -> Result<Option<InterviewRequest>, AppError> {
        let request = sqlx::query_as::<_, InterviewRequest>(
            r#"
            UPDATE interview_requests
            SET completed = TRUE
            WHERE id = $1
              AND interviewer_id IS NOT NULL
              AND NOT completed
              AND ($2::UUID IS NULL OR interviewer_id = $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(interviewer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }
}
