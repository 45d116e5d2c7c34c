//! Store tests against a real Postgres. Each test gets a fresh database with
//! the migrations applied; run with `DATABASE_URL` set and `--ignored`.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use jobify_backend::{
    models::{
        interview_request::{NewInterviewRequest, TimeSlot},
        profile::{InterviewerProfile, StarterProfile},
        user::{NewUser, User, UserRole},
    },
    repositories::{postgres::PgStore, InterviewRequestRepository, UserRepository},
    utils::errors::AppError,
};

async fn user(store: &PgStore, email: &str, role: UserRole) -> User {
    store
        .create_user(NewUser {
            email: email.to_string(),
            password_hash: "x".to_string(),
            name: "Test User".to_string(),
            phone: None,
            role,
        })
        .await
        .unwrap()
}

fn request_for(requester_id: Uuid) -> NewInterviewRequest {
    NewInterviewRequest {
        requester_id,
        skills: vec!["Testing".to_string()],
        job_role: "QA Tester".to_string(),
        time_slot: TimeSlot::Afternoon,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn concurrent_claims_have_one_winner(pool: PgPool) {
    let store = PgStore::new(pool);
    let seeker = user(&store, "asha@example.com", UserRole::JobSeeker).await;
    let a = user(&store, "a@example.com", UserRole::Interviewer).await;
    let b = user(&store, "b@example.com", UserRole::Interviewer).await;
    let request = store.create_request(request_for(seeker.id)).await.unwrap();

    let (first, second) = tokio::join!(store.claim(request.id, a.id), store.claim(request.id, b.id));
    let winners: Vec<_> = [first.unwrap(), second.unwrap()]
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(winners.len(), 1);

    let stored = store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.interviewer_id, winners[0].interviewer_id);
    assert!(store.claim(request.id, a.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn second_outstanding_request_conflicts(pool: PgPool) {
    let store = PgStore::new(pool);
    let seeker = user(&store, "asha@example.com", UserRole::JobSeeker).await;
    store.create_request(request_for(seeker.id)).await.unwrap();

    let duplicate = store.create_request(request_for(seeker.id)).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn claimed_request_is_frozen_for_the_requester(pool: PgPool) {
    let store = PgStore::new(pool);
    let seeker = user(&store, "asha@example.com", UserRole::JobSeeker).await;
    let a = user(&store, "a@example.com", UserRole::Interviewer).await;
    let request = store.create_request(request_for(seeker.id)).await.unwrap();
    store.claim(request.id, a.id).await.unwrap().unwrap();

    let moved = store
        .reschedule_unclaimed(seeker.id, TimeSlot::LateAfternoon, "SRE".to_string())
        .await
        .unwrap();
    assert!(moved.is_none());
    assert!(store.delete_unclaimed(seeker.id).await.unwrap().is_none());

    let stored = store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.time_slot, TimeSlot::Afternoon);
    assert_eq!(stored.interviewer_id, Some(a.id));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn rejected_profile_rolls_back_the_account(pool: PgPool) {
    let store = PgStore::new(pool);
    let now = Utc::now();
    let starter = StarterProfile::Interviewer(InterviewerProfile {
        user_id: Uuid::nil(),
        first_name: "Kiran".to_string(),
        last_name: "Das".to_string(),
        phone: String::new(),
        expertise: vec!["Testing".to_string()],
        experience_years: 500,
        company: String::new(),
        position: String::new(),
        availability: Vec::new(),
        created_at: now,
        updated_at: now,
    });

    let created = store
        .create_account(
            NewUser {
                email: "kiran@example.com".to_string(),
                password_hash: "x".to_string(),
                name: "Kiran Das".to_string(),
                phone: None,
                role: UserRole::Interviewer,
            },
            Some(starter),
        )
        .await;
    assert!(created.is_err());
    assert!(store
        .find_user_by_email("kiran@example.com")
        .await
        .unwrap()
        .is_none());
}
