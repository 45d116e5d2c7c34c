pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    config::Config,
    handlers::{account, admin, auth, dashboard, interviews, profiles},
    middleware::auth::auth_middleware,
    repositories::Repositories,
    services::{dashboard::DashboardService, interview::InterviewService},
};

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repos: Repositories, config: Config) -> Self {
        Self {
            repos,
            config: Arc::new(config),
        }
    }

    pub fn interviews(&self) -> InterviewService {
        InterviewService::new(self.repos.clone(), self.config.join_miss_policy)
    }

    pub fn dashboards(&self) -> DashboardService {
        DashboardService::new(self.repos.clone(), self.config.join_miss_policy)
    }
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(if origin == "*" {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origin.parse::<HeaderValue>()?)
    })
}

pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    let protected_routes = Router::new()
        .route(
            "/interview-requests",
            get(interviews::list_requests).post(interviews::create_request),
        )
        .route(
            "/interview-requests/:id/accept",
            post(interviews::accept_request),
        )
        .route(
            "/interview-requests/:id/complete",
            post(interviews::complete_request),
        )
        .route(
            "/interview-schedule",
            get(interviews::get_schedule)
                .put(interviews::reschedule)
                .delete(interviews::cancel),
        )
        .route(
            "/interview-schedule/:user_id",
            get(interviews::get_user_schedule),
        )
        .route(
            "/account",
            get(account::get_account).put(account::update_account),
        )
        .route(
            "/profile/job-seeker",
            get(profiles::get_job_seeker_profile).put(profiles::upsert_job_seeker_profile),
        )
        .route(
            "/profile/interviewer",
            get(profiles::get_interviewer_profile).put(profiles::upsert_interviewer_profile),
        )
        .route("/dashboard/job-seeker", get(dashboard::job_seeker_dashboard))
        .route("/dashboard/interviewer", get(dashboard::interviewer_dashboard))
        .route("/admin/dashboard", get(admin::get_dashboard))
        .route("/admin/users", get(admin::get_users))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected_routes)
        .layer(cors_layer(&state.config.cors_allowed_origin)?)
        .layer(DefaultBodyLimit::max(state.config.max_request_body_kb * 1024))
        .with_state(state);

    Ok(app)
}
