pub mod interview_request;
pub mod profile;
pub mod user;
