pub mod account;
pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod interviews;
pub mod profiles;
