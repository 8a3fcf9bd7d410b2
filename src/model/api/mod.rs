pub mod auth;
pub mod election;
pub mod user;
