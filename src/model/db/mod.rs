pub mod audit;
pub mod election;
pub mod user;
