pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod resources;
pub mod users;
