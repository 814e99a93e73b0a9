pub mod listing;
pub mod resource;
pub mod session;
pub mod tags;
pub mod user;
