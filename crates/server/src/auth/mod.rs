pub mod session;
pub mod utils;
