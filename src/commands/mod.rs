pub mod account;
pub mod attend;
pub mod events;
pub mod maintenance;
pub mod reviews;
pub mod sub;
