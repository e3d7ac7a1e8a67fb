pub mod audit;
pub mod auth;
pub mod pagination;
pub mod profile;
pub mod role;
pub mod user;
