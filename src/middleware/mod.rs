pub mod access;
pub mod audit;
pub mod auth;
pub mod client_ip;
pub mod cookies;
pub mod cors;
pub mod csrf;
pub mod ip_filter;
pub mod rate_limit;
