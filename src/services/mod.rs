pub mod audit;
pub mod auth;
pub mod captcha;
pub mod captcha_image;
pub mod credentials;
pub mod email;
pub mod maintenance;
pub mod metrics;
pub mod oauth;
pub mod password;
pub mod profiles;
pub mod roles;
pub mod token;
pub mod users;
