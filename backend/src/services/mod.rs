pub mod analytics_service;
pub mod user_service;
