//! Authentication: init-data exchange, token refresh, cookie transport.

pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
