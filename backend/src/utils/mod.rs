//! Shared utilities for the backend.

pub mod init_data;
pub mod jwt;
