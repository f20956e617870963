pub mod access;
pub mod auth;
pub mod guard;
pub mod rbac_service;
pub mod tenancy_service;
pub mod token;
