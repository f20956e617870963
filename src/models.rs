pub mod auth;
pub mod programs;
pub mod rbac;
pub mod tenancy;
pub mod users;
