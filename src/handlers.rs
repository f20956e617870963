pub mod auth;
pub mod programs;
pub mod rbac;
pub mod users;
