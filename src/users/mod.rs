// User management endpoints layered over the credential store

pub mod handlers;
pub mod models;
