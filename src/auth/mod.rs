// Authentication and authorization: models, password hashing, token codec,
// credential store, flows, and route guards

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;
