// Announcements: drafts, releases, and the public feed

pub mod handlers;
pub mod models;
pub mod notifier;
pub mod repository;
