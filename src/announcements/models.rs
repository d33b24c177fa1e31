// Announcement model and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// An announcement. Drafts stay invisible to participants until released.
#[derive(Debug, Clone)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    /// Free-form category tag ("logistics", "food", ...). Empty when untagged.
    pub kind: String,
    pub released: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serializable view of an announcement
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnnouncementResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub released: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Announcement> for AnnouncementResponse {
    fn from(announcement: &Announcement) -> Self {
        Self {
            id: announcement.id,
            title: announcement.title.clone(),
            body: announcement.body.clone(),
            kind: announcement.kind.clone(),
            released: announcement.released,
            created_at: announcement.created_at,
            updated_at: announcement.updated_at,
        }
    }
}

impl From<Announcement> for AnnouncementResponse {
    fn from(announcement: Announcement) -> Self {
        AnnouncementResponse::from(&announcement)
    }
}

/// Draft announcement request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateAnnouncementRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub kind: String,
}
