// Announcement persistence behind a narrow store interface

use crate::announcements::models::Announcement;
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Draft for a new announcement. Everything starts unreleased.
#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub body: String,
    pub kind: String,
}

#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    async fn create(&self, draft: NewAnnouncement) -> Result<Announcement, ApiError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>, ApiError>;

    /// Released announcements, newest first. This is the participant-facing
    /// view; drafts never appear here.
    async fn list_released(&self) -> Result<Vec<Announcement>, ApiError>;

    /// Marks an announcement released and bumps its update time.
    async fn release(&self, id: Uuid) -> Result<Option<Announcement>, ApiError>;

    /// Deletes an announcement. Returns false when nothing matched.
    async fn delete(&self, id: Uuid) -> Result<bool, ApiError>;
}

/// Postgres-backed announcement store
pub struct PgAnnouncementStore {
    pool: PgPool,
}

const ANNOUNCEMENT_COLUMNS: &str = "id, title, body, kind, released, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AnnouncementRow {
    id: Uuid,
    title: String,
    body: String,
    kind: String,
    released: bool,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl AnnouncementRow {
    fn into_announcement(self) -> Announcement {
        Announcement {
            id: self.id,
            title: self.title,
            body: self.body,
            kind: self.kind,
            released: self.released,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl PgAnnouncementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnouncementStore for PgAnnouncementStore {
    async fn create(&self, draft: NewAnnouncement) -> Result<Announcement, ApiError> {
        let row = sqlx::query_as::<_, AnnouncementRow>(&format!(
            "INSERT INTO announcements (id, title, body, kind, released)
             VALUES ($1, $2, $3, $4, FALSE)
             RETURNING {}",
            ANNOUNCEMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(&draft.kind)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_announcement())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>, ApiError> {
        let row = sqlx::query_as::<_, AnnouncementRow>(&format!(
            "SELECT {} FROM announcements WHERE id = $1",
            ANNOUNCEMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AnnouncementRow::into_announcement))
    }

    async fn list_released(&self) -> Result<Vec<Announcement>, ApiError> {
        let rows = sqlx::query_as::<_, AnnouncementRow>(&format!(
            "SELECT {} FROM announcements WHERE released = TRUE ORDER BY updated_at DESC",
            ANNOUNCEMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(AnnouncementRow::into_announcement)
            .collect())
    }

    async fn release(&self, id: Uuid) -> Result<Option<Announcement>, ApiError> {
        let row = sqlx::query_as::<_, AnnouncementRow>(&format!(
            "UPDATE announcements SET released = TRUE, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            ANNOUNCEMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AnnouncementRow::into_announcement))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-memory announcement store backing the test suite.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryAnnouncementStore {
    announcements: std::sync::Mutex<Vec<Announcement>>,
}

#[cfg(test)]
#[async_trait]
impl AnnouncementStore for MemoryAnnouncementStore {
    async fn create(&self, draft: NewAnnouncement) -> Result<Announcement, ApiError> {
        let now = Utc::now();
        let announcement = Announcement {
            id: Uuid::new_v4(),
            title: draft.title,
            body: draft.body,
            kind: draft.kind,
            released: false,
            created_at: now,
            updated_at: now,
        };
        self.announcements
            .lock()
            .unwrap()
            .push(announcement.clone());
        Ok(announcement)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>, ApiError> {
        let announcements = self.announcements.lock().unwrap();
        Ok(announcements.iter().find(|a| a.id == id).cloned())
    }

    async fn list_released(&self) -> Result<Vec<Announcement>, ApiError> {
        let announcements = self.announcements.lock().unwrap();
        let mut released: Vec<Announcement> = announcements
            .iter()
            .filter(|a| a.released)
            .cloned()
            .collect();
        released.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(released)
    }

    async fn release(&self, id: Uuid) -> Result<Option<Announcement>, ApiError> {
        let mut announcements = self.announcements.lock().unwrap();
        Ok(announcements.iter_mut().find(|a| a.id == id).map(|a| {
            a.released = true;
            a.updated_at = Utc::now();
            a.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut announcements = self.announcements.lock().unwrap();
        let before = announcements.len();
        announcements.retain(|a| a.id != id);
        Ok(announcements.len() < before)
    }
}
