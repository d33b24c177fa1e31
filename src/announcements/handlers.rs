// HTTP handlers for announcements: a public feed of released items plus
// staff endpoints for drafting, releasing, and deleting

use crate::announcements::models::{AnnouncementResponse, CreateAnnouncementRequest};
use crate::announcements::repository::NewAnnouncement;
use crate::error::ApiError;
use crate::extract::Json;
use crate::response::Success;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

fn parse_announcement_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request("Announcement not found"))
}

/// Public feed of released announcements
#[utoipa::path(
    get,
    path = "/api/announcements",
    tag = "announcements",
    responses(
        (status = 200, description = "Released announcements, newest first", body = [AnnouncementResponse])
    )
)]
pub async fn list_announcements(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let announcements = state.announcements.list_released().await?;
    let announcements: Vec<AnnouncementResponse> =
        announcements.iter().map(AnnouncementResponse::from).collect();
    Ok(Success(announcements))
}

/// Draft a new announcement. It stays invisible until released.
#[utoipa::path(
    post,
    path = "/api/announcements",
    tag = "announcements",
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 200, description = "The draft", body = AnnouncementResponse),
        (status = 400, description = "Missing title or body"),
        (status = 401, description = "Not exec staff")
    )
)]
pub async fn create_announcement(
    State(state): State<AppState>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.title.is_empty() || request.body.is_empty() {
        return Err(ApiError::bad_request(
            "Please provide a title and body for the announcement",
        ));
    }

    let announcement = state
        .announcements
        .create(NewAnnouncement {
            title: request.title,
            body: request.body,
            kind: request.kind,
        })
        .await?;
    Ok(Success(AnnouncementResponse::from(announcement)))
}

/// Release a draft, making it public and broadcasting it
#[utoipa::path(
    post,
    path = "/api/announcements/release/{id}",
    tag = "announcements",
    params(("id" = String, Path, description = "Announcement id")),
    responses(
        (status = 200, description = "The released announcement", body = AnnouncementResponse),
        (status = 400, description = "No such announcement"),
        (status = 401, description = "Not exec staff")
    )
)]
pub async fn release_announcement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_announcement_id(&id)?;
    let announcement = state
        .announcements
        .release(id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Announcement not found"))?;

    // Broadcast failures must not undo the release
    if let Err(e) = state.notifier.announce(&announcement).await {
        warn!("Failed to broadcast announcement {}: {}", announcement.id, e);
    }
    info!("Released announcement: {}", announcement.title);

    Ok(Success(AnnouncementResponse::from(announcement)))
}

/// Delete an announcement
#[utoipa::path(
    delete,
    path = "/api/announcements/{id}",
    tag = "announcements",
    params(("id" = String, Path, description = "Announcement id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "No such announcement"),
        (status = 401, description = "Not exec staff")
    )
)]
pub async fn delete_announcement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_announcement_id(&id)?;
    if !state.announcements.delete(id).await? {
        return Err(ApiError::bad_request("Announcement not found"));
    }
    Ok(Success("Announcement deleted".to_string()))
}
