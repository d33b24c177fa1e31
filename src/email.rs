// Outbound email collaborators
// Real delivery (templated mail, provider SDKs) lives outside this service;
// the API only needs a narrow interface it can call without caring how the
// message gets out.

use crate::auth::models::User;
use crate::error::ApiError;
use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the password-reset email for a user whose reset token has just
    /// been persisted.
    async fn send_reset_email(&self, user: &User) -> Result<(), ApiError>;

    /// Notifies operators about an unhandled server error. Best effort.
    async fn send_error_email(&self, message: &str) -> Result<(), ApiError>;
}

/// Logs outbound mail instead of delivering it. Stands in wherever a real
/// provider is not configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset_email(&self, user: &User) -> Result<(), ApiError> {
        info!("Password reset email queued for {}", user.email);
        Ok(())
    }

    async fn send_error_email(&self, message: &str) -> Result<(), ApiError> {
        info!("Error report email queued: {}", message);
        Ok(())
    }
}

/// Records every reset email instead of sending, so tests can assert on
/// recipient and token.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    pub reset_emails: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_reset_email(&self, user: &User) -> Result<(), ApiError> {
        self.reset_emails
            .lock()
            .unwrap()
            .push((user.email.clone(), user.reset_password_token.clone()));
        Ok(())
    }

    async fn send_error_email(&self, _message: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Mailer whose reset sends always fail. Used to check that forgot-password
/// still succeeds once the token is persisted.
#[cfg(test)]
pub struct FailingMailer;

#[cfg(test)]
#[async_trait]
impl Mailer for FailingMailer {
    async fn send_reset_email(&self, _user: &User) -> Result<(), ApiError> {
        Err(ApiError::internal("smtp unreachable"))
    }

    async fn send_error_email(&self, _message: &str) -> Result<(), ApiError> {
        Err(ApiError::internal("smtp unreachable"))
    }
}
