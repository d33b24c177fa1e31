// Application configuration loaded from the environment
// The signing secret and token TTLs are injected here and passed down
// explicitly; nothing below the composition root reads the environment.

use crate::error::ApiError;
use chrono::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Secret used to sign session and reset tokens
    pub secret: String,
    /// Validity window for session tokens
    pub session_ttl: Duration,
    /// Validity window for password-reset tokens
    pub reset_ttl: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// `DATABASE_URL` and `SECRET` are required; everything else has a
    /// sensible default.
    pub fn from_env() -> Result<Self, ApiError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ApiError::internal("DATABASE_URL must be set"))?;
        let secret =
            std::env::var("SECRET").map_err(|_| ApiError::internal("SECRET must be set"))?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ApiError::internal("PORT must be a number"))?;

        let session_ttl =
            parse_duration(&std::env::var("EXPIRES_IN").unwrap_or_else(|_| "7 days".to_string()))?;
        let reset_ttl = parse_duration(
            &std::env::var("RESET_EXPIRES_IN").unwrap_or_else(|_| "2 days".to_string()),
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            secret,
            session_ttl,
            reset_ttl,
        })
    }
}

/// Parses human-readable durations such as "7 days", "2 days", "15m" or
/// "1ms". A bare number is read as seconds.
pub fn parse_duration(input: &str) -> Result<Duration, ApiError> {
    let input = input.trim();
    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(Duration::seconds(seconds));
    }

    let unit_start = input
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| ApiError::internal(format!("Invalid duration: {}", input)))?;
    let (amount, unit) = input.split_at(unit_start);
    let amount = amount
        .parse::<i64>()
        .map_err(|_| ApiError::internal(format!("Invalid duration: {}", input)))?;

    match unit.trim().to_ascii_lowercase().as_str() {
        "ms" | "millisecond" | "milliseconds" => Ok(Duration::milliseconds(amount)),
        "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::seconds(amount)),
        "m" | "min" | "mins" | "minute" | "minutes" => Ok(Duration::minutes(amount)),
        "h" | "hour" | "hours" => Ok(Duration::hours(amount)),
        "d" | "day" | "days" => Ok(Duration::days(amount)),
        other => Err(ApiError::internal(format!(
            "Unknown duration unit: {}",
            other
        ))),
    }
}
