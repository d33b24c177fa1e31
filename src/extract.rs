// JSON body extraction that keeps rejections inside the error envelope

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
};

/// Drop-in replacement for `axum::Json` whose rejection is an [`ApiError`].
///
/// axum's own rejection for a malformed body or missing content type is a
/// plain-text 415/422; every failure here must surface as a 400 in the
/// `{status, error}` envelope instead.
#[derive(Debug)]
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(request, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_valid_json_passes_through() {
        let request = request(Some("application/json"), r#"{"name":"ok"}"#);
        let Json(payload) = Json::<Payload>::from_request(request, &()).await.unwrap();
        assert_eq!(payload.name, "ok");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = request(None, r#"{"name":"ok"}"#);
        let err = Json::<Payload>::from_request(request, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_truncated_json_is_bad_request() {
        let request = request(Some("application/json"), r#"{"name": "#);
        let err = Json::<Payload>::from_request(request, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
