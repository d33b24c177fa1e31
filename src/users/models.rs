// Request DTOs for user management endpoints

use serde::Deserialize;
use utoipa::ToSchema;

/// Profile update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Role assignment request for the admin endpoint
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RoleRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

/// Optional email filter shared by the admin search and check-in listings
#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_tolerates_missing_fields() {
        let request: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(request.name.is_none());
        assert!(request.password.is_none());
    }

    #[test]
    fn test_role_request_defaults_to_empty_strings() {
        let request: RoleRequest = serde_json::from_str("{}").unwrap();
        assert!(request.email.is_empty());
        assert!(request.role.is_empty());
    }
}
