use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;

/// Request body for registration. Fields are optional so the validation
/// layer can report every missing one in a single response.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "new-password")]
    pub new_password: Option<String>,
    #[serde(rename = "confirm-password")]
    pub confirm_password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Request body for profile updates and password rotation.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "old-password")]
    pub old_password: Option<String>,
    #[serde(rename = "new-password")]
    pub new_password: Option<String>,
    #[serde(rename = "confirm-password")]
    pub confirm_password: Option<String>,
}

/// Public part of the user returned to clients. The password hash lives in
/// its own table and is never part of this shape.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serializes_without_password_keys() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "a@example.com".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert!(obj.contains_key("id"));
        assert!(obj.contains_key("username"));
        assert!(obj.contains_key("email"));
        assert!(!obj.contains_key("password"));
        assert!(!obj.contains_key("password_hash"));
    }

    #[test]
    fn signup_request_reads_hyphenated_password_fields() {
        let body = serde_json::json!({
            "username": "alice",
            "email": "a@example.com",
            "new-password": "password1",
            "confirm-password": "password1",
        });
        let req: SignupRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.new_password.as_deref(), Some("password1"));
        assert_eq!(req.confirm_password.as_deref(), Some("password1"));
    }
}
