//! User Model and authentication payloads

use serde::{Deserialize, Serialize};

/// Verified account holder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub phone_number: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: i64,
}

/// `POST /api/signup/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    #[serde(rename = "idToken")]
    pub id_token: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: i64,
    pub phone_number: String,
    pub name: String,
}

/// `POST /api/signin/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigninResponse {
    pub access: String,
    pub refresh: String,
    pub user_id: i64,
    pub name: String,
}

/// `POST /api/token/refresh/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// `POST /api/forgotpassword/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub id_token: String,
    pub phone_number: String,
    pub new_password: String,
}

/// Plain `{message}` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `GET /api/authcheck/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCheckResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            phone_number: "+919999999999".into(),
            name: "Asha".into(),
            password_hash: "$argon2id$secret".into(),
            is_verified: true,
            is_active: true,
            is_staff: false,
            created_at: 0,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn identity_payloads_use_client_field_names() {
        let signup: SignupRequest =
            serde_json::from_str(r#"{"idToken":"tok","name":"Asha","password":"longenough"}"#)
                .unwrap();
        assert_eq!(signup.id_token, "tok");

        let forgot: ForgotPasswordRequest = serde_json::from_str(
            r#"{"idToken":"tok","phoneNumber":"+919999999999","newPassword":"longenough"}"#,
        )
        .unwrap();
        assert_eq!(forgot.phone_number, "+919999999999");
        assert_eq!(forgot.new_password, "longenough");
    }
}
