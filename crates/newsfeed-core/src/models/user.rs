use serde::{Deserialize, Serialize};

/// The authenticated user, as returned by the "who am I" endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Successful login payload. The backend also sends a `status` field, which is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LoginResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response_ignores_status() {
        let json = r#"{"status": "success", "token": "eyJ0eXAi.payload.sig"}"#;
        let resp: LoginResponse = serde_json::from_str(json).expect("parse login response");
        assert_eq!(resp.token, "eyJ0eXAi.payload.sig");
    }

    #[test]
    fn test_parse_user() {
        let json = r#"{"id": "6a1f1a4e-52a0-4b0c-9a0e-1d2b7f2d6f10", "name": "alice"}"#;
        let user: User = serde_json::from_str(json).expect("parse user");
        assert_eq!(user.name, "alice");
        assert_eq!(user.id, "6a1f1a4e-52a0-4b0c-9a0e-1d2b7f2d6f10");
    }
}
