//! Users module - identity models and the identity provider trait.

mod users_model;
mod users_traits;

pub use users_model::{AuthEvent, AuthSession, IdentityUser, User};
pub use users_traits::IdentityProviderTrait;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity(value: serde_json::Value) -> IdentityUser {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_user_name_prefers_full_name() {
        let user: User = identity(json!({
            "id": "u1",
            "email": "ana@example.com",
            "user_metadata": { "full_name": "Ana Lima", "name": "ana", "avatar_url": "https://img/a.png" }
        }))
        .into();
        assert_eq!(user.id, "u1");
        assert_eq!(user.name, "Ana Lima");
        assert_eq!(user.avatar_url, "https://img/a.png");
    }

    #[test]
    fn test_user_name_falls_back_to_email() {
        let user: User = identity(json!({ "id": "u2", "email": "bo@example.com" })).into();
        assert_eq!(user.name, "bo@example.com");
        assert_eq!(user.avatar_url, "");
    }

    #[test]
    fn test_user_name_uses_metadata_name() {
        let user: User = identity(json!({
            "id": "u3",
            "email": "c@example.com",
            "user_metadata": { "full_name": "", "name": "Cy" }
        }))
        .into();
        assert_eq!(user.name, "Cy");
    }

    #[test]
    fn test_incomplete_session() {
        assert!(AuthSession::new("a", "r").is_complete());
        assert!(!AuthSession::new("a", "").is_complete());
        assert!(!AuthSession::new(" ", "r").is_complete());
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let rendered = format!("{:?}", AuthSession::new("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }
}
