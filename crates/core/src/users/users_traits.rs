use crate::errors::Result;
use crate::users::users_model::User;
use async_trait::async_trait;

/// Trait for looking up the user behind an access token.
///
/// `Ok(None)` means the token is unknown or expired; `Err` means the identity
/// service could not be reached or answered with garbage. Callers treat both
/// as "no user".
#[async_trait]
pub trait IdentityProviderTrait: Send + Sync {
    async fn get_user(&self, access_token: &str) -> Result<Option<User>>;
}
