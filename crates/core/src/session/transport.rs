use log::debug;

use crate::errors::Result;
use crate::users::AuthSession;

/// Where session tokens travel between the browser and the server.
///
/// The web transport is a pair of cookies; anything that can hold two tokens
/// and expire them works.
pub trait TokenTransport: Send + Sync {
    fn store_tokens(&self, access_token: &str, refresh_token: &str) -> Result<()>;
    fn expire_tokens(&self) -> Result<()>;
}

/// Mirror the session's tokens into the transport.
///
/// A session missing either token counts as no session at all.
pub fn sync_session_to_transport(
    transport: &dyn TokenTransport,
    session: Option<&AuthSession>,
) -> Result<()> {
    match session.filter(|s| s.is_complete()) {
        Some(session) => {
            debug!("Writing session tokens to transport");
            transport.store_tokens(&session.access_token, &session.refresh_token)
        }
        None => {
            debug!("Expiring session tokens");
            transport.expire_tokens()
        }
    }
}
