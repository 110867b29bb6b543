use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info, warn};
use tokio::sync::watch;

use super::transport::{sync_session_to_transport, TokenTransport};
use crate::stores::UserScopeListener;
use crate::users::{AuthEvent, AuthSession, IdentityProviderTrait, User};

type AuthListener = Arc<dyn Fn(AuthEvent, Option<&User>) + Send + Sync>;

/// Bridges the identity service to the rest of a client context.
///
/// Owns the single current-user signal. On every auth transition the signal
/// is updated first, then registered stores switch namespace, then listeners
/// run, then tokens are mirrored into the transport.
pub struct SessionAdapter {
    identity: Arc<dyn IdentityProviderTrait>,
    transport: Arc<dyn TokenTransport>,
    current_user: watch::Sender<Option<User>>,
    stores: RwLock<Vec<Arc<dyn UserScopeListener>>>,
    listeners: RwLock<Vec<AuthListener>>,
}

impl SessionAdapter {
    pub fn new(
        identity: Arc<dyn IdentityProviderTrait>,
        transport: Arc<dyn TokenTransport>,
    ) -> Self {
        let (current_user, _) = watch::channel(None);
        Self {
            identity,
            transport,
            current_user,
            stores: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Stores are notified in registration order.
    pub fn register_store(&self, store: Arc<dyn UserScopeListener>) {
        self.stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(store);
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_user.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current_user.subscribe()
    }

    pub fn on_auth_state_change<F>(&self, callback: F)
    where
        F: Fn(AuthEvent, Option<&User>) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(callback));
    }

    /// Resolve the user behind `session` and publish it as the current user.
    ///
    /// Lookup failures are logged and treated as signed out.
    pub async fn get_current_user(&self, session: Option<&AuthSession>) -> Option<User> {
        let user = self.lookup(session).await;
        self.publish(user.as_ref()).await;
        user
    }

    /// Update the signal, then move every registered store to the new user.
    async fn publish(&self, user: Option<&User>) {
        self.current_user.send_replace(user.cloned());

        let user_id = user.map(|u| u.id.as_str());
        let stores = self
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for store in stores {
            if let Err(e) = store.set_user_id(user_id).await {
                warn!("Store failed to switch user: {}", e);
            }
        }
    }

    async fn lookup(&self, session: Option<&AuthSession>) -> Option<User> {
        let session = session.filter(|s| s.is_complete())?;
        match self.identity.get_user(&session.access_token).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Identity lookup failed, continuing signed out: {}", e);
                None
            }
        }
    }

    pub async fn handle_auth_state_change(&self, event: AuthEvent, session: Option<AuthSession>) {
        let session = session.filter(|s| s.is_complete());
        let user = match (event, session.as_ref()) {
            (AuthEvent::SignedOut, _) | (_, None) => None,
            (_, Some(s)) => match &s.user {
                Some(user) => Some(user.clone()),
                None => self.lookup(Some(s)).await,
            },
        };
        info!(
            "Auth state change {:?}: {}",
            event,
            user.as_ref().map_or("signed out", |u| u.id.as_str())
        );

        self.publish(user.as_ref()).await;

        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(event, user.as_ref());
        }

        let session = if user.is_some() { session } else { None };
        if let Err(e) = sync_session_to_transport(self.transport.as_ref(), session.as_ref()) {
            warn!("Failed to sync session tokens: {}", e);
        } else {
            debug!("Session tokens synced");
        }
    }
}
