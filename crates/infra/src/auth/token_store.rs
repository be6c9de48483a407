//! In-process bearer token holder

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use sensorlink_core::CredentialProvider;
use sensorlink_domain::Result;

/// Token shared between the sign-in flow and the delivery gateway.
///
/// Clones share the same slot, so the UI layer can keep one handle and rotate
/// the token while sends are in flight. Each send captures the value once at
/// its start.
#[derive(Clone, Default)]
pub struct SharedTokenStore {
    token: Arc<RwLock<String>>,
}

impl SharedTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self { token: Arc::new(RwLock::new(token.into())) }
    }

    /// Replace the current token, e.g. after a successful login.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = token.into();
    }

    /// Forget the token; subsequent sends go out unauthenticated.
    pub fn clear(&self) {
        self.token.write().clear();
    }

    pub fn token(&self) -> String {
        self.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.read().is_empty()
    }
}

impl std::fmt::Debug for SharedTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTokenStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for SharedTokenStore {
    async fn current_token(&self) -> Result<String> {
        Ok(self.token())
    }
}
