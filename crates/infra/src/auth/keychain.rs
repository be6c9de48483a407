//! Bearer token stored in the OS keychain

use std::sync::Arc;

use async_trait::async_trait;
use keyring::Entry;
use sensorlink_core::CredentialProvider;
use sensorlink_domain::{Result, SensorLinkError};
use tokio::task;
use tracing::debug;

use crate::errors::InfraError;

/// Default keychain service name.
pub const DEFAULT_SERVICE_NAME: &str = "sensorlink";
/// Default keychain account holding the session token.
pub const DEFAULT_ACCOUNT_NAME: &str = "session-token";

/// Reads the session token from the platform keychain on every send.
///
/// A missing entry means nobody is signed in and yields an empty token.
pub struct KeychainTokenProvider {
    entry: Arc<Entry>,
}

impl KeychainTokenProvider {
    /// # Errors
    ///
    /// Returns `Credential` if the keychain rejects the service/account pair.
    pub fn new(service: &str, account: &str) -> Result<Self> {
        let entry = Entry::new(service, account).map_err(map_keyring_error)?;
        Ok(Self::with_entry(entry))
    }

    /// Provider for [`DEFAULT_SERVICE_NAME`] / [`DEFAULT_ACCOUNT_NAME`].
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_SERVICE_NAME, DEFAULT_ACCOUNT_NAME)
    }

    pub fn with_entry(entry: Entry) -> Self {
        Self { entry: Arc::new(entry) }
    }

    /// Persist `token`, replacing any previous value.
    pub async fn store_token(&self, token: &str) -> Result<()> {
        let entry = Arc::clone(&self.entry);
        let token = token.to_owned();

        run_blocking(move || entry.set_password(&token).map_err(map_keyring_error)).await?;
        debug!("session token stored in keychain");
        Ok(())
    }

    /// Remove the stored token. Removing a missing entry succeeds.
    pub async fn clear(&self) -> Result<()> {
        let entry = Arc::clone(&self.entry);

        run_blocking(move || match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(map_keyring_error(err)),
        })
        .await
    }
}

#[async_trait]
impl CredentialProvider for KeychainTokenProvider {
    async fn current_token(&self) -> Result<String> {
        let entry = Arc::clone(&self.entry);

        run_blocking(move || match entry.get_password() {
            Ok(token) => Ok(token),
            Err(keyring::Error::NoEntry) => Ok(String::new()),
            Err(err) => Err(map_keyring_error(err)),
        })
        .await
    }
}

async fn run_blocking<T, F>(op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    task::spawn_blocking(op).await.map_err(|err| SensorLinkError::from(InfraError::from(err)))?
}

fn map_keyring_error(err: keyring::Error) -> SensorLinkError {
    SensorLinkError::from(InfraError::from(err))
}
