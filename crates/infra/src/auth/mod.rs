//! Credential providers for the delivery gateway

pub mod keychain;
pub mod token_store;

pub use keychain::KeychainTokenProvider;
pub use token_store::SharedTokenStore;
