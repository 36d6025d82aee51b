//! Application state for blog service.

use std::sync::Arc;

use axum::extract::FromRef;
use common::auth::{CredentialHasher, TokenCodec};
use common::config::AppConfig;
use common::errors::AppResult;

use crate::service::{PostService, UserService};
use crate::store::Store;

const DUMMY_PASSWORD: &str = "unknown-account";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<Store>,
    pub token_codec: Arc<TokenCodec>,
    pub hasher: Arc<CredentialHasher>,
    /// Hash verified against when a login email is unknown, so both login
    /// failures cost one Argon2 run.
    pub dummy_hash: Arc<str>,
}

impl AppState {
    /// Connects to the configured database and builds the state.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let store = Store::connect(&config.database_url, config.database_max_connections).await?;
        Self::with_store(config, store)
    }

    /// Builds the state around an already prepared store.
    pub fn with_store(config: AppConfig, store: Store) -> AppResult<Self> {
        let hasher = CredentialHasher::new(config.auth.hash_cost)?;
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        let token_codec = TokenCodec::new(
            config.auth.signing_secret.as_bytes(),
            config.auth.token_ttl,
        );
        Ok(Self {
            store: Arc::new(store),
            token_codec: Arc::new(token_codec),
            hasher: Arc::new(hasher),
            dummy_hash: Arc::from(dummy_hash),
            config,
        })
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(
            self.store.clone(),
            self.hasher.clone(),
            self.token_codec.clone(),
            self.dummy_hash.clone(),
        )
    }

    pub fn post_service(&self) -> PostService {
        PostService::new(self.store.clone())
    }
}

impl FromRef<AppState> for Arc<TokenCodec> {
    fn from_ref(state: &AppState) -> Self {
        state.token_codec.clone()
    }
}
