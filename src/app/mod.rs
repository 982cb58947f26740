use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use secrecy::ExposeSecret;
use tokio::{net::TcpListener, sync::OnceCell};
use tracing::{debug, error, info};

use crate::{
    config::{AppConfig, ConfigError, StoreConfig},
    store::{ServiceAccountKey, StoreClient, StoreError},
    Result,
};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    /// Parses the service account key, if there is one, and binds the listener.
    /// A malformed key is a fatal error, a missing one only fails the writes.
    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let service_account_key = config
            .service_account_key
            .as_ref()
            .map(|raw| ServiceAccountKey::parse(raw.expose_secret()))
            .transpose()
            .map_err(|er| ConfigError::ServiceAccountKey(er.to_string()))?;

        let app_state = AppState::new(config.store_config, service_account_key);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }
}

pub struct InternalState {
    pub store_config: StoreConfig,
    pub service_account_key: Option<ServiceAccountKey>,
    store_client: OnceCell<StoreClient>,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(store_config: StoreConfig, service_account_key: Option<ServiceAccountKey>) -> Self {
        AppState(Arc::new(InternalState {
            store_config,
            service_account_key,
            store_client: OnceCell::new(),
        }))
    }

    /// Returns the store client, creating it on first use.
    ///
    /// Concurrent first callers wait for the same initialization. A failed
    /// initialization leaves the cell empty, so the next call tries again.
    pub async fn store_client(&self) -> core::result::Result<&StoreClient, StoreInitError> {
        if let Some(client) = self.store_client.get() {
            debug!("{:<20} - Store client already initialized", "store_client");
            return Ok(client);
        }

        let Some(key) = self.service_account_key.as_ref() else {
            error!(
                "{:<20} - The service account key is missing, can't initialize the store client",
                "store_client"
            );
            return Err(StoreInitError::MissingServiceAccountKey);
        };

        self.store_client
            .get_or_try_init(|| async {
                info!("{:<20} - Initializing the store client", "store_client");
                let client = StoreClient::new(key.clone(), &self.store_config)?;
                info!(
                    "{:<20} - Store client initialized for project: {}",
                    "store_client",
                    client.project_id()
                );
                Ok::<_, StoreInitError>(client)
            })
            .await
            .inspect_err(|er| {
                error!(
                    error = %er,
                    "{:<20} - Critical failure while initializing the store client",
                    "store_client"
                )
            })
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum StoreInitError {
    #[error("the service account key is missing")]
    MissingServiceAccountKey,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
