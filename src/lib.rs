//! Client-side core for the Prospector lead-management app.
//!
//! The crate owns everything between the UI and the backend: the
//! authenticated API gateway with its refresh-and-replay protocol, durable
//! encrypted token storage, session lifecycle, the in-memory prospect
//! directory with its filter/sort/selection view models, batch AI
//! operations, and the backend liveness monitor. Rendering and actual
//! navigation are the embedder's job; this crate emits session events and
//! guard decisions for it to act on.

pub mod api;
pub mod batch;
pub mod collection;
pub mod config;
pub mod crypto;
pub mod db;
pub mod health;
pub mod notices;
pub mod prospects;
pub mod routing;
pub mod session;
pub mod settings;
pub mod store;

use std::sync::Arc;

use thiserror::Error;

use api::ApiClient;
use batch::BatchRunner;
use config::ClientConfig;
use crypto::{CryptoError, CryptoService};
use db::{Database, DbError};
use health::BackendStatusMonitor;
use notices::NoticeCenter;
use prospects::{ProspectDirectory, ProspectService};
use session::{SessionHandle, SessionManager};
use settings::SettingsService;
use store::{StoreError, TokenStore};

#[derive(Error, Debug)]
pub enum InitError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// The wired application core. Construct once at startup and hand shared
/// pieces (session handle, notice center) to the UI layer.
pub struct App {
    pub config: ClientConfig,
    pub session: SessionHandle,
    pub api: Arc<ApiClient>,
    pub auth: SessionManager,
    pub prospects: Arc<ProspectService>,
    pub directory: ProspectDirectory,
    pub batch: BatchRunner,
    pub settings: SettingsService,
    pub notices: Arc<NoticeCenter>,
    pub health: BackendStatusMonitor,
}

impl App {
    /// Open the session database under the configured data directory, get
    /// the master key from the OS keychain, and wire all components.
    pub async fn init(config: ClientConfig) -> Result<Self, InitError> {
        let db = Arc::new(Database::open(&config.data_dir).await?);
        let crypto = CryptoService::new()?;
        Self::init_with(config, db, crypto).await
    }

    /// Wire the components over an existing database and crypto service.
    /// Tests and embedders with their own key management use this.
    pub async fn init_with(
        config: ClientConfig,
        db: Arc<Database>,
        crypto: CryptoService,
    ) -> Result<Self, InitError> {
        let store = Arc::new(TokenStore::new(db, crypto));
        let session = SessionHandle::new();
        let api = Arc::new(ApiClient::new(
            config.api_url.clone(),
            store.clone(),
            session.clone(),
        ));

        let auth = SessionManager::new(api.clone(), store.clone(), session.clone());
        // Pick up the profile a previous run persisted, if any.
        auth.restore().await?;

        let prospects = Arc::new(ProspectService::new(api.clone()));
        let directory = ProspectDirectory::new(prospects.clone());
        let notices = Arc::new(NoticeCenter::new());
        let batch = BatchRunner::new(prospects.clone(), notices.clone());
        let settings = SettingsService::new(api.clone());
        let health = BackendStatusMonitor::new(config.api_url.clone(), config.health_interval);

        Ok(Self {
            config,
            session,
            api,
            auth,
            prospects,
            directory,
            batch,
            settings,
            notices,
            health,
        })
    }
}
