//! Application state wiring all services together.
//!
//! [`Storage`] opens the data directory, configuration and database; the CLI
//! inspection commands stop there. [`AppState`] adds the provider handle and
//! token verifier on top and is shared by every REST handler.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};

use astroline_core::chat::context::ContextAssembler;
use astroline_core::chat::service::ChatService;
use astroline_core::chat::store::SessionStore;
use astroline_core::llm::box_provider::BoxLlmProvider;
use astroline_core::llm::generator::{GeneratorConfig, ResponseGenerator};
use astroline_infra::config::{load_service_config, resolve_data_dir, resolve_database_url};
use astroline_infra::llm::create_provider;
use astroline_infra::sqlite::chat::SqliteSessionRepository;
use astroline_infra::sqlite::pool::DatabasePool;
use astroline_types::config::ServiceConfig;

use crate::http::extractors::auth::JwtVerifier;

/// Chat service pinned to the SQLite repository.
pub type ConcreteChatService = ChatService<SqliteSessionRepository>;

/// Opened data directory: resolved path, loaded config and database pool.
pub struct Storage {
    pub data_dir: PathBuf,
    pub config: ServiceConfig,
    pub db_pool: DatabasePool,
}

impl Storage {
    /// Resolve the data directory, load `config.toml` and open the database.
    pub async fn open() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_service_config(&data_dir).await;
        let db_url = resolve_database_url(&data_dir);
        let db_pool = DatabasePool::new(&db_url)
            .await
            .context("failed to open chat database")?;

        Ok(Self {
            data_dir,
            config,
            db_pool,
        })
    }

    /// Store over the opened database, for read-only inspection.
    pub fn session_store(&self) -> SessionStore<SqliteSessionRepository> {
        SessionStore::new(SqliteSessionRepository::new(self.db_pool.clone()))
    }
}

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub auth: Arc<JwtVerifier>,
    pub config: Arc<ServiceConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Wire the chat service around an already-built provider.
    pub fn new(storage: Storage, provider: BoxLlmProvider, jwt_secret: &SecretString) -> Self {
        let Storage {
            data_dir,
            config,
            db_pool,
        } = storage;

        let generator = ResponseGenerator::new(
            provider,
            GeneratorConfig::from_settings(&config.provider, &config.chat),
        );
        let chat_service = ChatService::new(
            SqliteSessionRepository::new(db_pool),
            ContextAssembler::new(config.chat.history_window),
            generator,
        );

        Self {
            chat_service: Arc::new(chat_service),
            auth: Arc::new(JwtVerifier::new(jwt_secret.expose_secret().as_bytes())),
            config: Arc::new(config),
            data_dir,
        }
    }

    /// Open storage and build the Gemini provider from `api_key`.
    pub async fn init(
        api_key: Option<SecretString>,
        jwt_secret: &SecretString,
    ) -> anyhow::Result<Self> {
        let storage = Storage::open().await?;
        let provider = create_provider(&storage.config.provider, api_key)
            .context("failed to configure the Gemini provider (is GEMINI_API_KEY set?)")?;
        Ok(Self::new(storage, provider, jwt_secret))
    }
}
