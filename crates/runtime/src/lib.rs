use std::sync::Arc;

use anyhow::{Context, Result};
use ecole_config::{AppConfig, MailMode, StoreBackend};
use ecole_database::{MemoryStore, RestStore, SqliteStore, StoreAdapter};
use ecole_integrations::{GeminiAssistant, HttpMailer};
use ecole_portal::Portal;
use tracing::{info, warn};

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// The store and a portal wired from configuration.
#[derive(Clone)]
pub struct PortalServices {
    pub store: Arc<dyn StoreAdapter>,
    pub portal: Portal,
    pub assistant_enabled: bool,
}

impl PortalServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let store = open_store(config).await?;

        let mut builder = Portal::builder(store.clone()).config(config);

        let assistant_enabled = match GeminiAssistant::new(&config.assistant) {
            Ok(assistant) => {
                info!(model = %config.assistant.model, "assistant ready");
                builder = builder.assistant(Arc::new(assistant));
                true
            }
            Err(error) => {
                warn!(%error, "assistant disabled");
                false
            }
        };

        if config.mail.mode == MailMode::Provider {
            let mailer =
                HttpMailer::new(&config.mail).context("failed to configure mail provider")?;
            builder = builder.mailer(Arc::new(mailer));
            info!("mail provider configured");
        }

        let portal = builder.build();
        info!(store = portal.store_name(), "portal ready");

        Ok(Self {
            store,
            portal,
            assistant_enabled,
        })
    }
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn StoreAdapter>> {
    let store: Arc<dyn StoreAdapter> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => Arc::new(
            SqliteStore::connect(&config.store.database)
                .await
                .context("failed to open sqlite store")?,
        ),
        StoreBackend::Rest => Arc::new(
            RestStore::new(&config.store.rest).context("failed to configure rest store")?,
        ),
    };
    Ok(store)
}
