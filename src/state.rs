use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, Blake3TokenCodec, CatalogService, FeedbackService, LogMailer, Mailer,
    SeaOrmAccountService, SeaOrmCatalogService, SeaOrmFeedbackService, TokenCodec,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub catalog: Arc<dyn CatalogService>,

    pub feedback: Arc<dyn FeedbackService>,

    pub accounts: Arc<dyn AccountService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(&config.mail));
        let codec: Arc<dyn TokenCodec> =
            Arc::new(Blake3TokenCodec::new(&config.security.confirmation_secret));
        Self::with_capabilities(config, mailer, codec).await
    }

    /// Builds the state around caller-supplied mail and confirmation-code
    /// capabilities; tests use this to capture outgoing codes.
    pub async fn with_capabilities(
        config: Config,
        mailer: Arc<dyn Mailer>,
        codec: Arc<dyn TokenCodec>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let config = Arc::new(RwLock::new(config));

        let catalog = Arc::new(SeaOrmCatalogService::new(store.clone())) as Arc<dyn CatalogService>;
        let feedback =
            Arc::new(SeaOrmFeedbackService::new(store.clone())) as Arc<dyn FeedbackService>;
        let accounts = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            config.clone(),
            mailer,
            codec,
        )) as Arc<dyn AccountService>;

        Ok(Self {
            config,
            store,
            catalog,
            feedback,
            accounts,
        })
    }
}
