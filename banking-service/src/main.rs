//! Bootstrap entry point: validates configuration, reaches the database, and
//! ensures the indexes the repositories rely on. Run once per deployment
//! before pointing callers at the engines.

use bank_core::observability::init_tracing;
use banking_service::config::BankingConfig;
use banking_service::repositories::MongoDb;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BankingConfig::load()?;
    init_tracing(&config.common.service_name, &config.common.log_level);

    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    db.initialize_indexes().await?;
    db.health_check().await?;

    info!(database = %config.mongodb.database, "Banking database ready");
    Ok(())
}
