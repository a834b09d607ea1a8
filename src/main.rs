use dotenvy::dotenv;
use shipment_registry::{
    config::{catalog, database, storage::StorageConfig},
    core::{
        person::list_people,
        sale::{container_options, list_sales},
        shipment::list_shipments,
        uploader::DocumentUploader,
    },
    entities::PersonKind,
    errors::Result,
    storage::open_store,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Choice catalog from config.toml
    let config = catalog::load_default_config()
        .inspect_err(|e| error!("Failed to load config.toml: {}", e))?;
    info!(
        "Loaded choice catalog ({} qualities, {} brands, {} ports of departure)",
        config.choices.quality.len(),
        config.choices.brand.len(),
        config.choices.departure_port.len()
    );

    // 4. Blob storage
    let storage_config = StorageConfig::from_env()?;
    let store = open_store(&storage_config)
        .inspect_err(|e| error!("Failed to open blob storage: {}", e))?;
    let uploader = DocumentUploader::new(store, storage_config.bucket.clone());
    info!("Documents go to bucket {}", uploader.bucket());

    // 5. Database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to {}: {}", database::get_database_url(), e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))?;

    // 6. Summary of what is registered
    let shipments = list_shipments(&db).await?;
    let bls = container_options(&db).await?;
    let sales = list_sales(&db).await?;
    let clients = list_people(&db, PersonKind::Client).await?;
    let sellers = list_people(&db, PersonKind::Seller).await?;
    info!(
        "{} shipments under {} BLs, {} sales, {} clients, {} sellers",
        shipments.len(),
        bls.len(),
        sales.len(),
        clients.len(),
        sellers.len()
    );

    Ok(())
}
