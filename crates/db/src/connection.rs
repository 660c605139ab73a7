use mongodb::{Client, Database, options::ClientOptions};
use taskflow_config::Settings;
use tracing::{error, info};

/// Opens the client described by `settings.database` and pings the server
/// before handing out the application database.
pub async fn connect(settings: &Settings) -> Result<Database, mongodb::error::Error> {
    let db = &settings.database;
    let mut options = ClientOptions::parse(&db.url).await?;
    options.app_name = Some("taskflow".to_string());
    options.max_pool_size = db.max_pool_size.or(options.max_pool_size);
    options.min_pool_size = db.min_pool_size.or(options.min_pool_size);

    let client = Client::with_options(options)?;

    if let Err(e) = client
        .database("admin")
        .run_command(bson::doc! { "ping": 1 })
        .await
    {
        error!(db = %db.name, error = %e, "MongoDB ping failed");
        return Err(e);
    }

    info!(db = %db.name, "Connected to MongoDB");
    Ok(client.database(&db.name))
}
