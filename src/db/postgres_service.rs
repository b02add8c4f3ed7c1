use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::config::DatabaseConfig;

#[derive(Clone)]
pub struct PostgresService {
    pub(crate) database_connection: DatabaseConnection,
}

impl PostgresService {
    /// Connects and brings the schema up to date.
    pub async fn new(uri: &str) -> Result<Self, DbErr> {
        let service = Self::connect(uri, false).await?;
        service.migrate().await?;
        Ok(service)
    }

    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, DbErr> {
        Self::connect(&config.url, config.log_sql).await
    }

    pub async fn connect(uri: &str, log_sql: bool) -> Result<Self, DbErr> {
        info!("Connecting to PostgreSQL...");
        let mut options = ConnectOptions::new(uri.to_owned());
        options
            .max_connections(20)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(log_sql);
        let database_connection = Database::connect(options).await?;
        info!("Connected to PostgreSQL.");
        Ok(Self { database_connection })
    }

    pub async fn migrate(&self) -> Result<(), DbErr> {
        info!("Running migrations...");
        Migrator::up(&self.database_connection, None).await?;
        info!("Migrations finished.");
        Ok(())
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.database_connection
    }
}
