use anyhow::Context;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::config::Config;

pub async fn establish_connection(config: &Config) -> anyhow::Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to create pool")
}
