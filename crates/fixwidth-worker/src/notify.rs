//! Job notifications over PostgreSQL `LISTEN`/`NOTIFY`
//!
//! The backend issues `NOTIFY <channel>, '<bulk file id>'` when a file is
//! uploaded. Payloads are passed on untouched; the dispatcher trims them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgListener;
use tracing::info;

use crate::collaborators::NotificationSource;

pub struct PgNotificationSource {
    listener: PgListener,
}

impl PgNotificationSource {
    pub async fn connect(database_url: &str, channel: &str) -> Result<Self> {
        let mut listener = PgListener::connect(database_url)
            .await
            .context("Failed to connect notification listener")?;

        listener
            .listen(channel)
            .await
            .with_context(|| format!("Failed to LISTEN on channel '{}'", channel))?;

        info!(channel, "Listening for ingest jobs");

        Ok(Self { listener })
    }
}

#[async_trait]
impl NotificationSource for PgNotificationSource {
    /// Waits for the next notification. After a dropped connection this
    /// returns one error and reconnects on the following call.
    async fn recv(&mut self) -> Result<Option<String>> {
        let notification = self
            .listener
            .recv()
            .await
            .context("Failed to receive notification")?;

        Ok(Some(notification.payload().to_string()))
    }
}
