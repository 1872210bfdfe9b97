//! Lichess opening explorer client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::{ExplorerResponse, LookupParams};
use super::OpeningStats;
use crate::error::{Error, Result};
use crate::position::Position;

const EXPLORER_API_BASE: &str = "https://explorer.lichess.ovh";

/// Which explorer database the client queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Database {
    /// Over-the-board master games.
    Masters,
    /// Online games, filterable by rating band.
    Lichess,
}

impl Database {
    pub fn as_str(&self) -> &'static str {
        match self {
            Database::Masters => "masters",
            Database::Lichess => "lichess",
        }
    }
}

pub struct ExplorerClient {
    client: Client,
    database: Database,
}

impl ExplorerClient {
    /// Creates a client against the masters database.
    pub fn new() -> Result<Self> {
        Self::with_database(Database::Masters)
    }

    /// Creates a client against a specific database.
    pub fn with_database(database: Database) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, database })
    }

    /// Fetches candidate-move statistics and the opening classification
    /// for a position.
    pub async fn lookup(
        &self,
        position: &Position,
        params: &LookupParams,
    ) -> Result<ExplorerResponse> {
        let url = format!("{}/{}", EXPLORER_API_BASE, self.database.as_str());

        let mut request = self.client.get(&url).query(&[("fen", position.fen())]);

        if let Some(band) = params.rating {
            request = request.query(&[("ratings", band.as_str())]);
        }
        if let Some(count) = params.max_moves {
            request = request.query(&[("moves", count.to_string())]);
        }

        debug!(
            fen = position.fen(),
            database = self.database.as_str(),
            "explorer lookup"
        );
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(Error::Explorer(format!(
                "API error: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl Default for ExplorerClient {
    fn default() -> Self {
        Self::new().expect("Failed to create HTTP client")
    }
}

#[async_trait]
impl OpeningStats for ExplorerClient {
    async fn lookup(
        &self,
        position: &Position,
        params: &LookupParams,
    ) -> Result<ExplorerResponse> {
        ExplorerClient::lookup(self, position, params).await
    }
}
