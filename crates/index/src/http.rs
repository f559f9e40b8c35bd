//! `reqwest`-backed `IndexBridge`, grounded on the teacher's pattern of a
//! thin async wrapper around an external HTTP dependency with its own
//! scoped error enum (`control::services::connectors`).

use crate::{IndexBridge, IndexError, SearchResults};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

pub struct HttpIndexBridge {
    client: reqwest::Client,
    base_url: Url,
    index_name: String,
}

impl HttpIndexBridge {
    pub fn new(client: reqwest::Client, base_url: Url, index_name: String) -> Self {
        Self {
            client,
            base_url,
            index_name,
        }
    }

    fn documents_url(&self, segment: &str) -> Url {
        self.base_url
            .join(&format!("indexes/{}/{}", self.index_name, segment))
            .expect("segment produces a valid URL")
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, IndexError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(IndexError::BackendError {
            status: response.status(),
        })
    }
}

#[async_trait]
impl IndexBridge for HttpIndexBridge {
    #[tracing::instrument(skip(self, document))]
    async fn push_current(&self, entity_id: Uuid, document: &Value) -> Result<(), IndexError> {
        let response = self
            .client
            .put(self.documents_url(&format!("current/{entity_id}")))
            .json(document)
            .send()
            .await
            .map_err(IndexError::Unreachable)?;
        check_status(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, document))]
    async fn push_history(&self, entity_id: Uuid, document: &Value) -> Result<(), IndexError> {
        let response = self
            .client
            .put(self.documents_url(&format!("history/{entity_id}")))
            .json(document)
            .send()
            .await
            .map_err(IndexError::Unreachable)?;
        check_status(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str, offset: u64, count: u64) -> Result<SearchResults, IndexError> {
        let response = self
            .client
            .get(self.documents_url("search"))
            .query(&[
                ("q", query.to_string()),
                ("offset", offset.to_string()),
                ("count", count.to_string()),
            ])
            .send()
            .await
            .map_err(IndexError::Unreachable)?;
        let response = check_status(response).await?;

        response
            .json::<SearchResults>()
            .await
            .map_err(IndexError::MalformedResponse)
    }
}
