//! REST gateway: `GET /form/{id}` and `PUT /form/{id}/form-tree`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use crate::domain::{FormDocument, WireNode};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{GatewayError, PersistenceGateway};

/// Gateway talking to the forms backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> InfraResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InfraError::Http {
                message: format!("build client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn form_url(&self, form_id: &str) -> String {
        format!("{}/form/{}", self.base_url, form_id)
    }

    pub fn form_tree_url(&self, form_id: &str) -> String {
        format!("{}/form/{}/form-tree", self.base_url, form_id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    #[instrument(level = "debug", skip(self))]
    async fn load_tree(&self, form_id: &str) -> Result<FormDocument, GatewayError> {
        let url = self.form_url(form_id);
        let not_found = || GatewayError::NotFound(form_id.to_string());

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| {
                warn!("GET {} failed: {}", url, e);
                not_found()
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!("GET {} -> {}", url, status);
            return Err(not_found());
        }

        response.json::<FormDocument>().await.map_err(|e| {
            warn!("GET {}: cannot decode form: {}", url, e);
            not_found()
        })
    }

    #[instrument(level = "debug", skip(self, forest), fields(top_level = forest.len()))]
    async fn save_tree(&self, form_id: &str, forest: &[WireNode]) -> Result<(), GatewayError> {
        let url = self.form_tree_url(form_id);

        let response = self
            .authorize(self.client.put(&url))
            .json(forest)
            .send()
            .await
            .map_err(|e| GatewayError::network_from(format!("PUT {}", url), e))?;

        response
            .error_for_status()
            .map_err(|e| GatewayError::network_from(format!("PUT {}", url), e))?;
        debug!("PUT {} ok", url);
        Ok(())
    }
}
