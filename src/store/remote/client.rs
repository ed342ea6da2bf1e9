use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::records::{FetchRequest, FetchResponse, UpdateRequest, UpdateResponse};
use crate::auth::PublicKey;
use crate::error::{DealBoardError, Result};

/// HTTP client for the hosted record service.
pub struct RecordClient {
    client: Client,
    api_url: Url,
    project_id: String,
    public_key: Option<PublicKey>,
}

impl RecordClient {
    pub fn new(base_url: &Url, project_id: String, public_key: Option<PublicKey>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("DealBoard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DealBoardError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = base_url
            .join("api/v1/")
            .map_err(|e| DealBoardError::Config(format!("Invalid API base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            project_id,
            public_key,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.public_key {
            Some(key) => key.authorize(request),
            None => request,
        }
    }

    /// `{api}/projects/{project}/tables/{table}/records[/extra]`, each segment escaped.
    fn records_url(&self, table: &str, extra: Option<&str>) -> Result<Url> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| DealBoardError::Config("API URL cannot be a base".to_string()))?;
            segments
                .pop_if_empty()
                .extend(["projects", self.project_id.as_str(), "tables", table, "records"]);
            if let Some(extra) = extra {
                segments.push(extra);
            }
        }
        Ok(url)
    }

    pub async fn fetch_records<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &FetchRequest,
    ) -> Result<FetchResponse<T>> {
        let url = self.records_url(table, Some("fetch"))?;
        let request = self.auth_request(self.client.post(url).json(query));

        let response = request.send().await?.error_for_status()?;
        let body = response.json::<FetchResponse<T>>().await?;
        Ok(body)
    }

    pub async fn update_records<R: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        records: Vec<R>,
    ) -> Result<UpdateResponse<T>> {
        let url = self.records_url(table, None)?;
        let payload = UpdateRequest { records };
        let request = self.auth_request(self.client.patch(url).json(&payload));

        let response = request.send().await?.error_for_status()?;
        let body = response.json::<UpdateResponse<T>>().await?;
        Ok(body)
    }
}
