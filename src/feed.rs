use async_trait::async_trait;
use failure::Fail;

use crate::config;
use crate::decode;
use crate::model;
use crate::schema;

#[derive(Debug, Fail)]
pub enum FeedError {
    #[fail(display = "request failed: {}", _0)]
    Transport(#[cause] reqwest::Error),
    #[fail(display = "feed responded with {}: {}", status, body)]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[fail(display = "malformed feed response: {}", _0)]
    Malformed(#[cause] serde_json::Error),
}

/// One page request against the historical-data feed.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchRequest {
    pub device_id: model::DeviceId,
    /// Only records strictly after this instant are returned; `None` reads from the beginning.
    pub cursor: Option<chrono::NaiveDateTime>,
    pub limit: u32,
}

impl FetchRequest {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("device_id", self.device_id.to_string())];
        if let Some(cursor) = &self.cursor {
            pairs.push(("timestamp", decode::format_cursor(cursor)));
        }
        pairs.push(("query_limit", self.limit.to_string()));
        pairs
    }
}

/// Source of devices and their telemetry.
#[async_trait]
pub trait HistoricalFeed: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<model::Device>, FeedError>;

    async fn fetch_historical_data(
        &self,
        request: &FetchRequest,
    ) -> Result<Vec<schema::RawRecord>, FeedError>;
}

/// The REST backend, reached over HTTP.
pub struct HttpFeed {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpFeed {
    pub fn new(settings: &config::Feed) -> Result<Self, failure::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpFeed {
            client: builder.build()?,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            token: settings.token.clone(),
        })
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, FeedError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut request = self
            .client
            .get(&format!("{}/{}", self.base_url, path))
            .query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(FeedError::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(FeedError::Transport)?;

        if !status.is_success() {
            return Err(FeedError::Status {
                status,
                body: body.trim().to_owned(),
            });
        }

        serde_json::from_str(&body).map_err(FeedError::Malformed)
    }
}

#[async_trait]
impl HistoricalFeed for HttpFeed {
    async fn list_devices(&self) -> Result<Vec<model::Device>, FeedError> {
        let response: schema::DevicesResponse = self.get("user/devices", &[]).await?;
        Ok(response
            .devices
            .into_iter()
            .map(|device| model::Device {
                device_id: model::DeviceId(device.device_id),
            })
            .collect())
    }

    async fn fetch_historical_data(
        &self,
        request: &FetchRequest,
    ) -> Result<Vec<schema::RawRecord>, FeedError> {
        let response: schema::HistoricalDataResponse = self
            .get("historical-data", &request.query_pairs())
            .await?;
        Ok(response.data)
    }
}
