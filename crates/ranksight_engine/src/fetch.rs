use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use client_logging::client_warn;

use crate::config::{ConfigError, EngineConfig, FetchSettings};
use crate::types::{
    FailureKind, FetchError, JobEndpoint, StatusResponse, SuggestionQuery, SuggestionWriteRequest,
    SuggestionWriteResponse, SuggestionsResponse, TriggerResponse,
};

const SUGGESTIONS_PATH: &str = "api/smart-links/suggestions";

/// One request-response read/write against the backend. Implementations
/// must be cheap to share; the engine holds one behind an `Arc` for every
/// concurrent task.
#[async_trait::async_trait]
pub trait ApiFetcher: Send + Sync {
    /// Issues the trigger write for a job. A body-level rejection is an
    /// `Ok` with `error` set; `Err` means the call itself failed.
    async fn trigger_job(
        &self,
        endpoint: JobEndpoint,
        body: &serde_json::Value,
    ) -> Result<TriggerResponse, FetchError>;

    /// Reads the current status of a running job.
    async fn job_status(
        &self,
        endpoint: JobEndpoint,
        remote_id: &str,
    ) -> Result<StatusResponse, FetchError>;

    async fn fetch_suggestions(
        &self,
        query: &SuggestionQuery,
    ) -> Result<SuggestionsResponse, FetchError>;

    async fn write_suggestion(
        &self,
        query: &SuggestionQuery,
        request: &SuggestionWriteRequest,
    ) -> Result<SuggestionWriteResponse, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    base_url: url::Url,
    client: reqwest::Client,
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let base_url = config.parse_base_url()?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.fetch.connect_timeout)
            .timeout(config.fetch.request_timeout)
            .build()
            .map_err(|err| ConfigError::Client(err.to_string()))?;
        Ok(Self {
            base_url,
            client,
            settings: config.fetch.clone(),
        })
    }

    fn endpoint_url(&self, path: &str) -> Result<url::Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn suggestions_url(&self, query: &SuggestionQuery) -> Result<url::Url, FetchError> {
        let mut url = self.endpoint_url(SUGGESTIONS_PATH)?;
        url.query_pairs_mut()
            .append_pair("blog_id", &query.blog_id)
            .append_pair("article_id", &query.article_id)
            .append_pair("include_external", if query.include_external { "true" } else { "false" });
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: url::Url) -> Result<T, FetchError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let bytes = self.read_capped_body(response).await?;
        decode_json(&bytes)
    }

    async fn read_capped_body(&self, response: reqwest::Response) -> Result<Bytes, FetchError> {
        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_response_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_response_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_response_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_response_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

#[async_trait::async_trait]
impl ApiFetcher for ReqwestFetcher {
    async fn trigger_job(
        &self,
        endpoint: JobEndpoint,
        body: &serde_json::Value,
    ) -> Result<TriggerResponse, FetchError> {
        let url = self.endpoint_url(endpoint.trigger_path())?;
        let payload = encode_json(body)?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            let bytes = self.read_capped_body(response).await?;
            return decode_json(&bytes);
        }

        // Trigger rejections (credits, quota, validation) ride on 4xx
        // responses with the same body shape; forward those in-band.
        if status.is_client_error() {
            let bytes = self.read_capped_body(response).await?;
            if let Ok(rejection) = decode_json::<TriggerResponse>(&bytes) {
                if rejection.error.is_some() {
                    return Ok(rejection);
                }
            }
        }
        Err(FetchError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }

    async fn job_status(
        &self,
        endpoint: JobEndpoint,
        remote_id: &str,
    ) -> Result<StatusResponse, FetchError> {
        let url = self.endpoint_url(&endpoint.status_path(remote_id))?;
        self.get_json(url).await
    }

    async fn fetch_suggestions(
        &self,
        query: &SuggestionQuery,
    ) -> Result<SuggestionsResponse, FetchError> {
        let url = self.suggestions_url(query)?;
        self.get_json(url).await
    }

    async fn write_suggestion(
        &self,
        query: &SuggestionQuery,
        request: &SuggestionWriteRequest,
    ) -> Result<SuggestionWriteResponse, FetchError> {
        let url = self.suggestions_url(query)?;
        let payload = encode_json(request)?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let bytes = self.read_capped_body(response).await?;
        decode_json(&bytes)
    }
}

/// Issues a trigger with up to `trigger_retry_limit` extra attempts on
/// transient transport failures, sleeping a capped exponential backoff
/// between attempts. Rejections and hard failures surface immediately.
pub async fn trigger_with_retry(
    fetcher: &dyn ApiFetcher,
    endpoint: JobEndpoint,
    body: &serde_json::Value,
    settings: &FetchSettings,
) -> Result<TriggerResponse, FetchError> {
    let mut delay = settings.retry_backoff_base;
    let mut retries = 0u32;
    loop {
        match fetcher.trigger_job(endpoint, body).await {
            Ok(response) => return Ok(response),
            Err(err) if err.kind.is_transient() && retries < settings.trigger_retry_limit => {
                retries += 1;
                client_warn!(
                    "trigger retry {}/{} after {}: {}",
                    retries,
                    settings.trigger_retry_limit,
                    err.kind,
                    err.message
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(settings.retry_backoff_cap);
            }
            Err(err) => return Err(err),
        }
    }
}

fn encode_json(body: &impl serde::Serialize) -> Result<Vec<u8>, FetchError> {
    serde_json::to_vec(body)
        .map_err(|err| FetchError::new(FailureKind::Decode, format!("request body: {err}")))
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FetchError> {
    serde_json::from_slice(bytes)
        .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
