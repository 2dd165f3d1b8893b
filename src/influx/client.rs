use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::InfluxConfig;
use crate::error::{AppError, AppResult};
use crate::influx::models::{parse_annotated_csv, FluxRecord};
use crate::influx::ReadApi;

pub struct InfluxClient {
    http_client: Client,
    query_url: String,
    organization: String,
    token: String,
    bucket: String,
}

impl InfluxClient {
    /// Build a client for the query endpoint described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Influx` if the HTTP client cannot be constructed.
    pub fn new(config: &InfluxConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Influx(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            query_url: format!("{}/api/v2/query", config.endpoint.trim_end_matches('/')),
            organization: config.organization.clone(),
            token: config.credential.clone(),
            bucket: config.bucket.clone(),
        })
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Run a Flux query and decode the annotated CSV response.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Influx` if the request fails, returns an error
    /// status, or the response carries an error table; `AppError::Parse` if
    /// the body cannot be decoded.
    pub async fn query_flux(&self, flux: &str) -> AppResult<Vec<FluxRecord>> {
        let body = json!({
            "query": flux,
            "type": "flux",
            "dialect": {
                "header": true,
                "annotations": ["datatype", "group", "default"],
                "delimiter": ",",
            },
        });

        let response = self
            .http_client
            .post(&self.query_url)
            .query(&[("org", self.organization.as_str())])
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
            .header(reqwest::header::ACCEPT, "application/csv")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Influx(format!("Request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::Influx("Rate limited (429)".to_string()));
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Influx(format!("HTTP {status}: {detail}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::Influx(format!("Failed to get response text: {e}")))?;

        parse_annotated_csv(&text).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse query response"
            );
        })
    }
}

impl ReadApi for InfluxClient {
    async fn query(&self, flux: &str) -> AppResult<Vec<FluxRecord>> {
        self.query_flux(flux).await
    }
}
