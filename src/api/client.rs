use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::BackendConfig;
use crate::utils::{GatewayError, Result};

/// Client for the geocoding and review-analysis backend
pub struct BackendClient {
    client: Client,
    base_url: String,
}

/// Response from `/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub baidu_map_configured: bool,
    #[serde(default)]
    pub deepseek_configured: bool,
}

/// Summary and tags suggested for a review text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewAnalysis {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ReviewAnalysis {
    /// Tags in the comma separated form the contract stores
    pub fn keywords_csv(&self) -> String {
        self.keywords.join(",")
    }
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let url = self.endpoint(path);
        tracing::debug!("POST {}", url);

        let response = self.client.post(&url).json(&body).send().await?;
        read_json(response).await
    }

    /// Places matching `query`, optionally scoped to a region or near a point
    pub async fn search_location(
        &self,
        query: &str,
        region: Option<&str>,
        location: Option<&str>,
    ) -> Result<Value> {
        self.post(
            "search_location",
            json!({ "query": query, "region": region, "location": location }),
        )
        .await
    }

    /// Address to coordinates
    pub async fn geocoding(&self, address: &str) -> Result<Value> {
        self.post("geocoding", json!({ "address": address })).await
    }

    /// Coordinates to address
    pub async fn reverse_geocoding(&self, latitude: f64, longitude: f64) -> Result<Value> {
        self.post(
            "reverse_geocoding",
            json!({ "latitude": latitude, "longitude": longitude }),
        )
        .await
    }

    pub async fn get_current_location(&self, latitude: f64, longitude: f64) -> Result<Value> {
        self.post(
            "get_current_location",
            json!({ "latitude": latitude, "longitude": longitude }),
        )
        .await
    }

    pub async fn analyze_review(&self, text_review: &str) -> Result<ReviewAnalysis> {
        let body = self
            .post("analyze_review", json!({ "text_review": text_review }))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint("health");
        let response = self.client.get(&url).send().await?;
        let body = read_json(response).await?;
        Ok(serde_json::from_value(body)?)
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().await?;

    if !status.is_success() {
        return Err(GatewayError::Backend(error_message(status.as_u16(), &body)));
    }
    Ok(body)
}

fn error_message(status: u16, body: &Value) -> String {
    let detail = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("request failed");
    format!("{} {}", status, detail)
}
