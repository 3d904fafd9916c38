use serde::{Deserialize, Serialize};

/// A safety review as displayed, with coordinates in decimal degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    /// Id stored by the contract, absent when the record carried none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub province: String,
    pub city: String,
    pub district: String,
    pub night_lighting: u8,
    pub security_status: u8,
    pub female_density: u8,
    pub overall_safety: u8,
    pub text_review: String,
    pub ai_summary: String,
    /// Comma separated tags
    pub keywords: String,
    pub submitter: String,
    /// Unix time in milliseconds
    pub timestamp: u64,
}

impl Review {
    /// Id for records the contract returned without one.
    ///
    /// Built from submitter, timestamp, position in the batch and raw
    /// coordinates. Collisions are unlikely but not ruled out.
    pub fn synthetic_id(
        submitter: &str,
        timestamp_secs: u64,
        index: usize,
        raw_lat: i64,
        raw_lng: i64,
    ) -> String {
        let submitter = if submitter.is_empty() { "unknown" } else { submitter };
        format!("review-{submitter}-{timestamp_secs}-{index}-{raw_lat}-{raw_lng}")
    }
}

/// Fields the user fills in before a review is sent to the contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub night_lighting: u8,
    #[serde(default)]
    pub security_status: u8,
    #[serde(default)]
    pub female_density: u8,
    #[serde(default)]
    pub overall_safety: u8,
    #[serde(default)]
    pub text_review: String,
    #[serde(default)]
    pub ai_summary: String,
    #[serde(default)]
    pub keywords: String,
}
