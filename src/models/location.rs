use super::review::Review;
use serde::{Deserialize, Serialize};

/// Reviews that sit close to the same spot, seeded by the first one added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub reviews: Vec<Review>,
}

impl Location {
    pub const UNKNOWN_ADDRESS: &'static str = "Unknown address";

    pub fn seeded_by(review: Review) -> Self {
        let address = if review.address.is_empty() {
            Self::UNKNOWN_ADDRESS.to_string()
        } else {
            review.address.clone()
        };
        Self {
            id: format!("location-{}-{}", review.latitude, review.longitude),
            latitude: review.latitude,
            longitude: review.longitude,
            address,
            reviews: vec![review],
        }
    }

    /// The review every proximity test is measured against
    pub fn seed(&self) -> &Review {
        &self.reviews[0]
    }
}

/// Per-location rating means, each to one decimal place
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationScores {
    pub night_lighting: f64,
    pub security_status: f64,
    pub female_density: f64,
    pub overall_safety: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}
