//! Client-side shaping of the review list for display
//!
//! Reviews are grouped into locations by proximity, then each location gets
//! rating averages, its most common tags and a merged summary. Nothing here
//! is persisted; callers regroup whenever the review list changes.

pub mod cluster;
pub mod summary;

pub use cluster::{group_reviews_by_location, is_nearby, LOCATION_THRESHOLD};
pub use summary::{
    aggregate_keywords, aggregate_summary, average_review_scores, average_scores, format_keywords,
    EMPTY_SUMMARY, MAX_KEYWORDS,
};

use crate::models::{KeywordCount, Location, LocationScores};
use serde::Serialize;

/// Everything the map shows for one location
#[derive(Debug, Clone, Serialize)]
pub struct LocationDigest {
    pub location: Location,
    pub scores: LocationScores,
    pub keywords: Vec<KeywordCount>,
    pub summary: String,
}

impl LocationDigest {
    pub fn from_location(location: Location) -> Self {
        let scores = average_scores(&location);
        let keywords = aggregate_keywords(&location.reviews);
        let summary = aggregate_summary(&location.reviews);
        Self {
            location,
            scores,
            keywords,
            summary,
        }
    }
}

/// Group `reviews` and digest every resulting location
pub fn digest_reviews(reviews: Vec<crate::models::Review>) -> Vec<LocationDigest> {
    group_reviews_by_location(reviews)
        .into_iter()
        .map(LocationDigest::from_location)
        .collect()
}
