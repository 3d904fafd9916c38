//! Contract interfaces for the review dApp
//!
//! The review contract is the primary surface. The token contract is optional;
//! without it only balance and token metadata queries are unavailable.
pub mod safety_review;
pub mod safety_token;

pub use safety_review::{SafetyReview, ReviewSubmittedFilter};
pub use safety_token::SafetyToken;

/// Raw review record as returned by `getAllReviews`
pub type OnchainReview = safety_review::Review;
