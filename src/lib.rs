pub mod config;
pub mod coordinates;
pub mod aggregation;
pub mod contracts;
pub mod core;
pub mod models;
pub mod blockchain;
pub mod api;
pub mod utils;

pub use crate::core::{BlockchainGateway, ReviewSubscription, SignerProvider, SignerSession};
pub use models::{Location, LocationScores, KeywordCount, Review, ReviewInput};
pub use utils::{GatewayError, Result};
