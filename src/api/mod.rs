//! Companion REST backend: place search, geocoding and review text analysis

pub mod client;

pub use client::{BackendClient, HealthStatus, ReviewAnalysis};
