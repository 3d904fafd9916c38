pub mod errors;

pub use errors::{GatewayError, Result};
