//! Plain HTTP endpoints served outside the envelope pipeline.

pub mod health;
pub mod public_key;

pub use health::health_check;
pub use public_key::public_key;

use crate::keys::KeyRepository;
use crate::middleware::GatewayMetrics;
use std::sync::Arc;

/// State shared by the plain endpoints
#[derive(Clone)]
pub struct ApiState {
    pub keys: Arc<dyn KeyRepository>,
    pub metrics: Arc<GatewayMetrics>,
}
