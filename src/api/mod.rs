//! Tour backend integration: the REST client, its payloads and retry policy.

pub mod client;
pub mod model;
pub mod retry;

pub use client::{HttpTourApi, TourApi};
pub use model::DraftTour;
pub use retry::RetryConfig;
