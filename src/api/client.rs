//! Tour backend client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;

use super::model::{
    DayImagesRequest, DestinationsRequest, DraftTour, LastTourResponse, PricesRequest,
    ServicesRequest,
};
use crate::auth::TokenStore;
use crate::error::ApiError;
use crate::wizard::forms::{DayImagesForm, PricesForm, ServicesForm};
use crate::wizard::state::DestinationEntry;

pub const LAST_TOUR: &str = "/last-tour";
pub const DAY_IMAGES_STORE: &str = "/day-images/store";
pub const DESTINATIONS_STORE: &str = "/destinations/store";
pub const TOUR_PRICES: &str = "/tour-prices";
pub const SERVICES_STORE: &str = "/services/store";

/// Operations the wizard needs from the tour backend.
#[async_trait]
pub trait TourApi: Send + Sync {
    /// Resolve the draft tour currently being built.
    async fn last_tour(&self) -> Result<DraftTour, ApiError>;

    async fn store_day_images(&self, tour_id: u64, form: &DayImagesForm) -> Result<(), ApiError>;

    async fn store_destinations(
        &self,
        tour_id: u64,
        entries: &[DestinationEntry],
    ) -> Result<(), ApiError>;

    async fn store_prices(&self, tour_id: u64, form: &PricesForm) -> Result<(), ApiError>;

    async fn store_services(&self, tour_id: u64, form: &ServicesForm) -> Result<(), ApiError>;
}

/// reqwest-backed [`TourApi`].
pub struct HttpTourApi {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl HttpTourApi {
    pub fn new(
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport {
                endpoint: base_url.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    async fn bearer(&self) -> Result<String, ApiError> {
        self.tokens
            .get_token()
            .await
            .map(|t| t.expose_secret().to_string())
            .ok_or(ApiError::Unauthenticated)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let token = self.bearer().await?;
        let resp = request
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(endpoint, status = status.as_u16(), "Backend returned error status");
        Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn post<B: Serialize + Sync>(&self, endpoint: &str, body: &B) -> Result<(), ApiError> {
        let request = self.client.post(self.url(endpoint)).json(body);
        self.send(endpoint, request).await?;
        tracing::debug!(endpoint, "Backend accepted submission");
        Ok(())
    }
}

#[async_trait]
impl TourApi for HttpTourApi {
    async fn last_tour(&self) -> Result<DraftTour, ApiError> {
        let request = self.client.get(self.url(LAST_TOUR));
        let resp = match self.send(LAST_TOUR, request).await {
            Err(ApiError::Status { status: 404, .. }) => return Err(ApiError::NoDraft),
            other => other?,
        };
        let parsed: LastTourResponse =
            resp.json().await.map_err(|e| ApiError::InvalidResponse {
                endpoint: LAST_TOUR.to_string(),
                reason: e.to_string(),
            })?;
        Ok(parsed.into())
    }

    async fn store_day_images(&self, tour_id: u64, form: &DayImagesForm) -> Result<(), ApiError> {
        self.post(
            DAY_IMAGES_STORE,
            &DayImagesRequest {
                tour_id,
                images: &form.images,
            },
        )
        .await
    }

    async fn store_destinations(
        &self,
        tour_id: u64,
        entries: &[DestinationEntry],
    ) -> Result<(), ApiError> {
        self.post(
            DESTINATIONS_STORE,
            &DestinationsRequest {
                tour_id,
                destinations: entries,
            },
        )
        .await
    }

    async fn store_prices(&self, tour_id: u64, form: &PricesForm) -> Result<(), ApiError> {
        self.post(
            TOUR_PRICES,
            &PricesRequest {
                tour_id,
                prices: &form.prices,
            },
        )
        .await
    }

    async fn store_services(&self, tour_id: u64, form: &ServicesForm) -> Result<(), ApiError> {
        self.post(
            SERVICES_STORE,
            &ServicesRequest {
                tour_id,
                included: &form.included,
                excluded: &form.excluded,
            },
        )
        .await
    }
}
