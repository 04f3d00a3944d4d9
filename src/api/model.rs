//! Backend request and response shapes.

use serde::{Deserialize, Serialize};

use crate::wizard::forms::{DayImage, PriceTier};
use crate::wizard::state::DestinationEntry;

/// The most recently created, not-yet-finalized tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftTour {
    pub id: u64,
    #[serde(default, alias = "name")]
    pub title: String,
    /// Configured length of the tour in days.
    #[serde(alias = "duration")]
    pub days: u32,
}

impl DraftTour {
    /// Nights available to spread across destinations.
    pub fn nights_budget(&self) -> u32 {
        self.days
    }
}

/// `GET /last-tour` answers either with the tour itself or wrapped in a
/// `data` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LastTourResponse {
    Wrapped { data: DraftTour },
    Bare(DraftTour),
}

impl From<LastTourResponse> for DraftTour {
    fn from(resp: LastTourResponse) -> Self {
        match resp {
            LastTourResponse::Wrapped { data } => data,
            LastTourResponse::Bare(tour) => tour,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DayImagesRequest<'a> {
    pub tour_id: u64,
    pub images: &'a [DayImage],
}

#[derive(Debug, Serialize)]
pub(crate) struct DestinationsRequest<'a> {
    pub tour_id: u64,
    pub destinations: &'a [DestinationEntry],
}

#[derive(Debug, Serialize)]
pub(crate) struct PricesRequest<'a> {
    pub tour_id: u64,
    pub prices: &'a [PriceTier],
}

#[derive(Debug, Serialize)]
pub(crate) struct ServicesRequest<'a> {
    pub tour_id: u64,
    pub included: &'a [String],
    pub excluded: &'a [String],
}
