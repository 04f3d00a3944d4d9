//! Step forms and their required-field validation.
//!
//! Validation runs before anything is sent; failures come back as
//! per-field messages the host renders inline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::state::DestinationEntry;
use crate::error::FieldError;

/// Image for one day of the itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayImage {
    pub day: u32,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayImagesForm {
    pub images: Vec<DayImage>,
}

impl DayImagesForm {
    /// `days` is the draft tour's day count; images must fall within it.
    pub fn validate(&self, days: u32) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.images.is_empty() {
            errors.push(FieldError::new("images", "At least one day image is required"));
        }
        for (i, image) in self.images.iter().enumerate() {
            if image.url.trim().is_empty() {
                errors.push(FieldError::new(format!("images[{i}].url"), "Image is required"));
            }
            if image.day == 0 || (days > 0 && image.day > days) {
                errors.push(FieldError::new(
                    format!("images[{i}].day"),
                    format!("Day must be between 1 and {days}"),
                ));
            }
        }
        errors
    }
}

/// Destinations with their night allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationForm {
    pub entries: Vec<DestinationEntry>,
}

impl DestinationForm {
    pub fn validate(&self, max_nights: u32) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.entries.is_empty() {
            errors.push(FieldError::new("entries", "At least one destination is required"));
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.city.trim().is_empty() {
                errors.push(FieldError::new(format!("entries[{i}].city"), "City is required"));
            }
        }
        let total: u64 = self.entries.iter().map(|e| u64::from(e.nights)).sum();
        if total > u64::from(max_nights) {
            errors.push(FieldError::new(
                "entries",
                format!("{total} nights allocated but the tour only has {max_nights}"),
            ));
        }
        errors
    }
}

/// One price tier, e.g. "Adult" or "Child under 12".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub label: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricesForm {
    pub prices: Vec<PriceTier>,
}

impl PricesForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.prices.is_empty() {
            errors.push(FieldError::new("prices", "At least one price is required"));
        }
        for (i, tier) in self.prices.iter().enumerate() {
            if tier.label.trim().is_empty() {
                errors.push(FieldError::new(format!("prices[{i}].label"), "Label is required"));
            }
            if tier.amount.is_sign_negative() {
                errors.push(FieldError::new(
                    format!("prices[{i}].amount"),
                    "Amount cannot be negative",
                ));
            }
        }
        errors
    }
}

/// What the tour includes and excludes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesForm {
    pub included: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl ServicesForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.included.is_empty() {
            errors.push(FieldError::new("included", "At least one included service is required"));
        }
        for (field, items) in [("included", &self.included), ("excluded", &self.excluded)] {
            for (i, item) in items.iter().enumerate() {
                if item.trim().is_empty() {
                    errors.push(FieldError::new(format!("{field}[{i}]"), "Service cannot be blank"));
                }
            }
        }
        errors
    }
}
