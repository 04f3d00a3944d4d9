//! Per-session wizard state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::nights::allocate_nights_budget;
use super::step::WizardStep;

/// Completion markers for each step.
///
/// A step missing from the map counts as not completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepFlags(BTreeMap<WizardStep, bool>);

impl StepFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags with exactly the given steps marked complete.
    pub fn completed<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = WizardStep>,
    {
        let mut flags = Self::new();
        for step in steps {
            flags.set(step, true);
        }
        flags
    }

    pub fn is_set(&self, step: WizardStep) -> bool {
        self.0.get(&step).copied().unwrap_or(false)
    }

    pub fn set(&mut self, step: WizardStep, done: bool) {
        self.0.insert(step, done);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Earliest step in wizard order whose flag is not set.
    pub fn first_incomplete(&self) -> Option<WizardStep> {
        WizardStep::ORDER.into_iter().find(|s| !self.is_set(*s))
    }

    pub fn all_complete(&self) -> bool {
        self.first_incomplete().is_none()
    }

    pub fn is_empty(&self) -> bool {
        !self.0.values().any(|done| *done)
    }
}

/// One destination row: a city and how many nights are spent there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationEntry {
    pub city: String,
    pub nights: u32,
}

impl DestinationEntry {
    pub fn new(city: impl Into<String>, nights: u32) -> Self {
        Self {
            city: city.into(),
            nights,
        }
    }
}

/// Whether the draft tour has been resolved from the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DraftStatus {
    #[default]
    NotLoaded,
    Loaded,
    /// The fetch failed after all retries; the host should show an error and
    /// offer a reload.
    Unavailable { reason: String },
}

/// Per-session wizard state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WizardState {
    pub step_flags: StepFlags,
    pub active_tour_id: Option<u64>,
    pub max_nights_budget: u32,
    pub destination_draft: Vec<DestinationEntry>,
    pub draft_status: DraftStatus,
}

impl WizardState {
    /// Total nights currently allocated across the destination draft.
    pub fn allocated_nights(&self) -> u32 {
        self.destination_draft.iter().map(|e| e.nights).sum()
    }

    /// Nights still available to distribute.
    pub fn remaining_nights(&self) -> u32 {
        self.max_nights_budget
            .saturating_sub(self.allocated_nights())
    }

    /// Resize the destination draft to `count` rows, keeping existing rows
    /// and padding with empty ones.
    pub fn resize_destinations(&mut self, count: usize) {
        self.destination_draft
            .resize_with(count, DestinationEntry::default);
    }

    /// Re-apply the nights cap in row order, as if the rows were entered one
    /// by one: each row is capped by the rows before it, so later rows give
    /// way first. Returns whether anything moved.
    pub fn reclamp_destinations(&mut self) -> bool {
        let entries = std::mem::take(&mut self.destination_draft);
        let mut changed = false;
        for mut entry in entries {
            let clamped = allocate_nights_budget(
                self.max_nights_budget,
                &self.destination_draft,
                self.destination_draft.len(),
                i64::from(entry.nights),
            );
            changed |= clamped != entry.nights;
            entry.nights = clamped;
            self.destination_draft.push(entry);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_flag_counts_as_incomplete() {
        let flags = StepFlags::new();
        assert!(!flags.is_set(WizardStep::Prices));
        assert_eq!(flags.first_incomplete(), Some(WizardStep::DayImages));
        assert!(flags.is_empty());
    }

    #[test]
    fn first_incomplete_skips_completed_prefix() {
        let flags = StepFlags::completed([WizardStep::DayImages, WizardStep::Destination]);
        assert_eq!(flags.first_incomplete(), Some(WizardStep::Prices));
        assert!(!flags.all_complete());
    }

    #[test]
    fn explicit_false_is_not_set() {
        let mut flags = StepFlags::completed([WizardStep::DayImages]);
        flags.set(WizardStep::Destination, false);
        assert_eq!(flags.first_incomplete(), Some(WizardStep::Destination));
    }

    #[test]
    fn flags_serialize_with_step_names() {
        let flags = StepFlags::completed([WizardStep::DayImages]);
        let json = serde_json::to_value(&flags).unwrap();
        assert_eq!(json, serde_json::json!({"day_images": true}));

        let parsed: StepFlags =
            serde_json::from_str(r#"{"day_images":true,"destination":false}"#).unwrap();
        assert!(parsed.is_set(WizardStep::DayImages));
        assert!(!parsed.is_set(WizardStep::Destination));
    }

    #[test]
    fn resize_keeps_existing_rows() {
        let mut state = WizardState {
            destination_draft: vec![DestinationEntry::new("Cairo", 3)],
            ..Default::default()
        };
        state.resize_destinations(3);
        assert_eq!(state.destination_draft.len(), 3);
        assert_eq!(state.destination_draft[0], DestinationEntry::new("Cairo", 3));
        assert_eq!(state.destination_draft[2], DestinationEntry::default());

        state.resize_destinations(0);
        assert!(state.destination_draft.is_empty());
    }

    #[test]
    fn remaining_nights_saturates() {
        let state = WizardState {
            max_nights_budget: 5,
            destination_draft: vec![
                DestinationEntry::new("Luxor", 4),
                DestinationEntry::new("Aswan", 3),
            ],
            ..Default::default()
        };
        assert_eq!(state.allocated_nights(), 7);
        assert_eq!(state.remaining_nights(), 0);
    }

    #[test]
    fn reclamp_restores_budget_invariant() {
        let mut state = WizardState {
            max_nights_budget: 5,
            destination_draft: vec![
                DestinationEntry::new("Luxor", 4),
                DestinationEntry::new("Aswan", 3),
            ],
            ..Default::default()
        };
        // Row 0 keeps its 4, row 1 gets what is left.
        assert!(state.reclamp_destinations());
        assert_eq!(state.allocated_nights(), 5);
        assert_eq!(state.destination_draft[0].nights, 4);
        assert_eq!(state.destination_draft[1].nights, 1);
        assert!(!state.reclamp_destinations());
    }

    #[test]
    fn reclamp_matches_entering_rows_in_order() {
        let mut state = WizardState {
            max_nights_budget: 10,
            destination_draft: vec![
                DestinationEntry::new("Rome", 7),
                DestinationEntry::new("Florence", 7),
                DestinationEntry::new("Venice", 2),
            ],
            ..Default::default()
        };

        let mut entered: Vec<DestinationEntry> = Vec::new();
        for entry in &state.destination_draft {
            let nights = allocate_nights_budget(10, &entered, entered.len(), i64::from(entry.nights));
            entered.push(DestinationEntry::new(entry.city.clone(), nights));
        }

        state.reclamp_destinations();
        assert_eq!(state.destination_draft, entered);
        let nights: Vec<u32> = state.destination_draft.iter().map(|e| e.nights).collect();
        assert_eq!(nights, vec![7, 3, 0]);
    }

    #[test]
    fn draft_status_serializes_tagged() {
        let status = DraftStatus::Unavailable {
            reason: "timeout".to_string(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "timeout");
    }
}
