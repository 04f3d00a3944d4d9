//! One admin's run through the wizard. The session resolves the draft tour,
//! holds the destination draft and submits each step.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::controller::WizardController;
use super::forms::{DayImagesForm, DestinationForm, PricesForm, ServicesForm};
use super::guard::{EntryDecision, can_enter, resume_step};
use super::nights::{allocate_nights_budget, entry_upper_bound};
use super::state::{DestinationEntry, DraftStatus, WizardState};
use super::step::WizardStep;
use crate::api::client::LAST_TOUR;
use crate::api::retry::{RetryConfig, with_backoff};
use crate::api::{DraftTour, TourApi};
use crate::error::{ApiError, FieldError, WizardError};

/// What happened after a successful submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Continue at `next`.
    Advanced { next: WizardStep },
    /// The terminal step went through; the wizard was reset and the admin
    /// goes back to the tour list.
    Completed,
}

/// Serializable view of the session for the host UI.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    #[serde(flatten)]
    pub state: WizardState,
    pub current_step: WizardStep,
    pub remaining_nights: u32,
}

/// A destination row together with the cap that applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationEdit {
    pub index: usize,
    pub entry: DestinationEntry,
    pub max_nights: u32,
    pub remaining_nights: u32,
}

pub struct WizardSession {
    controller: WizardController,
    api: Arc<dyn TourApi>,
    retry: RetryConfig,
    state: RwLock<WizardState>,
    /// Held for the whole of a submit; a second submit waits its turn.
    submit_lock: Mutex<()>,
}

impl WizardSession {
    /// Create a session, restoring persisted step flags.
    pub async fn open(
        controller: WizardController,
        api: Arc<dyn TourApi>,
        retry: RetryConfig,
    ) -> Result<Self, WizardError> {
        let step_flags = controller.load_flags().await?;
        info!(resume_at = %resume_step(&step_flags), "Wizard session opened");
        Ok(Self {
            controller,
            api,
            retry,
            state: RwLock::new(WizardState {
                step_flags,
                ..Default::default()
            }),
            submit_lock: Mutex::new(()),
        })
    }

    /// Resolve the draft tour, retrying transient failures.
    ///
    /// On failure the session moves to [`DraftStatus::Unavailable`]; calling
    /// this again retries from scratch.
    pub async fn load_draft(&self) -> DraftStatus {
        let api = Arc::clone(&self.api);
        let result = with_backoff(&self.retry, LAST_TOUR, || {
            let api = Arc::clone(&api);
            async move { api.last_tour().await }
        })
        .await;

        let mut state = self.state.write().await;
        match result {
            Ok(tour) => {
                apply_draft(&mut state, &tour);
                info!(
                    tour_id = tour.id,
                    nights_budget = state.max_nights_budget,
                    "Draft tour loaded"
                );
            }
            Err(e) => {
                warn!(error = %e, "Could not load draft tour");
                state.draft_status = DraftStatus::Unavailable {
                    reason: e.to_string(),
                };
            }
        }
        state.draft_status.clone()
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        let state = self.state.read().await.clone();
        WizardSnapshot {
            current_step: resume_step(&state.step_flags),
            remaining_nights: state.remaining_nights(),
            state,
        }
    }

    /// Whether `step` may render, re-reading the persisted flags first so
    /// changes from another client are picked up.
    pub async fn guard(&self, step: WizardStep) -> Result<EntryDecision, WizardError> {
        let flags = self.controller.load_flags().await?;
        let decision = can_enter(step, &flags);
        self.state.write().await.step_flags = flags;
        Ok(decision)
    }

    /// Resize the destination draft to `count` rows.
    pub async fn set_destination_count(
        &self,
        count: usize,
    ) -> Result<Vec<DestinationEntry>, WizardError> {
        self.ensure_enterable(WizardStep::Destination).await?;
        let mut state = self.state.write().await;
        state.resize_destinations(count);
        Ok(state.destination_draft.clone())
    }

    /// Edit one destination row. Nights are clamped so the draft never
    /// exceeds the budget.
    pub async fn edit_destination(
        &self,
        index: usize,
        city: Option<String>,
        raw_nights: Option<i64>,
    ) -> Result<DestinationEdit, WizardError> {
        self.ensure_enterable(WizardStep::Destination).await?;
        let mut state = self.state.write().await;
        if state.draft_status != DraftStatus::Loaded {
            return Err(WizardError::DraftNotLoaded);
        }
        let len = state.destination_draft.len();
        if index >= len {
            return Err(WizardError::DestinationOutOfRange { index, len });
        }

        let max_nights = entry_upper_bound(state.max_nights_budget, &state.destination_draft, index);
        if let Some(raw) = raw_nights {
            let clamped =
                allocate_nights_budget(state.max_nights_budget, &state.destination_draft, index, raw);
            state.destination_draft[index].nights = clamped;
        }
        if let Some(city) = city {
            state.destination_draft[index].city = city;
        }

        Ok(DestinationEdit {
            index,
            entry: state.destination_draft[index].clone(),
            max_nights,
            remaining_nights: state.remaining_nights(),
        })
    }

    /// Replace the whole destination draft, clamping rows in order.
    pub async fn replace_destinations(
        &self,
        entries: Vec<DestinationEntry>,
    ) -> Result<Vec<DestinationEntry>, WizardError> {
        self.ensure_enterable(WizardStep::Destination).await?;
        let mut state = self.state.write().await;
        if state.draft_status != DraftStatus::Loaded {
            return Err(WizardError::DraftNotLoaded);
        }
        state.destination_draft = entries;
        state.reclamp_destinations();
        Ok(state.destination_draft.clone())
    }

    pub async fn submit_day_images(
        &self,
        form: &DayImagesForm,
    ) -> Result<SubmitOutcome, WizardError> {
        self.submit(
            WizardStep::DayImages,
            |state| checked(form.validate(state.max_nights_budget)),
            |api, tour_id, ()| async move { api.store_day_images(tour_id, form).await },
        )
        .await
    }

    /// Submit the destination draft. `entries`, when given, replace the
    /// draft (clamped in order) once the step is known to be enterable.
    pub async fn submit_destinations(
        &self,
        entries: Option<Vec<DestinationEntry>>,
    ) -> Result<SubmitOutcome, WizardError> {
        self.submit(
            WizardStep::Destination,
            move |state| {
                if let Some(entries) = entries {
                    state.destination_draft = entries;
                    state.reclamp_destinations();
                }
                let form = DestinationForm {
                    entries: state.destination_draft.clone(),
                };
                checked(form.validate(state.max_nights_budget)).map(|()| form.entries)
            },
            |api, tour_id, entries| async move {
                api.store_destinations(tour_id, &entries).await
            },
        )
        .await
    }

    pub async fn submit_prices(&self, form: &PricesForm) -> Result<SubmitOutcome, WizardError> {
        self.submit(
            WizardStep::Prices,
            |_| checked(form.validate()),
            |api, tour_id, ()| async move { api.store_prices(tour_id, form).await },
        )
        .await
    }

    pub async fn submit_services(
        &self,
        form: &ServicesForm,
    ) -> Result<SubmitOutcome, WizardError> {
        self.submit(
            WizardStep::Services,
            |_| checked(form.validate()),
            |api, tour_id, ()| async move { api.store_services(tour_id, form).await },
        )
        .await
    }

    /// Clear every flag and draft.
    pub async fn reset(&self) -> Result<(), WizardError> {
        let _guard = self.submit_lock.lock().await;
        let mut state = self.state.write().await;
        self.controller.reset(&mut state.step_flags).await?;
        clear_draft(&mut state);
        Ok(())
    }

    async fn ensure_enterable(&self, step: WizardStep) -> Result<(), WizardError> {
        match self.guard(step).await?.redirect_to {
            Some(redirect_to) => Err(WizardError::StepLocked { step, redirect_to }),
            None => Ok(()),
        }
    }

    /// Guard, then `prepare` the payload against the locked state, send it,
    /// and mark the step complete. Nothing in the state changes before the
    /// guard passes.
    async fn submit<P, V, S, Fut>(
        &self,
        step: WizardStep,
        prepare: V,
        send: S,
    ) -> Result<SubmitOutcome, WizardError>
    where
        V: FnOnce(&mut WizardState) -> Result<P, Vec<FieldError>>,
        S: FnOnce(Arc<dyn TourApi>, u64, P) -> Fut,
        Fut: Future<Output = Result<(), ApiError>>,
    {
        let _guard = self.submit_lock.lock().await;
        self.ensure_enterable(step).await?;

        let (tour_id, payload) = {
            let mut state = self.state.write().await;
            let tour_id = match (&state.draft_status, state.active_tour_id) {
                (DraftStatus::Loaded, Some(id)) => id,
                _ => return Err(WizardError::DraftNotLoaded),
            };
            match prepare(&mut *state) {
                Ok(payload) => (tour_id, payload),
                Err(errors) => {
                    info!(step = %step, errors = errors.len(), "Step form failed validation");
                    return Err(WizardError::Validation { step, errors });
                }
            }
        };

        if let Err(source) = send(Arc::clone(&self.api), tour_id, payload).await {
            warn!(step = %step, tour_id, error = %source, "Step submission failed");
            return Err(WizardError::Submission { step, source });
        }

        let mut state = self.state.write().await;
        self.controller
            .mark_step_complete(&mut state.step_flags, step)
            .await?;

        if step.is_terminal() {
            self.controller.reset(&mut state.step_flags).await?;
            clear_draft(&mut state);
            info!(tour_id, "Tour wizard completed");
            return Ok(SubmitOutcome::Completed);
        }

        let next = resume_step(&state.step_flags);
        Ok(SubmitOutcome::Advanced { next })
    }
}

fn checked(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn apply_draft(state: &mut WizardState, tour: &DraftTour) {
    state.active_tour_id = Some(tour.id);
    state.max_nights_budget = tour.nights_budget();
    state.draft_status = DraftStatus::Loaded;
    state.reclamp_destinations();
}

fn clear_draft(state: &mut WizardState) {
    state.destination_draft.clear();
    state.active_tour_id = None;
    state.max_nights_budget = 0;
    state.draft_status = DraftStatus::NotLoaded;
}
