//! Flag persistence around the pure step table.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::guard::{EntryDecision, can_enter};
use super::state::StepFlags;
use super::step::WizardStep;
use crate::error::StorageError;
use crate::store::FlagStore;

/// Default lifetime of a persisted step flag.
pub const DEFAULT_FLAG_TTL: Duration = Duration::from_secs(60 * 24 * 60 * 60);

/// Reads and writes step flags through an injected [`FlagStore`].
pub struct WizardController {
    store: Arc<dyn FlagStore>,
    flag_ttl: Duration,
}

impl WizardController {
    pub fn new(store: Arc<dyn FlagStore>, flag_ttl: Duration) -> Self {
        Self { store, flag_ttl }
    }

    /// Load every step flag from the store.
    pub async fn load_flags(&self) -> Result<StepFlags, StorageError> {
        let mut flags = StepFlags::new();
        for step in WizardStep::ORDER {
            let done = self
                .store
                .get(&step.flag_key())
                .await?
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            flags.set(step, done);
        }
        debug!(?flags, "Loaded wizard flags");
        Ok(flags)
    }

    /// Guard decision for `step` against the persisted flags.
    pub async fn can_enter(&self, step: WizardStep) -> Result<EntryDecision, StorageError> {
        let flags = self.load_flags().await?;
        Ok(can_enter(step, &flags))
    }

    /// Set `step`'s flag and persist it with the configured TTL.
    pub async fn mark_step_complete(
        &self,
        flags: &mut StepFlags,
        step: WizardStep,
    ) -> Result<(), StorageError> {
        self.store
            .set(&step.flag_key(), &serde_json::json!(true), Some(self.flag_ttl))
            .await?;
        flags.set(step, true);
        info!(step = %step, "Wizard step completed");
        Ok(())
    }

    /// Remove every persisted flag and clear `flags`.
    pub async fn reset(&self, flags: &mut StepFlags) -> Result<(), StorageError> {
        for step in WizardStep::ORDER {
            self.store.remove(&step.flag_key()).await?;
        }
        flags.clear();
        info!("Wizard reset");
        Ok(())
    }
}
