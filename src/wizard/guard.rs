//! Step guard: decides whether a step may render or where to send the
//! admin instead.

use serde::Serialize;

use super::state::StepFlags;
use super::step::WizardStep;

/// Outcome of asking whether a step may be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<WizardStep>,
}

impl EntryDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            redirect_to: None,
        }
    }

    pub fn redirect(to: WizardStep) -> Self {
        Self {
            allowed: false,
            redirect_to: Some(to),
        }
    }

    /// The step the admin should actually see.
    pub fn target(&self, requested: WizardStep) -> WizardStep {
        self.redirect_to.unwrap_or(requested)
    }
}

/// Decide whether `step` may render given the current `flags`.
///
/// Allowed iff every earlier step is complete and `step` itself is not.
/// A missing prerequisite redirects back to the earliest missing one; an
/// already-completed step redirects forward to the first incomplete step.
/// With every flag set only the terminal step renders, since submitting it is
/// what resets the wizard.
pub fn can_enter(step: WizardStep, flags: &StepFlags) -> EntryDecision {
    if let Some(missing) = step
        .prerequisites()
        .iter()
        .copied()
        .find(|prereq| !flags.is_set(*prereq))
    {
        return EntryDecision::redirect(missing);
    }

    if !flags.is_set(step) {
        return EntryDecision::allow();
    }

    match flags.first_incomplete() {
        Some(next) => EntryDecision::redirect(next),
        None if step.is_terminal() => EntryDecision::allow(),
        None => EntryDecision::redirect(WizardStep::Services),
    }
}

/// The step a freshly loaded wizard should open on.
pub fn resume_step(flags: &StepFlags) -> WizardStep {
    let first = WizardStep::first();
    can_enter(first, flags).target(first)
}
