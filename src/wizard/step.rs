//! Wizard steps and their fixed ordering.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WizardError;

/// One screen of the tour-creation wizard.
///
/// Progresses linearly: DayImages → Destination → Prices → Services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    DayImages,
    Destination,
    Prices,
    Services,
}

impl WizardStep {
    /// All steps in wizard order.
    pub const ORDER: [WizardStep; 4] = [
        WizardStep::DayImages,
        WizardStep::Destination,
        WizardStep::Prices,
        WizardStep::Services,
    ];

    /// Position of this step in [`WizardStep::ORDER`].
    pub fn index(&self) -> usize {
        match self {
            Self::DayImages => 0,
            Self::Destination => 1,
            Self::Prices => 2,
            Self::Services => 3,
        }
    }

    pub fn first() -> WizardStep {
        Self::ORDER[0]
    }

    /// The step that follows this one, if any.
    pub fn next(&self) -> Option<WizardStep> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<WizardStep> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }

    /// Steps strictly before this one.
    pub fn prerequisites(&self) -> &'static [WizardStep] {
        &Self::ORDER[..self.index()]
    }

    /// Whether completing this step finishes the wizard.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Services)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DayImages => "day_images",
            Self::Destination => "destination",
            Self::Prices => "prices",
            Self::Services => "services",
        }
    }

    /// Key under which this step's completion flag is persisted.
    pub fn flag_key(&self) -> String {
        format!("wizard.{}", self.as_str())
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| WizardError::UnknownStep(s.to_string()))
    }
}
