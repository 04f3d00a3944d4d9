//! Tour-creation wizard.
//!
//! An admin builds a draft tour in four ordered steps: day images,
//! destinations, prices, services. Completion of each step is persisted as a
//! flag with a TTL so a reload resumes at the first unfinished step, and a
//! step can only be entered once every earlier step is done.

pub mod controller;
pub mod forms;
pub mod guard;
pub mod nights;
pub mod session;
pub mod state;
pub mod step;

pub use controller::WizardController;
pub use forms::{DayImage, DayImagesForm, DestinationForm, PriceTier, PricesForm, ServicesForm};
pub use guard::{EntryDecision, can_enter, resume_step};
pub use nights::allocate_nights_budget;
pub use session::{DestinationEdit, SubmitOutcome, WizardSession, WizardSnapshot};
pub use state::{DestinationEntry, DraftStatus, StepFlags, WizardState};
pub use step::WizardStep;
