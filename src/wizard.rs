//! Three-step onboarding form.
//!
//! Edits only touch the in-memory [`Draft`]. Each `next` checks the fields
//! owned by the step being left and nothing else; a later step never
//! re-validates earlier data. Submission is only reachable from the last
//! step, and a gateway failure drops the wizard back there with the draft
//! intact.

use tracing::{info, warn};

use crate::error::{SubmitError, ValidationError};
use crate::gateway::GrantGateway;
use crate::models::{IncomeLevel, NewProfile, Persona};
use crate::routes::Route;
use crate::store::{IdentityStore, PROFILE_ID_KEY};

pub const MIN_GPA: f64 = 0.0;
pub const MAX_GPA: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PersonalInfo,
    LocationEducation,
    AdditionalInfo,
}

impl Step {
    pub const COUNT: usize = 3;

    pub fn number(self) -> usize {
        match self {
            Step::PersonalInfo => 1,
            Step::LocationEducation => 2,
            Step::AdditionalInfo => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::PersonalInfo => "Personal Information",
            Step::LocationEducation => "Location & Education",
            Step::AdditionalInfo => "Additional Information",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardState {
    Editing(Step),
    Submitting,
    Done { profile_id: String },
}

impl WizardState {
    fn label(&self) -> &'static str {
        match self {
            WizardState::Editing(Step::PersonalInfo) => "step 1",
            WizardState::Editing(Step::LocationEducation) => "step 2",
            WizardState::Editing(Step::AdditionalInfo) => "step 3",
            WizardState::Submitting => "submitting",
            WizardState::Done { .. } => "done",
        }
    }
}

/// Uncommitted profile fields. The GPA is kept as typed so a bad value can
/// be reported rather than coerced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    pub name: String,
    pub email: String,
    pub persona: Persona,
    pub region: String,
    pub gpa_input: String,
    pub income_level: IncomeLevel,
    pub is_minority: bool,
    pub has_disability: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Name(String),
    Email(String),
    Persona(Persona),
    Region(String),
    Gpa(String),
    IncomeLevel(IncomeLevel),
    IsMinority(bool),
    HasDisability(bool),
}

pub fn validate_personal(name: &str, email: &str) -> Result<(), ValidationError> {
    if name.is_empty() || email.is_empty() {
        return Err(ValidationError::MissingPersonalInfo);
    }
    Ok(())
}

/// Empty input means no GPA. Anything else must be a finite decimal in
/// `[MIN_GPA, MAX_GPA]`.
pub fn parse_gpa(input: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::UnparseableGpa(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(ValidationError::UnparseableGpa(trimmed.to_string()));
    }
    if !(MIN_GPA..=MAX_GPA).contains(&value) {
        return Err(ValidationError::GpaOutOfRange(value));
    }
    Ok(Some(value))
}

pub fn validate_location(region: &str, gpa_input: &str) -> Result<Option<f64>, ValidationError> {
    if region.is_empty() {
        return Err(ValidationError::MissingRegion);
    }
    parse_gpa(gpa_input)
}

#[derive(Debug, Clone)]
pub struct Wizard {
    state: WizardState,
    draft: Draft,
    error: Option<String>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            state: WizardState::Editing(Step::PersonalInfo),
            draft: Draft::default(),
            error: None,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> Option<Step> {
        match self.state {
            WizardState::Editing(step) => Some(step),
            _ => None,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Message to show above the form, if the last action failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn edit(&mut self, edit: FieldEdit) {
        if self.step().is_none() {
            return;
        }

        let draft = &mut self.draft;
        match edit {
            FieldEdit::Name(value) => draft.name = value,
            FieldEdit::Email(value) => draft.email = value,
            FieldEdit::Persona(value) => draft.persona = value,
            FieldEdit::Region(value) => draft.region = value,
            FieldEdit::Gpa(value) => draft.gpa_input = value,
            FieldEdit::IncomeLevel(value) => draft.income_level = value,
            FieldEdit::IsMinority(value) => draft.is_minority = value,
            FieldEdit::HasDisability(value) => draft.has_disability = value,
        }
    }

    pub fn next(&mut self) -> Result<Step, ValidationError> {
        let outcome = match self.state {
            WizardState::Editing(Step::PersonalInfo) => {
                validate_personal(&self.draft.name, &self.draft.email)
                    .map(|_| Step::LocationEducation)
            }
            WizardState::Editing(Step::LocationEducation) => {
                validate_location(&self.draft.region, &self.draft.gpa_input)
                    .map(|_| Step::AdditionalInfo)
            }
            _ => Err(self.invalid("next")),
        };
        self.settle(outcome)
    }

    pub fn back(&mut self) -> Result<Step, ValidationError> {
        let outcome = match self.state {
            WizardState::Editing(Step::LocationEducation) => Ok(Step::PersonalInfo),
            WizardState::Editing(Step::AdditionalInfo) => Ok(Step::LocationEducation),
            _ => Err(self.invalid("back")),
        };
        self.settle(outcome)
    }

    fn invalid(&self, action: &'static str) -> ValidationError {
        ValidationError::InvalidTransition {
            action,
            step: self.state.label(),
        }
    }

    fn settle(&mut self, outcome: Result<Step, ValidationError>) -> Result<Step, ValidationError> {
        match &outcome {
            Ok(step) => {
                self.state = WizardState::Editing(*step);
                self.error = None;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
        outcome
    }

    /// Packages the draft as a creation request.
    pub fn request(&self) -> Result<NewProfile, ValidationError> {
        let draft = &self.draft;
        Ok(NewProfile {
            name: draft.name.clone(),
            email: draft.email.clone(),
            persona: draft.persona,
            region: draft.region.clone(),
            gpa: parse_gpa(&draft.gpa_input)?,
            is_minority: draft.is_minority,
            has_disability: draft.has_disability,
            income_level: draft.income_level,
        })
    }

    /// Creates the profile and records it as the active identifier.
    ///
    /// On success the draft is discarded and the returned route opens the
    /// dashboard for the new profile. On gateway failure the wizard is back
    /// on the last step with the gateway's message and the draft untouched.
    pub async fn submit(
        &mut self,
        gateway: &dyn GrantGateway,
        store: &dyn IdentityStore,
    ) -> Result<Route, SubmitError> {
        if self.state != WizardState::Editing(Step::AdditionalInfo) {
            let err = self.invalid("submit");
            self.error = Some(err.to_string());
            return Err(err.into());
        }

        let request = match self.request() {
            Ok(request) => request,
            Err(err) => {
                self.error = Some(err.to_string());
                return Err(err.into());
            }
        };

        self.state = WizardState::Submitting;
        self.error = None;

        match gateway.create_profile(&request).await {
            Ok(profile) => {
                info!(profile_id = %profile.id, "profile created");
                if let Err(err) = store.set(PROFILE_ID_KEY, &profile.id).await {
                    warn!(error = %err, "could not persist active profile id");
                }
                self.draft = Draft::default();
                self.state = WizardState::Done {
                    profile_id: profile.id.clone(),
                };
                Ok(Route::dashboard(Some(&profile.id)))
            }
            Err(err) => {
                warn!(error = %err, "profile creation failed");
                self.state = WizardState::Editing(Step::AdditionalInfo);
                self.error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Abandons the current draft entirely.
    pub fn start_over(&mut self) {
        *self = Self::new();
    }
}
