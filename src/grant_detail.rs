use chrono::NaiveDate;
use tracing::warn;

use crate::gateway::GrantGateway;
use crate::models::Grant;
use crate::routes::Route;

/// One eligibility line on the detail page. Criteria the grant does not
/// impose produce no entry at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement<'a> {
    Personas(&'a [String]),
    Regions(&'a [String]),
    MinGpa(f64),
    Income(&'a [String]),
    Minority,
    Disability,
}

pub fn requirements(grant: &Grant) -> Vec<Requirement<'_>> {
    let mut lines = Vec::new();
    if !grant.eligible_personas.is_empty() {
        lines.push(Requirement::Personas(&grant.eligible_personas));
    }
    if !grant.eligible_regions.is_empty() {
        lines.push(Requirement::Regions(&grant.eligible_regions));
    }
    if let Some(min_gpa) = grant.min_gpa {
        lines.push(Requirement::MinGpa(min_gpa));
    }
    if !grant.income_requirements.is_empty() {
        lines.push(Requirement::Income(&grant.income_requirements));
    }
    if grant.requires_minority {
        lines.push(Requirement::Minority);
    }
    if grant.requires_disability {
        lines.push(Requirement::Disability);
    }
    lines
}

pub fn application_url(grant: &Grant) -> Option<&str> {
    grant
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

/// Days until the deadline, negative once it has passed. `None` when the
/// deadline is not an ISO date.
pub fn days_remaining(grant: &Grant, today: NaiveDate) -> Option<i64> {
    grant
        .deadline_date()
        .map(|deadline| (deadline - today).num_days())
}

#[derive(Debug, Clone, PartialEq)]
pub enum GrantPage {
    Ready(Grant),
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrantDetail {
    pub profile_id: Option<String>,
    pub page: GrantPage,
}

impl GrantDetail {
    /// Fetches one grant. The profile id is only carried for the way back.
    pub async fn load(
        gateway: &dyn GrantGateway,
        grant_id: &str,
        profile_id: Option<&str>,
    ) -> Self {
        let page = match gateway.get_grant(grant_id).await {
            Ok(grant) => GrantPage::Ready(grant),
            Err(err) => {
                warn!(grant_id, error = %err, "grant load failed");
                GrantPage::Failed {
                    message: err.to_string(),
                }
            }
        };

        Self {
            profile_id: profile_id
                .filter(|id| !id.trim().is_empty())
                .map(str::to_string),
            page,
        }
    }

    pub fn back(&self) -> Route {
        Route::dashboard(self.profile_id.as_deref())
    }
}
