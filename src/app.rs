//! Interactive page loop.
//!
//! Every page returns the [`Route`] to open next; the loop ends on
//! [`Route::Exit`] or when input runs out.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::dashboard::{Dashboard, DashboardView, MAX_MATCHES};
use crate::gateway::GrantGateway;
use crate::grant_detail::GrantDetail;
use crate::models::{IncomeLevel, PacketFormat, PacketRequest, Persona};
use crate::prompt::Prompt;
use crate::render::{render_dashboard, render_grant, render_receipt, render_wizard};
use crate::routes::Route;
use crate::store::IdentityStore;
use crate::wizard::{FieldEdit, Step, Wizard, WizardState};

pub struct App<'a, R, W> {
    gateway: &'a dyn GrantGateway,
    dashboard: Dashboard<'a>,
    store: &'a dyn IdentityStore,
    prompt: Prompt<R, W>,
    today: NaiveDate,
}

impl<'a, R: BufRead, W: Write> App<'a, R, W> {
    pub fn new(
        gateway: &'a dyn GrantGateway,
        store: &'a dyn IdentityStore,
        prompt: Prompt<R, W>,
    ) -> Self {
        Self {
            gateway,
            dashboard: Dashboard::new(gateway, store),
            store,
            prompt,
            today: Utc::now().date_naive(),
        }
    }

    pub async fn run(&mut self, start: Route) -> anyhow::Result<()> {
        let mut route = start;
        loop {
            info!(route = %route, "opening page");
            route = match route {
                Route::Exit => return Ok(()),
                Route::Onboarding => self.onboarding().await?,
                Route::Dashboard { profile_id } => self.dashboard_page(profile_id.as_deref()).await?,
                Route::GrantDetail {
                    grant_id,
                    profile_id,
                } => self.grant_page(&grant_id, profile_id.as_deref()).await?,
                Route::Packet {
                    profile_id,
                    grant_ids,
                } => self.packet_page(profile_id, grant_ids).await?,
            };
        }
    }

    async fn onboarding(&mut self) -> anyhow::Result<Route> {
        let mut wizard = Wizard::new();

        loop {
            self.prompt.say(&render_wizard(&wizard))?;
            let step = match wizard.state() {
                WizardState::Editing(step) => *step,
                WizardState::Done { profile_id } => {
                    return Ok(Route::dashboard(Some(profile_id.as_str())));
                }
                WizardState::Submitting => {
                    anyhow::bail!("profile submission left the wizard mid-flight")
                }
            };
            if !self.fill_step(&mut wizard, step)? {
                return Ok(Route::Exit);
            }

            let (actions, default) = match step {
                Step::PersonalInfo => ("[n] Next  [r] Start Over  [q] Quit", "n"),
                Step::LocationEducation => ("[n] Next  [b] Back  [r] Start Over  [q] Quit", "n"),
                Step::AdditionalInfo => ("[s] Complete Setup  [b] Back  [r] Start Over  [q] Quit", "s"),
            };
            let Some(choice) = self.prompt.line(actions)? else {
                return Ok(Route::Exit);
            };
            let choice = match choice.trim() {
                "" => default,
                other => other,
            };

            match choice {
                "n" => {
                    let _ = wizard.next();
                }
                "b" => {
                    let _ = wizard.back();
                }
                "s" => {
                    self.prompt.say("Creating profile...")?;
                    if let Err(err) = wizard.submit(self.gateway, self.store).await {
                        info!(error = %err, "profile submission did not complete");
                    }
                }
                "r" => wizard.start_over(),
                "q" => return Ok(Route::Exit),
                other => self.prompt.say(&format!("Unknown choice '{other}'"))?,
            }
        }
    }

    /// Collects the fields of one step. `false` means input ended.
    fn fill_step(&mut self, wizard: &mut Wizard, step: Step) -> io::Result<bool> {
        let draft = wizard.draft().clone();
        match step {
            Step::PersonalInfo => {
                let Some(name) = self.prompt.field("Full Name *", &draft.name)? else {
                    return Ok(false);
                };
                wizard.edit(FieldEdit::Name(name));
                let Some(email) = self.prompt.field("Email Address *", &draft.email)? else {
                    return Ok(false);
                };
                wizard.edit(FieldEdit::Email(email));
                let Some(persona) = self.choose::<Persona>(
                    "I am a... (student/researcher/entrepreneur)",
                    draft.persona.as_str(),
                )?
                else {
                    return Ok(false);
                };
                wizard.edit(FieldEdit::Persona(persona));
            }
            Step::LocationEducation => {
                let Some(region) = self.prompt.field("Region/State *", &draft.region)? else {
                    return Ok(false);
                };
                wizard.edit(FieldEdit::Region(region));
                let Some(gpa) = self
                    .prompt
                    .field("GPA (optional, - to clear)", &draft.gpa_input)?
                else {
                    return Ok(false);
                };
                let gpa = if gpa == "-" { String::new() } else { gpa };
                wizard.edit(FieldEdit::Gpa(gpa));
            }
            Step::AdditionalInfo => {
                let Some(level) = self.choose::<IncomeLevel>(
                    "Income Level (low/medium/high)",
                    draft.income_level.as_str(),
                )?
                else {
                    return Ok(false);
                };
                wizard.edit(FieldEdit::IncomeLevel(level));
                let Some(minority) = self
                    .prompt
                    .confirm("I identify as a minority", draft.is_minority)?
                else {
                    return Ok(false);
                };
                wizard.edit(FieldEdit::IsMinority(minority));
                let Some(disability) = self
                    .prompt
                    .confirm("I have a disability", draft.has_disability)?
                else {
                    return Ok(false);
                };
                wizard.edit(FieldEdit::HasDisability(disability));
            }
        }
        Ok(true)
    }

    fn choose<T>(&mut self, label: &str, current: &str) -> io::Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        loop {
            let Some(answer) = self.prompt.field(label, current)? else {
                return Ok(None);
            };
            match answer.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(err) => self.prompt.say(&err.to_string())?,
            }
        }
    }

    async fn dashboard_page(&mut self, navigation: Option<&str>) -> anyhow::Result<Route> {
        self.dashboard.load(navigation).await;

        loop {
            let view = self.dashboard.view();
            self.prompt.say(&render_dashboard(&view))?;

            let data = match view {
                DashboardView::Ready(data) => data,
                DashboardView::RedirectToOnboarding => return Ok(Route::Onboarding),
                failed => {
                    return match self.prompt.line("Choose")?.as_deref().map(str::trim) {
                        Some("s") | Some("") => Ok(failed.recovery().unwrap_or(Route::Onboarding)),
                        _ => Ok(Route::Exit),
                    };
                }
            };

            let Some(choice) = self
                .prompt
                .line("Choose a match, [p] packet, [o <id>] open profile, [q] quit")?
            else {
                return Ok(Route::Exit);
            };
            let choice = choice.trim();

            if let Ok(rank) = choice.parse::<usize>() {
                match rank.checked_sub(1).and_then(|index| data.matches.get(index)) {
                    Some(result) => return Ok(data.view_grant(&result.grant.id)),
                    None => self.prompt.say(&format!("There is no match #{rank}"))?,
                }
                continue;
            }

            match choice {
                "p" => match data.generate_packet() {
                    Some(route) => return Ok(route),
                    None => self.prompt.say("A packet needs at least one matched grant.")?,
                },
                "q" => return Ok(Route::Exit),
                other => match other.strip_prefix("o ") {
                    Some(id) => {
                        self.dashboard.navigate(Some(id.trim())).await;
                    }
                    None => self.prompt.say(&format!("Unknown choice '{other}'"))?,
                },
            }
        }
    }

    async fn grant_page(&mut self, grant_id: &str, profile_id: Option<&str>) -> anyhow::Result<Route> {
        let detail = GrantDetail::load(self.gateway, grant_id, profile_id).await;
        self.prompt.say(&render_grant(&detail, self.today))?;
        self.back_or_quit(detail.back())
    }

    async fn packet_page(
        &mut self,
        profile_id: String,
        grant_ids: Vec<String>,
    ) -> anyhow::Result<Route> {
        let back = Route::dashboard(Some(&profile_id));

        let grant_ids = if grant_ids.is_empty() {
            match self.gateway.refresh_matches(&profile_id, MAX_MATCHES).await {
                Ok(matches) => matches.into_iter().map(|result| result.grant.id).collect(),
                Err(err) => {
                    self.prompt.say(&format!("Error: {err}"))?;
                    return self.back_or_quit(back);
                }
            }
        } else {
            grant_ids
        };
        if grant_ids.is_empty() {
            self.prompt.say("A packet needs at least one matched grant.")?;
            return self.back_or_quit(back);
        }

        let Some(format) = self.choose::<PacketFormat>("Format (pdf/docx)", "pdf")? else {
            return Ok(Route::Exit);
        };
        let request = PacketRequest {
            profile_id,
            grant_ids,
            format,
        };
        match self.gateway.request_packet(&request).await {
            Ok(receipt) => self.prompt.say(&render_receipt(&receipt))?,
            Err(err) => self.prompt.say(&format!("Error: {err}"))?,
        }
        self.back_or_quit(back)
    }

    fn back_or_quit(&mut self, back: Route) -> anyhow::Result<Route> {
        loop {
            match self.prompt.line("[b] Back to Dashboard  [q] Quit")?.as_deref().map(str::trim) {
                Some("b") | Some("") => return Ok(back),
                None | Some("q") => return Ok(Route::Exit),
                Some(other) => self.prompt.say(&format!("Unknown choice '{other}'"))?,
            }
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.prompt.into_output()
    }
}
