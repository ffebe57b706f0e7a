use std::fmt::Write;

use chrono::NaiveDate;

use crate::dashboard::DashboardView;
use crate::grant_detail::{
    application_url, days_remaining, requirements, GrantDetail, GrantPage, Requirement,
};
use crate::models::PacketReceipt;
use crate::wizard::{Step, Wizard, WizardState};

/// Formats a currency amount with thousands separators, e.g. `$12,500`.
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, fraction) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    if fraction == 0 {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{fraction:02}")
    }
}

pub fn render_wizard(wizard: &Wizard) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Create Your Profile");

    let step = match wizard.state() {
        WizardState::Editing(step) => *step,
        WizardState::Submitting => {
            let _ = writeln!(output, "Creating profile...");
            return output;
        }
        WizardState::Done { profile_id } => {
            let _ = writeln!(output, "Profile {profile_id} created.");
            return output;
        }
    };

    let filled = step.number() * 10 / Step::COUNT;
    let _ = writeln!(
        output,
        "[{}{}] Step {} of {}",
        "#".repeat(filled),
        "-".repeat(10 - filled),
        step.number(),
        Step::COUNT
    );
    if let Some(error) = wizard.error() {
        let _ = writeln!(output, "! {error}");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## {}", step.title());

    let draft = wizard.draft();
    match step {
        Step::PersonalInfo => {
            let _ = writeln!(output, "Full Name *: {}", draft.name);
            let _ = writeln!(output, "Email Address *: {}", draft.email);
            let _ = writeln!(output, "I am a... *: {}", draft.persona);
        }
        Step::LocationEducation => {
            let _ = writeln!(output, "Region/State *: {}", draft.region);
            let _ = writeln!(output, "GPA (optional): {}", draft.gpa_input);
        }
        Step::AdditionalInfo => {
            let _ = writeln!(output, "Income Level *: {}", draft.income_level);
            let _ = writeln!(output, "I identify as a minority: {}", yes_no(draft.is_minority));
            let _ = writeln!(output, "I have a disability: {}", yes_no(draft.has_disability));
        }
    }

    output
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let mut output = String::new();

    let data = match view {
        DashboardView::Loading => {
            let _ = writeln!(output, "Loading your dashboard...");
            return output;
        }
        DashboardView::RedirectToOnboarding => {
            let _ = writeln!(output, "No profile yet. Let's create one.");
            return output;
        }
        DashboardView::Failed { message } => {
            let _ = writeln!(output, "Error: {message}");
            let _ = writeln!(output, "[s] Start Over");
            return output;
        }
        DashboardView::Ready(data) => data,
    };

    let profile = &data.profile;
    let _ = writeln!(output, "Welcome, {}!", profile.name);
    let _ = writeln!(output, "Here are your top grant matches");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Your Profile");
    let _ = writeln!(output, "Persona: {}", profile.persona);
    let _ = writeln!(output, "Region: {}", profile.region);
    if let Some(gpa) = profile.gpa {
        let _ = writeln!(output, "GPA: {gpa}");
    }
    let _ = writeln!(output, "Income Level: {}", profile.income_level);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Top {} Grant Matches", data.matches.len());

    if data.matches.is_empty() {
        let _ = writeln!(output, "No grants match your profile at this time.");
        let _ = writeln!(output, "Check back later for new opportunities!");
        return output;
    }

    for (rank, result) in data.ranked() {
        let grant = &result.grant;
        let _ = writeln!(output);
        let _ = writeln!(output, "#{rank}  Match: {:.0}%", result.match_.score);
        let _ = writeln!(output, "{}", grant.title);
        let _ = writeln!(
            output,
            "{} | {} | Deadline: {}",
            grant.organization,
            format_amount(grant.amount),
            grant.deadline
        );
        let _ = writeln!(output, "{}", grant.description);
        let _ = writeln!(output, "Why this matches: {}", result.match_.explanation);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "[1-{}] View Details", data.matches.len());
    let _ = writeln!(output, "[p] Generate Application Packet");
    output
}

pub fn render_grant(detail: &GrantDetail, today: NaiveDate) -> String {
    let mut output = String::new();

    let grant = match &detail.page {
        GrantPage::Failed { message } => {
            let _ = writeln!(output, "Error: {message}");
            let _ = writeln!(output, "[b] Back to Dashboard");
            return output;
        }
        GrantPage::Ready(grant) => grant,
    };

    let _ = writeln!(output, "# {}  {}", grant.title, format_amount(grant.amount));
    let _ = writeln!(output, "Organization: {}", grant.organization);
    match days_remaining(grant, today) {
        Some(days) if days < 0 => {
            let _ = writeln!(output, "Application Deadline: {} (closed)", grant.deadline);
        }
        Some(days) => {
            let _ = writeln!(
                output,
                "Application Deadline: {} ({days} days left)",
                grant.deadline
            );
        }
        None => {
            let _ = writeln!(output, "Application Deadline: {}", grant.deadline);
        }
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Description");
    let _ = writeln!(output, "{}", grant.description);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Eligibility Requirements");

    for requirement in requirements(grant) {
        let _ = match requirement {
            Requirement::Personas(values) => {
                writeln!(output, "Eligible Personas: {}", values.join(", "))
            }
            Requirement::Regions(values) => {
                writeln!(output, "Eligible Regions: {}", values.join(", "))
            }
            Requirement::MinGpa(value) => writeln!(output, "Minimum GPA: {value}"),
            Requirement::Income(values) => {
                writeln!(output, "Income Requirements: {}", values.join(", "))
            }
            Requirement::Minority => writeln!(output, "Requires Minority Status: Yes"),
            Requirement::Disability => writeln!(output, "Requires Disability Status: Yes"),
        };
    }

    if let Some(url) = application_url(grant) {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Application");
        let _ = writeln!(output, "Visit Application Website: {url}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "[b] Back to Dashboard");
    output
}

pub fn render_receipt(receipt: &PacketReceipt) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", receipt.message);
    let _ = writeln!(output, "File: {}", receipt.filepath);
    let _ = writeln!(output, "Download: {}", receipt.download_url);
    output
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
