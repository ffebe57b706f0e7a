use std::fmt::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dashboard::DashboardData;
use crate::grant_detail::days_remaining;
use crate::render::format_amount;

/// Column order of [`MatchRow`]; written up front so an empty export still
/// carries its header.
const MATCH_COLUMNS: [&str; 8] = [
    "rank",
    "grant_id",
    "title",
    "organization",
    "amount",
    "deadline",
    "score",
    "explanation",
];

#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    rank: usize,
    grant_id: &'a str,
    title: &'a str,
    organization: &'a str,
    amount: f64,
    deadline: &'a str,
    score: f64,
    explanation: &'a str,
}

/// Total award value across the ranked matches.
pub fn total_amount(data: &DashboardData) -> f64 {
    data.matches.iter().map(|result| result.grant.amount).sum()
}

pub fn build_report(data: &DashboardData, today: NaiveDate) -> String {
    let mut output = String::new();
    let profile = &data.profile;

    let _ = writeln!(output, "# Grant Match Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}) on {}",
        profile.name, profile.email, today
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Profile");
    let _ = writeln!(output, "- Persona: {}", profile.persona);
    let _ = writeln!(output, "- Region: {}", profile.region);
    if let Some(gpa) = profile.gpa {
        let _ = writeln!(output, "- GPA: {gpa:.2}");
    }
    let _ = writeln!(output, "- Income level: {}", profile.income_level);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Ranked Matches");

    if data.matches.is_empty() {
        let _ = writeln!(output, "No grants match this profile at this time.");
        return output;
    }

    for (rank, result) in data.ranked() {
        let grant = &result.grant;
        let deadline = match days_remaining(grant, today) {
            Some(days) if days < 0 => format!("{} (closed)", grant.deadline),
            Some(days) => format!("{} ({days} days left)", grant.deadline),
            None => grant.deadline.clone(),
        };
        let _ = writeln!(
            output,
            "{}. **{}** ({}) {} due {}, match {:.0}%",
            rank,
            grant.title,
            grant.organization,
            format_amount(grant.amount),
            deadline,
            result.match_.score
        );
        let _ = writeln!(output, "   - {}", result.match_.explanation);
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Combined award value: {}",
        format_amount(total_amount(data))
    );

    output
}

pub fn export_csv(data: &DashboardData, path: &Path) -> anyhow::Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(MATCH_COLUMNS)?;

    for (rank, result) in data.ranked() {
        writer.serialize(MatchRow {
            rank,
            grant_id: &result.grant.id,
            title: &result.grant.title,
            organization: &result.grant.organization,
            amount: result.grant.amount,
            deadline: &result.grant.deadline,
            score: result.match_.score,
            explanation: &result.match_.explanation,
        })?;
    }

    writer.flush()?;
    Ok(data.matches.len())
}
