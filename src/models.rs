use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    #[default]
    Student,
    Researcher,
    Entrepreneur,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Student, Persona::Researcher, Persona::Entrepreneur];

    pub fn as_str(self) -> &'static str {
        match self {
            Persona::Student => "student",
            Persona::Researcher => "researcher",
            Persona::Entrepreneur => "entrepreneur",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Persona::ALL
            .into_iter()
            .find(|persona| persona.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown persona '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl IncomeLevel {
    pub const ALL: [IncomeLevel; 3] = [IncomeLevel::Low, IncomeLevel::Medium, IncomeLevel::High];

    pub fn as_str(self) -> &'static str {
        match self {
            IncomeLevel::Low => "low",
            IncomeLevel::Medium => "medium",
            IncomeLevel::High => "high",
        }
    }
}

impl fmt::Display for IncomeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncomeLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        IncomeLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown income level '{value}'"))
    }
}

/// Profile fields as submitted for creation. The gateway assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub email: String,
    pub persona: Persona,
    pub region: String,
    pub gpa: Option<f64>,
    pub is_minority: bool,
    pub has_disability: bool,
    pub income_level: IncomeLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub persona: Persona,
    pub region: String,
    #[serde(default)]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub is_minority: bool,
    #[serde(default)]
    pub has_disability: bool,
    pub income_level: IncomeLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub amount: f64,
    pub deadline: String,
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub eligible_personas: Vec<String>,
    #[serde(default)]
    pub eligible_regions: Vec<String>,
    #[serde(default)]
    pub min_gpa: Option<f64>,
    #[serde(default)]
    pub income_requirements: Vec<String>,
    #[serde(default)]
    pub requires_minority: bool,
    #[serde(default)]
    pub requires_disability: bool,
}

impl Grant {
    /// Parses the deadline label when it is an ISO date.
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.deadline.trim(), "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    #[serde(default)]
    pub id: Option<String>,
    pub profile_id: String,
    pub grant_id: String,
    pub score: f64,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "match")]
    pub match_: Match,
    pub grant: Grant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketFormat {
    #[default]
    Pdf,
    Docx,
}

impl FromStr for PacketFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(PacketFormat::Pdf),
            "docx" => Ok(PacketFormat::Docx),
            other => Err(format!("unknown packet format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRequest {
    pub profile_id: String,
    pub grant_ids: Vec<String>,
    pub format: PacketFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketReceipt {
    pub message: String,
    pub filepath: String,
    pub format: PacketFormat,
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_payload_defaults_missing_eligibility() {
        let grant: Grant = serde_json::from_value(serde_json::json!({
            "id": "g1",
            "title": "STEM Excellence Grant",
            "organization": "Tech Foundation",
            "amount": 5000.0,
            "deadline": "2024-12-31",
            "description": "Grant for STEM students"
        }))
        .unwrap();

        assert!(grant.eligible_personas.is_empty());
        assert!(grant.income_requirements.is_empty());
        assert_eq!(grant.min_gpa, None);
        assert!(!grant.requires_minority);
        assert_eq!(grant.deadline_date(), NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn match_result_uses_match_key() {
        let result: MatchResult = serde_json::from_value(serde_json::json!({
            "match": {
                "profile_id": "p1",
                "grant_id": "g1",
                "score": 85.5,
                "explanation": "Matches your persona."
            },
            "grant": {
                "id": "g1",
                "title": "T",
                "organization": "O",
                "amount": 1.0,
                "deadline": "rolling",
                "description": "D"
            }
        }))
        .unwrap();

        assert_eq!(result.match_.score, 85.5);
        assert_eq!(result.grant.deadline_date(), None);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("Researcher".parse::<Persona>(), Ok(Persona::Researcher));
        assert_eq!(" low ".parse::<IncomeLevel>(), Ok(IncomeLevel::Low));
        assert!("teacher".parse::<Persona>().is_err());
        assert_eq!("DOCX".parse::<PacketFormat>(), Ok(PacketFormat::Docx));
    }
}
