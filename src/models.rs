use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A string that is not one of an enumerated column's literals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {kind} (expected one of: {expected})")]
pub struct UnknownLiteral {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

// Each enumerated column stores its literal spelling verbatim, so the same
// strings drive serde, the SQL CHECK constraint and the rusqlite conversions.
macro_rules! literal_enum {
    ($(#[$meta:meta])* $name:ident as $kind:literal { $($variant:ident => $lit:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $lit)] $variant),+
        }

        impl $name {
            pub const LITERALS: &'static [&'static str] = &[$($lit),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $lit),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLiteral;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($lit => Ok($name::$variant),)+
                    other => Err(UnknownLiteral {
                        kind: $kind,
                        value: other.to_string(),
                        expected: Self::LITERALS.join(", "),
                    }),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: UnknownLiteral| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

literal_enum! {
    /// How a listing's `wage` amount is expressed.
    WageInterval as "wage interval" {
        Hourly => "hourly",
        Yearly => "yearly",
    }
}

literal_enum! {
    LocationRequirement as "location requirement" {
        InOffice => "In-Office",
        Remote => "Remote",
        Hybrid => "Hybrid",
    }
}

literal_enum! {
    ExperienceLevel as "experience level" {
        Junior => "Junior",
        MidLevel => "Mid-level",
        Senior => "Senior",
    }
}

literal_enum! {
    /// Lifecycle of an on-platform listing. New rows start as `Draft`.
    JobListingStatus as "job listing status" {
        Draft => "Draft",
        Delisted => "De-listed",
        Published => "Published",
    }
}

literal_enum! {
    JobListingType as "job listing type" {
        FullTime => "Full-time",
        PartTime => "Part-time",
        Internship => "Internship",
    }
}

literal_enum! {
    QuestionType as "question type" {
        Behavioral => "Behavioral",
        Technical => "Technical",
        Situational => "Situational",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub id: String,
    pub organization_id: String,
    pub title: String,
    pub description: String,
    pub wage: Option<i64>,
    pub wage_interval: Option<WageInterval>,
    pub state_abbreviation: Option<String>,
    pub city: Option<String>,
    pub is_featured: bool,
    pub location_requirement: LocationRequirement,
    pub experience_level: ExperienceLevel,
    pub status: JobListingStatus,
    #[serde(rename = "type")]
    pub listing_type: JobListingType,
    pub posted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert payload for `job_listings`. `status` and `is_featured` fall back to
/// the column defaults when left as `None`.
#[derive(Debug, Clone)]
pub struct NewJobListing {
    pub organization_id: String,
    pub title: String,
    pub description: String,
    pub wage: Option<i64>,
    pub wage_interval: Option<WageInterval>,
    pub state_abbreviation: Option<String>,
    pub city: Option<String>,
    pub is_featured: Option<bool>,
    pub location_requirement: LocationRequirement,
    pub experience_level: ExperienceLevel,
    pub status: Option<JobListingStatus>,
    pub listing_type: JobListingType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedJob {
    pub id: String,
    pub title: String,
    pub company_name: String,
    pub description: String,
    pub wage: Option<String>, // free text, e.g. "$120,000 - $150,000 per year"
    pub location_requirement: String,
    pub experience_level: Option<String>,
    pub location: String,
    pub source_url: String,
    pub source_site: String,
    pub scraped_at: String,
    pub posted_at: Option<String>, // as printed by the source site
}

/// A job as produced by a scraper, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScrapedJob {
    pub title: String,
    pub company_name: String,
    pub description: String,
    pub wage: Option<String>,
    pub location_requirement: String,
    pub experience_level: Option<String>,
    pub location: String,
    pub source_url: String,
    pub source_site: String,
    pub posted_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJob {
    pub id: String,
    pub user_id: String,
    pub job_id: String,
    pub ai_match_score: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A saved job joined with the scraped posting it points at.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobDetail {
    pub saved: SavedJob,
    pub title: String,
    pub company_name: String,
    pub source_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCoverLetter {
    pub id: String,
    pub user_id: String,
    pub job_id: String,
    pub cover_letter: Option<String>, // None while generation is pending
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    pub id: String,
    pub user_id: String,
    pub job_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQnA {
    pub id: String,
    pub interview_session_id: String,
    pub question: String,
    pub answer: Option<String>,
    pub question_type: QuestionType,
    pub ai_feedback: String,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_round_trip_through_from_str() {
        for lit in ExperienceLevel::LITERALS {
            assert_eq!(lit.parse::<ExperienceLevel>().unwrap().as_str(), *lit);
        }
        assert_eq!("De-listed".parse::<JobListingStatus>().unwrap(), JobListingStatus::Delisted);
        assert_eq!("In-Office".parse::<LocationRequirement>().unwrap(), LocationRequirement::InOffice);
    }

    #[test]
    fn test_unknown_literal_is_rejected() {
        let err = "Mid".parse::<ExperienceLevel>().unwrap_err();
        assert_eq!(err.value, "Mid");
        assert!(err.to_string().contains("Junior, Mid-level, Senior"));

        // Literals are case-sensitive, matching the storage check
        assert!("draft".parse::<JobListingStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_storage_literals() {
        let json = serde_json::to_string(&JobListingType::FullTime).unwrap();
        assert_eq!(json, "\"Full-time\"");
        let back: QuestionType = serde_json::from_str("\"Situational\"").unwrap();
        assert_eq!(back, QuestionType::Situational);
    }
}
