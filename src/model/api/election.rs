use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    db::election::{Candidate, Election, ElectionCore, ElectionId},
    mongodb::Id,
};

/// An instant accepted from a client: either unix epoch milliseconds or an
/// RFC 3339 string. Normalized to `DateTime<Utc>` during validation so that
/// an unparseable string surfaces as a validation error, not a framing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Text(String),
}

impl Timestamp {
    pub fn resolve(&self) -> Result<DateTime<Utc>> {
        match self {
            Self::Millis(ms) => Utc
                .timestamp_millis_opt(*ms)
                .single()
                .ok_or_else(|| Error::validation(format!("timestamp out of range: {ms}"))),
            Self::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| Error::validation(format!("unparseable timestamp: {text}"))),
        }
    }
}

/// A candidate specification within an election specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub manifesto: Option<String>,
}

impl CandidateSpec {
    /// Convert this spec into a candidate with the given within-election id.
    fn into_candidate(self, id: u32) -> Candidate {
        Candidate {
            id,
            name: self.name.trim().to_string(),
            description: self.description.unwrap_or_default(),
            party: self.party.unwrap_or_default(),
            manifesto: self.manifesto.unwrap_or_default(),
            votes: 0,
        }
    }
}

/// An election specification, received from an authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub total_seats: u32,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub eligibility: Option<String>,
    #[serde(default)]
    pub publish: Option<bool>,
    pub candidates: Vec<CandidateSpec>,
}

impl ElectionSpec {
    /// Validate this spec and convert it into a storable election created
    /// by the given user, with a freshly generated id and sequentially
    /// numbered candidates.
    pub fn into_election(self, created_by: Id) -> Result<Election> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::validation("title is required"));
        }
        if self.total_seats == 0 {
            return Err(Error::validation("total_seats must be positive"));
        }
        if self.candidates.is_empty() {
            return Err(Error::validation("at least one candidate is required"));
        }
        if self.candidates.iter().any(|c| c.name.trim().is_empty()) {
            return Err(Error::validation("candidate names are required"));
        }

        let start_time = self.start_time.resolve()?;
        let end_time = self.end_time.resolve()?;
        if start_time >= end_time {
            return Err(Error::validation(
                "start time must be strictly before end time",
            ));
        }

        let candidates = self
            .candidates
            .into_iter()
            .enumerate()
            .map(|(i, spec)| {
                // Sequence numbers start at 1 and follow submission order.
                let id = 1 + u32::try_from(i).expect("candidate count fits in u32");
                spec.into_candidate(id)
            })
            .collect();

        Ok(Election {
            id: ElectionId::generate(),
            election: ElectionCore {
                title,
                description: self.description.unwrap_or_default(),
                total_seats: self.total_seats,
                start_time,
                end_time,
                eligibility: self
                    .eligibility
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "all".to_string()),
                publish: self.publish.unwrap_or(false),
                created_by,
                created_at: Utc::now(),
                candidates,
            },
        })
    }
}

/// A summary of an election, as returned by the public listing: top-level
/// fields only, never candidate detail or vote counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub id: ElectionId,
    pub title: String,
    pub description: String,
    pub total_seats: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<Election> for ElectionSummary {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            title: election.election.title,
            description: election.election.description,
            total_seats: election.election.total_seats,
            start_time: election.election.start_time,
            end_time: election.election.end_time,
        }
    }
}

/// An API-friendly full election description, including candidates and
/// their current vote counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDescription {
    pub id: ElectionId,
    pub title: String,
    pub description: String,
    pub total_seats: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub eligibility: String,
    pub publish: bool,
    pub created_by: Id,
    pub created_at: DateTime<Utc>,
    pub candidates: Vec<Candidate>,
}

impl From<Election> for ElectionDescription {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            title: election.election.title,
            description: election.election.description,
            total_seats: election.election.total_seats,
            start_time: election.election.start_time,
            end_time: election.election.end_time,
            eligibility: election.election.eligibility,
            publish: election.election.publish,
            created_by: election.election.created_by,
            created_at: election.election.created_at,
            candidates: election.election.candidates,
        }
    }
}

/// A candidate as shown in the public roster: no vote counts, which belong
/// to the full election record only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub party: String,
    pub manifesto: String,
}

impl From<Candidate> for CandidateSummary {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            description: candidate.description,
            party: candidate.party,
            manifesto: candidate.manifesto,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CandidateSpec {
        pub fn example(name: &str) -> Self {
            Self {
                name: name.to_string(),
                description: Some(format!("{name} for president")),
                party: Some("Independent".to_string()),
                manifesto: None,
            }
        }
    }

    impl ElectionSpec {
        pub fn example() -> Self {
            Self {
                title: "Student Union Presidency".to_string(),
                description: Some("Annual SU election".to_string()),
                total_seats: 3,
                start_time: Timestamp::Text("2025-01-01T00:00:00Z".to_string()),
                end_time: Timestamp::Text("2025-02-01T00:00:00Z".to_string()),
                eligibility: None,
                publish: None,
                candidates: vec![
                    CandidateSpec::example("Alice"),
                    CandidateSpec::example("Bob"),
                    CandidateSpec::example("Carol"),
                ],
            }
        }
    }
}
