use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime, Document};
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::mongodb::Id;

/// Length of an election's short identifier.
pub const ELECTION_ID_LENGTH: usize = 10;

/// How many times we try to allocate a fresh election id before giving up.
/// Collisions are detected by the unique `_id` index on insert; this bound
/// is a probabilistic-uniqueness tradeoff, not a hard guarantee.
pub const ELECTION_ID_ATTEMPTS: usize = 6;

/// An election's unique short identifier: a UUID truncated to
/// [`ELECTION_ID_LENGTH`] lowercase hex characters.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElectionId(String);

impl ElectionId {
    /// Generate a fresh candidate id. Uniqueness is only established once
    /// the registry accepts the insert.
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(uuid[..ELECTION_ID_LENGTH].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A filter document matching exactly this election.
    pub fn as_doc(&self) -> Document {
        doc! { "_id": &self.0 }
    }
}

impl std::fmt::Display for ElectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'a> FromParam<'a> for ElectionId {
    type Error = &'a str;

    /// Accept only well-shaped ids; anything else falls through to 404.
    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        if param.len() == ELECTION_ID_LENGTH
            && param.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        {
            Ok(Self(param.to_string()))
        } else {
            Err(param)
        }
    }
}

/// A single candidate standing in an election. Owned exclusively by its
/// election; it cannot outlive it.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique within the election: a 1-based sequence number in submission order.
    pub id: u32,
    /// Candidate name.
    pub name: String,
    /// Candidate description.
    #[serde(default)]
    pub description: String,
    /// Party affiliation.
    #[serde(default)]
    pub party: String,
    /// Candidate manifesto.
    #[serde(default)]
    pub manifesto: String,
    /// Vote counter. Nothing increments this here; vote casting is handled
    /// elsewhere.
    pub votes: u64,
}

/// Core election data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ElectionCore {
    /// Election title.
    pub title: String,
    /// Election description.
    #[serde(default)]
    pub description: String,
    /// Number of seats being contested.
    pub total_seats: u32,
    /// Start of the voting window (inclusive).
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// End of the voting window (exclusive). Strictly after `start_time`.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    /// Who may vote, as free-form text.
    #[serde(default = "default_eligibility")]
    pub eligibility: String,
    /// Whether the election is publicly visible in moderation workflows.
    #[serde(default)]
    pub publish: bool,
    /// The authenticated user who created this election.
    pub created_by: Id,
    /// Creation time, set once.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// Candidates in submission order, at least one.
    pub candidates: Vec<Candidate>,
}

fn default_eligibility() -> String {
    "all".to_string()
}

/// An election from the database, with its unique short id.
///
/// Elections are created in one atomic operation together with their
/// candidate set, and never updated or deleted afterwards.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: ElectionId,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use chrono::{Duration, TimeZone};
    use mongodb::bson::oid::ObjectId;

    impl Candidate {
        pub fn example(id: u32) -> Self {
            Self {
                id,
                name: format!("Candidate {id}"),
                description: String::new(),
                party: "Independent".to_string(),
                manifesto: String::new(),
                votes: 0,
            }
        }
    }

    impl Election {
        pub fn example() -> Self {
            // Millisecond precision, matching what BSON datetimes store.
            let start_time = Utc.timestamp_millis_opt(1735689600000).single().unwrap();
            Self {
                id: ElectionId::generate(),
                election: ElectionCore {
                    title: "Student Union Presidency".to_string(),
                    description: "Annual SU election".to_string(),
                    total_seats: 1,
                    start_time,
                    end_time: start_time + Duration::days(7),
                    eligibility: "all".to_string(),
                    publish: false,
                    created_by: ObjectId::new().into(),
                    created_at: start_time,
                    candidates: vec![Candidate::example(1), Candidate::example(2)],
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_well_shaped() {
        for _ in 0..100 {
            let id = ElectionId::generate();
            assert_eq!(id.as_str().len(), ELECTION_ID_LENGTH);
            assert!(id
                .as_str()
                .bytes()
                .all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn generated_ids_differ() {
        // Not a uniqueness proof, but catches a broken generator.
        let first = ElectionId::generate();
        let second = ElectionId::generate();
        assert_ne!(first, second);
    }

    #[test]
    fn param_accepts_generated_ids() {
        let id = ElectionId::generate();
        let parsed = ElectionId::from_param(id.as_str()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn bson_roundtrip() {
        let election = Election::example();
        let doc = mongodb::bson::to_document(&election).unwrap();
        // The short id is the document key.
        assert_eq!(
            doc.get_str("_id").unwrap(),
            election.id.as_str()
        );
        let back: Election = mongodb::bson::from_document(doc).unwrap();
        assert_eq!(election, back);
    }

    #[test]
    fn param_rejects_malformed_ids() {
        assert!(ElectionId::from_param("").is_err());
        assert!(ElectionId::from_param("too-short").is_err());
        assert!(ElectionId::from_param("0123456789abcdef").is_err());
        assert!(ElectionId::from_param("0123XYZ789").is_err());
        assert!(ElectionId::from_param("0123ABCD89").is_err());
    }
}
