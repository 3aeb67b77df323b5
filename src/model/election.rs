use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Opaque election identifier assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElectionId(String);

/// Opaque candidate identifier assigned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

macro_rules! string_id {
    ($id:ident) => {
        impl $id {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $id {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $id {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $id {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(ElectionId);
string_id!(CandidateId);

/// Descriptive information about an election. Times are opaque strings;
/// their format and ordering are the service's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionInfo {
    pub description: String,
    pub start_time: String,
    pub end_time: String,
}

/// A candidate as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id", alias = "id")]
    pub id: CandidateId,
    pub name: String,
    pub party: String,
    #[serde(default)]
    pub bio: String,
    /// Vote count, only present in authoritative (admin) views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<u64>,
}

/// The client's transient copy of an election. Owned by the service; may be stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    #[serde(rename = "_id", alias = "id")]
    pub id: ElectionId,
    pub name: String,
    pub election_info: ElectionInfo,
    pub is_active: bool,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl Election {
    pub fn candidate(&self, id: &CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| &candidate.id == id)
    }
}

/// The editable part of a candidate, as sent on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    pub party: String,
    #[serde(default)]
    pub bio: String,
}

impl From<&Candidate> for CandidateSpec {
    fn from(candidate: &Candidate) -> Self {
        Self {
            name: candidate.name.clone(),
            party: candidate.party.clone(),
            bio: candidate.bio.clone(),
        }
    }
}

/// An election specification: the full payload of a create or update.
/// Updates replace every field wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSpec {
    pub name: String,
    pub candidates: Vec<CandidateSpec>,
    pub election_info: ElectionInfo,
    pub is_active: bool,
}

impl ElectionSpec {
    /// An empty specification with a single blank candidate, active by default.
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            candidates: vec![CandidateSpec::default()],
            election_info: ElectionInfo::default(),
            is_active: true,
        }
    }
}

impl From<&Election> for ElectionSpec {
    fn from(election: &Election) -> Self {
        Self {
            name: election.name.clone(),
            candidates: election.candidates.iter().map(CandidateSpec::from).collect(),
            election_info: election.election_info.clone(),
            is_active: election.is_active,
        }
    }
}

/// Body of a vote request. The voter is implied by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVote {
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
}
