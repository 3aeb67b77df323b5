use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::model::CandidateId;

/// A share of the vote exactly as the service reported it. The client never
/// derives percentages itself, so whatever form the service chose is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Percentage {
    Number(f64),
    Text(String),
}

impl Display for Percentage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// One row of the live results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    #[serde(rename = "_id", alias = "id")]
    pub id: CandidateId,
    pub name: String,
    pub votes: u64,
    pub percentage: Percentage,
}

/// Server-aggregated tally for one election. Admin only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveResults {
    pub total_votes: u64,
    pub results: Vec<CandidateResult>,
}
