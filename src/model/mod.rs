pub mod auth;
pub mod election;
pub mod results;

pub use auth::{Credentials, Role};
pub use election::{
    Candidate, CandidateId, CandidateSpec, CastVote, Election, ElectionId, ElectionInfo,
    ElectionSpec,
};
pub use results::{CandidateResult, LiveResults, Percentage};
