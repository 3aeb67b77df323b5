use serde_json::Value;

use crate::{
    error::Result,
    model::{CandidateId, Credentials, Election, ElectionId, ElectionSpec, LiveResults, Role},
};

/// Typed operations against the remote election service. Each call is a
/// single round trip with no caching or retry; failures come back as-is.
/// Callers must refetch any read view after a mutation themselves.
#[allow(async_fn_in_trait)]
pub trait ElectionService {
    async fn list(&self) -> Result<Vec<Election>>;

    async fn get(&self, id: &ElectionId) -> Result<Election>;

    async fn create(&self, spec: &ElectionSpec) -> Result<Election>;

    /// Replace every field of the election with `spec`.
    async fn update(&self, id: &ElectionId, spec: &ElectionSpec) -> Result<Election>;

    async fn delete(&self, id: &ElectionId) -> Result<()>;

    /// Cast the session's vote. The service, not the client, guarantees that
    /// each voter votes at most once per election.
    async fn vote(&self, election_id: &ElectionId, candidate_id: &CandidateId) -> Result<()>;

    async fn live_results(&self, id: &ElectionId) -> Result<LiveResults>;
}

/// Role-specific login.
#[allow(async_fn_in_trait)]
pub trait AuthService {
    /// Returns the opaque user payload on success.
    async fn login(&self, role: Role, credentials: &Credentials) -> Result<Value>;
}
