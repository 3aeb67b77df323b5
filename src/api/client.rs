use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::{
    api::{
        service::{AuthService, ElectionService},
        transport::{ApiRequest, Method, Transport},
    },
    error::{Error, Result},
    logging::{self, RequestId},
    model::{
        CandidateId, CastVote, Credentials, Election, ElectionId, ElectionSpec, LiveResults, Role,
    },
};

/// Request paths on the election service.
mod paths {
    use super::*;

    pub fn list() -> ApiRequest {
        ApiRequest::new(Method::Get, ["api", "elections"])
    }

    pub fn get(id: &ElectionId) -> ApiRequest {
        ApiRequest::new(Method::Get, ["api", "elections", id.as_str()])
    }

    pub fn create() -> ApiRequest {
        ApiRequest::new(Method::Post, ["api", "elections", "create"])
    }

    pub fn update(id: &ElectionId) -> ApiRequest {
        ApiRequest::new(Method::Put, ["api", "elections", "update", id.as_str()])
    }

    pub fn delete(id: &ElectionId) -> ApiRequest {
        ApiRequest::new(Method::Delete, ["api", "elections", "delete", id.as_str()])
    }

    pub fn vote() -> ApiRequest {
        ApiRequest::new(Method::Post, ["api", "elections", "vote"])
    }

    pub fn live_results(id: &ElectionId) -> ApiRequest {
        ApiRequest::new(Method::Get, ["api", "elections", id.as_str(), "results"])
    }

    pub fn login(role: Role) -> ApiRequest {
        match role {
            Role::Student => ApiRequest::new(Method::Post, ["api", "auth", "login"]),
            Role::Admin => ApiRequest::new(Method::Post, ["api", "admin", "admin-login"]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ElectionList {
    elections: Vec<Election>,
}

#[derive(Debug, Deserialize)]
struct SingleElection {
    election: Election,
}

/// Create and update replies come either wrapped or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SavedElection {
    Wrapped(SingleElection),
    Bare(Election),
}

impl From<SavedElection> for Election {
    fn from(saved: SavedElection) -> Self {
        match saved {
            SavedElection::Wrapped(SingleElection { election }) => election,
            SavedElection::Bare(election) => election,
        }
    }
}

/// Typed façade over a [`Transport`]. Holds no state of its own beyond the
/// transport, so it never caches or retries.
#[derive(Debug, Clone)]
pub struct ElectionClient<T> {
    transport: T,
}

impl<T: Transport> ElectionClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Perform one round trip, returning the body of a successful reply.
    async fn call(&self, request: ApiRequest) -> Result<Vec<u8>> {
        let id = RequestId::next();
        let path = request.path();
        logging::log_request(id, request.method, &path);

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(err) => {
                log::warn!("<-rsp{id} failed {path}: {err}");
                return Err(err);
            }
        };
        logging::log_response(id, response.status, &path);

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(Error::from_response(response.status, &response.body))
        }
    }

    async fn call_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let body = self.call(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl<T: Transport> ElectionService for ElectionClient<T> {
    async fn list(&self) -> Result<Vec<Election>> {
        let list: ElectionList = self.call_json(paths::list()).await?;
        Ok(list.elections)
    }

    async fn get(&self, id: &ElectionId) -> Result<Election> {
        let single: SingleElection = self.call_json(paths::get(id)).await?;
        Ok(single.election)
    }

    async fn create(&self, spec: &ElectionSpec) -> Result<Election> {
        let request = paths::create().with_body(serde_json::to_value(spec)?);
        let saved: SavedElection = self.call_json(request).await?;
        Ok(saved.into())
    }

    async fn update(&self, id: &ElectionId, spec: &ElectionSpec) -> Result<Election> {
        let request = paths::update(id).with_body(serde_json::to_value(spec)?);
        let saved: SavedElection = self.call_json(request).await?;
        Ok(saved.into())
    }

    async fn delete(&self, id: &ElectionId) -> Result<()> {
        self.call(paths::delete(id)).await?;
        Ok(())
    }

    async fn vote(&self, election_id: &ElectionId, candidate_id: &CandidateId) -> Result<()> {
        let body = CastVote {
            election_id: election_id.clone(),
            candidate_id: candidate_id.clone(),
        };
        self.call(paths::vote().with_body(serde_json::to_value(body)?))
            .await?;
        Ok(())
    }

    async fn live_results(&self, id: &ElectionId) -> Result<LiveResults> {
        self.call_json(paths::live_results(id)).await
    }
}

impl<T: Transport> AuthService for ElectionClient<T> {
    async fn login(&self, role: Role, credentials: &Credentials) -> Result<Value> {
        let request = paths::login(role).with_body(serde_json::to_value(credentials)?);
        self.call_json(request).await
    }
}
