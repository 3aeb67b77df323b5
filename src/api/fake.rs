//! An in-process stand-in for the remote election service, for tests.
//!
//! The service is a set of Rocket routes over an in-memory store, reached
//! through Rocket's local client so that every test goes through the real
//! request/response codec of [`ElectionClient`]. Every call is recorded, and
//! any operation can be told to fail.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use rocket::{
    http::{ContentType, Cookie, CookieJar, Method as HttpMethod, Status},
    local::asynchronous::Client,
    serde::json::{json, Json, Value},
    State,
};

use crate::{
    api::{ApiRequest, ApiResponse, ElectionClient, Method, Transport},
    error::Result,
    model::{
        Candidate, CandidateId, CastVote, Credentials, Election, ElectionId, ElectionSpec, Role,
    },
};

const VOTER_COOKIE: &str = "voter";

/// A call received by the fake service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Get(ElectionId),
    Create(ElectionSpec),
    Update(ElectionId, ElectionSpec),
    Delete(ElectionId),
    Vote(ElectionId, CandidateId),
    Results(ElectionId),
    Login(Role, String),
}

/// Operation kinds, for counting calls and injecting failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
    Vote,
    Results,
    Login,
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Self::List => Op::List,
            Self::Get(_) => Op::Get,
            Self::Create(_) => Op::Create,
            Self::Update(..) => Op::Update,
            Self::Delete(_) => Op::Delete,
            Self::Vote(..) => Op::Vote,
            Self::Results(_) => Op::Results,
            Self::Login(..) => Op::Login,
        }
    }
}

type Failure = (Status, Json<Value>);
type Reply = std::result::Result<Json<Value>, Failure>;

fn failure(status: Status, message: Option<&str>) -> Failure {
    let body = match message {
        Some(message) => json!({ "message": message }),
        None => json!({}),
    };
    (status, Json(body))
}

fn not_found() -> Failure {
    failure(Status::NotFound, Some("Election not found"))
}

#[derive(Default)]
struct FakeStore {
    elections: Vec<Election>,
    calls: Vec<Call>,
    failures: HashMap<Op, (Status, Option<String>)>,
    ballots: HashSet<(String, ElectionId)>,
    next_id: u32,
}

impl FakeStore {
    /// Record the call, then fail it if so instructed.
    fn record(&mut self, call: Call) -> std::result::Result<(), Failure> {
        let op = call.op();
        self.calls.push(call);
        match self.failures.get(&op) {
            Some((status, message)) => Err(failure(*status, message.as_deref())),
            None => Ok(()),
        }
    }

    fn find_mut(&mut self, id: &ElectionId) -> std::result::Result<&mut Election, Failure> {
        self.elections
            .iter_mut()
            .find(|election| &election.id == id)
            .ok_or_else(not_found)
    }

    fn build(&mut self, id: ElectionId, spec: ElectionSpec) -> Election {
        let candidates = spec
            .candidates
            .into_iter()
            .map(|candidate| {
                self.next_id += 1;
                Candidate {
                    id: format!("{id}-c{}", self.next_id).into(),
                    name: candidate.name,
                    party: candidate.party,
                    bio: candidate.bio,
                    votes: Some(0),
                }
            })
            .collect();
        Election {
            id,
            name: spec.name,
            election_info: spec.election_info,
            is_active: spec.is_active,
            candidates,
        }
    }
}

type SharedStore = Arc<Mutex<FakeStore>>;

fn lock(store: &SharedStore) -> MutexGuard<'_, FakeStore> {
    store.lock().unwrap()
}

#[rocket::get("/api/elections")]
fn list(store: &State<SharedStore>) -> Reply {
    let mut store = lock(store);
    store.record(Call::List)?;
    Ok(Json(json!({ "elections": store.elections })))
}

#[rocket::get("/api/elections/<id>")]
fn get(id: String, store: &State<SharedStore>) -> Reply {
    let mut store = lock(store);
    let id = ElectionId::from(id);
    store.record(Call::Get(id.clone()))?;
    let election = store.find_mut(&id)?;
    Ok(Json(json!({ "election": election })))
}

#[rocket::post("/api/elections/create", data = "<spec>", format = "json")]
fn create(spec: Json<ElectionSpec>, store: &State<SharedStore>) -> Reply {
    let mut store = lock(store);
    store.record(Call::Create(spec.0.clone()))?;
    store.next_id += 1;
    let id = ElectionId::from(format!("e{}", 100 + store.next_id));
    let election = store.build(id, spec.0);
    store.elections.push(election.clone());
    Ok(Json(json!(election)))
}

#[rocket::put("/api/elections/update/<id>", data = "<spec>", format = "json")]
fn update(id: String, spec: Json<ElectionSpec>, store: &State<SharedStore>) -> Reply {
    let mut store = lock(store);
    let id = ElectionId::from(id);
    store.record(Call::Update(id.clone(), spec.0.clone()))?;
    store.find_mut(&id)?;
    let replacement = store.build(id.clone(), spec.0);
    let election = store.find_mut(&id)?;
    *election = replacement.clone();
    Ok(Json(json!({ "message": "Election updated", "election": replacement })))
}

#[rocket::delete("/api/elections/delete/<id>")]
fn delete(id: String, store: &State<SharedStore>) -> Reply {
    let mut store = lock(store);
    let id = ElectionId::from(id);
    store.record(Call::Delete(id.clone()))?;
    store.find_mut(&id)?;
    store.elections.retain(|election| election.id != id);
    Ok(Json(json!({ "message": "Election deleted" })))
}

#[rocket::post("/api/elections/vote", data = "<vote>", format = "json")]
fn vote(vote: Json<CastVote>, cookies: &CookieJar<'_>, store: &State<SharedStore>) -> Reply {
    let mut store = lock(store);
    let CastVote {
        election_id,
        candidate_id,
    } = vote.0;
    store.record(Call::Vote(election_id.clone(), candidate_id.clone()))?;

    let voter = cookies
        .get(VOTER_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| failure(Status::Unauthorized, Some("Please log in to vote")))?;
    if store.ballots.contains(&(voter.clone(), election_id.clone())) {
        return Err(failure(
            Status::BadRequest,
            Some("You have already voted in this election"),
        ));
    }

    let election = store.find_mut(&election_id)?;
    if !election.is_active {
        return Err(failure(Status::BadRequest, Some("Election is not active")));
    }
    let candidate = election
        .candidates
        .iter_mut()
        .find(|candidate| candidate.id == candidate_id)
        .ok_or_else(|| failure(Status::NotFound, Some("Candidate not found")))?;
    candidate.votes = Some(candidate.votes.unwrap_or(0) + 1);
    store.ballots.insert((voter, election_id));
    Ok(Json(json!({ "message": "Vote cast successfully" })))
}

#[rocket::get("/api/elections/<id>/results")]
fn results(id: String, store: &State<SharedStore>) -> Reply {
    let mut store = lock(store);
    let id = ElectionId::from(id);
    store.record(Call::Results(id.clone()))?;
    let election = store.find_mut(&id)?;
    let total: u64 = election
        .candidates
        .iter()
        .map(|candidate| candidate.votes.unwrap_or(0))
        .sum();
    let results: Vec<Value> = election
        .candidates
        .iter()
        .map(|candidate| {
            let votes = candidate.votes.unwrap_or(0);
            let percentage = if total == 0 {
                0.0
            } else {
                (votes as f64 * 10_000.0 / total as f64).round() / 100.0
            };
            json!({
                "_id": candidate.id,
                "name": candidate.name,
                "votes": votes,
                "percentage": percentage,
            })
        })
        .collect();
    Ok(Json(json!({ "totalVotes": total, "results": results })))
}

fn login(
    role: Role,
    credentials: Credentials,
    cookies: &CookieJar<'_>,
    store: &State<SharedStore>,
) -> Reply {
    let mut store = lock(store);
    store.record(Call::Login(role, credentials.username.clone()))?;
    if credentials.password.len() < 8 {
        return Err(failure(Status::Unauthorized, Some("Invalid credentials")));
    }
    cookies.add(Cookie::new(
        VOTER_COOKIE,
        format!("{role}:{}", credentials.username),
    ));
    Ok(Json(json!({
        "user": { "username": credentials.username },
        "role": role,
    })))
}

#[rocket::post("/api/auth/login", data = "<credentials>", format = "json")]
fn student_login(
    credentials: Json<Credentials>,
    cookies: &CookieJar<'_>,
    store: &State<SharedStore>,
) -> Reply {
    login(Role::Student, credentials.0, cookies, store)
}

#[rocket::post("/api/admin/admin-login", data = "<credentials>", format = "json")]
fn admin_login(
    credentials: Json<Credentials>,
    cookies: &CookieJar<'_>,
    store: &State<SharedStore>,
) -> Reply {
    login(Role::Admin, credentials.0, cookies, store)
}

/// Reaches a Rocket instance in-process instead of over the network.
pub struct LocalTransport {
    client: Client,
}

impl Transport for LocalTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let method = match request.method {
            Method::Get => HttpMethod::Get,
            Method::Post => HttpMethod::Post,
            Method::Put => HttpMethod::Put,
            Method::Delete => HttpMethod::Delete,
        };
        let uri = request.path();
        let mut local = self.client.req(method, uri.as_str());
        if let Some(body) = &request.body {
            local = local.header(ContentType::JSON).body(body.to_string());
        }
        let response = local.dispatch().await;
        let status = response.status().code;
        let body = response.into_bytes().await.unwrap_or_default();
        Ok(ApiResponse { status, body })
    }
}

/// Handle on the fake service's store, shared with every client it hands out.
pub struct FakeService {
    store: SharedStore,
}

impl FakeService {
    pub fn new() -> Self {
        Self::with_elections(Vec::new())
    }

    pub fn with_elections(elections: Vec<Election>) -> Self {
        let store = FakeStore {
            elections,
            ..Default::default()
        };
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// A fresh client with its own cookie jar, i.e. a separate device.
    pub async fn client(&self) -> ElectionClient<LocalTransport> {
        let rocket = rocket::build()
            .mount(
                "/",
                rocket::routes![
                    list,
                    get,
                    create,
                    update,
                    delete,
                    vote,
                    results,
                    student_login,
                    admin_login
                ],
            )
            .manage(self.store.clone());
        let client = Client::tracked(rocket).await.unwrap();
        ElectionClient::new(LocalTransport { client })
    }

    /// Make every future call of this kind fail.
    pub fn fail(&self, op: Op, status: Status, message: Option<&str>) {
        lock(&self.store)
            .failures
            .insert(op, (status, message.map(str::to_string)));
    }

    pub fn recover(&self, op: Op) {
        lock(&self.store).failures.remove(&op);
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.store).calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        lock(&self.store)
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    pub fn elections(&self) -> Vec<Election> {
        lock(&self.store).elections.clone()
    }
}
