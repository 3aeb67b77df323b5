//! One election, its candidates, and (for students) the vote.
//!
//! A detail screen fetches the election and, for admins, the live results
//! alongside it. The two fetches are independent: either may fail without
//! affecting the other. A successful vote is applied in two explicit steps,
//! first marking the screen as voted and then refetching the election, so a
//! failed refetch never undoes the vote.
//!
//! `has_voted` is advisory. It hides the vote action on this screen instance
//! only; the service is what guarantees one vote per voter and election.

use futures::{
    future::{select, Either},
    pin_mut,
};
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    api::ElectionService,
    error::{Action, RequestFailure, Result},
    model::{Candidate, CandidateId, Election, ElectionId, LiveResults, Role},
    screen::ticket::{Ticket, Tickets},
    session::Session,
};

pub const VOTE_CONFIRMATION: &str = "You have voted successfully.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailPhase {
    Loading,
    Loaded,
    /// The election could not be fetched.
    Unavailable(RequestFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteState {
    Ready,
    Voting(CandidateId),
    /// Terminal for this screen instance.
    Voted,
}

/// The admin-only live results panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsPanel {
    /// Not shown to this role.
    Hidden,
    Pending,
    Ready(LiveResults),
    /// The results fetch failed; the panel is omitted.
    Unavailable(RequestFailure),
}

impl ResultsPanel {
    /// The results to render, if the panel is shown at all.
    pub fn results(&self) -> Option<&LiveResults> {
        match self {
            Self::Ready(results) => Some(results),
            _ => None,
        }
    }
}

/// What is rendered beside a candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CandidateAction {
    Vote { enabled: bool },
    VoteCount(u64),
    /// Nothing: the viewer has already voted.
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow<'a> {
    pub candidate: &'a Candidate,
    pub action: CandidateAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteRejected {
    #[error("admins cannot vote")]
    Admin,
    #[error("already voted on this screen")]
    AlreadyVoted,
    #[error("a vote is already in flight")]
    InFlight,
    #[error("the election is not active")]
    Inactive,
    #[error("the election has not been loaded")]
    NotLoaded,
    #[error("no such candidate in this election")]
    UnknownCandidate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error(transparent)]
    Rejected(#[from] VoteRejected),
    #[error(transparent)]
    Failed(RequestFailure),
    #[error("vote response was superseded")]
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Voted,
    /// Back to `Ready`; the vote may be retried.
    Failed(RequestFailure),
}

/// The fetches a load requires. Results are only fetched for admins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub id: ElectionId,
    pub election: Ticket,
    pub results: Option<Ticket>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRequest {
    pub ticket: Ticket,
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
}

#[derive(Debug)]
pub struct ElectionDetail {
    role: Role,
    id: ElectionId,
    phase: DetailPhase,
    election: Option<Election>,
    results: ResultsPanel,
    vote: VoteState,
    notice: Option<RequestFailure>,
    confirmation_pending: bool,
    election_ticket: Tickets,
    results_ticket: Tickets,
    vote_ticket: Tickets,
}

impl ElectionDetail {
    pub fn new<C>(session: &Session<C>, id: ElectionId) -> Self {
        Self::for_role(session.role(), id)
    }

    pub(crate) fn for_role(role: Role, id: ElectionId) -> Self {
        let results = if role.is_admin() {
            ResultsPanel::Pending
        } else {
            ResultsPanel::Hidden
        };
        Self {
            role,
            id,
            phase: DetailPhase::Loading,
            election: None,
            results,
            vote: VoteState::Ready,
            notice: None,
            confirmation_pending: false,
            election_ticket: Tickets::default(),
            results_ticket: Tickets::default(),
            vote_ticket: Tickets::default(),
        }
    }

    pub fn id(&self) -> &ElectionId {
        &self.id
    }

    pub fn phase(&self) -> &DetailPhase {
        &self.phase
    }

    /// The last fetched copy of the election. May be stale.
    pub fn election(&self) -> Option<&Election> {
        self.election.as_ref()
    }

    pub fn results_panel(&self) -> &ResultsPanel {
        &self.results
    }

    pub fn vote_state(&self) -> &VoteState {
        &self.vote
    }

    pub fn has_voted(&self) -> bool {
        self.vote == VoteState::Voted
    }

    pub fn notice(&self) -> Option<&RequestFailure> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// The vote confirmation, yielded once after a successful vote.
    pub fn take_confirmation(&mut self) -> Option<&'static str> {
        if std::mem::take(&mut self.confirmation_pending) {
            Some(VOTE_CONFIRMATION)
        } else {
            None
        }
    }

    pub fn rows(&self) -> Vec<CandidateRow<'_>> {
        let Some(election) = &self.election else {
            return Vec::new();
        };
        election
            .candidates
            .iter()
            .map(|candidate| {
                let action = if self.role.is_admin() {
                    CandidateAction::VoteCount(candidate.votes.unwrap_or(0))
                } else {
                    match self.vote {
                        VoteState::Voted => CandidateAction::Hidden,
                        VoteState::Voting(_) => CandidateAction::Vote { enabled: false },
                        VoteState::Ready => CandidateAction::Vote {
                            enabled: election.is_active,
                        },
                    }
                };
                CandidateRow { candidate, action }
            })
            .collect()
    }

    /// Start (or restart) loading. A previously loaded copy stays visible
    /// until the new one arrives.
    pub fn begin_load(&mut self) -> LoadRequest {
        if self.election.is_none() {
            self.phase = DetailPhase::Loading;
        }
        let results = if self.role.is_admin() {
            if !matches!(self.results, ResultsPanel::Ready(_)) {
                self.results = ResultsPanel::Pending;
            }
            Some(self.results_ticket.issue())
        } else {
            None
        };
        LoadRequest {
            id: self.id.clone(),
            election: self.election_ticket.issue(),
            results,
        }
    }

    /// Apply an election fetch. Returns whether it was applied.
    pub fn finish_election(&mut self, ticket: Ticket, result: Result<Election>) -> bool {
        if !self.election_ticket.redeem(ticket) {
            debug!("Discarding stale election response {ticket}");
            return false;
        }
        match result {
            Ok(election) => {
                self.election = Some(election);
                self.phase = DetailPhase::Loaded;
            }
            Err(err) => {
                let failure = RequestFailure::new(Action::LoadElection, &err);
                if self.election.is_some() {
                    warn!("Refetch of election {} failed, keeping last copy: {err}", self.id);
                    self.notice = Some(failure);
                } else {
                    warn!("Failed to load election {}: {err}", self.id);
                    self.phase = DetailPhase::Unavailable(failure);
                }
            }
        }
        true
    }

    /// Apply a live results fetch. Returns whether it was applied.
    pub fn finish_results(&mut self, ticket: Ticket, result: Result<LiveResults>) -> bool {
        if !self.results_ticket.redeem(ticket) {
            debug!("Discarding stale results response {ticket}");
            return false;
        }
        self.results = match result {
            Ok(results) => ResultsPanel::Ready(results),
            Err(err) => {
                warn!("Live results for {} unavailable: {err}", self.id);
                ResultsPanel::Unavailable(RequestFailure::new(Action::LoadResults, &err))
            }
        };
        true
    }

    /// Fetch the election, and for admins the live results concurrently.
    /// Whichever half resolves first is applied without waiting for the
    /// other.
    pub async fn load<S: ElectionService>(&mut self, service: &S) {
        let request = self.begin_load();
        match request.results {
            Some(results_ticket) => {
                let election = service.get(&request.id);
                let results = service.live_results(&request.id);
                pin_mut!(election, results);
                match select(election, results).await {
                    Either::Left((election, results)) => {
                        self.finish_election(request.election, election);
                        self.finish_results(results_ticket, results.await);
                    }
                    Either::Right((results, election)) => {
                        self.finish_results(results_ticket, results);
                        self.finish_election(request.election, election.await);
                    }
                }
            }
            None => {
                let election = service.get(&request.id).await;
                self.finish_election(request.election, election);
            }
        }
    }

    pub fn begin_vote(
        &mut self,
        candidate_id: &CandidateId,
    ) -> std::result::Result<VoteRequest, VoteRejected> {
        if self.role.is_admin() {
            return Err(VoteRejected::Admin);
        }
        match self.vote {
            VoteState::Ready => {}
            VoteState::Voting(_) => return Err(VoteRejected::InFlight),
            VoteState::Voted => return Err(VoteRejected::AlreadyVoted),
        }
        let election = self.election.as_ref().ok_or(VoteRejected::NotLoaded)?;
        if !election.is_active {
            return Err(VoteRejected::Inactive);
        }
        if election.candidate(candidate_id).is_none() {
            return Err(VoteRejected::UnknownCandidate);
        }

        self.vote = VoteState::Voting(candidate_id.clone());
        Ok(VoteRequest {
            ticket: self.vote_ticket.issue(),
            election_id: self.id.clone(),
            candidate_id: candidate_id.clone(),
        })
    }

    /// Apply the vote response. Returns `None` if the ticket is stale.
    pub fn finish_vote(&mut self, ticket: Ticket, result: Result<()>) -> Option<VoteOutcome> {
        if !self.vote_ticket.redeem(ticket) {
            debug!("Discarding stale vote response {ticket}");
            return None;
        }
        match result {
            Ok(()) => {
                if let VoteState::Voting(candidate) = &self.vote {
                    info!("Voted for {candidate} in election {}", self.id);
                }
                self.vote = VoteState::Voted;
                self.confirmation_pending = true;
                Some(VoteOutcome::Voted)
            }
            Err(err) => {
                warn!("Vote in election {} failed: {err}", self.id);
                let failure = RequestFailure::new(Action::Vote, &err);
                self.vote = VoteState::Ready;
                self.notice = Some(failure.clone());
                Some(VoteOutcome::Failed(failure))
            }
        }
    }

    /// Start a refetch of the election alone, as after a vote.
    pub fn begin_refetch(&mut self) -> Ticket {
        self.election_ticket.issue()
    }

    /// Cast a vote, then refetch the election once the vote is recorded.
    pub async fn vote<S: ElectionService>(
        &mut self,
        service: &S,
        candidate_id: &CandidateId,
    ) -> std::result::Result<(), VoteError> {
        let request = self.begin_vote(candidate_id)?;
        let result = service
            .vote(&request.election_id, &request.candidate_id)
            .await;
        match self.finish_vote(request.ticket, result) {
            Some(VoteOutcome::Voted) => {}
            Some(VoteOutcome::Failed(failure)) => return Err(VoteError::Failed(failure)),
            None => return Err(VoteError::Discarded),
        }

        let ticket = self.begin_refetch();
        let election = service.get(&self.id).await;
        self.finish_election(ticket, election);
        Ok(())
    }
}
