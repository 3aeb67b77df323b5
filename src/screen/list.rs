//! The election list, and the delete confirmation workflow.
//!
//! The list is refetched in full every time the screen gains focus, since
//! elections can change elsewhere. Deleting takes two steps: requesting a
//! delete only records the target and shows a prompt; confirming sends the
//! single delete call and then refetches the list whatever the outcome.

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    api::ElectionService,
    error::{Action, RequestFailure, Result},
    model::{Election, ElectionId, Role},
    screen::{
        detail::ElectionDetail,
        form::ElectionForm,
        ticket::{Ticket, Tickets},
    },
    session::Session,
};

pub const DELETE_PROMPT_TITLE: &str = "Delete Election";
pub const DELETE_PROMPT_MESSAGE: &str =
    "Are you sure you want to delete this election? This action cannot be undone.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPhase {
    Loading,
    Loaded,
    /// The first fetch failed; there is nothing to show.
    Unavailable(RequestFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteState {
    Idle,
    /// Awaiting confirmation. No request has been made.
    Pending(ElectionId),
    Deleting(ElectionId),
}

/// One election as rendered in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionCard<'a> {
    pub election: &'a Election,
    pub status: &'static str,
    /// Whether the edit and delete actions are shown.
    pub manageable: bool,
}

/// The confirmation shown while a delete is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePrompt<'a> {
    pub title: &'static str,
    pub message: &'static str,
    pub election: &'a Election,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteRejected {
    #[error("only admins can delete elections")]
    NotAdmin,
    #[error("no such election in the list")]
    UnknownElection,
    #[error("a delete is already in flight")]
    InFlight,
    #[error("no delete is awaiting confirmation")]
    NothingPending,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    #[error(transparent)]
    Rejected(#[from] DeleteRejected),
    #[error(transparent)]
    Failed(RequestFailure),
    #[error("delete response was superseded")]
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub ticket: Ticket,
    pub id: ElectionId,
}

#[derive(Debug)]
pub struct ElectionList {
    role: Role,
    phase: ListPhase,
    elections: Vec<Election>,
    delete: DeleteState,
    notice: Option<RequestFailure>,
    refresh_ticket: Tickets,
    delete_ticket: Tickets,
}

impl ElectionList {
    pub fn new<C>(session: &Session<C>) -> Self {
        Self::for_role(session.role())
    }

    pub(crate) fn for_role(role: Role) -> Self {
        Self {
            role,
            phase: ListPhase::Loading,
            elections: Vec::new(),
            delete: DeleteState::Idle,
            notice: None,
            refresh_ticket: Tickets::default(),
            delete_ticket: Tickets::default(),
        }
    }

    pub fn phase(&self) -> &ListPhase {
        &self.phase
    }

    pub fn elections(&self) -> &[Election] {
        &self.elections
    }

    pub fn delete_state(&self) -> &DeleteState {
        &self.delete
    }

    pub fn notice(&self) -> Option<&RequestFailure> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn can_create(&self) -> bool {
        self.role.is_admin()
    }

    pub fn cards(&self) -> Vec<ElectionCard<'_>> {
        self.elections
            .iter()
            .map(|election| ElectionCard {
                election,
                status: if election.is_active {
                    "Active"
                } else {
                    "Inactive"
                },
                manageable: self.role.is_admin(),
            })
            .collect()
    }

    fn find(&self, id: &ElectionId) -> Option<&Election> {
        self.elections.iter().find(|election| &election.id == id)
    }

    /// Whether a list fetch is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refresh_ticket.is_outstanding()
    }

    pub fn begin_refresh(&mut self) -> Ticket {
        self.refresh_ticket.issue()
    }

    /// Apply a list fetch. Returns whether it was applied. A failed refetch
    /// leaves the previous list in place. A pending delete whose target is
    /// gone from the new list is dropped.
    pub fn finish_refresh(&mut self, ticket: Ticket, result: Result<Vec<Election>>) -> bool {
        if !self.refresh_ticket.redeem(ticket) {
            debug!("Discarding stale list response {ticket}");
            return false;
        }
        match result {
            Ok(elections) => {
                debug!("Loaded {} election(s)", elections.len());
                self.elections = elections;
                self.phase = ListPhase::Loaded;
                if let DeleteState::Pending(id) = &self.delete {
                    if self.find(id).is_none() {
                        info!("Election {id} is gone; dropping its pending delete");
                        self.delete = DeleteState::Idle;
                    }
                }
            }
            Err(err) => {
                warn!("Failed to load elections: {err}");
                let failure = RequestFailure::new(Action::ListElections, &err);
                if self.phase == ListPhase::Loaded {
                    self.notice = Some(failure);
                } else {
                    self.phase = ListPhase::Unavailable(failure);
                }
            }
        }
        true
    }

    /// Fetch the full list. Call on mount and every time the screen gains
    /// focus.
    pub async fn refresh<S: ElectionService>(&mut self, service: &S) {
        let ticket = self.begin_refresh();
        let result = service.list().await;
        self.finish_refresh(ticket, result);
    }

    /// Ask for confirmation before deleting `id`. A pending target is
    /// replaced; nothing is sent.
    pub fn request_delete(&mut self, id: &ElectionId) -> std::result::Result<(), DeleteRejected> {
        if !self.role.is_admin() {
            return Err(DeleteRejected::NotAdmin);
        }
        if matches!(self.delete, DeleteState::Deleting(_)) {
            return Err(DeleteRejected::InFlight);
        }
        if self.find(id).is_none() {
            return Err(DeleteRejected::UnknownElection);
        }
        self.delete = DeleteState::Pending(id.clone());
        Ok(())
    }

    pub fn delete_prompt(&self) -> Option<DeletePrompt<'_>> {
        let DeleteState::Pending(id) = &self.delete else {
            return None;
        };
        self.find(id).map(|election| DeletePrompt {
            title: DELETE_PROMPT_TITLE,
            message: DELETE_PROMPT_MESSAGE,
            election,
        })
    }

    /// Dismiss the prompt. Returns whether a pending delete was cleared.
    pub fn cancel_delete(&mut self) -> bool {
        if let DeleteState::Pending(id) = &self.delete {
            debug!("Cancelled delete of election {id}");
            self.delete = DeleteState::Idle;
            true
        } else {
            false
        }
    }

    pub fn begin_delete(&mut self) -> std::result::Result<DeleteRequest, DeleteRejected> {
        let id = match &self.delete {
            DeleteState::Idle => return Err(DeleteRejected::NothingPending),
            DeleteState::Deleting(_) => return Err(DeleteRejected::InFlight),
            DeleteState::Pending(id) => id.clone(),
        };
        self.delete = DeleteState::Deleting(id.clone());
        Ok(DeleteRequest {
            ticket: self.delete_ticket.issue(),
            id,
        })
    }

    /// Apply the delete response. Returns `None` if the ticket is stale. The
    /// caller refetches the list either way.
    pub fn finish_delete(
        &mut self,
        ticket: Ticket,
        result: Result<()>,
    ) -> Option<std::result::Result<(), RequestFailure>> {
        if !self.delete_ticket.redeem(ticket) {
            debug!("Discarding stale delete response {ticket}");
            return None;
        }
        let id = match std::mem::replace(&mut self.delete, DeleteState::Idle) {
            DeleteState::Deleting(id) => id,
            DeleteState::Pending(id) => id,
            DeleteState::Idle => return None,
        };
        match result {
            Ok(()) => {
                info!("Deleted election {id}");
                Some(Ok(()))
            }
            Err(err) => {
                warn!("Delete of election {id} failed: {err}");
                let failure = RequestFailure::new(Action::DeleteElection, &err);
                self.notice = Some(failure.clone());
                Some(Err(failure))
            }
        }
    }

    /// Delete the pending target, then refetch the list.
    pub async fn confirm_delete<S: ElectionService>(
        &mut self,
        service: &S,
    ) -> std::result::Result<(), DeleteError> {
        let request = self.begin_delete()?;
        let result = service.delete(&request.id).await;
        let outcome = self.finish_delete(request.ticket, result);
        self.refresh(service).await;
        match outcome {
            Some(Ok(())) => Ok(()),
            Some(Err(failure)) => Err(DeleteError::Failed(failure)),
            None => Err(DeleteError::Discarded),
        }
    }

    /// A blank create form. Admin only.
    pub fn create_form(&self) -> Option<ElectionForm> {
        self.can_create().then(ElectionForm::create)
    }

    /// An edit form prefilled from the listed copy of `id`. Admin only.
    pub fn edit_form(&self, id: &ElectionId) -> Option<ElectionForm> {
        if !self.role.is_admin() {
            return None;
        }
        self.find(id).map(ElectionForm::edit)
    }

    /// A detail screen for `id`. It still has to be loaded.
    pub fn open(&self, id: &ElectionId) -> ElectionDetail {
        ElectionDetail::for_role(self.role, id.clone())
    }
}
