//! Create/edit election form.
//!
//! The form holds a working copy of the election's editable fields. In edit
//! mode it also keeps the prefilled values as a baseline; the form is dirty
//! exactly when the working copy differs from that baseline, and a create
//! form is always dirty. Submission requires a dirty form that passes local
//! validation, and issues exactly one create or update.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    api::ElectionService,
    error::{Action, RequestFailure, Result},
    model::{CandidateSpec, Election, ElectionId, ElectionSpec},
    screen::ticket::{Ticket, Tickets},
};

/// A form field that can fail validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Description,
    StartTime,
    EndTime,
    CandidateName(usize),
    CandidateParty(usize),
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Description => f.write_str("description"),
            Self::StartTime => f.write_str("startTime"),
            Self::EndTime => f.write_str("endTime"),
            Self::CandidateName(i) => write!(f, "candidates[{i}].name"),
            Self::CandidateParty(i) => write!(f, "candidates[{i}].party"),
        }
    }
}

/// Field-level validation messages, rendered inline next to each field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, &'static str>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    fn require(&mut self, field: Field, value: &str, message: &'static str) {
        if value.trim().is_empty() {
            self.0.insert(field, message);
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Check every required field. Candidate bios are optional.
pub fn validate(spec: &ElectionSpec) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    errors.require(Field::Name, &spec.name, "Election name required");
    let info = &spec.election_info;
    errors.require(Field::Description, &info.description, "Description required");
    errors.require(Field::StartTime, &info.start_time, "Start time required");
    errors.require(Field::EndTime, &info.end_time, "End time required");
    for (i, candidate) in spec.candidates.iter().enumerate() {
        errors.require(Field::CandidateName(i), &candidate.name, "Candidate name required");
        errors.require(Field::CandidateParty(i), &candidate.party, "Party required");
    }
    errors
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ElectionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Editing,
    Submitting,
    /// Saved; the caller should navigate back.
    Saved(Election),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CandidateField {
    Name,
    Party,
    Bio,
}

/// Why a submission was not sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitBlocked {
    #[error("no changes to save")]
    Unchanged,
    #[error("invalid fields: {0}")]
    Invalid(ValidationErrors),
    #[error("a submission is already in flight")]
    InFlight,
    #[error("the election has already been saved")]
    AlreadySaved,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Blocked(#[from] SubmitBlocked),
    #[error(transparent)]
    Failed(RequestFailure),
    #[error("submission was superseded")]
    Discarded,
}

/// The service call a submission requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRequest {
    Create(ElectionSpec),
    Update(ElectionId, ElectionSpec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: Ticket,
    pub request: SubmitRequest,
}

#[derive(Debug)]
pub struct ElectionForm {
    mode: FormMode,
    fields: ElectionSpec,
    baseline: Option<ElectionSpec>,
    state: FormState,
    errors: ValidationErrors,
    notice: Option<RequestFailure>,
    submission: Tickets,
}

impl ElectionForm {
    /// A blank form for a new election.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            fields: ElectionSpec::blank(),
            baseline: None,
            state: FormState::Editing,
            errors: ValidationErrors::default(),
            notice: None,
            submission: Tickets::default(),
        }
    }

    /// A form prefilled from `election`, which also becomes the baseline.
    pub fn edit(election: &Election) -> Self {
        let mut fields = ElectionSpec::from(election);
        if fields.candidates.is_empty() {
            fields.candidates.push(CandidateSpec::default());
        }
        Self {
            mode: FormMode::Edit(election.id.clone()),
            baseline: Some(fields.clone()),
            fields,
            state: FormState::Editing,
            errors: ValidationErrors::default(),
            notice: None,
            submission: Tickets::default(),
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn fields(&self) -> &ElectionSpec {
        &self.fields
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// The last submission failure, if it has not been dismissed.
    pub fn notice(&self) -> Option<&RequestFailure> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_dirty(&self) -> bool {
        self.baseline
            .as_ref()
            .map_or(true, |baseline| *baseline != self.fields)
    }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        self.state == FormState::Editing && self.is_dirty()
    }

    /// Apply a mutation while editing. Returns `false` if the form is not
    /// currently editable.
    fn mutate(&mut self, f: impl FnOnce(&mut ElectionSpec) -> bool) -> bool {
        if self.state != FormState::Editing {
            debug!("Ignoring edit while form is {:?}", self.state);
            return false;
        }
        f(&mut self.fields)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        self.mutate(|fields| {
            fields.name = name;
            true
        })
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> bool {
        let description = description.into();
        self.mutate(|fields| {
            fields.election_info.description = description;
            true
        })
    }

    pub fn set_start_time(&mut self, start_time: impl Into<String>) -> bool {
        let start_time = start_time.into();
        self.mutate(|fields| {
            fields.election_info.start_time = start_time;
            true
        })
    }

    pub fn set_end_time(&mut self, end_time: impl Into<String>) -> bool {
        let end_time = end_time.into();
        self.mutate(|fields| {
            fields.election_info.end_time = end_time;
            true
        })
    }

    pub fn set_active(&mut self, is_active: bool) -> bool {
        self.mutate(|fields| {
            fields.is_active = is_active;
            true
        })
    }

    /// Append a blank candidate row.
    pub fn add_candidate(&mut self) -> bool {
        self.mutate(|fields| {
            fields.candidates.push(CandidateSpec::default());
            true
        })
    }

    pub fn update_candidate(
        &mut self,
        index: usize,
        field: CandidateField,
        value: impl Into<String>,
    ) -> bool {
        let value = value.into();
        self.mutate(|fields| match fields.candidates.get_mut(index) {
            Some(candidate) => {
                match field {
                    CandidateField::Name => candidate.name = value,
                    CandidateField::Party => candidate.party = value,
                    CandidateField::Bio => candidate.bio = value,
                }
                true
            }
            None => false,
        })
    }

    /// Remove a candidate row. The last remaining row is never removed.
    pub fn remove_candidate(&mut self, index: usize) -> bool {
        self.mutate(|fields| {
            if fields.candidates.len() <= 1 || index >= fields.candidates.len() {
                return false;
            }
            fields.candidates.remove(index);
            true
        })
    }

    /// Re-run validation, replacing the inline errors. Returns whether the
    /// fields are valid.
    pub fn validate(&mut self) -> bool {
        self.errors = validate(&self.fields);
        self.errors.is_empty()
    }

    /// Move to `Submitting` if the form is dirty and valid, returning the call
    /// to make. Nothing is sent when this is refused.
    pub fn begin_submit(&mut self) -> std::result::Result<Submission, SubmitBlocked> {
        match self.state {
            FormState::Editing => {}
            FormState::Submitting => return Err(SubmitBlocked::InFlight),
            FormState::Saved(_) => return Err(SubmitBlocked::AlreadySaved),
        }
        if !self.is_dirty() {
            return Err(SubmitBlocked::Unchanged);
        }
        if !self.validate() {
            debug!("Form has {} invalid field(s)", self.errors.len());
            return Err(SubmitBlocked::Invalid(self.errors.clone()));
        }

        self.notice = None;
        self.state = FormState::Submitting;
        let request = match &self.mode {
            FormMode::Create => SubmitRequest::Create(self.fields.clone()),
            FormMode::Edit(id) => SubmitRequest::Update(id.clone(), self.fields.clone()),
        };
        Ok(Submission {
            ticket: self.submission.issue(),
            request,
        })
    }

    /// Apply the outcome of a submission. Returns `None` if the ticket is not
    /// the outstanding one; the form is then untouched. On failure the form
    /// returns to `Editing` with every field as it was.
    pub fn finish_submit(
        &mut self,
        ticket: Ticket,
        result: Result<Election>,
    ) -> Option<std::result::Result<Election, RequestFailure>> {
        if !self.submission.redeem(ticket) {
            debug!("Discarding stale submission response {ticket}");
            return None;
        }
        let action = match self.mode {
            FormMode::Create => Action::CreateElection,
            FormMode::Edit(_) => Action::UpdateElection,
        };
        match result {
            Ok(election) => {
                info!("Saved election {} ({})", election.id, election.name);
                self.state = FormState::Saved(election.clone());
                Some(Ok(election))
            }
            Err(err) => {
                let failure = RequestFailure::new(action, &err);
                warn!("{action} failed: {err}");
                self.state = FormState::Editing;
                self.notice = Some(failure.clone());
                Some(Err(failure))
            }
        }
    }

    /// Validate, submit, and apply the outcome.
    pub async fn submit<S: ElectionService>(
        &mut self,
        service: &S,
    ) -> std::result::Result<Election, SubmitError> {
        let submission = self.begin_submit()?;
        let result = match &submission.request {
            SubmitRequest::Create(spec) => service.create(spec).await,
            SubmitRequest::Update(id, spec) => service.update(id, spec).await,
        };
        match self.finish_submit(submission.ticket, result) {
            Some(Ok(election)) => Ok(election),
            Some(Err(failure)) => Err(SubmitError::Failed(failure)),
            None => Err(SubmitError::Discarded),
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;

    use super::*;
    use crate::api::fake::{Call, FakeService, Op};
    use crate::error::Error;

    fn fill_board_vote(form: &mut ElectionForm) {
        form.set_name("Board Vote");
        form.set_description("Annual");
        form.set_start_time("09:00");
        form.set_end_time("17:00");
        form.update_candidate(0, CandidateField::Name, "Alice");
        form.update_candidate(0, CandidateField::Party, "Green");
    }

    #[test]
    fn create_form_is_always_dirty() {
        let mut form = ElectionForm::create();
        assert!(form.is_dirty());
        assert_eq!(form.fields(), &ElectionSpec::blank());

        fill_board_vote(&mut form);
        assert!(form.is_dirty());

        // Even back at the blank state.
        form.set_name("");
        assert!(form.is_dirty());
    }

    #[test]
    fn edit_form_is_dirty_iff_changed() {
        let election = Election::example1();
        let mut form = ElectionForm::edit(&election);
        assert!(!form.is_dirty());
        assert!(!form.can_submit());
        assert_eq!(form.mode(), &FormMode::Edit("e1".into()));

        // Each single-field change flips the flag, and undoing it flips it back.
        form.set_name("Renamed");
        assert!(form.is_dirty());
        form.set_name(election.name.clone());
        assert!(!form.is_dirty());

        form.set_active(false);
        assert!(form.is_dirty());
        form.set_active(true);
        assert!(!form.is_dirty());

        form.set_end_time("2026-10-02 17:00");
        assert!(form.is_dirty());
        form.set_end_time(election.election_info.end_time.clone());
        assert!(!form.is_dirty());

        form.update_candidate(1, CandidateField::Bio, "New bio");
        assert!(form.is_dirty());
        form.update_candidate(1, CandidateField::Bio, election.candidates[1].bio.clone());
        assert!(!form.is_dirty());
    }

    #[test]
    fn candidate_order_matters() {
        let election = Election::example1();
        let mut form = ElectionForm::edit(&election);

        // Swap the two candidates field by field.
        let (first, second) = (&election.candidates[0], &election.candidates[1]);
        for (i, candidate) in [(0, second), (1, first)] {
            form.update_candidate(i, CandidateField::Name, candidate.name.clone());
            form.update_candidate(i, CandidateField::Party, candidate.party.clone());
            form.update_candidate(i, CandidateField::Bio, candidate.bio.clone());
        }
        assert!(form.is_dirty());
    }

    #[test]
    fn adding_and_removing_rows() {
        let election = Election::example1();
        let mut form = ElectionForm::edit(&election);

        assert!(form.add_candidate());
        assert_eq!(form.fields().candidates.len(), 3);
        assert!(form.is_dirty());

        assert!(form.remove_candidate(2));
        assert!(!form.is_dirty());

        assert!(!form.remove_candidate(7));
        assert!(!form.update_candidate(7, CandidateField::Name, "Nobody"));
        assert!(!form.is_dirty());
    }

    #[test]
    fn last_row_is_never_removed() {
        let mut form = ElectionForm::create();
        assert_eq!(form.fields().candidates.len(), 1);
        assert!(!form.remove_candidate(0));
        assert_eq!(form.fields().candidates.len(), 1);

        form.add_candidate();
        assert!(form.remove_candidate(0));
        assert!(!form.remove_candidate(0));
        assert_eq!(form.fields().candidates.len(), 1);
    }

    #[test]
    fn election_without_candidates_gets_a_blank_row() {
        let mut election = Election::example1();
        election.candidates.clear();
        let form = ElectionForm::edit(&election);
        assert_eq!(form.fields().candidates, vec![CandidateSpec::default()]);
        assert!(!form.is_dirty());
    }

    #[test]
    fn validation_flags_each_required_field() {
        let mut spec = ElectionSpec::board_vote();
        assert!(validate(&spec).is_empty());

        spec.candidates.push(CandidateSpec {
            name: "Bob".to_string(),
            party: " ".to_string(),
            bio: String::new(),
        });
        spec.candidates.push(CandidateSpec::default());
        spec.name = "   ".to_string();
        spec.election_info.end_time = String::new();

        let errors = validate(&spec);
        assert_eq!(errors.get(Field::Name), Some("Election name required"));
        assert_eq!(errors.get(Field::EndTime), Some("End time required"));
        assert_eq!(errors.get(Field::Description), None);
        assert_eq!(errors.get(Field::StartTime), None);
        assert_eq!(errors.get(Field::CandidateName(0)), None);
        assert_eq!(errors.get(Field::CandidateName(1)), None);
        assert_eq!(errors.get(Field::CandidateParty(1)), Some("Party required"));
        assert_eq!(
            errors.get(Field::CandidateName(2)),
            Some("Candidate name required")
        );
        assert_eq!(errors.get(Field::CandidateParty(2)), Some("Party required"));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn validation_messages_render_per_field() {
        let mut form = ElectionForm::create();
        assert!(!form.validate());
        assert_eq!(
            form.errors().to_string(),
            "name: Election name required; description: Description required; \
             startTime: Start time required; endTime: End time required; \
             candidates[0].name: Candidate name required; candidates[0].party: Party required"
        );

        fill_board_vote(&mut form);
        assert!(form.validate());
        assert!(form.errors().is_empty());
    }

    #[rocket::async_test]
    async fn create_board_vote() {
        let fake = FakeService::new();
        let client = fake.client().await;

        let mut form = ElectionForm::create();
        fill_board_vote(&mut form);
        let election = form.submit(&client).await.unwrap();

        assert_eq!(election.name, "Board Vote");
        assert_eq!(form.state(), &FormState::Saved(election));
        assert_eq!(fake.calls(), vec![Call::Create(ElectionSpec::board_vote())]);
    }

    #[rocket::async_test]
    async fn invalid_form_never_reaches_the_service() {
        let fake = FakeService::new();
        let client = fake.client().await;

        let mut form = ElectionForm::create();
        fill_board_vote(&mut form);
        form.set_description(" ");

        let err = form.submit(&client).await.unwrap_err();
        let SubmitError::Blocked(SubmitBlocked::Invalid(errors)) = err else {
            panic!("expected validation failure, got {err:?}");
        };
        assert_eq!(errors.get(Field::Description), Some("Description required"));
        assert_eq!(form.errors(), &errors);
        assert_eq!(form.state(), &FormState::Editing);
        assert!(fake.calls().is_empty());
    }

    #[rocket::async_test]
    async fn clean_edit_is_not_submittable() {
        let mut election = Election::example1();
        // Invalid as well as clean: the clean check wins.
        election.election_info.description = String::new();
        let fake = FakeService::with_elections(vec![election.clone()]);
        let client = fake.client().await;

        let mut form = ElectionForm::edit(&election);
        let err = form.submit(&client).await.unwrap_err();
        assert_eq!(err, SubmitError::Blocked(SubmitBlocked::Unchanged));
        assert!(form.errors().is_empty());
        assert!(fake.calls().is_empty());
    }

    #[rocket::async_test]
    async fn edit_sends_full_replacement() {
        let election = Election::example1();
        let fake = FakeService::with_elections(vec![election.clone()]);
        let client = fake.client().await;

        let mut form = ElectionForm::edit(&election);
        form.set_name("Student Council Chair");
        form.remove_candidate(0);
        let saved = form.submit(&client).await.unwrap();

        let mut expected = ElectionSpec::from(&election);
        expected.name = "Student Council Chair".to_string();
        expected.candidates.remove(0);
        assert_eq!(fake.calls(), vec![Call::Update("e1".into(), expected.clone())]);
        assert_eq!(ElectionSpec::from(&saved), expected);
    }

    #[rocket::async_test]
    async fn failed_submit_keeps_fields() {
        let fake = FakeService::new();
        let client = fake.client().await;
        fake.fail(Op::Create, Status::BadRequest, Some("Election name already used"));

        let mut form = ElectionForm::create();
        fill_board_vote(&mut form);
        let err = form.submit(&client).await.unwrap_err();

        let failure = RequestFailure {
            action: Action::CreateElection,
            message: "Election name already used".to_string(),
        };
        assert_eq!(err, SubmitError::Failed(failure.clone()));
        assert_eq!(form.notice(), Some(&failure));
        assert_eq!(form.state(), &FormState::Editing);
        assert_eq!(form.fields(), &ElectionSpec::board_vote());

        // Retry succeeds once the service recovers.
        fake.recover(Op::Create);
        form.submit(&client).await.unwrap();
        assert!(form.notice().is_none());
        assert_eq!(fake.count(Op::Create), 2);
    }

    #[test]
    fn edits_are_refused_while_submitting() {
        let mut form = ElectionForm::create();
        fill_board_vote(&mut form);
        let submission = form.begin_submit().unwrap();
        assert_eq!(
            submission.request,
            SubmitRequest::Create(ElectionSpec::board_vote())
        );
        assert!(!form.can_submit());

        assert!(!form.set_name("Changed mid-flight"));
        assert!(!form.add_candidate());
        assert_eq!(form.begin_submit(), Err(SubmitBlocked::InFlight));

        let err = Error::Transport("timed out".to_string());
        let outcome = form.finish_submit(submission.ticket, Err(err));
        assert_eq!(
            outcome.unwrap().unwrap_err().message,
            Action::CreateElection.fallback_message()
        );
        assert_eq!(form.fields(), &ElectionSpec::board_vote());
        assert!(form.set_name("Editable again"));
    }

    #[test]
    fn stale_submission_is_discarded() {
        let mut form = ElectionForm::create();
        fill_board_vote(&mut form);
        let submission = form.begin_submit().unwrap();

        let mut other = ElectionForm::create();
        fill_board_vote(&mut other);
        let foreign = other.begin_submit().unwrap();

        assert!(form
            .finish_submit(foreign.ticket, Ok(Election::example1()))
            .is_none());
        assert_eq!(form.state(), &FormState::Submitting);

        let saved = form.finish_submit(submission.ticket, Ok(Election::example1()));
        assert_eq!(saved, Some(Ok(Election::example1())));
        assert_eq!(form.begin_submit(), Err(SubmitBlocked::AlreadySaved));
    }
}
