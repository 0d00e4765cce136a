use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use super::actor::{ActorRef, AuthError, CompanyId, StudentId, UniversityUserId};
use super::application::{
    Application, ApplicationAction, ApplicationId, PracticePeriod,
};
use super::document::{DocumentDescriptor, DocumentId, DocumentRecord};
use super::history::{normalize_comment, Attribution, HistoryEntry};
use super::projection::PlacementQueries;
use super::repository::{PlacementRepository, RepositoryError, TransitionCommit};
use super::transition::TransitionError;
use super::vacancy::{Vacancy, VacancyId, VacancyStatus};

static VACANCY_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_vacancy_id() -> VacancyId {
    let id = VACANCY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    VacancyId(format!("vac-{id:06}"))
}

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("pst-{id:06}"))
}

fn next_document_id() -> DocumentId {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DocumentId(format!("doc-{id:06}"))
}

/// Posting submitted by a company.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VacancyDraft {
    pub title: String,
    pub description: String,
}

/// Final sign-off payload from the university.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlacementApproval {
    pub practice_start: NaiveDate,
    pub practice_end: NaiveDate,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Lifecycle facade: guards, transitions, and audit writes for vacancies and applications.
pub struct PlacementService<R> {
    repository: Arc<R>,
    queries: PlacementQueries<R>,
}

impl<R> PlacementService<R>
where
    R: PlacementRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        let queries = PlacementQueries::new(repository.clone());
        Self {
            repository,
            queries,
        }
    }

    /// Read-only projections over the same store.
    pub fn queries(&self) -> &PlacementQueries<R> {
        &self.queries
    }

    /// Company posts a vacancy; it waits in `PendingReview` until the university approves it.
    pub fn submit_vacancy(
        &self,
        actor: &ActorRef,
        draft: VacancyDraft,
    ) -> Result<Vacancy, PlacementError> {
        let company = require_company(actor)?;
        let title = required_text(&draft.title, "title")?;
        let description = required_text(&draft.description, "description")?;

        let vacancy = Vacancy::submit(
            next_vacancy_id(),
            company.clone(),
            title,
            description,
            Utc::now(),
        );
        let stored = self.repository.insert_vacancy(vacancy)?;
        info!(vacancy_id = %stored.id.0, company_id = %company.0, "vacancy submitted for review");
        Ok(stored)
    }

    pub fn approve_vacancy(
        &self,
        actor: &ActorRef,
        vacancy_id: &VacancyId,
    ) -> Result<Vacancy, PlacementError> {
        let reviewer = require_reviewer(actor)?;
        let mut vacancy = self.load_vacancy(vacancy_id)?;
        let prior = vacancy.status;
        vacancy.approve()?;
        self.persist_vacancy(&vacancy, prior, "approve")?;
        info!(vacancy_id = %vacancy.id.0, reviewer = %reviewer.0, "vacancy opened");
        Ok(vacancy)
    }

    /// Administrative override: the vacancy is closed whatever its state.
    pub fn reject_vacancy(
        &self,
        actor: &ActorRef,
        vacancy_id: &VacancyId,
    ) -> Result<Vacancy, PlacementError> {
        let reviewer = require_reviewer(actor)?;
        let mut vacancy = self.load_vacancy(vacancy_id)?;
        let prior = vacancy.reject();
        self.persist_vacancy(&vacancy, prior, "reject")?;
        info!(
            vacancy_id = %vacancy.id.0,
            reviewer = %reviewer.0,
            from = prior.label(),
            "vacancy rejected"
        );
        Ok(vacancy)
    }

    pub fn close_vacancy(
        &self,
        actor: &ActorRef,
        vacancy_id: &VacancyId,
    ) -> Result<Vacancy, PlacementError> {
        let company = require_company(actor)?;
        let mut vacancy = self.load_vacancy(vacancy_id)?;
        if !vacancy.is_owned_by(company) {
            return Err(forbidden(actor, "only the owning company may close a vacancy"));
        }
        let prior = vacancy.status;
        vacancy.close()?;
        self.persist_vacancy(&vacancy, prior, "close")?;
        info!(vacancy_id = %vacancy.id.0, company_id = %company.0, "vacancy closed by owner");
        Ok(vacancy)
    }

    /// Student applies to an open vacancy. The store rejects a second application
    /// for the same (student, vacancy) pair.
    pub fn apply(
        &self,
        actor: &ActorRef,
        vacancy_id: &VacancyId,
    ) -> Result<Application, PlacementError> {
        let student = require_student(actor)?;
        let vacancy = self.load_vacancy(vacancy_id)?;
        if !vacancy.accepts_applications() {
            return Err(PlacementError::InvalidState {
                vacancy: vacancy.id.0.clone(),
                status: vacancy.status.label(),
            });
        }

        let application = Application::receive(
            next_application_id(),
            student.clone(),
            vacancy.id.clone(),
            Utc::now(),
        );
        let entry = HistoryEntry::record(&application, None, Some(actor));

        let stored = match self.repository.insert_application(application, entry) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                debug!(student_id = %student.0, vacancy_id = %vacancy.id.0, "duplicate application refused");
                return Err(PlacementError::Conflict {
                    student: student.0.clone(),
                    vacancy: vacancy.id.0.clone(),
                });
            }
            Err(RepositoryError::StateMismatch { current }) => {
                return Err(PlacementError::InvalidState {
                    vacancy: vacancy.id.0.clone(),
                    status: current,
                })
            }
            Err(RepositoryError::NotFound) => return Err(not_found("vacancy", &vacancy.id.0)),
            Err(other) => return Err(other.into()),
        };

        info!(
            application_id = %stored.id.0,
            student_id = %student.0,
            vacancy_id = %vacancy.id.0,
            "application received"
        );
        Ok(stored)
    }

    pub fn company_approve(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
        comment: Option<&str>,
    ) -> Result<Application, PlacementError> {
        self.transition(actor, application_id, ApplicationAction::CompanyApprove, comment)
    }

    pub fn company_reject(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
        comment: &str,
    ) -> Result<Application, PlacementError> {
        self.transition(
            actor,
            application_id,
            ApplicationAction::CompanyReject,
            Some(comment),
        )
    }

    /// Final approval: sets the practice window and fills the vacancy.
    pub fn university_approve(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
        approval: PlacementApproval,
    ) -> Result<Application, PlacementError> {
        let period = PracticePeriod::new(approval.practice_start, approval.practice_end)
            .ok_or_else(|| {
                PlacementError::Validation(
                    "practice end date must not precede the start date".to_string(),
                )
            })?;
        self.transition(
            actor,
            application_id,
            ApplicationAction::UniversityApprove(period),
            approval.comment.as_deref(),
        )
    }

    pub fn university_reject(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
        comment: &str,
    ) -> Result<Application, PlacementError> {
        self.transition(
            actor,
            application_id,
            ApplicationAction::UniversityReject,
            Some(comment),
        )
    }

    pub fn company_complete(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
        comment: &str,
    ) -> Result<Application, PlacementError> {
        self.transition(
            actor,
            application_id,
            ApplicationAction::CompanyComplete,
            Some(comment),
        )
    }

    pub fn company_cancel(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
        comment: &str,
    ) -> Result<Application, PlacementError> {
        self.transition(
            actor,
            application_id,
            ApplicationAction::CompanyCancel,
            Some(comment),
        )
    }

    pub fn university_cancel(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
        comment: &str,
    ) -> Result<Application, PlacementError> {
        self.transition(
            actor,
            application_id,
            ApplicationAction::UniversityCancel,
            Some(comment),
        )
    }

    /// Appends a comment carrying the application's current state. No state guard.
    pub fn add_comment(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
        comment: &str,
    ) -> Result<HistoryEntry, PlacementError> {
        let application = self.load_application(application_id)?;
        let comment = normalize_comment(Some(comment))
            .ok_or_else(|| PlacementError::Validation("comment must not be empty".to_string()))?;

        let entry = HistoryEntry::record(&application, Some(&comment), Some(actor));
        let stored = self.repository.append_history(entry)?;
        debug!(application_id = %application.id.0, actor = %actor, "comment recorded");
        Ok(stored)
    }

    /// Audit trail of one application, oldest first.
    pub fn history(
        &self,
        _actor: &ActorRef,
        application_id: &ApplicationId,
    ) -> Result<Vec<HistoryEntry>, PlacementError> {
        let application = self.load_application(application_id)?;
        Ok(self.repository.history(&application.id)?)
    }

    /// Document metadata of one application in upload order. Same audience as the dossier.
    pub fn documents(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
    ) -> Result<Vec<DocumentRecord>, PlacementError> {
        let application = self.load_application(application_id)?;
        let vacancy = self.load_vacancy(&application.vacancy)?;
        ensure_involved(actor, &application, &vacancy)?;
        Ok(self.repository.documents(&application.id)?)
    }

    /// Records metadata for a document kept in external storage.
    pub fn attach_document(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
        descriptor: DocumentDescriptor,
    ) -> Result<DocumentRecord, PlacementError> {
        let application = self.load_application(application_id)?;
        let vacancy = self.load_vacancy(&application.vacancy)?;
        let permitted = match actor {
            ActorRef::Student { id } => &application.student == id,
            ActorRef::Company { id } => vacancy.is_owned_by(id),
            ActorRef::University { .. } => false,
        };
        if !permitted {
            return Err(forbidden(
                actor,
                "only the applicant or the hiring company may attach documents",
            ));
        }

        let name = required_text(&descriptor.name, "document name")?;
        let storage_key = required_text(&descriptor.storage_key, "storage key")?;
        let record = DocumentRecord {
            id: next_document_id(),
            application: application.id.clone(),
            name,
            kind: descriptor.kind,
            storage_key,
            uploaded_at: Utc::now(),
            uploaded_by: Attribution::from(actor),
        };
        let stored = self.repository.insert_document(record)?;
        info!(document_id = %stored.id.0, application_id = %application.id.0, "document attached");
        Ok(stored)
    }

    fn transition(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
        action: ApplicationAction,
        comment: Option<&str>,
    ) -> Result<Application, PlacementError> {
        let mut application = self.load_application(application_id)?;
        let mut vacancy = self.load_vacancy(&application.vacancy)?;
        authorize(actor, &action, &vacancy)?;

        let comment = normalize_comment(comment);
        if action.requires_comment() && comment.is_none() {
            return Err(PlacementError::Validation(format!(
                "a comment is required to {}",
                action.verb()
            )));
        }

        let from = application.transition(action)?;
        let filled = match action {
            ApplicationAction::UniversityApprove(_) => {
                vacancy.mark_filled();
                Some(vacancy)
            }
            _ => None,
        };

        let entry = HistoryEntry::record(&application, comment.as_deref(), Some(actor));
        let commit = TransitionCommit {
            expected: from,
            application: application.clone(),
            entry,
            vacancy: filled,
        };
        match self.repository.commit_transition(commit) {
            Ok(()) => {}
            Err(RepositoryError::StateMismatch { current }) => {
                debug!(application_id = %application.id.0, current, "application changed concurrently");
                return Err(TransitionError {
                    entity: "application",
                    id: application.id.0.clone(),
                    from: current,
                    action: action.verb(),
                }
                .into());
            }
            Err(other) => return Err(other.into()),
        }

        info!(
            application_id = %application.id.0,
            action = action.verb(),
            from = from.label(),
            to = application.status.label(),
            actor = %actor,
            "application transitioned"
        );
        Ok(application)
    }

    /// Writes `vacancy` only if the store still holds it in `prior`.
    fn persist_vacancy(
        &self,
        vacancy: &Vacancy,
        prior: VacancyStatus,
        action: &'static str,
    ) -> Result<(), PlacementError> {
        match self.repository.update_vacancy(vacancy.clone(), prior) {
            Err(RepositoryError::StateMismatch { current }) => Err(TransitionError {
                entity: "vacancy",
                id: vacancy.id.0.clone(),
                from: current,
                action,
            }
            .into()),
            other => Ok(other?),
        }
    }

    fn load_application(&self, id: &ApplicationId) -> Result<Application, PlacementError> {
        self.repository
            .fetch_application(id)?
            .ok_or_else(|| not_found("application", &id.0))
    }

    fn load_vacancy(&self, id: &VacancyId) -> Result<Vacancy, PlacementError> {
        self.repository
            .fetch_vacancy(id)?
            .ok_or_else(|| not_found("vacancy", &id.0))
    }
}

fn authorize(
    actor: &ActorRef,
    action: &ApplicationAction,
    vacancy: &Vacancy,
) -> Result<(), PlacementError> {
    match action {
        ApplicationAction::CompanyApprove
        | ApplicationAction::CompanyReject
        | ApplicationAction::CompanyComplete
        | ApplicationAction::CompanyCancel => {
            let company = require_company(actor)?;
            if vacancy.is_owned_by(company) {
                Ok(())
            } else {
                Err(forbidden(
                    actor,
                    "only the company owning the vacancy may act on its applications",
                ))
            }
        }
        ApplicationAction::UniversityApprove(_)
        | ApplicationAction::UniversityReject
        | ApplicationAction::UniversityCancel => require_reviewer(actor).map(|_| ()),
    }
}

/// Applicant, hiring company, or a university reviewer.
pub(crate) fn ensure_involved(
    actor: &ActorRef,
    application: &Application,
    vacancy: &Vacancy,
) -> Result<(), PlacementError> {
    let involved = match actor {
        ActorRef::University { role, .. } => role.can_review(),
        ActorRef::Company { id } => vacancy.is_owned_by(id),
        ActorRef::Student { id } => &application.student == id,
    };
    if involved {
        Ok(())
    } else {
        Err(forbidden(actor, "application belongs to another party"))
    }
}

pub(crate) fn require_company(actor: &ActorRef) -> Result<&CompanyId, PlacementError> {
    match actor {
        ActorRef::Company { id } => Ok(id),
        ActorRef::University { .. } | ActorRef::Student { .. } => {
            Err(forbidden(actor, "company account required"))
        }
    }
}

pub(crate) fn require_student(actor: &ActorRef) -> Result<&StudentId, PlacementError> {
    match actor {
        ActorRef::Student { id } => Ok(id),
        ActorRef::University { .. } | ActorRef::Company { .. } => {
            Err(forbidden(actor, "student account required"))
        }
    }
}

/// University staff allowed to review vacancies and sign off placements.
pub(crate) fn require_reviewer(actor: &ActorRef) -> Result<&UniversityUserId, PlacementError> {
    match actor {
        ActorRef::University { id, role } if role.can_review() => Ok(id),
        ActorRef::University { .. } => Err(forbidden(
            actor,
            "administrator or coordinator role required",
        )),
        ActorRef::Company { .. } | ActorRef::Student { .. } => {
            Err(forbidden(actor, "university account required"))
        }
    }
}

pub(crate) fn forbidden(actor: &ActorRef, reason: &'static str) -> PlacementError {
    debug!(actor_kind = actor.kind(), actor = %actor, reason, "operation forbidden");
    PlacementError::Forbidden(reason)
}

pub(crate) fn not_found(entity: &'static str, id: &str) -> PlacementError {
    PlacementError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn required_text(value: &str, field: &str) -> Result<String, PlacementError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(PlacementError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Error raised by the placement service. No variant leaves partial writes behind.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    InvalidStateTransition(#[from] TransitionError),
    #[error("vacancy {vacancy} is {status} and does not accept applications")]
    InvalidState { vacancy: String, status: &'static str },
    #[error("student {student} already applied to vacancy {vacancy}")]
    Conflict { student: String, vacancy: String },
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
