use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::actor::{ActorRef, CompanyId, StudentId};
use super::application::{Application, ApplicationId, ApplicationStatus};
use super::document::DocumentRecord;
use super::history::HistoryEntryView;
use super::repository::{ApplicationFilter, PlacementRepository, VacancyFilter};
use super::service::{
    ensure_involved, not_found, require_company, require_reviewer, require_student,
    PlacementError,
};
use super::vacancy::{Vacancy, VacancyId, VacancyStatus};

/// Public shape of a vacancy.
#[derive(Debug, Clone, Serialize)]
pub struct VacancyView {
    pub id: VacancyId,
    pub company_id: CompanyId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: &'static str,
    pub is_final: bool,
}

impl From<&Vacancy> for VacancyView {
    fn from(vacancy: &Vacancy) -> Self {
        Self {
            id: vacancy.id.clone(),
            company_id: vacancy.company.clone(),
            title: vacancy.title.clone(),
            description: vacancy.description.clone(),
            created_at: vacancy.created_at,
            status: vacancy.status.label(),
            is_final: vacancy.status.is_terminal(),
        }
    }
}

/// Public shape of an application.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub vacancy_id: VacancyId,
    pub created_at: DateTime<Utc>,
    pub status: &'static str,
    pub is_final: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practice_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practice_end: Option<NaiveDate>,
}

impl From<&Application> for ApplicationView {
    fn from(application: &Application) -> Self {
        Self {
            id: application.id.clone(),
            student_id: application.student.clone(),
            vacancy_id: application.vacancy.clone(),
            created_at: application.created_at,
            status: application.status.label(),
            is_final: application.status.is_terminal(),
            practice_start: application.practice_start,
            practice_end: application.practice_end,
        }
    }
}

/// An internship that was granted, joined with its vacancy.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementView {
    pub application_id: ApplicationId,
    pub student_id: StudentId,
    pub vacancy_id: VacancyId,
    pub vacancy_title: String,
    pub company_id: CompanyId,
    pub status: &'static str,
    pub practice_start: Option<NaiveDate>,
    pub practice_end: Option<NaiveDate>,
}

/// Everything known about one application.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDossier {
    pub application: ApplicationView,
    pub vacancy: VacancyView,
    pub history: Vec<HistoryEntryView>,
    pub documents: Vec<DocumentRecord>,
}

/// Read-only views filtered by state and scoped to the calling actor.
pub struct PlacementQueries<R> {
    repository: Arc<R>,
}

impl<R> PlacementQueries<R>
where
    R: PlacementRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Vacancies accepting applications. Visible to every authenticated actor.
    pub fn open_vacancies(&self, _actor: &ActorRef) -> Result<Vec<VacancyView>, PlacementError> {
        self.vacancies(&VacancyFilter::with_status(VacancyStatus::Open))
    }

    /// University review queue for new postings.
    pub fn pending_vacancies(&self, actor: &ActorRef) -> Result<Vec<VacancyView>, PlacementError> {
        require_reviewer(actor)?;
        self.vacancies(&VacancyFilter::with_status(VacancyStatus::PendingReview))
    }

    /// The calling company's postings in every state.
    pub fn company_vacancies(&self, actor: &ActorRef) -> Result<Vec<VacancyView>, PlacementError> {
        let company = require_company(actor)?;
        self.vacancies(&VacancyFilter::owned_by(company.clone()))
    }

    pub fn student_applications(
        &self,
        actor: &ActorRef,
    ) -> Result<Vec<ApplicationView>, PlacementError> {
        let student = require_student(actor)?;
        self.applications(&ApplicationFilter {
            student: Some(student.clone()),
            ..ApplicationFilter::default()
        })
    }

    /// Applications received on any of the calling company's vacancies.
    pub fn company_applications(
        &self,
        actor: &ActorRef,
    ) -> Result<Vec<ApplicationView>, PlacementError> {
        let company = require_company(actor)?;
        self.applications(&ApplicationFilter {
            company: Some(company.clone()),
            ..ApplicationFilter::default()
        })
    }

    /// Applications the companies approved, waiting for university sign-off.
    pub fn pending_university_review(
        &self,
        actor: &ActorRef,
    ) -> Result<Vec<ApplicationView>, PlacementError> {
        require_reviewer(actor)?;
        self.applications(&ApplicationFilter {
            statuses: vec![ApplicationStatus::UniversityReview],
            ..ApplicationFilter::default()
        })
    }

    /// Granted internships: every company's for reviewers, otherwise the caller's own.
    pub fn placements(&self, actor: &ActorRef) -> Result<Vec<PlacementView>, PlacementError> {
        let mut filter = ApplicationFilter {
            statuses: ApplicationStatus::placement_states().to_vec(),
            ..ApplicationFilter::default()
        };
        match actor {
            ActorRef::University { .. } => {
                require_reviewer(actor)?;
            }
            ActorRef::Company { id } => filter.company = Some(id.clone()),
            ActorRef::Student { id } => filter.student = Some(id.clone()),
        }

        self.repository
            .list_applications(&filter)?
            .iter()
            .map(|application| -> Result<PlacementView, PlacementError> {
                let period = application.practice_period();
                let vacancy = self
                    .repository
                    .fetch_vacancy(&application.vacancy)?
                    .ok_or_else(|| not_found("vacancy", &application.vacancy.0))?;
                Ok(PlacementView {
                    application_id: application.id.clone(),
                    student_id: application.student.clone(),
                    vacancy_id: vacancy.id.clone(),
                    vacancy_title: vacancy.title,
                    company_id: vacancy.company,
                    status: application.status.label(),
                    practice_start: period.map(|period| period.start()),
                    practice_end: period.map(|period| period.end()),
                })
            })
            .collect()
    }

    /// Application with its vacancy, ordered history, and documents. Limited to the
    /// applicant, the hiring company, and university reviewers.
    pub fn dossier(
        &self,
        actor: &ActorRef,
        application_id: &ApplicationId,
    ) -> Result<ApplicationDossier, PlacementError> {
        let application = self
            .repository
            .fetch_application(application_id)?
            .ok_or_else(|| not_found("application", &application_id.0))?;
        let vacancy = self
            .repository
            .fetch_vacancy(&application.vacancy)?
            .ok_or_else(|| not_found("vacancy", &application.vacancy.0))?;

        ensure_involved(actor, &application, &vacancy)?;

        let history = self
            .repository
            .history(&application.id)?
            .iter()
            .map(|entry| entry.view())
            .collect();
        let documents = self.repository.documents(&application.id)?;

        Ok(ApplicationDossier {
            application: ApplicationView::from(&application),
            vacancy: VacancyView::from(&vacancy),
            history,
            documents,
        })
    }

    fn vacancies(&self, filter: &VacancyFilter) -> Result<Vec<VacancyView>, PlacementError> {
        Ok(self
            .repository
            .list_vacancies(filter)?
            .iter()
            .map(VacancyView::from)
            .collect())
    }

    fn applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationView>, PlacementError> {
        Ok(self
            .repository
            .list_applications(filter)?
            .iter()
            .map(ApplicationView::from)
            .collect())
    }
}
