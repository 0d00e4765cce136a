use super::actor::{CompanyId, StudentId};
use super::application::{Application, ApplicationId, ApplicationStatus};
use super::document::DocumentRecord;
use super::history::HistoryEntry;
use super::vacancy::{Vacancy, VacancyId, VacancyStatus};

/// State-filtered vacancy listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VacancyFilter {
    pub status: Option<VacancyStatus>,
    pub company: Option<CompanyId>,
}

impl VacancyFilter {
    pub fn with_status(status: VacancyStatus) -> Self {
        Self {
            status: Some(status),
            company: None,
        }
    }

    pub fn owned_by(company: CompanyId) -> Self {
        Self {
            status: None,
            company: Some(company),
        }
    }

    pub fn matches(&self, vacancy: &Vacancy) -> bool {
        self.status.map_or(true, |status| vacancy.status == status)
            && self
                .company
                .as_ref()
                .map_or(true, |company| vacancy.is_owned_by(company))
    }
}

/// State-filtered application listing. An empty `statuses` list matches every state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub statuses: Vec<ApplicationStatus>,
    pub student: Option<StudentId>,
    pub company: Option<CompanyId>,
    pub vacancy: Option<VacancyId>,
}

impl ApplicationFilter {
    /// `owner` is the company owning the application's vacancy, resolved by the store.
    pub fn matches(&self, application: &Application, owner: Option<&CompanyId>) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&application.status))
            && self
                .student
                .as_ref()
                .map_or(true, |student| &application.student == student)
            && self
                .vacancy
                .as_ref()
                .map_or(true, |vacancy| &application.vacancy == vacancy)
            && self
                .company
                .as_ref()
                .map_or(true, |company| owner == Some(company))
    }
}

/// Everything a single application transition writes. Stores persist it as one unit,
/// and only while the stored application is still in `expected`.
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub expected: ApplicationStatus,
    pub application: Application,
    pub entry: HistoryEntry,
    pub vacancy: Option<Vacancy>,
}

/// Storage abstraction so the lifecycle service can be exercised in isolation.
///
/// Implementations must make each method atomic. `insert_application` is the
/// uniqueness boundary for (student, vacancy) pairs and refuses vacancies that are not
/// open. Conditional writes report the state they found through `StateMismatch`.
pub trait PlacementRepository: Send + Sync {
    fn insert_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError>;
    fn update_vacancy(
        &self,
        vacancy: Vacancy,
        expected: VacancyStatus,
    ) -> Result<(), RepositoryError>;
    fn fetch_vacancy(&self, id: &VacancyId) -> Result<Option<Vacancy>, RepositoryError>;
    fn list_vacancies(&self, filter: &VacancyFilter) -> Result<Vec<Vacancy>, RepositoryError>;

    fn insert_application(
        &self,
        application: Application,
        entry: HistoryEntry,
    ) -> Result<Application, RepositoryError>;
    fn commit_transition(&self, commit: TransitionCommit) -> Result<(), RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError>;

    fn append_history(&self, entry: HistoryEntry) -> Result<HistoryEntry, RepositoryError>;
    fn history(&self, application: &ApplicationId) -> Result<Vec<HistoryEntry>, RepositoryError>;

    fn insert_document(&self, document: DocumentRecord) -> Result<DocumentRecord, RepositoryError>;
    fn documents(&self, application: &ApplicationId)
        -> Result<Vec<DocumentRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record is {current}, not in the expected state")]
    StateMismatch { current: &'static str },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
