use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::actor::StudentId;
use super::application::{Application, ApplicationId};
use super::document::DocumentRecord;
use super::history::{chronological, HistoryEntry};
use super::repository::{
    ApplicationFilter, PlacementRepository, RepositoryError, TransitionCommit, VacancyFilter,
};
use super::vacancy::{Vacancy, VacancyId, VacancyStatus};

#[derive(Debug, Default)]
struct StoreState {
    vacancies: BTreeMap<VacancyId, Vacancy>,
    applications: BTreeMap<ApplicationId, Application>,
    pairs: HashSet<(StudentId, VacancyId)>,
    history: Vec<HistoryEntry>,
    documents: Vec<DocumentRecord>,
}

/// Process-local store. A single lock makes every trait call one atomic unit.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPlacementStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryPlacementStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    /// Number of stored applications, mostly useful for assertions.
    pub fn application_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.applications.len())
    }
}

impl PlacementRepository for InMemoryPlacementStore {
    fn insert_vacancy(&self, vacancy: Vacancy) -> Result<Vacancy, RepositoryError> {
        let mut state = self.lock()?;
        if state.vacancies.contains_key(&vacancy.id) {
            return Err(RepositoryError::Conflict);
        }
        state.vacancies.insert(vacancy.id.clone(), vacancy.clone());
        Ok(vacancy)
    }

    fn update_vacancy(
        &self,
        vacancy: Vacancy,
        expected: VacancyStatus,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state.vacancies.get_mut(&vacancy.id) {
            Some(slot) if slot.status != expected => Err(RepositoryError::StateMismatch {
                current: slot.status.label(),
            }),
            Some(slot) => {
                *slot = vacancy;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_vacancy(&self, id: &VacancyId) -> Result<Option<Vacancy>, RepositoryError> {
        Ok(self.lock()?.vacancies.get(id).cloned())
    }

    fn list_vacancies(&self, filter: &VacancyFilter) -> Result<Vec<Vacancy>, RepositoryError> {
        let state = self.lock()?;
        let mut vacancies: Vec<Vacancy> = state
            .vacancies
            .values()
            .filter(|vacancy| filter.matches(vacancy))
            .cloned()
            .collect();
        vacancies.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(vacancies)
    }

    fn insert_application(
        &self,
        application: Application,
        entry: HistoryEntry,
    ) -> Result<Application, RepositoryError> {
        let mut state = self.lock()?;
        match state.vacancies.get(&application.vacancy) {
            None => return Err(RepositoryError::NotFound),
            Some(vacancy) if !vacancy.accepts_applications() => {
                return Err(RepositoryError::StateMismatch {
                    current: vacancy.status.label(),
                })
            }
            Some(_) => {}
        }
        let pair = (application.student.clone(), application.vacancy.clone());
        if state.applications.contains_key(&application.id) || state.pairs.contains(&pair) {
            return Err(RepositoryError::Conflict);
        }

        state.pairs.insert(pair);
        state
            .applications
            .insert(application.id.clone(), application.clone());
        state.history.push(entry);
        Ok(application)
    }

    fn commit_transition(&self, commit: TransitionCommit) -> Result<(), RepositoryError> {
        let TransitionCommit {
            expected,
            application,
            entry,
            vacancy,
        } = commit;

        let mut state = self.lock()?;
        match state.applications.get(&application.id) {
            None => return Err(RepositoryError::NotFound),
            Some(stored) if stored.status != expected => {
                return Err(RepositoryError::StateMismatch {
                    current: stored.status.label(),
                })
            }
            Some(_) => {}
        }
        if let Some(vacancy) = &vacancy {
            if !state.vacancies.contains_key(&vacancy.id) {
                return Err(RepositoryError::NotFound);
            }
        }

        if let Some(vacancy) = vacancy {
            state.vacancies.insert(vacancy.id.clone(), vacancy);
        }
        state
            .applications
            .insert(application.id.clone(), application);
        state.history.push(entry);
        Ok(())
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        let state = self.lock()?;
        let mut applications: Vec<Application> = state
            .applications
            .values()
            .filter(|application| {
                let owner = state
                    .vacancies
                    .get(&application.vacancy)
                    .map(|vacancy| &vacancy.company);
                filter.matches(application, owner)
            })
            .cloned()
            .collect();
        applications.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(applications)
    }

    fn append_history(&self, entry: HistoryEntry) -> Result<HistoryEntry, RepositoryError> {
        let mut state = self.lock()?;
        if !state.applications.contains_key(&entry.application) {
            return Err(RepositoryError::NotFound);
        }
        state.history.push(entry.clone());
        Ok(entry)
    }

    fn history(&self, application: &ApplicationId) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let state = self.lock()?;
        let entries = state
            .history
            .iter()
            .filter(|entry| &entry.application == application)
            .cloned()
            .collect();
        Ok(chronological(entries))
    }

    fn insert_document(&self, document: DocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        let mut state = self.lock()?;
        if !state.applications.contains_key(&document.application) {
            return Err(RepositoryError::NotFound);
        }
        state.documents.push(document.clone());
        Ok(document)
    }

    fn documents(
        &self,
        application: &ApplicationId,
    ) -> Result<Vec<DocumentRecord>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .documents
            .iter()
            .filter(|document| &document.application == application)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::placement::actor::{ActorRef, CompanyId};
    use crate::workflows::placement::application::ApplicationStatus;
    use chrono::Utc;

    fn store_with_vacancy(status: VacancyStatus) -> (InMemoryPlacementStore, Vacancy) {
        let store = InMemoryPlacementStore::default();
        let mut vacancy = Vacancy::submit(
            VacancyId("vac-mem".to_string()),
            CompanyId("acme".to_string()),
            "Intern".to_string(),
            "Support".to_string(),
            Utc::now(),
        );
        vacancy.status = status;
        store.insert_vacancy(vacancy.clone()).expect("vacancy stored");
        (store, vacancy)
    }

    fn received(vacancy: &Vacancy) -> (Application, HistoryEntry) {
        let application = Application::receive(
            ApplicationId("pst-mem".to_string()),
            StudentId("ana".to_string()),
            vacancy.id.clone(),
            Utc::now(),
        );
        let entry = HistoryEntry::record(&application, None, Some(&ActorRef::student("ana")));
        (application, entry)
    }

    #[test]
    fn insert_application_refuses_vacancy_that_left_open() {
        let (store, vacancy) = store_with_vacancy(VacancyStatus::Closed);
        let (application, entry) = received(&vacancy);

        let result = store.insert_application(application, entry);
        assert_eq!(
            result,
            Err(RepositoryError::StateMismatch { current: "closed" })
        );
        assert_eq!(store.application_count().expect("count"), 0);
    }

    #[test]
    fn stale_transition_commit_writes_nothing() {
        let (store, vacancy) = store_with_vacancy(VacancyStatus::Open);
        let (application, entry) = received(&vacancy);
        store
            .insert_application(application.clone(), entry)
            .expect("inserted");

        let mut moved = application.clone();
        moved.status = ApplicationStatus::UniversityReview;
        store
            .commit_transition(TransitionCommit {
                expected: ApplicationStatus::Received,
                entry: HistoryEntry::record(&moved, None, None),
                application: moved,
                vacancy: None,
            })
            .expect("first commit wins");

        let mut stale = application;
        stale.status = ApplicationStatus::RejectedByCompany;
        let result = store.commit_transition(TransitionCommit {
            expected: ApplicationStatus::Received,
            entry: HistoryEntry::record(&stale, Some("late"), None),
            application: stale.clone(),
            vacancy: None,
        });
        assert_eq!(
            result,
            Err(RepositoryError::StateMismatch {
                current: "university_review"
            })
        );
        assert_eq!(store.history(&stale.id).expect("history").len(), 2);
    }

    #[test]
    fn vacancy_update_is_conditional() {
        let (store, mut vacancy) = store_with_vacancy(VacancyStatus::Open);
        vacancy.status = VacancyStatus::Closed;

        let result = store.update_vacancy(vacancy.clone(), VacancyStatus::PendingReview);
        assert_eq!(result, Err(RepositoryError::StateMismatch { current: "open" }));

        store
            .update_vacancy(vacancy.clone(), VacancyStatus::Open)
            .expect("expected state matches");
        let stored = store
            .fetch_vacancy(&vacancy.id)
            .expect("store reachable")
            .expect("present");
        assert_eq!(stored.status, VacancyStatus::Closed);
    }
}
